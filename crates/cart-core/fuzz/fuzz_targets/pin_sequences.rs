#![no_main]

use cart_core::{
    decode_memory_region, AccessState, BridgeConfig, BusPins, CartBridge, MemoryRegion,
    SimulatedStore,
};
use libfuzzer_sys::fuzz_target;

fn pins_from(chunk: &[u8]) -> BusPins {
    let flags = chunk[0];
    BusPins {
        aleh: flags & 0x01 != 0,
        alel: flags & 0x02 != 0,
        read_n: flags & 0x04 == 0,
        write_n: flags & 0x08 == 0,
        reset_n: flags & 0x10 == 0,
        ad: u16::from_be_bytes([chunk[1], chunk[2]]),
    }
}

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let config = BridgeConfig {
        log_threshold: u32::from(data[0] & 0x0F),
        store_timeout: (data[0] & 0x80 != 0).then_some(64),
        ..BridgeConfig::default()
    };
    let latency = u32::from((data[0] >> 4) & 0x07);
    let mut bridge = CartBridge::new(config, SimulatedStore::new(0x1_0000, latency));

    for chunk in data[1..].chunks_exact(3) {
        let pins = pins_from(chunk);
        let output = bridge.tick(&pins);

        if output.ad.output_enabled() {
            assert!(matches!(
                output.state,
                AccessState::WaitReadWrite | AccessState::WaitReadBeat
            ));
        }
        if output.state == AccessState::Init {
            assert!(!bridge.arbiter().is_busy());
        }
        assert!(bridge.log().write_index() < bridge.log().capacity());
    }

    let region = decode_memory_region(bridge.address().get());
    if region != MemoryRegion::Unmapped {
        assert!(region.contains(bridge.address().get()));
    }
});
