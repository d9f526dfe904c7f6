//! Deadline-miss logging and bounded store waits observed through the bus.

use cart_core::{
    AccessState, AnomalyCode, BridgeConfig, BusMaster, BusPins, CartBridge, LogRevision,
    SimulatedStore, DEFAULT_DEADLINE_CYCLES, REG_LOG_INDEX, REG_LOG_THRESHOLD, STORE_START,
};
use log as _;
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

fn read_one(bridge: &mut CartBridge, addr: u32) -> Option<u16> {
    let mut master = BusMaster::new(bridge);
    master.power_on();
    master.read_burst(addr, 1).pop().flatten()
}

#[rstest]
#[case(0, false)]
#[case(DEFAULT_DEADLINE_CYCLES - 1, false)]
#[case(DEFAULT_DEADLINE_CYCLES, false)]
#[case(DEFAULT_DEADLINE_CYCLES + 1, true)]
#[case(31, true)]
fn one_entry_per_read_past_the_deadline(#[case] latency: u32, #[case] logged: bool) {
    let mut bridge = CartBridge::new(BridgeConfig::default(), SimulatedStore::new(1024, latency));
    bridge.store_mut().load(0x20, &[0x12, 0x34]);

    assert_eq!(read_one(&mut bridge, STORE_START + 0x20), Some(0x1234));

    let log = bridge.log();
    if logged {
        assert_eq!(log.write_index(), 1);
        assert_eq!(log.read(0), Some(latency));
        assert_eq!(bridge.diag().deadline_misses, 1);
        assert_eq!(bridge.diag().last_anomaly, Some(AnomalyCode::DeadlineMiss));
    } else {
        assert_eq!(log.write_index(), 0);
        assert_eq!(bridge.diag().deadline_misses, 0);
    }
}

#[test]
fn log_index_register_follows_appends_after_synchronization() {
    let mut bridge = CartBridge::new(BridgeConfig::default(), SimulatedStore::new(1024, 12));
    {
        let mut master = BusMaster::new(&mut bridge);
        master.power_on();
        master.read_burst(STORE_START, 3);
    }
    assert_eq!(bridge.log().write_index(), 3);
    assert_eq!(bridge.read_register(REG_LOG_INDEX), Ok(3));
    assert_eq!(bridge.log().entries_since(1), vec![12, 12]);
}

#[test]
fn log_strobe_is_a_single_cycle_pulse() {
    let mut bridge = CartBridge::new(BridgeConfig::default(), SimulatedStore::new(1024, 10));
    let mut master = BusMaster::new(&mut bridge);
    master.power_on();
    master.latch_address(STORE_START);

    let mut pulses = 0;
    let reading = BusPins {
        read_n: false,
        ..BusPins::IDLE
    };
    for _ in 0..40 {
        if master.bridge().tick(&reading).log_strobe {
            pulses += 1;
        }
    }
    assert_eq!(pulses, 1);
}

#[test]
fn raising_the_threshold_register_silences_logging() {
    let mut bridge = CartBridge::new(BridgeConfig::default(), SimulatedStore::new(1024, 9));
    assert_eq!(bridge.write_register(REG_LOG_THRESHOLD, 9), Ok(()));
    read_one(&mut bridge, STORE_START);
    assert_eq!(bridge.log().write_index(), 0);

    assert_eq!(bridge.write_register(REG_LOG_THRESHOLD, 8), Ok(()));
    read_one(&mut bridge, STORE_START);
    assert_eq!(bridge.log().write_index(), 1);
}

#[test]
fn compact_revision_sizes_the_ring() {
    let config = BridgeConfig {
        log_revision: LogRevision::Compact,
        ..BridgeConfig::default()
    };
    let bridge = CartBridge::new(config, SimulatedStore::new(1024, 1));
    assert_eq!(bridge.log().capacity(), 2048);
}

#[test]
fn bounded_wait_returns_the_bus_to_start() {
    let config = BridgeConfig {
        store_timeout: Some(16),
        ..BridgeConfig::default()
    };
    let mut bridge = CartBridge::new(config, SimulatedStore::new(1024, 0));
    bridge.store_mut().set_stalled(true);

    {
        let mut master = BusMaster::new(&mut bridge).with_strobe_ticks(64);
        master.power_on();
        assert_eq!(master.read_burst(STORE_START, 1), vec![None]);
    }
    assert_eq!(bridge.diag().store_timeouts, 1);
    assert_eq!(bridge.diag().last_anomaly, Some(AnomalyCode::StoreTimeout));
    assert_eq!(bridge.log().write_index(), 0);
}

#[test]
fn unbounded_wait_holds_the_access_open() {
    let mut bridge = CartBridge::new(BridgeConfig::default(), SimulatedStore::new(1024, 0));
    bridge.store_mut().set_stalled(true);

    let mut master = BusMaster::new(&mut bridge).with_strobe_ticks(500);
    master.power_on();
    master.latch_address(STORE_START);
    assert_eq!(master.read_beat(), None);
    assert!(master.bridge().arbiter().is_busy());
    assert_eq!(master.bridge().arbiter().latency(), 501);
}

#[test]
fn bounded_wait_keeps_firing_while_an_abandoned_read_is_outstanding() {
    let config = BridgeConfig {
        store_timeout: Some(16),
        ..BridgeConfig::default()
    };
    let mut store = SimulatedStore::new(1024, 2);
    store.load(8, &[0x12, 0x34]);
    let mut bridge = CartBridge::new(config, store);
    bridge.store_mut().set_stalled(true);

    {
        let mut master = BusMaster::new(&mut bridge).with_strobe_ticks(64);
        master.power_on();
        assert_eq!(master.read_burst(STORE_START, 1), vec![None]);
        assert_eq!(master.read_burst(STORE_START + 4, 1), vec![None]);
        assert_eq!(
            master.last_output().map(|out| out.state),
            Some(AccessState::Start)
        );
    }
    assert_eq!(bridge.diag().store_timeouts, 2);
    assert_eq!(bridge.store().commands_issued(), 1);
    assert!(!bridge.arbiter().is_busy());

    bridge.store_mut().set_stalled(false);
    {
        let mut master = BusMaster::new(&mut bridge).with_strobe_ticks(64);
        master.power_on();
        assert_eq!(master.read_burst(STORE_START + 8, 1), vec![Some(0x1234)]);
    }
    assert_eq!(bridge.store().commands_issued(), 2);
    assert_eq!(bridge.diag().store_timeouts, 2);

    bridge.reset_diagnostics();
    assert_eq!(bridge.diag().store_timeouts, 0);
    assert_eq!(bridge.diag().last_anomaly, None);
}
