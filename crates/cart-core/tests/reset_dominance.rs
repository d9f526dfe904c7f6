//! Reset overrides every access state.

use cart_core::{
    AccessState, BridgeConfig, BusPins, CartBridge, SimulatedStore, CUSTOM_START, HOLD_TICKS,
    STORE_START, SYNC_STAGES,
};
use log as _;
use proptest as _;
use rstest::rstest;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

fn hold(bridge: &mut CartBridge, pins: BusPins) -> AccessState {
    let mut state = bridge.state();
    for _ in 0..HOLD_TICKS {
        state = bridge.tick(&pins).state;
    }
    state
}

fn latch(bridge: &mut CartBridge, addr: u32) -> AccessState {
    let [b0, b1, b2, b3] = addr.to_be_bytes();
    let low = u16::from_be_bytes([b2, b3]);
    let high = BusPins {
        aleh: true,
        alel: true,
        ad: u16::from_be_bytes([b0, b1]),
        ..BusPins::IDLE
    };
    hold(bridge, high);
    hold(bridge, BusPins { alel: false, ..high });
    hold(
        bridge,
        BusPins {
            aleh: true,
            ad: low,
            ..BusPins::IDLE
        },
    );
    hold(
        bridge,
        BusPins {
            ad: low,
            ..BusPins::IDLE
        },
    )
}

/// Drives a fresh bridge into `target` and returns the pins holding it there.
fn drive_to(bridge: &mut CartBridge, target: AccessState) -> BusPins {
    if target == AccessState::Init {
        return BusPins::IN_RESET;
    }
    hold(bridge, BusPins::IDLE);
    let pins = match target {
        AccessState::Init | AccessState::Start => BusPins::IDLE,
        AccessState::WaitAddrHigh => BusPins {
            aleh: true,
            alel: true,
            ..BusPins::IDLE
        },
        AccessState::WaitAddrLow => {
            hold(
                bridge,
                BusPins {
                    aleh: true,
                    alel: true,
                    ..BusPins::IDLE
                },
            );
            BusPins {
                aleh: true,
                ..BusPins::IDLE
            }
        }
        AccessState::WaitReadWrite => {
            latch(bridge, CUSTOM_START);
            BusPins::IDLE
        }
        AccessState::WaitReadBeat => {
            latch(bridge, CUSTOM_START);
            BusPins {
                read_n: false,
                ..BusPins::IDLE
            }
        }
        AccessState::WaitWriteBeat => {
            latch(bridge, CUSTOM_START);
            BusPins {
                write_n: false,
                ..BusPins::IDLE
            }
        }
    };
    assert_eq!(hold(bridge, pins), target);
    pins
}

#[rstest]
#[case(AccessState::Init)]
#[case(AccessState::Start)]
#[case(AccessState::WaitAddrHigh)]
#[case(AccessState::WaitAddrLow)]
#[case(AccessState::WaitReadWrite)]
#[case(AccessState::WaitReadBeat)]
#[case(AccessState::WaitWriteBeat)]
fn reset_forces_init_once_it_crosses_the_synchronizer(#[case] target: AccessState) {
    let mut bridge: CartBridge = CartBridge::default();
    let pins = drive_to(&mut bridge, target);
    let in_reset = BusPins {
        reset_n: false,
        ..pins
    };

    for _ in 0..SYNC_STAGES {
        assert_eq!(bridge.tick(&in_reset).state, target);
    }
    let output = bridge.tick(&in_reset);
    assert_eq!(output.state, AccessState::Init);
    assert!(!output.ad.output_enabled());

    for _ in 0..8 {
        assert_eq!(bridge.tick(&in_reset).state, AccessState::Init);
    }
}

#[test]
fn every_state_is_covered_by_the_reset_cases() {
    assert_eq!(AccessState::ALL.len(), 7);
}

#[test]
fn reset_during_a_pending_store_read_recovers_cleanly() {
    let mut bridge = CartBridge::new(BridgeConfig::default(), SimulatedStore::new(4096, 40));
    bridge.store_mut().load(0x10, &[0xAB, 0xCD]);
    hold(&mut bridge, BusPins::IDLE);
    latch(&mut bridge, STORE_START + 0x10);
    let reading = BusPins {
        read_n: false,
        ..BusPins::IDLE
    };
    assert_eq!(hold(&mut bridge, reading), AccessState::WaitReadWrite);
    assert!(bridge.arbiter().is_busy());

    hold(&mut bridge, BusPins::IN_RESET);
    assert_eq!(bridge.state(), AccessState::Init);
    assert!(!bridge.arbiter().is_busy());

    hold(&mut bridge, BusPins::IDLE);
    latch(&mut bridge, STORE_START + 0x10);
    let mut output = bridge.tick(&reading);
    for _ in 0..200 {
        if output.state == AccessState::WaitReadBeat {
            break;
        }
        output = bridge.tick(&reading);
    }
    assert_eq!(output.state, AccessState::WaitReadBeat);
    assert_eq!(output.ad.driven_value(), Some(0xABCD));
    assert_eq!(bridge.store().commands_issued(), 2);
}
