//! Deadline-miss sweep over injected backing-store latencies.
//!
//! Reads a fixed burst from the store window at each latency and prints how
//! many beats landed in the log ring, together with the worst latency seen.
//!
//! ## Usage
//!
//! ```sh
//! cargo run -p cart-core --example latency_sweep
//! ```

use cart_core::{BridgeConfig, BusMaster, CartBridge, SimulatedStore, STORE_START};
use log as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;

const BURST_WORDS: usize = 64;
const MAX_LATENCY: u32 = 12;

fn sweep(latency: u32) -> (usize, u32, u64) {
    let mut bridge = CartBridge::new(
        BridgeConfig::default(),
        SimulatedStore::new(64 * 1024, latency),
    );
    {
        let mut master = BusMaster::new(&mut bridge);
        master.power_on();
        master.read_burst(STORE_START, BURST_WORDS);
    }
    let log = bridge.log();
    let misses = log.write_index();
    let worst = log.entries_since(0).into_iter().max().unwrap_or(0);
    (misses, worst, bridge.ticks())
}

fn main() {
    println!("latency  misses  worst  ticks");
    for latency in 0..=MAX_LATENCY {
        let (misses, worst, ticks) = sweep(latency);
        println!("{latency:>7}  {misses:>6}  {worst:>5}  {ticks:>5}");
    }
}
