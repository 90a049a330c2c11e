//! poolscope-sim: constant-product arbitrage simulation.
//!
//! Generates geometric-Brownian-motion reference price paths and replays a
//! rational arbitrageur against a constant-product pool, accruing
//! loss-versus-rebalancing (LVR) and swap-fee statistics per path.

pub mod engine;
pub mod path;
pub mod pool;

pub use engine::{evaluate_path, run_sweep, CostSweepPoint, PathSample, SimConfig};
pub use path::{generate_path, path_seed};
pub use pool::PoolState;
