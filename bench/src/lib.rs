//! Benchmark utilities for the Pivot engine.
//!
//! - **Microbenchmarks**: entity and component operations, event dispatch, script loading
//! - **Scenario benchmarks**: physics driven by a native callback or by PivotScript, and event
//!   cascades
//!
//! # Running Benchmarks
//!
//! ```bash
//! # Run all benchmarks
//! cargo bench -p pivot_bench
//!
//! # Run specific benchmark group
//! cargo bench -p pivot_bench -- dispatch
//! ```
//!
//! Results are written to `target/criterion/` with HTML reports for visualization.

pub mod components;
pub mod scenarios;
