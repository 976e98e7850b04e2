//! Sampling and delta-rate engine behind the `sysdelta` binary.
//!
//! ## Module Organization
//!
//! - [`collectors`]: Readers for the system-wide counter files under `/proc`
//! - [`process`]: Per-process readers and signal delivery
//! - [`identity`]: Owner names, primary disk and primary interface
//! - [`gpu`]: AMD GPU reading from `rocm-smi` or sysfs
//! - [`snapshot`]: One timestamped sample of every counter
//! - [`rates`]: Pure conversion of two snapshots into rates
//! - [`history`]: Rolling window of rate samples
//! - [`app`]: Caller loop state and coordination
//! - [`ui`]: Terminal dashboard, headless lines and the one-shot report

pub mod app;
pub mod availability;
pub mod collectors;
pub mod config;
pub mod error;
pub mod gpu;
pub mod history;
pub mod host;
pub mod identity;
pub mod process;
pub mod rates;
pub mod snapshot;
pub mod thresholds;
pub mod ui;

pub use collectors::HostPaths;
pub use error::{CollectError, Result};
pub use gpu::GpuReading;
pub use rates::{compute_rates, RateResult};
pub use snapshot::{Snapshot, SnapshotBuilder};
