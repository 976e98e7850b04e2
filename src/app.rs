//! Application state and logic for sysdelta.
//!
//! This module contains the main [`App`] struct which owns the sampling
//! loop's state: the previous snapshot, the latest rates, the rolling
//! history and the cached GPU reading.

use std::path::PathBuf;

use serde::Serialize;
use tracing::{debug, info};

use crate::availability::MetricAvailability;
use crate::config::Config;
use crate::error::Result;
use crate::gpu::{GpuReader, GpuReading};
use crate::history::{RateHistory, RateSample};
use crate::host::HostInfo;
use crate::process::{self, ProcessSignal};
use crate::rates::{compute_rates, ProcessRate, RateResult};
use crate::snapshot::{Snapshot, SnapshotBuilder};
use crate::thresholds::Thresholds;

/// Process table ordering.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    Cpu,
    Memory,
}

impl SortKey {
    pub fn toggle(self) -> Self {
        match self {
            SortKey::Cpu => SortKey::Memory,
            SortKey::Memory => SortKey::Cpu,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortKey::Cpu => "CPU",
            SortKey::Memory => "MEM",
        }
    }
}

/// One row of the process table: a current process joined with its rates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: String,
    pub owner: String,
    pub state: String,
    pub rss_kb: u64,
    pub threads: u64,
    /// Target of the executable link, when readable
    pub exe: Option<PathBuf>,
    pub rate: ProcessRate,
}

/// Main application state.
///
/// Holds configuration, the previous snapshot, rate history, and the
/// slower-cadence GPU reading.
pub struct App {
    /// Application configuration from CLI
    pub config: Config,

    builder: SnapshotBuilder,

    /// Latest snapshot; the baseline for the next pass
    previous: Option<Snapshot>,

    /// Rates from the latest pass (None until two snapshots exist)
    rates: Option<RateResult>,

    /// Rolling window for charts
    pub history: RateHistory,

    gpu_reader: GpuReader,

    /// Cached GPU reading (collected every `gpu_every` passes)
    last_gpu: Option<GpuReading>,

    /// Counter for GPU collection interval
    gpu_collection_counter: u32,

    /// Metric source availability
    pub availability: MetricAvailability,

    /// Threshold configuration
    pub thresholds: Thresholds,

    /// Static processor and kernel facts
    pub host: HostInfo,

    passes: u64,
}

impl App {
    /// Create a new application instance, probing optional sources once.
    pub fn new(config: Config) -> Self {
        let paths = config.host_paths();
        let gpu_reader = GpuReader::probe(&paths.sys_root);
        Self::with_gpu_reader(config, gpu_reader)
    }

    /// Create an instance with an explicit GPU reader.
    pub fn with_gpu_reader(config: Config, gpu_reader: GpuReader) -> Self {
        let paths = config.host_paths();
        let availability = MetricAvailability::probe(&paths, gpu_reader.tool_available());
        let host = HostInfo::collect(&paths);
        let history = RateHistory::new(config.history_size);
        info!(
            cpu = %host.cpu_model,
            kernel = %host.kernel_version,
            gpu_tool = gpu_reader.tool_available(),
            "collector ready"
        );

        Self {
            config,
            builder: SnapshotBuilder::new(paths),
            previous: None,
            rates: None,
            history,
            gpu_reader,
            last_gpu: None,
            gpu_collection_counter: 0,
            availability,
            thresholds: Thresholds::default(),
            host,
            passes: 0,
        }
    }

    /// Run one sampling pass.
    ///
    /// The first pass only primes the baseline. Later passes compute rates
    /// against the previous snapshot using the measured elapsed time, or the
    /// nominal interval if the clock did not advance.
    ///
    /// # Errors
    ///
    /// A required-source failure is returned and the previous snapshot is
    /// left in place, so the next successful pass still has a baseline.
    pub fn collect(&mut self) -> Result<()> {
        let current = self.builder.build()?;
        self.passes += 1;

        // === Collect GPU stats (first pass, then every gpu_every passes) ===
        self.gpu_collection_counter += 1;
        if self.gpu_collection_counter >= self.config.gpu_every || self.last_gpu.is_none() {
            self.last_gpu = Some(self.gpu_reader.read());
            self.gpu_collection_counter = 0;
        }

        if let Some(previous) = &self.previous {
            let measured = current.elapsed_since(previous);
            let interval = if measured > 0.0 {
                measured
            } else {
                self.config.interval as f64
            };
            let rates = compute_rates(previous, &current, interval);
            self.history.push(RateSample::from_pass(&current, &rates));
            debug!(
                interval,
                cpu = rates.cpu_percent,
                processes = rates.processes.len(),
                "pass complete"
            );
            self.rates = Some(rates);
        } else {
            debug!("baseline snapshot captured");
        }

        self.previous = Some(current);
        Ok(())
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.previous.as_ref()
    }

    pub fn rates(&self) -> Option<&RateResult> {
        self.rates.as_ref()
    }

    /// Latest GPU reading; unavailable before the first pass.
    pub fn gpu(&self) -> GpuReading {
        self.last_gpu.clone().unwrap_or_default()
    }

    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// Current processes joined with their rates, sorted and truncated.
    pub fn top_processes(&self, sort: SortKey, limit: usize) -> Vec<ProcessRow> {
        let Some(snapshot) = &self.previous else {
            return Vec::new();
        };
        let mut rows: Vec<ProcessRow> = snapshot
            .processes
            .values()
            .map(|p| ProcessRow {
                pid: p.pid,
                name: p.name.clone(),
                owner: p.owner.clone(),
                state: p.state.clone(),
                rss_kb: p.rss_kb,
                threads: p.threads,
                exe: None,
                rate: self
                    .rates
                    .as_ref()
                    .and_then(|r| r.processes.get(&p.pid).copied())
                    .unwrap_or_default(),
            })
            .collect();
        sort_rows(&mut rows, sort);
        rows.truncate(limit);
        for row in &mut rows {
            row.exe = process::process_executable(self.builder.paths(), row.pid);
        }
        rows
    }

    /// Send SIGTERM (or SIGKILL when `force`) to `pid`.
    pub fn terminate(&self, pid: u32, force: bool) -> std::io::Result<()> {
        let signal = if force {
            ProcessSignal::Kill
        } else {
            ProcessSignal::Terminate
        };
        process::send_signal(pid, signal)?;
        info!(pid, ?signal, "signal sent");
        Ok(())
    }
}

pub fn sort_rows(rows: &mut [ProcessRow], sort: SortKey) {
    match sort {
        SortKey::Cpu => rows.sort_by(|a, b| {
            b.rate
                .cpu_percent
                .total_cmp(&a.rate.cpu_percent)
                .then(b.rss_kb.cmp(&a.rss_kb))
                .then(a.pid.cmp(&b.pid))
        }),
        SortKey::Memory => rows.sort_by(|a, b| b.rss_kb.cmp(&a.rss_kb).then(a.pid.cmp(&b.pid))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pid: u32, cpu: f64, rss_kb: u64) -> ProcessRow {
        ProcessRow {
            pid,
            name: format!("p{pid}"),
            owner: "root".into(),
            state: "S".into(),
            rss_kb,
            threads: 1,
            exe: None,
            rate: ProcessRate {
                cpu_percent: cpu,
                ..Default::default()
            },
        }
    }

    #[test]
    fn sort_by_cpu_then_memory() {
        let mut rows = vec![row(1, 5.0, 10), row(2, 50.0, 5), row(3, 5.0, 99)];
        sort_rows(&mut rows, SortKey::Cpu);
        let pids: Vec<u32> = rows.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![2, 3, 1]);

        sort_rows(&mut rows, SortKey::Memory);
        let pids: Vec<u32> = rows.iter().map(|r| r.pid).collect();
        assert_eq!(pids, vec![3, 1, 2]);
    }

    #[test]
    fn sort_key_toggles() {
        assert_eq!(SortKey::Cpu.toggle(), SortKey::Memory);
        assert_eq!(SortKey::Memory.toggle().label(), "CPU");
    }
}
