//! Snapshot building.
//!
//! A [`Snapshot`] is every counter reader and identity resolver run once,
//! back to back, and treated as one instant. It is never mutated after
//! [`SnapshotBuilder::build`] returns it; rate computation only ever reads
//! two of them.

use std::collections::{BTreeMap, HashMap};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::collectors::{
    self, read_optional, CpuTimes, DiskSample, FilesystemUsage, HostPaths, LoadAverage,
    MemorySample, NetSample, SwapArea, SECTOR_SIZE,
};
use crate::error::Result;
use crate::identity::{self, UserTable};
use crate::process;

/// Loopback never counts toward reported traffic.
pub const LOOPBACK: &str = "lo";

/// One process as seen in one sampling pass.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    pub state: String,
    pub ppid: u32,
    /// Resolved owner name, or the numeric uid if unresolvable
    pub owner: String,
    pub rss_kb: u64,
    /// utime + stime + cutime + cstime, in ticks
    pub active_ticks: u64,
    pub start_ticks: u64,
    pub threads: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Bytes moved since boot, summed over whole disks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DiskTotals {
    pub read_bytes: u64,
    pub written_bytes: u64,
}

/// Immutable capture of all monitored counters at one instant.
#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    /// Monotonic capture time, used to measure the interval between passes
    #[serde(skip)]
    pub taken_at: Instant,
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuTimes,
    /// Current clock of the first core, when the kernel reports one
    pub cpu_mhz: Option<f64>,
    pub memory: MemorySample,
    pub processes: HashMap<u32, ProcessSample>,
    /// Primary disk: the parent device of the root filesystem
    pub disk_name: String,
    pub disk: DiskSample,
    /// Whole block devices, excluding loop, ram and device-mapper nodes
    pub disks: BTreeMap<String, DiskSample>,
    /// Primary interface: the one carrying the default route
    pub interface: String,
    pub net: NetSample,
    /// Every interface except loopback
    pub interfaces: BTreeMap<String, NetSample>,
    pub load: LoadAverage,
    pub uptime_secs: f64,
    pub swaps: Vec<SwapArea>,
    pub filesystems: Vec<FilesystemUsage>,
}

impl Snapshot {
    /// A snapshot carrying only the required counters, for callers that
    /// synthesize a baseline.
    pub fn new(cpu: CpuTimes, memory: MemorySample) -> Self {
        Self {
            taken_at: Instant::now(),
            timestamp: Utc::now(),
            cpu,
            cpu_mhz: None,
            memory,
            processes: HashMap::new(),
            disk_name: identity::FALLBACK_DISK.to_string(),
            disk: DiskSample::default(),
            disks: BTreeMap::new(),
            interface: identity::FALLBACK_INTERFACE.to_string(),
            net: NetSample::default(),
            interfaces: BTreeMap::new(),
            load: LoadAverage::default(),
            uptime_secs: 0.0,
            swaps: Vec::new(),
            filesystems: Vec::new(),
        }
    }

    /// Monotonic seconds between `previous` and this snapshot.
    pub fn elapsed_since(&self, previous: &Snapshot) -> f64 {
        self.taken_at
            .saturating_duration_since(previous.taken_at)
            .as_secs_f64()
    }

    pub fn process_count(&self) -> usize {
        self.processes.len()
    }

    pub fn total_threads(&self) -> u64 {
        self.processes.values().map(|p| p.threads).sum()
    }

    /// Cumulative read and written bytes across `disks`.
    ///
    /// Partitions are already folded into their parent, so nothing is
    /// counted twice.
    pub fn disk_totals(&self) -> DiskTotals {
        self.disks
            .values()
            .fold(DiskTotals::default(), |totals, disk| DiskTotals {
                read_bytes: totals
                    .read_bytes
                    .saturating_add(disk.sectors_read.saturating_mul(SECTOR_SIZE)),
                written_bytes: totals
                    .written_bytes
                    .saturating_add(disk.sectors_written.saturating_mul(SECTOR_SIZE)),
            })
    }
}

/// Composes the readers into one [`Snapshot`].
#[derive(Clone, Debug, Default)]
pub struct SnapshotBuilder {
    paths: HostPaths,
}

impl SnapshotBuilder {
    pub fn new(paths: HostPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &HostPaths {
        &self.paths
    }

    /// Capture "now".
    ///
    /// # Errors
    ///
    /// Returns [`crate::CollectError::RequiredSource`] when the aggregate CPU
    /// line or the memory counters cannot be read. Every other source
    /// degrades to empty or zero.
    pub fn build(&self) -> Result<Snapshot> {
        let taken_at = Instant::now();
        let timestamp = Utc::now();

        let cpu = collectors::read_cpu_times(&self.paths)?;
        let memory = collectors::read_meminfo(&self.paths)?;

        let users = UserTable::load(&self.paths.passwd);
        let processes = self.read_processes(&users);

        let all_disks = collectors::read_diskstats(&self.paths);
        let mounts = read_optional(&self.paths.proc("mounts")).unwrap_or_default();
        let disk_name = identity::primary_disk(&mounts, &all_disks);
        let disk = all_disks.get(&disk_name).copied().unwrap_or_default();
        let disks = whole_disks(&all_disks);

        let mut interfaces = collectors::read_net_dev(&self.paths);
        interfaces.remove(LOOPBACK);
        let route = read_optional(&self.paths.proc("net/route")).unwrap_or_default();
        let interface = identity::primary_interface(&route);
        let net = interfaces.get(&interface).copied().unwrap_or_default();

        Ok(Snapshot {
            taken_at,
            timestamp,
            cpu,
            cpu_mhz: collectors::read_cpu_mhz(&self.paths),
            memory,
            processes,
            disk_name,
            disk,
            disks,
            interface,
            net,
            interfaces,
            load: collectors::read_loadavg(&self.paths),
            uptime_secs: collectors::read_uptime(&self.paths),
            swaps: collectors::read_swaps(&self.paths),
            filesystems: collectors::read_filesystems(&self.paths),
        })
    }

    fn read_processes(&self, users: &UserTable) -> HashMap<u32, ProcessSample> {
        let mut processes = HashMap::new();
        for pid in process::list_pids(&self.paths) {
            let (Some(status), Some(stat)) = (
                process::read_status(&self.paths, pid),
                process::read_stat(&self.paths, pid),
            ) else {
                debug!(pid, "process vanished during sampling");
                continue;
            };
            let io = process::read_io(&self.paths, pid);
            processes.insert(
                pid,
                ProcessSample {
                    pid,
                    name: status.name,
                    state: status.state,
                    ppid: status.ppid,
                    owner: users.resolve(status.uid),
                    rss_kb: status.rss_kb,
                    active_ticks: stat.active_ticks,
                    start_ticks: stat.start_ticks,
                    threads: status.threads,
                    read_bytes: io.read_bytes,
                    write_bytes: io.write_bytes,
                },
            );
        }
        processes
    }
}

/// Drop virtual devices and partitions whose parent disk is also listed.
fn whole_disks(all: &BTreeMap<String, DiskSample>) -> BTreeMap<String, DiskSample> {
    all.iter()
        .filter(|(name, _)| !is_virtual_device(name))
        .filter(|(name, _)| {
            let parent = identity::parent_block_device(name);
            parent == name.as_str() || !all.contains_key(parent)
        })
        .map(|(name, sample)| (name.clone(), *sample))
        .collect()
}

fn is_virtual_device(name: &str) -> bool {
    ["loop", "ram", "zram", "dm-"]
        .iter()
        .any(|prefix| name.starts_with(prefix))
}
