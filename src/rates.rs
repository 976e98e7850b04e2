//! Delta engine: two snapshots in, rates out.
//!
//! [`compute_rates`] is a pure function of its arguments. The caller owns
//! the previous snapshot and measures the interval; nothing here keeps state
//! between passes or assumes a polling period.
//!
//! Counter decreases are treated as resets and clamp to zero, so no rate is
//! ever negative or NaN.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::collectors::{CpuTimes, DiskSample, NetSample, SECTOR_SIZE};
use crate::snapshot::{ProcessSample, Snapshot};

/// Per-process rates for one pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct ProcessRate {
    pub cpu_percent: f64,
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct DiskRate {
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
    /// Share of the interval the device was busy, within [0, 100]
    pub active_percent: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct NetRate {
    pub rx_bits_per_sec: f64,
    pub tx_bits_per_sec: f64,
}

/// Everything one owner's processes add up to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct OwnerTotals {
    pub processes: usize,
    pub cpu_percent: f64,
    pub memory_kb: u64,
    pub read_bytes_per_sec: f64,
    pub write_bytes_per_sec: f64,
}

/// Rates derived from one (previous, current) pair.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct RateResult {
    pub interval_secs: f64,
    pub cpu_percent: f64,
    /// Keyed by pid; only processes alive in the current snapshot
    pub processes: HashMap<u32, ProcessRate>,
    /// Primary disk
    pub disk: DiskRate,
    pub disks: BTreeMap<String, DiskRate>,
    /// Primary interface
    pub net: NetRate,
    pub interfaces: BTreeMap<String, NetRate>,
    pub owners: BTreeMap<String, OwnerTotals>,
}

/// Compute all rates between two snapshots taken `interval_secs` apart.
///
/// Tick-based percentages do not depend on the interval. Time-normalized
/// rates are zero when the interval is not a positive finite number.
pub fn compute_rates(previous: &Snapshot, current: &Snapshot, interval_secs: f64) -> RateResult {
    let delta_total = current
        .cpu
        .total_time()
        .saturating_sub(previous.cpu.total_time());
    let per_sec = PerSecond::new(interval_secs);

    let processes: HashMap<u32, ProcessRate> = current
        .processes
        .values()
        .map(|proc_now| {
            let rate = match previous.processes.get(&proc_now.pid) {
                Some(proc_before) if same_process(proc_before, proc_now) => {
                    process_rate(proc_before, proc_now, delta_total, per_sec)
                }
                _ => ProcessRate::default(),
            };
            (proc_now.pid, rate)
        })
        .collect();

    let owners = aggregate_owners(current.processes.values(), &processes);

    let disk = if previous.disk_name == current.disk_name {
        disk_rate(&previous.disk, &current.disk, per_sec)
    } else {
        DiskRate::default()
    };
    let disks = current
        .disks
        .iter()
        .filter_map(|(name, now)| {
            let before = previous.disks.get(name)?;
            Some((name.clone(), disk_rate(before, now, per_sec)))
        })
        .collect();

    let net = if previous.interface == current.interface {
        net_rate(&previous.net, &current.net, per_sec)
    } else {
        NetRate::default()
    };
    let interfaces = current
        .interfaces
        .iter()
        .filter_map(|(name, now)| {
            let before = previous.interfaces.get(name)?;
            Some((name.clone(), net_rate(before, now, per_sec)))
        })
        .collect();

    RateResult {
        interval_secs,
        cpu_percent: cpu_percent(&previous.cpu, &current.cpu),
        processes,
        disk,
        disks,
        net,
        interfaces,
        owners,
    }
}

/// Global CPU busy share: `100 * (1 - dIdle / dTotal)`, or 0 without progress.
pub fn cpu_percent(previous: &CpuTimes, current: &CpuTimes) -> f64 {
    let delta_total = current.total_time().saturating_sub(previous.total_time());
    if delta_total == 0 {
        return 0.0;
    }
    let delta_idle = current.idle_time().saturating_sub(previous.idle_time());
    let busy = 100.0 * (1.0 - delta_idle as f64 / delta_total as f64);
    busy.clamp(0.0, 100.0)
}

/// A pid seen twice is the same process only if its start time matches.
fn same_process(before: &ProcessSample, now: &ProcessSample) -> bool {
    before.start_ticks == now.start_ticks
}

fn process_rate(
    before: &ProcessSample,
    now: &ProcessSample,
    delta_total: u64,
    per_sec: PerSecond,
) -> ProcessRate {
    let cpu_percent = if delta_total == 0 {
        0.0
    } else {
        let ticks = now.active_ticks.saturating_sub(before.active_ticks);
        100.0 * ticks as f64 / delta_total as f64
    };
    ProcessRate {
        cpu_percent,
        read_bytes_per_sec: per_sec.of(now.read_bytes.saturating_sub(before.read_bytes)),
        write_bytes_per_sec: per_sec.of(now.write_bytes.saturating_sub(before.write_bytes)),
    }
}

fn disk_rate(before: &DiskSample, now: &DiskSample, per_sec: PerSecond) -> DiskRate {
    let delta = before.delta(now);
    let active_percent = match per_sec.interval() {
        Some(secs) => (100.0 * delta.io_time_ms as f64 / (secs * 1000.0)).clamp(0.0, 100.0),
        None => 0.0,
    };
    DiskRate {
        read_bytes_per_sec: per_sec.of(delta.sectors_read.saturating_mul(SECTOR_SIZE)),
        write_bytes_per_sec: per_sec.of(delta.sectors_written.saturating_mul(SECTOR_SIZE)),
        active_percent,
    }
}

fn net_rate(before: &NetSample, now: &NetSample, per_sec: PerSecond) -> NetRate {
    let delta = before.delta(now);
    NetRate {
        rx_bits_per_sec: per_sec.of(delta.rx_bytes.saturating_mul(8)),
        tx_bits_per_sec: per_sec.of(delta.tx_bytes.saturating_mul(8)),
    }
}

/// Fold every current process into its owner's totals.
fn aggregate_owners<'a>(
    processes: impl Iterator<Item = &'a ProcessSample>,
    rates: &HashMap<u32, ProcessRate>,
) -> BTreeMap<String, OwnerTotals> {
    let mut owners: BTreeMap<String, OwnerTotals> = BTreeMap::new();
    for process in processes {
        let rate = rates.get(&process.pid).copied().unwrap_or_default();
        let totals = owners.entry(process.owner.clone()).or_default();
        totals.processes += 1;
        totals.cpu_percent += rate.cpu_percent;
        totals.memory_kb = totals.memory_kb.saturating_add(process.rss_kb);
        totals.read_bytes_per_sec += rate.read_bytes_per_sec;
        totals.write_bytes_per_sec += rate.write_bytes_per_sec;
    }
    owners
}

/// Divides counter deltas by a validated interval.
#[derive(Clone, Copy, Debug)]
struct PerSecond(Option<f64>);

impl PerSecond {
    fn new(interval_secs: f64) -> Self {
        Self((interval_secs.is_finite() && interval_secs > 0.0).then_some(interval_secs))
    }

    fn interval(self) -> Option<f64> {
        self.0
    }

    fn of(self, delta: u64) -> f64 {
        self.0.map_or(0.0, |secs| delta as f64 / secs)
    }
}

impl RateResult {
    /// Processes sorted by descending CPU share, ties broken by pid.
    pub fn busiest(&self) -> Vec<(u32, ProcessRate)> {
        let mut ranked: Vec<(u32, ProcessRate)> =
            self.processes.iter().map(|(pid, r)| (*pid, *r)).collect();
        ranked.sort_by(|a, b| b.1.cpu_percent.total_cmp(&a.1.cpu_percent).then(a.0.cmp(&b.0)));
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collectors::MemorySample;

    fn cpu(user: u64, system: u64, idle: u64) -> CpuTimes {
        CpuTimes {
            user,
            system,
            idle,
            ..Default::default()
        }
    }

    fn proc_sample(pid: u32, owner: &str, ticks: u64) -> ProcessSample {
        ProcessSample {
            pid,
            name: format!("p{pid}"),
            state: "S".into(),
            owner: owner.into(),
            active_ticks: ticks,
            start_ticks: 1000 + pid as u64,
            ..Default::default()
        }
    }

    fn snapshot(cpu: CpuTimes, processes: Vec<ProcessSample>) -> Snapshot {
        let mut snap = Snapshot::new(cpu, MemorySample::default());
        snap.processes = processes.into_iter().map(|p| (p.pid, p)).collect();
        snap
    }

    #[test]
    fn global_cpu_seventy_percent() {
        let prev = cpu(100, 50, 850);
        let curr = cpu(150, 70, 880);
        assert_eq!(prev.total_time(), 1000);
        assert_eq!(curr.total_time(), 1100);
        assert!((cpu_percent(&prev, &curr) - 70.0).abs() < 1e-9);
    }

    #[test]
    fn global_cpu_zero_without_progress() {
        let same = cpu(100, 50, 850);
        assert_eq!(cpu_percent(&same, &same), 0.0);
        // counter reset: totals go backwards
        let after_reboot = cpu(1, 1, 10);
        let pct = cpu_percent(&same, &after_reboot);
        assert_eq!(pct, 0.0);
        assert!(!pct.is_nan());
    }

    #[test]
    fn global_cpu_stays_in_range() {
        // idle grows faster than total when other fields reset
        let prev = cpu(500, 0, 100);
        let curr = cpu(0, 0, 700);
        let pct = cpu_percent(&prev, &curr);
        assert!((0.0..=100.0).contains(&pct));
    }

    #[test]
    fn process_share_of_total_ticks() {
        let prev = snapshot(cpu(100, 50, 850), vec![proc_sample(7, "alice", 200)]);
        let curr = snapshot(cpu(150, 70, 880), vec![proc_sample(7, "alice", 230)]);
        let rates = compute_rates(&prev, &curr, 1.0);
        assert!((rates.processes[&7].cpu_percent - 30.0).abs() < 1e-9);
    }

    #[test]
    fn exited_process_is_dropped_and_new_one_is_zero() {
        let prev = snapshot(
            cpu(100, 50, 850),
            vec![proc_sample(1, "root", 10), proc_sample(2, "root", 500)],
        );
        let curr = snapshot(
            cpu(150, 70, 880),
            vec![proc_sample(1, "root", 20), proc_sample(3, "bob", 900)],
        );
        let rates = compute_rates(&prev, &curr, 1.0);
        assert!(!rates.processes.contains_key(&2));
        assert_eq!(rates.processes[&3].cpu_percent, 0.0);
        assert_eq!(rates.processes.len(), 2);
    }

    #[test]
    fn reused_pid_counts_as_new() {
        let prev = snapshot(cpu(0, 0, 0), vec![proc_sample(9, "root", 10)]);
        let mut reborn = proc_sample(9, "root", 50);
        reborn.start_ticks += 5000;
        reborn.read_bytes = 4096;
        let curr = snapshot(cpu(50, 0, 50), vec![reborn]);
        let rates = compute_rates(&prev, &curr, 1.0);
        assert_eq!(rates.processes[&9], ProcessRate::default());
    }

    #[test]
    fn process_io_clamps_resets() {
        let mut before = proc_sample(4, "root", 0);
        before.read_bytes = 10_000;
        before.write_bytes = 1_000;
        let mut after = before.clone();
        after.read_bytes = 500;
        after.write_bytes = 3_000;
        let prev = snapshot(cpu(0, 0, 100), vec![before]);
        let curr = snapshot(cpu(0, 0, 200), vec![after]);
        let rates = compute_rates(&prev, &curr, 2.0);
        assert_eq!(rates.processes[&4].read_bytes_per_sec, 0.0);
        assert_eq!(rates.processes[&4].write_bytes_per_sec, 1_000.0);
    }

    #[test]
    fn disk_read_throughput() {
        let mut prev = snapshot(cpu(0, 0, 100), vec![]);
        let mut curr = snapshot(cpu(0, 0, 200), vec![]);
        prev.disk.sectors_read = 1000;
        curr.disk.sectors_read = 1512;
        let rates = compute_rates(&prev, &curr, 1.0);
        assert_eq!(rates.disk.read_bytes_per_sec, 262_144.0);
    }

    #[test]
    fn disk_active_percent_is_clamped() {
        let mut prev = snapshot(cpu(0, 0, 100), vec![]);
        let mut curr = snapshot(cpu(0, 0, 200), vec![]);
        prev.disk.io_time_ms = 0;
        curr.disk.io_time_ms = 5_000;
        let rates = compute_rates(&prev, &curr, 1.0);
        assert_eq!(rates.disk.active_percent, 100.0);

        curr.disk.io_time_ms = 250;
        let rates = compute_rates(&prev, &curr, 1.0);
        assert!((rates.disk.active_percent - 25.0).abs() < 1e-9);

        // counter went backwards
        prev.disk.io_time_ms = 10_000;
        let rates = compute_rates(&prev, &curr, 1.0);
        assert_eq!(rates.disk.active_percent, 0.0);
    }

    #[test]
    fn network_bits_and_reset() {
        let mut prev = snapshot(cpu(0, 0, 100), vec![]);
        let mut curr = snapshot(cpu(0, 0, 200), vec![]);
        prev.net = NetSample {
            rx_bytes: 1_000,
            tx_bytes: 9_000,
        };
        curr.net = NetSample {
            rx_bytes: 2_000,
            tx_bytes: 10,
        };
        let rates = compute_rates(&prev, &curr, 2.0);
        assert_eq!(rates.net.rx_bits_per_sec, 4_000.0);
        assert_eq!(rates.net.tx_bits_per_sec, 0.0);
    }

    #[test]
    fn devices_must_exist_in_both() {
        let mut prev = snapshot(cpu(0, 0, 100), vec![]);
        let mut curr = snapshot(cpu(0, 0, 200), vec![]);
        prev.disks.insert("sda".into(), DiskSample::default());
        curr.disks.insert("sda".into(), DiskSample::default());
        curr.disks.insert("sdb".into(), DiskSample::default());
        prev.interfaces.insert("usb0".into(), NetSample::default());
        curr.interfaces.insert("eth0".into(), NetSample::default());
        let rates = compute_rates(&prev, &curr, 1.0);
        assert!(rates.disks.contains_key("sda"));
        assert!(!rates.disks.contains_key("sdb"));
        assert!(rates.interfaces.is_empty());
    }

    #[test]
    fn owner_memory_is_sum_of_processes() {
        let mut procs = Vec::new();
        for (pid, owner, rss) in [
            (1, "root", 1_000),
            (2, "alice", 20_000),
            (3, "alice", 5_500),
            (4, "1001", 42),
            (5, "alice", 0),
        ] {
            let mut p = proc_sample(pid, owner, 0);
            p.rss_kb = rss;
            procs.push(p);
        }
        let prev = snapshot(cpu(0, 0, 100), procs.clone());
        let curr = snapshot(cpu(0, 0, 200), procs.clone());
        let rates = compute_rates(&prev, &curr, 1.0);

        for (owner, totals) in &rates.owners {
            let expected: u64 = procs
                .iter()
                .filter(|p| &p.owner == owner)
                .map(|p| p.rss_kb)
                .sum();
            assert_eq!(totals.memory_kb, expected, "owner {owner}");
        }
        assert_eq!(rates.owners["alice"].processes, 3);
        assert_eq!(rates.owners["alice"].memory_kb, 25_500);
        assert!(rates.owners.contains_key("1001"));
    }

    #[test]
    fn owners_include_new_processes() {
        let prev = snapshot(cpu(0, 0, 100), vec![proc_sample(1, "root", 0)]);
        let curr = snapshot(
            cpu(50, 0, 150),
            vec![proc_sample(1, "root", 25), proc_sample(2, "carol", 99)],
        );
        let rates = compute_rates(&prev, &curr, 1.0);
        assert_eq!(rates.owners["carol"].processes, 1);
        assert_eq!(rates.owners["carol"].cpu_percent, 0.0);
        assert!((rates.owners["root"].cpu_percent - 25.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_interval_gives_zero_throughput() {
        let mut prev = snapshot(cpu(100, 50, 850), vec![proc_sample(7, "a", 200)]);
        let mut curr = snapshot(cpu(150, 70, 880), vec![proc_sample(7, "a", 230)]);
        prev.disk.sectors_read = 0;
        curr.disk.sectors_read = 100;
        curr.disk.io_time_ms = 100;
        for interval in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let rates = compute_rates(&prev, &curr, interval);
            assert_eq!(rates.disk.read_bytes_per_sec, 0.0);
            assert_eq!(rates.disk.active_percent, 0.0);
            assert!((rates.processes[&7].cpu_percent - 30.0).abs() < 1e-9);
            assert!((rates.cpu_percent - 70.0).abs() < 1e-9);
        }
    }

    #[test]
    fn busiest_orders_by_cpu() {
        let prev = snapshot(
            cpu(0, 0, 0),
            vec![proc_sample(1, "r", 0), proc_sample(2, "r", 0), proc_sample(3, "r", 0)],
        );
        let curr = snapshot(
            cpu(100, 0, 0),
            vec![proc_sample(1, "r", 10), proc_sample(2, "r", 60), proc_sample(3, "r", 10)],
        );
        let order: Vec<u32> = compute_rates(&prev, &curr, 1.0)
            .busiest()
            .into_iter()
            .map(|(pid, _)| pid)
            .collect();
        assert_eq!(order, vec![2, 1, 3]);
    }
}
