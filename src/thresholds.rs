//! Threshold definitions for sysdelta.
//!
//! Severity levels decide the dashboard's chart and panel border colours.

/// Severity level for a metric.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operating range
    #[default]
    Normal,
    /// Approaching problematic levels
    Warning,
    /// Critical - immediate attention needed
    Critical,
}

/// Threshold configuration for all monitored metrics.
#[derive(Clone, Debug)]
pub struct Thresholds {
    /// CPU usage warning threshold (%)
    pub cpu_usage_warning: f64,
    /// CPU usage critical threshold (%)
    pub cpu_usage_critical: f64,
    /// Memory used warning threshold (%)
    pub memory_used_warning: f64,
    /// Memory used critical threshold (%)
    pub memory_used_critical: f64,
    /// Disk busy warning threshold (%)
    pub disk_active_warning: f64,
    /// Disk busy critical threshold (%)
    pub disk_active_critical: f64,
    /// GPU temperature warning threshold (C)
    pub gpu_temp_warning: f64,
    /// GPU temperature critical threshold (C)
    pub gpu_temp_critical: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_usage_warning: 80.0,
            cpu_usage_critical: 95.0,
            memory_used_warning: 85.0,
            memory_used_critical: 95.0,
            disk_active_warning: 70.0,
            disk_active_critical: 90.0,
            gpu_temp_warning: 80.0,
            gpu_temp_critical: 95.0,
        }
    }
}

fn level(value: f64, warning: f64, critical: f64) -> Severity {
    if value >= critical {
        Severity::Critical
    } else if value >= warning {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

impl Thresholds {
    pub fn cpu_usage_severity(&self, value: f64) -> Severity {
        level(value, self.cpu_usage_warning, self.cpu_usage_critical)
    }

    pub fn memory_used_severity(&self, percent: f64) -> Severity {
        level(percent, self.memory_used_warning, self.memory_used_critical)
    }

    pub fn disk_active_severity(&self, percent: f64) -> Severity {
        level(percent, self.disk_active_warning, self.disk_active_critical)
    }

    /// Unmeasured temperature is never an alert.
    pub fn gpu_temp_severity(&self, value: Option<f64>) -> Severity {
        value
            .map(|t| level(t, self.gpu_temp_warning, self.gpu_temp_critical))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpu_levels() {
        let t = Thresholds::default();
        assert_eq!(t.cpu_usage_severity(10.0), Severity::Normal);
        assert_eq!(t.cpu_usage_severity(80.0), Severity::Warning);
        assert_eq!(t.cpu_usage_severity(99.0), Severity::Critical);
    }

    #[test]
    fn gpu_temp_unknown_is_normal() {
        let t = Thresholds::default();
        assert_eq!(t.gpu_temp_severity(None), Severity::Normal);
        assert_eq!(t.gpu_temp_severity(Some(96.0)), Severity::Critical);
    }

    #[test]
    fn severities_order() {
        assert!(Severity::Critical > Severity::Warning);
        assert!(Severity::Warning > Severity::Normal);
    }
}
