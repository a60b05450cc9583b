//! Metric presentation: fixed per-domain schemas over a result's metrics.

use osched_env::{Domain, Metrics};
use serde::Serialize;

/// Shown in place of a value the service did not send.
pub const NO_VALUE: &str = "—";

/// One labelled metric ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricDescriptor {
    pub key: &'static str,
    pub label: &'static str,
    /// `None` when the key is missing or not a number
    pub value: Option<f64>,
    pub unit: &'static str,
}

impl MetricDescriptor {
    /// Value to two decimals, or [`NO_VALUE`].
    pub fn display_value(&self) -> String {
        self.value
            .map(format_number)
            .unwrap_or_else(|| NO_VALUE.to_string())
    }

    /// Value with its unit appended (percent sign attached, others spaced).
    pub fn display(&self) -> String {
        match (self.value, self.unit) {
            (None, _) => NO_VALUE.to_string(),
            (Some(v), "") => format_number(v),
            (Some(v), "%") => format!("{}%", format_number(v)),
            (Some(v), unit) => format!("{} {}", format_number(v), unit),
        }
    }
}

/// Formats a number with exactly two decimals.
pub fn format_number(value: f64) -> String {
    format!("{:.2}", value)
}

/// `(key, label, unit)` in display order.
pub fn schema(domain: Domain) -> &'static [(&'static str, &'static str, &'static str)] {
    match domain {
        Domain::Cpu => &[
            ("avg_waiting_time", "Avg Waiting Time", "units"),
            ("avg_turnaround_time", "Avg Turnaround Time", "units"),
            ("cpu_utilization", "CPU Utilization", "%"),
            ("throughput", "Throughput", "p/unit"),
        ],
        Domain::Page => &[
            ("page_faults", "Page Faults", ""),
            ("page_hits", "Page Hits", ""),
            ("hit_ratio", "Hit Ratio", "%"),
            ("fault_ratio", "Fault Ratio", "%"),
        ],
        Domain::Disk => &[
            ("total_seek", "Total Seek Time", "cyl"),
            ("avg_seek", "Avg Seek Time", "cyl"),
            ("max_seek", "Max Seek", "cyl"),
            ("min_seek", "Min Seek", "cyl"),
        ],
    }
}

/// Applies the domain schema to `metrics`. Missing keys become `None`.
pub fn present(domain: Domain, metrics: &Metrics) -> Vec<MetricDescriptor> {
    schema(domain)
        .iter()
        .map(|&(key, label, unit)| MetricDescriptor {
            key,
            label,
            value: metrics.get(key),
            unit,
        })
        .collect()
}

/// Axis label for a metric on the comparison chart.
pub fn comparison_label(domain: Domain, key: &str) -> String {
    let label = match (domain, key) {
        (Domain::Cpu, "avg_waiting_time") => "Average Waiting Time",
        (Domain::Cpu, "avg_turnaround_time") => "Average Turnaround Time",
        (Domain::Cpu, "cpu_utilization") => "CPU Utilization (%)",
        (Domain::Cpu, "throughput") => "Throughput",
        (Domain::Disk, "total_seek") => "Total Seek Time",
        (Domain::Disk, "avg_seek") => "Average Seek Time",
        (Domain::Page, "page_faults") => "Page Faults",
        (Domain::Page, "hit_ratio") => "Hit Ratio (%)",
        _ => key,
    };
    label.to_string()
}
