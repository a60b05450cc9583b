//! Plain-text rendering of reports for the terminal.

use crate::runner::{AlgorithmEntry, ResultView, SessionReport};
use osched_core::comparison::comparison_keys;
use osched_core::layout::{
    comparison_bars, FaultPoint, FrameCell, FrameGrid, GanttLayout, HeadMovement, PageStatus,
    ProcessStats,
};
use osched_core::metrics::{comparison_label, format_number, NO_VALUE};
use osched_core::{ComparisonResult, MetricDescriptor};
use osched_env::{Domain, HealthStatus};

/// Character columns used for a full-width chart.
pub const CHART_WIDTH: usize = 60;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

pub fn render_report(report: &SessionReport) -> String {
    match report {
        SessionReport::Single {
            result,
            metrics,
            view,
        } => {
            let mut lines = vec![
                format!("{} Scheduling - {}", result.domain().label(), result.algorithm()),
                RULE.to_string(),
            ];
            lines.extend(render_metrics(metrics));
            lines.push(String::new());
            lines.extend(match view {
                ResultView::Cpu { gantt, processes } => {
                    let mut out = render_gantt(gantt, CHART_WIDTH);
                    if !processes.is_empty() {
                        out.push(String::new());
                        out.extend(render_process_table(processes));
                    }
                    out
                }
                ResultView::Page { grid, faults } => render_frame_grid(grid, faults),
                ResultView::Disk {
                    movement,
                    sequence,
                    inconsistency,
                } => {
                    let mut out = render_head_movement(movement, sequence);
                    if let Some(problem) = inconsistency {
                        out.push(format!("warning: {}", problem));
                    }
                    out
                }
            });
            lines.join("\n")
        }
        SessionReport::Comparison(result) => render_comparison(result).join("\n"),
    }
}

pub fn render_metrics(metrics: &[MetricDescriptor]) -> Vec<String> {
    let width = metrics.iter().map(|m| m.label.len()).max().unwrap_or(0);
    metrics
        .iter()
        .map(|m| format!("  {:<width$}  {}", m.label, m.display(), width = width))
        .collect()
}

/// Maps a percentage onto `[0, width]` character columns.
fn column(pct: f64, width: usize) -> usize {
    let col = (pct / 100.0 * width as f64).round();
    (col.max(0.0) as usize).min(width)
}

/// One row per process; a bar fills the columns its slice covers.
pub fn render_gantt(layout: &GanttLayout, width: usize) -> Vec<String> {
    let mut lines = vec!["Gantt chart".to_string()];
    if layout.bars.is_empty() {
        lines.push("  (empty timeline)".to_string());
        return lines;
    }

    for lane in &layout.lanes {
        let mut row = vec![' '; width];
        for &index in &lane.bars {
            let bar = &layout.bars[index];
            let from = column(bar.left_pct, width);
            let to = column(bar.left_pct + bar.width_pct, width).max(from);
            for cell in &mut row[from..to] {
                *cell = '█';
            }
        }
        lines.push(format!(
            "  P{:<4}|{}| {}",
            lane.pid,
            row.into_iter().collect::<String>(),
            format_number(lane.busy)
        ));
    }

    let end = format_number(layout.max_time);
    lines.push(format!(
        "       0{:>pad$}",
        end,
        pad = width.saturating_sub(1).max(end.len())
    ));
    lines
}

pub fn render_process_table(processes: &[ProcessStats]) -> Vec<String> {
    let mut lines = vec![format!(
        "  {:>4} {:>8} {:>6} {:>8} {:>6} {:>7} {:>10} {:>8} {:>8}",
        "PID",
        "Arrival",
        "Burst",
        "Priority",
        "Start",
        "Finish",
        "Turnaround",
        "Waiting",
        "Response"
    )];
    for p in processes {
        lines.push(format!(
            "  {:>4} {:>8} {:>6} {:>8} {:>6} {:>7} {:>10} {:>8} {:>8}",
            p.pid,
            p.arrival,
            p.burst,
            p.priority,
            p.start,
            p.finish,
            p.turnaround,
            p.waiting,
            p.response
        ));
    }
    lines
}

fn frame_cell(cell: &FrameCell) -> String {
    match cell {
        FrameCell::Empty => format!("{:>4}", NO_VALUE),
        FrameCell::Faulted(page) => format!("{:>3}*", page),
        FrameCell::Hit(page) => format!("{:>3}+", page),
        FrameCell::Resident(page) => format!("{:>3} ", page),
    }
}

/// Frame states per step; `*` marks the page just loaded, `+` the page hit.
pub fn render_frame_grid(grid: &FrameGrid, faults: &[FaultPoint]) -> Vec<String> {
    let mut lines = vec![format!("Frame states ({} frames)", grid.frame_count)];
    for (row, point) in grid.rows.iter().zip(faults) {
        let cells: Vec<String> = row.cells.iter().map(frame_cell).collect();
        let status = match row.status {
            PageStatus::Hit => "HIT",
            PageStatus::Fault => "FAULT",
        };
        lines.push(format!(
            "  {:>3}  page {:>3}  [{}]  {:<5}  faults {}",
            row.step,
            row.page,
            cells.join(""),
            status,
            point.cumulative_faults
        ));
    }
    lines
}

pub fn render_head_movement(movement: &HeadMovement, sequence: &[i64]) -> Vec<String> {
    let (low, high) = movement.axis;
    let span = (high - low).max(1) as f64;
    let mut lines = Vec::new();

    if !sequence.is_empty() {
        let order: Vec<String> = sequence.iter().map(i64::to_string).collect();
        lines.push(format!("Service order: {}", order.join(" -> ")));
    }
    lines.push(format!("Head movement (cylinders {}-{})", low, high));

    for (index, point) in movement.positions.iter().enumerate() {
        let offset = ((point.position - low) as f64 / span * (CHART_WIDTH - 1) as f64).round();
        let offset = (offset.max(0.0) as usize).min(CHART_WIDTH - 1);
        let seek = match index.checked_sub(1) {
            Some(i) => format!(
                "seek {:>6}  total {:>7}",
                movement.seek_distances.get(i).map_or(NO_VALUE.to_string(), |d| format_number(*d)),
                movement.cumulative_seek.get(i).map_or(NO_VALUE.to_string(), |c| format_number(*c))
            ),
            None => "start".to_string(),
        };
        lines.push(format!(
            "  {:>3} {:>5} |{}o{}| {}",
            point.step,
            point.position,
            " ".repeat(offset),
            " ".repeat(CHART_WIDTH - 1 - offset),
            seek
        ));
    }
    lines
}

pub fn render_comparison(result: &ComparisonResult) -> Vec<String> {
    let domain = result.domain();
    let keys = comparison_keys(domain);
    let name_width = result.algorithms().map(str::len).max().unwrap_or(0).max(9);

    let mut lines = vec![
        format!("{} Algorithm Comparison", domain.label()),
        RULE.to_string(),
    ];

    let mut header = format!("  {:<width$}", "Algorithm", width = name_width);
    for key in keys {
        header.push_str(&format!("  {:>24}", comparison_label(domain, key)));
    }
    lines.push(header);

    for (algorithm, entry) in result.entries() {
        let mut row = format!("  {:<width$}", algorithm, width = name_width);
        match (entry.metrics(), entry.error()) {
            (Some(metrics), _) => {
                for key in keys {
                    let value = metrics.get(key).map_or(NO_VALUE.to_string(), format_number);
                    row.push_str(&format!("  {:>24}", value));
                }
            }
            (None, error) => row.push_str(&format!("  error: {}", error.unwrap_or(NO_VALUE))),
        }
        lines.push(row);
    }

    if let Some(first) = keys.first() {
        lines.push(String::new());
        lines.push(comparison_label(domain, first));
        for bar in comparison_bars(result, first) {
            let length = column(bar.height_pct, CHART_WIDTH - 20);
            let value = if bar.failed {
                "failed".to_string()
            } else {
                format_number(bar.value)
            };
            lines.push(format!(
                "  {:<width$} {} {}",
                bar.algorithm,
                "█".repeat(length),
                value,
                width = name_width
            ));
        }
    }
    lines
}

pub fn render_algorithms(domain: Domain, entries: &[AlgorithmEntry]) -> String {
    let mut lines = vec![format!("{} algorithms", domain.label())];
    for entry in entries {
        lines.push(match entry.info {
            Some(info) => format!("  {:<10} {:<12} {}", entry.id, info.name, info.description),
            None => format!("  {}", entry.id),
        });
    }
    lines.join("\n")
}

pub fn render_health(health: &HealthStatus) -> String {
    let mut lines = vec![format!("Service {} (version {})", health.status, health.version)];
    for (domain, algorithms) in &health.algorithms {
        lines.push(format!("  {:<5} {}", domain, algorithms.join(", ")));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use osched_core::comparison::ComparisonEntry;
    use osched_core::layout::{gantt, head_movement, TimelineEntry};
    use osched_core::present;
    use osched_env::Metrics;

    #[test]
    fn test_gantt_rows_fill_expected_columns() {
        let layout = gantt(&[
            TimelineEntry {
                pid: 1,
                start: 0.0,
                end: 5.0,
                duration: 5.0,
            },
            TimelineEntry {
                pid: 2,
                start: 5.0,
                end: 8.0,
                duration: 3.0,
            },
        ]);
        let lines = render_gantt(&layout, 8);
        assert_eq!(lines[1], "  P1   |█████   | 5.00");
        assert_eq!(lines[2], "  P2   |     ███| 3.00");
    }

    #[test]
    fn test_empty_gantt() {
        let lines = render_gantt(&gantt(&[]), 20);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_metrics_marker_for_missing() {
        let metrics: Metrics = [("page_faults", 9.0)].into_iter().collect();
        let lines = render_metrics(&present(Domain::Page, &metrics));
        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("9.00"));
        assert!(lines[1].ends_with(NO_VALUE));
    }

    #[test]
    fn test_head_movement_starts_at_head() {
        let movement = head_movement(53, &[], &[]);
        let lines = render_head_movement(&movement, &[]);
        assert!(lines[1].contains("start"));
        assert!(lines[1].contains("53"));
    }

    #[test]
    fn test_comparison_shows_errors() {
        let mut result = ComparisonResult::new(Domain::Disk);
        result.push(
            "FCFS",
            ComparisonEntry::Metrics(
                [("total_seek", 640.0), ("avg_seek", 80.0)]
                    .into_iter()
                    .collect(),
            ),
        );
        result.push(
            "SCAN",
            ComparisonEntry::Failed {
                error: "Disk simulation failed".into(),
            },
        );

        let text = render_comparison(&result).join("\n");
        assert!(text.contains("Total Seek Time"));
        assert!(text.contains("640.00"));
        assert!(text.contains("error: Disk simulation failed"));
        assert!(text.contains("failed"));
    }
}
