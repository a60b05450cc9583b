//! Chart Layout - Deterministic Geometry for Result Visualizations
//! ================================================================
//!
//! Every function here is pure: it takes decoded step records (or a result
//! holding them) and returns plain data describing what to draw. Nothing is
//! mutated and identical input always yields identical output, so a renderer
//! can call these as often as it likes.
//!
//! ## Chart Families
//!
//! | Family | Input | Output |
//! |--------|-------|--------|
//! | Gantt | CPU `timeline` | bars as percentages of the makespan, one lane per process |
//! | Head movement | disk `trace` | position series starting at the initial head |
//! | Frame grid | page `trace` | fixed-width rows of classified frame cells |
//! | Fault series | page `trace` | per-step fault flag and running total |
//! | Comparison bars | comparison mapping | one bar per algorithm for a metric |
//!
//! A step record missing a field (or carrying the wrong type) fails the
//! whole layout with the index of the offending step.

use crate::comparison::ComparisonResult;
use osched_env::SimulationResult;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Frame-state value meaning "no page loaded".
pub const EMPTY_FRAME: i64 = -1;

/// Fixed color palette, indexed by first-seen rank.
pub const PALETTE: [&str; 10] = [
    "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#06b6d4", "#84cc16",
    "#f97316", "#6366f1",
];

/// Color for hit markers.
pub const HIT_COLOR: &str = "#10b981";

/// Color for fault markers.
pub const FAULT_COLOR: &str = "#ef4444";

/// Margin added around the cylinder range of a head-movement chart.
pub const AXIS_MARGIN: i64 = 10;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayoutError {
    #[error("Malformed {family} step at index {index}: {reason}")]
    MalformedStep {
        family: &'static str,
        index: usize,
        reason: String,
    },

    #[error("Cumulative seek decreases at step index {index} ({previous} -> {current})")]
    SeekRegression {
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("Final cumulative seek {cumulative} does not match total_seek {total}")]
    SeekTotalMismatch { cumulative: f64, total: f64 },
}

// =============================================================================
// COLORS
// =============================================================================

/// Returns the palette color for a 0-based rank, cycling past the end.
pub fn palette_color(rank: usize) -> &'static str {
    PALETTE[rank % PALETTE.len()]
}

/// First-seen ordering of identifiers, used to assign stable colors.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorMap<K> {
    order: Vec<K>,
}

impl<K: PartialEq> ColorMap<K> {
    /// Builds the map; repeats keep the rank of their first occurrence.
    pub fn from_ids<I: IntoIterator<Item = K>>(ids: I) -> Self {
        let mut order = Vec::new();
        for id in ids {
            if !order.contains(&id) {
                order.push(id);
            }
        }
        Self { order }
    }

    pub fn rank(&self, id: &K) -> Option<usize> {
        self.order.iter().position(|existing| existing == id)
    }

    pub fn color(&self, id: &K) -> Option<&'static str> {
        self.rank(id).map(palette_color)
    }

    pub fn ids(&self) -> &[K] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

// =============================================================================
// STEP RECORDS
// =============================================================================

/// One CPU timeline slice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub pid: i64,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
}

/// One disk head move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeekStep {
    pub step: i64,
    pub from_cylinder: i64,
    pub to_cylinder: i64,
    pub seek_distance: f64,
    pub cumulative_seek: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageStatus {
    Hit,
    Fault,
}

/// One page reference and the frames after it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageStep {
    pub step: i64,
    pub page: i64,
    pub status: PageStatus,
    pub frames_state: Vec<i64>,
}

/// Per-process statistics from a CPU result's `processes` list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProcessStats {
    pub pid: i64,
    pub arrival: f64,
    pub burst: f64,
    #[serde(default)]
    pub priority: f64,
    pub start: f64,
    pub finish: f64,
    pub turnaround: f64,
    pub waiting: f64,
    pub response: f64,
}

/// Decodes raw step records, failing on the first malformed one.
pub fn decode_steps<T: DeserializeOwned>(
    family: &'static str,
    steps: &[Value],
) -> Result<Vec<T>, LayoutError> {
    steps
        .iter()
        .enumerate()
        .map(|(index, raw)| {
            T::deserialize(raw).map_err(|e| LayoutError::MalformedStep {
                family,
                index,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Decodes the per-process table of a CPU result (empty when absent).
pub fn process_stats(result: &SimulationResult) -> Result<Vec<ProcessStats>, LayoutError> {
    match result.payload().get("processes").and_then(Value::as_array) {
        Some(rows) => decode_steps("process", rows),
        None => Ok(Vec::new()),
    }
}

fn percent(value: f64, of: f64) -> f64 {
    if of > 0.0 {
        value / of * 100.0
    } else {
        0.0
    }
}

// =============================================================================
// GANTT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GanttBar {
    pub pid: i64,
    pub start: f64,
    pub end: f64,
    pub duration: f64,
    pub left_pct: f64,
    pub width_pct: f64,
    pub color: &'static str,
}

/// All bars of one process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GanttLane {
    pub pid: i64,
    pub color: &'static str,
    /// Indices into [`GanttLayout::bars`]
    pub bars: Vec<usize>,
    pub busy: f64,
    pub width_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GanttLayout {
    pub max_time: f64,
    pub bars: Vec<GanttBar>,
    /// One lane per process, first-seen order
    pub lanes: Vec<GanttLane>,
}

/// Lays out timeline entries against `max(end)`.
///
/// With an empty timeline (or a makespan of 0) every percentage is 0.
pub fn gantt(entries: &[TimelineEntry]) -> GanttLayout {
    let max_time = entries.iter().map(|e| e.end).fold(0.0, f64::max);
    let colors = ColorMap::from_ids(entries.iter().map(|e| e.pid));

    let bars: Vec<GanttBar> = entries
        .iter()
        .map(|e| GanttBar {
            pid: e.pid,
            start: e.start,
            end: e.end,
            duration: e.duration,
            left_pct: percent(e.start, max_time),
            width_pct: percent(e.duration, max_time),
            color: colors.color(&e.pid).unwrap_or(PALETTE[0]),
        })
        .collect();

    let lanes = colors
        .ids()
        .iter()
        .enumerate()
        .map(|(rank, pid)| {
            let indices: Vec<usize> = bars
                .iter()
                .enumerate()
                .filter(|(_, bar)| bar.pid == *pid)
                .map(|(i, _)| i)
                .collect();
            let busy: f64 = indices.iter().map(|&i| bars[i].duration).sum();
            GanttLane {
                pid: *pid,
                color: palette_color(rank),
                bars: indices,
                busy,
                width_pct: percent(busy, max_time),
            }
        })
        .collect();

    GanttLayout {
        max_time,
        bars,
        lanes,
    }
}

impl GanttLayout {
    /// Decodes a CPU result's timeline and lays it out.
    pub fn from_result(result: &SimulationResult) -> Result<Self, LayoutError> {
        let entries: Vec<TimelineEntry> = decode_steps("timeline", result.steps())?;
        Ok(gantt(&entries))
    }

    pub fn lane(&self, pid: i64) -> Option<&GanttLane> {
        self.lanes.iter().find(|lane| lane.pid == pid)
    }
}

// =============================================================================
// HEAD MOVEMENT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeadPoint {
    pub step: i64,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeadMovement {
    /// Starts with `{step: 0, position: initial_head}`
    pub positions: Vec<HeadPoint>,
    /// Raw per-step seek distances
    pub seek_distances: Vec<f64>,
    /// Raw running totals
    pub cumulative_seek: Vec<f64>,
    /// Cylinder axis `(low, high)`
    pub axis: (i64, i64),
}

/// Builds the head-position series for a disk trace.
///
/// The axis spans the service order and the initial head, widened by
/// [`AXIS_MARGIN`] on each side and clamped at cylinder 0.
pub fn head_movement(initial_head: i64, trace: &[SeekStep], sequence: &[i64]) -> HeadMovement {
    let positions: Vec<HeadPoint> = std::iter::once(HeadPoint {
        step: 0,
        position: initial_head,
    })
    .chain(trace.iter().map(|s| HeadPoint {
        step: s.step,
        position: s.to_cylinder,
    }))
    .collect();

    let span = sequence
        .iter()
        .copied()
        .chain(positions.iter().map(|p| p.position));
    let (low, high) = span.fold((initial_head, initial_head), |(lo, hi), c| {
        (lo.min(c), hi.max(c))
    });

    HeadMovement {
        positions,
        seek_distances: trace.iter().map(|s| s.seek_distance).collect(),
        cumulative_seek: trace.iter().map(|s| s.cumulative_seek).collect(),
        axis: ((low - AXIS_MARGIN).max(0), high + AXIS_MARGIN),
    }
}

impl HeadMovement {
    /// Decodes a disk result's trace; `initial_head` comes from the request.
    pub fn from_result(result: &SimulationResult, initial_head: i64) -> Result<Self, LayoutError> {
        let trace: Vec<SeekStep> = decode_steps("trace", result.steps())?;
        Ok(head_movement(initial_head, &trace, &result.sequence()))
    }

    /// Checks that the running total never drops and ends at `total_seek`.
    ///
    /// Only reports; the series is left as the service sent it.
    pub fn verify(&self, total_seek: Option<f64>) -> Result<(), LayoutError> {
        for (index, pair) in self.cumulative_seek.windows(2).enumerate() {
            if pair[1] < pair[0] {
                return Err(LayoutError::SeekRegression {
                    index: index + 1,
                    previous: pair[0],
                    current: pair[1],
                });
            }
        }

        if let (Some(total), Some(&last)) = (total_seek, self.cumulative_seek.last()) {
            if (last - total).abs() > 1e-6 {
                return Err(LayoutError::SeekTotalMismatch {
                    cumulative: last,
                    total,
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// FRAME GRID
// =============================================================================

/// Classification of one frame column at one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "page", rename_all = "snake_case")]
pub enum FrameCell {
    Empty,
    /// The page this step brought in
    Faulted(i64),
    /// The page this step found resident
    Hit(i64),
    /// Any other loaded page
    Resident(i64),
}

impl FrameCell {
    pub fn page(&self) -> Option<i64> {
        match *self {
            FrameCell::Empty => None,
            FrameCell::Faulted(p) | FrameCell::Hit(p) | FrameCell::Resident(p) => Some(p),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameRow {
    pub step: i64,
    pub page: i64,
    pub status: PageStatus,
    pub cells: Vec<FrameCell>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameGrid {
    pub frame_count: usize,
    pub rows: Vec<FrameRow>,
}

fn classify(frame: i64, step: &PageStep) -> FrameCell {
    if frame < 0 {
        FrameCell::Empty
    } else if frame != step.page {
        FrameCell::Resident(frame)
    } else {
        match step.status {
            PageStatus::Fault => FrameCell::Faulted(frame),
            PageStatus::Hit => FrameCell::Hit(frame),
        }
    }
}

/// Pads or truncates every step to exactly `frame_count` classified columns.
pub fn frame_grid(trace: &[PageStep], frame_count: usize) -> FrameGrid {
    let rows = trace
        .iter()
        .map(|step| {
            let cells = (0..frame_count)
                .map(|i| {
                    let frame = step.frames_state.get(i).copied().unwrap_or(EMPTY_FRAME);
                    classify(frame, step)
                })
                .collect();
            FrameRow {
                step: step.step,
                page: step.page,
                status: step.status,
                cells,
            }
        })
        .collect();

    FrameGrid { frame_count, rows }
}

impl FrameGrid {
    /// Decodes a page result's trace into a grid of `frame_count` columns.
    pub fn from_result(result: &SimulationResult, frame_count: usize) -> Result<Self, LayoutError> {
        let trace: Vec<PageStep> = decode_steps("trace", result.steps())?;
        Ok(frame_grid(&trace, frame_count))
    }
}

/// One point of the page-fault chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FaultPoint {
    pub step: i64,
    pub page: i64,
    pub fault: bool,
    pub cumulative_faults: usize,
}

pub fn fault_series(trace: &[PageStep]) -> Vec<FaultPoint> {
    let mut total = 0;
    trace
        .iter()
        .map(|step| {
            let fault = step.status == PageStatus::Fault;
            if fault {
                total += 1;
            }
            FaultPoint {
                step: step.step,
                page: step.page,
                fault,
                cumulative_faults: total,
            }
        })
        .collect()
}

// =============================================================================
// COMPARISON BARS
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonBar {
    pub algorithm: String,
    /// 0 for failed entries or missing keys
    pub value: f64,
    /// Relative to the largest value
    pub height_pct: f64,
    pub color: &'static str,
    pub failed: bool,
}

/// One bar per algorithm for `metric`, in comparison order.
pub fn comparison_bars(result: &ComparisonResult, metric: &str) -> Vec<ComparisonBar> {
    let series = result.metric_series(metric);
    let max = series
        .iter()
        .filter_map(|(_, v)| *v)
        .fold(0.0, f64::max);

    result
        .entries()
        .iter()
        .zip(series)
        .enumerate()
        .map(|(rank, ((algorithm, entry), (_, value)))| {
            let value = value.unwrap_or(0.0);
            ComparisonBar {
                algorithm: algorithm.clone(),
                value,
                height_pct: percent(value, max),
                color: palette_color(rank),
                failed: entry.is_failed(),
            }
        })
        .collect()
}
