//! Workloads - per-domain input state and pre-dispatch validation.
//! ==============================================================
//!
//! A workload is what the user edits: processes for CPU scheduling, a page
//! reference string and frame count for page replacement, a request queue
//! and head geometry for disk scheduling. Fields are kept in their editable
//! (signed, free-text) form so that invalid edits can be represented; they
//! only become a typed [`SimulationRequest`] once validation passes.
//!
//! Nothing here talks to the service. A workload that fails validation never
//! produces a request, which is how controllers guarantee that invalid input
//! never reaches the network.

use osched_env::{
    CpuRequest, Direction, DiskRequest, Domain, PageRequest, ProcessSpec, SimulationRequest,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Upper bound on page frames accepted by the service.
pub const MAX_FRAMES: i64 = 10;

/// Round Robin time quantum bounds.
pub const MIN_QUANTUM: i64 = 1;
pub const MAX_QUANTUM: i64 = 10;

/// Disk size bounds, in cylinders.
pub const MIN_DISK_SIZE: i64 = 50;
pub const MAX_DISK_SIZE: i64 = 500;

/// The only CPU algorithm that takes a time quantum.
pub const ROUND_ROBIN: &str = "RoundRobin";

/// Disk algorithms that take an initial direction.
pub const SWEEPING_DISK_ALGORITHMS: [&str; 4] = ["SCAN", "C-SCAN", "LOOK", "C-LOOK"];

// =============================================================================
// ERRORS
// =============================================================================

/// Why a workload was rejected before dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Select an algorithm")]
    MissingAlgorithm,

    #[error("At least one process is required")]
    NoProcesses,

    #[error("Process ID must be positive (got {0})")]
    InvalidPid(i64),

    #[error("Duplicate process ID P{0}")]
    DuplicatePid(i64),

    #[error("P{pid}: arrival time cannot be negative")]
    NegativeArrival { pid: i64 },

    #[error("P{pid}: burst time must be positive")]
    NonPositiveBurst { pid: i64 },

    #[error("P{pid}: priority cannot be negative")]
    NegativePriority { pid: i64 },

    #[error("Time quantum must be between {min} and {max} (got {value})")]
    InvalidQuantum { value: i64, min: i64, max: i64 },

    #[error("Please enter valid {0}")]
    EmptySequence(&'static str),

    #[error("Please enter valid {what}: '{token}' is not a whole number")]
    BadToken { what: &'static str, token: String },

    #[error("{what} cannot be negative (got {value})")]
    NegativeValue { what: &'static str, value: i64 },

    #[error("Frame count must be between 1 and {max} (got {value})")]
    FrameCount { value: i64, max: i64 },

    #[error("Disk size must be between {min} and {max} (got {value})")]
    DiskSize { value: i64, min: i64, max: i64 },

    #[error("Initial head must be within 0-{max} (got {head})")]
    HeadOutOfRange { head: i64, max: i64 },

    #[error("Requests must be within 0-{max} (got {cylinder})")]
    CylinderOutOfRange { cylinder: i64, max: i64 },

    #[error("{what} {value} is too large")]
    OutOfRange { what: &'static str, value: i64 },
}

// =============================================================================
// ALGORITHM CATALOG
// =============================================================================

/// A selectable algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlgorithmInfo {
    /// Identifier sent to the service
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

const fn algo(id: &'static str, name: &'static str, description: &'static str) -> AlgorithmInfo {
    AlgorithmInfo {
        id,
        name,
        description,
    }
}

pub const CPU_ALGORITHMS: &[AlgorithmInfo] = &[
    algo("FCFS", "FCFS", "First Come First Serve - Non-preemptive"),
    algo("SJF", "SJF", "Shortest Job First - Non-preemptive"),
    algo("SRTF", "SRTF", "Shortest Remaining Time First - Preemptive"),
    algo("Priority", "Priority", "Priority-based scheduling"),
    algo(ROUND_ROBIN, "Round Robin", "Time-quantum based scheduling"),
];

pub const PAGE_ALGORITHMS: &[AlgorithmInfo] = &[
    algo("FIFO", "FIFO", "First In First Out"),
    algo("LRU", "LRU", "Least Recently Used"),
    algo("Optimal", "Optimal", "Belady's Algorithm"),
    algo("LFU", "LFU", "Least Frequently Used"),
];

pub const DISK_ALGORITHMS: &[AlgorithmInfo] = &[
    algo("FCFS", "FCFS", "First Come First Serve"),
    algo("SSTF", "SSTF", "Shortest Seek Time First"),
    algo("SCAN", "SCAN", "Elevator Algorithm"),
    algo("C-SCAN", "C-SCAN", "Circular SCAN"),
    algo("LOOK", "LOOK", "Modified SCAN"),
    algo("C-LOOK", "C-LOOK", "Circular LOOK"),
];

/// Returns the built-in catalog for a domain.
pub fn catalog(domain: Domain) -> &'static [AlgorithmInfo] {
    match domain {
        Domain::Cpu => CPU_ALGORITHMS,
        Domain::Page => PAGE_ALGORITHMS,
        Domain::Disk => DISK_ALGORITHMS,
    }
}

/// Looks up an algorithm by identifier.
pub fn find_algorithm(domain: Domain, id: &str) -> Option<&'static AlgorithmInfo> {
    catalog(domain).iter().find(|info| info.id == id)
}

/// Returns true if a disk algorithm sweeps and therefore needs a direction.
pub fn needs_direction(algorithm: &str) -> bool {
    SWEEPING_DISK_ALGORITHMS.contains(&algorithm)
}

// =============================================================================
// WORKLOAD TRAIT
// =============================================================================

/// Editable input for one scheduling domain.
///
/// `Default` is the built-in starting state restored by reset.
pub trait Workload: Clone + Default + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Domain this workload belongs to
    const DOMAIN: Domain;

    /// Algorithm selected after construction or reset
    const DEFAULT_ALGORITHM: &'static str;

    /// Algorithms pre-selected for comparison (at least two)
    const DEFAULT_COMPARISON: &'static [&'static str];

    /// Metric keys kept in a comparison entry
    const COMPARISON_KEYS: &'static [&'static str];

    /// Validates the workload and builds the request for `algorithm`.
    fn build_request(&self, algorithm: &str) -> Result<SimulationRequest, ValidationError>;

    /// Validates without keeping the request.
    fn validate(&self, algorithm: &str) -> Result<(), ValidationError> {
        self.build_request(algorithm).map(|_| ())
    }

    /// Returns the domain's algorithm catalog.
    fn catalog() -> &'static [AlgorithmInfo] {
        catalog(Self::DOMAIN)
    }
}

/// Parses a whitespace-separated list of integers.
///
/// Runs of whitespace collapse; any token that is not an integer rejects the
/// whole sequence rather than being dropped.
pub fn parse_sequence(text: &str, what: &'static str) -> Result<Vec<i64>, ValidationError> {
    let values = text
        .split_whitespace()
        .map(|token| {
            token.parse::<i64>().map_err(|_| ValidationError::BadToken {
                what,
                token: token.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.is_empty() {
        return Err(ValidationError::EmptySequence(what));
    }
    Ok(values)
}

fn require_algorithm(algorithm: &str) -> Result<(), ValidationError> {
    if algorithm.trim().is_empty() {
        Err(ValidationError::MissingAlgorithm)
    } else {
        Ok(())
    }
}

fn to_u32(what: &'static str, value: i64) -> Result<u32, ValidationError> {
    u32::try_from(value).map_err(|_| ValidationError::OutOfRange { what, value })
}

// =============================================================================
// CPU
// =============================================================================

/// One editable row of the process table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub pid: i64,
    pub arrival: i64,
    pub burst: i64,
    pub priority: i64,
}

impl Process {
    pub const fn new(pid: i64, arrival: i64, burst: i64, priority: i64) -> Self {
        Self {
            pid,
            arrival,
            burst,
            priority,
        }
    }
}

/// Editable process columns (the PID is assigned, not edited).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessField {
    Arrival,
    Burst,
    Priority,
}

impl FromStr for ProcessField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arrival" => Ok(ProcessField::Arrival),
            "burst" => Ok(ProcessField::Burst),
            "priority" => Ok(ProcessField::Priority),
            other => Err(format!("unknown process field '{}'", other)),
        }
    }
}

/// CPU scheduling input: the process table plus the Round Robin quantum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuWorkload {
    pub processes: Vec<Process>,
    /// Only sent when the algorithm is Round Robin
    pub time_quantum: i64,
}

impl Default for CpuWorkload {
    fn default() -> Self {
        Self {
            processes: vec![
                Process::new(1, 0, 5, 0),
                Process::new(2, 1, 3, 0),
                Process::new(3, 2, 8, 0),
            ],
            time_quantum: 2,
        }
    }
}

impl CpuWorkload {
    /// Appends a process with the next free PID and returns that PID.
    pub fn add_process(&mut self) -> i64 {
        let pid = self
            .processes
            .iter()
            .map(|p| p.pid)
            .max()
            .unwrap_or(0)
            .max(0)
            .saturating_add(1);
        self.processes.push(Process::new(pid, 0, 1, 0));
        pid
    }

    /// Removes the process at `index`. The last remaining process stays.
    pub fn remove_process(&mut self, index: usize) -> bool {
        if self.processes.len() <= 1 || index >= self.processes.len() {
            return false;
        }
        self.processes.remove(index);
        true
    }

    /// Sets one column of the process at `index`.
    pub fn update_process(&mut self, index: usize, field: ProcessField, value: i64) -> bool {
        let Some(process) = self.processes.get_mut(index) else {
            return false;
        };
        match field {
            ProcessField::Arrival => process.arrival = value,
            ProcessField::Burst => process.burst = value,
            ProcessField::Priority => process.priority = value,
        }
        true
    }
}

impl Workload for CpuWorkload {
    const DOMAIN: Domain = Domain::Cpu;
    const DEFAULT_ALGORITHM: &'static str = "FCFS";
    const DEFAULT_COMPARISON: &'static [&'static str] = &["FCFS", "SJF", "SRTF"];
    const COMPARISON_KEYS: &'static [&'static str] = &[
        "avg_waiting_time",
        "avg_turnaround_time",
        "cpu_utilization",
        "throughput",
    ];

    fn build_request(&self, algorithm: &str) -> Result<SimulationRequest, ValidationError> {
        require_algorithm(algorithm)?;
        if self.processes.is_empty() {
            return Err(ValidationError::NoProcesses);
        }

        let mut seen = HashSet::with_capacity(self.processes.len());
        let mut processes = Vec::with_capacity(self.processes.len());

        for p in &self.processes {
            if p.pid < 1 {
                return Err(ValidationError::InvalidPid(p.pid));
            }
            if !seen.insert(p.pid) {
                return Err(ValidationError::DuplicatePid(p.pid));
            }
            if p.arrival < 0 {
                return Err(ValidationError::NegativeArrival { pid: p.pid });
            }
            if p.burst < 1 {
                return Err(ValidationError::NonPositiveBurst { pid: p.pid });
            }
            if p.priority < 0 {
                return Err(ValidationError::NegativePriority { pid: p.pid });
            }

            processes.push(ProcessSpec {
                pid: to_u32("Process ID", p.pid)?,
                arrival: to_u32("Arrival time", p.arrival)?,
                burst: to_u32("Burst time", p.burst)?,
                priority: to_u32("Priority", p.priority)?,
            });
        }

        let time_quantum = if algorithm == ROUND_ROBIN {
            if !(MIN_QUANTUM..=MAX_QUANTUM).contains(&self.time_quantum) {
                return Err(ValidationError::InvalidQuantum {
                    value: self.time_quantum,
                    min: MIN_QUANTUM,
                    max: MAX_QUANTUM,
                });
            }
            Some(to_u32("Time quantum", self.time_quantum)?)
        } else {
            None
        };

        Ok(SimulationRequest::Cpu(CpuRequest {
            algorithm: algorithm.to_string(),
            processes,
            time_quantum,
        }))
    }
}

// =============================================================================
// PAGE REPLACEMENT
// =============================================================================

/// Page replacement input: a free-text reference string and a frame count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageWorkload {
    /// Whitespace-separated page numbers
    pub sequence: String,
    pub frame_count: i64,
}

impl Default for PageWorkload {
    fn default() -> Self {
        Self {
            sequence: "7 0 1 2 0 3 0 4 2 3".to_string(),
            frame_count: 3,
        }
    }
}

impl PageWorkload {
    /// Parses the reference string.
    pub fn pages(&self) -> Result<Vec<i64>, ValidationError> {
        parse_sequence(&self.sequence, "page numbers")
    }
}

impl Workload for PageWorkload {
    const DOMAIN: Domain = Domain::Page;
    const DEFAULT_ALGORITHM: &'static str = "FIFO";
    const DEFAULT_COMPARISON: &'static [&'static str] = &["FIFO", "LRU", "Optimal"];
    const COMPARISON_KEYS: &'static [&'static str] = &["page_faults", "hit_ratio"];

    fn build_request(&self, algorithm: &str) -> Result<SimulationRequest, ValidationError> {
        require_algorithm(algorithm)?;

        let page_sequence = self
            .pages()?
            .into_iter()
            .map(|page| {
                if page < 0 {
                    Err(ValidationError::NegativeValue {
                        what: "Page number",
                        value: page,
                    })
                } else {
                    to_u32("Page number", page)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        if !(1..=MAX_FRAMES).contains(&self.frame_count) {
            return Err(ValidationError::FrameCount {
                value: self.frame_count,
                max: MAX_FRAMES,
            });
        }

        Ok(SimulationRequest::Page(PageRequest {
            algorithm: algorithm.to_string(),
            page_sequence,
            frame_count: to_u32("Frame count", self.frame_count)?,
        }))
    }
}

// =============================================================================
// DISK SCHEDULING
// =============================================================================

/// Disk scheduling input: a free-text request queue and head geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskWorkload {
    /// Whitespace-separated cylinder numbers
    pub queue: String,
    pub initial_head: i64,
    pub disk_size: i64,
    /// Only sent for the sweeping algorithms
    pub direction: Direction,
}

impl Default for DiskWorkload {
    fn default() -> Self {
        Self {
            queue: "98 183 37 122 14 124 65 67".to_string(),
            initial_head: 53,
            disk_size: 200,
            direction: Direction::Right,
        }
    }
}

impl DiskWorkload {
    /// Parses the request queue.
    pub fn cylinders(&self) -> Result<Vec<i64>, ValidationError> {
        parse_sequence(&self.queue, "cylinder numbers")
    }
}

impl Workload for DiskWorkload {
    const DOMAIN: Domain = Domain::Disk;
    const DEFAULT_ALGORITHM: &'static str = "FCFS";
    const DEFAULT_COMPARISON: &'static [&'static str] = &["FCFS", "SSTF", "SCAN"];
    const COMPARISON_KEYS: &'static [&'static str] = &["total_seek", "avg_seek"];

    fn build_request(&self, algorithm: &str) -> Result<SimulationRequest, ValidationError> {
        require_algorithm(algorithm)?;
        let cylinders = self.cylinders()?;

        if !(MIN_DISK_SIZE..=MAX_DISK_SIZE).contains(&self.disk_size) {
            return Err(ValidationError::DiskSize {
                value: self.disk_size,
                min: MIN_DISK_SIZE,
                max: MAX_DISK_SIZE,
            });
        }
        let max = self.disk_size - 1;

        if self.initial_head < 0 {
            return Err(ValidationError::NegativeValue {
                what: "Initial head",
                value: self.initial_head,
            });
        }
        if self.initial_head > max {
            return Err(ValidationError::HeadOutOfRange {
                head: self.initial_head,
                max,
            });
        }

        let mut request_queue = Vec::with_capacity(cylinders.len());
        for cylinder in cylinders {
            if cylinder < 0 {
                return Err(ValidationError::NegativeValue {
                    what: "Cylinder",
                    value: cylinder,
                });
            }
            if cylinder > max {
                return Err(ValidationError::CylinderOutOfRange { cylinder, max });
            }
            request_queue.push(to_u32("Cylinder", cylinder)?);
        }

        Ok(SimulationRequest::Disk(DiskRequest {
            algorithm: algorithm.to_string(),
            request_queue,
            initial_head: to_u32("Initial head", self.initial_head)?,
            disk_size: to_u32("Disk size", self.disk_size)?,
            direction: needs_direction(algorithm).then_some(self.direction),
        }))
    }
}
