//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use osched_core::{CpuWorkload, DiskWorkload, PageWorkload, Process};
use osched_env::{Direction, Domain, ServiceConfig};
use std::path::PathBuf;
use std::time::Duration;

/// OS scheduling workbench
#[derive(Parser, Debug)]
#[command(name = "osched-sim")]
#[command(about = "Run CPU, page replacement and disk scheduling simulations", long_about = None)]
pub struct Cli {
    /// Service base URL (overrides OSCHED_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Per-call timeout in milliseconds (overrides OSCHED_TIMEOUT_MS)
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print raw JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one algorithm
    Run {
        /// cpu, page or disk
        domain: Domain,

        /// Algorithm identifier (domain default if omitted)
        #[arg(short, long)]
        algorithm: Option<String>,

        #[command(flatten)]
        input: InputArgs,

        /// Write the result as JSON into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
    },

    /// Run the same input through several algorithms
    Compare {
        /// cpu, page or disk
        domain: Domain,

        /// Comma-separated identifiers (domain default selection if omitted)
        #[arg(long, value_delimiter = ',')]
        algorithms: Vec<String>,

        #[command(flatten)]
        input: InputArgs,

        /// Write the comparison as JSON into this directory
        #[arg(long, value_name = "DIR")]
        export: Option<PathBuf>,
    },

    /// List the algorithms a domain supports
    Algorithms {
        /// cpu, page or disk
        domain: Domain,

        /// Use the built-in catalog instead of asking the service
        #[arg(long)]
        offline: bool,
    },

    /// Check that the service is up
    Health,
}

/// Workload overrides; anything omitted keeps the domain default.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// CPU process, repeatable
    #[arg(
        long = "process",
        value_name = "PID:ARRIVAL:BURST[:PRIORITY]",
        value_parser = parse_process_spec,
        allow_hyphen_values = true
    )]
    pub processes: Vec<Process>,

    /// Round Robin time quantum
    #[arg(long, allow_negative_numbers = true)]
    pub quantum: Option<i64>,

    /// Page reference string, e.g. "7 0 1 2 0 3"
    #[arg(long, allow_hyphen_values = true)]
    pub pages: Option<String>,

    /// Number of page frames
    #[arg(long, allow_negative_numbers = true)]
    pub frames: Option<i64>,

    /// Disk request queue, e.g. "98 183 37 122"
    #[arg(long, allow_hyphen_values = true)]
    pub queue: Option<String>,

    /// Initial head cylinder
    #[arg(long, allow_negative_numbers = true)]
    pub head: Option<i64>,

    /// Number of cylinders
    #[arg(long, allow_negative_numbers = true)]
    pub disk_size: Option<i64>,

    /// Initial sweep direction (left or right)
    #[arg(long)]
    pub direction: Option<Direction>,
}

/// Parses `pid:arrival:burst[:priority]`; priority defaults to 0.
pub fn parse_process_spec(raw: &str) -> Result<Process, String> {
    let fields = raw
        .split(':')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| format!("'{}' is not a whole number in process '{}'", part, raw))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match fields.as_slice() {
        [pid, arrival, burst] => Ok(Process::new(*pid, *arrival, *burst, 0)),
        [pid, arrival, burst, priority] => Ok(Process::new(*pid, *arrival, *burst, *priority)),
        _ => Err(format!(
            "process '{}' must look like PID:ARRIVAL:BURST[:PRIORITY]",
            raw
        )),
    }
}

impl InputArgs {
    pub fn cpu_workload(&self) -> CpuWorkload {
        let mut workload = CpuWorkload::default();
        if !self.processes.is_empty() {
            workload.processes = self.processes.clone();
        }
        if let Some(quantum) = self.quantum {
            workload.time_quantum = quantum;
        }
        workload
    }

    pub fn page_workload(&self) -> PageWorkload {
        let mut workload = PageWorkload::default();
        if let Some(pages) = &self.pages {
            workload.sequence = pages.clone();
        }
        if let Some(frames) = self.frames {
            workload.frame_count = frames;
        }
        workload
    }

    pub fn disk_workload(&self) -> DiskWorkload {
        let mut workload = DiskWorkload::default();
        if let Some(queue) = &self.queue {
            workload.queue = queue.clone();
        }
        if let Some(head) = self.head {
            workload.initial_head = head;
        }
        if let Some(size) = self.disk_size {
            workload.disk_size = size;
        }
        if let Some(direction) = self.direction {
            workload.direction = direction;
        }
        workload
    }
}

impl Cli {
    /// Environment configuration with command-line overrides applied.
    pub fn service_config(&self) -> ServiceConfig {
        let mut config = ServiceConfig::from_env();
        if let Some(url) = &self.api_url {
            config = config.with_base_url(url.as_str());
        }
        if let Some(ms) = self.timeout_ms.filter(|ms| *ms > 0) {
            config = config.with_timeout(Duration::from_millis(ms));
        }
        config
    }
}
