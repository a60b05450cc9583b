//! OS Scheduling Workbench CLI
//!
//! Thin terminal front end over `osched_core`: flags become a workload, a
//! controller runs it against the computation service, and the resulting
//! layouts are rendered as text (or printed as raw JSON).
//!
//! # Usage
//!
//! ```text
//! osched-sim run cpu --algorithm RoundRobin --process 1:0:5 --process 2:1:3 --quantum 2
//! osched-sim compare page --algorithms FIFO,LRU,Optimal --pages "7 0 1 2 0 3" --frames 3
//! osched-sim run disk --algorithm SCAN --direction left --export ./out
//! osched-sim algorithms disk --offline
//! ```

pub mod cli;
pub mod exporter;
pub mod render;
pub mod runner;

pub use cli::{Cli, Command, InputArgs};
pub use runner::{ResultView, SessionError, SessionReport, SessionRunner, SessionWorkload};
