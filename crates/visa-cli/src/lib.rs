//! Terminal front end for the visa eligibility simulator.
//!
//! `visa-sim` runs the wizard interactively or assesses, validates and
//! exports application files in one shot.

pub mod cli;
pub mod config;
pub mod render;
pub mod repl;
pub mod telemetry;

pub use cli::run;
