//! Support code for the `panelcut` command-line tool.

pub mod demo;
pub mod io;
pub mod report;

pub use demo::KitchenGenerator;
pub use io::{read_json, write_json};
pub use report::{group_report, run_report};
