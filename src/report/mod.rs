//! Report generation modules.

pub mod generator;

pub use generator::{build_report_prompt, save_report};
