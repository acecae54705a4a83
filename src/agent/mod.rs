//! Competitive analysis agent.
//!
//! This module provides the per-competitor analysis workflow and the fixed
//! questions it asks of each competitor's history.

pub mod analyst;
pub mod prompts;

pub use analyst::CompetitiveAnalysisAgent;
