//! Utility modules shared across the pipeline.

pub mod exec;
pub mod html;
