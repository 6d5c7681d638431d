//! Report generation modules.

pub mod chart;
pub mod generator;

pub use generator::*;
