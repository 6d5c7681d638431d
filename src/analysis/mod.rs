//! Analysis modules.
//!
//! Pure computations over an already-fetched user snapshot.

pub mod aggregator;

pub use aggregator::*;
