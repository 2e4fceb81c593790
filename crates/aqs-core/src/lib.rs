//! Core data types, payload normalization and station aggregation for AQS
//!
//! This crate holds everything about a sampling run that does not touch the
//! network or the clock: the reading model, the WAQI payload shape, the
//! per-sample normalizer and the end-of-run aggregator.

pub mod aggregate;
pub mod normalize;
pub mod payload;
pub mod types;

pub use aggregate::*;
pub use normalize::*;
pub use payload::*;
pub use types::*;
