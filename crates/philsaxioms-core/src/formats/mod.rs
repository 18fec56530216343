//! # Formats Module
//!
//! Dataset text formats for PhilsAxioms.
//!
//! Parsing and rendering only; reading and writing files is the app layer's
//! job.

mod dataset;

pub use dataset::*;
