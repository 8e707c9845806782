//! # Integration Tests
//!
//! Runs the assembled runtime against the shared bus.

mod flows;
