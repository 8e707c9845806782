//! # Twin-Sync Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Decoder and decision engine throughput
//! └── src/integration/  # Bus → handler → service → notification flows
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p twin-tests
//! cargo bench -p twin-tests
//! ```

pub mod integration;
