//! Data layer: core types, decoding, calibration and statistics.
//!
//! Architecture:
//! ```text
//!  .pssession / .txt bytes
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  decode   │  utf-8 → utf-16 → latin-1
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  FormatReader → MeasurementSeries
//!   └──────────┘
//!        │
//!        ▼
//!   ┌─────────────┐
//!   │ calibration  │  reading → concentration (µM)
//!   └─────────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  stats    │  mean / population σ / peak
//!   └──────────┘
//! ```

pub mod calibration;
pub mod decode;
pub mod loader;
pub mod model;
pub mod stats;
