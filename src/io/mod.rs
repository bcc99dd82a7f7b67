//! File output.

pub mod export;

pub use export::TelemetryWriter;
