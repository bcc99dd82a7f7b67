//! Synthetic energy and equipment tag generator for a bottling plant
//! monitoring dashboard.
//!
//! Every tick the [`sim::engine::Engine`] draws fresh readings for the
//! plant's energy sources and production equipment, advances cumulative
//! counters, and keeps a three-shift energy ledger, publishing everything
//! into a [`tags::TagStore`].

pub mod cli;
pub mod config;
pub mod io;
pub mod logging;
pub mod runner;
/// Simulation stages, randomness, clock and engine.
pub mod sim;
pub mod tags;
