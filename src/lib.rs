//! Daemon/cli pair for tracking which website holds your active browser tab.
//! The daemon listens to a browser extension over a loopback bridge, rolls
//! focus changes up into per-domain and per-day totals, and the cli turns
//! those totals into stats, reports, and exports.
//!

pub mod browser;
pub mod classify;
pub mod cli;
pub mod daemon;
pub mod utils;
