//! Storage is organized through [stats_storage::JsonStatsStorage].
//! The basic idea is:
//!  - Everything lives in one JSON stats document.
//!  - The document holds all-time per-domain records plus per-UTC-day
//!    usage buckets.
//!  - Each closed session is applied as a full read-modify-write of the
//!    document.

pub mod entities;
pub mod stats_storage;
