//! Command handlers

pub mod config;
pub mod entry;
pub mod snapshot;
pub mod status;
pub mod sync;
