//! CLI module for Scandeck
//!
//! Drives a scan session against the simulated engine and renders it the way
//! the handheld screen shows it.

pub mod config;
pub mod demo;
pub mod error;
pub mod output;
