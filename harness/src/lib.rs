//! Checkpoint Harness: a minimal host test framework for the kernel.
//!
//! The harness plays the host side of the generation hook: it owns the
//! fixture graph, collects suites into concrete cases, runs each case in
//! its own execution against real inputs, and packages the outcomes as a
//! canonical, digestible report.
//!
//! The harness does NOT implement discovery or replay. It delegates to
//! the kernel and only decides what a case is and how it is reported.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod collect;
pub mod config;
pub mod fixtures;
pub mod report;
pub mod report_dir;
pub mod runner;
pub mod suite;
pub mod suites;
