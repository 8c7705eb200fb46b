//! Suites shipped with the harness.

pub mod sample;
