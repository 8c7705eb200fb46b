//! Checkpoint registry and its two phases.
//!
//! `registry` holds the shared wrap/dispatch behaviour; `discovery` and
//! `replay` each decide what a single checkpoint call does.

pub mod discovery;
pub mod registry;
pub mod replay;
