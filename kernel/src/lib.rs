//! Checkpoint Kernel: split one test body into one case per checkpoint.
//!
//! A test body declares verification steps ("checkpoints") through a
//! registry it receives as a named input. The kernel runs the body twice
//! per logical test:
//!
//! - **discovery**: a dry run against a [`checkpoint::discovery::DiscoveryRecorder`]
//!   that records every checkpoint call and runs none of them
//! - **replay**: one real run per recorded call, against a
//!   [`checkpoint::replay::ReplayMultiplexer`] that runs exactly that call
//!
//! # API Surface
//!
//! - [`generate::generate_tests`] -- the host's generation hook
//! - [`inputs::resolve::Resolver`] -- discovery-time input resolution
//! - [`checkpoint::registry::Checkpoints`] -- the registry handle test bodies use
//!
//! # Module Dependency Direction
//!
//! `error`/`value` ← `checkpoint` ← `inputs` ← `generate`, and `proof`
//! stands alone. `value` names the registry handle and the reserved input
//! name, nothing more.

#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod checkpoint;
pub mod error;
pub mod generate;
pub mod inputs;
pub mod proof;
pub mod value;
