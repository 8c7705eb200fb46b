//! Proof module: canonical JSON and domain-separated content hashes.
//!
//! Depends on nothing else in the kernel.

pub mod canon;
pub mod hash;
