//! Named inputs: the host's dependency graph and the discovery resolver.

pub mod graph;
pub mod resolve;
