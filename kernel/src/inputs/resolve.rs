//! Discovery-time input resolution.
//!
//! Discovery runs before real inputs exist, yet the test body still needs
//! a value for every declared input. The resolver walks the input graph
//! depth-first and materializes as little as possible:
//!
//! 1. The reserved checkpoints input resolves to the discovery recorder.
//! 2. A name with no known definition is [`Resolved::Unrelated`].
//! 3. An input whose dependencies all resolve to `Unrelated` is itself
//!    `Unrelated`; its computation is never invoked. This holds
//!    vacuously for inputs with no dependencies.
//! 4. Otherwise the computation runs with `Unrelated` dependencies
//!    replaced by [`Value::StandIn`] and real ones passed through. The
//!    result is real, whatever it contains.
//!
//! The recorder is never replaced by a stand-in. Results are memoized for
//! the lifetime of one resolver, so a shared dependency is computed at
//! most once per discovery pass. Cycles are not resolved; the depth bound
//! turns one into [`Failure::ResolutionDepthExceeded`].

use std::collections::BTreeMap;

use crate::checkpoint::registry::Checkpoints;
use crate::error::Failure;
use crate::inputs::graph::{InputGraph, CHECKPOINTS_INPUT};
use crate::value::{Inputs, Value};

/// Outcome of resolving one input during discovery.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// A value was materialized (or is the recorder itself).
    Value(Value),
    /// The input has no interaction with the checkpoint registry.
    Unrelated,
}

impl Resolved {
    /// Whether this is [`Resolved::Unrelated`].
    #[must_use]
    pub fn is_unrelated(&self) -> bool {
        matches!(self, Self::Unrelated)
    }

    /// The value to hand to a consumer: `Unrelated` becomes a stand-in.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(v) => v,
            Self::Unrelated => Value::StandIn,
        }
    }
}

/// Resolves named inputs for one discovery pass.
pub struct Resolver<'g> {
    graph: &'g dyn InputGraph,
    recorder: Checkpoints,
    max_depth: usize,
    memo: BTreeMap<String, Resolved>,
    computed: usize,
}

impl<'g> Resolver<'g> {
    /// A resolver over `graph` that threads `recorder` through the
    /// reserved checkpoints input.
    #[must_use]
    pub fn new(graph: &'g dyn InputGraph, recorder: Checkpoints, max_depth: usize) -> Self {
        Self {
            graph,
            recorder,
            max_depth,
            memo: BTreeMap::new(),
            computed: 0,
        }
    }

    /// Number of input computations actually invoked so far.
    #[must_use]
    pub fn computed(&self) -> usize {
        self.computed
    }

    /// Resolve one input.
    ///
    /// # Errors
    ///
    /// Returns the [`Failure`] of any computation invoked along the way,
    /// or [`Failure::ResolutionDepthExceeded`].
    pub fn resolve(&mut self, name: &str) -> Result<Resolved, Failure> {
        self.resolve_at(name, 0)
    }

    /// Resolve every name into a full input set for the test body.
    /// `Unrelated` inputs are supplied as stand-ins.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`].
    pub fn resolve_all(&mut self, names: &[String]) -> Result<Inputs, Failure> {
        let mut inputs = Inputs::new();
        for name in names {
            let resolved = self.resolve(name)?;
            inputs.insert(name.clone(), resolved.into_value());
        }
        Ok(inputs)
    }

    fn resolve_at(&mut self, name: &str, depth: usize) -> Result<Resolved, Failure> {
        if name == CHECKPOINTS_INPUT {
            return Ok(Resolved::Value(Value::Checkpoints(self.recorder.clone())));
        }
        if depth > self.max_depth {
            return Err(Failure::ResolutionDepthExceeded {
                name: name.to_string(),
                max_depth: self.max_depth,
            });
        }
        if let Some(hit) = self.memo.get(name) {
            return Ok(hit.clone());
        }

        let graph = self.graph;
        let Some(def) = graph.definition(name) else {
            tracing::trace!(input = name, "no definition; treating as unrelated");
            return Ok(Resolved::Unrelated);
        };

        let mut deps = Vec::with_capacity(def.dependencies().len());
        for dep in def.dependencies() {
            let resolved = self.resolve_at(dep, depth + 1)?;
            deps.push((dep.as_str(), resolved));
        }

        let outcome = if deps.iter().all(|(_, r)| r.is_unrelated()) {
            tracing::trace!(input = name, "all dependencies unrelated");
            Resolved::Unrelated
        } else {
            let mut inputs = Inputs::new();
            for (dep, resolved) in deps {
                inputs.insert(dep, resolved.into_value());
            }
            tracing::debug!(input = name, "materializing input for discovery");
            self.computed += 1;
            Resolved::Value(def.compute(&inputs)?)
        };

        self.memo.insert(name.to_string(), outcome.clone());
        Ok(outcome)
    }
}
