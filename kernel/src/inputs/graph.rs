//! The named-input graph the host exposes to the kernel.
//!
//! Each named input has a defining computation and the names of the
//! inputs it depends on. The graph is rooted at a test body's declared
//! inputs, finite, and acyclic; the host guarantees acyclicity.

use std::collections::BTreeMap;
use std::rc::Rc;

use crate::error::Failure;
use crate::value::{Inputs, Value};

/// Reserved input name under which test bodies receive the checkpoint
/// registry.
pub const CHECKPOINTS_INPUT: &str = "checkpoints";

/// Reserved input name carrying the call index of a generated case.
pub const CALL_INDEX_INPUT: &str = "checkpoint_call_index";

/// Defining computation of a named input.
pub type InputFn = Rc<dyn Fn(&Inputs) -> Result<Value, Failure>>;

/// One named input: its computation and its dependencies.
#[derive(Clone)]
pub struct InputDef {
    name: String,
    dependencies: Vec<String>,
    compute: InputFn,
}

impl InputDef {
    /// Define `name` as `compute` over `dependencies`.
    pub fn new<F>(name: impl Into<String>, dependencies: &[&str], compute: F) -> Self
    where
        F: Fn(&Inputs) -> Result<Value, Failure> + 'static,
    {
        Self {
            name: name.into(),
            dependencies: dependencies.iter().map(|d| (*d).to_string()).collect(),
            compute: Rc::new(compute),
        }
    }

    /// Input name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names this input depends on, in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    /// Run the defining computation.
    ///
    /// # Errors
    ///
    /// Returns whatever [`Failure`] the computation returns.
    pub fn compute(&self, inputs: &Inputs) -> Result<Value, Failure> {
        (self.compute)(inputs)
    }
}

impl std::fmt::Debug for InputDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputDef")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .finish_non_exhaustive()
    }
}

/// Lookup of input definitions by name.
pub trait InputGraph {
    /// The definition of `name`, if the host knows one.
    fn definition(&self, name: &str) -> Option<&InputDef>;
}

impl InputGraph for BTreeMap<String, InputDef> {
    fn definition(&self, name: &str) -> Option<&InputDef> {
        self.get(name)
    }
}

/// Build a name-keyed graph from a list of definitions.
#[must_use]
pub fn graph_of(defs: Vec<InputDef>) -> BTreeMap<String, InputDef> {
    defs.into_iter().map(|d| (d.name.clone(), d)).collect()
}
