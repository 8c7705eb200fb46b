//! Fixture registry: the harness's named-input provider.
//!
//! Fixtures are [`InputDef`]s keyed by name. The registry serves two
//! callers:
//!
//! - the kernel's discovery resolver, through [`InputGraph`]
//! - real execution, through [`FixtureRegistry::resolve_real`], which
//!   computes every requested input for real, once per execution
//!
//! Every registry carries the built-in `checkpoints` fixture. It depends
//! on the call index input and yields a fresh replay registry for it, so
//! each generated case gets its own independent counter.

use std::collections::BTreeMap;

use checkpoint_kernel::checkpoint::registry::Checkpoints;
use checkpoint_kernel::error::Failure;
use checkpoint_kernel::inputs::graph::{InputDef, InputGraph, CALL_INDEX_INPUT, CHECKPOINTS_INPUT};
use checkpoint_kernel::value::{Inputs, Value};

/// Named fixtures available to a suite.
#[derive(Debug, Clone)]
pub struct FixtureRegistry {
    defs: BTreeMap<String, InputDef>,
}

impl Default for FixtureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureRegistry {
    /// A registry holding only the built-in `checkpoints` fixture.
    #[must_use]
    pub fn new() -> Self {
        let mut defs = BTreeMap::new();
        defs.insert(CHECKPOINTS_INPUT.to_string(), checkpoints_fixture());
        Self { defs }
    }

    /// Define fixture `name` as `compute` over `dependencies`. A later
    /// definition of the same name overrides the earlier one.
    pub fn define<F>(&mut self, name: &str, dependencies: &[&str], compute: F) -> &mut Self
    where
        F: Fn(&Inputs) -> Result<Value, Failure> + 'static,
    {
        self.insert(InputDef::new(name, dependencies, compute))
    }

    /// Add a prebuilt definition.
    pub fn insert(&mut self, def: InputDef) -> &mut Self {
        self.defs.insert(def.name().to_string(), def);
        self
    }

    /// Defined fixture names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.keys().map(String::as_str)
    }

    /// Resolve `names` for one real execution.
    ///
    /// `seeded` supplies values the harness already knows (the call index
    /// of a generated case); they are never recomputed. Each fixture is
    /// computed at most once per call.
    ///
    /// The result holds every value computed along the way, not just
    /// `names`. Checkpoints wrapped inside a fixture stay callable until
    /// the result is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::Input`] for an unknown fixture or a dependency
    /// cycle, or the computation's own failure.
    pub fn resolve_real(&self, names: &[String], seeded: &Inputs) -> Result<Inputs, Failure> {
        let mut resolved = seeded.clone();
        let mut active = Vec::new();
        for name in names {
            self.resolve_one(name, &mut resolved, &mut active)?;
        }
        Ok(resolved)
    }

    fn resolve_one(
        &self,
        name: &str,
        resolved: &mut Inputs,
        active: &mut Vec<String>,
    ) -> Result<(), Failure> {
        if resolved.contains(name) {
            return Ok(());
        }
        if active.iter().any(|a| a == name) {
            return Err(Failure::input(
                name,
                format!("dependency cycle through {}", active.join(" -> ")),
            ));
        }
        let def = self
            .defs
            .get(name)
            .ok_or_else(|| Failure::input(name, "no fixture with this name"))?;

        active.push(name.to_string());
        for dep in def.dependencies() {
            self.resolve_one(dep, resolved, active)?;
        }
        active.pop();

        let mut deps = Inputs::new();
        for dep in def.dependencies() {
            deps.insert(dep.clone(), resolved.value(dep));
        }
        let value = def.compute(&deps)?;
        resolved.insert(name, value);
        Ok(())
    }
}

impl InputGraph for FixtureRegistry {
    fn definition(&self, name: &str) -> Option<&InputDef> {
        self.defs.get(name)
    }
}

fn checkpoints_fixture() -> InputDef {
    InputDef::new(CHECKPOINTS_INPUT, &[CALL_INDEX_INPUT], |inputs| {
        let index = inputs
            .value(CALL_INDEX_INPUT)
            .as_u64()
            .and_then(|i| usize::try_from(i).ok())
            .ok_or_else(|| Failure::input(CHECKPOINTS_INPUT, "no call index supplied"))?;
        Ok(Value::Checkpoints(Checkpoints::replay(index)))
    })
}
