//! Test definitions and suites.

use std::rc::Rc;

use checkpoint_kernel::error::Failure;
use checkpoint_kernel::value::Inputs;

use crate::fixtures::FixtureRegistry;

/// A test body: runs against resolved inputs.
pub type TestBody = Rc<dyn Fn(&Inputs) -> Result<(), Failure>>;

/// One test: a name, its declared inputs, and its body.
#[derive(Clone)]
pub struct TestDef {
    name: String,
    inputs: Vec<String>,
    body: TestBody,
}

impl TestDef {
    /// Define test `name` requesting `inputs`.
    pub fn new<F>(name: &str, inputs: &[&str], body: F) -> Self
    where
        F: Fn(&Inputs) -> Result<(), Failure> + 'static,
    {
        Self {
            name: name.to_string(),
            inputs: inputs.iter().map(|s| (*s).to_string()).collect(),
            body: Rc::new(body),
        }
    }

    /// Test name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared input names.
    #[must_use]
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Run the body.
    ///
    /// # Errors
    ///
    /// Returns the body's [`Failure`].
    pub fn run(&self, inputs: &Inputs) -> Result<(), Failure> {
        (self.body)(inputs)
    }
}

impl std::fmt::Debug for TestDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestDef")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .finish_non_exhaustive()
    }
}

/// A fixture registry plus the tests that draw from it.
#[derive(Debug, Clone, Default)]
pub struct Suite {
    fixtures: FixtureRegistry,
    tests: Vec<TestDef>,
}

impl Suite {
    /// A suite over `fixtures` with no tests yet.
    #[must_use]
    pub fn new(fixtures: FixtureRegistry) -> Self {
        Self {
            fixtures,
            tests: Vec::new(),
        }
    }

    /// Append a test. Tests are collected in insertion order.
    pub fn add(&mut self, test: TestDef) -> &mut Self {
        self.tests.push(test);
        self
    }

    /// The fixture registry.
    #[must_use]
    pub fn fixtures(&self) -> &FixtureRegistry {
        &self.fixtures
    }

    /// The tests, in insertion order.
    #[must_use]
    pub fn tests(&self) -> &[TestDef] {
        &self.tests
    }
}
