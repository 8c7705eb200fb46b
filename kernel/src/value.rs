//! Values flowing through named inputs, test bodies and checkpoint calls.
//!
//! A [`Value`] is either real (plain data, an opaque object, or the
//! checkpoint registry of the current phase) or an inert stand-in that
//! discovery substitutes for inputs it chose not to materialize.
//!
//! # Stand-in tolerance
//!
//! Stand-ins flow into code that does not know about them. Every accessor
//! on [`Value`] is therefore total: a stand-in answers `field()` with
//! another stand-in, `truthy()` with `false`, and every typed accessor
//! with `None`. No accessor fails. Stand-ins carry no meaning and must
//! never be compared or asserted on.

use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::checkpoint::registry::Checkpoints;
use crate::error::Failure;
use crate::inputs::graph::CHECKPOINTS_INPUT;

/// A value supplied for one named input or checkpoint argument.
#[derive(Clone)]
pub enum Value {
    /// Plain data.
    Data(serde_json::Value),
    /// An opaque resource (connection, builder, handle) produced by an input.
    Object(Rc<dyn Any>),
    /// The checkpoint registry of the current phase.
    Checkpoints(Checkpoints),
    /// Inert stand-in for an input discovery did not materialize.
    StandIn,
}

impl Value {
    /// Wrap plain data.
    #[must_use]
    pub fn data(value: impl Into<serde_json::Value>) -> Self {
        Self::Data(value.into())
    }

    /// Wrap an opaque object.
    #[must_use]
    pub fn object<T: Any>(value: T) -> Self {
        Self::Object(Rc::new(value))
    }

    /// Whether this is a discovery stand-in.
    #[must_use]
    pub fn is_stand_in(&self) -> bool {
        matches!(self, Self::StandIn)
    }

    /// The plain data, if this is a data value.
    #[must_use]
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Data(v) => Some(v),
            _ => None,
        }
    }

    /// Integer view of a data value.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(serde_json::Value::as_i64)
    }

    /// Unsigned integer view of a data value.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        self.as_data().and_then(serde_json::Value::as_u64)
    }

    /// String view of a data value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(serde_json::Value::as_str)
    }

    /// Truthiness.
    ///
    /// Data follows the usual emptiness rules (`null`, `false`, `0`, `""`,
    /// `[]`, `{}` are false). Objects and registries are true. Stand-ins
    /// are false, so branches gated on real data are not taken during
    /// discovery.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Data(v) => match v {
                serde_json::Value::Null => false,
                serde_json::Value::Bool(b) => *b,
                serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f.abs() > 0.0),
                serde_json::Value::String(s) => !s.is_empty(),
                serde_json::Value::Array(a) => !a.is_empty(),
                serde_json::Value::Object(o) => !o.is_empty(),
            },
            Self::Object(_) | Self::Checkpoints(_) => true,
            Self::StandIn => false,
        }
    }

    /// Member access. Missing data members read as `null`; a stand-in
    /// yields another stand-in.
    #[must_use]
    pub fn field(&self, name: &str) -> Value {
        match self {
            Self::Data(v) => Self::Data(v.get(name).cloned().unwrap_or(serde_json::Value::Null)),
            Self::StandIn => Self::StandIn,
            Self::Object(_) | Self::Checkpoints(_) => Self::Data(serde_json::Value::Null),
        }
    }

    /// Downcast an opaque object to a concrete type.
    #[must_use]
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        match self {
            Self::Object(obj) => Rc::clone(obj).downcast::<T>().ok(),
            _ => None,
        }
    }

    /// The checkpoint registry, if this value is one.
    #[must_use]
    pub fn as_checkpoints(&self) -> Option<&Checkpoints> {
        match self {
            Self::Checkpoints(c) => Some(c),
            _ => None,
        }
    }
}

impl std::fmt::Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Data(v) => write!(f, "Data({v})"),
            Self::Object(_) => f.write_str("Object(..)"),
            Self::Checkpoints(c) => write!(f, "Checkpoints({})", c.phase_name()),
            Self::StandIn => f.write_str("StandIn"),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Self::Data(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::data(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::data(value)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Self::data(value)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::data(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::data(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::data(value)
    }
}

impl From<Checkpoints> for Value {
    fn from(value: Checkpoints) -> Self {
        Self::Checkpoints(value)
    }
}

/// The resolved inputs for one execution, keyed by input name.
///
/// `BTreeMap` keeps iteration order independent of insertion order.
#[derive(Debug, Clone, Default)]
pub struct Inputs {
    values: BTreeMap<String, Value>,
}

impl Inputs {
    /// Empty input set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the value of `name`, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    /// Builder form of [`Inputs::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// The value of `name`, if resolved.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// The value of `name`, or a stand-in if it was never resolved.
    ///
    /// Lenient in every phase: an undeclared name reads as a falsy
    /// stand-in, in real executions too. Use [`Inputs::require`] where a
    /// missing input must fail.
    #[must_use]
    pub fn value(&self, name: &str) -> Value {
        self.values.get(name).cloned().unwrap_or(Value::StandIn)
    }

    /// The value of `name`, failing if it was never supplied.
    ///
    /// A declared input that discovery left unmaterialized is present as a
    /// stand-in and is returned as such.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::Input`] if `name` is not in this set.
    pub fn require(&self, name: &str) -> Result<Value, Failure> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| Failure::input(name, "not supplied to this execution"))
    }

    /// Whether `name` has a value.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// The checkpoint registry supplied under the reserved input name.
    ///
    /// # Errors
    ///
    /// Returns [`Failure::Input`] if the reserved input is absent or holds
    /// something other than a registry.
    pub fn checkpoints(&self) -> Result<Checkpoints, Failure> {
        self.values
            .get(CHECKPOINTS_INPUT)
            .and_then(Value::as_checkpoints)
            .cloned()
            .ok_or_else(|| {
                Failure::input(CHECKPOINTS_INPUT, "not resolved to a checkpoint registry")
            })
    }

    /// Input names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of resolved inputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no inputs are resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
