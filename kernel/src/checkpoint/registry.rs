//! Checkpoint registry: the behaviour shared by both phases.
//!
//! A test body asks the registry to wrap each checkpoint body. Wrapping
//! assigns a [`CheckpointKey`] (the body's arena index in this registry)
//! and returns a [`Checkpoint`] handle with a uniform call form. What a
//! call actually does depends on the phase behind the registry:
//!
//! - discovery records the call and never runs the body
//!   ([`crate::checkpoint::discovery::DiscoveryRecorder`])
//! - replay runs exactly the selected call and skips the rest
//!   ([`crate::checkpoint::replay::ReplayMultiplexer`])
//!
//! Keys are positional: the same test body wraps its checkpoints in the
//! same order in every phase, so the N-th wrapped body has key N in both.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use crate::checkpoint::replay::ReplayMultiplexer;
use crate::error::Failure;
use crate::value::Value;

// ---------------------------------------------------------------------------
// Keys and bodies
// ---------------------------------------------------------------------------

/// Stable identifier of one wrapped checkpoint body within one registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckpointKey(usize);

impl CheckpointKey {
    /// Key for the body stored at arena position `index`.
    #[must_use]
    pub const fn from_index(index: usize) -> Self {
        Self(index)
    }

    /// Arena position of the body.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CheckpointKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "checkpoint#{}", self.0)
    }
}

/// A checkpoint body: one verification step.
pub type CheckpointFn = Rc<dyn Fn(&CallArgs) -> Result<(), Failure>>;

/// Index-addressed store of checkpoint bodies.
#[derive(Default)]
pub struct CheckpointTable {
    bodies: Vec<CheckpointFn>,
}

impl CheckpointTable {
    /// Store `body` and return its key.
    pub fn register(&mut self, body: CheckpointFn) -> CheckpointKey {
        let key = CheckpointKey::from_index(self.bodies.len());
        self.bodies.push(body);
        key
    }

    /// Look up a body by key.
    #[must_use]
    pub fn get(&self, key: CheckpointKey) -> Option<&CheckpointFn> {
        self.bodies.get(key.index())
    }

    /// Number of wrapped bodies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether nothing has been wrapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Call form
// ---------------------------------------------------------------------------

/// Arguments forwarded to a checkpoint body.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    /// Positional arguments.
    pub args: Vec<Value>,
    /// Keyword arguments.
    pub kwargs: BTreeMap<String, Value>,
}

impl CallArgs {
    /// Positional argument `index`, or a stand-in if absent.
    #[must_use]
    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or(Value::StandIn)
    }

    /// Keyword argument `name`, or a stand-in if absent.
    #[must_use]
    pub fn kwarg(&self, name: &str) -> Value {
        self.kwargs.get(name).cloned().unwrap_or(Value::StandIn)
    }
}

/// A tag attached to a checkpoint call; becomes a tag of the generated case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tag {
    /// Do not run the generated case.
    Skip { reason: String },
    /// The generated case is expected to fail.
    XFail { reason: String },
    /// Free-form label used for selection.
    Label(String),
}

impl Tag {
    /// [`Tag::Skip`] with a reason.
    #[must_use]
    pub fn skip(reason: impl Into<String>) -> Self {
        Self::Skip {
            reason: reason.into(),
        }
    }

    /// [`Tag::XFail`] with a reason.
    #[must_use]
    pub fn xfail(reason: impl Into<String>) -> Self {
        Self::XFail {
            reason: reason.into(),
        }
    }

    /// [`Tag::Label`].
    #[must_use]
    pub fn label(name: impl Into<String>) -> Self {
        Self::Label(name.into())
    }

    /// JSON form used in plans and reports.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Skip { reason } => serde_json::json!({"kind": "skip", "reason": reason}),
            Self::XFail { reason } => serde_json::json!({"kind": "xfail", "reason": reason}),
            Self::Label(name) => serde_json::json!({"kind": "label", "name": name}),
        }
    }
}

/// One invocation of a wrapped checkpoint: arguments plus the out-of-band
/// tags and display id.
#[derive(Debug, Clone, Default)]
pub struct CheckpointCall {
    /// Arguments forwarded to the body.
    pub args: CallArgs,
    /// Tags for the generated case.
    pub tags: Vec<Tag>,
    /// Display id for the generated case.
    pub id: Option<String>,
}

impl CheckpointCall {
    /// A call with no arguments, tags or id.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    #[must_use]
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.args.push(value.into());
        self
    }

    /// Set a keyword argument.
    #[must_use]
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.kwargs.insert(name.into(), value.into());
        self
    }

    /// Attach a tag.
    #[must_use]
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Set the display id.
    #[must_use]
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// What a phase decided to do with one checkpoint call.
pub enum Handling {
    /// The call was recorded; no body runs.
    Recorded,
    /// The call is not selected; no body runs.
    Skip,
    /// Run this body.
    Run(CheckpointFn),
}

/// Outcome of one checkpoint call, as seen by the test body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Discovery recorded the call.
    Recorded,
    /// Replay ran the body and it passed.
    Ran,
    /// Replay skipped the call.
    Skipped,
}

/// A registry phase. Implementors own a [`CheckpointTable`] and decide
/// per call; wrapping and dispatch are shared through [`Checkpoints`].
pub trait CheckpointPhase {
    /// Short phase name for logs.
    fn phase(&self) -> &'static str;

    /// The body store.
    fn table(&self) -> &CheckpointTable;

    /// The body store, mutably.
    fn table_mut(&mut self) -> &mut CheckpointTable;

    /// Decide what to do with one call to the body registered under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Failure`] if the call cannot be handled (for example, a
    /// selected key with no registered body).
    fn handle_call(&mut self, key: CheckpointKey, call: &CheckpointCall)
        -> Result<Handling, Failure>;
}

/// Shared handle to the registry of the current phase.
///
/// This is the value test bodies receive under the reserved input name.
/// Cloning shares the same registry.
#[derive(Clone)]
pub struct Checkpoints {
    phase: Rc<RefCell<dyn CheckpointPhase>>,
}

impl Checkpoints {
    /// Share an existing phase.
    ///
    /// The caller may keep its own typed `Rc` to read phase state back
    /// after the test body returns.
    #[must_use]
    pub fn from_phase<P: CheckpointPhase + 'static>(phase: Rc<RefCell<P>>) -> Self {
        Self { phase }
    }

    /// A fresh replay registry selecting the call at `target`.
    #[must_use]
    pub fn replay(target: usize) -> Self {
        Self::from_phase(Rc::new(RefCell::new(ReplayMultiplexer::new(target))))
    }

    /// Phase name for logs.
    #[must_use]
    pub fn phase_name(&self) -> &'static str {
        self.phase.borrow().phase()
    }

    /// Number of bodies wrapped so far.
    #[must_use]
    pub fn wrapped(&self) -> usize {
        self.phase.borrow().table().len()
    }

    /// Wrap a checkpoint body and return its callable handle.
    pub fn wrap<F>(&self, body: F) -> Checkpoint
    where
        F: Fn(&CallArgs) -> Result<(), Failure> + 'static,
    {
        let key = self.phase.borrow_mut().table_mut().register(Rc::new(body));
        Checkpoint {
            key,
            registry: Rc::downgrade(&self.phase),
        }
    }

    /// Route one call to the phase, running the body if the phase says so.
    ///
    /// The phase borrow is released before the body runs, so a body may
    /// itself call checkpoints.
    ///
    /// # Errors
    ///
    /// Returns the phase's [`Failure`], or the body's failure unmodified.
    pub fn dispatch(&self, key: CheckpointKey, call: &CheckpointCall) -> Result<Dispatch, Failure> {
        let handling = self.phase.borrow_mut().handle_call(key, call)?;
        match handling {
            Handling::Recorded => Ok(Dispatch::Recorded),
            Handling::Skip => Ok(Dispatch::Skipped),
            Handling::Run(body) => {
                body(&call.args)?;
                Ok(Dispatch::Ran)
            }
        }
    }
}

impl std::fmt::Debug for Checkpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Checkpoints")
            .field("phase", &self.phase_name())
            .field("wrapped", &self.wrapped())
            .finish()
    }
}

/// A wrapped checkpoint: same body, phase-aware call form.
///
/// Holds its registry weakly: the registry owns the wrapped bodies, and a
/// body may capture other checkpoints.
#[derive(Debug, Clone)]
pub struct Checkpoint {
    key: CheckpointKey,
    registry: Weak<RefCell<dyn CheckpointPhase>>,
}

impl Checkpoint {
    /// The key this body was registered under.
    #[must_use]
    pub fn key(&self) -> CheckpointKey {
        self.key
    }

    /// Invoke with arguments, tags and id.
    ///
    /// # Errors
    ///
    /// Returns the body's [`Failure`] when replay selects this call and the
    /// body fails, [`Failure::UnknownCheckpoint`] on a key mismatch, or
    /// [`Failure::RegistryDropped`] once the registry is gone.
    pub fn call(&self, call: CheckpointCall) -> Result<Dispatch, Failure> {
        let phase = self
            .registry
            .upgrade()
            .ok_or(Failure::RegistryDropped { key: self.key })?;
        Checkpoints { phase }.dispatch(self.key, &call)
    }

    /// Invoke with no arguments, tags or id.
    ///
    /// # Errors
    ///
    /// See [`Checkpoint::call`].
    pub fn check(&self) -> Result<Dispatch, Failure> {
        self.call(CheckpointCall::new())
    }
}
