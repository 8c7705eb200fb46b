//! Harness configuration.
//!
//! Every field is an optional override of a default, so tests can tighten
//! one knob without restating the rest.

use checkpoint_kernel::checkpoint::registry::Tag;
use checkpoint_kernel::generate::DiscoveryConfig;

const DEFAULT_XFAIL_STRICT: bool = false;

/// Configuration for collection and execution of a suite.
#[derive(Debug, Clone, Default)]
pub struct HarnessConfig {
    /// Discovery settings passed to the generation hook.
    pub discovery: DiscoveryConfig,
    /// Run only cases carrying at least one of these labels. `None` runs
    /// every case.
    pub select_labels: Option<Vec<String>>,
    /// Treat an unexpected pass of an `xfail` case as a failure.
    pub xfail_strict: Option<bool>,
}

impl HarnessConfig {
    /// Effective strictness.
    #[must_use]
    pub fn xfail_strict(&self) -> bool {
        self.xfail_strict.unwrap_or(DEFAULT_XFAIL_STRICT)
    }

    /// Whether a case with `tags` passes label selection.
    #[must_use]
    pub fn selects(&self, tags: &[Tag]) -> bool {
        let Some(wanted) = &self.select_labels else {
            return true;
        };
        tags.iter().any(|tag| match tag {
            Tag::Label(name) => wanted.iter().any(|w| w == name),
            Tag::Skip { .. } | Tag::XFail { .. } => false,
        })
    }
}
