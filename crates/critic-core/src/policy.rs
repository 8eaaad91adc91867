//! Failure policies.
//!
//! A policy describes what the hosting caller should do with a failing
//! verdict. This crate only carries the resolved policy; it never
//! applies one. Named policies parse from their string form once at
//! configuration time; anything else is a custom callback.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::verdict::{ValidationOutcome, Verdict};

/// Caller-supplied handler for failing verdicts.
pub type OnFailHandler = Arc<dyn Fn(&Verdict) -> ValidationOutcome + Send + Sync>;

/// What the caller should do when a verdict fails.
#[derive(Clone, Default)]
pub enum OnFail {
    /// Keep the value and record the failure.
    #[default]
    Noop,
    /// Surface the failure as an error.
    Exception,
    /// Drop the failing value.
    Filter,
    /// Replace the failing value with a refusal.
    Refrain,
    /// Re-prompt the producing model with the failure context.
    Reask,
    /// Apply a programmatic fix.
    Fix,
    /// Fix first, re-ask if the fix still fails.
    FixReask,
    /// Caller-supplied handler, resolved at construction.
    Custom(OnFailHandler),
}

impl OnFail {
    /// Stable name for logs and config files.
    pub fn name(&self) -> &'static str {
        match self {
            OnFail::Noop => "noop",
            OnFail::Exception => "exception",
            OnFail::Filter => "filter",
            OnFail::Refrain => "refrain",
            OnFail::Reask => "reask",
            OnFail::Fix => "fix",
            OnFail::FixReask => "fix_reask",
            OnFail::Custom(_) => "custom",
        }
    }

    /// The custom handler, if this policy carries one.
    pub fn handler(&self) -> Option<&OnFailHandler> {
        match self {
            OnFail::Custom(handler) => Some(handler),
            _ => None,
        }
    }
}

impl fmt::Debug for OnFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OnFail::{}", self.name())
    }
}

impl fmt::Display for OnFail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for unrecognized policy names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPolicy(pub String);

impl fmt::Display for UnknownPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Unknown failure policy '{}', expected one of: noop, exception, filter, refrain, reask, fix, fix_reask",
            self.0
        )
    }
}

impl std::error::Error for UnknownPolicy {}

impl FromStr for OnFail {
    type Err = UnknownPolicy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "noop" => Ok(OnFail::Noop),
            "exception" => Ok(OnFail::Exception),
            "filter" => Ok(OnFail::Filter),
            "refrain" => Ok(OnFail::Refrain),
            "reask" => Ok(OnFail::Reask),
            "fix" => Ok(OnFail::Fix),
            "fix_reask" | "fix-reask" => Ok(OnFail::FixReask),
            other => Err(UnknownPolicy(other.to_string())),
        }
    }
}
