//! Write-order validation for one agent's behavior pipeline.
//!
//! Staged values start each tick equal to the committed value, so `Add`
//! writers accumulate on top of whatever an earlier `Replace` writer put
//! there. A `Replace` writer placed after an `Add` or `Adjust` writer of
//! the same parameter silently discards their contribution.
//! [`write_order_violations`] finds every such pair; the
//! [`WriteOrderPolicy`] decides whether they are fatal.

use crate::behavior::{Behavior, WriteMode};
use indexmap::IndexMap;
use murmur_core::ParamRef;
use serde::{Deserialize, Serialize};

/// What to do when a pipeline violates the replace-before-add order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteOrderPolicy {
    /// Reject the change with [`ConfigError::WriteOrder`](murmur_core::ConfigError::WriteOrder).
    #[default]
    Strict,
    /// Log a warning and accept the change.
    Warn,
}

/// A `Replace` writer ordered after an accumulating writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOrderViolation {
    /// The contested parameter.
    pub param: ParamRef,
    /// Name of the earlier `Add`/`Adjust` writer.
    pub earlier: String,
    /// Name of the later `Replace` writer.
    pub later: String,
}

/// Scan a pipeline (in execution order) for write-order violations.
pub fn write_order_violations<'b, I>(behaviors: I) -> Vec<WriteOrderViolation>
where
    I: IntoIterator<Item = &'b dyn Behavior>,
{
    // Earliest accumulating writer seen so far, per parameter.
    let mut accumulated: IndexMap<ParamRef, &'b str> = IndexMap::new();
    let mut violations = Vec::new();
    for behavior in behaviors {
        for (param, mode) in behavior.writes() {
            match mode {
                WriteMode::Replace => {
                    if let Some(earlier) = accumulated.get(&param) {
                        violations.push(WriteOrderViolation {
                            param,
                            earlier: earlier.to_string(),
                            later: behavior.name().to_string(),
                        });
                    }
                }
                WriteMode::Add | WriteMode::Adjust => {
                    accumulated.entry(param).or_insert(behavior.name());
                }
            }
        }
    }
    violations
}
