//! The textual wiring grammar.
//!
//! A behavior is configured with two whitespace-separated token lists, one
//! for inputs and one for outputs. Each token names a parameter, optionally
//! bound to one or more spaces, each optionally naming the parameter to
//! fetch on every discovered neighbor:
//!
//! ```text
//! token   := name [ '@' binding { ',' binding } ]
//! binding := space [ ':' neighbor_param ]
//! ```
//!
//! `position@flock:velocity` reads the agent's `position`, finds its
//! neighbors in the `flock` space, and fetches `velocity` from each of them.
//!
//! Parsing is purely structural. Names are resolved against an agent's
//! parameters later, by [`AttachContext`](crate::AttachContext).

use murmur_core::ConfigError;
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// One `@space[:neighbor_param]` binding of a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SpaceBinding {
    /// Name of the space the parameter must be registered in.
    pub space: String,
    /// Parameter to fetch on each neighbor, if any.
    pub neighbor_param: Option<String>,
}

/// One parsed wiring token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WiringToken {
    /// The parameter name.
    pub param: String,
    /// Space bindings, in textual order.
    pub spaces: SmallVec<[SpaceBinding; 1]>,
}

impl WiringToken {
    /// A token with no space bindings.
    pub fn bare(param: impl Into<String>) -> Self {
        Self {
            param: param.into(),
            spaces: SmallVec::new(),
        }
    }
}

fn malformed(text: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Wiring {
        text: text.to_string(),
        reason: reason.into(),
    }
}

fn check_name(text: &str, what: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(malformed(text, format!("empty {what}")));
    }
    if let Some(c) = name.chars().find(|c| matches!(c, '@' | ',' | ':')) {
        return Err(malformed(text, format!("unexpected '{c}' in {what} '{name}'")));
    }
    Ok(())
}

impl FromStr for WiringToken {
    type Err = ConfigError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let (param, bindings) = match text.split_once('@') {
            Some((param, rest)) => (param, Some(rest)),
            None => (text, None),
        };
        check_name(text, "parameter name", param)?;

        let mut spaces = SmallVec::new();
        if let Some(rest) = bindings {
            for binding in rest.split(',') {
                let (space, neighbor_param) = match binding.split_once(':') {
                    Some((space, neighbor)) => {
                        check_name(text, "neighbor parameter name", neighbor)?;
                        (space, Some(neighbor.to_string()))
                    }
                    None => (binding, None),
                };
                check_name(text, "space name", space)?;
                if spaces.iter().any(|b: &SpaceBinding| b.space == space) {
                    return Err(malformed(text, format!("space '{space}' bound twice")));
                }
                spaces.push(SpaceBinding {
                    space: space.to_string(),
                    neighbor_param,
                });
            }
        }
        Ok(Self {
            param: param.to_string(),
            spaces,
        })
    }
}

impl fmt::Display for WiringToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.param)?;
        for (i, binding) in self.spaces.iter().enumerate() {
            f.write_str(if i == 0 { "@" } else { "," })?;
            write!(f, "{}", binding.space)?;
            if let Some(neighbor) = &binding.neighbor_param {
                write!(f, ":{neighbor}")?;
            }
        }
        Ok(())
    }
}

/// Parse a whitespace-separated token list. An empty or blank string yields
/// no tokens.
///
/// # Errors
///
/// Returns [`ConfigError::Wiring`] for the first malformed token.
pub fn parse_wiring(text: &str) -> Result<Vec<WiringToken>, ConfigError> {
    text.split_whitespace().map(str::parse).collect()
}

/// Render a token list back into its textual form.
pub fn format_wiring(tokens: &[WiringToken]) -> String {
    tokens
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
