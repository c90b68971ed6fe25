//! Validation of rate constants shared by the environment behaviors.

use murmur_behavior::{AttachContext, BehaviorCore};
use murmur_core::{ConfigError, ParamRef};

/// Declare an internal parameter whose components must all be finite and
/// non-negative.
pub(crate) fn declare_rates(
    core: &mut BehaviorCore,
    ctx: &mut AttachContext<'_>,
    key: &str,
    default: Vec<f32>,
) -> Result<ParamRef, ConfigError> {
    let param = core.declare(ctx, key, default)?;
    let values = ctx.value(param).unwrap_or_default();
    if let Some(bad) = values.iter().find(|r| !r.is_finite() || **r < 0.0) {
        return Err(core.invalid(key, format!("must be finite and non-negative, got {bad}")));
    }
    Ok(param)
}
