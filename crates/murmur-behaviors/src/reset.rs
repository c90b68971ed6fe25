//! Overwrite outputs with a constant.
//!
//! Typically first in a pipeline, zeroing an accumulator (acceleration, a
//! source field) before the `Add` behaviors that follow it. Grid outputs
//! are filled cell by cell.

use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::{ConfigError, ParamRef, TickError};

/// Writes its `value` into every output (every cell of grid outputs).
#[derive(Debug)]
pub struct Reset {
    core: BehaviorCore,
    value: ParamRef,
}

impl Attach for Reset {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = BehaviorCore::attach(spec, ctx)?;
        core.expect_inputs(0)?;
        core.expect_outputs_at_least(1)?;
        let dim = core.output(0).dim();
        for port in &core.outputs()[1..] {
            if port.dim() != dim {
                return Err(ConfigError::Dimension {
                    behavior: spec.name.clone(),
                    parameter: port.name.clone(),
                    expected: dim,
                    actual: port.dim(),
                });
            }
        }
        let value = core.declare(ctx, "value", vec![0.0; dim])?;
        Ok(Self { core, value })
    }
}

impl Behavior for Reset {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Replace
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let value = ctx.current(self.value)?;
        if value.is_empty() {
            return Ok(());
        }
        for port in self.core.outputs() {
            for cell in ctx.staged(port.param)?.chunks_exact_mut(value.len()) {
                cell.copy_from_slice(value);
            }
        }
        Ok(())
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}
