//! Per-component clamp of a staged value.
//!
//! A finalizer (`Adjust`): it bounds whatever earlier behaviors staged in
//! the same tick. Works on vectors and, cell by cell, on grids.

use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::{ConfigError, ParamRef, TickError};

/// Clamp each component into `[min, max]` (defaults `[0, 1]`).
#[derive(Debug)]
pub struct Clamp {
    core: BehaviorCore,
    min: ParamRef,
    max: ParamRef,
}

impl Attach for Clamp {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = BehaviorCore::attach(spec, ctx)?;
        core.expect_inputs(0)?;
        core.expect_outputs(1)?;
        let dim = core.output(0).dim();
        let min = core.declare(ctx, "min", vec![0.0; dim])?;
        let max = core.declare(ctx, "max", vec![1.0; dim])?;
        let lo = ctx.value(min).unwrap_or_default();
        let hi = ctx.value(max).unwrap_or_default();
        if let Some(i) = lo.iter().zip(hi).position(|(l, h)| l > h) {
            return Err(core.invalid("min", format!("min exceeds max in component {i}")));
        }
        Ok(Self { core, min, max })
    }
}

impl Behavior for Clamp {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Adjust
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let min = ctx.current(self.min)?;
        let max = ctx.current(self.max)?;
        if min.is_empty() {
            return Ok(());
        }
        for cell in ctx.staged(self.core.output(0).param)?.chunks_exact_mut(min.len()) {
            for ((v, lo), hi) in cell.iter_mut().zip(min).zip(max) {
                // f32::clamp panics if a runtime edit leaves lo > hi.
                *v = v.max(*lo).min(*hi);
            }
        }
        Ok(())
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}
