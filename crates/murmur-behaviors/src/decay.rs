//! First-order decay: `out += -rate * dt * in`, per value component.
//!
//! Works on vectors and, cell by cell, on grids.

use crate::rate::declare_rates;
use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::{ConfigError, ParamRef, TickError};

/// Exponential decay toward zero.
#[derive(Debug)]
pub struct Decay {
    core: BehaviorCore,
    rate: ParamRef,
}

impl Attach for Decay {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = BehaviorCore::attach(spec, ctx)?;
        core.expect_inputs(1)?;
        core.expect_outputs(1)?;
        core.same_shape(core.input(0), core.output(0))?;
        let dim = core.input(0).dim();
        let rate = declare_rates(&mut core, ctx, "rate", vec![0.1; dim])?;
        Ok(Self { core, rate })
    }
}

impl Behavior for Decay {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let dt = ctx.dt();
        let rate = ctx.current(self.rate)?;
        let input = ctx.current(self.core.input(0).param)?;
        if rate.is_empty() {
            return Ok(());
        }
        let out = ctx.staged(self.core.output(0).param)?;
        let cells = out
            .chunks_exact_mut(rate.len())
            .zip(input.chunks_exact(rate.len()));
        for (out_cell, in_cell) in cells {
            for ((o, v), r) in out_cell.iter_mut().zip(in_cell).zip(rate) {
                *o -= r * dt * v;
            }
        }
        Ok(())
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}
