//! Linear drag: `output += -amount * velocity`.

use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::math::add_scaled;
use murmur_core::{ConfigError, ParamRef, TickError};

/// Accumulates a force opposing the committed velocity.
#[derive(Debug)]
pub struct Damping {
    core: BehaviorCore,
    amount: ParamRef,
}

impl Attach for Damping {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = BehaviorCore::attach(spec, ctx)?;
        core.expect_inputs(1)?;
        core.expect_outputs(1)?;
        core.same_dim(core.input(0), core.output(0))?;
        let amount = core.declare(ctx, "amount", vec![1.0])?;
        Ok(Self { core, amount })
    }
}

impl Behavior for Damping {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let amount = ctx.scalar(self.amount)?;
        let velocity = ctx.current(self.core.input(0).param)?;
        add_scaled(ctx.staged(self.core.output(0).param)?, velocity, -amount);
        Ok(())
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}
