//! Value transfer between parameters: verbatim copy and scaled copy.
//!
//! Both read the input's committed value and overwrite the output's staged
//! value. Input and output must share a shape (dimension for vectors,
//! geometry for grids). Wiring a parameter to itself carries its value
//! forward unchanged (or scaled) each tick.

use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::{ConfigError, ParamRef, TickError};

fn attach_transfer(
    spec: &BehaviorSpec,
    ctx: &mut AttachContext<'_>,
) -> Result<BehaviorCore, ConfigError> {
    let core = BehaviorCore::attach(spec, ctx)?;
    core.expect_inputs(1)?;
    core.expect_outputs(1)?;
    core.same_shape(core.input(0), core.output(0))?;
    Ok(core)
}

/// `output = input`.
#[derive(Debug)]
pub struct IdentityCopy {
    core: BehaviorCore,
}

impl Attach for IdentityCopy {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        Ok(Self {
            core: attach_transfer(spec, ctx)?,
        })
    }
}

impl Behavior for IdentityCopy {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Replace
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let value = ctx.current(self.core.input(0).param)?;
        ctx.staged(self.core.output(0).param)?.copy_from_slice(value);
        Ok(())
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}

/// `output = factor * input`.
#[derive(Debug)]
pub struct Scale {
    core: BehaviorCore,
    factor: ParamRef,
}

impl Attach for Scale {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = attach_transfer(spec, ctx)?;
        let factor = core.declare(ctx, "factor", vec![1.0])?;
        Ok(Self { core, factor })
    }
}

impl Behavior for Scale {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Replace
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let factor = ctx.scalar(self.factor)?;
        let value = ctx.current(self.core.input(0).param)?;
        for (o, v) in ctx.staged(self.core.output(0).param)?.iter_mut().zip(value) {
            *o = factor * v;
        }
        Ok(())
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}
