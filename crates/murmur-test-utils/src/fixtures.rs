//! Reusable behavior test fixtures.
//!
//! - [`ConstBehavior`] writes its `value` parameter into every output
//!   (Replace mode, no inputs).
//! - [`AddConstBehavior`] adds its `value` parameter to every output
//!   (Add mode, no inputs).
//!
//! [`FixtureFactory`] builds both from specs under the class tags `"const"`
//! and `"add_const"`.

use murmur_behavior::{
    ActContext, AttachContext, Behavior, BehaviorCore, BehaviorFactory, BehaviorSpec, WriteMode,
};
use murmur_core::{ConfigError, ParamRef, TickError};

fn attach_value(
    spec: &BehaviorSpec,
    ctx: &mut AttachContext<'_>,
) -> Result<(BehaviorCore, ParamRef), ConfigError> {
    let mut core = BehaviorCore::attach(spec, ctx)?;
    core.expect_inputs(0)?;
    core.expect_outputs_at_least(1)?;
    let dim = core.output(0).dim();
    for i in 1..core.outputs().len() {
        core.same_dim(core.output(0), core.output(i))?;
    }
    let value = core.declare(ctx, "value", vec![1.0; dim])?;
    Ok((core, value))
}

fn write_all(
    core: &BehaviorCore,
    value: ParamRef,
    ctx: &mut ActContext<'_>,
    add: bool,
) -> Result<(), TickError> {
    let value = ctx.current(value)?;
    for port in core.outputs() {
        let out = ctx.staged(port.param)?;
        for (o, v) in out.iter_mut().zip(value) {
            if add {
                *o += v;
            } else {
                *o = *v;
            }
        }
    }
    Ok(())
}

/// Writes a constant vector into its outputs.
#[derive(Debug)]
pub struct ConstBehavior {
    core: BehaviorCore,
    value: ParamRef,
}

impl ConstBehavior {
    pub fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let (core, value) = attach_value(spec, ctx)?;
        Ok(Self { core, value })
    }
}

impl Behavior for ConstBehavior {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Replace
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        write_all(&self.core, self.value, ctx, false)
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}

/// Adds a constant vector to its outputs.
#[derive(Debug)]
pub struct AddConstBehavior {
    core: BehaviorCore,
    value: ParamRef,
}

impl AddConstBehavior {
    pub fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let (core, value) = attach_value(spec, ctx)?;
        Ok(Self { core, value })
    }
}

impl Behavior for AddConstBehavior {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        write_all(&self.core, self.value, ctx, true)
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}

/// Factory for the fixture classes.
#[derive(Debug, Default)]
pub struct FixtureFactory;

impl BehaviorFactory for FixtureFactory {
    fn create(
        &self,
        spec: &BehaviorSpec,
        ctx: &mut AttachContext<'_>,
    ) -> Result<Box<dyn Behavior>, ConfigError> {
        match spec.class.as_str() {
            "const" => Ok(Box::new(ConstBehavior::attach(spec, ctx)?)),
            "add_const" => Ok(Box::new(AddConstBehavior::attach(spec, ctx)?)),
            other => Err(ConfigError::UnknownClass {
                class: other.to_string(),
            }),
        }
    }
}
