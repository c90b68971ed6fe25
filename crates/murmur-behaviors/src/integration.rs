//! Explicit Euler integration of velocity and position.
//!
//! ```text
//! v' = v + a * dt        (then limited to maxSpeed, if positive)
//! p' = p + v' * dt
//! ```
//!
//! Reads committed acceleration, velocity, and position; replaces the
//! staged velocity and position. Force behaviors therefore accumulate into
//! an acceleration that this integrator consumes on the following tick.

use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::math::{add_scaled, clamp_length};
use murmur_core::{ConfigError, ParamRef, TickError};
use smallvec::SmallVec;

/// Input `acceleration`, outputs `velocity position`.
#[derive(Debug)]
pub struct EulerIntegration {
    core: BehaviorCore,
    max_speed: ParamRef,
}

impl Attach for EulerIntegration {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = BehaviorCore::attach(spec, ctx)?;
        core.expect_inputs(1)?;
        core.expect_outputs(2)?;
        core.same_dim(core.input(0), core.output(0))?;
        core.same_dim(core.input(0), core.output(1))?;
        let max_speed = core.declare(ctx, "maxSpeed", vec![0.0])?;
        Ok(Self { core, max_speed })
    }
}

impl Behavior for EulerIntegration {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Replace
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let dt = ctx.dt();
        let max_speed = ctx.scalar(self.max_speed)?;
        let acceleration = ctx.current(self.core.input(0).param)?;
        let velocity_ref = self.core.output(0).param;
        let position_ref = self.core.output(1).param;

        let mut velocity: SmallVec<[f32; 4]> = SmallVec::from_slice(ctx.current(velocity_ref)?);
        add_scaled(&mut velocity, acceleration, dt);
        if max_speed > 0.0 {
            clamp_length(&mut velocity, max_speed);
        }
        let position = ctx.current(position_ref)?;

        let staged = ctx.staged(position_ref)?;
        staged.copy_from_slice(position);
        add_scaled(staged, &velocity, dt);
        ctx.staged(velocity_ref)?.copy_from_slice(&velocity);
        Ok(())
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}
