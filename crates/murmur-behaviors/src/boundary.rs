//! Box boundaries: soft repulsion and periodic wrap.
//!
//! Both read the box from internal `minPos`/`maxPos` parameters shaped like
//! the position (defaults: the unit box).

use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::math::add_scaled;
use murmur_core::{ConfigError, ParamRef, TickError};
use smallvec::SmallVec;

fn declare_box(
    core: &mut BehaviorCore,
    ctx: &mut AttachContext<'_>,
    dim: usize,
) -> Result<(ParamRef, ParamRef), ConfigError> {
    let min = core.declare(ctx, "minPos", vec![0.0; dim])?;
    let max = core.declare(ctx, "maxPos", vec![1.0; dim])?;
    let lo = ctx.value(min).unwrap_or_default();
    let hi = ctx.value(max).unwrap_or_default();
    if let Some(axis) = lo.iter().zip(hi).position(|(l, h)| l > h) {
        return Err(core.invalid("minPos", format!("minPos exceeds maxPos on axis {axis}")));
    }
    Ok((min, max))
}

/// Push away from the box walls.
///
/// Within `maxDist` of a wall the push grows linearly from 0 at `maxDist`
/// to 1 at the wall, per axis, then is scaled by `amount`. Positions
/// outside the box get the full push.
#[derive(Debug)]
pub struct BoundaryRepulsion {
    core: BehaviorCore,
    min: ParamRef,
    max: ParamRef,
    reach: ParamRef,
    amount: ParamRef,
}

impl Attach for BoundaryRepulsion {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = BehaviorCore::attach(spec, ctx)?;
        core.expect_inputs(1)?;
        core.expect_outputs(1)?;
        core.same_dim(core.input(0), core.output(0))?;
        let dim = core.output(0).dim();
        let (min, max) = declare_box(&mut core, ctx, dim)?;
        let reach = core.declare(ctx, "maxDist", vec![0.1])?;
        if ctx.value(reach).and_then(|v| v.first().copied()).unwrap_or(0.0) <= 0.0 {
            return Err(core.invalid("maxDist", "must be positive"));
        }
        let amount = core.declare(ctx, "amount", vec![1.0])?;
        Ok(Self {
            core,
            min,
            max,
            reach,
            amount,
        })
    }
}

impl Behavior for BoundaryRepulsion {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let min = ctx.current(self.min)?;
        let max = ctx.current(self.max)?;
        let reach = ctx.scalar(self.reach)?;
        let amount = ctx.scalar(self.amount)?;
        if reach <= 0.0 {
            return Ok(());
        }
        let position = ctx.current(self.core.input(0).param)?;
        let mut push: SmallVec<[f32; 4]> = SmallVec::from_elem(0.0, position.len());
        for (i, p) in position.iter().enumerate() {
            let below = p - min[i];
            if below < reach {
                push[i] += (1.0 - below / reach).min(1.0);
            }
            let above = max[i] - p;
            if above < reach {
                push[i] -= (1.0 - above / reach).min(1.0);
            }
        }
        add_scaled(ctx.staged(self.core.output(0).param)?, &push, amount);
        Ok(())
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}

/// Wrap a staged position periodically into `[minPos, maxPos)`.
///
/// A finalizer: it adjusts whatever the earlier behaviors staged, so it
/// belongs after the integrator. Axes with zero extent are left alone.
#[derive(Debug)]
pub struct BoundaryWrap {
    core: BehaviorCore,
    min: ParamRef,
    max: ParamRef,
}

impl Attach for BoundaryWrap {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = BehaviorCore::attach(spec, ctx)?;
        core.expect_inputs(0)?;
        core.expect_outputs(1)?;
        core.require_vector(core.output(0))?;
        let dim = core.output(0).dim();
        let (min, max) = declare_box(&mut core, ctx, dim)?;
        Ok(Self { core, min, max })
    }
}

impl Behavior for BoundaryWrap {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Adjust
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let min = ctx.current(self.min)?;
        let max = ctx.current(self.max)?;
        let position = ctx.staged(self.core.output(0).param)?;
        for ((p, lo), hi) in position.iter_mut().zip(min).zip(max) {
            let width = hi - lo;
            if width > 0.0 {
                *p = lo + (*p - lo).rem_euclid(width);
            }
        }
        Ok(())
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::Parameter;
    use murmur_test_utils::MockWorld;

    fn agent(position: Vec<f32>) -> (MockWorld, murmur_core::AgentId, ParamRef, ParamRef) {
        let mut w = MockWorld::new();
        let a = w.add_agent("a");
        let dim = position.len();
        let pos = w.add_param(a, Parameter::new("position", position));
        let acc = w.add_param(a, Parameter::new("acceleration", vec![0.0; dim]));
        (w, a, pos, acc)
    }

    #[test]
    fn repulsion_pushes_inward_near_walls() {
        let (mut w, a, _, acc) = agent(vec![0.05, 0.5, 0.975]);
        let spec = BehaviorSpec::new("boundary_repulsion", "walls", "position", "acceleration");
        let b = BoundaryRepulsion::attach(&spec, &mut w.attach_context(a)).unwrap();
        w.act(a, &b).unwrap();
        let staged = w.staged(acc);
        assert!((staged[0] - 0.5).abs() < 1e-6);
        assert_eq!(staged[1], 0.0);
        assert!((staged[2] + 0.75).abs() < 1e-6);
    }

    #[test]
    fn wrap_adjusts_staged_value() {
        let (mut w, a, pos, _) = agent(vec![0.0, 0.0]);
        let spec = BehaviorSpec::new("boundary_wrap", "torus", "", "position")
            .with_param("minPos", vec![-1.0, -1.0])
            .with_param("maxPos", vec![1.0, 1.0]);
        let b = BoundaryWrap::attach(&spec, &mut w.attach_context(a)).unwrap();
        let mut bank = w.detach(a);
        bank.get_mut(pos.param).unwrap().copy_from_slice(&[1.5, -3.5]);
        w.restore(a, bank);
        w.act(a, &b).unwrap();
        assert_eq!(w.staged(pos), &[-0.5, 0.5]);
    }

    #[test]
    fn inverted_box_rejected() {
        let (mut w, a, _, _) = agent(vec![0.0]);
        let spec = BehaviorSpec::new("boundary_wrap", "torus", "", "position")
            .with_param("minPos", vec![2.0]);
        assert!(matches!(
            BoundaryWrap::attach(&spec, &mut w.attach_context(a)),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
