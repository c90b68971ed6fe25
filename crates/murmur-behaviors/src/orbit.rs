//! Tangential steering around neighbors: the `circular` and `spiral`
//! classes.
//!
//! Each admitted neighbor contributes the direction to it rotated a
//! quarter turn: `(-dy, dx)` in 2D, `axis × direction` in 3D. A spiral adds
//! `radial × direction` on top, pulling inward (positive) or pushing
//! outward (negative) while circling.

use crate::neighborhood::{agent_mean, BandParams};
use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::math::{add_scaled, cross3, length};
use murmur_core::{ConfigError, ParamRef, TickError};

/// Circle (or spiral) around neighbors.
#[derive(Debug)]
pub struct Orbit {
    core: BehaviorCore,
    amount: ParamRef,
    band: BandParams,
    axis: Option<ParamRef>,
    radial: Option<ParamRef>,
}

impl Attach for Orbit {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = BehaviorCore::attach(spec, ctx)?;
        core.expect_inputs(1)?;
        core.expect_outputs(1)?;
        core.require_groups(core.input(0))?;
        core.same_dim(core.input(0), core.output(0))?;
        let dim = core.output(0).dim();
        if dim != 2 {
            core.require_dim(core.output(0), 3)?;
        }
        let amount = core.declare(ctx, "amount", vec![1.0])?;
        let band = BandParams::declare(&mut core, ctx)?;
        let axis = if dim == 3 {
            let axis = core.declare(ctx, "axis", vec![0.0, 0.0, 1.0])?;
            if ctx.value(axis).map(length).unwrap_or(0.0) <= 0.0 {
                return Err(core.invalid("axis", "rotation axis must be non-zero"));
            }
            Some(axis)
        } else {
            None
        };
        let radial = if spec.class == "spiral" {
            Some(core.declare(ctx, "radial", vec![0.5])?)
        } else {
            None
        };
        Ok(Self {
            core,
            amount,
            band,
            axis,
            radial,
        })
    }
}

impl Behavior for Orbit {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let band = self.band.read(ctx)?;
        let amount = ctx.scalar(self.amount)?;
        let axis = match self.axis {
            Some(p) => Some(ctx.current(p)?),
            None => None,
        };
        let radial = match self.radial {
            Some(p) => ctx.scalar(p)?,
            None => 0.0,
        };
        let port = self.core.input(0);
        let mean = agent_mean(ctx, port, band, port.dim(), |rel, _, out| {
            let d = &rel.direction;
            match axis {
                Some(axis) if d.len() == 3 => out.copy_from_slice(&cross3(axis, d)),
                None if d.len() == 2 => {
                    out[0] = -d[1];
                    out[1] = d[0];
                }
                _ => return Ok(false),
            }
            add_scaled(out, d, radial);
            Ok(true)
        })?;
        if let Some(mean) = mean {
            add_scaled(ctx.staged(self.core.output(0).param)?, &mean, amount);
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

    fn world(dim: usize) -> (MockWorld, murmur_core::AgentId, ParamRef) {
        let mut world = MockWorld::new();
        let me = world.add_agent("me");
        let pos = world.add_param(me, Parameter::new("position", vec![0.0; dim]));
        let acc = world.add_param(me, Parameter::new("acceleration", vec![0.0; dim]));
        let group = world.register(pos, "flock");
        let other = world.add_agent("other");
        let mut at = vec![0.0; dim];
        at[0] = 1.0;
        let theirs = world.add_param(other, Parameter::new("position", at.clone()));
        world.set_neighbors(group, vec![MockWorld::relation(theirs, 1.0, &at)]);
        (world, me, acc)
    }

    #[test]
    fn circular_2d_is_perpendicular() {
        let (mut w, me, acc) = world(2);
        let spec = BehaviorSpec::new("circular", "orbit", "position@flock", "acceleration");
        let b = Orbit::attach(&spec, &mut w.attach_context(me)).unwrap();
        w.act(me, &b).unwrap();
        assert_eq!(w.staged(acc), &[0.0, 1.0]);
    }

    #[test]
    fn spiral_adds_radial_term() {
        let (mut w, me, acc) = world(2);
        let spec = BehaviorSpec::new("spiral", "orbit", "position@flock", "acceleration")
            .with_param("radial", vec![0.25]);
        let b = Orbit::attach(&spec, &mut w.attach_context(me)).unwrap();
        w.act(me, &b).unwrap();
        assert_eq!(w.staged(acc), &[0.25, 1.0]);
    }

    #[test]
    fn circular_3d_uses_axis() {
        let (mut w, me, acc) = world(3);
        let spec = BehaviorSpec::new("circular", "orbit", "position@flock", "acceleration");
        let b = Orbit::attach(&spec, &mut w.attach_context(me)).unwrap();
        w.act(me, &b).unwrap();
        // z × x = y
        assert_eq!(w.staged(acc), &[0.0, 1.0, 0.0]);
    }

    #[test]
    fn radial_only_declared_for_spirals() {
        let (mut w, me, _) = world(2);
        let spec = BehaviorSpec::new("circular", "orbit", "position@flock", "acceleration")
            .with_param("radial", vec![0.25]);
        let b = Orbit::attach(&spec, &mut w.attach_context(me)).unwrap();
        assert!(matches!(
            b.core().check_overrides(),
            Err(ConfigError::UnknownInternal { .. })
        ));
    }

    #[test]
    fn zero_axis_rejected() {
        let (mut w, me, _) = world(3);
        let spec = BehaviorSpec::new("circular", "orbit", "position@flock", "acceleration")
            .with_param("axis", vec![0.0, 0.0, 0.0]);
        assert!(matches!(
            Orbit::attach(&spec, &mut w.attach_context(me)),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
