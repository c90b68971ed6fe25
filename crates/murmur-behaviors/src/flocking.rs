//! Neighbor-driven steering forces: cohesion, alignment, and evasion.
//!
//! All three follow the [`neighborhood`](crate::neighborhood) template and
//! accumulate (`Add`) into an acceleration-like output:
//!
//! | class | input wiring | per-neighbor contribution |
//! |-------|--------------|---------------------------|
//! | `cohesion` | `position@space` | unit direction to the neighbor |
//! | `alignment` | `position@space[:velocity] velocity` | neighbor velocity minus own |
//! | `evasion` | `position@space` | `-direction / distance` |

use crate::neighborhood::{self, agent_mean, BandParams};
use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::math::add_scaled;
use murmur_core::{ConfigError, ParamRef, TickError};

fn attach_steering(
    spec: &BehaviorSpec,
    ctx: &mut AttachContext<'_>,
    inputs: usize,
) -> Result<(BehaviorCore, ParamRef, BandParams), ConfigError> {
    let mut core = BehaviorCore::attach(spec, ctx)?;
    core.expect_inputs(inputs)?;
    core.expect_outputs(1)?;
    core.require_groups(core.input(0))?;
    core.same_dim(core.input(0), core.output(0))?;
    let amount = core.declare(ctx, "amount", vec![1.0])?;
    let band = BandParams::declare(&mut core, ctx)?;
    Ok((core, amount, band))
}

/// Steer toward the mean direction of neighbors.
#[derive(Debug)]
pub struct Cohesion {
    core: BehaviorCore,
    amount: ParamRef,
    band: BandParams,
}

impl Attach for Cohesion {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let (core, amount, band) = attach_steering(spec, ctx, 1)?;
        Ok(Self { core, amount, band })
    }
}

impl Behavior for Cohesion {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let band = self.band.read(ctx)?;
        let amount = ctx.scalar(self.amount)?;
        let port = self.core.input(0);
        let mean = agent_mean(ctx, port, band, port.dim(), |rel, _, out| {
            Ok(neighborhood::direction(rel, out))
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

/// Steer toward the mean velocity of neighbors.
///
/// The second input is the agent's own velocity. Each binding's neighbor
/// parameter names the velocity to fetch on neighbors and defaults to the
/// second input's name. Neighbors lacking it, or whose value has the wrong
/// dimension, are not counted.
#[derive(Debug)]
pub struct Alignment {
    core: BehaviorCore,
    amount: ParamRef,
    band: BandParams,
}

impl Attach for Alignment {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let (core, amount, band) = attach_steering(spec, ctx, 2)?;
        core.same_dim(core.output(0), core.input(1))?;
        Ok(Self { core, amount, band })
    }
}

impl Behavior for Alignment {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let band = self.band.read(ctx)?;
        let amount = ctx.scalar(self.amount)?;
        let own = self.core.input(1);
        let velocity = ctx.current(own.param)?;
        let port = self.core.input(0);
        let mean = agent_mean(ctx, port, band, velocity.len(), |rel, name, out| {
            let name = name.unwrap_or(own.name.as_str());
            match ctx.neighbor_value(rel, Some(name))? {
                Some(theirs) if theirs.len() == out.len() => {
                    for ((o, t), v) in out.iter_mut().zip(theirs).zip(velocity) {
                        *o = t - v;
                    }
                    Ok(true)
                }
                _ => Ok(false),
            }
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

/// Steer away from neighbors, weighted by inverse distance.
///
/// Neighbors at distance zero have no defined direction and are skipped.
#[derive(Debug)]
pub struct Evasion {
    core: BehaviorCore,
    amount: ParamRef,
    band: BandParams,
}

impl Attach for Evasion {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let (core, amount, band) = attach_steering(spec, ctx, 1)?;
        Ok(Self { core, amount, band })
    }
}

impl Behavior for Evasion {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let band = self.band.read(ctx)?;
        let amount = ctx.scalar(self.amount)?;
        let port = self.core.input(0);
        let mean = agent_mean(ctx, port, band, port.dim(), |rel, _, out| {
            if rel.distance <= 0.0 {
                return Ok(false);
            }
            for (o, d) in out.iter_mut().zip(&rel.direction) {
                *o = -d / rel.distance;
            }
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
    use murmur_core::{GridGeometry, NeighborSource, Parameter};
    use murmur_test_utils::MockWorld;

    struct Flock {
        world: MockWorld,
        me: murmur_core::AgentId,
        acc: ParamRef,
        group: murmur_core::GroupHandle,
    }

    /// One agent at the origin plus neighbors on the +x axis at `distances`,
    /// each moving with velocity `[0, 1]`.
    fn flock(distances: &[f32]) -> Flock {
        let mut world = MockWorld::new();
        let me = world.add_agent("me");
        let pos = world.add_param(me, Parameter::new("position", vec![0.0, 0.0]));
        world.add_param(me, Parameter::new("velocity", vec![0.0, 0.0]));
        let acc = world.add_param(me, Parameter::new("acceleration", vec![0.0, 0.0]));
        let group = world.register(pos, "flock");

        let mut relations = Vec::new();
        for (i, &d) in distances.iter().enumerate() {
            let other = world.add_agent(&format!("n{i}"));
            let their_pos = world.add_param(other, Parameter::new("position", vec![d, 0.0]));
            world.add_param(other, Parameter::new("velocity", vec![0.0, 1.0]));
            relations.push(MockWorld::relation(their_pos, d, &[1.0, 0.0]));
        }
        world.set_neighbors(group, relations);
        Flock {
            world,
            me,
            acc,
            group,
        }
    }

    #[test]
    fn cohesion_band_admits_exactly_one() {
        let mut f = flock(&[0.1, 0.4, 0.6]);
        let spec = BehaviorSpec::new("cohesion", "coh", "position@flock", "acceleration")
            .with_param("minDist", vec![0.2])
            .with_param("maxDist", vec![0.5])
            .with_param("amount", vec![2.0]);
        let b = Cohesion::attach(&spec, &mut f.world.attach_context(f.me)).unwrap();
        f.world.act(f.me, &b).unwrap();
        assert_eq!(f.world.staged(f.acc), &[2.0, 0.0]);
    }

    #[test]
    fn grid_fields_in_the_space_do_not_steer() {
        let mut f = flock(&[1.0]);
        let env = f.world.add_agent("soil");
        let geometry = GridGeometry::new(1, &[2, 2], &[-4.0, -4.0], &[-2.0, -2.0]).unwrap();
        let trail = f
            .world
            .add_param(env, Parameter::grid("trail", geometry, &[0.0]).unwrap());
        let mut relations = f.world.neighbors(f.group).to_vec();
        relations.push(MockWorld::relation(trail, 4.2, &[-0.707, -0.707]));
        f.world.set_neighbors(f.group, relations);

        let spec = BehaviorSpec::new("cohesion", "coh", "position@flock", "acceleration");
        let b = Cohesion::attach(&spec, &mut f.world.attach_context(f.me)).unwrap();
        f.world.act(f.me, &b).unwrap();
        assert_eq!(f.world.staged(f.acc), &[1.0, 0.0]);

        let spec = BehaviorSpec::new("evasion", "avoid", "position@flock", "acceleration");
        let b = Evasion::attach(&spec, &mut f.world.attach_context(f.me)).unwrap();
        f.world.flush(f.me);
        f.world.act(f.me, &b).unwrap();
        assert_eq!(f.world.staged(f.acc), &[0.0, 0.0]);
    }

    #[test]
    fn no_admitted_neighbors_leaves_output_unchanged() {
        let mut f = flock(&[0.1, 0.6]);
        f.world.set(f.acc, &[0.3, -0.3]);
        let spec = BehaviorSpec::new("cohesion", "coh", "position@flock", "acceleration")
            .with_param("minDist", vec![0.2])
            .with_param("maxDist", vec![0.5]);
        let b = Cohesion::attach(&spec, &mut f.world.attach_context(f.me)).unwrap();
        f.world.act(f.me, &b).unwrap();
        assert_eq!(f.world.staged(f.acc), &[0.3, -0.3]);
    }

    #[test]
    fn alignment_defaults_neighbor_param_to_own_velocity_name() {
        let mut f = flock(&[1.0, 2.0]);
        let spec = BehaviorSpec::new(
            "alignment",
            "align",
            "position@flock velocity",
            "acceleration",
        );
        let b = Alignment::attach(&spec, &mut f.world.attach_context(f.me)).unwrap();
        f.world.act(f.me, &b).unwrap();
        assert_eq!(f.world.staged(f.acc), &[0.0, 1.0]);
    }

    #[test]
    fn alignment_skips_neighbors_without_the_parameter() {
        let mut f = flock(&[1.0]);
        let spec = BehaviorSpec::new(
            "alignment",
            "align",
            "position@flock:heading velocity",
            "acceleration",
        );
        let b = Alignment::attach(&spec, &mut f.world.attach_context(f.me)).unwrap();
        f.world.act(f.me, &b).unwrap();
        assert_eq!(f.world.staged(f.acc), &[0.0, 0.0]);
        assert_eq!(b.inputs()[0].groups[0].handle, f.group);
    }

    #[test]
    fn evasion_weights_by_inverse_distance() {
        let mut f = flock(&[0.5, 2.0]);
        let spec = BehaviorSpec::new("evasion", "avoid", "position@flock", "acceleration");
        let b = Evasion::attach(&spec, &mut f.world.attach_context(f.me)).unwrap();
        f.world.act(f.me, &b).unwrap();
        // mean(-1/0.5, -1/2) = -1.25
        assert_eq!(f.world.staged(f.acc), &[-1.25, 0.0]);
    }

    #[test]
    fn steering_requires_a_space_binding_and_matching_dims() {
        let mut f = flock(&[]);
        f.world
            .add_param(f.me, Parameter::new("heading", vec![0.0, 0.0, 0.0]));
        let no_space = BehaviorSpec::new("cohesion", "c1", "position", "acceleration");
        assert!(matches!(
            Cohesion::attach(&no_space, &mut f.world.attach_context(f.me)),
            Err(ConfigError::MissingNeighborGroup { .. })
        ));
        let wrong_dim = BehaviorSpec::new("cohesion", "c2", "position@flock", "heading");
        assert!(matches!(
            Cohesion::attach(&wrong_dim, &mut f.world.attach_context(f.me)),
            Err(ConfigError::Dimension {
                expected: 2,
                actual: 3,
                ..
            })
        ));
        let bad_band = BehaviorSpec::new("cohesion", "c3", "position@flock", "acceleration")
            .with_param("minDist", vec![0.5])
            .with_param("maxDist", vec![0.2]);
        assert!(matches!(
            Cohesion::attach(&bad_band, &mut f.world.attach_context(f.me)),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
