//! Agents writing into an environment grid.
//!
//! The environment registers its grid in a space (at the grid's center)
//! and so sees the agents registered there as its neighbors. Each tick,
//! every neighbor whose position lies inside the grid deposits
//! `amount * value` at its position, where `value` is the neighbor's
//! parameter named after `:` in the wiring (`trail@agents:scent`), or all
//! ones when no name is given. Neighbors lacking that parameter, or whose
//! value has the wrong dimension, deposit nothing.

use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::{ConfigError, GridGeometry, ParamRef, TickError};
use murmur_space::field::{self, Placement, WriteOp};
use smallvec::SmallVec;

/// Accumulate agent-supplied values into a grid at agent positions.
///
/// Input: the grid, bound to one or more spaces. Output: a grid of the
/// same geometry (commonly the same parameter). `interpolate > 0` splats
/// each deposit over the surrounding cells instead of the containing one.
#[derive(Debug)]
pub struct FieldDeposit {
    core: BehaviorCore,
    geometry: GridGeometry,
    amount: ParamRef,
    interpolate: ParamRef,
}

impl Attach for FieldDeposit {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = BehaviorCore::attach(spec, ctx)?;
        core.expect_inputs(1)?;
        core.expect_outputs(1)?;
        core.require_groups(core.input(0))?;
        core.same_grid(core.input(0), core.output(0))?;
        let geometry = core.require_grid(core.output(0))?.clone();
        let amount = core.declare(ctx, "amount", vec![1.0])?;
        let interpolate = core.declare(ctx, "interpolate", vec![0.0])?;
        Ok(Self {
            core,
            geometry,
            amount,
            interpolate,
        })
    }
}

impl Behavior for FieldDeposit {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let amount = ctx.scalar(self.amount)?;
        let placement = if ctx.scalar(self.interpolate)? > 0.0 {
            Placement::Linear
        } else {
            Placement::Nearest
        };
        let d = self.geometry.value_dim();
        let ones: SmallVec<[f32; 4]> = SmallVec::from_elem(1.0, d);
        let mut scaled: SmallVec<[f32; 4]> = SmallVec::from_elem(0.0, d);

        // Resolve every deposit before borrowing the staged grid.
        let mut deposits: Vec<(&[f32], &[f32])> = Vec::new();
        for group in &self.core.input(0).groups {
            for rel in ctx.neighbors(group.handle) {
                let position = ctx.current(rel.neighbor)?;
                let value = match group.neighbor_param.as_deref() {
                    Some(name) => match ctx.neighbor_value(rel, Some(name))? {
                        Some(v) if v.len() == d => v,
                        _ => continue,
                    },
                    None => &ones[..],
                };
                deposits.push((position, value));
            }
        }

        let grid = ctx.staged(self.core.output(0).param)?;
        for (position, value) in deposits {
            if position.len() != self.geometry.ndim() {
                continue;
            }
            for (s, v) in scaled.iter_mut().zip(value) {
                *s = amount * v;
            }
            field::write(&self.geometry, grid, position, &scaled, WriteOp::Add, placement);
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

    struct Setup {
        world: MockWorld,
        env: murmur_core::AgentId,
        trail: ParamRef,
    }

    /// A 4x4 trail grid over the unit square seeing two agents.
    fn setup() -> Setup {
        let mut world = MockWorld::new();
        let env = world.add_agent("env");
        let geometry = GridGeometry::new(1, &[4, 4], &[0.0, 0.0], &[1.0, 1.0]).unwrap();
        let trail = world.add_param(env, Parameter::grid("trail", geometry, &[0.0]).unwrap());
        let group = world.register(trail, "agents");

        let mut relations = Vec::new();
        for (name, at, scent) in [("a", [0.1, 0.1], 2.0), ("b", [0.9, 0.1], 3.0)] {
            let agent = world.add_agent(name);
            let pos = world.add_param(agent, Parameter::new("position", at.to_vec()));
            world.add_param(agent, Parameter::new("scent", vec![scent]));
            relations.push(MockWorld::relation(pos, 0.5, &[0.0, 0.0]));
        }
        let outsider = world.add_agent("c");
        let far = world.add_param(outsider, Parameter::new("position", vec![5.0, 5.0]));
        relations.push(MockWorld::relation(far, 6.0, &[1.0, 1.0]));
        world.set_neighbors(group, relations);
        Setup { world, env, trail }
    }

    #[test]
    fn deposits_named_values_at_nearest_cells() {
        let mut s = setup();
        let spec = BehaviorSpec::new("field_deposit", "mark", "trail@agents:scent", "trail")
            .with_param("amount", vec![0.5]);
        let b = FieldDeposit::attach(&spec, &mut s.world.attach_context(s.env)).unwrap();
        s.world.act(s.env, &b).unwrap();
        let staged = s.world.staged(s.trail);
        assert_eq!(staged[0], 1.0);
        assert_eq!(staged[3], 1.5);
        assert_eq!(staged.iter().sum::<f32>(), 2.5);
    }

    #[test]
    fn unnamed_deposit_is_unit_and_splat_conserves() {
        let mut s = setup();
        let spec = BehaviorSpec::new("field_deposit", "mark", "trail@agents", "trail")
            .with_param("interpolate", vec![1.0]);
        let b = FieldDeposit::attach(&spec, &mut s.world.attach_context(s.env)).unwrap();
        s.world.act(s.env, &b).unwrap();
        let total: f32 = s.world.staged(s.trail).iter().sum();
        assert!((total - 2.0).abs() < 1e-5);
    }

    #[test]
    fn requires_a_space_binding() {
        let mut s = setup();
        let spec = BehaviorSpec::new("field_deposit", "mark", "trail", "trail");
        assert!(matches!(
            FieldDeposit::attach(&spec, &mut s.world.attach_context(s.env)),
            Err(ConfigError::MissingNeighborGroup { .. })
        ));
    }
}
