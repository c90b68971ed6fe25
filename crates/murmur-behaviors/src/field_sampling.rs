//! Agents reading environment grids: field sampling and chemotaxis.
//!
//! An environment registers one of its grid parameters in a space at the
//! grid's center; an agent whose position is registered in the same space
//! finds the environment among its neighbors. The wiring
//! `position@fields:concentration` names the grid to read on each neighbor;
//! without a `:name` the registered grid itself is read.
//!
//! Both behaviors follow the neighbor template: each neighbor whose field
//! covers the agent's position contributes a value, contributions are
//! averaged, scaled by `amount`, and added to the output. Neighbors without
//! a suitable grid, or whose grid does not contain the position, are not
//! counted.

use crate::neighborhood::{neighbor_mean, BandParams};
use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::math::add_scaled;
use murmur_core::{ConfigError, GridGeometry, NeighborRelation, ParamRef, TickError};
use murmur_space::field::{self, Placement};

/// The grid a neighbor exposes under `name` (or the registered grid).
fn neighbor_grid<'a>(
    ctx: &ActContext<'a>,
    relation: &NeighborRelation,
    name: Option<&str>,
) -> Result<Option<(&'a GridGeometry, &'a [f32])>, TickError> {
    let param = match name {
        Some(name) => match ctx.neighbor_param(relation, name) {
            Some(param) => param,
            None => return Ok(None),
        },
        None => relation.neighbor,
    };
    let Some(geometry) = ctx.shape(param)?.grid() else {
        return Ok(None);
    };
    Ok(Some((geometry, ctx.current(param)?)))
}

fn attach_sampler(
    spec: &BehaviorSpec,
    ctx: &mut AttachContext<'_>,
) -> Result<(BehaviorCore, ParamRef, BandParams), ConfigError> {
    let mut core = BehaviorCore::attach(spec, ctx)?;
    core.expect_inputs(1)?;
    core.expect_outputs(1)?;
    core.require_vector(core.input(0))?;
    core.require_groups(core.input(0))?;
    core.require_vector(core.output(0))?;
    let amount = core.declare(ctx, "amount", vec![1.0])?;
    let band = BandParams::declare(&mut core, ctx)?;
    Ok((core, amount, band))
}

/// Add the mean field value at the agent's position.
///
/// The output's dimension must equal the sampled grid's value dimension;
/// fields of another value dimension are skipped. `interpolate > 0`
/// samples multilinearly instead of reading the containing cell.
#[derive(Debug)]
pub struct FieldSample {
    core: BehaviorCore,
    amount: ParamRef,
    band: BandParams,
    interpolate: ParamRef,
}

impl Attach for FieldSample {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let (mut core, amount, band) = attach_sampler(spec, ctx)?;
        let interpolate = core.declare(ctx, "interpolate", vec![0.0])?;
        Ok(Self {
            core,
            amount,
            band,
            interpolate,
        })
    }
}

impl Behavior for FieldSample {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let band = self.band.read(ctx)?;
        let amount = ctx.scalar(self.amount)?;
        let placement = if ctx.scalar(self.interpolate)? > 0.0 {
            Placement::Linear
        } else {
            Placement::Nearest
        };
        let port = self.core.input(0);
        let position = ctx.current(port.param)?;
        let dim = self.core.output(0).dim();
        let mean = neighbor_mean(ctx, port, band, dim, |rel, name, out| {
            match neighbor_grid(ctx, rel, name)? {
                Some((geometry, data)) if geometry.value_dim() == dim => {
                    Ok(field::sample(geometry, data, position, placement, out))
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

/// Add the mean field gradient at the agent's position (chemotaxis).
///
/// The gradient is taken of value component `component` and has one entry
/// per spatial axis, so the output must match the position's dimension.
/// A negative `amount` descends the gradient.
#[derive(Debug)]
pub struct FieldGradient {
    core: BehaviorCore,
    amount: ParamRef,
    band: BandParams,
    component: ParamRef,
}

impl Attach for FieldGradient {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let (mut core, amount, band) = attach_sampler(spec, ctx)?;
        core.same_dim(core.input(0), core.output(0))?;
        let component = core.declare(ctx, "component", vec![0.0])?;
        if ctx.value(component).and_then(|v| v.first().copied()).unwrap_or(0.0) < 0.0 {
            return Err(core.invalid("component", "must be a non-negative index"));
        }
        Ok(Self {
            core,
            amount,
            band,
            component,
        })
    }
}

impl Behavior for FieldGradient {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let band = self.band.read(ctx)?;
        let amount = ctx.scalar(self.amount)?;
        let component = ctx.scalar(self.component)?.max(0.0) as usize;
        let port = self.core.input(0);
        let position = ctx.current(port.param)?;
        let mean = neighbor_mean(ctx, port, band, port.dim(), |rel, name, out| {
            match neighbor_grid(ctx, rel, name)? {
                Some((geometry, data))
                    if geometry.ndim() == out.len() && component < geometry.value_dim() =>
                {
                    Ok(field::gradient(geometry, data, position, component, out))
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

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::Parameter;
    use murmur_test_utils::MockWorld;

    struct Dish {
        world: MockWorld,
        agent: murmur_core::AgentId,
        pos: ParamRef,
        out: ParamRef,
        grad: ParamRef,
    }

    /// An agent at `at` seeing one environment whose 4x1 `food` grid over
    /// `[0, 4] x [0, 1]` holds `0, 1, 2, 3`.
    fn dish(at: [f32; 2]) -> Dish {
        let mut world = MockWorld::new();
        let env = world.add_agent("env");
        let geometry = GridGeometry::new(1, &[4, 1], &[0.0, 0.0], &[4.0, 1.0]).unwrap();
        let marker = world.add_param(env, Parameter::grid("marker", geometry.clone(), &[0.0]).unwrap());
        let food = world.add_param(env, Parameter::grid("food", geometry, &[0.0]).unwrap());
        world.set(food, &[0.0, 1.0, 2.0, 3.0]);

        let agent = world.add_agent("ant");
        let pos = world.add_param(agent, Parameter::new("position", at.to_vec()));
        let out = world.add_param(agent, Parameter::new("smell", vec![0.0]));
        let grad = world.add_param(agent, Parameter::new("steer", vec![0.0, 0.0]));
        let group = world.register(pos, "fields");
        world.set_neighbors(group, vec![MockWorld::relation(marker, 1.0, &[1.0, 0.0])]);
        Dish {
            world,
            agent,
            pos,
            out,
            grad,
        }
    }

    #[test]
    fn samples_named_field_on_neighbor() {
        let mut d = dish([2.5, 0.5]);
        let spec = BehaviorSpec::new("field_sample", "smell", "position@fields:food", "smell");
        let b = FieldSample::attach(&spec, &mut d.world.attach_context(d.agent)).unwrap();
        d.world.act(d.agent, &b).unwrap();
        assert_eq!(d.world.staged(d.out), &[2.0]);
    }

    #[test]
    fn interpolated_sample() {
        let mut d = dish([2.0, 0.5]);
        let spec = BehaviorSpec::new("field_sample", "smell", "position@fields:food", "smell")
            .with_param("interpolate", vec![1.0]);
        let b = FieldSample::attach(&spec, &mut d.world.attach_context(d.agent)).unwrap();
        d.world.act(d.agent, &b).unwrap();
        assert!((d.world.staged(d.out)[0] - 1.5).abs() < 1e-6);
    }

    #[test]
    fn outside_grid_contributes_nothing() {
        let mut d = dish([9.0, 0.5]);
        let spec = BehaviorSpec::new("field_sample", "smell", "position@fields:food", "smell");
        let b = FieldSample::attach(&spec, &mut d.world.attach_context(d.agent)).unwrap();
        d.world.act(d.agent, &b).unwrap();
        assert_eq!(d.world.staged(d.out), &[0.0]);
    }

    #[test]
    fn gradient_climbs_the_field() {
        let mut d = dish([1.5, 0.5]);
        let spec = BehaviorSpec::new("field_gradient", "taxis", "position@fields:food", "steer")
            .with_param("amount", vec![2.0]);
        let b = FieldGradient::attach(&spec, &mut d.world.attach_context(d.agent)).unwrap();
        d.world.act(d.agent, &b).unwrap();
        assert_eq!(d.world.staged(d.grad), &[2.0, 0.0]);
        assert_eq!(d.world.value(d.pos), &[1.5, 0.5]);
    }

    #[test]
    fn missing_field_is_skipped() {
        let mut d = dish([1.5, 0.5]);
        let spec = BehaviorSpec::new("field_gradient", "taxis", "position@fields:water", "steer");
        let b = FieldGradient::attach(&spec, &mut d.world.attach_context(d.agent)).unwrap();
        d.world.act(d.agent, &b).unwrap();
        assert_eq!(d.world.staged(d.grad), &[0.0, 0.0]);
    }
}
