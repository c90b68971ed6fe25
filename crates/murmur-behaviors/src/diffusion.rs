//! Explicit grid diffusion.
//!
//! Each tick, for every cell `i` and value component `c`:
//!
//! ```text
//! out[i][c] += rate[c] * dt * sum(in[j][c] - in[i][c] for j in N(i))
//! ```
//!
//! where `N(i)` is the von Neumann neighbourhood without wrap (zero-flux
//! boundary). On a 2D grid that is the five-point stencil: 4 neighbours in
//! the interior, 3 on an edge, 2 in a corner. The Laplacian is in cell
//! units. Explicit integration is stable for `rate * dt <= 1 / (2 * ndim)`.

use crate::rate::declare_rates;
use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::{ConfigError, GridGeometry, ParamRef, TickError};
use murmur_space::von_neumann;

/// Diffuse one grid into another of the same shape (commonly itself).
#[derive(Debug)]
pub struct Diffusion {
    core: BehaviorCore,
    geometry: GridGeometry,
    rate: ParamRef,
}

impl Attach for Diffusion {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = BehaviorCore::attach(spec, ctx)?;
        core.expect_inputs(1)?;
        core.expect_outputs(1)?;
        core.same_grid(core.input(0), core.output(0))?;
        let geometry = core.require_grid(core.input(0))?.clone();
        let rate = declare_rates(&mut core, ctx, "rate", vec![0.1; geometry.value_dim()])?;
        Ok(Self {
            core,
            geometry,
            rate,
        })
    }
}

impl Behavior for Diffusion {
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
        let out = ctx.staged(self.core.output(0).param)?;
        let d = self.geometry.value_dim();
        for i in 0..self.geometry.cell_count() {
            let neighbours = von_neumann(&self.geometry, i);
            for (c, r) in rate.iter().enumerate() {
                let centre = input[i * d + c];
                let laplacian: f32 = neighbours.iter().map(|&j| input[j * d + c] - centre).sum();
                out[i * d + c] += r * dt * laplacian;
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

    fn env(nx: usize, ny: usize, rate: f32) -> (MockWorld, murmur_core::AgentId, ParamRef, Diffusion) {
        let mut w = MockWorld::new();
        let a = w.add_agent("env");
        let geometry =
            GridGeometry::new(1, &[nx, ny], &[0.0, 0.0], &[nx as f32, ny as f32]).unwrap();
        let heat = w.add_param(a, Parameter::grid("heat", geometry, &[0.0]).unwrap());
        let spec = BehaviorSpec::new("diffusion", "spread", "heat", "heat")
            .with_param("rate", vec![rate]);
        let b = Diffusion::attach(&spec, &mut w.attach_context(a)).unwrap();
        (w, a, heat, b)
    }

    /// Change at a unit spike in `cell` with rate 1 and dt 1: minus the
    /// number of neighbours the stencil used.
    fn spike_delta(cell: usize) -> f32 {
        let (mut w, a, heat, b) = env(3, 3, 1.0);
        let mut values = vec![0.0; 9];
        values[cell] = 1.0;
        w.set(heat, &values);
        w.act(a, &b).unwrap();
        w.staged(heat)[cell] - 1.0
    }

    #[test]
    fn three_by_three_stencil_sizes() {
        for corner in [0, 2, 6, 8] {
            assert_eq!(spike_delta(corner), -2.0, "corner {corner}");
        }
        for edge in [1, 3, 5, 7] {
            assert_eq!(spike_delta(edge), -3.0, "edge {edge}");
        }
        assert_eq!(spike_delta(4), -4.0);
    }

    #[test]
    fn conserves_mass_and_spreads() {
        let (mut w, a, heat, b) = env(5, 5, 0.2);
        let mut values = vec![0.0; 25];
        values[12] = 10.0;
        w.set(heat, &values);
        w.act(a, &b).unwrap();
        let staged = w.staged(heat);
        let total: f32 = staged.iter().sum();
        assert!((total - 10.0).abs() < 1e-4);
        assert!((staged[12] - 2.0).abs() < 1e-5);
        for n in [7, 11, 13, 17] {
            assert!((staged[n] - 2.0).abs() < 1e-5);
        }
        assert_eq!(staged[0], 0.0);
    }

    #[test]
    fn uniform_field_is_stationary() {
        let (mut w, a, heat, b) = env(4, 3, 0.25);
        w.set(heat, &[3.0; 12]);
        w.act(a, &b).unwrap();
        assert_eq!(w.staged(heat), &[3.0; 12]);
    }

    #[test]
    fn rejects_vector_and_negative_rate() {
        let mut w = MockWorld::new();
        let a = w.add_agent("env");
        w.add_param(a, Parameter::new("heat", vec![0.0]));
        let spec = BehaviorSpec::new("diffusion", "d1", "heat", "heat");
        assert!(matches!(
            Diffusion::attach(&spec, &mut w.attach_context(a)),
            Err(ConfigError::ParameterKind { .. })
        ));

        let (mut w, a, _, _) = env(2, 2, 0.1);
        let spec = BehaviorSpec::new("diffusion", "d2", "heat", "heat")
            .with_param("rate", vec![-1.0]);
        assert!(matches!(
            Diffusion::attach(&spec, &mut w.attach_context(a)),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
