//! Seeded additive noise.
//!
//! Adds `amount * U(-1, 1)` to every component of the output (every cell of
//! a grid), or `amount * N(0, 1)` when `gaussian > 0` (Box-Muller).
//!
//! The generator is a ChaCha8 stream seeded per tick, per agent, and per
//! behavior name (see [`ActContext::stream_seed`]), so the noise an agent
//! receives does not depend on the order agents act in, and a rerun with
//! the same simulation seed reproduces it bit for bit.

use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::{ConfigError, ParamRef, TickError};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// FNV-1a over the behavior name, used to decorrelate streams of
/// behaviors acting on the same agent.
fn name_salt(name: &str) -> u64 {
    name.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01b3)
    })
}

fn box_muller(rng: &mut ChaCha8Rng) -> f32 {
    let u1 = rng.random::<f64>().max(1e-300);
    let u2 = rng.random::<f64>();
    ((-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()) as f32
}

/// Adds deterministic noise to its output.
#[derive(Debug)]
pub struct Randomize {
    core: BehaviorCore,
    amount: ParamRef,
    gaussian: ParamRef,
    salt: u64,
}

impl Attach for Randomize {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = BehaviorCore::attach(spec, ctx)?;
        core.expect_inputs(0)?;
        core.expect_outputs(1)?;
        let amount = core.declare(ctx, "amount", vec![1.0])?;
        let gaussian = core.declare(ctx, "gaussian", vec![0.0])?;
        Ok(Self {
            salt: name_salt(&spec.name),
            core,
            amount,
            gaussian,
        })
    }
}

impl Behavior for Randomize {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let amount = ctx.scalar(self.amount)?;
        let gaussian = ctx.scalar(self.gaussian)? > 0.0;
        let mut rng = ChaCha8Rng::seed_from_u64(ctx.stream_seed(self.salt));
        for v in ctx.staged(self.core.output(0).param)? {
            let noise = if gaussian {
                box_muller(&mut rng)
            } else {
                rng.random_range(-1.0f32..1.0)
            };
            *v += amount * noise;
        }
        Ok(())
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}
