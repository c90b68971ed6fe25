//! Two-species reaction kinetics on co-shaped scalar grids.
//!
//! Both classes take two inputs and two outputs (`"u v"` / `"u v"`, or the
//! activator/inhibitor pair), all scalar grids of identical geometry. They
//! accumulate `rate * dt * reaction(u, v)` into the outputs and leave
//! transport to separate [`Diffusion`](crate::diffusion::Diffusion)
//! behaviors.
//!
//! | class | reaction |
//! |-------|----------|
//! | `gray_scott` | `du = -u v² + feed (1 - u)`, `dv = u v² - (feed + kill) v`, inputs clamped to `[0, 1]` |
//! | `gierer_meinhardt` | `da = rho a² / h - muA a + rhoA`, `dh = rho a² - muH h + rhoH`, inputs clamped non-negative, `h` floored at a small epsilon |

use crate::rate::declare_rates;
use crate::registry::Attach;
use murmur_behavior::{ActContext, AttachContext, Behavior, BehaviorCore, BehaviorSpec, WriteMode};
use murmur_core::{ConfigError, ParamRef, TickError};

/// Smallest inhibitor concentration divided by.
const INHIBITOR_FLOOR: f32 = 1e-6;

fn attach_species(
    spec: &BehaviorSpec,
    ctx: &mut AttachContext<'_>,
) -> Result<BehaviorCore, ConfigError> {
    let core = BehaviorCore::attach(spec, ctx)?;
    core.expect_inputs(2)?;
    core.expect_outputs(2)?;
    let first = core.input(0);
    core.require_grid(first)?;
    if first.dim() != 1 {
        return Err(ConfigError::Dimension {
            behavior: spec.name.clone(),
            parameter: first.name.clone(),
            expected: 1,
            actual: first.dim(),
        });
    }
    core.same_grid(first, core.input(1))?;
    core.same_grid(first, core.output(0))?;
    core.same_grid(first, core.output(1))?;
    Ok(core)
}

/// Run `reaction` over every cell, accumulating into the two outputs.
fn react<F>(
    core: &BehaviorCore,
    ctx: &mut ActContext<'_>,
    scale: f32,
    reaction: F,
) -> Result<(), TickError>
where
    F: Fn(f32, f32) -> (f32, f32),
{
    let u = ctx.current(core.input(0).param)?;
    let v = ctx.current(core.input(1).param)?;
    let mut du = vec![0.0; u.len()];
    let mut dv = vec![0.0; v.len()];
    for (i, (a, b)) in u.iter().zip(v).enumerate() {
        let (da, db) = reaction(*a, *b);
        du[i] = scale * da;
        dv[i] = scale * db;
    }
    for (o, d) in ctx.staged(core.output(0).param)?.iter_mut().zip(&du) {
        *o += d;
    }
    for (o, d) in ctx.staged(core.output(1).param)?.iter_mut().zip(&dv) {
        *o += d;
    }
    Ok(())
}

/// Gray–Scott kinetics.
#[derive(Debug)]
pub struct GrayScott {
    core: BehaviorCore,
    feed: ParamRef,
    kill: ParamRef,
    rate: ParamRef,
}

impl Attach for GrayScott {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = attach_species(spec, ctx)?;
        let feed = declare_rates(&mut core, ctx, "feed", vec![0.055])?;
        let kill = declare_rates(&mut core, ctx, "kill", vec![0.062])?;
        let rate = declare_rates(&mut core, ctx, "rate", vec![1.0])?;
        Ok(Self {
            core,
            feed,
            kill,
            rate,
        })
    }
}

impl Behavior for GrayScott {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let feed = ctx.scalar(self.feed)?;
        let kill = ctx.scalar(self.kill)?;
        let scale = ctx.scalar(self.rate)? * ctx.dt();
        react(&self.core, ctx, scale, |u, v| {
            let u = u.clamp(0.0, 1.0);
            let v = v.clamp(0.0, 1.0);
            let uvv = u * v * v;
            (-uvv + feed * (1.0 - u), uvv - (feed + kill) * v)
        })
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}

/// Gierer–Meinhardt activator–inhibitor kinetics.
#[derive(Debug)]
pub struct GiererMeinhardt {
    core: BehaviorCore,
    rho: ParamRef,
    mu_a: ParamRef,
    mu_h: ParamRef,
    rho_a: ParamRef,
    rho_h: ParamRef,
    rate: ParamRef,
}

impl Attach for GiererMeinhardt {
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let mut core = attach_species(spec, ctx)?;
        let rho = declare_rates(&mut core, ctx, "rho", vec![1.0])?;
        let mu_a = declare_rates(&mut core, ctx, "muA", vec![1.0])?;
        let mu_h = declare_rates(&mut core, ctx, "muH", vec![2.0])?;
        let rho_a = declare_rates(&mut core, ctx, "rhoA", vec![0.01])?;
        let rho_h = declare_rates(&mut core, ctx, "rhoH", vec![0.0])?;
        let rate = declare_rates(&mut core, ctx, "rate", vec![1.0])?;
        Ok(Self {
            core,
            rho,
            mu_a,
            mu_h,
            rho_a,
            rho_h,
            rate,
        })
    }
}

impl Behavior for GiererMeinhardt {
    fn core(&self) -> &BehaviorCore {
        &self.core
    }

    fn write_mode(&self) -> WriteMode {
        WriteMode::Add
    }

    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError> {
        let rho = ctx.scalar(self.rho)?;
        let mu_a = ctx.scalar(self.mu_a)?;
        let mu_h = ctx.scalar(self.mu_h)?;
        let rho_a = ctx.scalar(self.rho_a)?;
        let rho_h = ctx.scalar(self.rho_h)?;
        let scale = ctx.scalar(self.rate)? * ctx.dt();
        react(&self.core, ctx, scale, |a, h| {
            let a = a.max(0.0);
            let h = h.max(0.0);
            let a2 = rho * a * a;
            (a2 / h.max(INHIBITOR_FLOOR) - mu_a * a + rho_a, a2 - mu_h * h + rho_h)
        })
    }

    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError> {
        Ok(Box::new(Self::attach(self.spec(), ctx)?))
    }
}
