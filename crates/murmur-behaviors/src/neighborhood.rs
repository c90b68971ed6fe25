//! The shared neighbor-driven template.
//!
//! Every neighbor-driven behavior walks the frozen neighbor lists of one
//! port's groups, filters them through a `[minDist, maxDist]` band,
//! computes a per-neighbor contribution, and averages the contributions of
//! the admitted neighbors. Only the contribution differs between
//! behaviors. No admitted neighbor means no contribution at all.
//!
//! Steering behaviors go through [`agent_mean`], which ignores grid
//! fields registered in the same space; field behaviors use
//! [`neighbor_mean`] to reach exactly those fields.

use murmur_behavior::{ActContext, AttachContext, BehaviorCore, Port};
use murmur_core::{ConfigError, NeighborRelation, ParamRef, TickError};
use smallvec::SmallVec;

/// Inline vector storage for per-neighbor scratch values.
pub type Scratch = SmallVec<[f32; 4]>;

/// A distance band. A non-positive bound is unbounded on that side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Band {
    /// Minimum admitted distance.
    pub min: f32,
    /// Maximum admitted distance.
    pub max: f32,
}

impl Band {
    /// Admit every distance.
    pub const UNBOUNDED: Self = Self { min: 0.0, max: 0.0 };

    /// Whether a neighbor at `distance` is admitted.
    pub fn admits(&self, distance: f32) -> bool {
        (self.min <= 0.0 || distance >= self.min) && (self.max <= 0.0 || distance <= self.max)
    }
}

/// The `minDist`/`maxDist` internal parameters of a neighbor behavior.
#[derive(Clone, Copy, Debug)]
pub struct BandParams {
    min: ParamRef,
    max: ParamRef,
}

impl BandParams {
    /// Declare `minDist` and `maxDist` (both unbounded by default).
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidValue`] if both bounds are set and `min > max`.
    pub fn declare(core: &mut BehaviorCore, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let min = core.declare(ctx, "minDist", vec![0.0])?;
        let max = core.declare(ctx, "maxDist", vec![0.0])?;
        let lo = ctx.value(min).and_then(|v| v.first().copied()).unwrap_or(0.0);
        let hi = ctx.value(max).and_then(|v| v.first().copied()).unwrap_or(0.0);
        if lo > 0.0 && hi > 0.0 && lo > hi {
            return Err(core.invalid("minDist", format!("minDist {lo} exceeds maxDist {hi}")));
        }
        Ok(Self { min, max })
    }

    /// The band's committed bounds.
    ///
    /// # Errors
    ///
    /// [`TickError::StaleParameter`].
    pub fn read(&self, ctx: &ActContext<'_>) -> Result<Band, TickError> {
        Ok(Band {
            min: ctx.scalar(self.min)?,
            max: ctx.scalar(self.max)?,
        })
    }
}

/// Average per-neighbor contributions over every group of `port`.
///
/// `contribution` fills a zeroed `dim`-length slice for one admitted
/// neighbor and returns whether it should be counted; it receives the
/// group's neighbor parameter name, if the wiring named one. Returns
/// `None` when no neighbor was counted.
///
/// # Errors
///
/// The first error `contribution` returns.
pub fn neighbor_mean<F>(
    ctx: &ActContext<'_>,
    port: &Port,
    band: Band,
    dim: usize,
    mut contribution: F,
) -> Result<Option<Scratch>, TickError>
where
    F: FnMut(&NeighborRelation, Option<&str>, &mut [f32]) -> Result<bool, TickError>,
{
    let mut sum: Scratch = SmallVec::from_elem(0.0, dim);
    let mut scratch: Scratch = SmallVec::from_elem(0.0, dim);
    let mut count = 0usize;
    for group in &port.groups {
        for relation in ctx.neighbors(group.handle) {
            if !band.admits(relation.distance) {
                continue;
            }
            scratch.iter_mut().for_each(|v| *v = 0.0);
            if contribution(relation, group.neighbor_param.as_deref(), &mut scratch)? {
                murmur_core::math::add_scaled(&mut sum, &scratch, 1.0);
                count += 1;
            }
        }
    }
    if count == 0 {
        return Ok(None);
    }
    let inv = 1.0 / count as f32;
    sum.iter_mut().for_each(|v| *v *= inv);
    Ok(Some(sum))
}

/// [`neighbor_mean`] over neighboring agents only: registrations of grid
/// parameters are never counted.
///
/// # Errors
///
/// [`TickError::StaleParameter`] for a removed neighbor, or the first
/// error `contribution` returns.
pub fn agent_mean<F>(
    ctx: &ActContext<'_>,
    port: &Port,
    band: Band,
    dim: usize,
    mut contribution: F,
) -> Result<Option<Scratch>, TickError>
where
    F: FnMut(&NeighborRelation, Option<&str>, &mut [f32]) -> Result<bool, TickError>,
{
    neighbor_mean(ctx, port, band, dim, |rel, name, out| {
        if ctx.shape(rel.neighbor)?.is_grid() {
            return Ok(false);
        }
        contribution(rel, name, out)
    })
}

/// Copy a neighbor's direction into `out`. Always counted.
pub fn direction(relation: &NeighborRelation, out: &mut [f32]) -> bool {
    for (o, d) in out.iter_mut().zip(&relation.direction) {
        *o = *d;
    }
    true
}
