//! Class-tag registry.
//!
//! [`BehaviorRegistry`] maps the class tags used in [`BehaviorSpec`]s to
//! constructors. [`BehaviorRegistry::standard`] knows every behavior in this
//! crate; applications can [`register`](BehaviorRegistry::register) their
//! own on top.

use crate::{
    boundary, clamp, copy, damping, decay, deposit, diffusion, field_sampling, flocking,
    integration, orbit, randomize, reaction, reset,
};
use indexmap::IndexMap;
use murmur_behavior::{AttachContext, Behavior, BehaviorFactory, BehaviorSpec};
use murmur_core::ConfigError;

/// A behavior that can be built from a spec.
pub trait Attach: Behavior + Sized {
    /// Resolve `spec` against the agent `ctx` is scoped to, validate the
    /// class contract, and declare internal parameters.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] raised by resolution or validation. Parameters
    /// already created are left for the caller to roll back.
    fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError>;
}

/// Type-erased constructor.
pub type Constructor =
    fn(&BehaviorSpec, &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError>;

fn construct<B: Attach>(
    spec: &BehaviorSpec,
    ctx: &mut AttachContext<'_>,
) -> Result<Box<dyn Behavior>, ConfigError> {
    Ok(Box::new(B::attach(spec, ctx)?))
}

/// Constructors by class tag.
#[derive(Clone, Debug, Default)]
pub struct BehaviorRegistry {
    ctors: IndexMap<String, Constructor>,
}

impl BehaviorRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every behavior class in this crate.
    pub fn standard() -> Self {
        let mut r = Self::new();
        r.add::<flocking::Cohesion>("cohesion");
        r.add::<flocking::Alignment>("alignment");
        r.add::<flocking::Evasion>("evasion");
        r.add::<orbit::Orbit>("circular");
        r.add::<orbit::Orbit>("spiral");
        r.add::<field_sampling::FieldSample>("field_sample");
        r.add::<field_sampling::FieldGradient>("field_gradient");
        r.add::<damping::Damping>("damping");
        r.add::<boundary::BoundaryRepulsion>("boundary_repulsion");
        r.add::<boundary::BoundaryWrap>("boundary_wrap");
        r.add::<reset::Reset>("reset");
        r.add::<copy::IdentityCopy>("copy");
        r.add::<copy::Scale>("scale");
        r.add::<integration::EulerIntegration>("euler_integration");
        r.add::<randomize::Randomize>("randomize");
        r.add::<clamp::Clamp>("clamp");
        r.add::<diffusion::Diffusion>("diffusion");
        r.add::<decay::Decay>("decay");
        r.add::<reaction::GrayScott>("gray_scott");
        r.add::<reaction::GiererMeinhardt>("gierer_meinhardt");
        r.add::<deposit::FieldDeposit>("field_deposit");
        r
    }

    /// Register a constructor under `class`, replacing any previous one.
    pub fn register(&mut self, class: impl Into<String>, ctor: Constructor) -> &mut Self {
        self.ctors.insert(class.into(), ctor);
        self
    }

    /// Register an [`Attach`] type under `class`.
    pub fn add<B: Attach>(&mut self, class: impl Into<String>) -> &mut Self {
        self.register(class, construct::<B>)
    }

    /// Whether `class` is known.
    pub fn contains(&self, class: &str) -> bool {
        self.ctors.contains_key(class)
    }

    /// Known class tags in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.ctors.keys().map(String::as_str)
    }
}

impl BehaviorFactory for BehaviorRegistry {
    fn create(
        &self,
        spec: &BehaviorSpec,
        ctx: &mut AttachContext<'_>,
    ) -> Result<Box<dyn Behavior>, ConfigError> {
        let ctor = self
            .ctors
            .get(spec.class.as_str())
            .ok_or_else(|| ConfigError::UnknownClass {
                class: spec.class.clone(),
            })?;
        let behavior = ctor(spec, ctx)?;
        behavior.core().check_overrides()?;
        Ok(behavior)
    }
}
