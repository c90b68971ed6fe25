//! The [`Behavior`] trait, its declarative [`BehaviorSpec`], and the
//! [`BehaviorCore`] composition helper every library behavior embeds.

use crate::attach::{internal_name, AttachContext, Port};
use crate::context::ActContext;
use indexmap::IndexMap;
use murmur_core::{ConfigError, GridGeometry, ParamRef, PortRole, TickError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a behavior's write combines with what is already staged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Overwrite the staged value unconditionally.
    Replace,
    /// Accumulate into the staged value.
    Add,
    /// Read-modify-write of the agent's own staged value (clamping,
    /// wrapping). Runs after the values it adjusts have been staged.
    Adjust,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace => write!(f, "replace"),
            Self::Add => write!(f, "add"),
            Self::Adjust => write!(f, "adjust"),
        }
    }
}

/// Declarative description of one behavior instance.
///
/// This is what an external loader supplies, and what a behavior keeps so
/// it can be re-attached to a copied agent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BehaviorSpec {
    /// Class tag selecting the constructor, e.g. `"cohesion"`.
    pub class: String,
    /// Instance name, unique within the agent's behavior list.
    pub name: String,
    /// Input wiring tokens.
    #[serde(default)]
    pub input: String,
    /// Output wiring tokens.
    #[serde(default)]
    pub output: String,
    /// Internal-parameter overrides by key.
    #[serde(default)]
    pub params: IndexMap<String, Vec<f32>>,
}

impl BehaviorSpec {
    /// A spec with no overrides.
    pub fn new(
        class: impl Into<String>,
        name: impl Into<String>,
        input: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            name: name.into(),
            input: input.into(),
            output: output.into(),
            params: IndexMap::new(),
        }
    }

    /// Override one internal parameter.
    pub fn with_param(mut self, key: impl Into<String>, values: Vec<f32>) -> Self {
        self.params.insert(key.into(), values);
        self
    }
}

/// Key of the internal parameter gating every behavior.
pub const ACTIVE: &str = "active";

/// Resolved wiring and internal parameters shared by all behaviors.
///
/// Constructors build one with [`attach`](Self::attach), validate their
/// contract with the `expect_*`/`require_*` helpers, and declare their
/// internal parameters with [`declare`](Self::declare).
#[derive(Clone, Debug)]
pub struct BehaviorCore {
    spec: BehaviorSpec,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
    internals: IndexMap<String, ParamRef>,
}

impl BehaviorCore {
    /// Resolve the [`BehaviorSpec`] wiring and create the `active` parameter.
    ///
    /// # Errors
    ///
    /// Any wiring or resolution error.
    pub fn attach(spec: &BehaviorSpec, ctx: &mut AttachContext<'_>) -> Result<Self, ConfigError> {
        let inputs = ctx.resolve_all(&spec.name, &spec.input, PortRole::Input)?;
        let outputs = ctx.resolve_all(&spec.name, &spec.output, PortRole::Output)?;
        let mut core = Self {
            spec: spec.clone(),
            inputs,
            outputs,
            internals: IndexMap::new(),
        };
        core.declare(ctx, ACTIVE, vec![1.0])?;
        Ok(core)
    }

    /// Instance name.
    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Class tag.
    pub fn class(&self) -> &str {
        &self.spec.class
    }

    /// The [`BehaviorSpec`] this behavior was built from.
    pub fn spec(&self) -> &BehaviorSpec {
        &self.spec
    }

    /// Resolved inputs.
    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    /// Resolved outputs.
    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    /// Input `i`. Index validity is established by the arity checks.
    pub fn input(&self, i: usize) -> &Port {
        &self.inputs[i]
    }

    /// Output `i`. Index validity is established by the arity checks.
    pub fn output(&self, i: usize) -> &Port {
        &self.outputs[i]
    }

    /// The `active` gate.
    pub fn active(&self) -> ParamRef {
        // Declared unconditionally in `attach`.
        self.internals[ACTIVE]
    }

    /// Internal parameters by key, in declaration order.
    pub fn internals(&self) -> &IndexMap<String, ParamRef> {
        &self.internals
    }

    /// Declare an internal parameter with a default value.
    ///
    /// An override for `key` in [`BehaviorSpec::params`] replaces the default when present and
    /// must have the same length.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Dimension`] for a wrong-length override.
    pub fn declare(
        &mut self,
        ctx: &mut AttachContext<'_>,
        key: &str,
        default: Vec<f32>,
    ) -> Result<ParamRef, ConfigError> {
        let values = match self.spec.params.get(key) {
            Some(values) if values.len() != default.len() => {
                return Err(ConfigError::Dimension {
                    behavior: self.spec.name.clone(),
                    parameter: internal_name(&self.spec.name, key),
                    expected: default.len(),
                    actual: values.len(),
                });
            }
            Some(values) => values.clone(),
            None => default,
        };
        let param = ctx.internal_param(&self.spec.name, key, values)?;
        self.internals.insert(key.to_string(), param);
        Ok(param)
    }

    /// Check that every override key names a declared internal parameter.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownInternal`] for the first undeclared key.
    pub fn check_overrides(&self) -> Result<(), ConfigError> {
        match self
            .spec
            .params
            .keys()
            .find(|key| !self.internals.contains_key(key.as_str()))
        {
            Some(key) => Err(ConfigError::UnknownInternal {
                behavior: self.spec.name.clone(),
                class: self.spec.class.clone(),
                key: key.clone(),
            }),
            None => Ok(()),
        }
    }

    fn arity(&self, role: PortRole, expected: String, actual: usize) -> ConfigError {
        ConfigError::Arity {
            behavior: self.spec.name.clone(),
            class: self.spec.class.clone(),
            role,
            expected,
            actual,
        }
    }

    /// Require exactly `n` inputs.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Arity`].
    pub fn expect_inputs(&self, n: usize) -> Result<(), ConfigError> {
        if self.inputs.len() != n {
            return Err(self.arity(PortRole::Input, n.to_string(), self.inputs.len()));
        }
        Ok(())
    }

    /// Require exactly `n` outputs.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Arity`].
    pub fn expect_outputs(&self, n: usize) -> Result<(), ConfigError> {
        if self.outputs.len() != n {
            return Err(self.arity(PortRole::Output, n.to_string(), self.outputs.len()));
        }
        Ok(())
    }

    /// Require at least `n` outputs.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Arity`].
    pub fn expect_outputs_at_least(&self, n: usize) -> Result<(), ConfigError> {
        if self.outputs.len() < n {
            return Err(self.arity(
                PortRole::Output,
                format!("at least {n}"),
                self.outputs.len(),
            ));
        }
        Ok(())
    }

    /// Require a vector port of dimension `expected`.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ParameterKind`] or [`ConfigError::Dimension`].
    pub fn require_dim(&self, port: &Port, expected: usize) -> Result<(), ConfigError> {
        self.require_vector(port)?;
        if port.dim() != expected {
            return Err(ConfigError::Dimension {
                behavior: self.spec.name.clone(),
                parameter: port.name.clone(),
                expected,
                actual: port.dim(),
            });
        }
        Ok(())
    }

    /// Require two vector ports of equal dimension.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ParameterKind`] or [`ConfigError::Dimension`] naming `b`.
    pub fn same_dim(&self, a: &Port, b: &Port) -> Result<(), ConfigError> {
        self.require_vector(a)?;
        self.require_dim(b, a.dim())
    }

    /// Require a vector (non-grid) port.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ParameterKind`].
    pub fn require_vector(&self, port: &Port) -> Result<(), ConfigError> {
        if port.shape.is_grid() {
            return Err(ConfigError::ParameterKind {
                behavior: self.spec.name.clone(),
                parameter: port.name.clone(),
                expected: "vector",
            });
        }
        Ok(())
    }

    /// Require a grid port.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ParameterKind`].
    pub fn require_grid<'p>(&self, port: &'p Port) -> Result<&'p GridGeometry, ConfigError> {
        port.shape.grid().ok_or_else(|| ConfigError::ParameterKind {
            behavior: self.spec.name.clone(),
            parameter: port.name.clone(),
            expected: "grid",
        })
    }

    /// Require two grid ports of identical shape and bounds.
    ///
    /// # Errors
    ///
    /// [`ConfigError::ParameterKind`] or [`ConfigError::GridMismatch`].
    pub fn same_grid(&self, a: &Port, b: &Port) -> Result<(), ConfigError> {
        let ga = self.require_grid(a)?;
        let gb = self.require_grid(b)?;
        if !ga.same_shape(gb) {
            return Err(ConfigError::GridMismatch {
                behavior: self.spec.name.clone(),
                first: a.name.clone(),
                second: b.name.clone(),
            });
        }
        Ok(())
    }

    /// Require two ports of the same kind and shape: equal dimension for
    /// vectors, identical geometry for grids.
    ///
    /// # Errors
    ///
    /// As [`same_dim`](Self::same_dim) or [`same_grid`](Self::same_grid).
    pub fn same_shape(&self, a: &Port, b: &Port) -> Result<(), ConfigError> {
        if a.shape.is_grid() {
            self.same_grid(a, b)
        } else {
            self.same_dim(a, b)
        }
    }

    /// Require at least one `@space` binding on a port.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingNeighborGroup`].
    pub fn require_groups(&self, port: &Port) -> Result<(), ConfigError> {
        if port.groups.is_empty() {
            return Err(ConfigError::MissingNeighborGroup {
                behavior: self.spec.name.clone(),
                parameter: port.name.clone(),
            });
        }
        Ok(())
    }

    /// An invalid-value error for an internal parameter.
    pub fn invalid(&self, key: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::InvalidValue {
            behavior: self.spec.name.clone(),
            parameter: internal_name(&self.spec.name, key),
            reason: reason.into(),
        }
    }
}

/// A per-tick unit of computation bound to specific parameters.
///
/// # Contract
///
/// - `act()` reads committed values only and writes only the acting
///   agent's staged values, through [`ActContext`].
/// - All wiring is resolved at construction; `act()` never re-resolves
///   names or re-checks dimensions.
/// - Runtime numeric edge cases (zero-length vectors, no neighbors) are
///   local no-ops, never errors.
///
/// Implementations embed a [`BehaviorCore`]; everything except the write
/// convention, the per-tick logic, and re-attachment is derived from it.
pub trait Behavior: fmt::Debug + Send + 'static {
    /// Shared resolved state.
    fn core(&self) -> &BehaviorCore;

    /// Write convention applied to every output.
    fn write_mode(&self) -> WriteMode;

    /// Execute for one tick.
    ///
    /// # Errors
    ///
    /// Only [`TickError`]s from dereferencing stale handles.
    fn act(&self, ctx: &mut ActContext<'_>) -> Result<(), TickError>;

    /// Re-attach this behavior's spec to another agent.
    ///
    /// # Errors
    ///
    /// Any error the constructor would raise for that agent.
    fn clone_onto(&self, ctx: &mut AttachContext<'_>) -> Result<Box<dyn Behavior>, ConfigError>;

    /// Instance name.
    fn name(&self) -> &str {
        self.core().name()
    }

    /// Class tag.
    fn class(&self) -> &str {
        self.core().class()
    }

    /// The [`BehaviorSpec`] this behavior was built from.
    fn spec(&self) -> &BehaviorSpec {
        self.core().spec()
    }

    /// Resolved inputs.
    fn inputs(&self) -> &[Port] {
        self.core().inputs()
    }

    /// Resolved outputs.
    fn outputs(&self) -> &[Port] {
        self.core().outputs()
    }

    /// The `active` gate; the behavior is skipped when its value is `<= 0`.
    fn active(&self) -> ParamRef {
        self.core().active()
    }

    /// Outputs with their write convention.
    fn writes(&self) -> Vec<(ParamRef, WriteMode)> {
        let mode = self.write_mode();
        self.outputs().iter().map(|p| (p.param, mode)).collect()
    }

    /// Internal parameters by key.
    fn internal_parameters(&self) -> &IndexMap<String, ParamRef> {
        self.core().internals()
    }

    /// Whether `param` is wired as an input or output.
    fn references(&self, param: ParamRef) -> bool {
        self.inputs()
            .iter()
            .chain(self.outputs())
            .any(|p| p.param == param)
    }
}

/// Builds behaviors from specs.
pub trait BehaviorFactory {
    /// Construct and attach the behavior `spec` describes.
    ///
    /// Parameters created before a failure are rolled back by the caller
    /// through [`AttachContext::rollback`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownClass`] or any constructor error.
    fn create(
        &self,
        spec: &BehaviorSpec,
        ctx: &mut AttachContext<'_>,
    ) -> Result<Box<dyn Behavior>, ConfigError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::{AgentId, ArenaKey, Parameter, ParameterList, RawId};

    fn agent() -> AgentId {
        AgentId::from_raw(RawId {
            index: 0,
            generation: 0,
        })
    }

    fn list() -> ParameterList {
        let mut list = ParameterList::new();
        list.add(Parameter::new("position", vec![0.0, 0.0])).unwrap();
        list.add(Parameter::new("velocity", vec![0.0, 0.0, 0.0])).unwrap();
        list
    }

    #[test]
    fn attach_creates_active_gate() {
        let mut params = list();
        let mut ctx = AttachContext::new(agent(), "boid", &mut params, None);
        let spec = BehaviorSpec::new("copy", "c", "position", "velocity");
        let core = BehaviorCore::attach(&spec, &mut ctx).unwrap();
        assert_eq!(ctx.value(core.active()), Some(&[1.0][..]));
        assert!(params.contains("c_active"));
    }

    #[test]
    fn declare_applies_override_and_checks_length() {
        let mut params = list();
        let mut ctx = AttachContext::new(agent(), "boid", &mut params, None);
        let spec = BehaviorSpec::new("scale", "s", "", "position").with_param("factor", vec![2.0]);
        let mut core = BehaviorCore::attach(&spec, &mut ctx).unwrap();
        let factor = core.declare(&mut ctx, "factor", vec![1.0]).unwrap();
        assert_eq!(ctx.value(factor), Some(&[2.0][..]));
        assert!(core.check_overrides().is_ok());

        let bad = BehaviorSpec::new("scale", "t", "", "position").with_param("factor", vec![1.0, 2.0]);
        let mut core = BehaviorCore::attach(&bad, &mut ctx).unwrap();
        assert!(matches!(
            core.declare(&mut ctx, "factor", vec![1.0]),
            Err(ConfigError::Dimension { expected: 1, actual: 2, .. })
        ));
    }

    #[test]
    fn undeclared_override_is_reported() {
        let mut params = list();
        let mut ctx = AttachContext::new(agent(), "boid", &mut params, None);
        let spec = BehaviorSpec::new("scale", "s", "", "position").with_param("factr", vec![2.0]);
        let core = BehaviorCore::attach(&spec, &mut ctx).unwrap();
        assert_eq!(
            core.check_overrides(),
            Err(ConfigError::UnknownInternal {
                behavior: "s".into(),
                class: "scale".into(),
                key: "factr".into(),
            })
        );
    }

    #[test]
    fn dimension_helpers_name_the_offender() {
        let mut params = list();
        let mut ctx = AttachContext::new(agent(), "boid", &mut params, None);
        let spec = BehaviorSpec::new("copy", "c", "position", "velocity");
        let core = BehaviorCore::attach(&spec, &mut ctx).unwrap();
        assert!(core.expect_inputs(1).is_ok());
        assert!(matches!(
            core.expect_outputs(2),
            Err(ConfigError::Arity { role: PortRole::Output, actual: 1, .. })
        ));
        assert_eq!(
            core.same_dim(core.input(0), core.output(0)),
            Err(ConfigError::Dimension {
                behavior: "c".into(),
                parameter: "velocity".into(),
                expected: 2,
                actual: 3,
            })
        );
        assert!(matches!(
            core.require_grid(core.input(0)),
            Err(ConfigError::ParameterKind { expected: "grid", .. })
        ));
        assert!(matches!(
            core.require_groups(core.input(0)),
            Err(ConfigError::MissingNeighborGroup { .. })
        ));
    }

    #[test]
    fn spec_deserializes_with_defaults() {
        let spec: BehaviorSpec = serde_json::from_str(
            r#"{ "class": "damping", "name": "drag", "input": "velocity",
                 "output": "acceleration", "params": { "amount": [0.3] } }"#,
        )
        .unwrap();
        assert_eq!(spec.params["amount"], vec![0.3]);
        let bare: BehaviorSpec =
            serde_json::from_str(r#"{ "class": "reset", "name": "r" }"#).unwrap();
        assert!(bare.input.is_empty() && bare.params.is_empty());
    }
}
