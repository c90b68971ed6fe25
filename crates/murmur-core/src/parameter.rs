//! Double-buffered parameters and the per-entity [`ParameterList`].
//!
//! Every parameter holds two equally sized buffers:
//!
//! - **current**: the committed value. Behaviors read it during the
//!   act-phase; nothing writes it until flush.
//! - **backup**: the staging buffer. The only write target during the
//!   act-phase.
//!
//! [`ParameterList::flush`] commits backup into current. Between an
//! act-phase's start and the flush that follows it, a reader of `current`
//! never observes a staged write.

use crate::arena::Arena;
use crate::error::{ConfigError, LookupError};
use crate::grid::GridGeometry;
use crate::id::{GroupHandle, ParamId};
use crate::traits::NeighborQuery;
use indexmap::IndexMap;

/// Shape of a parameter's value.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamShape {
    /// A single vector of `dim` floats.
    Vector {
        /// Number of components.
        dim: usize,
    },
    /// A regular grid of vectors (an environment field).
    Grid(GridGeometry),
}

impl ParamShape {
    /// Number of floats per value: `dim` for vectors, per cell for grids.
    pub fn value_dim(&self) -> usize {
        match self {
            Self::Vector { dim } => *dim,
            Self::Grid(g) => g.value_dim(),
        }
    }

    /// Total number of floats in one buffer.
    pub fn storage_len(&self) -> usize {
        match self {
            Self::Vector { dim } => *dim,
            Self::Grid(g) => g.storage_len(),
        }
    }

    /// The grid geometry, if this is a grid parameter.
    pub fn grid(&self) -> Option<&GridGeometry> {
        match self {
            Self::Vector { .. } => None,
            Self::Grid(g) => Some(g),
        }
    }

    /// Whether this is a grid parameter.
    pub fn is_grid(&self) -> bool {
        matches!(self, Self::Grid(_))
    }
}

/// One registration of a parameter in a named space.
#[derive(Clone, Debug, PartialEq)]
pub struct Registration {
    /// Group handle issued by the spatial index.
    pub group: GroupHandle,
    /// Query settings supplied at registration; reused when the owning
    /// agent is copied.
    pub query: NeighborQuery,
}

/// A named, fixed-dimension, double-buffered value.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    name: String,
    shape: ParamShape,
    current: Vec<f32>,
    backup: Vec<f32>,
    registrations: IndexMap<String, Registration>,
    owning_behavior: Option<String>,
}

impl Parameter {
    /// Create a vector parameter initialised to `values`.
    ///
    /// The dimension is `values.len()` and is fixed for the parameter's
    /// lifetime.
    pub fn new(name: impl Into<String>, values: Vec<f32>) -> Self {
        let shape = ParamShape::Vector { dim: values.len() };
        Self {
            name: name.into(),
            shape,
            backup: values.clone(),
            current: values,
            registrations: IndexMap::new(),
            owning_behavior: None,
        }
    }

    /// Create a grid parameter with every cell set to `fill`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGrid`] if `fill` does not have
    /// `value_dim` components.
    pub fn grid(
        name: impl Into<String>,
        geometry: GridGeometry,
        fill: &[f32],
    ) -> Result<Self, ConfigError> {
        if fill.len() != geometry.value_dim() {
            return Err(ConfigError::InvalidGrid {
                reason: format!(
                    "fill value has {} components, grid value_dim is {}",
                    fill.len(),
                    geometry.value_dim()
                ),
            });
        }
        let values: Vec<f32> = fill
            .iter()
            .copied()
            .cycle()
            .take(geometry.storage_len())
            .collect();
        Ok(Self {
            name: name.into(),
            shape: ParamShape::Grid(geometry),
            backup: values.clone(),
            current: values,
            registrations: IndexMap::new(),
            owning_behavior: None,
        })
    }

    /// Mark this parameter as internal to a behavior.
    pub fn owned_by(mut self, behavior: impl Into<String>) -> Self {
        self.owning_behavior = Some(behavior.into());
        self
    }

    /// Parameter name, unique within its list.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value shape.
    pub fn shape(&self) -> &ParamShape {
        &self.shape
    }

    /// Value dimension (`dim` for vectors, per-cell for grids).
    pub fn dim(&self) -> usize {
        self.shape.value_dim()
    }

    /// The committed value.
    pub fn current(&self) -> &[f32] {
        &self.current
    }

    /// The staged value.
    pub fn backup(&self) -> &[f32] {
        &self.backup
    }

    /// The behavior this parameter is internal to, if any.
    pub fn owning_behavior(&self) -> Option<&str> {
        self.owning_behavior.as_deref()
    }

    /// Overwrite both buffers. Configuration-time only.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Dimension`] if `values` has the wrong length.
    pub fn set_values(&mut self, values: &[f32]) -> Result<(), ConfigError> {
        let expected = self.shape.storage_len();
        if values.len() != expected {
            return Err(ConfigError::Dimension {
                behavior: String::new(),
                parameter: self.name.clone(),
                expected,
                actual: values.len(),
            });
        }
        self.current.copy_from_slice(values);
        self.backup.copy_from_slice(values);
        Ok(())
    }

    /// Commit the staged value.
    pub fn flush(&mut self) {
        self.current.copy_from_slice(&self.backup);
    }

    /// Throw away the staged value, restoring it to the committed one.
    pub fn discard(&mut self) {
        self.backup.copy_from_slice(&self.current);
    }

    /// Spatial registrations keyed by space name.
    pub fn registrations(&self) -> &IndexMap<String, Registration> {
        &self.registrations
    }

    /// The group handle for a space, if registered there.
    pub fn group(&self, space: &str) -> Option<GroupHandle> {
        self.registrations.get(space).map(|r| r.group)
    }

    /// Record a registration. Called by the simulation after the spatial
    /// index accepted it.
    pub fn add_registration(&mut self, space: impl Into<String>, registration: Registration) {
        self.registrations.insert(space.into(), registration);
    }

    /// Forget a registration, returning it.
    pub fn take_registration(&mut self, space: &str) -> Option<Registration> {
        self.registrations.shift_remove(space)
    }

    /// Forget every registration, returning them.
    pub fn take_registrations(&mut self) -> IndexMap<String, Registration> {
        std::mem::take(&mut self.registrations)
    }

    /// A structural copy with the same values but no spatial registrations.
    pub fn duplicate(&self) -> Self {
        Self {
            name: self.name.clone(),
            shape: self.shape.clone(),
            current: self.current.clone(),
            backup: self.backup.clone(),
            registrations: IndexMap::new(),
            owning_behavior: self.owning_behavior.clone(),
        }
    }
}

/// Staging buffers detached from a [`ParameterList`] for one act-phase.
///
/// While detached, the list's parameters still expose their committed
/// values to every reader; only the holder of the bank can write staged
/// values. [`ParameterList::restore_backups`] reattaches them.
#[derive(Debug, Default)]
pub struct BackupBank {
    slots: Vec<Option<(ParamId, Vec<f32>)>>,
}

impl BackupBank {
    /// Exclusive access to a staged buffer.
    pub fn get_mut(&mut self, id: ParamId) -> Option<&mut [f32]> {
        match self.slots.get_mut(id.index() as usize)? {
            Some((held, buf)) if *held == id => Some(buf.as_mut_slice()),
            _ => None,
        }
    }

    /// Shared access to a staged buffer.
    pub fn get(&self, id: ParamId) -> Option<&[f32]> {
        match self.slots.get(id.index() as usize)? {
            Some((held, buf)) if *held == id => Some(buf.as_slice()),
            _ => None,
        }
    }
}

/// Ordered, name-unique collection of parameters owned by one entity.
#[derive(Clone, Debug, Default)]
pub struct ParameterList {
    params: Arena<ParamId, Parameter>,
    names: IndexMap<String, ParamId>,
}

impl ParameterList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DuplicateParameter`] if the name is taken.
    pub fn add(&mut self, parameter: Parameter) -> Result<ParamId, ConfigError> {
        if self.names.contains_key(parameter.name()) {
            return Err(ConfigError::DuplicateParameter {
                name: parameter.name().to_string(),
            });
        }
        let name = parameter.name().to_string();
        let id = self.params.insert(parameter);
        self.names.insert(name, id);
        Ok(id)
    }

    /// Remove a parameter by name.
    pub fn remove(&mut self, name: &str) -> Option<Parameter> {
        let id = self.names.shift_remove(name)?;
        self.params.remove(id)
    }

    /// Remove a parameter by handle.
    pub fn remove_id(&mut self, id: ParamId) -> Option<Parameter> {
        let parameter = self.params.remove(id)?;
        self.names.shift_remove(parameter.name());
        Some(parameter)
    }

    /// Handle of a parameter by name.
    pub fn id(&self, name: &str) -> Option<ParamId> {
        self.names.get(name).copied()
    }

    /// Parameter by handle.
    pub fn get(&self, id: ParamId) -> Option<&Parameter> {
        self.params.get(id)
    }

    /// Parameter by handle, mutably.
    pub fn get_mut(&mut self, id: ParamId) -> Option<&mut Parameter> {
        self.params.get_mut(id)
    }

    /// Parameter by name.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Parameter`] naming `owner` if absent.
    pub fn parameter(&self, owner: &str, name: &str) -> Result<&Parameter, LookupError> {
        self.id(name)
            .and_then(|id| self.params.get(id))
            .ok_or_else(|| LookupError::Parameter {
                owner: owner.to_string(),
                name: name.to_string(),
            })
    }

    /// Parameter by name, mutably.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Parameter`] naming `owner` if absent.
    pub fn parameter_mut(
        &mut self,
        owner: &str,
        name: &str,
    ) -> Result<&mut Parameter, LookupError> {
        let found = match self.id(name) {
            Some(id) => self.params.get_mut(id),
            None => None,
        };
        found.ok_or_else(|| LookupError::Parameter {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }

    /// Whether a name is taken.
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of parameters.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamId, &Parameter)> + '_ {
        self.names
            .values()
            .filter_map(|&id| self.params.get(id).map(|p| (id, p)))
    }

    /// Parameters in slot order, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (ParamId, &mut Parameter)> + '_ {
        self.params.iter_mut()
    }

    /// Commit every staged value.
    pub fn flush(&mut self) {
        for (_, p) in self.params.iter_mut() {
            p.flush();
        }
    }

    /// Reset every staged value to its committed value.
    pub fn discard(&mut self) {
        for (_, p) in self.params.iter_mut() {
            p.discard();
        }
    }

    /// Move every staging buffer out into a [`BackupBank`].
    ///
    /// Buffers are moved, not copied. Until
    /// [`restore_backups`](Self::restore_backups) is called, the list's
    /// parameters report empty backups.
    pub fn detach_backups(&mut self) -> BackupBank {
        let mut slots: Vec<Option<(ParamId, Vec<f32>)>> =
            (0..self.params.capacity_hint()).map(|_| None).collect();
        for (id, p) in self.params.iter_mut() {
            slots[id.index() as usize] = Some((id, std::mem::take(&mut p.backup)));
        }
        BackupBank { slots }
    }

    /// Move staging buffers back in.
    pub fn restore_backups(&mut self, bank: BackupBank) {
        for (id, buf) in bank.slots.into_iter().flatten() {
            if let Some(p) = self.params.get_mut(id) {
                p.backup = buf;
            }
        }
    }

    /// A structural copy of every parameter, without registrations.
    ///
    /// Handles are preserved only in the sense that names map to the same
    /// values; callers must re-resolve by name.
    pub fn duplicate(&self) -> Self {
        let mut copy = Self::new();
        for (_, p) in self.iter() {
            // Names are unique in `self`, so `add` cannot fail.
            let _ = copy.add(p.duplicate());
        }
        copy
    }
}
