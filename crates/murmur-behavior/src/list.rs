//! [`BehaviorList`]: one agent's ordered, name-unique pipeline.

use crate::behavior::Behavior;
use crate::context::ActContext;
use crate::pipeline::{write_order_violations, WriteOrderPolicy, WriteOrderViolation};
use murmur_core::{ConfigError, LookupError, TickError};

/// Counters from one pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ActSummary {
    /// Behaviors whose `act()` ran.
    pub run: usize,
    /// Behaviors skipped because their `active` gate was `<= 0`.
    pub skipped: usize,
}

impl std::ops::AddAssign for ActSummary {
    fn add_assign(&mut self, rhs: Self) {
        self.run += rhs.run;
        self.skipped += rhs.skipped;
    }
}

/// Ordered, name-unique collection of behaviors owned by one agent.
///
/// Every structural change is checked against the write-order contract
/// before it takes effect; under [`WriteOrderPolicy::Strict`] a violating
/// change is rejected and the list is left untouched.
#[derive(Debug, Default)]
pub struct BehaviorList {
    behaviors: Vec<Box<dyn Behavior>>,
}

impl BehaviorList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of behaviors.
    pub fn len(&self) -> usize {
        self.behaviors.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.behaviors.is_empty()
    }

    /// Behaviors in execution order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Behavior> + '_ {
        self.behaviors.iter().map(|b| b.as_ref())
    }

    /// Behavior names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|b| b.name()).collect()
    }

    /// Position of a behavior by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.behaviors.iter().position(|b| b.name() == name)
    }

    /// Behavior by name.
    pub fn get(&self, name: &str) -> Option<&dyn Behavior> {
        self.iter().find(|b| b.name() == name)
    }

    /// Behavior by name, reporting `agent` when absent.
    ///
    /// # Errors
    ///
    /// [`LookupError::Behavior`].
    pub fn behavior(&self, agent: &str, name: &str) -> Result<&dyn Behavior, LookupError> {
        self.get(name).ok_or_else(|| LookupError::Behavior {
            agent: agent.to_string(),
            name: name.to_string(),
        })
    }

    /// Append a behavior.
    ///
    /// # Errors
    ///
    /// As [`insert`](Self::insert).
    pub fn push(
        &mut self,
        behavior: Box<dyn Behavior>,
        policy: WriteOrderPolicy,
    ) -> Result<(), ConfigError> {
        self.insert(self.behaviors.len(), behavior, policy)
    }

    /// Insert a behavior at `index` (clamped to the list length).
    ///
    /// On error the behavior is dropped and the list is unchanged.
    ///
    /// # Errors
    ///
    /// [`ConfigError::DuplicateBehavior`], or [`ConfigError::WriteOrder`]
    /// under [`WriteOrderPolicy::Strict`].
    pub fn insert(
        &mut self,
        index: usize,
        behavior: Box<dyn Behavior>,
        policy: WriteOrderPolicy,
    ) -> Result<(), ConfigError> {
        if self.position(behavior.name()).is_some() {
            return Err(ConfigError::DuplicateBehavior {
                name: behavior.name().to_string(),
            });
        }
        let index = index.min(self.behaviors.len());
        {
            let mut order: Vec<&dyn Behavior> = self.iter().collect();
            order.insert(index, behavior.as_ref());
            check_order(&order, policy)?;
        }
        self.behaviors.insert(index, behavior);
        Ok(())
    }

    /// Move the named behavior to `index` (clamped to the last position).
    ///
    /// # Errors
    ///
    /// [`ConfigError::Lookup`] if absent, or [`ConfigError::WriteOrder`]
    /// under [`WriteOrderPolicy::Strict`].
    pub fn move_to(
        &mut self,
        agent: &str,
        name: &str,
        index: usize,
        policy: WriteOrderPolicy,
    ) -> Result<(), ConfigError> {
        let from = self.position(name).ok_or_else(|| LookupError::Behavior {
            agent: agent.to_string(),
            name: name.to_string(),
        })?;
        let to = index.min(self.behaviors.len() - 1);
        {
            let mut order: Vec<&dyn Behavior> = self.iter().collect();
            let moved = order.remove(from);
            order.insert(to, moved);
            check_order(&order, policy)?;
        }
        let moved = self.behaviors.remove(from);
        self.behaviors.insert(to, moved);
        Ok(())
    }

    /// Remove a behavior by name, returning it.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Behavior>> {
        let index = self.position(name)?;
        Some(self.behaviors.remove(index))
    }

    /// Run every behavior once, in list order, skipping inactive ones.
    ///
    /// # Errors
    ///
    /// The first [`TickError`]; later behaviors do not run.
    pub fn act(&self, ctx: &mut ActContext<'_>) -> Result<ActSummary, TickError> {
        let mut summary = ActSummary::default();
        for behavior in &self.behaviors {
            if ctx.scalar(behavior.active())? <= 0.0 {
                summary.skipped += 1;
                continue;
            }
            behavior.act(ctx)?;
            summary.run += 1;
        }
        Ok(summary)
    }
}

fn violation_error(order: &[&dyn Behavior], v: &WriteOrderViolation) -> ConfigError {
    let parameter = order
        .iter()
        .filter(|b| b.name() == v.later)
        .flat_map(|b| b.outputs())
        .find(|p| p.param == v.param)
        .map(|p| p.name.clone())
        .unwrap_or_else(|| v.param.to_string());
    ConfigError::WriteOrder {
        behavior: v.later.clone(),
        parameter,
        earlier: v.earlier.clone(),
    }
}

fn check_order(order: &[&dyn Behavior], policy: WriteOrderPolicy) -> Result<(), ConfigError> {
    let violations = write_order_violations(order.iter().copied());
    for v in &violations {
        let err = violation_error(order, v);
        match policy {
            WriteOrderPolicy::Strict => return Err(err),
            WriteOrderPolicy::Warn => tracing::warn!(%err, "write order violation tolerated"),
        }
    }
    Ok(())
}
