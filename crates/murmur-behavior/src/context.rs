//! Execution context passed to behaviors during the act-phase.
//!
//! [`ActContext`] splits access the way the double buffer requires:
//! committed values of any entity are readable through a shared
//! [`ParameterSource`], while only the acting agent's staged buffers are
//! writable. Because the read side borrows for `'a` independently of the
//! context itself, a behavior can hold committed slices while it writes
//! staged ones.

use murmur_core::{
    AgentId, BackupBank, GroupHandle, NeighborRelation, NeighborSource, Owner, ParamRef,
    ParamShape, ParameterSource, TickError, TickId,
};

/// Execution context for one agent's act-phase.
pub struct ActContext<'a> {
    agent: AgentId,
    serial: u64,
    tick: TickId,
    seed: u64,
    dt: f32,
    params: &'a dyn ParameterSource,
    neighbors: &'a dyn NeighborSource,
    staged: &'a mut BackupBank,
}

impl<'a> ActContext<'a> {
    /// Construct a context for `agent`.
    ///
    /// Typically called by the simulation. For testing, construct with a
    /// `MockWorld` from `murmur-test-utils`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        agent: AgentId,
        serial: u64,
        tick: TickId,
        seed: u64,
        dt: f32,
        params: &'a dyn ParameterSource,
        neighbors: &'a dyn NeighborSource,
        staged: &'a mut BackupBank,
    ) -> Self {
        Self {
            agent,
            serial,
            tick,
            seed,
            dt,
            params,
            neighbors,
            staged,
        }
    }

    /// The acting agent.
    pub fn agent(&self) -> AgentId {
        self.agent
    }

    /// The acting agent's unique serial number.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// The tick being computed.
    pub fn tick(&self) -> TickId {
        self.tick
    }

    /// Timestep.
    pub fn dt(&self) -> f32 {
        self.dt
    }

    /// A seed unique to this simulation seed, tick, agent, and `salt`.
    ///
    /// Stochastic behaviors seed their generator from this, so a tick's
    /// outcome does not depend on agent iteration order.
    pub fn stream_seed(&self, salt: u64) -> u64 {
        self.seed ^ self.tick.0.rotate_left(32) ^ self.serial.rotate_left(16) ^ salt
    }

    /// Committed value of any parameter.
    ///
    /// # Errors
    ///
    /// [`TickError::StaleParameter`] if the parameter or its owner is gone.
    pub fn current(&self, param: ParamRef) -> Result<&'a [f32], TickError> {
        self.params
            .current(param)
            .ok_or(TickError::StaleParameter(param))
    }

    /// First component of a committed value, or `0.0` for an empty one.
    ///
    /// # Errors
    ///
    /// As [`current`](Self::current).
    pub fn scalar(&self, param: ParamRef) -> Result<f32, TickError> {
        Ok(self.current(param)?.first().copied().unwrap_or(0.0))
    }

    /// Shape of any parameter.
    ///
    /// # Errors
    ///
    /// [`TickError::StaleParameter`].
    pub fn shape(&self, param: ParamRef) -> Result<&'a ParamShape, TickError> {
        self.params
            .shape(param)
            .ok_or(TickError::StaleParameter(param))
    }

    /// Staged buffer of one of the acting agent's own parameters.
    ///
    /// # Errors
    ///
    /// [`TickError::ForeignWrite`] for another entity's parameter,
    /// [`TickError::StaleParameter`] for a removed one.
    pub fn staged(&mut self, param: ParamRef) -> Result<&mut [f32], TickError> {
        if param.owner != Owner::Agent(self.agent) {
            return Err(TickError::ForeignWrite {
                agent: self.agent,
                param,
            });
        }
        self.staged
            .get_mut(param.param)
            .ok_or(TickError::StaleParameter(param))
    }

    /// Frozen neighbor list of a registration.
    pub fn neighbors(&self, group: GroupHandle) -> &'a [NeighborRelation] {
        self.neighbors.neighbors(group)
    }

    /// The parameter named `name` on a neighbor's owner, if it has one.
    pub fn neighbor_param(&self, relation: &NeighborRelation, name: &str) -> Option<ParamRef> {
        self.params.find(relation.neighbor.owner, name)
    }

    /// Committed value fetched from a neighbor: the registered parameter
    /// itself, or the parameter `name` on the neighbor's owner.
    ///
    /// `Ok(None)` when the neighbor has no such parameter.
    ///
    /// # Errors
    ///
    /// [`TickError::StaleParameter`] if the neighbor was removed.
    pub fn neighbor_value(
        &self,
        relation: &NeighborRelation,
        name: Option<&str>,
    ) -> Result<Option<&'a [f32]>, TickError> {
        match name {
            None => self.current(relation.neighbor).map(Some),
            Some(name) => match self.neighbor_param(relation, name) {
                Some(param) => self.current(param).map(Some),
                None => Ok(None),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use murmur_core::{ArenaKey, ParamId, Parameter, ParameterList, RawId};
    use murmur_test_utils::MockWorld;

    fn raw(index: u32) -> RawId {
        RawId {
            index,
            generation: 0,
        }
    }

    #[test]
    fn reads_current_and_writes_staged() {
        let mut world = MockWorld::new();
        let a = world.add_agent("a");
        let pos = world.add_param(a, Parameter::new("position", vec![1.0, 2.0]));
        let mut bank = world.detach(a);
        let mut ctx = ActContext::new(a, 0, TickId(0), 0, 1.0, &world, &world, &mut bank);

        let committed = ctx.current(pos).unwrap();
        let staged = ctx.staged(pos).unwrap();
        staged[0] = 9.0;
        assert_eq!(committed, &[1.0, 2.0]);
        assert_eq!(ctx.current(pos).unwrap(), &[1.0, 2.0]);
    }

    #[test]
    fn foreign_writes_are_rejected() {
        let mut world = MockWorld::new();
        let a = world.add_agent("a");
        let b = world.add_agent("b");
        let theirs = world.add_param(b, Parameter::new("position", vec![0.0]));
        let mut bank = world.detach(a);
        let mut ctx = ActContext::new(a, 0, TickId(0), 0, 1.0, &world, &world, &mut bank);
        assert_eq!(
            ctx.staged(theirs),
            Err(TickError::ForeignWrite {
                agent: a,
                param: theirs
            })
        );
    }

    #[test]
    fn stale_references_are_errors() {
        let world = MockWorld::new();
        let mut bank = ParameterList::new().detach_backups();
        let a = AgentId::from_raw(raw(3));
        let ghost = ParamRef::agent(a, ParamId::from_raw(raw(0)));
        let mut ctx = ActContext::new(a, 0, TickId(0), 0, 1.0, &world, &world, &mut bank);
        assert_eq!(ctx.current(ghost), Err(TickError::StaleParameter(ghost)));
        assert_eq!(ctx.staged(ghost), Err(TickError::StaleParameter(ghost)));
    }

    #[test]
    fn stream_seed_varies_by_tick_and_agent() {
        let world = MockWorld::new();
        let mut bank = ParameterList::new().detach_backups();
        let a = AgentId::from_raw(raw(0));
        let s0 = ActContext::new(a, 1, TickId(0), 42, 1.0, &world, &world, &mut bank).stream_seed(0);
        let s1 = ActContext::new(a, 1, TickId(1), 42, 1.0, &world, &world, &mut bank).stream_seed(0);
        let s2 = ActContext::new(a, 2, TickId(0), 42, 1.0, &world, &world, &mut bank).stream_seed(0);
        assert_ne!(s0, s1);
        assert_ne!(s0, s2);
    }

    #[test]
    fn neighbor_values_by_name() {
        let mut world = MockWorld::new();
        let a = world.add_agent("a");
        let b = world.add_agent("b");
        world.add_param(a, Parameter::new("position", vec![0.0]));
        let b_pos = world.add_param(b, Parameter::new("position", vec![1.0]));
        world.add_param(b, Parameter::new("velocity", vec![3.0]));
        let rel = MockWorld::relation(b_pos, 1.0, &[1.0]);
        let mut bank = world.detach(a);
        let ctx = ActContext::new(a, 0, TickId(0), 0, 1.0, &world, &world, &mut bank);
        assert_eq!(ctx.neighbor_value(&rel, None).unwrap(), Some(&[1.0][..]));
        assert_eq!(ctx.neighbor_value(&rel, Some("velocity")).unwrap(), Some(&[3.0][..]));
        assert_eq!(ctx.neighbor_value(&rel, Some("mass")).unwrap(), None);
    }
}
