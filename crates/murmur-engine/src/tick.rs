//! The two-pass tick: act-phase, then flush-phase.
//!
//! During the act-phase each agent's staging buffers are detached into a
//! [`BackupBank`](murmur_core::BackupBank) and handed to its pipeline,
//! while every entity's committed values stay readable through a shared
//! [`World`] view. No committed value changes until the flush-phase, which
//! runs only after every agent has acted.
//!
//! A [`TickError`] aborts the act-phase and resets every staged value, so
//! an abandoned tick leaves no trace.

use crate::metrics::StepMetrics;
use crate::simulation::{publish, Simulation, StepError};
use crate::world::World;
use murmur_behavior::{ActContext, ActSummary};
use murmur_core::{AgentId, TickError, TickId};
use std::time::Instant;
use tracing::{trace, warn};

impl Simulation {
    /// Run every agent's pipeline once, staging all writes.
    ///
    /// # Errors
    ///
    /// The first [`TickError`]; every agent's staged values are discarded.
    pub fn act(&mut self) -> Result<ActSummary, TickError> {
        let order = self.agents.keys();
        self.act_in_order(&order)
    }

    /// Run the pipelines of `order`'s agents, in that order.
    ///
    /// The result after [`flush`](Self::flush) does not depend on the
    /// order.
    ///
    /// # Errors
    ///
    /// [`TickError::StaleAgent`] for a removed handle, or the first error
    /// a behavior raises. Every agent's staged values are discarded.
    pub fn act_in_order(&mut self, order: &[AgentId]) -> Result<ActSummary, TickError> {
        self.refresh_if_dirty();
        let mut summary = ActSummary::default();
        for &id in order {
            match self.run_pipeline(id) {
                Ok(s) => summary += s,
                Err(e) => {
                    self.discard_staged();
                    warn!(tick = %self.tick, error = %e, "act-phase aborted, staged values discarded");
                    return Err(e);
                }
            }
        }
        trace!(
            tick = %self.tick,
            agents = order.len(),
            run = summary.run,
            skipped = summary.skipped,
            "act-phase complete"
        );
        Ok(summary)
    }

    /// Run one agent's pipeline, staging its writes.
    ///
    /// Drivers that call this per agent must act every agent before
    /// flushing any of them.
    ///
    /// # Errors
    ///
    /// As [`act_in_order`](Self::act_in_order), except that only this
    /// agent's staged values are discarded.
    pub fn act_agent(&mut self, id: AgentId) -> Result<ActSummary, TickError> {
        self.refresh_if_dirty();
        let result = self.run_pipeline(id);
        if let Err(e) = &result {
            if let Some(agent) = self.agents.get_mut(id) {
                agent.discard_staged();
            }
            warn!(tick = %self.tick, error = %e, "agent act aborted, staged values discarded");
        }
        result
    }

    fn run_pipeline(&mut self, id: AgentId) -> Result<ActSummary, TickError> {
        let mut bank = self
            .agents
            .get_mut(id)
            .ok_or(TickError::StaleAgent(id))?
            .params
            .detach_backups();
        let result = {
            let world = World {
                agents: &self.agents,
                swarms: &self.swarms,
                index: self.index.as_ref(),
            };
            match self.agents.get(id) {
                Some(agent) => {
                    let mut ctx = ActContext::new(
                        id,
                        agent.serial(),
                        self.tick,
                        self.config.seed,
                        self.config.dt,
                        &world,
                        &world,
                        &mut bank,
                    );
                    agent.act(&mut ctx)
                }
                None => Err(TickError::StaleAgent(id)),
            }
        };
        if let Some(agent) = self.agents.get_mut(id) {
            agent.params.restore_backups(bank);
        }
        result
    }

    /// Commit one agent's staged values and republish its positions.
    ///
    /// The tick counter is left alone; finish a per-agent tick with
    /// [`end_tick`](Self::end_tick).
    ///
    /// # Errors
    ///
    /// [`StepError::Tick`] for a removed handle, [`StepError::Space`] if
    /// the index rejects a position.
    pub fn flush_agent(&mut self, id: AgentId) -> Result<(), StepError> {
        let agent = self.agents.get_mut(id).ok_or(TickError::StaleAgent(id))?;
        agent.flush();
        self.dirty = true;
        for (_, p) in agent.params.iter() {
            publish(p, self.index.as_mut())?;
        }
        Ok(())
    }

    /// Commit every agent's staged values, republish positions, and
    /// advance the tick counter.
    ///
    /// Every agent is committed before any position is republished.
    ///
    /// # Errors
    ///
    /// [`StepError::Space`] for the first rejected position. The tick
    /// counter does not advance.
    pub fn flush(&mut self) -> Result<(), StepError> {
        for (_, agent) in self.agents.iter_mut() {
            agent.flush();
        }
        self.dirty = true;
        let mut published = 0usize;
        for (_, agent) in self.agents.iter() {
            for (_, p) in agent.params.iter() {
                publish(p, self.index.as_mut())?;
                published += p.registrations().len();
            }
        }
        self.end_tick();
        trace!(tick = %self.tick, published, "flush-phase complete");
        Ok(())
    }

    /// Close a tick driven through [`act_agent`](Self::act_agent) and
    /// [`flush_agent`](Self::flush_agent): advance the tick counter.
    ///
    /// Call once, after the last agent is flushed. [`flush`](Self::flush)
    /// and [`step`](Self::step) do this themselves.
    pub fn end_tick(&mut self) {
        self.tick = TickId(self.tick.0 + 1);
    }

    /// Reset every agent's staged values to the committed ones.
    pub fn discard_staged(&mut self) {
        for (_, agent) in self.agents.iter_mut() {
            agent.discard_staged();
        }
    }

    /// Rebuild every neighbor list from the published positions.
    pub fn refresh(&mut self) {
        self.index.refresh();
        self.dirty = false;
    }

    fn refresh_if_dirty(&mut self) {
        if self.dirty {
            self.refresh();
        }
    }

    /// Advance one tick: act-phase, flush-phase, neighbor refresh.
    ///
    /// # Errors
    ///
    /// [`StepError::Tick`] if the act-phase failed; nothing was committed
    /// and the tick counter did not advance.
    pub fn step(&mut self) -> Result<StepMetrics, StepError> {
        let start = Instant::now();
        let summary = self.act()?;
        let act_us = start.elapsed().as_micros() as u64;

        let flush_start = Instant::now();
        self.flush()?;
        let flush_us = flush_start.elapsed().as_micros() as u64;

        let refresh_start = Instant::now();
        self.refresh();
        let refresh_us = refresh_start.elapsed().as_micros() as u64;

        Ok(StepMetrics {
            total_us: start.elapsed().as_micros() as u64,
            act_us,
            flush_us,
            refresh_us,
            agents: self.agents.len(),
            behaviors_run: summary.run,
            behaviors_skipped: summary.skipped,
        })
    }
}
