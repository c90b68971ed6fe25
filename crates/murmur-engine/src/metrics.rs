//! Per-tick metrics for the simulation driver.
//!
//! [`StepMetrics`] captures timing and counters for a single tick.

/// Timing and counters collected during a single tick.
///
/// All durations are in microseconds. [`Simulation::step`](crate::Simulation::step)
/// returns one per completed tick.
#[derive(Clone, Debug, Default)]
pub struct StepMetrics {
    /// Wall-clock time for the entire tick, in microseconds.
    pub total_us: u64,
    /// Time spent in the act-phase, in microseconds.
    pub act_us: u64,
    /// Time spent committing staged values and republishing positions,
    /// in microseconds.
    pub flush_us: u64,
    /// Time spent rebuilding neighbor lists, in microseconds.
    pub refresh_us: u64,
    /// Number of agents (environments included) that acted.
    pub agents: usize,
    /// Behaviors whose `act()` ran.
    pub behaviors_run: usize,
    /// Behaviors skipped by their `active` gate.
    pub behaviors_skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_metrics_are_zero() {
        let m = StepMetrics::default();
        assert_eq!(m.total_us, 0);
        assert_eq!(m.act_us, 0);
        assert_eq!(m.flush_us, 0);
        assert_eq!(m.refresh_us, 0);
        assert_eq!(m.agents, 0);
        assert_eq!(m.behaviors_run, 0);
        assert_eq!(m.behaviors_skipped, 0);
    }
}
