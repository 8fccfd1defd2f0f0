//! Engine statistics.

/// Counters maintained by a worker engine.
#[derive(Default, Debug)]
pub struct Stats {
    /// Conflicts handled.
    pub conflicts: u64,
    /// Restarts performed.
    pub restarts: u64,
    /// Decisions made, including assumptions used as decisions.
    pub decisions: u64,
    /// Decisions picked uniformly at random.
    pub rnd_decisions: u64,
    /// Assignments made by unit propagation.
    pub propagations: u64,
    /// Literals in learnt clauses before minimisation.
    pub max_literals: u64,
    /// Literals in learnt clauses after minimisation.
    pub tot_literals: u64,
    /// Learnt clauses shortened by watch-based minimisation.
    pub shrunk_clauses: u64,
    /// Literals removed by watch-based minimisation.
    pub shrunk_literals: u64,
    /// Unit clauses ingested from the controller.
    pub received_units: u64,
    /// Binary clauses ingested from the controller.
    pub received_binaries: u64,
    /// Long clauses ingested from the controller.
    pub received_longs: u64,
}
