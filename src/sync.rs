//! Cross-worker clause exchange.
//!
//! All workers of one solver share a [`Controller`]. The controller owns
//! three append-only queues of learnt clauses (units, binaries, long
//! clauses); every worker publishes what it learns and remembers how far it
//! has consumed each queue. The queues are only touched inside a single
//! critical region, and cleanup rounds are coordinated through a barrier so
//! that no worker detaches a clause while another may still propagate over
//! it.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Barrier, BarrierWaitResult, Mutex,
};

use crate::lit::Lit;

/// Identifier of a long clause published to the controller.
///
/// Ids are assigned monotonically at publication and never reused; each
/// worker maps them to its local attachment of the clause.
pub type SharedClauseId = u32;

/// A binary clause published to the controller.
#[derive(Copy, Clone, Debug)]
pub struct SharedBinary {
    /// The two literals of the clause.
    pub lits: [Lit; 2],
    /// Whether the clause was learnt.
    pub redundant: bool,
}

/// A long (or ternary) clause published to the controller.
#[derive(Clone, Debug)]
pub struct SharedClause {
    /// Identifier under which the clause is known to all workers.
    pub id: SharedClauseId,
    /// The literals of the clause.
    pub lits: Vec<Lit>,
    /// Glue value reported by the publishing worker.
    pub glue: u32,
}

/// Cached binary implications shared read-only with all workers.
///
/// `implied(l)` lists literals entailed by `!l`. Learnt-clause minimisation
/// uses these entailments for self-subsuming resolution; the watch-based
/// minimisation pass only runs when a cache is present.
pub struct ImplCache {
    implied: Vec<Vec<Lit>>,
}

impl ImplCache {
    /// An empty cache for the given number of variables.
    pub fn new(var_count: usize) -> Self {
        ImplCache {
            implied: vec![vec![]; var_count * 2],
        }
    }

    /// Records that `!lit` entails `implied`.
    pub fn add(&mut self, lit: Lit, implied: Lit) {
        self.implied[lit.code()].push(implied);
    }

    /// Literals entailed by `!lit`.
    pub fn implied(&self, lit: Lit) -> &[Lit] {
        &self.implied[lit.code()]
    }
}

/// The formula and shared read views handed to workers at initialisation.
pub struct Problem {
    /// Number of variables; all allocated up front.
    pub var_count: usize,
    /// Per-variable decision eligibility.
    pub decision: Vec<bool>,
    /// Per-variable elimination flags set by the simplifier.
    pub eliminated: Vec<bool>,
    /// The original clauses.
    pub clauses: Vec<Vec<Lit>>,
    /// Per-literal dominating literal, if one is known.
    pub lit_reachable: Vec<Option<Lit>>,
    /// Implication cache enabling learnt-clause minimisation.
    pub impl_cache: Option<ImplCache>,
}

impl Problem {
    /// An empty problem over the given number of variables.
    pub fn new(var_count: usize) -> Self {
        Problem {
            var_count,
            decision: vec![true; var_count],
            eliminated: vec![false; var_count],
            clauses: vec![],
            lit_reachable: vec![None; var_count * 2],
            impl_cache: None,
        }
    }

    /// Adds an original clause.
    pub fn add_clause(&mut self, lits: impl IntoIterator<Item = Lit>) {
        self.clauses.push(lits.into_iter().collect());
    }

    /// Adds an original clause given in DIMACS numbering.
    pub fn add_dimacs_clause(&mut self, lits: impl IntoIterator<Item = isize>) {
        self.add_clause(lits.into_iter().map(Lit::from_dimacs));
    }
}

/// Queue state guarded by the controller's single critical region.
#[derive(Default)]
struct Queues {
    units: Vec<Lit>,
    binaries: Vec<SharedBinary>,
    longs: Vec<SharedClause>,
    next_id: SharedClauseId,
    to_detach: Vec<SharedClauseId>,
}

/// A clause to publish while syncing.
pub struct Publish<'a> {
    /// Literals of the learnt clause.
    pub lits: &'a [Lit],
    /// Glue value of the learnt clause.
    pub glue: u32,
    /// The publishing worker's view of the global conflict count.
    pub sum_conflicts: u64,
}

/// Per-worker consume state for the controller queues.
///
/// The consume indices are private to the worker; staged clauses are
/// installed between propagation runs.
#[derive(Default)]
pub struct WorkerSync {
    last_unit: usize,
    last_bin: usize,
    last_long: usize,
    /// Units drained from the controller, awaiting installation.
    pub unit_stage: Vec<Lit>,
    /// Binaries drained from the controller, awaiting installation.
    pub bin_stage: Vec<SharedBinary>,
    /// Long clauses drained from the controller, awaiting installation.
    pub long_stage: Vec<SharedClause>,
}

impl WorkerSync {
    /// Resets the consume indices after the controller emptied its queues.
    pub fn reset_counters(&mut self) {
        self.last_unit = 0;
        self.last_bin = 0;
        self.last_long = 0;
    }
}

/// Shared state coordinating the workers of one solver.
pub struct Controller {
    /// The formula and read views used by workers at initialisation.
    pub problem: Problem,
    queues: Mutex<Queues>,
    barrier: Barrier,
    next_clean_limit: AtomicU64,
    clean_step: u64,
    sum_conflicts: AtomicU64,
}

impl Controller {
    /// Creates a controller for `workers` worker engines.
    ///
    /// A cleanup barrier applies every `clean_step` conflicts summed over
    /// all workers.
    pub fn new(problem: Problem, workers: usize, clean_step: u64) -> Self {
        Controller {
            problem,
            queues: Mutex::default(),
            barrier: Barrier::new(workers),
            next_clean_limit: AtomicU64::new(clean_step),
            clean_step,
            sum_conflicts: AtomicU64::new(0),
        }
    }

    /// Global conflict count at which the next cleanup barrier applies.
    pub fn next_clean_limit(&self) -> u64 {
        self.next_clean_limit.load(Ordering::Acquire)
    }

    /// Adds one conflict to the global count, returning the new sum.
    pub fn count_conflict(&self) -> u64 {
        self.sum_conflicts.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Current global conflict count over all workers.
    pub fn sum_conflicts(&self) -> u64 {
        self.sum_conflicts.load(Ordering::Acquire)
    }

    /// Blocks until every worker reached the barrier.
    ///
    /// Exactly one caller per round observes `is_leader` and runs the
    /// single-execution sections of the cleanup protocol.
    pub fn wait_all_threads(&self) -> BarrierWaitResult {
        self.barrier.wait()
    }

    /// Drains newly published clauses into the worker's staging buffers and
    /// optionally publishes one clause, all inside one critical region.
    ///
    /// The publishing worker's consume indices are advanced past its own
    /// publication so it does not ingest it back. Returns the id under which
    /// a published long clause is known to all workers; units and binaries
    /// have no id.
    pub fn sync_and_publish(
        &self,
        sync: &mut WorkerSync,
        publish: Option<Publish>,
    ) -> Option<SharedClauseId> {
        let mut queues = self.queues.lock().unwrap();

        sync.unit_stage
            .extend_from_slice(&queues.units[sync.last_unit..]);
        sync.last_unit = queues.units.len();
        sync.bin_stage
            .extend_from_slice(&queues.binaries[sync.last_bin..]);
        sync.last_bin = queues.binaries.len();
        sync.long_stage
            .extend_from_slice(&queues.longs[sync.last_long..]);
        sync.last_long = queues.longs.len();

        let publish = publish?;
        tracing::trace!(
            lits = ?publish.lits,
            glue = publish.glue,
            sum_conflicts = publish.sum_conflicts,
            "publishing learnt clause"
        );
        match *publish.lits {
            [] => unreachable!("empty clauses are never published"),
            [unit] => {
                queues.units.push(unit);
                sync.last_unit += 1;
                None
            }
            [a, b] => {
                queues.binaries.push(SharedBinary {
                    lits: [a, b],
                    redundant: true,
                });
                sync.last_bin += 1;
                None
            }
            _ => {
                let id = queues.next_id;
                queues.next_id += 1;
                queues.longs.push(SharedClause {
                    id,
                    lits: publish.lits.to_vec(),
                    glue: publish.glue,
                });
                sync.last_long += 1;
                Some(id)
            }
        }
    }

    /// Publishes unit facts derived at decision level 0.
    pub fn publish_units(&self, sync: &mut WorkerSync, lits: &[Lit]) {
        let mut queues = self.queues.lock().unwrap();
        for &lit in lits {
            queues.units.push(lit);
            sync.last_unit += 1;
        }
    }

    /// Clauses the controller scheduled for detachment this cleanup round.
    pub fn to_detach(&self) -> Vec<SharedClauseId> {
        self.queues.lock().unwrap().to_detach.clone()
    }

    /// Schedules published clauses for detachment at the next cleanup.
    pub fn schedule_detach(&self, ids: impl IntoIterator<Item = SharedClauseId>) {
        self.queues.lock().unwrap().to_detach.extend(ids);
    }

    /// Releases the detach list, empties the exchanged queues and advances
    /// the cleanup limit.
    ///
    /// Called by exactly one worker per cleanup round, inside a barrier
    /// section; the other workers reset their consume indices.
    pub fn to_detach_free(&self) {
        let mut queues = self.queues.lock().unwrap();
        queues.to_detach.clear();
        queues.units.clear();
        queues.binaries.clear();
        queues.longs.clear();
        self.next_clean_limit
            .fetch_add(self.clean_step, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! lit {
        ($lit:literal) => {
            Lit::from_dimacs($lit)
        };
    }

    #[test]
    fn publish_skips_own_clauses() {
        let controller = Controller::new(Problem::new(4), 1, 1000);
        let mut a = WorkerSync::default();
        let mut b = WorkerSync::default();

        let id = controller.sync_and_publish(
            &mut a,
            Some(Publish {
                lits: &[lit!(1), lit!(2), lit!(3), lit!(4)],
                glue: 2,
                sum_conflicts: 1,
            }),
        );
        assert_eq!(id, Some(0));

        // The publishing worker advanced past its own clause.
        controller.sync_and_publish(&mut a, None);
        assert!(a.long_stage.is_empty());

        // A sibling worker receives it.
        controller.sync_and_publish(&mut b, None);
        assert_eq!(b.long_stage.len(), 1);
        assert_eq!(b.long_stage[0].id, 0);
        assert_eq!(b.long_stage[0].glue, 2);
    }

    #[test]
    fn queues_are_drained_monotonically() {
        let controller = Controller::new(Problem::new(4), 1, 1000);
        let mut a = WorkerSync::default();
        let mut b = WorkerSync::default();

        controller.publish_units(&mut a, &[lit!(1)]);
        controller.sync_and_publish(
            &mut a,
            Some(Publish {
                lits: &[lit!(2), lit!(3)],
                glue: 1,
                sum_conflicts: 1,
            }),
        );

        controller.sync_and_publish(&mut b, None);
        assert_eq!(b.unit_stage, vec![lit!(1)]);
        assert_eq!(b.bin_stage.len(), 1);

        // Draining again yields nothing new.
        controller.sync_and_publish(&mut b, None);
        assert_eq!(b.unit_stage.len(), 1);
        assert_eq!(b.bin_stage.len(), 1);
    }

    #[test]
    fn detach_round_resets_queues() {
        let controller = Controller::new(Problem::new(4), 1, 500);
        let mut a = WorkerSync::default();

        let id = controller
            .sync_and_publish(
                &mut a,
                Some(Publish {
                    lits: &[lit!(1), lit!(2), lit!(3), lit!(4)],
                    glue: 2,
                    sum_conflicts: 1,
                }),
            )
            .unwrap();
        controller.schedule_detach([id]);
        assert_eq!(controller.to_detach(), vec![id]);

        assert_eq!(controller.next_clean_limit(), 500);
        controller.to_detach_free();
        assert!(controller.to_detach().is_empty());
        assert_eq!(controller.next_clean_limit(), 1000);

        // Queues were emptied; a fresh consumer sees nothing.
        let mut b = WorkerSync::default();
        controller.sync_and_publish(&mut b, None);
        assert!(b.long_stage.is_empty());
        a.reset_counters();
        controller.sync_and_publish(&mut a, None);
        assert!(a.long_stage.is_empty());
    }

    #[test]
    fn impl_cache_lookup() {
        let mut cache = ImplCache::new(3);
        cache.add(lit!(-1), lit!(2));
        cache.add(lit!(-1), lit!(3));
        assert_eq!(cache.implied(lit!(-1)), &[lit!(2), lit!(3)]);
        assert!(cache.implied(lit!(1)).is_empty());
    }
}
