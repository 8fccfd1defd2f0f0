//! The per-thread search engine.
//!
//! A [`Worker`] owns its trail, watch lists, clause storage and heuristics,
//! and shares only the [`Controller`] with its siblings. It attaches the
//! controller's formula once at construction; afterwards [`Worker::solve`]
//! runs restarts of CDCL search, exchanging learnt clauses with the other
//! workers between propagation runs and at barrier-coordinated cleanup
//! points.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use rand::{rngs::SmallRng, SeedableRng};

use crate::{
    analyze::Analyzer,
    arena::{ClauseArena, ClauseHeader, ClauseRef},
    config::Config,
    decision::{Phases, VarOrder},
    lit::{Lit, Var},
    prop::{self, AddClauseError, AddedClause},
    restart::Restarts,
    stats::Stats,
    sync::{Controller, SharedBinary, SharedClause, SharedClauseId, WorkerSync},
    trail::{BacktrackCallbacks, Level, Reason, Trail},
    watch::Watches,
};

/// Terminal outcomes of a [`Worker::solve`] call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SolveResult {
    /// A satisfying assignment was found; see [`Worker::solution`].
    Sat,
    /// The formula is unsatisfiable under the given assumptions; see
    /// [`Worker::conflict`].
    Unsat,
    /// The conflict budget was exhausted or the worker was interrupted.
    Unknown,
}

/// One worker engine of a multi-threaded solver.
pub struct Worker {
    pub(crate) config: Config,
    pub(crate) controller: Arc<Controller>,
    pub(crate) trail: Trail,
    pub(crate) watches: Watches,
    pub(crate) arena: ClauseArena,
    pub(crate) analyzer: Analyzer,
    pub(crate) order: VarOrder,
    pub(crate) phases: Phases,
    pub(crate) restarts: Restarts,
    pub(crate) rng: SmallRng,
    pub(crate) stats: Stats,

    /// Per-variable decision eligibility, fixed at construction.
    pub(crate) decision: Vec<bool>,
    /// Per-variable elimination flags, fixed at construction.
    pub(crate) eliminated: Vec<bool>,

    pub(crate) assumptions: Vec<Lit>,
    /// Total assignment recorded by the last satisfiable solve.
    pub(crate) solution: Option<Vec<Option<bool>>>,
    /// Assumption conflict set recorded by the last unsatisfiable solve.
    pub(crate) conflict: Vec<Lit>,

    /// Cleared once any ingest or conflict derives the empty clause; all
    /// later solves answer unsatisfiable without work.
    pub(crate) ok: bool,
    pub(crate) interrupt: Arc<AtomicBool>,

    pub(crate) sync: WorkerSync,
    /// Local attachments of clauses received from or published to the
    /// controller, by shared id.
    pub(crate) shared_refs: HashMap<SharedClauseId, ClauseRef>,
    /// Global conflict count observed at the last publication.
    pub(crate) last_sum_conflicts: u64,
}

impl Worker {
    /// Creates a worker and attaches the controller's formula.
    ///
    /// Variables are allocated up front; original clauses are attached here
    /// and never deleted by the engine. A conflict among the unit clauses
    /// already settles the formula as unsatisfiable.
    pub fn new(controller: Arc<Controller>, config: Config) -> Result<Worker, AddClauseError> {
        let problem = &controller.problem;
        let var_count = problem.var_count;

        let mut trail = Trail::default();
        let mut watches = Watches::default();
        let mut arena = ClauseArena::default();
        let mut analyzer = Analyzer::default();
        let mut order = VarOrder::new(config.var_decay);
        let mut phases = Phases::default();
        let mut stats = Stats::default();

        trail.resize(var_count);
        watches.resize(var_count);
        analyzer.resize(var_count);
        order.resize(var_count);
        phases.resize(var_count);

        let mut ok = true;
        for lits in &problem.clauses {
            if let AddedClause::Empty =
                prop::add_clause_verbatim(&mut trail, &mut watches, &mut arena, false, 0, lits)?
            {
                ok = false;
                break;
            }
        }
        if ok {
            ok = prop::propagate(&mut trail, &mut watches, &mut arena, &mut stats).is_none();
        }

        Ok(Worker {
            rng: SmallRng::seed_from_u64(config.seed),
            restarts: Restarts::new(&config),
            decision: problem.decision.clone(),
            eliminated: problem.eliminated.clone(),
            config,
            trail,
            watches,
            arena,
            analyzer,
            order,
            phases,
            stats,
            assumptions: vec![],
            solution: None,
            conflict: vec![],
            ok,
            interrupt: Arc::new(AtomicBool::new(false)),
            sync: WorkerSync::default(),
            shared_refs: HashMap::new(),
            last_sum_conflicts: 0,
            controller,
        })
    }

    /// Searches for a model under the given assumptions.
    ///
    /// Runs until a verdict is reached, the worker has handled `max_confls`
    /// conflicts in total, or the interrupt flag is raised. On
    /// [`SolveResult::Sat`] the model is available through
    /// [`solution`](Worker::solution); on [`SolveResult::Unsat`] under
    /// assumptions, [`conflict`](Worker::conflict) holds a conflict set over
    /// the assumptions.
    pub fn solve(
        &mut self,
        assumptions: &[Lit],
        max_confls: u64,
    ) -> Result<SolveResult, AddClauseError> {
        if !self.ok {
            return Ok(SolveResult::Unsat);
        }
        debug_assert!(self.trail.fully_propagated());

        self.assumptions = assumptions.to_vec();
        self.conflict.clear();
        self.solution = None;

        self.controller.sync_and_publish(&mut self.sync, None);
        if !self.install_incoming()? {
            self.cancel_until(0);
            return Ok(SolveResult::Unsat);
        }

        let mut status = SolveResult::Unknown;
        while status == SolveResult::Unknown
            && !self.interrupted()
            && self.stats.conflicts < max_confls
        {
            self.restarts.begin();
            self.stats.restarts += 1;
            status = self.search(max_confls)?;

            if status == SolveResult::Unknown {
                tracing::trace!(
                    agility = self.restarts.agility.value(),
                    avg_glue = self.restarts.glue_window.avg(),
                    avg_size = self.restarts.size_window.avg(),
                    conflicts = self.restarts.conflicts_done,
                    "restart"
                );
            }

            if status == SolveResult::Unknown
                && self.last_sum_conflicts > self.controller.next_clean_limit()
            {
                if !self.cleanup_round()? {
                    status = SolveResult::Unsat;
                }
            }
        }

        match status {
            SolveResult::Sat => {
                let values = &self.trail.values;
                self.solution = Some(
                    (0..values.var_count())
                        .map(|index| values.value(Var::from_index(index)))
                        .collect(),
                );
            }
            SolveResult::Unsat => {
                if self.conflict.is_empty() {
                    self.ok = false;
                }
            }
            SolveResult::Unknown => {}
        }
        self.cancel_until(0);

        tracing::debug!(
            ?status,
            conflicts = self.stats.conflicts,
            restarts = self.stats.restarts,
            "solve finished"
        );
        Ok(status)
    }

    /// The model found by the last satisfiable solve.
    ///
    /// Variables that are not decision-eligible may be unassigned.
    pub fn solution(&self) -> Option<&[Option<bool>]> {
        self.solution.as_deref()
    }

    /// Conflict set over the assumptions from the last unsatisfiable solve.
    ///
    /// Empty when unsatisfiability does not depend on the assumptions.
    pub fn conflict(&self) -> &[Lit] {
        &self.conflict
    }

    /// Total number of conflicts this worker has handled.
    pub fn num_conflicts(&self) -> u64 {
        self.stats.conflicts
    }

    /// The worker's statistics counters.
    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Whether no empty clause was derived so far.
    pub fn is_ok(&self) -> bool {
        self.ok
    }

    /// Requests a cooperative stop; the next restart check returns control.
    pub fn set_need_to_interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    /// A handle on the interrupt flag, shareable across threads.
    pub fn interrupt_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.interrupt)
    }

    pub(crate) fn interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    pub(crate) fn eligible(&self, var: Var) -> bool {
        self.decision[var.index()] && !self.eliminated[var.index()]
    }

    /// Backtracks to `level`, saving phases and requeuing variables.
    pub(crate) fn cancel_until(&mut self, level: Level) {
        let mut callbacks = Unassign {
            order: &mut self.order,
            phases: &mut self.phases,
            decision: &self.decision,
            eliminated: &self.eliminated,
        };
        self.trail.cancel_until(level, &mut callbacks);
    }

    /// Publishes literals fixed at level 0 by the last propagation run.
    pub(crate) fn broadcast_level0(&mut self, old_len: usize) {
        debug_assert_eq!(self.trail.decision_level(), 0);
        let units = self.trail.lits()[old_len..].to_vec();
        self.controller.publish_units(&mut self.sync, &units);
    }

    /// Installs all staged incoming clauses.
    ///
    /// Returns `false` (clearing the `ok` flag) when an ingest derives the
    /// empty clause.
    pub(crate) fn install_incoming(&mut self) -> Result<bool, AddClauseError> {
        let units = std::mem::take(&mut self.sync.unit_stage);
        for lit in units {
            self.stats.received_units += 1;
            if self.trail.values.is_true(lit) && self.trail.level(lit.var()) == 0 {
                continue;
            }
            self.cancel_until(0);
            if self.trail.values.is_false(lit) {
                self.ok = false;
                return Ok(false);
            }
            if !self.trail.values.is_true(lit) {
                self.trail.enqueue(lit, Reason::Unit);
            }
        }

        let binaries = std::mem::take(&mut self.sync.bin_stage);
        for binary in binaries {
            self.stats.received_binaries += 1;
            if !self.ingest_binary(binary) {
                self.ok = false;
                return Ok(false);
            }
        }

        let longs = std::mem::take(&mut self.sync.long_stage);
        for shared in longs {
            self.stats.received_longs += 1;
            if !self.ingest_long(shared)? {
                self.ok = false;
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Attaches and integrates one incoming binary clause.
    fn ingest_binary(&mut self, binary: SharedBinary) -> bool {
        let [mut a, mut b] = binary.lits;
        self.watches.attach_binary(a, b, binary.redundant);

        let values = &self.trail.values;
        if values.is_true(a) || values.is_true(b) {
            return true;
        }
        // Keep an unassigned literal in front.
        if !values.is_assigned(b.var()) {
            std::mem::swap(&mut a, &mut b);
        }
        if !values.is_assigned(a.var()) {
            if !values.is_assigned(b.var()) {
                return true;
            }
            debug_assert!(values.is_false(b));
            self.trail.enqueue(a, Reason::Binary(b));
            return true;
        }

        // Both literals are false; undo at least the later assignment.
        debug_assert!(values.is_false(a) && values.is_false(b));
        if self.trail.level(a.var()) < self.trail.level(b.var()) {
            std::mem::swap(&mut a, &mut b);
        }
        let top = self.trail.level(a.var());
        if top == 0 {
            self.cancel_until(0);
            return false;
        }
        self.cancel_until(top - 1);
        if self.trail.values.is_false(b) {
            self.trail.enqueue(a, Reason::Binary(b));
        }
        // Otherwise both sat at the same level and are now unassigned.
        true
    }

    /// Attaches and integrates one incoming ternary or long clause.
    fn ingest_long(&mut self, shared: SharedClause) -> Result<bool, AddClauseError> {
        let SharedClause { id, mut lits, glue } = shared;
        debug_assert!(lits.len() >= 3);

        // Watch the most attachment-worthy literals: true before unassigned
        // before false, higher assignment level first on equal value.
        let trail = &self.trail;
        lits.sort_by_key(|&lit| {
            if trail.values.is_true(lit) {
                (0u8, std::cmp::Reverse(trail.level(lit.var())))
            } else if !trail.values.is_assigned(lit.var()) {
                (1, std::cmp::Reverse(0))
            } else {
                (2, std::cmp::Reverse(trail.level(lit.var())))
            }
        });

        let reason;
        if lits.len() == 3 {
            let tri = [lits[0], lits[1], lits[2]];
            self.watches.attach_ternary(tri);
            reason = Reason::Ternary([tri[1], tri[2]]);
        } else {
            let clause = self
                .arena
                .add_clause(ClauseHeader::new(true, glue), &lits)?;
            self.watches.attach_long(clause, [lits[0], lits[1]]);
            self.shared_refs.insert(id, clause);
            reason = Reason::Long(clause);
        }

        let (first, second) = (lits[0], lits[1]);
        let values = &self.trail.values;
        if values.is_true(first)
            || (!values.is_assigned(first.var()) && !values.is_assigned(second.var()))
        {
            return Ok(true);
        }
        if !values.is_assigned(first.var()) {
            // Exactly one unassigned literal; all others are false.
            self.trail.enqueue(first, reason);
            return Ok(true);
        }

        // Every literal is false.
        let top = self.trail.level(first.var());
        if top == 0 {
            self.cancel_until(0);
            return Ok(false);
        }
        self.cancel_until(top - 1);
        if self.trail.values.is_false(second) {
            self.trail.enqueue(first, reason);
        }
        Ok(true)
    }

    /// Runs one barrier-coordinated cleanup round.
    ///
    /// All workers drain the queues, install what is pending, detach the
    /// clauses the controller scheduled, and one worker releases the detach
    /// list and empties the queues. No barrier is entered while a critical
    /// region is held.
    pub(crate) fn cleanup_round(&mut self) -> Result<bool, AddClauseError> {
        tracing::debug!(
            sum_conflicts = self.last_sum_conflicts,
            "cleanup barrier reached"
        );

        self.controller.wait_all_threads();
        self.controller.sync_and_publish(&mut self.sync, None);
        self.controller.wait_all_threads();
        let ok = self.install_incoming()?;
        self.controller.wait_all_threads();

        for id in self.controller.to_detach() {
            self.detach_shared(id);
        }
        self.sync.reset_counters();

        if self.controller.wait_all_threads().is_leader() {
            self.controller.to_detach_free();
        }
        self.controller.wait_all_threads();

        self.maybe_collect_garbage();
        Ok(ok)
    }

    /// Detaches and deletes the local attachment of a shared clause.
    fn detach_shared(&mut self, id: SharedClauseId) {
        let Some(&clause) = self.shared_refs.get(&id) else {
            // Never attached here, or stored inline as a ternary.
            return;
        };
        // A clause acting as a reason must survive until its assignment is
        // undone; it stays attached and can be rescheduled later.
        let is_reason = self
            .trail
            .lits()
            .iter()
            .any(|lit| matches!(self.trail.reason(lit.var()), Reason::Long(c) if c == clause));
        if is_reason {
            return;
        }
        self.shared_refs.remove(&id);
        let lits = self.arena.lits(clause);
        let watched = [lits[0], lits[1]];
        self.watches.detach_long(clause, watched);
        self.arena.delete_clause(clause);
    }

    /// Compacts the arena and re-patches all clause references.
    fn maybe_collect_garbage(&mut self) {
        if !self.arena.should_collect_garbage() {
            return;
        }
        let map = self.arena.collect_garbage();
        self.watches.update_clause_references(&map);
        self.trail.update_reasons(&map);
        let refs = std::mem::take(&mut self.shared_refs);
        self.shared_refs = refs
            .into_iter()
            .filter_map(|(id, clause)| map.update(clause).map(|clause| (id, clause)))
            .collect();
        tracing::debug!("collected clause arena garbage");
    }
}

/// Backtrack callbacks wiring phase saving and the variable order.
struct Unassign<'a> {
    order: &'a mut VarOrder,
    phases: &'a mut Phases,
    decision: &'a [bool],
    eliminated: &'a [bool],
}

impl BacktrackCallbacks for Unassign<'_> {
    fn unassign(&mut self, lit: Lit) {
        self.phases.save(lit);
        let var = lit.var();
        if self.decision[var.index()] && !self.eliminated[var.index()] {
            self.order.insert(var);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::Problem;

    fn problem(clauses: &[&[isize]]) -> Problem {
        let var_count = clauses
            .iter()
            .flat_map(|clause| clause.iter())
            .map(|lit| lit.unsigned_abs())
            .max()
            .unwrap_or(0);
        let mut problem = Problem::new(var_count);
        for clause in clauses {
            problem.add_dimacs_clause(clause.iter().copied());
        }
        problem
    }

    fn single_worker(clauses: &[&[isize]]) -> Worker {
        let controller = Arc::new(Controller::new(problem(clauses), 1, 1 << 40));
        Worker::new(controller, Config::default()).unwrap()
    }

    fn assumptions(lits: &[isize]) -> Vec<Lit> {
        lits.iter().map(|&lit| Lit::from_dimacs(lit)).collect()
    }

    fn assert_model_satisfies(worker: &Worker, clauses: &[&[isize]]) {
        let model = worker.solution().expect("expected a model");
        for clause in clauses {
            assert!(
                clause.iter().any(|&lit| {
                    let value = model[lit.unsigned_abs() - 1];
                    value == Some(lit > 0)
                }),
                "clause {clause:?} unsatisfied by {model:?}"
            );
        }
    }

    /// Pigeonhole principle: `pigeons` pigeons into `pigeons - 1` holes.
    fn pigeonhole(pigeons: usize) -> Vec<Vec<isize>> {
        let holes = pigeons - 1;
        let var = |pigeon: usize, hole: usize| (pigeon * holes + hole + 1) as isize;
        let mut clauses = vec![];
        for pigeon in 0..pigeons {
            clauses.push((0..holes).map(|hole| var(pigeon, hole)).collect());
        }
        for hole in 0..holes {
            for a in 0..pigeons {
                for b in a + 1..pigeons {
                    clauses.push(vec![-var(a, hole), -var(b, hole)]);
                }
            }
        }
        clauses
    }

    #[test]
    fn empty_formula_is_sat() {
        let mut worker = single_worker(&[]);
        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Sat);
        assert_eq!(worker.solution(), Some(&[][..]));
    }

    #[test]
    fn unit_only_formula_is_sat_without_conflicts() {
        let mut worker = single_worker(&[&[1]]);
        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Sat);
        assert_eq!(worker.num_conflicts(), 0);
        assert_eq!(worker.solution().unwrap()[0], Some(true));
    }

    #[test]
    fn contradictory_units_are_unsat() {
        let mut worker = single_worker(&[&[1], &[-1]]);
        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Unsat);
        assert_eq!(worker.stats().decisions, 0);
        assert!(worker.conflict().is_empty());
        assert!(!worker.is_ok());
        // Once `ok` is cleared, later solves answer without work.
        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Unsat);
    }

    #[test]
    fn empty_clause_is_unsat_without_decisions() {
        let mut problem = Problem::new(2);
        problem.add_dimacs_clause([1, 2]);
        problem.add_clause([]);
        let controller = Arc::new(Controller::new(problem, 1, 1 << 40));
        let mut worker = Worker::new(controller, Config::default()).unwrap();

        assert!(!worker.is_ok());
        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Unsat);
        assert_eq!(worker.stats().decisions, 0);
    }

    #[test]
    fn zero_conflict_budget_returns_unknown() {
        let mut worker = single_worker(&[&[1, 2], &[-1, 2], &[1, -2]]);
        assert_eq!(worker.solve(&[], 0).unwrap(), SolveResult::Unknown);
        assert_eq!(worker.stats().decisions, 0);
    }

    #[test]
    fn forced_variable_is_found() {
        let clauses: &[&[isize]] = &[&[1, 2], &[-1, 2], &[1, -2]];
        let mut worker = single_worker(clauses);
        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Sat);
        // Every model of this formula sets variable 2 to true.
        assert_eq!(worker.solution().unwrap()[1], Some(true));
        assert_model_satisfies(&worker, clauses);
        worker.check_invariants().unwrap();
    }

    #[test]
    fn implication_chain_is_unsat() {
        let mut worker = single_worker(&[&[1, 2], &[-1, 3], &[-2, 3], &[-3]]);
        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Unsat);
        assert!(!worker.is_ok());
    }

    #[test]
    fn pigeonhole_three_into_two_is_unsat() {
        let clauses = pigeonhole(3);
        let clause_refs: Vec<&[isize]> = clauses.iter().map(Vec::as_slice).collect();
        let mut worker = single_worker(&clause_refs);

        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Unsat);
        assert!(
            worker.num_conflicts() <= 6,
            "needed {} conflicts",
            worker.num_conflicts()
        );
    }

    #[test]
    fn almost_complete_three_sat_is_sat() {
        let clauses: &[&[isize]] = &[
            &[1, 2, 3],
            &[-1, 2, 3],
            &[1, -2, 3],
            &[1, 2, -3],
            &[-1, -2, 3],
            &[-1, 2, -3],
            &[1, -2, -3],
        ];
        let mut worker = single_worker(clauses);
        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Sat);
        // The all-true assignment is the unique model.
        assert_eq!(
            worker.solution().unwrap(),
            &[Some(true), Some(true), Some(true)]
        );
        assert_model_satisfies(&worker, clauses);
        worker.check_invariants().unwrap();
    }

    #[test]
    fn assumption_conflict_reports_conflict_set() {
        let mut worker = single_worker(&[&[1, 2], &[-2]]);
        let result = worker.solve(&assumptions(&[-1]), u64::MAX).unwrap();

        assert_eq!(result, SolveResult::Unsat);
        assert!(!worker.conflict().is_empty());
        for &lit in worker.conflict() {
            assert!(lit.index() < 2, "conflict literal {lit} outside formula");
        }
        // Unsatisfiability depended on the assumptions, so the engine stays
        // usable and the formula itself is satisfiable.
        assert!(worker.is_ok());
        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Sat);
    }

    #[test]
    fn failed_assumption_behind_propagation() {
        let mut worker = single_worker(&[&[-1, 2]]);
        let result = worker.solve(&assumptions(&[1, -2]), u64::MAX).unwrap();

        assert_eq!(result, SolveResult::Unsat);
        let mut conflict = worker.conflict().to_vec();
        conflict.sort_unstable();
        assert_eq!(conflict, assumptions(&[-1, 2]));
    }

    #[test]
    fn satisfied_assumptions_solve_through() {
        let clauses: &[&[isize]] = &[&[1, 2], &[-1, 3]];
        let mut worker = single_worker(clauses);
        let result = worker.solve(&assumptions(&[1, 3]), u64::MAX).unwrap();
        assert_eq!(result, SolveResult::Sat);
        let model = worker.solution().unwrap();
        assert_eq!(model[0], Some(true));
        assert_eq!(model[2], Some(true));
    }

    #[test]
    fn interrupt_yields_unknown() {
        let clauses = pigeonhole(3);
        let clause_refs: Vec<&[isize]> = clauses.iter().map(Vec::as_slice).collect();
        let mut worker = single_worker(&clause_refs);

        worker.set_need_to_interrupt();
        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Unknown);
        assert_eq!(worker.num_conflicts(), 0);
    }

    #[test]
    fn cleanup_rounds_run_during_solve() {
        let clauses = pigeonhole(4);
        let clause_refs: Vec<&[isize]> = clauses.iter().map(Vec::as_slice).collect();
        // A tiny cleanup step forces barrier rounds between restarts.
        let controller = Arc::new(Controller::new(problem(&clause_refs), 1, 2));
        let mut worker = Worker::new(controller, Config::default()).unwrap();

        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Unsat);
        worker.check_invariants().unwrap();
    }

    #[test]
    fn invariants_hold_after_search() {
        let clauses = pigeonhole(4);
        let clause_refs: Vec<&[isize]> = clauses.iter().map(Vec::as_slice).collect();
        let mut worker = single_worker(&clause_refs);

        assert_eq!(worker.solve(&[], u64::MAX).unwrap(), SolveResult::Unsat);
        worker.check_invariants().unwrap();
    }

    #[test]
    fn two_workers_agree_and_exchange() {
        let clauses = pigeonhole(4);
        let clause_refs: Vec<&[isize]> = clauses.iter().map(Vec::as_slice).collect();
        let controller = Arc::new(Controller::new(problem(&clause_refs), 2, 1 << 40));

        let workers: Vec<Worker> = (0..2)
            .map(|index| {
                let config = Config {
                    seed: 7 + index as u64,
                    ..Config::default()
                };
                Worker::new(Arc::clone(&controller), config).unwrap()
            })
            .collect();

        let results = std::thread::scope(|scope| {
            let handles: Vec<_> = workers
                .into_iter()
                .map(|mut worker| {
                    scope.spawn(move || {
                        let result = worker.solve(&[], u64::MAX).unwrap();
                        (result, worker.num_conflicts())
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| handle.join().unwrap())
                .collect::<Vec<_>>()
        });

        for (result, _) in &results {
            assert_eq!(*result, SolveResult::Unsat);
        }
    }
}
