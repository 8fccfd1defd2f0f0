//! The CDCL search loop.
//!
//! One search round runs decide/propagate/analyse/backtrack until it finds a
//! verdict or until the restart policy or a pending cleanup point asks it to
//! return to the driver in [`Worker::solve`]. Assumptions occupy the first
//! decision levels; a falsified assumption terminates the search with a
//! conflict set over the assumptions.

use crate::{
    arena::ClauseHeader,
    lit::Lit,
    prop::{self, AddClauseError, Conflict},
    sync::Publish,
    trail::Reason,
    worker::{SolveResult, Worker},
};

/// Outcome of attempting one new decision.
pub(crate) enum Decision {
    /// A decision or assumption was enqueued; the search continues.
    Made,
    /// All decision variables are assigned: the assignment is a model.
    Sat,
    /// An assumption is falsified; the conflict set was recorded.
    Unsat,
}

impl Worker {
    /// Runs CDCL search until a verdict, a restart or a cleanup point.
    ///
    /// Returns [`SolveResult::Unknown`] after backtracking to level 0 when
    /// the search should be resumed by a later round.
    pub(crate) fn search(&mut self, max_confls: u64) -> Result<SolveResult, AddClauseError> {
        debug_assert!(self.ok);
        let mut stop_search = false;

        loop {
            let pre_propagation_len = self.trail.len();
            let conflict = prop::propagate(
                &mut self.trail,
                &mut self.watches,
                &mut self.arena,
                &mut self.stats,
            );
            if self.trail.decision_level() == 0 && self.trail.len() > pre_propagation_len {
                // Facts derived at level 0 hold globally; share them.
                self.broadcast_level0(pre_propagation_len);
            }

            if let Some(conflict) = conflict {
                if self.trail.decision_level() == 0 {
                    self.ok = false;
                    return Ok(SolveResult::Unsat);
                }
                self.handle_conflict(&conflict)?;
                if !self.install_incoming()? {
                    return Ok(SolveResult::Unsat);
                }
                if self.restarts.wants_restart(self.interrupted())
                    || self.stats.conflicts >= max_confls
                {
                    stop_search = true;
                }
            } else {
                // Quiescent: check for a pending restart or cleanup point
                // before committing to another decision.
                self.last_sum_conflicts = self.controller.sum_conflicts();
                if stop_search || self.last_sum_conflicts > self.controller.next_clean_limit() {
                    self.cancel_until(0);
                    return Ok(SolveResult::Unknown);
                }
                match self.new_decision() {
                    Decision::Made => {}
                    Decision::Sat => return Ok(SolveResult::Sat),
                    Decision::Unsat => return Ok(SolveResult::Unsat),
                }
            }
        }
    }

    /// Learns from a conflict, publishes and attaches the learnt clause and
    /// enqueues its asserting literal.
    fn handle_conflict(&mut self, conflict: &Conflict) -> Result<(), AddClauseError> {
        self.stats.conflicts += 1;

        let analysis = self.analyzer.analyze(
            conflict,
            &self.trail,
            &self.arena,
            &self.watches,
            self.controller.problem.impl_cache.as_ref(),
            &mut self.order,
            &mut self.stats,
        );
        let mut learnt = std::mem::take(&mut self.analyzer.learnt);
        let glue = analysis.glue.min(self.config.max_glue);

        let asserting = learnt[0];
        let flipped = asserting.is_positive() != self.phases.saved(asserting.var());
        self.restarts.on_conflict(glue, learnt.len(), flipped);

        self.cancel_until(analysis.backtrack_level);

        // All literals behind the asserting one are false now; order them by
        // assignment level so the best watch candidates come first.
        let trail = &self.trail;
        learnt[1..].sort_unstable_by_key(|&lit| std::cmp::Reverse(trail.level(lit.var())));

        let sum_conflicts = self.controller.count_conflict();
        self.last_sum_conflicts = sum_conflicts;
        let shared_id = self.controller.sync_and_publish(
            &mut self.sync,
            Some(Publish {
                lits: &learnt,
                glue,
                sum_conflicts,
            }),
        );

        match learnt[..] {
            [unit] => {
                debug_assert_eq!(analysis.backtrack_level, 0);
                self.trail.enqueue(unit, Reason::Unit);
            }
            [a, b] => {
                self.watches.attach_binary(a, b, true);
                self.trail.enqueue(a, Reason::Binary(b));
            }
            [a, b, c] => {
                self.watches.attach_ternary([a, b, c]);
                self.trail.enqueue(a, Reason::Ternary([b, c]));
            }
            _ => {
                let clause = self
                    .arena
                    .add_clause(ClauseHeader::new(true, glue), &learnt)?;
                self.watches.attach_long(clause, [learnt[0], learnt[1]]);
                if let Some(id) = shared_id {
                    self.shared_refs.insert(id, clause);
                }
                self.trail.enqueue(learnt[0], Reason::Long(clause));
            }
        }

        self.order.decay();
        self.analyzer.learnt = learnt;
        Ok(())
    }

    /// Enqueues the next assumption or a heuristic decision.
    pub(crate) fn new_decision(&mut self) -> Decision {
        while (self.trail.decision_level() as usize) < self.assumptions.len() {
            let assumption = self.assumptions[self.trail.decision_level() as usize];
            if self.trail.values.is_true(assumption) {
                // Already satisfied; open a dummy level so each assumption
                // keeps a level of its own.
                self.trail.new_decision_level();
            } else if self.trail.values.is_false(assumption) {
                self.conflict = self
                    .analyzer
                    .analyze_final(!assumption, &self.trail, &self.arena);
                return Decision::Unsat;
            } else {
                self.stats.decisions += 1;
                self.trail.new_decision_level();
                self.trail.enqueue(assumption, Reason::Decision);
                return Decision::Made;
            }
        }

        self.stats.decisions += 1;
        match self.pick_branch_lit() {
            None => Decision::Sat,
            Some(lit) => {
                debug_assert!(!self.trail.values.is_assigned(lit.var()));
                tracing::trace!(?lit, "decision");
                self.trail.new_decision_level();
                self.trail.enqueue(lit, Reason::Decision);
                Decision::Made
            }
        }
    }

    /// Picks the next decision literal, or `None` when every decision
    /// variable is assigned.
    fn pick_branch_lit(&mut self) -> Option<Lit> {
        use rand::Rng;

        let mut next = None;

        // An occasional uniform pick escapes stale activity scores.
        if self.rng.gen_bool(self.config.random_var_freq) {
            if let Some(var) = self.order.random(&mut self.rng) {
                if !self.trail.values.is_assigned(var) && self.eligible(var) {
                    self.stats.rnd_decisions += 1;
                    next = Some(var);
                }
            }
        }

        // Activity-guided pick with lazy filtering of stale heap entries.
        while next.is_none() {
            let var = self.order.pop_max()?;
            if !self.trail.values.is_assigned(var) && self.eligible(var) {
                next = Some(var);
            }
        }
        let var = next.expect("loop above only exits with a variable");
        let mut lit = self.phases.decide_phase(var);

        // Half of the time, prefer a literal known to dominate the choice.
        if let Some(dominating) = self.controller.problem.lit_reachable[lit.code()] {
            if dominating != lit
                && !self.trail.values.is_assigned(dominating.var())
                && self.eligible(dominating.var())
                && self.rng.gen_bool(0.5)
            {
                // The reachability map may be stale, so the original choice
                // goes back on the heap.
                self.order.insert(var);
                lit = dominating;
            }
        }
        Some(lit)
    }
}
