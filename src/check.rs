//! Structural invariant checks.
//!
//! Used by the test suite to validate an engine after arbitrary operation
//! sequences. Production code never calls these; internal invariants are
//! guarded by debug assertions at the point of use instead.

use std::collections::HashMap;

use crate::{
    arena::ClauseRef,
    lit::{Lit, Var},
    watch::Watcher,
    worker::Worker,
};

impl Worker {
    /// Verifies the engine's structural invariants.
    ///
    /// Checks the trail against the assignment map, watch placement of every
    /// attached long clause, and, when propagation is quiescent, that no
    /// attached clause is unit or falsified under the current assignment.
    pub fn check_invariants(&self) -> Result<(), String> {
        self.check_trail()?;
        self.check_watch_placement()?;
        if self.trail.fully_propagated() {
            self.check_clause_status()?;
        }
        Ok(())
    }

    /// Every assigned variable is on the trail exactly once, at a level no
    /// higher than the current one, and the level starts are monotone.
    fn check_trail(&self) -> Result<(), String> {
        let var_count = self.trail.values.var_count();
        let mut on_trail = vec![false; var_count];

        for &lit in self.trail.lits() {
            if !self.trail.values.is_true(lit) {
                return Err(format!("trail literal {lit} is not assigned true"));
            }
            if std::mem::replace(&mut on_trail[lit.index()], true) {
                return Err(format!("variable {} appears twice on the trail", lit.var()));
            }
            if self.trail.level(lit.var()) > self.trail.decision_level() {
                return Err(format!("literal {lit} above the current decision level"));
            }
        }

        for index in 0..var_count {
            let var = Var::from_index(index);
            if self.trail.values.is_assigned(var) && !on_trail[index] {
                return Err(format!("assigned variable {var} is missing from the trail"));
            }
        }

        let mut previous = 0;
        for level in 1..=self.trail.decision_level() {
            let start = self.trail.level_start(level);
            if start < previous || start > self.trail.len() {
                return Err(format!("level start of level {level} out of order"));
            }
            previous = start;
        }

        Ok(())
    }

    /// Each live long clause is watched through its first two literals in
    /// exactly the two matching watch lists, and nowhere else.
    fn check_watch_placement(&self) -> Result<(), String> {
        let mut watched_in: HashMap<ClauseRef, Vec<Lit>> = HashMap::new();
        let var_count = self.trail.values.var_count();
        for code in 0..var_count * 2 {
            let lit = Lit::from_code(code);
            for watcher in self.watches.for_lit(lit) {
                if let Watcher::Long { clause, .. } = watcher {
                    watched_in.entry(*clause).or_default().push(lit);
                }
            }
        }

        let mut cursor = None;
        while let Some(clause) = self.arena.next_clause(&mut cursor) {
            let lits = self.arena.lits(clause);
            let mut expected = [!lits[0], !lits[1]];
            expected.sort_unstable();
            let mut actual = watched_in.remove(&clause).unwrap_or_default();
            actual.sort_unstable();
            if actual != expected {
                return Err(format!(
                    "clause {lits:?} watched in {actual:?}, expected {expected:?}"
                ));
            }
        }

        if let Some((clause, lists)) = watched_in.into_iter().next() {
            return Err(format!(
                "watchers for unknown or deleted clause {clause:?} in {lists:?}"
            ));
        }

        Ok(())
    }

    /// After propagation without conflict, every attached clause has a true
    /// literal or at least two unassigned literals.
    fn check_clause_status(&self) -> Result<(), String> {
        let status_ok = |lits: &[Lit]| {
            let satisfied = lits.iter().any(|&lit| self.trail.values.is_true(lit));
            let unassigned = lits
                .iter()
                .filter(|lit| !self.trail.values.is_assigned(lit.var()))
                .count();
            satisfied || unassigned >= 2
        };

        let mut cursor = None;
        while let Some(clause) = self.arena.next_clause(&mut cursor) {
            let lits = self.arena.lits(clause);
            if !status_ok(lits) {
                return Err(format!("long clause {lits:?} is unit or falsified"));
            }
        }

        let var_count = self.trail.values.var_count();
        for code in 0..var_count * 2 {
            let lit = Lit::from_code(code);
            for watcher in self.watches.for_lit(lit) {
                let ok = match *watcher {
                    Watcher::Binary { other, .. } => status_ok(&[!lit, other]),
                    Watcher::Ternary { a, b } => status_ok(&[!lit, a, b]),
                    Watcher::Long { .. } => true,
                };
                if !ok {
                    return Err(format!(
                        "inline clause watched by {lit} is unit or falsified"
                    ));
                }
            }
        }

        Ok(())
    }
}
