//! Conflict analysis.
//!
//! Derives a first-UIP clause from a conflict by walking the trail backwards
//! and resolving against reasons until exactly one literal of the current
//! decision level remains. The derived clause is optionally shortened by
//! self-subsuming resolution against binary and ternary clauses found in the
//! watch lists and against cached implications, when an implication cache is
//! available. A separate walk expresses a final conflict in terms of the
//! assumptions that entail it.

use crate::{
    arena::ClauseArena,
    decision::VarOrder,
    lit::{Lit, Var},
    prop::Conflict,
    stats::Stats,
    sync::ImplCache,
    trail::{Level, Reason, Trail},
    watch::{Watcher, Watches},
};

/// Result of analysing a conflict.
///
/// The learnt clause itself is left in [`Analyzer::learnt`] with the
/// asserting literal at position 0 and a literal of the backtrack level at
/// position 1.
pub struct Analysis {
    /// Deepest level at which the learnt clause asserts its first literal.
    pub backtrack_level: Level,
    /// Number of distinct decision levels among the learnt literals.
    pub glue: u32,
}

/// Scratch state for conflict analysis.
#[derive(Default)]
pub struct Analyzer {
    /// Variables currently part of the resolution front or the learnt
    /// clause.
    seen_var: Vec<bool>,
    /// Marked variables pending cleanup.
    to_clear: Vec<Var>,
    /// Per-literal marks used by the minimisation pass.
    seen_lit: Vec<bool>,
    /// Per-level marks used for glue computation.
    level_seen: Vec<bool>,
    /// The clause derived by the most recent [`analyze`](Analyzer::analyze)
    /// call.
    pub learnt: Vec<Lit>,
}

impl Analyzer {
    /// Grows the scratch tables to cover the given number of variables.
    pub fn resize(&mut self, var_count: usize) {
        self.seen_var.resize(var_count, false);
        self.seen_lit.resize(var_count * 2, false);
    }

    /// Analyses a conflict, leaving the learnt clause in `self.learnt`.
    ///
    /// Every variable on the conflict side gets its activity bumped. Calling
    /// this at decision level 0 is a programming error.
    #[allow(clippy::too_many_arguments)]
    pub fn analyze(
        &mut self,
        conflict: &Conflict,
        trail: &Trail,
        arena: &ClauseArena,
        watches: &Watches,
        impl_cache: Option<&ImplCache>,
        order: &mut VarOrder,
        stats: &mut Stats,
    ) -> Analysis {
        assert!(trail.decision_level() > 0, "conflict analysis at level 0");

        let current_level = trail.decision_level();
        let mut path_count = 0usize;

        self.learnt.clear();
        // Slot 0 is reserved for the asserting literal.
        self.learnt.push(conflict.lits(arena)[0]);

        for &lit in conflict.lits(arena) {
            self.mark(lit, trail, order, current_level, &mut path_count);
        }

        // Resolve the conflict backwards along the trail until a single
        // literal of the current level remains; that literal is the first
        // unique implication point.
        let mut index = trail.len();
        let uip = loop {
            let lit = loop {
                index -= 1;
                let lit = trail.lits()[index];
                if self.seen_var[lit.index()] {
                    break lit;
                }
            };
            self.seen_var[lit.index()] = false;
            path_count -= 1;
            if path_count == 0 {
                break lit;
            }
            for &reason_lit in trail.reason(lit.var()).lits(arena) {
                self.mark(reason_lit, trail, order, current_level, &mut path_count);
            }
        };
        self.learnt[0] = !uip;

        stats.max_literals += self.learnt.len() as u64;

        if impl_cache.is_some() && self.learnt.len() > 1 {
            self.minimise(watches, impl_cache, stats);
        }
        stats.tot_literals += self.learnt.len() as u64;

        for var in self.to_clear.drain(..) {
            self.seen_var[var.index()] = false;
        }

        let glue = compute_glue(&mut self.level_seen, &self.learnt, trail);

        // Choose the backtrack level and move a literal of that level into
        // position 1, so the clause keeps its watches consistent after
        // backtracking. On equal levels the earlier literal stays in place.
        let backtrack_level = if self.learnt.len() == 1 {
            0
        } else {
            let mut max_i = 1;
            for i in 2..self.learnt.len() {
                if trail.level(self.learnt[i].var()) > trail.level(self.learnt[max_i].var()) {
                    max_i = i;
                }
            }
            self.learnt.swap(1, max_i);
            trail.level(self.learnt[1].var())
        };

        tracing::trace!(learnt = ?self.learnt, backtrack_level, glue, "analyzed conflict");

        Analysis {
            backtrack_level,
            glue,
        }
    }

    /// Adds a literal to the resolution front or the learnt clause.
    ///
    /// Literals assigned at level 0 are always false and resolve away
    /// against their implying facts, so they are dropped outright.
    fn mark(
        &mut self,
        lit: Lit,
        trail: &Trail,
        order: &mut VarOrder,
        current_level: Level,
        path_count: &mut usize,
    ) {
        let var = lit.var();
        let level = trail.level(var);
        if level == 0 || self.seen_var[var.index()] {
            return;
        }
        order.bump(var);
        self.seen_var[var.index()] = true;
        self.to_clear.push(var);
        if level == current_level {
            *path_count += 1;
        } else {
            self.learnt.push(lit);
        }
    }

    /// Removes learnt literals that are redundant by self-subsuming
    /// resolution with binary and ternary clauses or cached implications.
    fn minimise(
        &mut self,
        watches: &Watches,
        impl_cache: Option<&ImplCache>,
        stats: &mut Stats,
    ) {
        for &lit in &self.learnt {
            self.seen_lit[lit.code()] = true;
        }

        for i in 0..self.learnt.len() {
            let lit = self.learnt[i];
            if !self.seen_lit[lit.code()] {
                continue;
            }

            if let Some(cache) = impl_cache {
                // `implied` holds literals entailed by `!lit`; any of their
                // negations alongside `lit` is redundant.
                for &implied in cache.implied(lit) {
                    self.seen_lit[(!implied).code()] = false;
                }
            }

            // Watchers triggered by `!lit` belong to clauses containing
            // `lit`.
            for &watcher in watches.for_lit(!lit) {
                match watcher {
                    Watcher::Binary { other, .. } => {
                        self.seen_lit[(!other).code()] = false;
                    }
                    Watcher::Ternary { a, b } => {
                        if self.seen_lit[a.code()] {
                            self.seen_lit[(!b).code()] = false;
                        }
                        if self.seen_lit[b.code()] {
                            self.seen_lit[(!a).code()] = false;
                        }
                    }
                    Watcher::Long { .. } => {}
                }
            }
        }

        // The asserting literal is never removed.
        self.seen_lit[self.learnt[0].code()] = true;

        let before = self.learnt.len();
        let seen_lit = &mut self.seen_lit;
        self.learnt.retain(|&lit| {
            let keep = seen_lit[lit.code()];
            seen_lit[lit.code()] = false;
            keep
        });

        let removed = (before - self.learnt.len()) as u64;
        stats.shrunk_clauses += (removed > 0) as u64;
        stats.shrunk_literals += removed;
    }

    /// Expresses a conflict on `failing` as a set of assumption literals.
    ///
    /// Walks the trail from the tip down to the first decision, collecting
    /// the negations of all assumptions the failing literal transitively
    /// depends on. At decision level 0 the conflict needs no assumptions and
    /// only the failing literal itself is reported.
    pub fn analyze_final(&mut self, failing: Lit, trail: &Trail, arena: &ClauseArena) -> Vec<Lit> {
        let mut out = vec![failing];
        if trail.decision_level() == 0 {
            return out;
        }

        self.seen_var[failing.index()] = true;
        let mut marked = 1usize;

        let start = trail.level_start(1);
        for &lit in trail.lits()[start..].iter().rev() {
            let var = lit.var();
            if !self.seen_var[var.index()] {
                continue;
            }
            self.seen_var[var.index()] = false;
            marked -= 1;
            match trail.reason(var) {
                // A decision above level 0 during assumption handling is an
                // assumption.
                Reason::Decision => out.push(!lit),
                reason => {
                    for &reason_lit in reason.lits(arena) {
                        let reason_var = reason_lit.var();
                        if trail.level(reason_var) > 0 && !self.seen_var[reason_var.index()] {
                            self.seen_var[reason_var.index()] = true;
                            marked += 1;
                        }
                    }
                }
            }
            if marked == 0 {
                break;
            }
        }

        // The failing literal may sit at level 0, in which case the walk
        // never visited it.
        self.seen_var[failing.index()] = false;

        out
    }
}

/// Computes the number of distinct decision levels among `lits`.
fn compute_glue(level_seen: &mut Vec<bool>, lits: &[Lit], trail: &Trail) -> u32 {
    if level_seen.len() <= trail.decision_level() as usize {
        level_seen.resize(trail.decision_level() as usize + 1, false);
    }

    let mut glue = 0;
    for &lit in lits {
        let level = trail.level(lit.var()) as usize;
        if !std::mem::replace(&mut level_seen[level], true) {
            glue += 1;
        }
    }
    for &lit in lits {
        level_seen[trail.level(lit.var()) as usize] = false;
    }
    glue
}
