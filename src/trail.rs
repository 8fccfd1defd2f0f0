//! The trail of assigned literals and the implication graph.
//!
//! The trail records every assignment in chronological order, partitioned
//! into decision levels. Each assigned variable stores the level it was
//! assigned at and the reason that forced it, which together form the
//! implication graph walked during conflict analysis.

use crate::{
    arena::{ClauseArena, ClauseRef, GcMap},
    assignment::Assignment,
    lit::{Lit, LitIdx, Var},
};

/// A decision level.
///
/// Level 0 holds unconditional assignments; the `n`-th decision or assumption
/// opens level `n`.
pub type Level = LitIdx;

/// The reason for an assignment; the edges of the implication graph.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Reason {
    /// Assigned as a decision or as an assumption.
    Decision,
    /// Implied by a unit clause.
    Unit,
    /// Implied by a binary clause because the stored literal is false.
    Binary(Lit),
    /// Implied by a ternary clause because both stored literals are false.
    Ternary([Lit; 2]),
    /// Implied by a long clause because all literals but its first are false.
    Long(ClauseRef),
}

impl Reason {
    /// Returns the falsified literals that caused the propagation.
    pub fn lits<'a>(&'a self, arena: &'a ClauseArena) -> &'a [Lit] {
        match self {
            Reason::Decision | Reason::Unit => &[],
            Reason::Binary(lit) => std::slice::from_ref(lit),
            Reason::Ternary(lits) => lits,
            // Propagation keeps the implied literal at position 0, so the
            // falsified literals are contiguous from position 1.
            Reason::Long(clause) => &arena.lits(*clause)[1..],
        }
    }
}

/// Level and reason of an assigned variable.
///
/// Only meaningful while the variable is assigned.
#[derive(Copy, Clone)]
pub struct VarData {
    /// Decision level of the assignment.
    pub level: Level,
    /// Clause (or decision) that forced the assignment.
    pub reason: Reason,
}

/// Callbacks to synchronize other solver state with backtracking.
pub trait BacktrackCallbacks {
    /// Called for each undone assignment `lit`.
    fn unassign(&mut self, _lit: Lit) {}
}

impl BacktrackCallbacks for () {}

/// The ordered sequence of assigned literals together with the assignment
/// map and per-variable assignment data.
#[derive(Default)]
pub struct Trail {
    /// Current values of all variables.
    pub values: Assignment,

    /// Assigned literals in assignment order.
    steps: Vec<Lit>,

    /// For each decision level `l > 0`, the trail length at which it began.
    limits: Vec<LitIdx>,

    /// Propagation cursor: literals at `steps[head..]` are assigned but not
    /// yet propagated.
    head: usize,

    /// Level and reason per variable, valid while assigned.
    var_data: Vec<VarData>,
}

impl Trail {
    /// Grows the trail to cover the given number of variables.
    pub fn resize(&mut self, var_count: usize) {
        self.values.resize(var_count);
        self.var_data.resize(
            var_count,
            VarData {
                level: 0,
                reason: Reason::Unit,
            },
        );
    }

    /// The current decision level.
    pub fn decision_level(&self) -> Level {
        self.limits.len() as Level
    }

    /// Number of assigned literals.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no literal is assigned.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The assigned literals in assignment order.
    pub fn lits(&self) -> &[Lit] {
        &self.steps
    }

    /// Trail index at which the given decision level began.
    ///
    /// Panics for level 0, which starts at index 0 by definition.
    pub fn level_start(&self, level: Level) -> usize {
        self.limits[level as usize - 1] as usize
    }

    /// Level and reason of an assigned variable.
    pub fn var_data(&self, var: Var) -> &VarData {
        debug_assert!(self.values.is_assigned(var));
        &self.var_data[var.index()]
    }

    /// Decision level of an assigned variable.
    pub fn level(&self, var: Var) -> Level {
        self.var_data(var).level
    }

    /// Reason of an assigned variable.
    pub fn reason(&self, var: Var) -> Reason {
        self.var_data(var).reason
    }

    /// Assigns a literal and appends it to the trail.
    ///
    /// This is the only routine that grows the trail. The literal must be
    /// unassigned; enqueuing an already assigned literal is a programming
    /// error upstream.
    pub fn enqueue(&mut self, lit: Lit, reason: Reason) {
        self.values.assign(lit);
        self.var_data[lit.index()] = VarData {
            level: self.decision_level(),
            reason,
        };
        self.steps.push(lit);
    }

    /// Opens a new decision level.
    pub fn new_decision_level(&mut self) {
        self.limits.push(self.steps.len() as LitIdx);
    }

    /// Reverts the trail to the given decision level.
    ///
    /// Undoes all assignments of higher levels in reverse assignment order,
    /// reporting each to `callbacks`, then resets the propagation cursor to
    /// the new trail end. No-op when already at or below the target level.
    pub fn cancel_until(&mut self, level: Level, callbacks: &mut impl BacktrackCallbacks) {
        if self.decision_level() <= level {
            return;
        }
        let target = self.limits[level as usize] as usize;
        for &lit in self.steps[target..].iter().rev() {
            callbacks.unassign(lit);
            self.values.unassign(lit.var());
        }
        self.steps.truncate(target);
        self.limits.truncate(level as usize);
        self.head = target;
    }

    /// Takes the next assigned but not yet propagated literal, advancing the
    /// propagation cursor.
    pub fn pop_unpropagated(&mut self) -> Option<Lit> {
        let lit = self.steps.get(self.head).copied();
        self.head += lit.is_some() as usize;
        lit
    }

    /// Whether every assigned literal has been propagated.
    pub fn fully_propagated(&self) -> bool {
        self.head == self.steps.len()
    }

    /// Updates reason references to long clauses after garbage collection.
    pub fn update_reasons(&mut self, gc_map: &GcMap) {
        for &lit in &self.steps {
            if let Reason::Long(clause) = self.var_data[lit.index()].reason {
                self.var_data[lit.index()].reason = Reason::Long(
                    gc_map
                        .update(clause)
                        .expect("reason clause deleted while assigned"),
                );
            }
        }
    }
}
