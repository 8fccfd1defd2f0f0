//! Variable activity and phase saving for the decision heuristic.
//!
//! Activities follow the exponential VSIDS scheme: every variable touched by
//! conflict analysis is bumped by a global increment, and after every
//! conflict the increment grows by the inverse decay factor. Once any value
//! threatens to overflow the floating point range, all activities and the
//! increment are rescaled together; only relative order matters.

use crate::{
    heap::OrderHeap,
    lit::{Lit, Var},
};

const RESCALE_LIMIT: f64 = 1e100;
const RESCALE_FACTOR: f64 = 1e-100;

/// Activity-ordered variable queue with lazy filtering.
///
/// The heap always holds a superset of the unassigned decision variables:
/// variables are re-inserted eagerly on backtracking but removed lazily when
/// popped, so entries may refer to variables that are assigned or not
/// eligible for decisions.
pub struct VarOrder {
    heap: OrderHeap,
    activity: Vec<f64>,
    var_inc: f64,
    var_decay: f64,
}

impl VarOrder {
    /// Creates an order with the given per-conflict decay factor.
    pub fn new(var_decay: f64) -> Self {
        assert!(var_decay > 0.0 && var_decay < 1.0);
        VarOrder {
            heap: OrderHeap::default(),
            activity: vec![],
            var_inc: 1.0,
            var_decay,
        }
    }

    /// Grows the tables, enqueuing the new variables.
    pub fn resize(&mut self, var_count: usize) {
        let old = self.activity.len();
        self.activity.resize(var_count, 0.0);
        self.heap.resize(var_count);
        for index in old..var_count {
            self.heap.insert(Var::from_index(index), &self.activity);
        }
    }

    /// Increases a variable's activity by the current increment.
    pub fn bump(&mut self, var: Var) {
        self.activity[var.index()] += self.var_inc;
        if self.activity[var.index()] > RESCALE_LIMIT {
            self.rescale();
        }
        self.heap.increased(var, &self.activity);
    }

    /// Decays all activities by growing the increment.
    pub fn decay(&mut self) {
        self.var_inc /= self.var_decay;
        if self.var_inc > RESCALE_LIMIT {
            self.rescale();
        }
    }

    /// Re-inserts a variable after it was unassigned.
    pub fn insert(&mut self, var: Var) {
        self.heap.insert(var, &self.activity);
    }

    /// Removes and returns the variable with the highest activity.
    ///
    /// The result may be assigned or not decision-eligible; the caller
    /// filters and keeps popping.
    pub fn pop_max(&mut self) -> Option<Var> {
        self.heap.pop_max(&self.activity)
    }

    /// A variable at a uniformly random heap slot, if the heap is non-empty.
    ///
    /// The variable is not removed.
    pub fn random(&self, rng: &mut impl rand::Rng) -> Option<Var> {
        if self.heap.is_empty() {
            None
        } else {
            Some(self.heap.nth(rng.gen_range(0..self.heap.len())))
        }
    }

    /// Number of variables currently queued.
    pub fn queued(&self) -> usize {
        self.heap.len()
    }

    fn rescale(&mut self) {
        for activity in &mut self.activity {
            *activity *= RESCALE_FACTOR;
        }
        self.var_inc *= RESCALE_FACTOR;
    }
}

/// Saved polarities for phase saving.
///
/// The phase of a variable is recorded when its assignment is undone, so
/// that a later decision on the same variable re-enters the subtree the
/// search left.
#[derive(Default)]
pub struct Phases {
    saved: Vec<bool>,
}

impl Phases {
    /// Grows the table; new variables start with the negative phase.
    pub fn resize(&mut self, var_count: usize) {
        self.saved.resize(var_count, false);
    }

    /// Records the current polarity of a literal being unassigned.
    pub fn save(&mut self, lit: Lit) {
        self.saved[lit.index()] = lit.is_positive();
    }

    /// The saved polarity of a variable.
    pub fn saved(&self, var: Var) -> bool {
        self.saved[var.index()]
    }

    /// The decision literal for a variable under phase saving.
    pub fn decide_phase(&self, var: Var) -> Lit {
        Lit::from_var(var, self.saved[var.index()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_and_pop_order() {
        let mut order = VarOrder::new(0.95);
        order.resize(4);

        order.bump(Var::from_index(2));
        order.decay();
        order.bump(Var::from_index(1));

        // The later bump used a larger increment.
        assert_eq!(order.pop_max(), Some(Var::from_index(1)));
        assert_eq!(order.pop_max(), Some(Var::from_index(2)));
    }

    #[test]
    fn rescale_preserves_order() {
        let mut order = VarOrder::new(0.5);
        order.resize(3);

        // Drive the increment towards the rescale limit.
        for _ in 0..400 {
            order.decay();
        }
        order.bump(Var::from_index(0));
        for _ in 0..100 {
            order.decay();
        }
        order.bump(Var::from_index(2));

        assert!(order.activity.iter().all(|&a| a <= RESCALE_LIMIT));
        assert_eq!(order.pop_max(), Some(Var::from_index(2)));
        assert_eq!(order.pop_max(), Some(Var::from_index(0)));
        assert_eq!(order.pop_max(), Some(Var::from_index(1)));
    }

    #[test]
    fn phases_round_trip() {
        let mut phases = Phases::default();
        phases.resize(2);

        assert_eq!(phases.decide_phase(Var::from_index(0)), Lit::from_index(0, false));
        phases.save(Lit::from_index(0, true));
        assert_eq!(phases.decide_phase(Var::from_index(0)), Lit::from_index(0, true));
        assert!(phases.saved(Var::from_index(0)));
    }
}
