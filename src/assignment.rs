//! A partial assignment to Boolean variables.

use crate::lit::{Lit, Var};

/// Code stored for a variable that has no assigned value.
const UNASSIGNED: u8 = 2;

/// A partial assignment to Boolean variables.
///
/// Each variable is unassigned or assigned a Boolean value. Stored as one
/// byte per variable holding the sign of the satisfied literal, so that
/// checking a literal against the assignment is a single compare.
#[derive(Default)]
pub struct Assignment {
    values: Vec<u8>,
}

impl Assignment {
    /// Assigns `true` to the given literal.
    ///
    /// A variable is assigned `false` by assigning `true` to the negated
    /// literal.
    #[inline]
    pub fn assign(&mut self, lit: Lit) {
        debug_assert!(!self.is_assigned(lit.var()));
        self.values[lit.index()] = lit.is_positive() as u8;
    }

    /// Removes the assigned value from a variable.
    #[inline]
    pub fn unassign(&mut self, var: Var) {
        self.values[var.index()] = UNASSIGNED;
    }

    /// Returns `true` if the literal is assigned `true`.
    #[inline]
    pub fn is_true(&self, lit: Lit) -> bool {
        self.values[lit.index()] == lit.is_positive() as u8
    }

    /// Returns `true` if the literal is assigned `false`.
    #[inline]
    pub fn is_false(&self, lit: Lit) -> bool {
        self.values[lit.index()] == lit.is_negative() as u8
    }

    /// Returns whether the variable has an assigned value.
    #[inline]
    pub fn is_assigned(&self, var: Var) -> bool {
        self.values[var.index()] != UNASSIGNED
    }

    /// Returns the value assigned to a variable, if any.
    #[inline]
    pub fn value(&self, var: Var) -> Option<bool> {
        match self.values[var.index()] {
            UNASSIGNED => None,
            value => Some(value != 0),
        }
    }

    /// Number of variables covered by this assignment.
    pub fn var_count(&self) -> usize {
        self.values.len()
    }

    /// Grows the assignment to cover the given number of variables.
    pub fn resize(&mut self, var_count: usize) {
        self.values.resize(var_count, UNASSIGNED);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_and_query() {
        let mut values = Assignment::default();
        values.resize(3);

        let a = Lit::from_dimacs(1);
        let b = Lit::from_dimacs(-2);

        values.assign(a);
        values.assign(b);

        assert!(values.is_true(a));
        assert!(values.is_false(!a));
        assert!(values.is_true(b));
        assert!(values.is_false(!b));
        assert_eq!(values.value(a.var()), Some(true));
        assert_eq!(values.value(b.var()), Some(false));
        assert_eq!(values.value(Var::from_dimacs(3)), None);
        assert!(!values.is_assigned(Var::from_dimacs(3)));

        values.unassign(a.var());
        assert!(!values.is_assigned(a.var()));
        assert!(!values.is_true(a));
        assert!(!values.is_false(a));
    }
}
