//! Watch lists for unit propagation.
//!
//! `watches[l]` holds the watchers that must be visited when `l` becomes
//! true, i.e. when `!l` becomes false. Binary and ternary clauses are stored
//! inline in their watchers and have no separate clause record; long clauses
//! are watched on their first two literals and carry a blocking literal used
//! to skip dereferencing satisfied clauses.

use crate::{
    arena::{ClauseRef, GcMap},
    lit::Lit,
};

/// A single entry of a watch list.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Watcher {
    /// A binary clause, stored entirely inline.
    Binary {
        /// The other literal of the clause.
        other: Lit,
        /// Whether the clause was learnt.
        redundant: bool,
    },
    /// A ternary clause, stored entirely inline.
    Ternary {
        /// One of the two other literals of the clause.
        a: Lit,
        /// The remaining literal of the clause.
        b: Lit,
    },
    /// A long clause stored in the arena.
    Long {
        /// The watched clause.
        clause: ClauseRef,
        /// A cached literal of the clause; when true the clause is satisfied
        /// and need not be read from memory.
        blocker: Lit,
    },
}

/// Per-literal lists of watchers.
#[derive(Default)]
pub struct Watches {
    by_lit: Vec<Vec<Watcher>>,
}

impl Watches {
    /// Grows the watch lists to cover the given number of variables.
    pub fn resize(&mut self, var_count: usize) {
        self.by_lit.resize_with(var_count * 2, Default::default);
    }

    /// The watchers triggered when `lit` becomes true.
    pub fn for_lit(&self, lit: Lit) -> &[Watcher] {
        &self.by_lit[lit.code()]
    }

    /// Removes and returns the watch list for a literal.
    ///
    /// Used by the propagator to scan a list while moving entries into other
    /// lists; must be paired with [`restore`](Watches::restore).
    pub fn take(&mut self, lit: Lit) -> Vec<Watcher> {
        std::mem::take(&mut self.by_lit[lit.code()])
    }

    /// Puts back a watch list removed with [`take`](Watches::take).
    pub fn restore(&mut self, lit: Lit, watchers: Vec<Watcher>) {
        debug_assert!(self.by_lit[lit.code()].is_empty());
        self.by_lit[lit.code()] = watchers;
    }

    /// Appends a single watcher to a literal's list.
    pub fn push(&mut self, lit: Lit, watcher: Watcher) {
        self.by_lit[lit.code()].push(watcher);
    }

    /// Attaches a binary clause `{a, b}`.
    pub fn attach_binary(&mut self, a: Lit, b: Lit, redundant: bool) {
        self.push(!a, Watcher::Binary { other: b, redundant });
        self.push(!b, Watcher::Binary { other: a, redundant });
    }

    /// Detaches a binary clause `{a, b}`.
    pub fn detach_binary(&mut self, a: Lit, b: Lit) {
        self.remove(!a, |w| matches!(w, Watcher::Binary { other, .. } if other == b));
        self.remove(!b, |w| matches!(w, Watcher::Binary { other, .. } if other == a));
    }

    /// Attaches a ternary clause; each literal watches the other two.
    pub fn attach_ternary(&mut self, lits: [Lit; 3]) {
        for i in 0..3 {
            self.push(
                !lits[i],
                Watcher::Ternary {
                    a: lits[(i + 1) % 3],
                    b: lits[(i + 2) % 3],
                },
            );
        }
    }

    /// Detaches a ternary clause.
    pub fn detach_ternary(&mut self, lits: [Lit; 3]) {
        for i in 0..3 {
            let (a, b) = (lits[(i + 1) % 3], lits[(i + 2) % 3]);
            self.remove(!lits[i], |w| match w {
                Watcher::Ternary { a: x, b: y } => (x == a && y == b) || (x == b && y == a),
                _ => false,
            });
        }
    }

    /// Attaches a long clause watched on `watched[0]` and `watched[1]`.
    ///
    /// Each watcher uses the other watched literal as its initial blocker.
    pub fn attach_long(&mut self, clause: ClauseRef, watched: [Lit; 2]) {
        for i in 0..2 {
            self.push(
                !watched[i],
                Watcher::Long {
                    clause,
                    blocker: watched[i ^ 1],
                },
            );
        }
    }

    /// Detaches a long clause watched on `watched[0]` and `watched[1]`.
    pub fn detach_long(&mut self, clause: ClauseRef, watched: [Lit; 2]) {
        for &lit in &watched {
            self.remove(!lit, |w| matches!(w, Watcher::Long { clause: c, .. } if c == clause));
        }
    }

    /// Removes the first watcher in `lit`'s list matching the predicate.
    ///
    /// Preserves the order of the remaining entries so that a paired
    /// attach/detach restores the list exactly.
    fn remove(&mut self, lit: Lit, matches: impl Fn(Watcher) -> bool) {
        let list = &mut self.by_lit[lit.code()];
        let pos = list
            .iter()
            .position(|&w| matches(w))
            .expect("detach of a clause that is not attached");
        list.remove(pos);
    }

    /// Updates references to long clauses after garbage collection.
    ///
    /// Watchers of clauses deleted by the collection are dropped.
    pub fn update_clause_references(&mut self, gc_map: &GcMap) {
        for list in &mut self.by_lit {
            list.retain_mut(|watcher| match watcher {
                Watcher::Long { clause, .. } => match gc_map.update(*clause) {
                    Some(updated) => {
                        *clause = updated;
                        true
                    }
                    None => false,
                },
                _ => true,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{ClauseArena, ClauseHeader};

    macro_rules! lit {
        ($lit:literal) => {
            Lit::from_dimacs($lit)
        };
    }

    fn snapshot(watches: &Watches, var_count: usize) -> Vec<Vec<Watcher>> {
        (0..var_count * 2)
            .map(|code| watches.for_lit(Lit::from_code(code)).to_vec())
            .collect()
    }

    #[test]
    fn attach_detach_round_trip() {
        let mut watches = Watches::default();
        watches.resize(6);

        watches.attach_binary(lit!(1), lit!(-2), false);
        watches.attach_ternary([lit!(2), lit!(3), lit!(-4)]);

        let before = snapshot(&watches, 6);

        let mut arena = ClauseArena::default();
        let clause = arena
            .add_clause(
                ClauseHeader::default(),
                &[lit!(1), lit!(4), lit!(5), lit!(-6)],
            )
            .unwrap();
        watches.attach_long(clause, [lit!(1), lit!(4)]);
        watches.detach_long(clause, [lit!(1), lit!(4)]);

        assert_eq!(snapshot(&watches, 6), before);

        watches.detach_ternary([lit!(2), lit!(3), lit!(-4)]);
        watches.detach_binary(lit!(1), lit!(-2));

        assert!(snapshot(&watches, 6).iter().all(|list| list.is_empty()));
    }

    #[test]
    fn binary_watches_both_negations() {
        let mut watches = Watches::default();
        watches.resize(2);
        watches.attach_binary(lit!(1), lit!(2), true);

        assert_eq!(
            watches.for_lit(lit!(-1)),
            &[Watcher::Binary {
                other: lit!(2),
                redundant: true
            }]
        );
        assert_eq!(
            watches.for_lit(lit!(-2)),
            &[Watcher::Binary {
                other: lit!(1),
                redundant: true
            }]
        );
        assert!(watches.for_lit(lit!(1)).is_empty());
    }

    #[test]
    fn gc_update_drops_deleted_watchers() {
        let mut arena = ClauseArena::default();
        let mut watches = Watches::default();
        watches.resize(8);
        let drop = arena
            .add_clause(ClauseHeader::default(), &[lit!(5), lit!(6), lit!(7), lit!(8)])
            .unwrap();
        let keep = arena
            .add_clause(ClauseHeader::default(), &[lit!(1), lit!(2), lit!(3), lit!(4)])
            .unwrap();
        watches.attach_long(drop, [lit!(5), lit!(6)]);
        watches.attach_long(keep, [lit!(1), lit!(2)]);

        arena.delete_clause(drop);
        let map = arena.collect_garbage();
        watches.update_clause_references(&map);

        assert!(watches.for_lit(lit!(-5)).is_empty());
        assert!(watches.for_lit(lit!(-6)).is_empty());
        let moved = map.update(keep).unwrap();
        assert_eq!(
            watches.for_lit(lit!(-1)),
            &[Watcher::Long {
                clause: moved,
                blocker: lit!(2)
            }]
        );
    }
}
