//! Unit propagation over watched literals.
//!
//! Repeatedly extends the current assignment by every literal propagated by a
//! clause that became unit, until a fixpoint is reached or a clause is
//! falsified. Propagation runs straight-line to completion; incoming clauses
//! from other workers are only installed between propagation calls.

use thiserror::Error;

use crate::{
    arena::{ArenaSpaceExhausted, ClauseArena, ClauseHeader, ClauseRef},
    lit::Lit,
    stats::Stats,
    trail::{Reason, Trail},
    watch::{Watcher, Watches},
};

/// Reference to a falsified clause.
#[derive(Debug)]
pub enum Conflict {
    /// A falsified binary clause.
    Binary([Lit; 2]),
    /// A falsified ternary clause.
    Ternary([Lit; 3]),
    /// A falsified long clause.
    Long(ClauseRef),
}

impl Conflict {
    /// Returns the literals of the conflict clause.
    pub fn lits<'a>(&'a self, arena: &'a ClauseArena) -> &'a [Lit] {
        match self {
            Conflict::Binary(lits) => lits,
            Conflict::Ternary(lits) => lits,
            &Conflict::Long(clause) => arena.lits(clause),
        }
    }
}

/// Performs unit propagation until fixpoint or conflict.
pub fn propagate(
    trail: &mut Trail,
    watches: &mut Watches,
    arena: &mut ClauseArena,
    stats: &mut Stats,
) -> Option<Conflict> {
    while let Some(lit) = trail.pop_unpropagated() {
        if let Some(conflict) = propagate_literal(trail, watches, arena, stats, lit) {
            return Some(conflict);
        }
    }
    None
}

/// Visits all watchers triggered by `lit` becoming true.
fn propagate_literal(
    trail: &mut Trail,
    watches: &mut Watches,
    arena: &mut ClauseArena,
    stats: &mut Stats,
    lit: Lit,
) -> Option<Conflict> {
    // Clauses containing `!lit` may have become unit or falsified.
    let watched = !lit;

    let mut list = watches.take(lit);
    let mut conflict = None;

    let mut read = 0;
    let mut write = 0;
    'next_watcher: while read < list.len() {
        let watcher = list[read];
        read += 1;
        match watcher {
            Watcher::Binary { other, .. } => {
                // Binary watchers never move.
                list[write] = watcher;
                write += 1;
                if trail.values.is_true(other) {
                    continue;
                }
                if trail.values.is_false(other) {
                    conflict = Some(Conflict::Binary([watched, other]));
                    break;
                }
                stats.propagations += 1;
                trail.enqueue(other, Reason::Binary(watched));
            }
            Watcher::Ternary { a, b } => {
                // Ternary watchers never move either.
                list[write] = watcher;
                write += 1;
                if trail.values.is_true(a) || trail.values.is_true(b) {
                    continue;
                }
                let a_false = trail.values.is_false(a);
                let b_false = trail.values.is_false(b);
                if a_false && b_false {
                    conflict = Some(Conflict::Ternary([watched, a, b]));
                    break;
                } else if a_false {
                    stats.propagations += 1;
                    trail.enqueue(b, Reason::Ternary([watched, a]));
                } else if b_false {
                    stats.propagations += 1;
                    trail.enqueue(a, Reason::Ternary([watched, b]));
                }
                // Both undef: two non-false literals remain, nothing to do.
            }
            Watcher::Long { clause, blocker } => {
                if trail.values.is_true(blocker) {
                    list[write] = watcher;
                    write += 1;
                    continue;
                }
                let lits = arena.lits_mut(clause);
                if lits.is_empty() {
                    // Deleted but not yet collected; stop watching it.
                    continue;
                }

                // The watched literals sit at positions 0 and 1; make sure
                // the other watched literal is at position 0.
                if lits[0] == watched {
                    lits.swap(0, 1);
                }
                debug_assert_eq!(lits[1], watched);
                let first = lits[0];

                if trail.values.is_true(first) {
                    // Satisfied by the other watched literal; remember it as
                    // blocker to detect this cheaply next time.
                    list[write] = Watcher::Long {
                        clause,
                        blocker: first,
                    };
                    write += 1;
                    continue;
                }

                // Look for a non-false literal to promote into the vacated
                // watch slot.
                for pos in 2..lits.len() {
                    let candidate = lits[pos];
                    if !trail.values.is_false(candidate) {
                        lits[1] = candidate;
                        lits[pos] = watched;
                        watches.push(
                            !candidate,
                            Watcher::Long {
                                clause,
                                blocker: first,
                            },
                        );
                        continue 'next_watcher;
                    }
                }

                // Every literal but `first` is false.
                if trail.values.is_false(first) {
                    conflict = Some(Conflict::Long(clause));
                    list[write] = watcher;
                    write += 1;
                    break;
                }
                stats.propagations += 1;
                trail.enqueue(first, Reason::Long(clause));
                list[write] = Watcher::Long {
                    clause,
                    blocker: first,
                };
                write += 1;
            }
        }
    }

    // On a conflict the remaining watchers are kept untouched.
    while read < list.len() {
        list[write] = list[read];
        write += 1;
        read += 1;
    }
    list.truncate(write);
    watches.restore(lit, list);

    conflict
}

/// Reference to a clause added with [`add_clause_verbatim`].
pub enum AddedClause {
    /// The empty clause; the formula is unsatisfiable.
    Empty,
    /// A unit clause, enqueued as a fact (or a falsified unit, reported as
    /// [`AddedClause::Empty`]).
    Unit(Lit),
    /// An inline binary clause.
    Binary([Lit; 2]),
    /// An inline ternary clause.
    Ternary([Lit; 3]),
    /// A clause stored in the arena.
    Long(ClauseRef),
}

/// Errors while adding a clause to the engine.
#[derive(Debug, Error)]
pub enum AddClauseError {
    /// The clause arena ran out of address space.
    #[error(transparent)]
    ArenaSpace(#[from] ArenaSpaceExhausted),
}

/// Attaches a clause without reordering its literals.
///
/// Long clauses are watched on their first two literals; the caller is
/// responsible for choosing an order that maintains the watch invariants
/// under the current assignment. Unit clauses become facts on the trail; a
/// falsified unit or an empty clause is reported as [`AddedClause::Empty`].
pub fn add_clause_verbatim(
    trail: &mut Trail,
    watches: &mut Watches,
    arena: &mut ClauseArena,
    learnt: bool,
    glue: u32,
    lits: &[Lit],
) -> Result<AddedClause, AddClauseError> {
    Ok(match *lits {
        [] => AddedClause::Empty,
        [a] => {
            if trail.values.is_false(a) {
                AddedClause::Empty
            } else {
                if !trail.values.is_true(a) {
                    trail.enqueue(a, Reason::Unit);
                }
                AddedClause::Unit(a)
            }
        }
        [a, b] => {
            watches.attach_binary(a, b, learnt);
            AddedClause::Binary([a, b])
        }
        [a, b, c] => {
            watches.attach_ternary([a, b, c]);
            AddedClause::Ternary([a, b, c])
        }
        [a, b, ..] => {
            let clause = arena.add_clause(ClauseHeader::new(learnt, glue), lits)?;
            watches.attach_long(clause, [a, b]);
            AddedClause::Long(clause)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! clause {
        ($($lit:literal),* $(,)?) => {
            [$(Lit::from_dimacs($lit)),*]
        };
    }

    struct Fixture {
        trail: Trail,
        watches: Watches,
        arena: ClauseArena,
        stats: Stats,
    }

    macro_rules! fixture {
        ($var_count:literal vars $($($lit:literal),+);* $(;)?) => {{
            let mut fx = Fixture {
                trail: Trail::default(),
                watches: Watches::default(),
                arena: ClauseArena::default(),
                stats: Stats::default(),
            };
            fx.trail.resize($var_count);
            fx.watches.resize($var_count);
            $(
                add_clause_verbatim(
                    &mut fx.trail,
                    &mut fx.watches,
                    &mut fx.arena,
                    false,
                    0,
                    &[$(Lit::from_dimacs($lit)),*],
                )
                .unwrap();
            )*
            fx
        }};
    }

    impl Fixture {
        fn decide(&mut self, lit: isize) {
            self.trail.new_decision_level();
            self.trail.enqueue(Lit::from_dimacs(lit), Reason::Decision);
        }

        fn propagate(&mut self) -> Option<Conflict> {
            propagate(
                &mut self.trail,
                &mut self.watches,
                &mut self.arena,
                &mut self.stats,
            )
        }

        fn assigned(&self) -> Vec<Lit> {
            let mut lits = self.trail.lits().to_vec();
            lits.sort_unstable();
            lits
        }
    }

    macro_rules! assert_assigned {
        ($fx:ident, $($lit:literal),*) => {
            let mut expected = vec![$(Lit::from_dimacs($lit)),*];
            expected.sort_unstable();
            assert_eq!($fx.assigned(), expected);
        };
    }

    #[test]
    fn propagates_over_all_clause_sizes() {
        let mut fx = fixture![5 vars
            -1, 2;
            -2, -3, 4;
            -4, -2, 5, -1;
        ];

        fx.decide(1);
        fx.decide(3);
        assert!(fx.propagate().is_none());
        assert_assigned!(fx, 1, 2, 3, 4, 5);
        assert_eq!(fx.trail.level(Lit::from_dimacs(2).var()), 1);
        assert_eq!(fx.trail.level(Lit::from_dimacs(5).var()), 2);
    }

    #[test]
    fn binary_conflict() {
        let mut fx = fixture![3 vars
            -1, 2;
            -1, 3;
            -2, -3;
        ];

        fx.decide(1);
        match fx.propagate() {
            Some(Conflict::Binary(mut lits)) => {
                lits.sort_unstable();
                assert_eq!(lits, clause![-2, -3]);
            }
            other => panic!("expected binary conflict, got {:?}", other),
        }
    }

    #[test]
    fn ternary_conflict_and_reason() {
        let mut fx = fixture![4 vars
            -1, 2;
            -2, 3, 4;
            -2, -4;
            -3, -2;
        ];

        fx.decide(1);
        match fx.propagate() {
            Some(Conflict::Ternary(mut lits)) => {
                lits.sort_unstable();
                assert_eq!(lits.to_vec(), clause![-2, 3, 4].to_vec());
            }
            other => panic!("expected ternary conflict, got {:?}", other),
        }
    }

    #[test]
    fn long_clause_moves_watches_until_falsified() {
        let mut fx = fixture![6 vars
            -1, -2, 5, 6;
            -3, -5;
            -3, -6;
        ];

        fx.decide(1);
        assert!(fx.propagate().is_none());
        fx.decide(2);
        assert!(fx.propagate().is_none());
        // Both watches moved on; still two non-false literals, nothing
        // propagated from the long clause.
        assert_assigned!(fx, 1, 2);

        fx.decide(3);
        match fx.propagate() {
            Some(Conflict::Long(clause)) => {
                let mut lits = fx.arena.lits(clause).to_vec();
                lits.sort_unstable();
                assert_eq!(lits, clause![-1, -2, 5, 6]);
            }
            other => panic!("expected long conflict, got {:?}", other),
        }
    }

    #[test]
    fn long_clause_propagates_last_literal() {
        let mut fx = fixture![4 vars
            -1, -2, -3, 4;
        ];

        fx.decide(1);
        fx.decide(2);
        fx.decide(3);
        assert!(fx.propagate().is_none());
        assert_assigned!(fx, 1, 2, 3, 4);
        match fx.trail.reason(Lit::from_dimacs(4).var()) {
            Reason::Long(clause) => {
                // The implied literal was moved to position 0.
                assert_eq!(fx.arena.lits(clause)[0], Lit::from_dimacs(4));
            }
            other => panic!("expected long reason, got {:?}", other),
        }
    }

    #[test]
    fn enqueue_of_both_polarities_conflicts_on_next_propagate() {
        let mut fx = fixture![3 vars
            -1, 2;
            -3, -2;
        ];

        fx.decide(1);
        fx.decide(3);
        let conflict = fx.propagate();
        assert!(conflict.is_some());
    }
}
