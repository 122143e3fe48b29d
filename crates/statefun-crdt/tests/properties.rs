//! Property-based tests for the join-semilattice laws every `Lattice` impl
//! must satisfy, run against the delta types actually shipped on the wire
//! (`Counter`'s `i64` delta and `Vote`'s `VoteDelta`) rather than the
//! top-level CRDT structs, since those also carry local-only bookkeeping
//! fields excluded from the join law by design.

use proptest::prelude::*;
use statefun_crdt::vote::VoteDelta;
use statefun_crdt::Lattice;

fn vote_delta_strategy() -> impl Strategy<Value = VoteDelta> {
    (any::<bool>(), 0u64..1000, 0u64..1000).prop_map(|(self_vote, votes_for, total_voters)| {
        VoteDelta {
            self_vote,
            votes_for,
            total_voters,
        }
    })
}

macro_rules! lattice_property_tests {
    ($name:ident, $strategy:expr) => {
        mod $name {
            use super::*;

            proptest! {
                #[test]
                fn join_is_commutative(a in $strategy, b in $strategy) {
                    prop_assert_eq!(a.join(&b), b.join(&a));
                }

                #[test]
                fn join_is_associative(a in $strategy, b in $strategy, c in $strategy) {
                    let left = a.join(&b).join(&c);
                    let right = a.join(&b.join(&c));
                    prop_assert_eq!(left, right);
                }

                #[test]
                fn join_is_idempotent(a in $strategy) {
                    prop_assert_eq!(a.join(&a), a);
                }

                #[test]
                fn bottom_is_identity(a in $strategy) {
                    let bottom = Lattice::bottom();
                    prop_assert_eq!(a.join(&bottom), a);
                    prop_assert_eq!(bottom.join(&a), a);
                }
            }
        }
    };
}

lattice_property_tests!(i64_delta, any::<i64>());
lattice_property_tests!(vote_delta, vote_delta_strategy());
