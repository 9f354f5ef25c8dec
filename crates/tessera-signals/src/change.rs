//! # Change Detection
//!
//! Decides whether a freshly computed value is materially new. Identity is the
//! only notion of equality: scalars compare their identifiers, collections
//! compare identifier sequences position by position after canonical ordering.
//! Payloads are never compared.

use indexmap::IndexMap;
use tessera_core::{ActionHash, DeletedLink, Identified};

/// Deduplicate by identity and sort canonically.
///
/// The last occurrence of a duplicated identity wins. Ordering is ascending
/// by timestamp, ties broken by identity. The sort is stable.
pub(crate) fn canonicalize<T: Identified>(items: Vec<T>) -> Vec<T> {
    let mut unique: IndexMap<ActionHash, T> = IndexMap::with_capacity(items.len());
    for item in items {
        unique.insert(*item.identity(), item);
    }
    let mut ordered: Vec<T> = unique.into_values().collect();
    ordered.sort_by(|a, b| {
        a.timestamp()
            .cmp(&b.timestamp())
            .then_with(|| a.identity().cmp(b.identity()))
    });
    ordered
}

/// Canonicalize every nested delete list, then the outer list.
pub(crate) fn canonicalize_deleted_links(items: Vec<DeletedLink>) -> Vec<DeletedLink> {
    let items = items
        .into_iter()
        .map(|pair| DeletedLink {
            create: pair.create,
            deletes: canonicalize(pair.deletes),
        })
        .collect();
    canonicalize(items)
}

/// Positional identity equality.
pub(crate) fn same_identities<T: Identified>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .zip(b)
            .all(|(left, right)| left.identity() == right.identity())
}

pub(crate) fn scalar_changed<T: Identified>(previous: Option<&T>, next: &T) -> bool {
    previous.map_or(true, |prev| prev.identity() != next.identity())
}

/// Both inputs must already be canonical.
pub(crate) fn collection_changed<T: Identified>(previous: Option<&[T]>, next: &[T]) -> bool {
    previous.map_or(true, |prev| !same_identities(prev, next))
}

/// Outcome of comparing two canonical deleted-link collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NestedChange {
    /// The outer identity sequence differs
    Changed,
    /// Nothing differs
    Unchanged,
    /// Outer sequence equal but at least one delete list differs
    InnerDiverged,
}

pub(crate) fn nested_change(previous: Option<&[DeletedLink]>, next: &[DeletedLink]) -> NestedChange {
    let Some(previous) = previous else {
        return NestedChange::Changed;
    };
    if !same_identities(previous, next) {
        return NestedChange::Changed;
    }
    let inner_equal = previous
        .iter()
        .zip(next)
        .all(|(prev, next)| same_identities(&prev.deletes, &next.deletes));
    if inner_equal {
        NestedChange::Unchanged
    } else {
        NestedChange::InnerDiverged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tessera_core::{
        AnyLinkableHash, CreateLink, DeleteLink, HashKind, LedgerHash, Link, LinkType,
        SignedAction, Timestamp,
    };

    fn link(seed: u8, at: i64) -> Link {
        Link {
            create_link_hash: LedgerHash::new(HashKind::Action, [seed; 32]),
            author: LedgerHash::new(HashKind::Agent, [0; 32]),
            base: LedgerHash::new(HashKind::Entry, [1; 32]),
            target: LedgerHash::new(HashKind::Action, [seed.wrapping_add(100); 32]),
            timestamp: Timestamp(at),
            link_type: LinkType::new("T"),
            tag: vec![seed],
        }
    }

    fn create(seed: u8, at: i64) -> SignedAction<CreateLink> {
        let base: AnyLinkableHash = LedgerHash::new(HashKind::Entry, [1; 32]);
        SignedAction {
            hash: LedgerHash::new(HashKind::Action, [seed; 32]),
            author: LedgerHash::new(HashKind::Agent, [0; 32]),
            timestamp: Timestamp(at),
            content: CreateLink {
                base_address: base,
                target_address: LedgerHash::new(HashKind::Action, [9; 32]),
                link_type: LinkType::new("T"),
                tag: vec![],
            },
        }
    }

    fn delete(seed: u8, of: u8, at: i64) -> SignedAction<DeleteLink> {
        SignedAction {
            hash: LedgerHash::new(HashKind::Action, [seed; 32]),
            author: LedgerHash::new(HashKind::Agent, [0; 32]),
            timestamp: Timestamp(at),
            content: DeleteLink {
                base_address: LedgerHash::new(HashKind::Entry, [1; 32]),
                link_add_address: LedgerHash::new(HashKind::Action, [of; 32]),
            },
        }
    }

    #[test]
    fn test_orders_by_timestamp_then_identity() {
        let ordered = canonicalize(vec![link(3, 20), link(2, 10), link(1, 20)]);
        let seeds: Vec<u8> = ordered.iter().map(|l| l.tag[0]).collect();
        assert_eq!(seeds, vec![2, 1, 3]);
    }

    #[test]
    fn test_last_duplicate_wins() {
        let mut newer = link(1, 10);
        newer.tag = vec![42];
        let ordered = canonicalize(vec![link(1, 10), link(2, 5), newer]);
        assert_eq!(ordered.len(), 2);
        assert_eq!(ordered[1].tag, vec![42]);
    }

    #[test]
    fn test_payload_differences_are_invisible() {
        let mut edited = link(1, 10);
        edited.tag = vec![7, 7, 7];
        assert!(!collection_changed(Some(&[link(1, 10)][..]), &[edited]));
        assert!(collection_changed(None, &[link(1, 10)]));
        assert!(collection_changed(Some(&[link(1, 10)][..]), &[link(1, 10), link(2, 11)]));
    }

    #[test]
    fn test_scalar_changed_on_identity_only() {
        assert!(scalar_changed(None, &link(1, 0)));
        assert!(!scalar_changed(Some(&link(1, 0)), &link(1, 99)));
        assert!(scalar_changed(Some(&link(1, 0)), &link(2, 0)));
    }

    #[test]
    fn test_nested_change_outcomes() {
        let before = canonicalize_deleted_links(vec![DeletedLink {
            create: create(1, 10),
            deletes: vec![delete(2, 1, 20)],
        }]);

        let same = canonicalize_deleted_links(before.clone());
        assert_eq!(nested_change(Some(&before), &same), NestedChange::Unchanged);

        let more_deletes = canonicalize_deleted_links(vec![DeletedLink {
            create: create(1, 10),
            deletes: vec![delete(3, 1, 30), delete(2, 1, 20)],
        }]);
        assert_eq!(
            nested_change(Some(&before), &more_deletes),
            NestedChange::InnerDiverged
        );

        let extra_link = canonicalize_deleted_links(vec![
            before[0].clone(),
            DeletedLink {
                create: create(4, 40),
                deletes: vec![delete(5, 4, 50)],
            },
        ]);
        assert_eq!(nested_change(Some(&before), &extra_link), NestedChange::Changed);
        assert_eq!(nested_change(None, &before), NestedChange::Changed);
    }

    #[test]
    fn test_nested_deletes_are_canonicalized() {
        let pairs = canonicalize_deleted_links(vec![DeletedLink {
            create: create(1, 10),
            deletes: vec![delete(3, 1, 30), delete(2, 1, 20), delete(3, 1, 30)],
        }]);
        let order: Vec<_> = pairs[0].deletes.iter().map(|d| d.timestamp).collect();
        assert_eq!(order, vec![Timestamp(20), Timestamp(30)]);
    }

    proptest! {
        #[test]
        fn prop_canonicalize_is_order_insensitive(
            seeds in proptest::collection::vec(0u8..16, 0..24),
        ) {
            let items: Vec<Link> = seeds.iter().map(|seed| link(*seed, i64::from(*seed % 5))).collect();
            let mut reversed = items.clone();
            reversed.reverse();

            let a = canonicalize(items);
            let b = canonicalize(reversed);
            prop_assert!(same_identities(&a, &b));
        }

        #[test]
        fn prop_canonicalize_is_idempotent_and_unique(
            entries in proptest::collection::vec((0u8..16, 0i64..8), 0..24),
        ) {
            let items: Vec<Link> = entries.iter().map(|(seed, at)| link(*seed, *at)).collect();
            let once = canonicalize(items);
            let twice = canonicalize(once.clone());
            prop_assert!(same_identities(&once, &twice));

            let ids: std::collections::HashSet<_> = once.iter().map(|l| l.create_link_hash).collect();
            prop_assert_eq!(ids.len(), once.len());
            prop_assert!(once.windows(2).all(|w|
                (w[0].timestamp, w[0].create_link_hash) <= (w[1].timestamp, w[1].create_link_hash)
            ));
        }
    }
}
