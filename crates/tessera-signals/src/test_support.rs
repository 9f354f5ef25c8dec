//! Fixtures for unit tests.

use async_trait::async_trait;
use tessera_core::{
    ActionHash, AnyLinkableHash, Create, CreateLink, Delete, DeleteLink, DeletedLink,
    EntryAction, EntryType, EventHandler, EventSubscription, HashKind, LedgerClient, LedgerHash,
    Link, LinkQuery, LinkType, Record, Result, SignedAction, Timestamp, Update,
};

pub(crate) fn hash(kind: HashKind, seed: u8) -> LedgerHash {
    LedgerHash::new(kind, [seed; 32])
}

fn signed<A>(seed: u8, at: i64, content: A) -> SignedAction<A> {
    SignedAction {
        hash: hash(HashKind::Action, seed),
        author: hash(HashKind::Agent, 0),
        timestamp: Timestamp(at),
        content,
    }
}

pub(crate) fn create_link(
    seed: u8,
    base: AnyLinkableHash,
    link_type: &str,
    at: i64,
) -> SignedAction<CreateLink> {
    signed(
        seed,
        at,
        CreateLink {
            base_address: base,
            target_address: hash(HashKind::Action, seed.wrapping_add(100)),
            link_type: LinkType::new(link_type),
            tag: vec![],
        },
    )
}

pub(crate) fn delete_link(
    seed: u8,
    create: &SignedAction<CreateLink>,
    at: i64,
) -> SignedAction<DeleteLink> {
    signed(
        seed,
        at,
        DeleteLink {
            base_address: create.content.base_address,
            link_add_address: create.hash,
        },
    )
}

pub(crate) fn create_record(seed: u8, entry_type: &str, at: i64, entry: &str) -> Record<String> {
    Record {
        action: signed(
            seed,
            at,
            EntryAction::Create(Create {
                entry_type: EntryType::new(entry_type),
                entry_hash: hash(HashKind::Entry, seed),
            }),
        ),
        entry: entry.to_string(),
    }
}

pub(crate) fn update_record(
    seed: u8,
    previous: &Record<String>,
    at: i64,
    entry: &str,
) -> Record<String> {
    let entry_type = previous.action.content.entry_type().clone();
    Record {
        action: signed(
            seed,
            at,
            EntryAction::Update(Update {
                original_action_address: previous.action.hash,
                original_entry_address: hash(HashKind::Entry, previous.action.hash.core()[0]),
                entry_type,
                entry_hash: hash(HashKind::Entry, seed),
            }),
        ),
        entry: entry.to_string(),
    }
}

pub(crate) fn delete_action(seed: u8, target: ActionHash, at: i64) -> SignedAction<Delete> {
    signed(
        seed,
        at,
        Delete {
            deletes_address: target,
            deletes_entry_address: target.retype(HashKind::Entry),
        },
    )
}

/// A ledger with nothing in it and no notifications.
pub(crate) struct NullLedger;

#[async_trait]
impl LedgerClient for NullLedger {
    type Entry = String;

    async fn get_record(&self, _: &ActionHash) -> Result<Option<Record<String>>> {
        Ok(None)
    }

    async fn get_latest_revision(&self, _: &ActionHash) -> Result<Option<Record<String>>> {
        Ok(None)
    }

    async fn get_all_revisions(&self, _: &ActionHash) -> Result<Vec<Record<String>>> {
        Ok(vec![])
    }

    async fn get_deletes(&self, _: &ActionHash) -> Result<Vec<SignedAction<Delete>>> {
        Ok(vec![])
    }

    async fn get_links(&self, _: &LinkQuery) -> Result<Vec<Link>> {
        Ok(vec![])
    }

    async fn get_deleted_links(&self, _: &LinkQuery) -> Result<Vec<DeletedLink>> {
        Ok(vec![])
    }

    async fn query_local(&self, _: &EntryType) -> Result<Vec<Record<String>>> {
        Ok(vec![])
    }

    fn subscribe(&self, _: EventHandler) -> EventSubscription {
        EventSubscription::new(|| {})
    }
}
