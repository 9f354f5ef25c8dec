//! In-memory ledger for integration tests.
//!
//! Every lookup is counted and timestamped with tokio's clock so tests running
//! under `start_paused` can assert exact fetch spacing. Notifications are
//! pushed by the test with [`FakeLedger::emit`].

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tessera_core::{
    ActionHash, AnyLinkableHash, Create, CreateLink, Delete, DeleteLink, DeletedLink,
    EntryAction, EntryType, EventHandler, EventSubscription, HashKind, LedgerClient, LedgerEvent,
    LedgerHash, Link, LinkQuery, LinkType, Record, Result, SignalError, SignedAction, Timestamp,
    Update,
};
use tokio::time::Instant;

/// Lookup kinds, for call accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    GetRecord,
    GetLatestRevision,
    GetAllRevisions,
    GetDeletes,
    GetLinks,
    GetDeletedLinks,
    QueryLocal,
}

#[derive(Default)]
struct FakeState {
    records: HashMap<ActionHash, Record<String>>,
    revisions: HashMap<ActionHash, Vec<Record<String>>>,
    deletes: HashMap<ActionHash, Vec<SignedAction<Delete>>>,
    links: HashMap<LinkQuery, Vec<Link>>,
    deleted_links: HashMap<LinkQuery, Vec<DeletedLink>>,
    local: HashMap<EntryType, Vec<Record<String>>>,
    failing_links: HashMap<LinkQuery, SignalError>,
    failure: Option<SignalError>,
    latency: Duration,
    calls: Vec<(Op, Instant)>,
    handlers: Vec<(u64, EventHandler)>,
    next_handler: u64,
    subscribes: usize,
}

/// Scriptable [`LedgerClient`].
#[derive(Clone, Default)]
pub struct FakeLedger {
    state: Arc<Mutex<FakeState>>,
}

impl FakeLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_links(&self, query: &LinkQuery, links: Vec<Link>) {
        self.state.lock().links.insert(query.clone(), links);
    }

    pub fn set_deleted_links(&self, query: &LinkQuery, pairs: Vec<DeletedLink>) {
        self.state.lock().deleted_links.insert(query.clone(), pairs);
    }

    pub fn put_record(&self, record: Record<String>) {
        self.state.lock().records.insert(record.action.hash, record);
    }

    /// Set every revision of `original`; the last one is the latest.
    pub fn set_revisions(&self, original: ActionHash, revisions: Vec<Record<String>>) {
        self.state.lock().revisions.insert(original, revisions);
    }

    pub fn set_deletes(&self, original: ActionHash, deletes: Vec<SignedAction<Delete>>) {
        self.state.lock().deletes.insert(original, deletes);
    }

    pub fn set_local(&self, entry_type: &EntryType, records: Vec<Record<String>>) {
        self.state.lock().local.insert(entry_type.clone(), records);
    }

    /// Make every lookup fail until cleared.
    pub fn fail_with(&self, error: Option<SignalError>) {
        self.state.lock().failure = error;
    }

    /// Make link lookups for one query fail.
    pub fn fail_links(&self, query: &LinkQuery, error: SignalError) {
        self.state.lock().failing_links.insert(query.clone(), error);
    }

    /// Delay every lookup by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.state.lock().latency = latency;
    }

    pub fn calls(&self, op: Op) -> usize {
        self.state.lock().calls.iter().filter(|(o, _)| *o == op).count()
    }

    pub fn call_times(&self, op: Op) -> Vec<Instant> {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|(o, _)| *o == op)
            .map(|(_, at)| *at)
            .collect()
    }

    /// Live subscriptions.
    pub fn subscribers(&self) -> usize {
        self.state.lock().handlers.len()
    }

    /// Subscriptions ever opened.
    pub fn subscribes(&self) -> usize {
        self.state.lock().subscribes
    }

    /// Deliver a raw notification to every live subscriber.
    pub fn emit(&self, raw: serde_json::Value) {
        let handlers: Vec<EventHandler> = self
            .state
            .lock()
            .handlers
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(&raw);
        }
    }

    pub fn emit_event(&self, event: &LedgerEvent<String>) {
        let raw = serde_json::to_value(event).expect("events serialize");
        self.emit(raw);
    }

    async fn enter(&self, op: Op) -> Result<()> {
        let (latency, failure) = {
            let mut state = self.state.lock();
            state.calls.push((op, Instant::now()));
            (state.latency, state.failure.clone())
        };
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LedgerClient for FakeLedger {
    type Entry = String;

    async fn get_record(&self, action_hash: &ActionHash) -> Result<Option<Record<String>>> {
        self.enter(Op::GetRecord).await?;
        Ok(self.state.lock().records.get(action_hash).cloned())
    }

    async fn get_latest_revision(&self, original: &ActionHash) -> Result<Option<Record<String>>> {
        self.enter(Op::GetLatestRevision).await?;
        Ok(self
            .state
            .lock()
            .revisions
            .get(original)
            .and_then(|revisions| revisions.last().cloned()))
    }

    async fn get_all_revisions(&self, original: &ActionHash) -> Result<Vec<Record<String>>> {
        self.enter(Op::GetAllRevisions).await?;
        Ok(self.state.lock().revisions.get(original).cloned().unwrap_or_default())
    }

    async fn get_deletes(&self, original: &ActionHash) -> Result<Vec<SignedAction<Delete>>> {
        self.enter(Op::GetDeletes).await?;
        Ok(self.state.lock().deletes.get(original).cloned().unwrap_or_default())
    }

    async fn get_links(&self, query: &LinkQuery) -> Result<Vec<Link>> {
        self.enter(Op::GetLinks).await?;
        let state = self.state.lock();
        if let Some(error) = state.failing_links.get(query) {
            return Err(error.clone());
        }
        Ok(state.links.get(query).cloned().unwrap_or_default())
    }

    async fn get_deleted_links(&self, query: &LinkQuery) -> Result<Vec<DeletedLink>> {
        self.enter(Op::GetDeletedLinks).await?;
        Ok(self.state.lock().deleted_links.get(query).cloned().unwrap_or_default())
    }

    async fn query_local(&self, entry_type: &EntryType) -> Result<Vec<Record<String>>> {
        self.enter(Op::QueryLocal).await?;
        Ok(self.state.lock().local.get(entry_type).cloned().unwrap_or_default())
    }

    fn subscribe(&self, handler: EventHandler) -> EventSubscription {
        let id = {
            let mut state = self.state.lock();
            let id = state.next_handler;
            state.next_handler += 1;
            state.subscribes += 1;
            state.handlers.push((id, handler));
            id
        };
        let state = Arc::clone(&self.state);
        EventSubscription::new(move || {
            state.lock().handlers.retain(|(handler_id, _)| *handler_id != id);
        })
    }
}

// Fixtures

pub fn hash(kind: HashKind, seed: u8) -> LedgerHash {
    LedgerHash::new(kind, [seed; 32])
}

fn signed<A>(seed: u8, at: i64, content: A) -> SignedAction<A> {
    SignedAction {
        hash: hash(HashKind::Action, seed),
        author: hash(HashKind::Agent, 200),
        timestamp: Timestamp(at),
        content,
    }
}

pub fn post_comments(base_seed: u8) -> LinkQuery {
    LinkQuery::new(hash(HashKind::Entry, base_seed), LinkType::new("PostToComments"))
}

pub fn create_link(seed: u8, base: AnyLinkableHash, link_type: &LinkType, at: i64) -> SignedAction<CreateLink> {
    signed(
        seed,
        at,
        CreateLink {
            base_address: base,
            target_address: hash(HashKind::Action, seed.wrapping_add(100)),
            link_type: link_type.clone(),
            tag: vec![],
        },
    )
}

pub fn delete_link(seed: u8, create: &SignedAction<CreateLink>, at: i64) -> SignedAction<DeleteLink> {
    signed(
        seed,
        at,
        DeleteLink {
            base_address: create.content.base_address,
            link_add_address: create.hash,
        },
    )
}

pub fn link_created(action: &SignedAction<CreateLink>) -> LedgerEvent<String> {
    LedgerEvent::LinkCreated {
        action: action.clone(),
        link_type: action.content.link_type.clone(),
    }
}

pub fn link_deleted(
    action: &SignedAction<DeleteLink>,
    create: &SignedAction<CreateLink>,
) -> LedgerEvent<String> {
    LedgerEvent::LinkDeleted {
        action: action.clone(),
        create_link_action: create.clone(),
        link_type: create.content.link_type.clone(),
    }
}

pub fn create_record(seed: u8, entry_type: &str, at: i64, entry: &str) -> Record<String> {
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

pub fn update_record(seed: u8, previous: &Record<String>, at: i64, entry: &str) -> Record<String> {
    Record {
        action: signed(
            seed,
            at,
            EntryAction::Update(Update {
                original_action_address: previous.action.hash,
                original_entry_address: previous.action.hash.retype(HashKind::Entry),
                entry_type: previous.action.content.entry_type().clone(),
                entry_hash: hash(HashKind::Entry, seed),
            }),
        ),
        entry: entry.to_string(),
    }
}

pub fn entry_created(record: &Record<String>) -> LedgerEvent<String> {
    LedgerEvent::EntryCreated {
        action: record.action.clone(),
        app_entry: record.entry.clone(),
    }
}

pub fn entry_updated(record: &Record<String>) -> LedgerEvent<String> {
    LedgerEvent::EntryUpdated {
        action: record.action.clone(),
        app_entry: record.entry.clone(),
        original_app_entry: None,
    }
}

pub fn entry_deleted(seed: u8, target: &Record<String>, at: i64) -> LedgerEvent<String> {
    LedgerEvent::EntryDeleted {
        action: signed(
            seed,
            at,
            Delete {
                deletes_address: target.action.hash,
                deletes_entry_address: target.action.hash.retype(HashKind::Entry),
            },
        ),
        original_app_entry: Some(target.entry.clone()),
    }
}

/// Install a test-writer subscriber once; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Let spawned tasks run without crossing a poll interval.
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(1)).await;
}

pub async fn advance(duration: Duration) {
    tokio::time::sleep(duration).await;
}
