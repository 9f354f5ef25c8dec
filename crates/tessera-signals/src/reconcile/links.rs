//! Link collection reconcilers.

use std::sync::Arc;

use async_trait::async_trait;
use tessera_core::{
    AnyLinkableHash, DeletedLink, HashKind, LedgerClient, LedgerEvent, Link, LinkQuery, Result,
};

use super::Reconciler;
use crate::change::{
    canonicalize, canonicalize_deleted_links, collection_changed, nested_change, NestedChange,
};

/// Which link bases an event must carry to be relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseFilter {
    /// Match on link type alone
    Any,
    /// Match the configured base in its literal, agent and entry forms
    Base(AnyLinkableHash),
}

impl BaseFilter {
    pub fn matches(&self, base: &AnyLinkableHash) -> bool {
        match self {
            BaseFilter::Any => true,
            BaseFilter::Base(configured) => {
                base == configured
                    || *base == configured.retype(HashKind::Agent)
                    || *base == configured.retype(HashKind::Entry)
            }
        }
    }
}

/// Live links of one type, optionally pinned to a base.
pub struct LinksReconciler<C> {
    client: Arc<C>,
    query: LinkQuery,
    filter: BaseFilter,
    label: &'static str,
}

impl<C: LedgerClient> LinksReconciler<C> {
    /// Links of the query's type, whatever base events carry.
    pub fn collection(client: Arc<C>, query: LinkQuery) -> Self {
        Self {
            client,
            query,
            filter: BaseFilter::Any,
            label: "collection",
        }
    }

    /// Links of the query's type hanging off the query's base.
    pub fn at_base(client: Arc<C>, query: LinkQuery) -> Self {
        let filter = BaseFilter::Base(query.base);
        Self {
            client,
            query,
            filter,
            label: "live_links",
        }
    }
}

#[async_trait]
impl<C: LedgerClient> Reconciler for LinksReconciler<C> {
    type Value = Vec<Link>;
    type Entry = C::Entry;

    fn label(&self) -> &'static str {
        self.label
    }

    async fn fetch(&self) -> Result<Vec<Link>> {
        let links = self.client.get_links(&self.query).await?;
        Ok(canonicalize(links))
    }

    fn apply(&self, cached: Option<&Vec<Link>>, event: &LedgerEvent<C::Entry>) -> Option<Vec<Link>> {
        match event {
            LedgerEvent::LinkCreated { action, link_type } => {
                if *link_type != self.query.link_type
                    || !self.filter.matches(&action.content.base_address)
                {
                    return None;
                }
                let mut links = cached.cloned().unwrap_or_default();
                links.push(Link::from(action));
                Some(canonicalize(links))
            }
            LedgerEvent::LinkDeleted {
                action,
                create_link_action,
                link_type,
            } => {
                if *link_type != self.query.link_type
                    || !self.filter.matches(&create_link_action.content.base_address)
                {
                    return None;
                }
                let mut links = cached.cloned().unwrap_or_default();
                let before = links.len();
                links.retain(|link| link.create_link_hash != action.content.link_add_address);
                (links.len() != before).then_some(links)
            }
            _ => None,
        }
    }

    fn should_publish(&self, previous: Option<&Vec<Link>>, next: &Vec<Link>) -> bool {
        collection_changed(previous.map(Vec::as_slice), next)
    }
}

/// Deleted links of one type at a base, each with every delete seen.
pub struct DeletedLinksReconciler<C> {
    client: Arc<C>,
    query: LinkQuery,
    filter: BaseFilter,
}

impl<C: LedgerClient> DeletedLinksReconciler<C> {
    pub fn new(client: Arc<C>, query: LinkQuery) -> Self {
        let filter = BaseFilter::Base(query.base);
        Self {
            client,
            query,
            filter,
        }
    }
}

#[async_trait]
impl<C: LedgerClient> Reconciler for DeletedLinksReconciler<C> {
    type Value = Vec<DeletedLink>;
    type Entry = C::Entry;

    fn label(&self) -> &'static str {
        "deleted_links"
    }

    async fn fetch(&self) -> Result<Vec<DeletedLink>> {
        let pairs = self.client.get_deleted_links(&self.query).await?;
        Ok(canonicalize_deleted_links(pairs))
    }

    fn apply(
        &self,
        cached: Option<&Vec<DeletedLink>>,
        event: &LedgerEvent<C::Entry>,
    ) -> Option<Vec<DeletedLink>> {
        let LedgerEvent::LinkDeleted {
            action,
            create_link_action,
            link_type,
        } = event
        else {
            return None;
        };
        if *link_type != self.query.link_type
            || !self.filter.matches(&create_link_action.content.base_address)
        {
            return None;
        }

        let mut pairs = cached.cloned().unwrap_or_default();
        match pairs
            .iter_mut()
            .find(|pair| pair.create.hash == action.content.link_add_address)
        {
            Some(pair) => pair.deletes.push(action.clone()),
            None => pairs.push(DeletedLink {
                create: create_link_action.clone(),
                deletes: vec![action.clone()],
            }),
        }
        Some(canonicalize_deleted_links(pairs))
    }

    fn should_publish(&self, previous: Option<&Vec<DeletedLink>>, next: &Vec<DeletedLink>) -> bool {
        match nested_change(previous.map(Vec::as_slice), next) {
            NestedChange::Changed => true,
            NestedChange::Unchanged => false,
            NestedChange::InnerDiverged => {
                // Same links, different delete lists: left for the next outer change.
                tracing::debug!(signal = "deleted_links", "delete lists diverged; not publishing");
                false
            }
        }
    }
}
