// src/store/mod.rs

pub mod entity_store;
pub mod tracker;

use std::fmt;
use std::hash::Hash;

pub use entity_store::EntityStore;
pub use tracker::{AsyncOperationTracker, FetchTicket, Status};

/// A record that can live in an [`EntityStore`].
pub trait Entity: Clone {
    type Id: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync;

    fn id(&self) -> &Self::Id;

    /// Folds a newer copy of the same record into `self`.
    ///
    /// Fields the incoming record carries overwrite the stored ones. A field is
    /// "not carried" when it is `None` or, for reference lists, empty. Child-id
    /// lists of a parent are only taken while the stored list is empty.
    fn merge(&mut self, incoming: Self);
}

/// One entity kind's store together with its fetch status.
#[derive(Debug, Clone)]
pub struct Collection<T: Entity> {
    pub store: EntityStore<T>,
    pub tracker: AsyncOperationTracker,
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self {
            store: EntityStore::new(),
            tracker: AsyncOperationTracker::default(),
        }
    }
}

/// Overwrites `slot` only when the incoming list is non-empty.
pub(crate) fn merge_list<V>(slot: &mut Vec<V>, incoming: Vec<V>) {
    if !incoming.is_empty() {
        *slot = incoming;
    }
}

/// Takes the incoming child-id list only while `slot` is still empty.
///
/// Once hydrated, a parent's child ids belong to the relation synchronizer;
/// a refetched or updated parent never shrinks or reorders them.
pub(crate) fn adopt_child_ids(slot: &mut Vec<String>, incoming: Vec<String>) {
    if slot.is_empty() {
        *slot = incoming;
    }
}

/// Overwrites `slot` only when the incoming value is present.
pub(crate) fn merge_opt<V>(slot: &mut Option<V>, incoming: Option<V>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}
