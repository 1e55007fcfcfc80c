// src/session.rs

use std::future::Future;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use validator::Validate;

use crate::{
    error::GatewayError,
    events::DomainEvent,
    gateway::Gateway,
    models::{
        Exam, ExamSubmission, ExamUpdate, Question, QuestionOption, Resource, Subject, User,
        VersionTag,
    },
    relations::RelationSynchronizer,
    state::AppState,
    store::{Entity, FetchTicket},
};

const EVENT_CAPACITY: usize = 64;

/// Drives gateway calls and commits their results into the local mirror.
///
/// The state lock is only ever held for a synchronous commit, never across a
/// gateway call, so readers always see a fully committed snapshot and
/// overlapping operations interleave only at gateway boundaries.
pub struct Session<G> {
    gateway: G,
    state: RwLock<AppState>,
    synchronizer: RelationSynchronizer,
    events: broadcast::Sender<DomainEvent>,
}

impl<G: Gateway> Session<G> {
    pub fn new(gateway: G) -> Self {
        Self::with_state(gateway, AppState::new())
    }

    pub fn with_state(gateway: G, state: AppState) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            gateway,
            state: RwLock::new(state),
            synchronizer: RelationSynchronizer,
            events,
        }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Domain events, delivered after the synchronizer has applied them.
    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    /// Runs `f` against the current committed state.
    pub fn read<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }

    pub fn snapshot(&self) -> AppState {
        self.read(AppState::clone)
    }

    fn write<R>(&self, f: impl FnOnce(&mut AppState) -> R) -> R {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }

    fn publish(&self, event: DomainEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    /// Fetches a full collection and merges it into the store.
    ///
    /// The collection moves to `Loading` as soon as this is called, before the
    /// returned future is first polled. For child kinds fetched under a parent,
    /// the parent's child-id list is replaced with the fetched order.
    pub fn fetch<T: Resource>(
        &self,
        parent_id: Option<&str>,
    ) -> impl Future<Output = Result<Vec<T>, GatewayError>> + '_ {
        let ticket = self.write(|state| T::collection_mut(state).tracker.begin());
        let parent_id = parent_id.map(str::to_owned);
        tracing::debug!(kind = %T::KIND, ?parent_id, seq = ticket.seq(), "fetch started");

        async move {
            let result = self
                .gateway
                .fetch_collection::<T>(parent_id.as_deref())
                .await;
            self.commit_fetch(ticket, parent_id, result)
        }
    }

    fn commit_fetch<T: Resource>(
        &self,
        ticket: FetchTicket,
        parent_id: Option<String>,
        result: Result<Vec<T>, GatewayError>,
    ) -> Result<Vec<T>, GatewayError> {
        let seq = ticket.seq();
        match result {
            Ok(records) => {
                let event = match (T::RELATION, parent_id.clone()) {
                    (Some(relation), Some(parent_id)) => Some(DomainEvent::ChildCollectionFetched {
                        relation,
                        parent_id,
                        child_ids: records.iter().map(|r| r.id().to_string()).collect(),
                    }),
                    _ => None,
                };

                self.write(|state| {
                    let collection = T::collection_mut(state);
                    collection.store.upsert_many(records.iter().cloned());
                    collection.tracker.finish(ticket);
                    if let Some(event) = &event {
                        self.synchronizer.apply(state, event);
                    }
                });

                tracing::info!(
                    kind = %T::KIND,
                    ?parent_id,
                    seq,
                    count = records.len(),
                    "fetch finished"
                );
                if let Some(event) = event {
                    self.publish(event);
                }
                Ok(records)
            }
            Err(err) => {
                tracing::warn!(kind = %T::KIND, ?parent_id, seq, error = %err, "fetch failed");
                self.write(|state| T::collection_mut(state).tracker.fail(ticket, err.to_string()));
                Err(err)
            }
        }
    }

    /// Creates a record upstream and commits the server's copy.
    ///
    /// A created child is appended to its parent's child-id list.
    pub async fn create<T: Resource>(
        &self,
        parent_id: Option<&str>,
        payload: T::Create,
    ) -> Result<T, GatewayError> {
        payload.validate()?;

        let record = self
            .gateway
            .create_entity::<T>(parent_id, &payload)
            .await
            .inspect_err(|err| {
                tracing::warn!(kind = %T::KIND, ?parent_id, error = %err, "create failed");
            })?;

        let event = match (T::RELATION, record.parent_id()) {
            (Some(relation), Some(parent)) => Some(DomainEvent::ChildCreated {
                relation,
                parent_id: parent.to_string(),
                child_id: record.id().to_string(),
            }),
            _ => None,
        };

        self.write(|state| {
            T::collection_mut(state).store.upsert_one(record.clone());
            if let Some(event) = &event {
                self.synchronizer.apply(state, event);
            }
        });

        tracing::info!(kind = %T::KIND, id = %record.id(), "created");
        if let Some(event) = event {
            self.publish(event);
        }
        Ok(record)
    }

    /// Updates an unversioned record. Versioned kinds go through
    /// [`Session::save_submission`].
    pub async fn update<T: Resource>(
        &self,
        id: &T::Id,
        payload: T::Update,
    ) -> Result<T, GatewayError> {
        if T::is_versioned() {
            return Err(GatewayError::ValidationFailure(format!(
                "{} updates require a version tag",
                T::KIND
            )));
        }
        self.send_update(id, payload, None, |_| {}).await
    }

    /// Sends an update and, on confirmation, commits the server's copy after
    /// `finish` has adjusted it. Nothing is written locally before the gateway
    /// answers, and nothing at all on failure.
    pub(crate) async fn send_update<T, F>(
        &self,
        id: &T::Id,
        payload: T::Update,
        version_tag: Option<&VersionTag>,
        finish: F,
    ) -> Result<T, GatewayError>
    where
        T: Resource,
        F: FnOnce(&mut T),
    {
        payload.validate()?;

        let mut record = self
            .gateway
            .update_entity::<T>(id, &payload, version_tag)
            .await
            .inspect_err(|err| {
                tracing::warn!(kind = %T::KIND, %id, error = %err, "update rejected");
            })?;

        finish(&mut record);
        self.write(|state| T::collection_mut(state).store.upsert_one(record.clone()));

        tracing::info!(kind = %T::KIND, %id, "updated");
        Ok(record)
    }

    /// Deletes a record upstream, then locally. References held by other
    /// records are left as they are.
    pub async fn delete<T: Resource>(&self, id: &T::Id) -> Result<(), GatewayError> {
        self.gateway
            .delete_entity::<T>(id)
            .await
            .inspect_err(|err| {
                tracing::warn!(kind = %T::KIND, %id, error = %err, "delete failed");
            })?;

        self.write(|state| T::collection_mut(state).store.remove_one(id));
        tracing::info!(kind = %T::KIND, %id, "deleted");
        Ok(())
    }

    /// Drops a record locally without contacting the gateway, e.g. after a
    /// `NotFound`.
    pub fn evict<T: Resource>(&self, id: &T::Id) -> Option<T> {
        self.write(|state| T::collection_mut(state).store.remove_one(id))
    }

    pub fn fetch_subjects(&self) -> impl Future<Output = Result<Vec<Subject>, GatewayError>> + '_ {
        self.fetch::<Subject>(None)
    }

    pub fn fetch_users(&self) -> impl Future<Output = Result<Vec<User>, GatewayError>> + '_ {
        self.fetch::<User>(None)
    }

    pub fn fetch_exams(
        &self,
        subject_id: &str,
    ) -> impl Future<Output = Result<Vec<Exam>, GatewayError>> + '_ {
        self.fetch::<Exam>(Some(subject_id))
    }

    pub fn fetch_questions(
        &self,
        exam_id: &str,
    ) -> impl Future<Output = Result<Vec<Question>, GatewayError>> + '_ {
        self.fetch::<Question>(Some(exam_id))
    }

    pub fn fetch_options(
        &self,
        question_id: &str,
    ) -> impl Future<Output = Result<Vec<QuestionOption>, GatewayError>> + '_ {
        self.fetch::<QuestionOption>(Some(question_id))
    }

    pub fn fetch_submissions(
        &self,
        exam_id: &str,
    ) -> impl Future<Output = Result<Vec<ExamSubmission>, GatewayError>> + '_ {
        self.fetch::<ExamSubmission>(Some(exam_id))
    }

    /// Opens an exam now by moving its start time to `now`.
    pub async fn publish_exam(
        &self,
        exam_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Exam, GatewayError> {
        let update = ExamUpdate {
            start_time: Some(now),
            ..Default::default()
        };
        self.update::<Exam>(&exam_id.to_string(), update).await
    }

    /// Closes an exam now by moving its finish time to `now`.
    pub async fn close_exam(
        &self,
        exam_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Exam, GatewayError> {
        let update = ExamUpdate {
            finish_time: Some(now),
            ..Default::default()
        };
        self.update::<Exam>(&exam_id.to_string(), update).await
    }
}
