// src/relations.rs

use crate::{
    events::{DomainEvent, Relation},
    state::AppState,
};

/// Outcome of applying one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Patched,
    /// The parent is not loaded locally; nothing was changed.
    ParentMissing,
}

/// Patches parent-held child-id lists in response to [`DomainEvent`]s.
///
/// A fetched collection replaces the parent's list wholesale; a created child
/// is appended. Parents are never fabricated.
#[derive(Debug, Clone, Copy, Default)]
pub struct RelationSynchronizer;

impl RelationSynchronizer {
    pub fn apply(&self, state: &mut AppState, event: &DomainEvent) -> SyncOutcome {
        let Some(list) = child_list_mut(state, event.relation(), event.parent_id()) else {
            tracing::debug!(
                relation = ?event.relation(),
                parent_id = event.parent_id(),
                "parent not loaded, skipping relation patch"
            );
            return SyncOutcome::ParentMissing;
        };

        match event {
            DomainEvent::ChildCollectionFetched { child_ids, .. } => {
                *list = child_ids.clone();
            }
            DomainEvent::ChildCreated { child_id, .. } => {
                list.push(child_id.clone());
            }
        }
        SyncOutcome::Patched
    }
}

fn child_list_mut<'a>(
    state: &'a mut AppState,
    relation: Relation,
    parent_id: &str,
) -> Option<&'a mut Vec<String>> {
    match relation {
        Relation::ExamQuestions => state
            .exams
            .store
            .get_mut(parent_id)
            .map(|exam| &mut exam.question_ids),
        Relation::QuestionOptions => state
            .questions
            .store
            .get_mut(parent_id)
            .map(|question| &mut question.option_ids),
    }
}
