// src/events.rs

use serde::Serialize;

use crate::models::EntityKind;

/// The two denormalized parent/child relations kept in step locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Relation {
    /// `Exam.question_ids` tracks questions.
    ExamQuestions,
    /// `Question.option_ids` tracks options.
    QuestionOptions,
}

impl Relation {
    pub fn parent_kind(self) -> EntityKind {
        match self {
            Relation::ExamQuestions => EntityKind::Exam,
            Relation::QuestionOptions => EntityKind::Question,
        }
    }

    pub fn child_kind(self) -> EntityKind {
        match self {
            Relation::ExamQuestions => EntityKind::Question,
            Relation::QuestionOptions => EntityKind::Option,
        }
    }

    /// Wire name of the parent's child-id list.
    pub fn child_field(self) -> &'static str {
        match self {
            Relation::ExamQuestions => "questionIds",
            Relation::QuestionOptions => "optionIds",
        }
    }
}

/// Facts published by session operations once their records are committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DomainEvent {
    /// A parent's complete child collection was fetched, in server order.
    #[serde(rename_all = "camelCase")]
    ChildCollectionFetched {
        relation: Relation,
        parent_id: String,
        child_ids: Vec<String>,
    },
    /// A single child was created under a parent.
    #[serde(rename_all = "camelCase")]
    ChildCreated {
        relation: Relation,
        parent_id: String,
        child_id: String,
    },
}

impl DomainEvent {
    pub fn relation(&self) -> Relation {
        match self {
            DomainEvent::ChildCollectionFetched { relation, .. }
            | DomainEvent::ChildCreated { relation, .. } => *relation,
        }
    }

    pub fn parent_id(&self) -> &str {
        match self {
            DomainEvent::ChildCollectionFetched { parent_id, .. }
            | DomainEvent::ChildCreated { parent_id, .. } => parent_id,
        }
    }
}
