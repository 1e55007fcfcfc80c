// src/models/question.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::{
    error::GatewayError,
    events::Relation,
    state::AppState,
    store::{Collection, Entity, adopt_child_ids},
};

use super::{EntityKind, QuestionOption, QuestionOptionCreate, Resource, require_parent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    MultipleChoice,
    ShortAnswer,
}

/// A question belonging to an exam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub exam_id: String,

    /// The question text.
    pub question: String,

    /// Mapped from the wire field 'type' since `type` is a reserved keyword in Rust.
    #[serde(rename = "type")]
    pub question_type: QuestionType,

    /// Marks available for this question. Always positive.
    pub marks: u32,

    /// Ordered option ids, patched by the relation synchronizer.
    #[serde(default)]
    pub option_ids: Vec<String>,
}

/// DTO for creating a new question.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionCreate {
    #[validate(length(min = 1, max = 1000))]
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[validate(range(min = 1, message = "A question must be worth at least one mark."))]
    pub marks: u32,

    /// Answer options created in the same request. Only kept for
    /// multiple-choice questions.
    #[serde(default)]
    #[validate(nested)]
    pub options: Vec<QuestionOptionCreate>,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionUpdate {
    #[validate(length(min = 1, max = 1000))]
    pub question: Option<String>,
    #[serde(rename = "type")]
    pub question_type: Option<QuestionType>,
    #[validate(range(min = 1))]
    pub marks: Option<u32>,
}

impl Entity for Question {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn merge(&mut self, incoming: Self) {
        self.exam_id = incoming.exam_id;
        self.question = incoming.question;
        self.question_type = incoming.question_type;
        self.marks = incoming.marks;
        adopt_child_ids(&mut self.option_ids, incoming.option_ids);
    }
}

impl Resource for Question {
    const KIND: EntityKind = EntityKind::Question;
    const RELATION: Option<Relation> = Some(Relation::ExamQuestions);

    type Create = QuestionCreate;
    type Update = QuestionUpdate;

    fn collection(state: &AppState) -> &Collection<Self> {
        &state.questions
    }

    fn collection_mut(state: &mut AppState) -> &mut Collection<Self> {
        &mut state.questions
    }

    fn parent_id(&self) -> Option<&str> {
        Some(self.exam_id.as_str())
    }

    fn collection_path(parent_id: Option<&str>) -> String {
        match parent_id {
            Some(exam_id) => format!("api/exams/{exam_id}/questions"),
            None => "api/questions".to_string(),
        }
    }

    fn member_path(id: &String) -> String {
        format!("api/questions/{id}")
    }

    fn materialize(
        id: String,
        parent_id: Option<&str>,
        payload: &QuestionCreate,
    ) -> Result<Self, GatewayError> {
        let exam_id = require_parent(Self::KIND, parent_id)?;
        Ok(Self {
            id,
            exam_id: exam_id.to_string(),
            question: payload.question.clone(),
            question_type: payload.question_type,
            marks: payload.marks,
            option_ids: Vec::new(),
        })
    }

    fn materialize_children(
        &mut self,
        payload: &QuestionCreate,
        next_id: &mut dyn FnMut() -> String,
    ) -> Result<Vec<(EntityKind, Value)>, GatewayError> {
        if self.question_type != QuestionType::MultipleChoice {
            return Ok(Vec::new());
        }

        let mut rows = Vec::with_capacity(payload.options.len());
        for option in &payload.options {
            let child = QuestionOption::materialize(next_id(), Some(self.id.as_str()), option)?;
            self.option_ids.push(child.id.clone());
            rows.push((QuestionOption::KIND, serde_json::to_value(&child)?));
        }
        Ok(rows)
    }

    fn apply_update(&mut self, payload: &QuestionUpdate) {
        if let Some(question) = &payload.question {
            self.question = question.clone();
        }
        if let Some(question_type) = payload.question_type {
            self.question_type = question_type;
        }
        if let Some(marks) = payload.marks {
            self.marks = marks;
        }
    }
}
