// src/models/question_option.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::GatewayError,
    events::Relation,
    state::AppState,
    store::{Collection, Entity},
};

use super::{EntityKind, Resource, require_parent};

/// One selectable answer of a multiple-choice question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOption {
    pub id: String,
    pub question_id: String,
    pub answer: String,
    pub correct: bool,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOptionCreate {
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
    pub correct: bool,
}

#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOptionUpdate {
    #[validate(length(min = 1, max = 500))]
    pub answer: Option<String>,
    pub correct: Option<bool>,
}

impl Entity for QuestionOption {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn merge(&mut self, incoming: Self) {
        *self = incoming;
    }
}

impl Resource for QuestionOption {
    const KIND: EntityKind = EntityKind::Option;
    const RELATION: Option<Relation> = Some(Relation::QuestionOptions);

    type Create = QuestionOptionCreate;
    type Update = QuestionOptionUpdate;

    fn collection(state: &AppState) -> &Collection<Self> {
        &state.options
    }

    fn collection_mut(state: &mut AppState) -> &mut Collection<Self> {
        &mut state.options
    }

    fn parent_id(&self) -> Option<&str> {
        Some(self.question_id.as_str())
    }

    fn collection_path(parent_id: Option<&str>) -> String {
        match parent_id {
            Some(question_id) => format!("api/questions/{question_id}/options"),
            None => "api/options".to_string(),
        }
    }

    fn member_path(id: &String) -> String {
        format!("api/options/{id}")
    }

    fn materialize(
        id: String,
        parent_id: Option<&str>,
        payload: &QuestionOptionCreate,
    ) -> Result<Self, GatewayError> {
        let question_id = require_parent(Self::KIND, parent_id)?;
        Ok(Self {
            id,
            question_id: question_id.to_string(),
            answer: payload.answer.clone(),
            correct: payload.correct,
        })
    }

    fn apply_update(&mut self, payload: &QuestionOptionUpdate) {
        if let Some(answer) = &payload.answer {
            self.answer = answer.clone();
        }
        if let Some(correct) = payload.correct {
            self.correct = correct;
        }
    }
}
