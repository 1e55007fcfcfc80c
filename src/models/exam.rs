// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::{
    error::GatewayError,
    state::AppState,
    store::{Collection, Entity, adopt_child_ids, merge_list},
};

use super::{
    EntityKind, Resource, require_parent,
    submission::{QuestionSubmission, decode_marks},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exam {
    pub id: String,
    pub subject_id: String,
    pub name: String,
    pub description: String,

    /// Publish time. Students see the exam from here on.
    pub start_time: DateTime<Utc>,

    /// Close time.
    pub finish_time: DateTime<Utc>,

    /// Ordered question ids. Kept in step with the questions collection by the
    /// relation synchronizer; may name questions that are not loaded (or were deleted).
    #[serde(default)]
    pub question_ids: Vec<String>,

    /// Submission summaries embedded by older servers.
    /// Superseded by the exam submissions collection.
    #[serde(default)]
    pub submissions: Vec<SubmissionSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionSummary {
    pub student_id: String,
    #[serde(default, deserialize_with = "decode_marks")]
    pub marks: Option<u32>,
    #[serde(default)]
    pub question_submissions: Vec<QuestionSubmission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamPhase {
    Upcoming,
    Open,
    Closed,
}

impl Exam {
    pub fn phase(&self, now: DateTime<Utc>) -> ExamPhase {
        if now < self.start_time {
            ExamPhase::Upcoming
        } else if now < self.finish_time {
            ExamPhase::Open
        } else {
            ExamPhase::Closed
        }
    }

    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.phase(now) != ExamPhase::Upcoming
    }
}

/// DTO for creating a new exam under a subject.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_create_window))]
pub struct ExamCreate {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub finish_time: DateTime<Utc>,
}

/// DTO for updating an exam. Fields are optional.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_update_window))]
pub struct ExamUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub finish_time: Option<DateTime<Utc>>,
}

fn check_window(start: DateTime<Utc>, finish: DateTime<Utc>) -> Result<(), ValidationError> {
    if start >= finish {
        return Err(ValidationError::new("start_time_must_precede_finish_time"));
    }
    Ok(())
}

fn validate_create_window(exam: &ExamCreate) -> Result<(), ValidationError> {
    check_window(exam.start_time, exam.finish_time)
}

fn validate_update_window(exam: &ExamUpdate) -> Result<(), ValidationError> {
    match (exam.start_time, exam.finish_time) {
        (Some(start), Some(finish)) => check_window(start, finish),
        _ => Ok(()),
    }
}

impl Entity for Exam {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn merge(&mut self, incoming: Self) {
        self.subject_id = incoming.subject_id;
        self.name = incoming.name;
        self.description = incoming.description;
        self.start_time = incoming.start_time;
        self.finish_time = incoming.finish_time;
        adopt_child_ids(&mut self.question_ids, incoming.question_ids);
        merge_list(&mut self.submissions, incoming.submissions);
    }
}

impl Resource for Exam {
    const KIND: EntityKind = EntityKind::Exam;

    type Create = ExamCreate;
    type Update = ExamUpdate;

    fn collection(state: &AppState) -> &Collection<Self> {
        &state.exams
    }

    fn collection_mut(state: &mut AppState) -> &mut Collection<Self> {
        &mut state.exams
    }

    fn parent_id(&self) -> Option<&str> {
        Some(self.subject_id.as_str())
    }

    fn collection_path(parent_id: Option<&str>) -> String {
        match parent_id {
            Some(subject_id) => format!("api/subjects/{subject_id}/exams"),
            None => "api/exams".to_string(),
        }
    }

    fn member_path(id: &String) -> String {
        format!("api/exams/{id}")
    }

    fn materialize(
        id: String,
        parent_id: Option<&str>,
        payload: &ExamCreate,
    ) -> Result<Self, GatewayError> {
        let subject_id = require_parent(Self::KIND, parent_id)?;
        Ok(Self {
            id,
            subject_id: subject_id.to_string(),
            name: payload.name.clone(),
            description: payload.description.clone(),
            start_time: payload.start_time,
            finish_time: payload.finish_time,
            question_ids: Vec::new(),
            submissions: Vec::new(),
        })
    }

    fn apply_update(&mut self, payload: &ExamUpdate) {
        if let Some(name) = &payload.name {
            self.name = name.clone();
        }
        if let Some(description) = &payload.description {
            self.description = description.clone();
        }
        if let Some(start_time) = payload.start_time {
            self.start_time = start_time;
        }
        if let Some(finish_time) = payload.finish_time {
            self.finish_time = finish_time;
        }
    }
}
