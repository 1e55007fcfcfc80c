// src/models/submission.rs

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::{
    error::GatewayError,
    state::AppState,
    store::{Collection, Entity, merge_list, merge_opt},
};

use super::{EntityKind, Resource, VersionTag, require_parent};

/// Identity of a submission: one per student per exam.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionKey {
    pub exam_id: String,
    pub student_id: String,
}

impl SubmissionKey {
    pub fn new(exam_id: impl Into<String>, student_id: impl Into<String>) -> Self {
        Self {
            exam_id: exam_id.into(),
            student_id: student_id.into(),
        }
    }
}

impl fmt::Display for SubmissionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.exam_id, self.student_id)
    }
}

/// A student's answer to a single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionSubmission {
    pub question_id: String,
    pub answer: String,
}

/// Concurrency metadata attached to a stored submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionMeta {
    #[serde(rename = "eTag", default, skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<VersionTag>,

    /// Set locally once a graded submission has been successfully updated.
    #[serde(skip)]
    pub regraded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamSubmission {
    #[serde(flatten)]
    pub key: SubmissionKey,

    /// Total marks awarded. `None` means ungraded; zero is a real grade.
    #[serde(
        default,
        deserialize_with = "decode_marks",
        skip_serializing_if = "Option::is_none"
    )]
    pub marks: Option<u32>,

    #[serde(default)]
    pub question_submissions: Vec<QuestionSubmission>,

    #[serde(default)]
    pub meta: SubmissionMeta,
}

impl ExamSubmission {
    pub fn exam_id(&self) -> &str {
        &self.key.exam_id
    }

    pub fn student_id(&self) -> &str {
        &self.key.student_id
    }

    pub fn is_graded(&self) -> bool {
        self.marks.is_some()
    }

    pub fn answer_for(&self, question_id: &str) -> Option<&str> {
        self.question_submissions
            .iter()
            .find(|qs| qs.question_id == question_id)
            .map(|qs| qs.answer.as_str())
    }
}

/// Decodes upstream marks. Older servers send a negative number for
/// "ungraded"; both that and null become `None`.
pub(crate) fn decode_marks<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<i64>::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(m) if m < 0 => Ok(None),
        Some(m) => u32::try_from(m)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("marks out of range: {m}"))),
    }
}

/// DTO for creating a submission under an exam.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionCreate {
    #[validate(length(min = 1))]
    pub student_id: String,
    pub marks: Option<u32>,
    #[serde(default)]
    pub answers: Vec<QuestionSubmission>,
}

/// DTO for regrading a submission. Sent together with the version tag.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionUpdate {
    pub marks: Option<u32>,
    pub answers: Option<Vec<QuestionSubmission>>,
}

impl Entity for ExamSubmission {
    type Id = SubmissionKey;

    fn id(&self) -> &SubmissionKey {
        &self.key
    }

    fn merge(&mut self, incoming: Self) {
        merge_opt(&mut self.marks, incoming.marks);
        merge_list(&mut self.question_submissions, incoming.question_submissions);
        merge_opt(&mut self.meta.e_tag, incoming.meta.e_tag);
        self.meta.regraded |= incoming.meta.regraded;
    }
}

impl Resource for ExamSubmission {
    const KIND: EntityKind = EntityKind::ExamSubmission;

    type Create = SubmissionCreate;
    type Update = SubmissionUpdate;

    fn collection(state: &AppState) -> &Collection<Self> {
        &state.submissions
    }

    fn collection_mut(state: &mut AppState) -> &mut Collection<Self> {
        &mut state.submissions
    }

    fn parent_id(&self) -> Option<&str> {
        Some(self.key.exam_id.as_str())
    }

    fn collection_path(parent_id: Option<&str>) -> String {
        match parent_id {
            Some(exam_id) => format!("api/exams/{exam_id}/submissions"),
            None => "api/submissions".to_string(),
        }
    }

    fn member_path(key: &SubmissionKey) -> String {
        format!("api/exams/{}/submissions/{}", key.exam_id, key.student_id)
    }

    fn materialize(
        _id: String,
        parent_id: Option<&str>,
        payload: &SubmissionCreate,
    ) -> Result<Self, GatewayError> {
        let exam_id = require_parent(Self::KIND, parent_id)?;
        Ok(Self {
            key: SubmissionKey::new(exam_id, payload.student_id.clone()),
            marks: payload.marks,
            question_submissions: payload.answers.clone(),
            meta: SubmissionMeta::default(),
        })
    }

    fn apply_update(&mut self, payload: &SubmissionUpdate) {
        if let Some(marks) = payload.marks {
            self.marks = Some(marks);
        }
        if let Some(answers) = &payload.answers {
            self.question_submissions = answers.clone();
        }
    }

    fn is_versioned() -> bool {
        true
    }

    fn version_tag(&self) -> Option<&VersionTag> {
        self.meta.e_tag.as_ref()
    }

    fn set_version_tag(&mut self, tag: VersionTag) {
        self.meta.e_tag = Some(tag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_marks_decode_as_ungraded() {
        let sub: ExamSubmission = serde_json::from_value(serde_json::json!({
            "examId": "e1",
            "studentId": "s1",
            "marks": -1,
            "meta": { "eTag": "\"abc\"" }
        }))
        .unwrap();

        assert_eq!(sub.marks, None);
        assert_eq!(sub.key, SubmissionKey::new("e1", "s1"));
        assert_eq!(sub.version_tag().map(VersionTag::as_str), Some("\"abc\""));
    }

    #[test]
    fn zero_marks_is_a_grade() {
        let sub: ExamSubmission = serde_json::from_value(serde_json::json!({
            "examId": "e1",
            "studentId": "s1",
            "marks": 0
        }))
        .unwrap();

        assert_eq!(sub.marks, Some(0));
        assert!(sub.is_graded());
    }
}
