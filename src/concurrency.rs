// src/concurrency.rs

//! Optimistic concurrency for graded submissions.
//!
//! A write without a version tag creates the submission; a write with one
//! updates it, and the gateway rejects it with `Conflict` if the tag is stale.
//! Local state only changes once the gateway has confirmed the write.

use serde::Serialize;

use crate::{
    error::GatewayError,
    gateway::Gateway,
    models::{
        ExamSubmission, QuestionSubmission, SubmissionCreate, SubmissionKey, SubmissionUpdate,
        VersionTag,
    },
    session::Session,
};

/// Where a submission sits in its grading lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GradingState {
    /// No marks yet.
    Ungraded,
    /// Marks set once.
    Graded,
    /// Marks changed after grading.
    Regraded,
}

impl GradingState {
    pub fn of(submission: &ExamSubmission) -> Self {
        match (submission.marks, submission.meta.regraded) {
            (None, _) => GradingState::Ungraded,
            (Some(_), false) => GradingState::Graded,
            (Some(_), true) => GradingState::Regraded,
        }
    }
}

/// Which request a submission write turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WritePath {
    Create,
    Update(VersionTag),
}

impl From<Option<VersionTag>> for WritePath {
    fn from(tag: Option<VersionTag>) -> Self {
        match tag {
            Some(tag) => WritePath::Update(tag),
            None => WritePath::Create,
        }
    }
}

/// A grader's or student's intended submission contents.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionDraft {
    pub exam_id: String,
    pub student_id: String,
    pub marks: Option<u32>,
    pub answers: Vec<QuestionSubmission>,
}

impl SubmissionDraft {
    pub fn marks(exam_id: impl Into<String>, student_id: impl Into<String>, marks: u32) -> Self {
        Self {
            exam_id: exam_id.into(),
            student_id: student_id.into(),
            marks: Some(marks),
            answers: Vec::new(),
        }
    }

    pub fn key(&self) -> SubmissionKey {
        SubmissionKey::new(self.exam_id.clone(), self.student_id.clone())
    }
}

impl<G: Gateway> Session<G> {
    /// Writes a submission through the version-tag guard.
    ///
    /// Without a tag the submission is created and receives its initial tag.
    /// With one it is updated; a stale tag surfaces `Conflict` and the local
    /// record stays at its last synced marks and tag.
    pub async fn save_submission(
        &self,
        draft: SubmissionDraft,
        version_tag: Option<VersionTag>,
    ) -> Result<ExamSubmission, GatewayError> {
        match WritePath::from(version_tag) {
            WritePath::Create => {
                let payload = SubmissionCreate {
                    student_id: draft.student_id,
                    marks: draft.marks,
                    answers: draft.answers,
                };
                self.create::<ExamSubmission>(Some(draft.exam_id.as_str()), payload)
                    .await
            }
            WritePath::Update(tag) => {
                let key = draft.key();
                let was_graded = self.read(|state| {
                    state
                        .submissions
                        .store
                        .get_by_id(&key)
                        .is_some_and(ExamSubmission::is_graded)
                });

                let payload = SubmissionUpdate {
                    marks: draft.marks,
                    answers: (!draft.answers.is_empty()).then_some(draft.answers),
                };

                let result = self
                    .send_update::<ExamSubmission, _>(&key, payload, Some(&tag), |record| {
                        record.meta.regraded = was_graded && record.is_graded();
                    })
                    .await;

                if let Err(GatewayError::Conflict(reason)) = &result {
                    tracing::warn!(
                        %key,
                        %tag,
                        reason = %reason,
                        "stale version tag, submission left unchanged"
                    );
                }
                result
            }
        }
    }

    /// Records marks for a student, choosing create or update from the
    /// locally held version tag.
    pub async fn grade(
        &self,
        exam_id: &str,
        student_id: &str,
        marks: u32,
    ) -> Result<ExamSubmission, GatewayError> {
        let tag = self.current_version_tag(exam_id, student_id);
        self.save_submission(SubmissionDraft::marks(exam_id, student_id, marks), tag)
            .await
    }

    /// The last version tag synced for a submission.
    pub fn current_version_tag(&self, exam_id: &str, student_id: &str) -> Option<VersionTag> {
        let key = SubmissionKey::new(exam_id, student_id);
        self.read(|state| {
            state
                .submissions
                .store
                .get_by_id(&key)
                .and_then(|s| s.meta.e_tag.clone())
        })
    }
}
