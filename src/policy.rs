// src/policy.rs

use serde::Serialize;

use crate::models::{Role, User};

/// Who is looking at the data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub user_id: String,
    pub role: Role,
}

impl Viewer {
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }

    pub fn is_student(&self) -> bool {
        self.role == Role::Student
    }
}

impl From<&User> for Viewer {
    fn from(user: &User) -> Self {
        Self::new(user.id.clone(), user.role)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    ViewSubject,
    ManageSubject,
    ViewExam { published: bool },
    /// Create, edit, delete, publish or close an exam.
    ManageExam,
    /// Create, edit or delete questions and options.
    ManageQuestions,
    /// See which options are marked correct.
    ViewAnswerKey,
    SubmitAnswers { student_id: &'a str },
    ViewSubmission { student_id: &'a str },
    GradeSubmission,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

impl From<bool> for Decision {
    fn from(allowed: bool) -> Self {
        if allowed { Decision::Allow } else { Decision::Deny }
    }
}

/// Decides whether `viewer` may perform `action`.
///
/// Evaluated by the presentation boundary; the store itself never consults it.
pub fn evaluate(viewer: &Viewer, action: &Action<'_>) -> Decision {
    let allowed = match (viewer.role, action) {
        (_, Action::ViewSubject) => true,
        (Role::Instructor, Action::SubmitAnswers { .. }) => false,
        (Role::Instructor, _) => true,
        (Role::Student, Action::ViewExam { published }) => *published,
        (Role::Student, Action::SubmitAnswers { student_id })
        | (Role::Student, Action::ViewSubmission { student_id }) => *student_id == viewer.user_id,
        (Role::Student, _) => false,
    };
    Decision::from(allowed)
}
