// src/state.rs

use crate::{
    models::{EntityKind, Exam, ExamSubmission, Question, QuestionOption, Subject, User},
    store::{Collection, Status},
};

/// The whole local mirror: one collection per entity kind.
///
/// Owned by a [`crate::session::Session`] and handed by reference to the
/// synchronizer and the derived views.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub subjects: Collection<Subject>,
    pub exams: Collection<Exam>,
    pub questions: Collection<Question>,
    pub options: Collection<QuestionOption>,
    pub users: Collection<User>,
    pub submissions: Collection<ExamSubmission>,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch status of every collection, for status bars and logs.
    pub fn statuses(&self) -> [(EntityKind, Status); 6] {
        [
            (EntityKind::Subject, self.subjects.tracker.status()),
            (EntityKind::Exam, self.exams.tracker.status()),
            (EntityKind::Question, self.questions.tracker.status()),
            (EntityKind::Option, self.options.tracker.status()),
            (EntityKind::User, self.users.tracker.status()),
            (EntityKind::ExamSubmission, self.submissions.tracker.status()),
        ]
    }
}
