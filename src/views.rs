// src/views.rs

//! Pure projections over an [`AppState`] snapshot.
//!
//! Nothing here caches or mutates; every view is recomputed per call. Ids that
//! point at records not (yet) loaded are skipped rather than reported.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    concurrency::GradingState,
    models::{Exam, ExamSubmission, Question, QuestionOption, Subject, SubmissionKey, User},
    policy::{Action, Viewer, evaluate},
    state::AppState,
    store::{Entity, EntityStore},
};

/// Resolves `ids` in order, dropping any that are absent.
pub fn resolve_ids<'a, T>(store: &'a EntityStore<T>, ids: &[String]) -> Vec<&'a T>
where
    T: Entity<Id = String>,
{
    ids.iter().filter_map(|id| store.get_by_id(id.as_str())).collect()
}

pub fn questions_for_exam<'a>(state: &'a AppState, exam_id: &str) -> Vec<&'a Question> {
    state
        .exams
        .store
        .get_by_id(exam_id)
        .map(|exam| resolve_ids(&state.questions.store, &exam.question_ids))
        .unwrap_or_default()
}

pub fn options_for_question<'a>(state: &'a AppState, question_id: &str) -> Vec<&'a QuestionOption> {
    state
        .questions
        .store
        .get_by_id(question_id)
        .map(|question| resolve_ids(&state.options.store, &question.option_ids))
        .unwrap_or_default()
}

pub fn users_by_ids<'a>(state: &'a AppState, ids: &[String]) -> Vec<&'a User> {
    resolve_ids(&state.users.store, ids)
}

pub fn subject_by_slug<'a>(state: &'a AppState, slug: &str) -> Option<&'a Subject> {
    state.subjects.store.iter().find(|s| s.slug == slug)
}

/// Sum of marks over the exam's loaded questions.
pub fn exam_total_marks(state: &AppState, exam_id: &str) -> u32 {
    questions_for_exam(state, exam_id)
        .iter()
        .map(|q| q.marks)
        .sum()
}

/// Graded marks of one submission; `None` while ungraded or not loaded.
pub fn submission_marks(state: &AppState, exam_id: &str, student_id: &str) -> Option<u32> {
    state
        .submissions
        .store
        .get_by_id(&SubmissionKey::new(exam_id, student_id))
        .and_then(|s| s.marks)
}

pub fn submissions_for_exam<'a>(state: &'a AppState, exam_id: &str) -> Vec<&'a ExamSubmission> {
    state
        .submissions
        .store
        .iter()
        .filter(|s| s.exam_id() == exam_id)
        .collect()
}

/// Submissions the viewer may see: all of them for instructors, only their
/// own for students.
pub fn visible_submissions<'a>(
    state: &'a AppState,
    exam_id: &str,
    viewer: &Viewer,
) -> Vec<&'a ExamSubmission> {
    submissions_for_exam(state, exam_id)
        .into_iter()
        .filter(|s| {
            evaluate(viewer, &Action::ViewSubmission { student_id: s.student_id() }).is_allowed()
        })
        .collect()
}

/// Exams of a subject the viewer may see; students only see published ones.
pub fn visible_exams<'a>(
    state: &'a AppState,
    subject_id: &str,
    viewer: &Viewer,
    now: DateTime<Utc>,
) -> Vec<&'a Exam> {
    state
        .exams
        .store
        .iter()
        .filter(|e| e.subject_id == subject_id)
        .filter(|e| {
            evaluate(viewer, &Action::ViewExam { published: e.is_published(now) }).is_allowed()
        })
        .collect()
}

/// An exam joined with its subject, questions and enrolled students.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamOverview<'a> {
    pub exam: &'a Exam,
    pub subject: Option<&'a Subject>,
    pub questions: Vec<&'a Question>,
    pub students: Vec<&'a User>,
    pub total_marks: u32,
}

pub fn exam_overview<'a>(state: &'a AppState, exam_id: &str) -> Option<ExamOverview<'a>> {
    let exam = state.exams.store.get_by_id(exam_id)?;
    let subject = state.subjects.store.get_by_id(exam.subject_id.as_str());
    let questions = questions_for_exam(state, exam_id);
    let students = subject
        .map(|s| users_by_ids(state, &s.students))
        .unwrap_or_default();
    let total_marks = questions.iter().map(|q| q.marks).sum();

    Some(ExamOverview {
        exam,
        subject,
        questions,
        students,
        total_marks,
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingRow<'a> {
    pub student: &'a User,
    pub submission: Option<&'a ExamSubmission>,
    pub state: GradingState,
}

/// One row per enrolled student, with the exam's maximum marks.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradingSheet<'a> {
    pub exam: &'a Exam,
    pub max_marks: u32,
    pub rows: Vec<GradingRow<'a>>,
}

/// The grading table for an exam. Students only get their own row.
pub fn grading_sheet<'a>(
    state: &'a AppState,
    exam_id: &str,
    viewer: &Viewer,
) -> Option<GradingSheet<'a>> {
    let overview = exam_overview(state, exam_id)?;

    let rows = overview
        .students
        .into_iter()
        .filter(|student| {
            evaluate(viewer, &Action::ViewSubmission { student_id: &student.id }).is_allowed()
        })
        .map(|student| {
            let submission = state
                .submissions
                .store
                .get_by_id(&SubmissionKey::new(exam_id, student.id.clone()));
            GradingRow {
                student,
                submission,
                state: submission.map_or(GradingState::Ungraded, GradingState::of),
            }
        })
        .collect();

    Some(GradingSheet {
        exam: overview.exam,
        max_marks: overview.total_marks,
        rows,
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView<'a> {
    pub question: &'a Question,
    pub answer: Option<&'a str>,
}

/// A student's answer per exam question, in question order.
///
/// Reads the submissions collection first and falls back to the summaries
/// embedded in the exam record.
pub fn answers_for<'a>(
    state: &'a AppState,
    exam_id: &str,
    student_id: &str,
) -> Vec<AnswerView<'a>> {
    let submission = state
        .submissions
        .store
        .get_by_id(&SubmissionKey::new(exam_id, student_id));
    let embedded = state
        .exams
        .store
        .get_by_id(exam_id)
        .and_then(|exam| exam.submissions.iter().find(|s| s.student_id == student_id));

    questions_for_exam(state, exam_id)
        .into_iter()
        .map(|question| {
            let answer = match submission {
                Some(sub) => sub.answer_for(&question.id),
                None => embedded.and_then(|summary| {
                    summary
                        .question_submissions
                        .iter()
                        .find(|qs| qs.question_id == question.id)
                        .map(|qs| qs.answer.as_str())
                }),
            };
            AnswerView { question, answer }
        })
        .collect()
}
