// tests/views_tests.rs

use chrono::{DateTime, TimeZone, Utc};
use exam_cache::{
    AppState, GradingState,
    models::{
        Exam, ExamSubmission, Question, QuestionOption, QuestionSubmission, QuestionType, Role,
        Subject, SubmissionKey, SubmissionMeta, SubmissionSummary, User, VersionTag,
    },
    policy::{Action, Decision, Viewer, evaluate},
    views,
};

fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, 9, 0, 0).unwrap()
}

fn user(id: &str, role: Role) -> User {
    User {
        id: id.to_string(),
        name: id.to_uppercase(),
        email: format!("{id}@uni.edu"),
        role,
    }
}

fn exam(id: &str, start_day: u32, question_ids: &[&str]) -> Exam {
    Exam {
        id: id.to_string(),
        subject_id: "S1".to_string(),
        name: id.to_string(),
        description: String::new(),
        start_time: at(start_day),
        finish_time: at(start_day + 1),
        question_ids: question_ids.iter().map(|s| s.to_string()).collect(),
        submissions: Vec::new(),
    }
}

fn question(id: &str, marks: u32, option_ids: &[&str]) -> Question {
    Question {
        id: id.to_string(),
        exam_id: "E1".to_string(),
        question: format!("{id}?"),
        question_type: QuestionType::MultipleChoice,
        marks,
        option_ids: option_ids.iter().map(|s| s.to_string()).collect(),
    }
}

fn submission(student_id: &str, marks: Option<u32>, answers: &[(&str, &str)]) -> ExamSubmission {
    ExamSubmission {
        key: SubmissionKey::new("E1", student_id),
        marks,
        question_submissions: answers
            .iter()
            .map(|(q, a)| QuestionSubmission {
                question_id: q.to_string(),
                answer: a.to_string(),
            })
            .collect(),
        meta: SubmissionMeta {
            e_tag: Some(VersionTag::new("\"1\"")),
            regraded: false,
        },
    }
}

/// A snapshot with one subject, two exams, and a partially loaded question set.
fn snapshot() -> AppState {
    let mut state = AppState::new();
    state.subjects.store.upsert_one(Subject {
        id: "S1".to_string(),
        slug: "swen90007".to_string(),
        name: "Software Design".to_string(),
        description: String::new(),
        students: vec!["ada".to_string(), "bob".to_string(), "ghost".to_string()],
    });
    state.users.store.upsert_many([
        user("ada", Role::Student),
        user("bob", Role::Student),
        user("ivy", Role::Instructor),
    ]);
    state.exams.store.upsert_many([
        exam("E1", 1, &["q1", "q2", "q-missing"]),
        exam("E2", 20, &[]),
    ]);
    state.questions.store.upsert_many([
        question("q1", 4, &["o2", "o1", "o-missing"]),
        question("q2", 6, &[]),
    ]);
    state.options.store.upsert_many([
        QuestionOption {
            id: "o1".to_string(),
            question_id: "q1".to_string(),
            answer: "Lazy load".to_string(),
            correct: true,
        },
        QuestionOption {
            id: "o2".to_string(),
            question_id: "q1".to_string(),
            answer: "Eager load".to_string(),
            correct: false,
        },
    ]);
    state
        .submissions
        .store
        .upsert_one(submission("ada", Some(7), &[("q1", "o1"), ("q2", "Because")]));
    state
}

#[test]
fn projections_follow_reference_order_and_skip_missing() {
    let state = snapshot();

    let options: Vec<_> = views::options_for_question(&state, "q1")
        .into_iter()
        .map(|o| o.id.as_str())
        .collect();
    assert_eq!(options, vec!["o2", "o1"]);

    let questions: Vec<_> = views::questions_for_exam(&state, "E1")
        .into_iter()
        .map(|q| q.id.as_str())
        .collect();
    assert_eq!(questions, vec!["q1", "q2"]);

    assert!(views::questions_for_exam(&state, "nope").is_empty());
    assert_eq!(views::exam_total_marks(&state, "E1"), 10);
}

#[test]
fn overview_joins_subject_questions_and_students() {
    let state = snapshot();

    let overview = views::exam_overview(&state, "E1").unwrap();
    assert_eq!(overview.subject.map(|s| s.slug.as_str()), Some("swen90007"));
    assert_eq!(overview.questions.len(), 2);
    let students: Vec<_> = overview.students.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(students, vec!["ada", "bob"]);
    assert_eq!(overview.total_marks, 10);

    assert_eq!(
        views::subject_by_slug(&state, "swen90007").map(|s| s.id.as_str()),
        Some("S1")
    );
}

#[test]
fn exam_with_unloaded_subject_still_renders() {
    let mut state = snapshot();
    state.subjects.store.remove_one("S1");

    let overview = views::exam_overview(&state, "E1").unwrap();
    assert!(overview.subject.is_none());
    assert!(overview.students.is_empty());
}

#[test]
fn grading_sheet_is_filtered_by_role() {
    let state = snapshot();

    let instructor = Viewer::new("ivy", Role::Instructor);
    let sheet = views::grading_sheet(&state, "E1", &instructor).unwrap();
    assert_eq!(sheet.max_marks, 10);
    let rows: Vec<_> = sheet
        .rows
        .iter()
        .map(|r| (r.student.id.as_str(), r.submission.and_then(|s| s.marks), r.state))
        .collect();
    assert_eq!(
        rows,
        vec![
            ("ada", Some(7), GradingState::Graded),
            ("bob", None, GradingState::Ungraded),
        ]
    );

    let bob = Viewer::new("bob", Role::Student);
    let sheet = views::grading_sheet(&state, "E1", &bob).unwrap();
    assert_eq!(sheet.rows.len(), 1);
    assert_eq!(sheet.rows[0].student.id, "bob");

    assert!(views::visible_submissions(&state, "E1", &bob).is_empty());
    assert_eq!(
        views::visible_submissions(&state, "E1", &Viewer::new("ada", Role::Student)).len(),
        1
    );
    assert_eq!(views::visible_submissions(&state, "E1", &instructor).len(), 1);
}

#[test]
fn students_only_see_published_exams() {
    let state = snapshot();
    let now = at(10);

    let ids = |viewer: &Viewer| -> Vec<String> {
        views::visible_exams(&state, "S1", viewer, now)
            .iter()
            .map(|e| e.id.clone())
            .collect()
    };

    assert_eq!(ids(&Viewer::new("ada", Role::Student)), vec!["E1"]);
    assert_eq!(ids(&Viewer::new("ivy", Role::Instructor)), vec!["E1", "E2"]);
}

#[test]
fn answers_prefer_collection_then_embedded_summary() {
    let mut state = snapshot();
    let mut e1 = state.exams.store.get_by_id("E1").cloned().unwrap();
    e1.submissions = vec![SubmissionSummary {
        student_id: "bob".to_string(),
        marks: None,
        question_submissions: vec![QuestionSubmission {
            question_id: "q2".to_string(),
            answer: "From the legacy path".to_string(),
        }],
    }];
    state.exams.store.upsert_one(e1);

    let ada: Vec<_> = views::answers_for(&state, "E1", "ada")
        .iter()
        .map(|a| a.answer)
        .collect();
    assert_eq!(ada, vec![Some("o1"), Some("Because")]);

    let bob: Vec<_> = views::answers_for(&state, "E1", "bob")
        .iter()
        .map(|a| a.answer)
        .collect();
    assert_eq!(bob, vec![None, Some("From the legacy path")]);
}

#[test]
fn marks_aggregates_distinguish_zero_from_ungraded() {
    let mut state = snapshot();
    state.submissions.store.upsert_one(submission("bob", Some(0), &[]));

    assert_eq!(views::submission_marks(&state, "E1", "ada"), Some(7));
    assert_eq!(views::submission_marks(&state, "E1", "bob"), Some(0));
    assert_eq!(views::submission_marks(&state, "E1", "ghost"), None);
    assert_eq!(views::submissions_for_exam(&state, "E1").len(), 2);
}

#[test]
fn policy_decisions() {
    let ada = Viewer::new("ada", Role::Student);
    let ivy = Viewer::new("ivy", Role::Instructor);

    assert_eq!(evaluate(&ada, &Action::ViewSubject), Decision::Allow);
    assert_eq!(evaluate(&ada, &Action::ViewExam { published: false }), Decision::Deny);
    assert_eq!(evaluate(&ada, &Action::ViewExam { published: true }), Decision::Allow);
    assert_eq!(evaluate(&ada, &Action::GradeSubmission), Decision::Deny);
    assert_eq!(evaluate(&ada, &Action::ViewAnswerKey), Decision::Deny);
    assert_eq!(evaluate(&ada, &Action::SubmitAnswers { student_id: "ada" }), Decision::Allow);
    assert_eq!(evaluate(&ada, &Action::SubmitAnswers { student_id: "bob" }), Decision::Deny);

    assert_eq!(evaluate(&ivy, &Action::ManageExam), Decision::Allow);
    assert_eq!(evaluate(&ivy, &Action::GradeSubmission), Decision::Allow);
    assert_eq!(evaluate(&ivy, &Action::ViewSubmission { student_id: "ada" }), Decision::Allow);
    assert_eq!(evaluate(&ivy, &Action::SubmitAnswers { student_id: "ivy" }), Decision::Deny);

    assert_eq!(Viewer::from(&user("bob", Role::Student)), Viewer::new("bob", Role::Student));
}
