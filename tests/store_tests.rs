// tests/store_tests.rs

use std::collections::HashSet;

use exam_cache::{
    AppState,
    models::{ExamSubmission, Question, QuestionType, SubmissionKey, SubmissionMeta},
    store::{EntityStore, Status},
};

fn question(id: &str, marks: u32, option_ids: &[&str]) -> Question {
    Question {
        id: id.to_string(),
        exam_id: "E1".to_string(),
        question: format!("Question {id}"),
        question_type: QuestionType::MultipleChoice,
        marks,
        option_ids: option_ids.iter().map(|s| s.to_string()).collect(),
    }
}

fn submission(student: &str, marks: Option<u32>) -> ExamSubmission {
    ExamSubmission {
        key: SubmissionKey::new("E1", student),
        marks,
        question_submissions: Vec::new(),
        meta: SubmissionMeta::default(),
    }
}

#[test]
fn upserting_the_same_batch_twice_is_idempotent() {
    let batch = vec![question("q1", 5, &["o1"]), question("q2", 10, &[])];

    let mut once = EntityStore::new();
    once.upsert_many(batch.clone());

    let mut twice = EntityStore::new();
    twice.upsert_many(batch.clone());
    twice.upsert_many(batch);

    assert_eq!(once.ids(), twice.ids());
    assert_eq!(once.get_all(), twice.get_all());
}

#[test]
fn ids_stay_unique_across_mixed_operations() {
    let mut store = EntityStore::new();
    store.upsert_many(vec![question("q1", 5, &[]), question("q2", 10, &[])]);
    store.upsert_one(question("q1", 7, &[]));
    store.remove_one("q2");
    store.upsert_many(vec![question("q2", 3, &[]), question("q1", 1, &[])]);
    store.remove_one("missing");

    let unique: HashSet<_> = store.ids().iter().collect();
    assert_eq!(unique.len(), store.len());
    assert_eq!(store.ids(), &["q1".to_string(), "q2".to_string()]);
    assert_eq!(store.get_by_id("q1").map(|q| q.marks), Some(1));
}

#[test]
fn merge_keeps_reference_lists_an_incoming_copy_omits() {
    let mut store = EntityStore::new();
    store.upsert_one(question("q1", 5, &["o1", "o2"]));
    store.upsert_one(question("q1", 6, &[]));

    let stored = store.get_by_id("q1").unwrap();
    assert_eq!(stored.marks, 6);
    assert_eq!(stored.option_ids, vec!["o1", "o2"]);
}

#[test]
fn refetched_parent_does_not_replace_hydrated_child_ids() {
    let mut store = EntityStore::new();
    store.upsert_one(question("q1", 5, &["o1", "o2", "o3"]));
    store.upsert_one(question("q1", 5, &["o3"]));

    assert_eq!(store.get_by_id("q1").unwrap().option_ids, vec!["o1", "o2", "o3"]);

    // An empty list is still filled by the first copy that carries one.
    store.upsert_one(question("q2", 1, &[]));
    store.upsert_one(question("q2", 1, &["o9"]));
    assert_eq!(store.get_by_id("q2").unwrap().option_ids, vec!["o9"]);
}

#[test]
fn submissions_are_keyed_by_exam_and_student() {
    let mut store = EntityStore::new();
    store.upsert_many(vec![submission("ada", None), submission("bob", Some(0))]);
    store.upsert_one(submission("ada", Some(4)));

    assert_eq!(store.len(), 2);
    let ada = store.get_by_id(&SubmissionKey::new("E1", "ada")).unwrap();
    assert_eq!(ada.marks, Some(4));

    // An ungraded copy does not erase an existing grade.
    store.upsert_one(submission("bob", None));
    let bob = store.get_by_id(&SubmissionKey::new("E1", "bob")).unwrap();
    assert_eq!(bob.marks, Some(0));
}

#[test]
fn fresh_state_is_idle_everywhere() {
    let state = AppState::new();
    assert!(state.statuses().iter().all(|(_, status)| *status == Status::Idle));
}
