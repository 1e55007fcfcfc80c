// tests/race_tests.rs

use std::sync::Mutex;

use async_trait::async_trait;
use exam_cache::{
    Gateway, GatewayError, Session, AppState,
    models::{Exam, Resource, VersionTag},
    store::Status,
};
use serde_json::{Value, json};
use tokio::sync::oneshot;
use tokio::task::yield_now;

type Reply = Result<Value, GatewayError>;

/// Gateway whose fetches park until the test releases them, so overlapping
/// fetches can be settled in a chosen order.
#[derive(Default)]
struct ScriptedGateway {
    pending: Mutex<Vec<oneshot::Sender<Reply>>>,
}

impl ScriptedGateway {
    fn waiting(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    /// Settles the oldest parked fetch.
    fn release(&self, reply: Reply) {
        let tx = self.pending.lock().unwrap().remove(0);
        tx.send(reply).expect("fetch was dropped");
    }
}

fn unscripted() -> GatewayError {
    GatewayError::NetworkFailure("not scripted".to_string())
}

#[async_trait]
impl Gateway for ScriptedGateway {
    async fn fetch_collection<T: Resource>(
        &self,
        _parent_id: Option<&str>,
    ) -> Result<Vec<T>, GatewayError> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().push(tx);
        let value = rx.await.map_err(|_| unscripted())??;
        Ok(serde_json::from_value(value)?)
    }

    async fn create_entity<T: Resource>(
        &self,
        _parent_id: Option<&str>,
        _payload: &T::Create,
    ) -> Result<T, GatewayError> {
        Err(unscripted())
    }

    async fn update_entity<T: Resource>(
        &self,
        _id: &T::Id,
        _payload: &T::Update,
        _version_tag: Option<&VersionTag>,
    ) -> Result<T, GatewayError> {
        Err(unscripted())
    }

    async fn delete_entity<T: Resource>(&self, _id: &T::Id) -> Result<(), GatewayError> {
        Err(unscripted())
    }
}

fn session_with_exam() -> Session<ScriptedGateway> {
    let mut state = AppState::new();
    let exam: Exam = serde_json::from_value(json!({
        "id": "E1",
        "subjectId": "S1",
        "name": "Midterm",
        "description": "",
        "startTime": "2026-03-01T09:00:00Z",
        "finishTime": "2026-03-01T11:00:00Z",
    }))
    .unwrap();
    state.exams.store.upsert_one(exam);
    Session::with_state(ScriptedGateway::default(), state)
}

fn q(id: &str, marks: u32) -> Value {
    json!({ "id": id, "examId": "E1", "question": "?", "type": "SHORT_ANSWER", "marks": marks })
}

/// Releases the two parked fetches one after the other, waiting for the first
/// to commit before releasing the second.
async fn settle_in_order(session: &Session<ScriptedGateway>, first: Reply, second: Reply) {
    while session.gateway().waiting() < 2 {
        yield_now().await;
    }
    session.gateway().release(first);
    while session.read(|s| s.questions.tracker.in_flight()) > 1 {
        yield_now().await;
    }
    session.gateway().release(second);
}

#[tokio::test]
async fn overlapping_fetches_replace_not_union() {
    let session = session_with_exam();

    let (a, b, ()) = tokio::join!(
        session.fetch_questions("E1"),
        session.fetch_questions("E1"),
        settle_in_order(
            &session,
            Ok(json!([q("q1", 5), q("q2", 10)])),
            Ok(json!([q("q2", 10), q("q3", 1)])),
        ),
    );
    a.unwrap();
    b.unwrap();

    session.read(|s| {
        assert_eq!(s.exams.store.get_by_id("E1").unwrap().question_ids, vec!["q2", "q3"]);
        // Both commits landed in the store.
        assert_eq!(s.questions.store.ids(), &["q1", "q2", "q3"]);
        assert_eq!(s.questions.tracker.status(), Status::Finished);
    });
}

#[tokio::test]
async fn later_data_wins_per_record() {
    let session = session_with_exam();

    let _ = tokio::join!(
        session.fetch_questions("E1"),
        session.fetch_questions("E1"),
        settle_in_order(
            &session,
            Ok(json!([q("q1", 5), q("q2", 10)])),
            Ok(json!([q("q2", 12)])),
        ),
    );

    session.read(|s| {
        assert_eq!(s.questions.store.get_by_id("q1").unwrap().marks, 5);
        assert_eq!(s.questions.store.get_by_id("q2").unwrap().marks, 12);
    });
}

#[tokio::test]
async fn status_follows_last_settled_fetch() {
    let session = session_with_exam();

    let (ok, err, ()) = tokio::join!(
        session.fetch_questions("E1"),
        session.fetch_questions("E1"),
        settle_in_order(
            &session,
            Ok(json!([q("q1", 5)])),
            Err(GatewayError::NetworkFailure("reset".to_string())),
        ),
    );
    assert!(ok.is_ok() != err.is_ok());

    session.read(|s| {
        assert_eq!(s.questions.tracker.status(), Status::Error);
        // The failed fetch did not undo the successful one.
        assert!(s.questions.store.contains("q1"));
        assert_eq!(s.exams.store.get_by_id("E1").unwrap().question_ids, vec!["q1"]);
    });

    let (ok, err, ()) = tokio::join!(
        session.fetch_questions("E1"),
        session.fetch_questions("E1"),
        settle_in_order(
            &session,
            Err(GatewayError::NetworkFailure("reset".to_string())),
            Ok(json!([q("q1", 5)])),
        ),
    );
    assert!(ok.is_ok() != err.is_ok());
    assert_eq!(session.read(|s| s.questions.tracker.status()), Status::Finished);
}

#[tokio::test]
async fn readers_see_loading_until_every_fetch_settles() {
    let session = session_with_exam();
    let mut seen = Vec::new();

    let observe = async {
        while session.gateway().waiting() < 1 {
            yield_now().await;
        }
        seen.push(session.read(|s| s.questions.tracker.status()));
        session.gateway().release(Ok(json!([q("q1", 5)])));
    };
    let (result, ()) = tokio::join!(session.fetch_questions("E1"), observe);
    result.unwrap();
    seen.push(session.read(|s| s.questions.tracker.status()));

    assert_eq!(seen, vec![Status::Loading, Status::Finished]);
}
