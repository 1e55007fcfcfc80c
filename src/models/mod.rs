// src/models/mod.rs

pub mod exam;
pub mod question;
pub mod question_option;
pub mod subject;
pub mod submission;
pub mod user;

use std::fmt;

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use validator::Validate;

use crate::{
    error::GatewayError,
    events::Relation,
    state::AppState,
    store::{Collection, Entity},
};

pub use exam::{Exam, ExamCreate, ExamPhase, ExamUpdate, SubmissionSummary};
pub use question::{Question, QuestionCreate, QuestionType, QuestionUpdate};
pub use question_option::{QuestionOption, QuestionOptionCreate, QuestionOptionUpdate};
pub use subject::{Subject, SubjectCreate, SubjectUpdate};
pub use submission::{
    ExamSubmission, QuestionSubmission, SubmissionCreate, SubmissionKey, SubmissionMeta,
    SubmissionUpdate,
};
pub use user::{Role, User, UserCreate, UserUpdate};

/// The entity kinds mirrored locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    Subject,
    Exam,
    Question,
    Option,
    User,
    ExamSubmission,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Subject => "subjects",
            EntityKind::Exam => "exams",
            EntityKind::Question => "questions",
            EntityKind::Option => "options",
            EntityKind::User => "users",
            EntityKind::ExamSubmission => "examSubmissions",
        };
        f.write_str(name)
    }
}

/// Opaque token naming the observed state of a record upstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionTag(String);

impl VersionTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An entity kind the gateway can fetch, create, update and delete.
///
/// Ties the record type to its payload types, its slot in [`AppState`], its
/// upstream routes and, for child kinds, the relation it belongs to.
pub trait Resource: Entity + Serialize + DeserializeOwned + Send + Sync + 'static {
    const KIND: EntityKind;

    /// Parent relation whose child-id list tracks this kind.
    const RELATION: Option<Relation> = None;

    type Create: Serialize + Validate + Send + Sync;
    type Update: Serialize + Validate + Send + Sync;

    fn collection(state: &AppState) -> &Collection<Self>;
    fn collection_mut(state: &mut AppState) -> &mut Collection<Self>;

    /// Id of the record this one hangs under, if the kind has a parent.
    fn parent_id(&self) -> Option<&str>;

    fn collection_path(parent_id: Option<&str>) -> String;
    fn member_path(id: &Self::Id) -> String;

    /// Builds a fresh record from a create payload. `id` is server-assigned.
    fn materialize(
        id: String,
        parent_id: Option<&str>,
        payload: &Self::Create,
    ) -> Result<Self, GatewayError>;

    /// Records created together with this one in a single request, as
    /// `(kind, record)` rows. Child ids come from `next_id` and are recorded
    /// on `self`.
    fn materialize_children(
        &mut self,
        _payload: &Self::Create,
        _next_id: &mut dyn FnMut() -> String,
    ) -> Result<Vec<(EntityKind, Value)>, GatewayError> {
        Ok(Vec::new())
    }

    fn apply_update(&mut self, payload: &Self::Update);

    /// Whether updates must present the current version tag.
    fn is_versioned() -> bool {
        false
    }

    fn version_tag(&self) -> Option<&VersionTag> {
        None
    }

    fn set_version_tag(&mut self, _tag: VersionTag) {}
}

/// Rejects a create that needs a parent but has none.
pub(crate) fn require_parent<'a>(
    kind: EntityKind,
    parent_id: Option<&'a str>,
) -> Result<&'a str, GatewayError> {
    parent_id.ok_or_else(|| {
        GatewayError::ValidationFailure(format!("{kind} must be created under a parent"))
    })
}
