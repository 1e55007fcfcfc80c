// src/models/subject.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::GatewayError,
    state::AppState,
    store::{Collection, Entity, merge_list},
};

use super::{EntityKind, Resource};

static SLUG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("slug pattern is valid"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,

    /// URL-friendly unique name, e.g. "swen90007".
    pub slug: String,

    pub name: String,
    pub description: String,

    /// Ids of enrolled students, in server order.
    #[serde(default)]
    pub students: Vec<String>,
}

impl Subject {
    pub fn is_enrolled(&self, user_id: &str) -> bool {
        self.students.iter().any(|s| s == user_id)
    }
}

/// DTO for creating a new subject.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubjectCreate {
    #[validate(regex(path = *SLUG_RE, message = "Slug must be lowercase words separated by '-'."))]
    pub slug: String,
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: String,
    #[serde(default)]
    pub students: Vec<String>,
}

/// DTO for updating a subject. Fields are optional.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubjectUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    pub students: Option<Vec<String>>,
}

impl Entity for Subject {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn merge(&mut self, incoming: Self) {
        self.slug = incoming.slug;
        self.name = incoming.name;
        self.description = incoming.description;
        merge_list(&mut self.students, incoming.students);
    }
}

impl Resource for Subject {
    const KIND: EntityKind = EntityKind::Subject;

    type Create = SubjectCreate;
    type Update = SubjectUpdate;

    fn collection(state: &AppState) -> &Collection<Self> {
        &state.subjects
    }

    fn collection_mut(state: &mut AppState) -> &mut Collection<Self> {
        &mut state.subjects
    }

    fn parent_id(&self) -> Option<&str> {
        None
    }

    fn collection_path(_parent_id: Option<&str>) -> String {
        "api/subjects".to_string()
    }

    fn member_path(id: &String) -> String {
        format!("api/subjects/{id}")
    }

    fn materialize(
        id: String,
        _parent_id: Option<&str>,
        payload: &SubjectCreate,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            id,
            slug: payload.slug.clone(),
            name: payload.name.clone(),
            description: payload.description.clone(),
            students: payload.students.clone(),
        })
    }

    fn apply_update(&mut self, payload: &SubjectUpdate) {
        if let Some(name) = &payload.name {
            self.name = name.clone();
        }
        if let Some(description) = &payload.description {
            self.description = description.clone();
        }
        if let Some(students) = &payload.students {
            self.students = students.clone();
        }
    }
}
