// src/models/user.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    error::GatewayError,
    state::AppState,
    store::{Collection, Entity},
};

use super::{EntityKind, Resource};

/// User role as reported by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Student,
    Instructor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,

    #[serde(default)]
    pub email: String,

    /// User role: 'STUDENT' or 'INSTRUCTOR'.
    #[serde(rename = "type")]
    pub role: Role,
}

/// DTO for creating a user.
#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserCreate {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name length must be between 1 and 100 characters."
    ))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[serde(rename = "type")]
    pub role: Role,
}

/// DTO for updating a user. Fields are optional.
#[derive(Debug, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
}

impl Entity for User {
    type Id = String;

    fn id(&self) -> &String {
        &self.id
    }

    fn merge(&mut self, incoming: Self) {
        self.name = incoming.name;
        if !incoming.email.is_empty() {
            self.email = incoming.email;
        }
        self.role = incoming.role;
    }
}

impl Resource for User {
    const KIND: EntityKind = EntityKind::User;

    type Create = UserCreate;
    type Update = UserUpdate;

    fn collection(state: &AppState) -> &Collection<Self> {
        &state.users
    }

    fn collection_mut(state: &mut AppState) -> &mut Collection<Self> {
        &mut state.users
    }

    fn parent_id(&self) -> Option<&str> {
        None
    }

    fn collection_path(_parent_id: Option<&str>) -> String {
        "api/users".to_string()
    }

    fn member_path(id: &String) -> String {
        format!("api/users/{id}")
    }

    fn materialize(
        id: String,
        _parent_id: Option<&str>,
        payload: &UserCreate,
    ) -> Result<Self, GatewayError> {
        Ok(Self {
            id,
            name: payload.name.clone(),
            email: payload.email.clone(),
            role: payload.role,
        })
    }

    fn apply_update(&mut self, payload: &UserUpdate) {
        if let Some(name) = &payload.name {
            self.name = name.clone();
        }
        if let Some(email) = &payload.email {
            self.email = email.clone();
        }
    }
}
