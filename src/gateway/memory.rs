// src/gateway/memory.rs

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::GatewayError,
    models::{EntityKind, Resource, VersionTag},
    store::Entity,
};

use super::Gateway;

#[derive(Debug, Clone)]
struct Row {
    record: Value,
    version: VersionTag,
}

type Tables = HashMap<EntityKind, Vec<Row>>;

/// In-process stand-in for the exam API.
///
/// Keeps one JSON row per record, assigns UUID ids and a fresh version tag on
/// every write, enforces version tags on versioned kinds, and appends new
/// children to their parent's id list the way the real server does. Records
/// created inline with a parent (a question's options) get their own rows.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    tables: Mutex<Tables>,
    failures: Mutex<VecDeque<GatewayError>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads records as if they already existed upstream.
    pub fn seed<T, I>(&self, records: I) -> Result<(), GatewayError>
    where
        T: Resource,
        I: IntoIterator<Item = T>,
    {
        let mut tables = self.tables();
        let rows = tables.entry(T::KIND).or_default();
        for record in records {
            rows.push(Row {
                record: serde_json::to_value(&record)?,
                version: fresh_tag(),
            });
        }
        Ok(())
    }

    /// Makes the next gateway call, of any kind, fail with `err`.
    pub fn fail_next(&self, err: GatewayError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(err);
    }

    /// Server-side view of a kind, for assertions.
    pub fn records<T: Resource>(&self) -> Result<Vec<T>, GatewayError> {
        let tables = self.tables();
        tables
            .get(&T::KIND)
            .map(|rows| rows.iter().map(decode::<T>).collect())
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    pub fn version_of<T: Resource>(&self, id: &T::Id) -> Option<VersionTag> {
        let tables = self.tables();
        let rows = tables.get(&T::KIND)?;
        let idx = position::<T>(rows, id).ok().flatten()?;
        Some(rows[idx].version.clone())
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_failure(&self) -> Result<(), GatewayError> {
        match self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn fresh_tag() -> VersionTag {
    VersionTag::new(format!("\"{}\"", Uuid::new_v4().simple()))
}

fn decode<T: Resource>(row: &Row) -> Result<T, GatewayError> {
    let mut record: T = serde_json::from_value(row.record.clone())?;
    if T::is_versioned() {
        record.set_version_tag(row.version.clone());
    }
    Ok(record)
}

fn position<T: Resource>(rows: &[Row], id: &T::Id) -> Result<Option<usize>, GatewayError> {
    for (idx, row) in rows.iter().enumerate() {
        if decode::<T>(row)?.id() == id {
            return Ok(Some(idx));
        }
    }
    Ok(None)
}

fn not_found<T: Resource>(id: &T::Id) -> GatewayError {
    GatewayError::NotFound(format!("{} {id}", T::KIND))
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn fetch_collection<T: Resource>(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<T>, GatewayError> {
        self.take_failure()?;

        let tables = self.tables();
        let Some(rows) = tables.get(&T::KIND) else {
            return Ok(Vec::new());
        };

        let mut out = Vec::new();
        for row in rows {
            let record = decode::<T>(row)?;
            if parent_id.is_none() || record.parent_id() == parent_id {
                out.push(record);
            }
        }
        Ok(out)
    }

    async fn create_entity<T: Resource>(
        &self,
        parent_id: Option<&str>,
        payload: &T::Create,
    ) -> Result<T, GatewayError> {
        self.take_failure()?;
        payload.validate()?;

        let mut record = T::materialize(Uuid::new_v4().to_string(), parent_id, payload)?;
        let children = record.materialize_children(payload, &mut || Uuid::new_v4().to_string())?;

        let mut tables = self.tables();
        let rows = tables.entry(T::KIND).or_default();
        if position::<T>(rows, record.id())?.is_some() {
            return Err(GatewayError::Conflict(format!(
                "{} {} already exists",
                T::KIND,
                record.id()
            )));
        }

        let version = fresh_tag();
        rows.push(Row {
            record: serde_json::to_value(&record)?,
            version: version.clone(),
        });

        for (kind, child) in children {
            tables.entry(kind).or_default().push(Row {
                record: child,
                version: fresh_tag(),
            });
        }

        if let (Some(relation), Some(parent)) = (T::RELATION, record.parent_id()) {
            let child_id = record.id().to_string();
            let parent_row = tables
                .get_mut(&relation.parent_kind())
                .and_then(|rows| rows.iter_mut().find(|r| r.record["id"] == parent));
            if let Some(Value::Object(fields)) = parent_row.map(|r| &mut r.record) {
                let list = fields
                    .entry(relation.child_field())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if let Value::Array(ids) = list {
                    ids.push(Value::String(child_id));
                }
            }
        }

        if T::is_versioned() {
            record.set_version_tag(version);
        }
        Ok(record)
    }

    async fn update_entity<T: Resource>(
        &self,
        id: &T::Id,
        payload: &T::Update,
        version_tag: Option<&VersionTag>,
    ) -> Result<T, GatewayError> {
        self.take_failure()?;
        payload.validate()?;

        let mut tables = self.tables();
        let rows = tables.get_mut(&T::KIND).ok_or_else(|| not_found::<T>(id))?;
        let idx = position::<T>(rows, id)?.ok_or_else(|| not_found::<T>(id))?;
        let row = &mut rows[idx];

        if T::is_versioned() {
            match version_tag {
                None => {
                    return Err(GatewayError::ValidationFailure(format!(
                        "{} {id} requires a version tag",
                        T::KIND
                    )));
                }
                Some(tag) if *tag != row.version => {
                    return Err(GatewayError::Conflict(format!(
                        "{} {id} was modified concurrently (expected {}, presented {tag})",
                        T::KIND,
                        row.version
                    )));
                }
                Some(_) => {}
            }
        }

        let mut record = decode::<T>(row)?;
        record.apply_update(payload);

        let version = fresh_tag();
        if T::is_versioned() {
            record.set_version_tag(version.clone());
        }
        row.record = serde_json::to_value(&record)?;
        row.version = version;

        Ok(record)
    }

    async fn delete_entity<T: Resource>(&self, id: &T::Id) -> Result<(), GatewayError> {
        self.take_failure()?;

        let mut tables = self.tables();
        let rows = tables.get_mut(&T::KIND).ok_or_else(|| not_found::<T>(id))?;
        let idx = position::<T>(rows, id)?.ok_or_else(|| not_found::<T>(id))?;
        rows.remove(idx);
        Ok(())
    }
}
