// src/gateway/mod.rs

pub mod http;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{
    error::GatewayError,
    models::{Resource, VersionTag},
};

pub use http::HttpGateway;
pub use memory::MemoryGateway;

/// The upstream authority for every record kind.
///
/// Implementations own transport concerns (routes, headers, timeouts). The
/// session never retries; every failure comes back as a [`GatewayError`].
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Full child collection of `parent_id` (or the whole kind for root kinds), in server order.
    async fn fetch_collection<T: Resource>(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<T>, GatewayError>;

    /// Creates a record. The returned copy carries the server-assigned id and,
    /// for versioned kinds, the initial version tag.
    async fn create_entity<T: Resource>(
        &self,
        parent_id: Option<&str>,
        payload: &T::Create,
    ) -> Result<T, GatewayError>;

    /// Applies an update. Versioned kinds must present their current tag and
    /// get a new one back; a stale tag yields `Conflict`.
    async fn update_entity<T: Resource>(
        &self,
        id: &T::Id,
        payload: &T::Update,
        version_tag: Option<&VersionTag>,
    ) -> Result<T, GatewayError>;

    async fn delete_entity<T: Resource>(&self, id: &T::Id) -> Result<(), GatewayError>;
}

#[async_trait]
impl<G: Gateway> Gateway for Arc<G> {
    async fn fetch_collection<T: Resource>(
        &self,
        parent_id: Option<&str>,
    ) -> Result<Vec<T>, GatewayError> {
        (**self).fetch_collection::<T>(parent_id).await
    }

    async fn create_entity<T: Resource>(
        &self,
        parent_id: Option<&str>,
        payload: &T::Create,
    ) -> Result<T, GatewayError> {
        (**self).create_entity::<T>(parent_id, payload).await
    }

    async fn update_entity<T: Resource>(
        &self,
        id: &T::Id,
        payload: &T::Update,
        version_tag: Option<&VersionTag>,
    ) -> Result<T, GatewayError> {
        (**self).update_entity::<T>(id, payload, version_tag).await
    }

    async fn delete_entity<T: Resource>(&self, id: &T::Id) -> Result<(), GatewayError> {
        (**self).delete_entity::<T>(id).await
    }
}
