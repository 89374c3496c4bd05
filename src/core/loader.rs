//! Backend loader abstraction consuming compiled request trees

use crate::core::request::{CollectionRequest, KeyCriteria, ObjectRequest};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// A fetched row, shaped after the request that loaded it
pub type Row = Map<String, Value>;

/// Identity constraints of one batch member, combined as AND
pub type KeyCondition = Vec<KeyCriteria>;

/// Executes compiled requests against a concrete store
///
/// Implementations receive immutable request trees and may use their criteria
/// as batch or cache keys without re-validating them. The compiler never
/// depends on which implementation runs a request.
#[async_trait]
pub trait BackendLoader: Send + Sync {
    /// Load the single row matching the request's key and filter criteria
    async fn load_single(&self, request: &ObjectRequest) -> Result<Option<Row>>;

    /// Load all rows matching the request, sorted and paged
    async fn load_many(&self, request: &CollectionRequest) -> Result<Vec<Row>>;

    /// Load one row per key condition, sharing the request shape
    ///
    /// The result keeps the order of `keys`.
    async fn batch_load_single(
        &self,
        keys: &[KeyCondition],
        request: &ObjectRequest,
    ) -> Result<Vec<(KeyCondition, Option<Row>)>>;

    /// Load the rows of every key condition, sharing the request shape
    ///
    /// The result keeps the order of `keys`.
    async fn batch_load_many(
        &self,
        keys: &[KeyCondition],
        request: &CollectionRequest,
    ) -> Result<Vec<(KeyCondition, Vec<Row>)>>;
}
