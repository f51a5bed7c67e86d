//! # Storage Traits
//!
//! The backend keeps client-side state (saved campaign lists) behind a
//! narrow key-value interface so the domain layer does not care where the
//! values live.

use anyhow::Result;
use async_trait::async_trait;

/// Trait defining the interface for raw key-value storage
///
/// Values are opaque strings; callers are responsible for encoding.
#[async_trait]
pub trait ValueStore: Send + Sync {
    /// Retrieve a value by its key
    async fn get_value(&self, key: &str) -> Result<Option<String>>;

    /// Store a value, overwriting any existing value for the same key
    async fn put_value(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a key
    /// Returns true if the key existed
    async fn delete_value(&self, key: &str) -> Result<bool>;
}
