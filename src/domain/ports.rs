use crate::domain::model::{ConnectionParams, ItemRecord, ObjectKind};
use crate::utils::error::Result;
use async_trait::async_trait;

/// A session on the remote business-object API.
///
/// Status-returning methods follow the remote convention: `0` is success and
/// any other value means the call was rejected, with the reason available
/// from [`Company::last_error_description`]. `Err` is reserved for transport
/// and local failures.
#[async_trait]
pub trait Company: Send + Sync {
    type Object: BusinessObject;

    fn is_connected(&self) -> bool;

    async fn connect(&mut self, params: &ConnectionParams) -> Result<i32>;

    fn business_object(&self, kind: ObjectKind) -> Result<Self::Object>;

    fn last_error_description(&self) -> String;

    async fn disconnect(&mut self) -> Result<()>;
}

#[async_trait]
pub trait BusinessObject: Send {
    /// Returns `false` when no object with this key exists.
    async fn load_by_key(&mut self, key: &str) -> Result<bool>;

    fn set_field(&mut self, name: &str, value: serde_json::Value) -> Result<()>;

    async fn commit(&mut self) -> Result<i32>;
}

/// Decides which remote fields a record changes.
pub trait FieldUpdateStrategy: Send + Sync {
    fn assignments(&self, item: &ItemRecord) -> Result<Vec<(String, serde_json::Value)>>;
}
