pub mod connection;
pub mod engine;
pub mod loader;
pub mod strategy;
pub mod updater;

pub use crate::domain::model::{BatchReport, ConnectionParams, ItemOutcome, ItemRecord, RecordStatus};
pub use crate::domain::ports::{BusinessObject, Company, FieldUpdateStrategy};
pub use crate::utils::error::Result;
