//! Persistence layer.
//!
//! [`Repository`] is the generic set of operations every entity gets. Writes
//! are staged in the repository's unit of work and only become visible to
//! other repositories once [`Repository::save`] commits them; a repository
//! dropped before `save` discards what it staged.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{Villa, VillaNumber};

pub mod filter;
pub mod memory;
pub mod postgres;

pub use filter::Filter;
pub use memory::MemoryStore;
pub use postgres::{PgStore, PgVillaNumberRepository, PgVillaRepository};

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("No {table} row with key {key}")]
    NotFound { table: &'static str, key: i32 },

    /// The write would duplicate a key or unique value already stored.
    #[error("Write conflicts with an existing {table} row")]
    Conflict { table: &'static str },

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Transaction is no longer available")]
    TransactionClosed,
}

/// A single column value, used both for binding SQL parameters and for
/// evaluating filters in memory.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f64),
    Text(String),
    Timestamp(Option<DateTime<Utc>>),
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(Some(v))
    }
}

impl From<Option<DateTime<Utc>>> for Value {
    fn from(v: Option<DateTime<Utc>>) -> Self {
        Value::Timestamp(v)
    }
}

/// A record persisted in its own table under an integer key.
pub trait Entity: Clone + Send + Sync + 'static {
    const TABLE: &'static str;
    const KEY: &'static str;
    /// Whether the key is assigned by the store on insert rather than by the caller.
    const GENERATED_KEY: bool;

    fn key(&self) -> i32;

    fn set_key(&mut self, key: i32);

    /// Column values in table order, key included.
    fn columns(&self) -> Vec<(&'static str, Value)>;

    /// Case-folded value that must be unique across the table, besides the key.
    fn unique_value(&self) -> Option<String> {
        None
    }

    fn column(&self, name: &str) -> Option<Value> {
        self.columns()
            .into_iter()
            .find(|(column, _)| *column == name)
            .map(|(_, value)| value)
    }
}

/// Generic persistence operations over an entity type.
#[async_trait]
pub trait Repository<T: Entity>: Send + Sync {
    /// Stages an insert and returns the entity carrying its key.
    async fn create(&self, entity: T) -> Result<T, RepositoryError>;

    /// First entity (by key order) matching `filter`.
    ///
    /// A tracked read enrols the row in this repository's unit of work and
    /// holds it until `save`; an untracked read only sees committed state.
    async fn get(&self, filter: Option<Filter>, tracked: bool) -> Result<Option<T>, RepositoryError>;

    async fn get_all(&self, filter: Option<Filter>) -> Result<Vec<T>, RepositoryError>;

    async fn remove(&self, entity: &T) -> Result<(), RepositoryError>;

    /// Stages a full overwrite of the row sharing the entity's key.
    async fn replace(&self, entity: &T) -> Result<(), RepositoryError>;

    /// Commits everything staged since the last save.
    async fn save(&self) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait VillaRepository: Repository<Villa> {
    async fn update(&self, mut villa: Villa) -> Result<Villa, RepositoryError> {
        villa.updated_date = Some(Utc::now());
        self.replace(&villa).await?;
        Ok(villa)
    }
}

#[async_trait]
pub trait VillaNumberRepository: Repository<VillaNumber> {
    async fn update(&self, mut villa_number: VillaNumber) -> Result<VillaNumber, RepositoryError> {
        villa_number.updated_date = Some(Utc::now());
        self.replace(&villa_number).await?;
        Ok(villa_number)
    }
}

/// Hands out per-request repositories over one backing store.
#[async_trait]
pub trait Store: Send + Sync {
    fn backend(&self) -> &'static str;

    fn villas(&self) -> Box<dyn VillaRepository>;

    fn villa_numbers(&self) -> Box<dyn VillaNumberRepository>;

    /// Round-trips to the backing storage.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
