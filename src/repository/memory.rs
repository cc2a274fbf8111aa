use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use super::{
    Entity, Filter, Repository, RepositoryError, Store, VillaNumberRepository, VillaRepository,
};
use crate::models::{Villa, VillaNumber};

#[derive(Debug)]
pub struct Table<T> {
    rows: BTreeMap<i32, T>,
    next_key: i32,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_key: 1,
        }
    }
}

impl<T: Entity> Table<T> {
    fn from_rows(rows: impl IntoIterator<Item = T>) -> Self {
        let rows: BTreeMap<i32, T> = rows.into_iter().map(|row| (row.key(), row)).collect();
        let next_key = rows.keys().next_back().map_or(1, |key| key + 1);
        Self { rows, next_key }
    }

    fn apply(&mut self, changes: Vec<Change<T>>) -> Result<(), RepositoryError> {
        let mut rows = self.rows.clone();
        for change in changes {
            match change {
                Change::Insert(row) => {
                    let key = row.key();
                    if rows.insert(key, row).is_some() {
                        return Err(RepositoryError::Conflict { table: T::TABLE });
                    }
                }
                Change::Replace(row) => {
                    let key = row.key();
                    match rows.get_mut(&key) {
                        Some(existing) => *existing = row,
                        None => return Err(RepositoryError::NotFound { table: T::TABLE, key }),
                    }
                }
                Change::Remove(key) => {
                    if rows.remove(&key).is_none() {
                        return Err(RepositoryError::NotFound { table: T::TABLE, key });
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        for value in rows.values().filter_map(T::unique_value) {
            if !seen.insert(value) {
                return Err(RepositoryError::Conflict { table: T::TABLE });
            }
        }

        self.rows = rows;
        Ok(())
    }
}

pub type SharedTable<T> = Arc<RwLock<Table<T>>>;

enum Change<T> {
    Insert(T),
    Replace(T),
    Remove(i32),
}

/// Repository over an in-process table.
///
/// Staged changes are applied all-or-nothing on `save`. Reads always see
/// committed rows; there is no row locking, so `tracked` has no effect.
pub struct MemoryRepository<T> {
    table: SharedTable<T>,
    pending: Mutex<Vec<Change<T>>>,
}

impl<T: Entity> MemoryRepository<T> {
    pub fn new(table: SharedTable<T>) -> Self {
        Self {
            table,
            pending: Mutex::new(Vec::new()),
        }
    }

    fn stage(&self, change: Change<T>) -> Result<(), RepositoryError> {
        self.pending
            .lock()
            .map_err(|_| RepositoryError::LockPoisoned)?
            .push(change);
        Ok(())
    }

    fn matching(&self, filter: Option<&Filter>) -> Result<Vec<T>, RepositoryError> {
        let table = self.table.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(table
            .rows
            .values()
            .filter(|row| filter.map_or(true, |f| f.matches(*row)))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl<T: Entity> Repository<T> for MemoryRepository<T> {
    async fn create(&self, mut entity: T) -> Result<T, RepositoryError> {
        if T::GENERATED_KEY {
            let mut table = self.table.write().map_err(|_| RepositoryError::LockPoisoned)?;
            entity.set_key(table.next_key);
            table.next_key += 1;
        }
        self.stage(Change::Insert(entity.clone()))?;
        Ok(entity)
    }

    async fn get(&self, filter: Option<Filter>, _tracked: bool) -> Result<Option<T>, RepositoryError> {
        Ok(self.matching(filter.as_ref())?.into_iter().next())
    }

    async fn get_all(&self, filter: Option<Filter>) -> Result<Vec<T>, RepositoryError> {
        self.matching(filter.as_ref())
    }

    async fn remove(&self, entity: &T) -> Result<(), RepositoryError> {
        self.stage(Change::Remove(entity.key()))
    }

    async fn replace(&self, entity: &T) -> Result<(), RepositoryError> {
        self.stage(Change::Replace(entity.clone()))
    }

    async fn save(&self) -> Result<(), RepositoryError> {
        let changes = std::mem::take(
            &mut *self.pending.lock().map_err(|_| RepositoryError::LockPoisoned)?,
        );
        if changes.is_empty() {
            return Ok(());
        }
        let mut table = self.table.write().map_err(|_| RepositoryError::LockPoisoned)?;
        table.apply(changes)
    }
}

impl VillaRepository for MemoryRepository<Villa> {}

impl VillaNumberRepository for MemoryRepository<VillaNumber> {}

/// Store kept entirely in process memory.
#[derive(Clone, Default)]
pub struct MemoryStore {
    villas: SharedTable<Villa>,
    villa_numbers: SharedTable<VillaNumber>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store holding the two sample villas served when no database is configured.
    pub fn seeded() -> Self {
        let now = Utc::now();
        let sample = |id: i32, name: &str, sqft: i32, occupancy: i32| Villa {
            id,
            name: name.to_string(),
            details: String::new(),
            rate: 3000.0,
            sqft,
            occupancy,
            image_url: String::new(),
            amenity: String::new(),
            created_date: now,
            updated_date: None,
        };

        Self {
            villas: Arc::new(RwLock::new(Table::from_rows([
                sample(1, "Pool View", 100, 4),
                sample(2, "Beach View", 300, 3),
            ]))),
            villa_numbers: SharedTable::default(),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    fn villas(&self) -> Box<dyn VillaRepository> {
        Box::new(MemoryRepository::new(self.villas.clone()))
    }

    fn villa_numbers(&self) -> Box<dyn VillaNumberRepository> {
        Box::new(MemoryRepository::new(self.villa_numbers.clone()))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.villas.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(())
    }
}
