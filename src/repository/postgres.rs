use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tokio::sync::{Mutex, MutexGuard};

use super::filter::push_bind_value;
use super::{
    Entity, Filter, Repository, RepositoryError, Store, Value, VillaNumberRepository,
    VillaRepository,
};
use crate::models::{Villa, VillaNumber};

type Columns = Vec<(&'static str, Value)>;

/// Transaction shared by the writes and tracked reads of one repository.
///
/// Opened on first use and committed by `commit`. Dropping it with the
/// transaction still open rolls it back.
struct UnitOfWork {
    pool: PgPool,
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

impl UnitOfWork {
    fn new(pool: PgPool) -> Self {
        Self {
            pool,
            tx: Mutex::new(None),
        }
    }

    async fn begin(
        &self,
    ) -> Result<MutexGuard<'_, Option<Transaction<'static, Postgres>>>, RepositoryError> {
        let mut guard = self.tx.lock().await;
        if guard.is_none() {
            *guard = Some(self.pool.begin().await?);
        }
        Ok(guard)
    }

    async fn commit(&self, table: &'static str) -> Result<(), RepositoryError> {
        let tx = self.tx.lock().await.take();
        if let Some(tx) = tx {
            tx.commit().await.map_err(|e| write_error(table, e))?;
            tracing::debug!(table, "Committed unit of work");
        }
        Ok(())
    }
}

fn write_error(table: &'static str, err: sqlx::Error) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict { table }
        }
        _ => RepositoryError::Database(err),
    }
}

fn select_query(
    table: &str,
    key: &str,
    filter: Option<&Filter>,
    single: bool,
    tracked: bool,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT * FROM {}", table));
    if let Some(filter) = filter {
        qb.push(" WHERE ");
        filter.push_sql(&mut qb);
    }
    qb.push(format!(" ORDER BY {}", key));
    if single {
        qb.push(" LIMIT 1");
    }
    if tracked {
        qb.push(" FOR UPDATE");
    }
    qb
}

fn insert_query(table: &str, columns: Columns) -> QueryBuilder<'static, Postgres> {
    let names: Vec<&str> = columns.iter().map(|(column, _)| *column).collect();
    let mut qb = QueryBuilder::new(format!("INSERT INTO {} ({}) VALUES (", table, names.join(", ")));
    for (i, (_, value)) in columns.into_iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        push_bind_value(&mut qb, value);
    }
    qb.push(") RETURNING *");
    qb
}

fn update_query(table: &str, key: &str, id: i32, columns: Columns) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", table));
    let columns = columns.into_iter().filter(|(column, _)| *column != key);
    for (i, (column, value)) in columns.enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(column).push(" = ");
        push_bind_value(&mut qb, value);
    }
    qb.push(format!(" WHERE {} = ", key));
    qb.push_bind(id);
    qb
}

fn delete_query(table: &str, key: &str, id: i32) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("DELETE FROM {} WHERE {} = ", table, key));
    qb.push_bind(id);
    qb
}

/// Villas stored in the `villas` table. The id comes from the `SERIAL` column.
pub struct PgVillaRepository {
    uow: UnitOfWork,
}

impl PgVillaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            uow: UnitOfWork::new(pool),
        }
    }
}

#[async_trait]
impl Repository<Villa> for PgVillaRepository {
    async fn create(&self, villa: Villa) -> Result<Villa, RepositoryError> {
        let columns = villa
            .columns()
            .into_iter()
            .filter(|(column, _)| *column != Villa::ID)
            .collect();
        let mut qb = insert_query(Villa::TABLE, columns);

        let mut guard = self.uow.begin().await?;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;
        let created = qb
            .build_query_as::<Villa>()
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| write_error(Villa::TABLE, e))?;

        tracing::debug!(villa_id = created.id, "Staged villa insert");
        Ok(created)
    }

    async fn get(&self, filter: Option<Filter>, tracked: bool) -> Result<Option<Villa>, RepositoryError> {
        let mut qb = select_query(Villa::TABLE, Villa::KEY, filter.as_ref(), true, tracked);

        if tracked {
            let mut guard = self.uow.begin().await?;
            let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;
            Ok(qb.build_query_as::<Villa>().fetch_optional(&mut **tx).await?)
        } else {
            Ok(qb.build_query_as::<Villa>().fetch_optional(&self.uow.pool).await?)
        }
    }

    async fn get_all(&self, filter: Option<Filter>) -> Result<Vec<Villa>, RepositoryError> {
        let mut qb = select_query(Villa::TABLE, Villa::KEY, filter.as_ref(), false, false);
        Ok(qb.build_query_as::<Villa>().fetch_all(&self.uow.pool).await?)
    }

    async fn remove(&self, villa: &Villa) -> Result<(), RepositoryError> {
        let mut qb = delete_query(Villa::TABLE, Villa::KEY, villa.id);

        let mut guard = self.uow.begin().await?;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;
        let result = qb.build().execute(&mut **tx).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                table: Villa::TABLE,
                key: villa.id,
            });
        }

        tracing::debug!(villa_id = villa.id, "Staged villa delete");
        Ok(())
    }

    async fn replace(&self, villa: &Villa) -> Result<(), RepositoryError> {
        let mut qb = update_query(Villa::TABLE, Villa::KEY, villa.id, villa.columns());

        let mut guard = self.uow.begin().await?;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;
        let result = qb
            .build()
            .execute(&mut **tx)
            .await
            .map_err(|e| write_error(Villa::TABLE, e))?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                table: Villa::TABLE,
                key: villa.id,
            });
        }

        tracing::debug!(villa_id = villa.id, "Staged villa update");
        Ok(())
    }

    async fn save(&self) -> Result<(), RepositoryError> {
        self.uow.commit(Villa::TABLE).await
    }
}

impl VillaRepository for PgVillaRepository {}

/// Villa numbers stored in the `villa_numbers` table, keyed by the caller's number.
pub struct PgVillaNumberRepository {
    uow: UnitOfWork,
}

impl PgVillaNumberRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            uow: UnitOfWork::new(pool),
        }
    }
}

#[async_trait]
impl Repository<VillaNumber> for PgVillaNumberRepository {
    async fn create(&self, number: VillaNumber) -> Result<VillaNumber, RepositoryError> {
        let mut qb = insert_query(VillaNumber::TABLE, number.columns());

        let mut guard = self.uow.begin().await?;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;
        let created = qb
            .build_query_as::<VillaNumber>()
            .fetch_one(&mut **tx)
            .await
            .map_err(|e| write_error(VillaNumber::TABLE, e))?;

        tracing::debug!(villa_no = created.villa_no, "Staged villa number insert");
        Ok(created)
    }

    async fn get(
        &self,
        filter: Option<Filter>,
        tracked: bool,
    ) -> Result<Option<VillaNumber>, RepositoryError> {
        let mut qb = select_query(
            VillaNumber::TABLE,
            VillaNumber::KEY,
            filter.as_ref(),
            true,
            tracked,
        );

        if tracked {
            let mut guard = self.uow.begin().await?;
            let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;
            Ok(qb.build_query_as::<VillaNumber>().fetch_optional(&mut **tx).await?)
        } else {
            Ok(qb
                .build_query_as::<VillaNumber>()
                .fetch_optional(&self.uow.pool)
                .await?)
        }
    }

    async fn get_all(&self, filter: Option<Filter>) -> Result<Vec<VillaNumber>, RepositoryError> {
        let mut qb = select_query(
            VillaNumber::TABLE,
            VillaNumber::KEY,
            filter.as_ref(),
            false,
            false,
        );
        Ok(qb.build_query_as::<VillaNumber>().fetch_all(&self.uow.pool).await?)
    }

    async fn remove(&self, number: &VillaNumber) -> Result<(), RepositoryError> {
        let mut qb = delete_query(VillaNumber::TABLE, VillaNumber::KEY, number.villa_no);

        let mut guard = self.uow.begin().await?;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;
        let result = qb.build().execute(&mut **tx).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                table: VillaNumber::TABLE,
                key: number.villa_no,
            });
        }

        tracing::debug!(villa_no = number.villa_no, "Staged villa number delete");
        Ok(())
    }

    async fn replace(&self, number: &VillaNumber) -> Result<(), RepositoryError> {
        let mut qb = update_query(
            VillaNumber::TABLE,
            VillaNumber::KEY,
            number.villa_no,
            number.columns(),
        );

        let mut guard = self.uow.begin().await?;
        let tx = guard.as_mut().ok_or(RepositoryError::TransactionClosed)?;
        let result = qb.build().execute(&mut **tx).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                table: VillaNumber::TABLE,
                key: number.villa_no,
            });
        }

        tracing::debug!(villa_no = number.villa_no, "Staged villa number update");
        Ok(())
    }

    async fn save(&self) -> Result<(), RepositoryError> {
        self.uow.commit(VillaNumber::TABLE).await
    }
}

impl VillaNumberRepository for PgVillaNumberRepository {}

/// Store backed by a Postgres connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    fn villas(&self) -> Box<dyn VillaRepository> {
        Box::new(PgVillaRepository::new(self.pool.clone()))
    }

    fn villa_numbers(&self) -> Box<dyn VillaNumberRepository> {
        Box::new(PgVillaNumberRepository::new(self.pool.clone()))
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracked_select_locks_single_row() {
        let filter = Filter::eq(Villa::ID, 3);
        let qb = select_query(Villa::TABLE, Villa::KEY, Some(&filter), true, true);
        assert_eq!(
            qb.sql(),
            "SELECT * FROM villas WHERE id = $1 ORDER BY id LIMIT 1 FOR UPDATE"
        );
    }

    #[test]
    fn test_untracked_list_has_no_limit() {
        let qb = select_query(VillaNumber::TABLE, VillaNumber::KEY, None, false, false);
        assert_eq!(qb.sql(), "SELECT * FROM villa_numbers ORDER BY villa_no");
    }

    #[test]
    fn test_insert_binds_every_column() {
        let qb = insert_query(
            "villa_numbers",
            vec![("villa_no", Value::Int(101)), ("special_details", "Sea".into())],
        );
        assert_eq!(
            qb.sql(),
            "INSERT INTO villa_numbers (villa_no, special_details) VALUES ($1, $2) RETURNING *"
        );
    }

    #[test]
    fn test_update_skips_key_column() {
        let qb = update_query(
            "villas",
            "id",
            4,
            vec![("id", Value::Int(4)), ("name", "Royal".into()), ("rate", Value::Float(1.0))],
        );
        assert_eq!(qb.sql(), "UPDATE villas SET name = $1, rate = $2 WHERE id = $3");
    }

    #[test]
    fn test_delete_by_key() {
        let qb = delete_query("villas", "id", 9);
        assert_eq!(qb.sql(), "DELETE FROM villas WHERE id = $1");
    }
}
