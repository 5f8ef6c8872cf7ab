//! Bulk import of the e-commerce CSV dataset.
//!
//! Every file is inserted row by row inside its own transaction and committed
//! once at the end. There is no upsert: loading a file twice hits the primary
//! key. A failing file is rolled back; files committed before it stay.

pub mod records;

use std::{
    fmt,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use clap::ValueEnum;
use sqlx::PgConnection;
use thiserror::Error;

use crate::db::DbPool;
use records::{
    CsvRecord, DistributionCenterRecord, InventoryItemRecord, OrderItemRecord, OrderRecord,
    ProductRecord, UserRecord,
};

/// Tables the loader knows about, declared in dependency order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum Table {
    DistributionCenters,
    Products,
    Users,
    Orders,
    InventoryItems,
    OrderItems,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::DistributionCenters,
        Table::Products,
        Table::Users,
        Table::Orders,
        Table::InventoryItems,
        Table::OrderItems,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::DistributionCenters => "distribution_centers",
            Table::Products => "products",
            Table::Users => "users",
            Table::Orders => "orders",
            Table::InventoryItems => "inventory_items",
            Table::OrderItems => "order_items",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{table}: cannot open {}: {source}", .path.display())]
    Io {
        table: Table,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{table} row {row}: {source}")]
    Parse {
        table: Table,
        row: usize,
        #[source]
        source: csv::Error,
    },

    #[error("{table} row {row}: {source}")]
    Insert {
        table: Table,
        row: usize,
        #[source]
        source: sqlx::Error,
    },

    #[error("{table}: {source}")]
    Database {
        table: Table,
        #[source]
        source: sqlx::Error,
    },
}

impl LoadError {
    /// True when a row collided with an existing primary key.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            LoadError::Insert { source, .. } => source
                .as_database_error()
                .is_some_and(|e| e.is_unique_violation()),
            _ => false,
        }
    }
}

/// Rows committed per table, in load order.
pub type LoadReport = Vec<(Table, u64)>;

/// `tables` deduplicated and sorted into dependency order.
pub fn load_order(tables: &[Table]) -> Vec<Table> {
    let mut selected = tables.to_vec();
    selected.sort();
    selected.dedup();
    selected
}

/// Load the selected tables from `data_dir`, always in dependency order.
pub async fn load_all(
    pool: &DbPool,
    data_dir: &Path,
    tables: &[Table],
) -> Result<LoadReport, LoadError> {
    let selected = load_order(tables);
    let mut report = Vec::with_capacity(selected.len());
    for table in selected {
        let rows = load_file(pool, data_dir, table).await?;
        report.push((table, rows));
    }
    Ok(report)
}

pub async fn load_file(pool: &DbPool, data_dir: &Path, table: Table) -> Result<u64, LoadError> {
    let path = data_dir.join(table.file_name());
    tracing::info!(%table, path = %path.display(), "loading");
    let file = File::open(&path).map_err(|source| LoadError::Io {
        table,
        path: path.clone(),
        source,
    })?;
    let rows = load_table(pool, table, file).await?;
    tracing::info!(%table, rows, "loaded");
    Ok(rows)
}

/// Insert every row of `reader` into `table` within one transaction.
pub async fn load_table<R: Read>(pool: &DbPool, table: Table, reader: R) -> Result<u64, LoadError> {
    match table {
        Table::DistributionCenters => load_records::<DistributionCenterRecord, _>(pool, table, reader).await,
        Table::Products => load_records::<ProductRecord, _>(pool, table, reader).await,
        Table::Users => {
            let rows = load_records::<UserRecord, _>(pool, table, reader).await?;
            sync_user_ids(pool).await?;
            Ok(rows)
        }
        Table::Orders => load_records::<OrderRecord, _>(pool, table, reader).await,
        Table::InventoryItems => load_records::<InventoryItemRecord, _>(pool, table, reader).await,
        Table::OrderItems => load_records::<OrderItemRecord, _>(pool, table, reader).await,
    }
}

async fn load_records<T, R>(pool: &DbPool, table: Table, reader: R) -> Result<u64, LoadError>
where
    T: CsvRecord,
    R: Read,
{
    let mut txn = pool
        .begin()
        .await
        .map_err(|source| LoadError::Database { table, source })?;

    match insert_rows::<T, R>(&mut *txn, table, reader).await {
        Ok(rows) => {
            txn.commit()
                .await
                .map_err(|source| LoadError::Database { table, source })?;
            Ok(rows)
        }
        Err(err) => {
            if let Err(rollback) = txn.rollback().await {
                tracing::warn!(%table, error = %rollback, "rollback failed");
            }
            Err(err)
        }
    }
}

async fn insert_rows<T, R>(conn: &mut PgConnection, table: Table, reader: R) -> Result<u64, LoadError>
where
    T: CsvRecord,
    R: Read,
{
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut rows = 0;
    for (idx, record) in rdr.deserialize::<T>().enumerate() {
        let row = idx + 1;
        let record = record.map_err(|source| LoadError::Parse { table, row, source })?;
        record
            .insert(conn)
            .await
            .map_err(|source| LoadError::Insert { table, row, source })?;
        rows += 1;
    }
    Ok(rows)
}

// Rows arrive with explicit ids; move the identity past them so that users
// created later by the chat endpoint do not collide.
async fn sync_user_ids(pool: &DbPool) -> Result<(), LoadError> {
    sqlx::query(
        "SELECT setval(pg_get_serial_sequence('users', 'id'), GREATEST((SELECT COALESCE(MAX(id), 0) FROM users), 1))",
    )
    .execute(pool)
    .await
    .map_err(|source| LoadError::Database {
        table: Table::Users,
        source,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_sort_into_dependency_order() {
        let tables = [Table::OrderItems, Table::Users, Table::Orders, Table::Users];
        assert_eq!(
            load_order(&tables),
            vec![Table::Users, Table::Orders, Table::OrderItems]
        );
        assert_eq!(Table::ALL.first(), Some(&Table::DistributionCenters));
    }

    #[test]
    fn file_names_match_table_names() {
        assert_eq!(Table::InventoryItems.file_name(), "inventory_items.csv");
        assert_eq!(Table::DistributionCenters.to_string(), "distribution_centers");
    }

    #[test]
    fn cli_names_are_snake_case() {
        let parsed = Table::from_str("order_items", false).unwrap();
        assert_eq!(parsed, Table::OrderItems);
    }
}
