#![allow(clippy::missing_errors_doc)]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use inventory_kpi_core::{
    format_date, parse_date, FactSnapshot, InventoryTransaction, KpiError, Product, ProductId,
    RecordSource, Store, StoreId, TransactionInput,
};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};
use time::format_description::well_known::Rfc3339;
use time::{Date, OffsetDateTime};
use tracing::{debug, info};

const INVENTORY_MIGRATION_VERSION: i64 = 1;

const SCHEMA_INVENTORY_V1: &str = r"
CREATE TABLE IF NOT EXISTS stores (
  store_id TEXT PRIMARY KEY CHECK (length(trim(store_id)) > 0),
  region TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS products (
  product_id TEXT PRIMARY KEY CHECK (length(trim(product_id)) > 0),
  category TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS inventory_transactions (
  seq INTEGER NOT NULL UNIQUE CHECK (seq >= 1),
  date TEXT NOT NULL,
  store_id TEXT NOT NULL,
  product_id TEXT NOT NULL,
  inventory_level INTEGER NOT NULL,
  units_sold INTEGER NOT NULL CHECK (units_sold >= 0),
  units_ordered INTEGER NOT NULL CHECK (units_ordered >= 0),
  demand_forecast REAL NOT NULL,
  price REAL NOT NULL,
  discount INTEGER NOT NULL CHECK (discount BETWEEN 0 AND 100),
  weather_condition TEXT NOT NULL,
  holiday_promotion INTEGER NOT NULL CHECK (holiday_promotion IN (0, 1)),
  competitor_pricing REAL NOT NULL,
  seasonality TEXT NOT NULL,
  PRIMARY KEY (date, store_id, product_id),
  FOREIGN KEY (store_id) REFERENCES stores(store_id),
  FOREIGN KEY (product_id) REFERENCES products(product_id)
);

CREATE TRIGGER IF NOT EXISTS trg_inventory_transactions_no_update
BEFORE UPDATE ON inventory_transactions
BEGIN
  SELECT RAISE(FAIL, 'inventory_transactions is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_inventory_transactions_no_delete
BEFORE DELETE ON inventory_transactions
BEGIN
  SELECT RAISE(FAIL, 'inventory_transactions is append-only');
END;

CREATE INDEX IF NOT EXISTS idx_inventory_transactions_store_product_date
  ON inventory_transactions(store_id, product_id, date);
CREATE INDEX IF NOT EXISTS idx_inventory_transactions_product_date
  ON inventory_transactions(product_id, date);
CREATE INDEX IF NOT EXISTS idx_inventory_transactions_date
  ON inventory_transactions(date);
";

const TRANSACTION_COLUMNS: &str = "seq, date, store_id, product_id, inventory_level, units_sold,
  units_ordered, demand_forecast, price, discount, weather_condition, holiday_promotion,
  competitor_pricing, seasonality";

/// Append-only record store for reference data and daily inventory facts.
pub struct SqliteRecordStore {
    conn: Connection,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct StoreStatus {
    pub schema_version: Option<i64>,
    pub stores: usize,
    pub products: usize,
    pub transactions: usize,
    pub latest_seq: i64,
    pub first_date: Option<Date>,
    pub last_date: Option<Date>,
}

impl SqliteRecordStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open sqlite database at {}", path.display()))?;

        conn.execute_batch(
            "PRAGMA busy_timeout = 5000;
             PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;",
        )
        .context("failed to configure sqlite pragmas")?;

        debug!(path = %path.display(), "opened record store");
        Ok(Self { conn })
    }

    pub fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS schema_migrations (
                    version INTEGER PRIMARY KEY,
                    applied_at TEXT NOT NULL
                );",
            )
            .context("failed to ensure schema_migrations exists")?;

        self.conn
            .execute_batch(SCHEMA_INVENTORY_V1)
            .context("failed to apply inventory schema")?;

        let now = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .context("failed to format migration timestamp")?;
        let inserted = self
            .conn
            .execute(
                "INSERT OR IGNORE INTO schema_migrations(version, applied_at) VALUES (?1, ?2)",
                params![INVENTORY_MIGRATION_VERSION, now],
            )
            .context("failed to register inventory schema migration")?;

        if inserted > 0 {
            info!(version = INVENTORY_MIGRATION_VERSION, "applied schema migration");
        }
        Ok(())
    }

    pub fn upsert_store(&self, store: &Store) -> Result<()> {
        if store.store_id.as_str().trim().is_empty() {
            return Err(anyhow!("store_id MUST be provided"));
        }

        self.conn
            .execute(
                "INSERT INTO stores(store_id, region) VALUES (?1, ?2)
                 ON CONFLICT(store_id) DO UPDATE SET region = excluded.region",
                params![store.store_id.as_str(), store.region],
            )
            .with_context(|| format!("failed to upsert store {}", store.store_id))?;

        Ok(())
    }

    pub fn upsert_product(&self, product: &Product) -> Result<()> {
        if product.product_id.as_str().trim().is_empty() {
            return Err(anyhow!("product_id MUST be provided"));
        }

        self.conn
            .execute(
                "INSERT INTO products(product_id, category) VALUES (?1, ?2)
                 ON CONFLICT(product_id) DO UPDATE SET category = excluded.category",
                params![product.product_id.as_str(), product.category],
            )
            .with_context(|| format!("failed to upsert product {}", product.product_id))?;

        Ok(())
    }

    /// Validates and appends one fact, assigning the next ingestion `seq`.
    pub fn append_transaction(&mut self, input: &TransactionInput) -> Result<InventoryTransaction> {
        let mut appended = self.append_transactions(std::slice::from_ref(input))?;
        appended
            .pop()
            .ok_or_else(|| anyhow!("append produced no transaction"))
    }

    /// Appends a batch of facts atomically. Every input is validated before
    /// anything is written; a constraint failure on any row rolls back the
    /// whole batch.
    pub fn append_transactions(
        &mut self,
        inputs: &[TransactionInput],
    ) -> Result<Vec<InventoryTransaction>> {
        for (index, input) in inputs.iter().enumerate() {
            input
                .validate()
                .map_err(|err| anyhow!("transaction {index} failed validation: {err}"))?;
        }

        // IMMEDIATE takes the write lock before seq is read, so concurrent
        // writers queue on busy_timeout instead of racing on MAX(seq).
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("failed to start append transaction")?;

        let mut seq = next_seq(&tx)?;
        let mut appended = Vec::with_capacity(inputs.len());

        {
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO inventory_transactions({TRANSACTION_COLUMNS})
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)"
                ))
                .context("failed to prepare transaction insert")?;

            for input in inputs {
                let date = format_date(input.date)?;
                stmt.execute(params![
                    seq,
                    date,
                    input.store_id.as_str(),
                    input.product_id.as_str(),
                    input.inventory_level,
                    input.units_sold,
                    input.units_ordered,
                    input.demand_forecast,
                    input.price,
                    input.discount,
                    input.weather_condition,
                    bool_to_sql(input.holiday_promotion),
                    input.competitor_pricing,
                    input.seasonality,
                ])
                .with_context(|| {
                    format!(
                        "failed to append transaction {date}/{}/{}",
                        input.store_id, input.product_id
                    )
                })?;

                appended.push(input.clone().into_transaction(seq));
                seq += 1;
            }
        }

        tx.commit().context("failed to commit append transaction")?;

        info!(count = appended.len(), "appended inventory transactions");
        Ok(appended)
    }

    pub fn list_stores(&self) -> Result<Vec<Store>> {
        read_stores(&self.conn)
    }

    pub fn list_products(&self) -> Result<Vec<Product>> {
        read_products(&self.conn)
    }

    /// Every fact in ingestion order.
    pub fn list_transactions(&self) -> Result<Vec<InventoryTransaction>> {
        read_transactions(&self.conn)
    }

    /// Reads stores, products and facts inside one read transaction so the
    /// three tables describe the same point in time.
    pub fn snapshot(&self) -> Result<FactSnapshot> {
        let tx = self
            .conn
            .unchecked_transaction()
            .context("failed to start snapshot transaction")?;

        let snapshot = FactSnapshot {
            stores: read_stores(&tx)?,
            products: read_products(&tx)?,
            transactions: read_transactions(&tx)?,
        };

        tx.commit().context("failed to close snapshot transaction")?;

        debug!(
            stores = snapshot.stores.len(),
            products = snapshot.products.len(),
            transactions = snapshot.transactions.len(),
            "loaded fact snapshot"
        );
        Ok(snapshot)
    }

    pub fn status(&self) -> Result<StoreStatus> {
        let schema_version: Option<i64> = if table_exists(&self.conn, "schema_migrations")? {
            self.conn
                .query_row("SELECT MAX(version) FROM schema_migrations", [], |row| {
                    row.get(0)
                })
                .context("failed to read schema version")?
        } else {
            None
        };

        if !table_exists(&self.conn, "inventory_transactions")? {
            return Ok(StoreStatus {
                schema_version,
                stores: 0,
                products: 0,
                transactions: 0,
                latest_seq: 0,
                first_date: None,
                last_date: None,
            });
        }

        let stores = count_rows(&self.conn, "stores")?;
        let products = count_rows(&self.conn, "products")?;
        let transactions = count_rows(&self.conn, "inventory_transactions")?;

        let (latest_seq, first_raw, last_raw): (i64, Option<String>, Option<String>) = self
            .conn
            .query_row(
                "SELECT COALESCE(MAX(seq), 0), MIN(date), MAX(date) FROM inventory_transactions",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .context("failed to read transaction bounds")?;

        Ok(StoreStatus {
            schema_version,
            stores,
            products,
            transactions,
            latest_seq,
            first_date: first_raw
                .as_deref()
                .map(parse_date)
                .transpose()?,
            last_date: last_raw
                .as_deref()
                .map(parse_date)
                .transpose()?,
        })
    }

    #[cfg(test)]
    fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl RecordSource for SqliteRecordStore {
    type Error = anyhow::Error;

    fn load_snapshot(&self) -> Result<FactSnapshot> {
        self.snapshot()
    }
}

fn next_seq(tx: &Transaction<'_>) -> Result<i64> {
    let latest: i64 = tx
        .query_row(
            "SELECT COALESCE(MAX(seq), 0) FROM inventory_transactions",
            [],
            |row| row.get(0),
        )
        .context("failed to read latest seq")?;
    Ok(latest + 1)
}

fn read_stores(conn: &Connection) -> Result<Vec<Store>> {
    let mut stmt = conn
        .prepare("SELECT store_id, region FROM stores ORDER BY store_id ASC")
        .context("failed to prepare store listing")?;
    let rows = stmt.query_map([], |row| {
        Ok(Store {
            store_id: StoreId(row.get(0)?),
            region: row.get(1)?,
        })
    })?;
    collect_rows(rows)
}

fn read_products(conn: &Connection) -> Result<Vec<Product>> {
    let mut stmt = conn
        .prepare("SELECT product_id, category FROM products ORDER BY product_id ASC")
        .context("failed to prepare product listing")?;
    let rows = stmt.query_map([], |row| {
        Ok(Product {
            product_id: ProductId(row.get(0)?),
            category: row.get(1)?,
        })
    })?;
    collect_rows(rows)
}

fn read_transactions(conn: &Connection) -> Result<Vec<InventoryTransaction>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM inventory_transactions ORDER BY seq ASC"
        ))
        .context("failed to prepare transaction listing")?;
    let rows = stmt.query_map([], parse_transaction_row)?;
    collect_rows(rows)
}

fn parse_transaction_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InventoryTransaction> {
    let date_raw: String = row.get(1)?;
    let date = parse_date(&date_raw).map_err(|err| to_sql_error(1, &err))?;

    let holiday_raw: i64 = row.get(11)?;
    let holiday_promotion = match holiday_raw {
        0 => false,
        1 => true,
        other => {
            return Err(to_sql_error(
                11,
                &KpiError::Validation(format!("invalid holiday_promotion flag: {other}")),
            ))
        }
    };

    Ok(InventoryTransaction {
        seq: row.get(0)?,
        date,
        store_id: StoreId(row.get(2)?),
        product_id: ProductId(row.get(3)?),
        inventory_level: row.get(4)?,
        units_sold: row.get(5)?,
        units_ordered: row.get(6)?,
        demand_forecast: row.get(7)?,
        price: row.get(8)?,
        discount: row.get(9)?,
        weather_condition: row.get(10)?,
        holiday_promotion,
        competitor_pricing: row.get(12)?,
        seasonality: row.get(13)?,
    })
}

fn bool_to_sql(value: bool) -> i64 {
    i64::from(value)
}

fn count_rows(conn: &Connection, table_name: &str) -> Result<usize> {
    let count: i64 = conn
        .query_row(&format!("SELECT COUNT(*) FROM {table_name}"), [], |row| {
            row.get(0)
        })
        .with_context(|| format!("failed to count rows in {table_name}"))?;
    usize::try_from(count).with_context(|| format!("invalid row count for {table_name}: {count}"))
}

fn table_exists(conn: &Connection, table_name: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "SELECT 1
             FROM sqlite_master
             WHERE type = 'table' AND name = ?1
             LIMIT 1",
            params![table_name],
            |_| Ok(()),
        )
        .optional()
        .context("failed to query sqlite_master")?
        .is_some();

    Ok(exists)
}

fn to_sql_error(column: usize, err: &KpiError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        column,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            err.to_string(),
        )),
    )
}

fn collect_rows<T>(
    rows: rusqlite::MappedRows<'_, impl FnMut(&rusqlite::Row<'_>) -> rusqlite::Result<T>>,
) -> Result<Vec<T>> {
    let mut values = Vec::new();
    for row in rows {
        values.push(row?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]

    use super::*;
    use inventory_kpi_core::{Pipeline, PipelineConfig};
    use proptest::prelude::*;

    fn must<T>(result: Result<T>) -> T {
        match result {
            Ok(value) => value,
            Err(err) => panic!("test failure: {err:#}"),
        }
    }

    fn must_date(value: &str) -> Date {
        match parse_date(value) {
            Ok(date) => date,
            Err(err) => panic!("invalid fixture date: {err}"),
        }
    }

    fn fixture_store() -> SqliteRecordStore {
        let store = must(SqliteRecordStore::open(Path::new(":memory:")));
        must(store.migrate());
        for store_id in ["S1", "S2"] {
            must(store.upsert_store(&Store {
                store_id: StoreId::from(store_id),
                region: "North".to_string(),
            }));
        }
        for product_id in ["P1", "P2"] {
            must(store.upsert_product(&Product {
                product_id: ProductId::from(product_id),
                category: "Groceries".to_string(),
            }));
        }
        store
    }

    fn fixture_input(
        date: &str,
        store_id: &str,
        product_id: &str,
        inventory_level: i64,
        units_sold: i64,
    ) -> TransactionInput {
        TransactionInput {
            date: must_date(date),
            store_id: StoreId::from(store_id),
            product_id: ProductId::from(product_id),
            inventory_level,
            units_sold,
            units_ordered: 3,
            demand_forecast: 12.5,
            price: 33.5,
            discount: 10,
            weather_condition: "Rainy".to_string(),
            holiday_promotion: true,
            competitor_pricing: 29.69,
            seasonality: "Autumn".to_string(),
        }
    }

    #[test]
    fn concurrent_writers_are_sequenced() {
        let path = std::env::temp_dir().join(format!("ikpi-store-{}.sqlite3", ulid::Ulid::new()));
        {
            let store = must(SqliteRecordStore::open(&path));
            must(store.migrate());
            must(store.upsert_store(&Store {
                store_id: StoreId::from("S1"),
                region: "North".to_string(),
            }));
            for product_id in ["P1", "P2"] {
                must(store.upsert_product(&Product {
                    product_id: ProductId::from(product_id),
                    category: "Groceries".to_string(),
                }));
            }
        }

        let writers: Vec<_> = ["P1", "P2"]
            .into_iter()
            .map(|product_id| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut store = must(SqliteRecordStore::open(&path));
                    for day in 1..=20 {
                        let input =
                            fixture_input(&format!("2024-01-{day:02}"), "S1", product_id, 5, 1);
                        must(store.append_transaction(&input));
                    }
                })
            })
            .collect();
        for writer in writers {
            if writer.join().is_err() {
                panic!("writer thread panicked");
            }
        }

        let store = must(SqliteRecordStore::open(&path));
        let mut seqs: Vec<i64> = must(store.list_transactions())
            .iter()
            .map(|fact| fact.seq)
            .collect();
        seqs.sort_unstable();
        assert_eq!(seqs, (1..=40).collect::<Vec<i64>>());
        drop(store);

        for suffix in ["", "-wal", "-shm"] {
            let mut file = path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }

    #[test]
    fn migrate_is_idempotent() {
        let store = fixture_store();
        must(store.migrate());
        must(store.migrate());

        let status = must(store.status());
        assert_eq!(status.schema_version, Some(INVENTORY_MIGRATION_VERSION));
        assert_eq!(status.stores, 2);
        assert_eq!(status.products, 2);
    }

    #[test]
    fn status_before_migrate_reports_empty_store() {
        let store = must(SqliteRecordStore::open(Path::new(":memory:")));
        let status = must(store.status());
        assert_eq!(status.schema_version, None);
        assert_eq!(status.transactions, 0);
        assert_eq!(status.first_date, None);
    }

    #[test]
    fn append_assigns_increasing_seq_and_round_trips() {
        let mut store = fixture_store();
        let first = must(store.append_transaction(&fixture_input("2024-01-02", "S1", "P1", 40, 5)));
        let second = must(store.append_transaction(&fixture_input("2024-01-01", "S1", "P1", 50, 4)));
        assert_eq!(first.seq, 1);
        assert_eq!(second.seq, 2);

        let listed = must(store.list_transactions());
        assert_eq!(listed, vec![first, second]);
        assert_eq!(listed[0].competitor_pricing, 29.69);
        assert!(listed[0].holiday_promotion);

        let status = must(store.status());
        assert_eq!(status.transactions, 2);
        assert_eq!(status.latest_seq, 2);
        assert_eq!(status.first_date, Some(must_date("2024-01-01")));
        assert_eq!(status.last_date, Some(must_date("2024-01-02")));
    }

    #[test]
    fn append_only_trigger_blocks_updates_and_deletes() {
        let mut store = fixture_store();
        let fact = must(store.append_transaction(&fixture_input("2024-01-02", "S1", "P1", 40, 5)));

        let update_result = store.connection().execute(
            "UPDATE inventory_transactions SET inventory_level = 0 WHERE seq = ?1",
            params![fact.seq],
        );
        assert!(update_result.is_err());

        let delete_result = store.connection().execute(
            "DELETE FROM inventory_transactions WHERE seq = ?1",
            params![fact.seq],
        );
        assert!(delete_result.is_err());
    }

    #[test]
    fn duplicate_natural_key_rolls_back_the_batch() {
        let mut store = fixture_store();
        must(store.append_transaction(&fixture_input("2024-01-02", "S1", "P1", 40, 5)));

        let result = store.append_transactions(&[
            fixture_input("2024-01-03", "S1", "P1", 35, 5),
            fixture_input("2024-01-02", "S1", "P1", 20, 1),
        ]);
        assert!(result.is_err());
        assert_eq!(must(store.list_transactions()).len(), 1);
    }

    #[test]
    fn unknown_store_is_rejected_by_foreign_key() {
        let mut store = fixture_store();
        let result = store.append_transaction(&fixture_input("2024-01-02", "S9", "P1", 40, 5));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_input_is_rejected_before_write() {
        let mut store = fixture_store();
        let mut input = fixture_input("2024-01-02", "S1", "P1", 40, 5);
        input.discount = 101;

        let err = match store.append_transaction(&input) {
            Ok(_) => panic!("expected validation failure"),
            Err(err) => err,
        };
        assert!(err.to_string().contains("discount"));
        assert_eq!(must(store.status()).transactions, 0);
    }

    #[test]
    fn negative_inventory_level_is_stored() {
        let mut store = fixture_store();
        let fact = must(store.append_transaction(&fixture_input("2024-01-02", "S1", "P1", -4, 5)));
        assert_eq!(fact.inventory_level, -4);
        assert_eq!(must(store.list_transactions())[0].inventory_level, -4);
    }

    #[test]
    fn upsert_replaces_reference_attributes() {
        let store = fixture_store();
        must(store.upsert_product(&Product {
            product_id: ProductId::from("P1"),
            category: "Toys".to_string(),
        }));

        let products = must(store.list_products());
        assert_eq!(products.len(), 2);
        assert_eq!(products[0].category, "Toys");
        assert!(store
            .upsert_store(&Store {
                store_id: StoreId::from("  "),
                region: "East".to_string(),
            })
            .is_err());
    }

    #[test]
    fn pipeline_runs_against_the_store() {
        let mut store = fixture_store();
        must(store.append_transactions(&[
            fixture_input("2024-01-01", "S1", "P1", 40, 5),
            fixture_input("2024-01-02", "S1", "P1", 10, 7),
            fixture_input("2024-01-02", "S2", "P2", 80, 2),
        ]));

        let pipeline = match Pipeline::new(PipelineConfig::default()) {
            Ok(value) => value,
            Err(err) => panic!("default config rejected: {err}"),
        };
        let output = must(pipeline.run_source(&store));

        assert_eq!(output.anchor_date, Some(must_date("2024-01-02")));
        assert_eq!(output.current_stock.len(), 2);
        assert_eq!(output.current_stock[0].inventory_level, 10);
        assert_eq!(output.low_inventory.len(), 1);
        assert!(output.violations.is_empty());
        assert_eq!(output.summary.len(), 2);
    }

    #[test]
    fn snapshot_output_serializes_dates_as_text() {
        let mut store = fixture_store();
        must(store.append_transaction(&fixture_input("2024-03-09", "S1", "P1", 40, 5)));

        let snapshot = must(store.snapshot());
        let value = match serde_json::to_value(&snapshot) {
            Ok(value) => value,
            Err(err) => panic!("snapshot serialization failed: {err}"),
        };
        assert_eq!(value["transactions"][0]["date"], "2024-03-09");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_snapshot_matches_appended_facts(
            rows in prop::collection::btree_map(
                (0u8..40, 0usize..2, 0usize..2),
                (-5i64..200, 0i64..50),
                1..40,
            )
        ) {
            let mut store = fixture_store();
            let inputs: Vec<TransactionInput> = rows
                .iter()
                .map(|(&(day, store_index, product_index), &(level, sold))| {
                    let mut input = fixture_input(
                        "2024-01-01",
                        ["S1", "S2"][store_index],
                        ["P1", "P2"][product_index],
                        level,
                        sold,
                    );
                    input.date += time::Duration::days(i64::from(day));
                    input
                })
                .collect();

            let appended = must(store.append_transactions(&inputs));
            let snapshot = must(store.load_snapshot());

            prop_assert_eq!(&snapshot.transactions, &appended);
            let expected = FactSnapshot::from_inputs(
                snapshot.stores.clone(),
                snapshot.products.clone(),
                inputs,
            );
            prop_assert_eq!(snapshot, expected);
        }
    }
}
