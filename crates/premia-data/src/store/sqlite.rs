//! SQLite storage for the CRSP/Compustat panel.

use crate::dates::DateRange;
use crate::error::{DataError, Result};
use crate::records::{CompustatRecord, CrspRecord, Exchange, SizeCategory};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};
use tracing::debug;

/// SQLite store holding the `crsp` and `compustat` tables.
#[derive(Debug)]
pub struct PanelStore {
    conn: Connection,
}

/// Row counts and coverage of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of CRSP rows
    pub crsp_rows: usize,
    /// Number of distinct securities
    pub securities: usize,
    /// Number of Compustat rows
    pub compustat_rows: usize,
    /// Earliest CRSP month
    pub first_date: Option<NaiveDate>,
    /// Latest CRSP month
    pub last_date: Option<NaiveDate>,
}

/// Path of the database covering `range` inside `dir`.
///
/// Databases are named `{start}__{final}.sqlite`.
pub fn database_path<P: AsRef<Path>>(dir: P, range: &DateRange) -> PathBuf {
    dir.as_ref().join(format!("{}.sqlite", range))
}

fn parse_stored_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, crate::dates::DATE_FORMAT)
        .map_err(|e| DataError::Parse(format!("Invalid stored date {}: {}", value, e)))
}

fn crsp_from_row(row: &Row<'_>) -> rusqlite::Result<(CrspRecord, String, Option<String>)> {
    let date: String = row.get(2)?;
    let exchange: String = row.get(3)?;
    let size_category: Option<String> = row.get(4)?;
    let record = CrspRecord {
        permno: row.get(0)?,
        gvkey: row.get(1)?,
        date: NaiveDate::MIN,
        exchange: Exchange::from_name(&exchange),
        size_category: None,
        mktcap: row.get(5)?,
        ret_excess: row.get(6)?,
        momentum: row.get(7)?,
        volatility: row.get(8)?,
    };
    Ok((record, date, size_category))
}

impl PanelStore {
    /// Open (or create) a store at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS crsp (
                permno INTEGER NOT NULL,
                gvkey TEXT,
                date TEXT NOT NULL,
                exchange TEXT NOT NULL,
                size_category TEXT,
                mktcap REAL NOT NULL,
                ret_excess REAL NOT NULL,
                momentum REAL,
                volatility REAL,
                PRIMARY KEY (permno, date)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_crsp_date ON crsp(date)",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS compustat (
                gvkey TEXT NOT NULL,
                datadate TEXT NOT NULL,
                be REAL,
                op REAL,
                inv REAL,
                PRIMARY KEY (gvkey, datadate)
            )",
            [],
        )?;

        Ok(())
    }

    /// Store CRSP rows, replacing existing `(permno, date)` rows.
    pub fn put_crsp(&self, records: &[CrspRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO crsp
                 (permno, gvkey, date, exchange, size_category, mktcap, ret_excess, momentum, volatility)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            )?;
            for r in records {
                stmt.execute(params![
                    r.permno,
                    r.gvkey,
                    r.date.to_string(),
                    r.exchange.as_str(),
                    r.size_category.map(|c| c.as_str()),
                    r.mktcap,
                    r.ret_excess,
                    r.momentum,
                    r.volatility,
                ])?;
            }
        }
        tx.commit()?;
        debug!(rows = records.len(), "stored crsp rows");
        Ok(())
    }

    /// Store Compustat rows, replacing existing `(gvkey, datadate)` rows.
    pub fn put_compustat(&self, records: &[CompustatRecord]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO compustat (gvkey, datadate, be, op, inv)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for r in records {
                stmt.execute(params![r.gvkey, r.datadate.to_string(), r.be, r.op, r.inv])?;
            }
        }
        tx.commit()?;
        debug!(rows = records.len(), "stored compustat rows");
        Ok(())
    }

    /// All CRSP rows ordered by date, then permno.
    pub fn crsp_records(&self) -> Result<Vec<CrspRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT permno, gvkey, date, exchange, size_category, mktcap, ret_excess, momentum, volatility
             FROM crsp ORDER BY date ASC, permno ASC",
        )?;

        let rows = stmt.query_map([], crsp_from_row)?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, date, size_category) = row?;
            record.date = parse_stored_date(&date)?;
            record.size_category = size_category
                .as_deref()
                .map(str::parse::<SizeCategory>)
                .transpose()?;
            records.push(record);
        }
        Ok(records)
    }

    /// All Compustat rows ordered by firm, then fiscal year end.
    pub fn compustat_records(&self) -> Result<Vec<CompustatRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT gvkey, datadate, be, op, inv FROM compustat ORDER BY gvkey ASC, datadate ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<f64>>(2)?,
                row.get::<_, Option<f64>>(3)?,
                row.get::<_, Option<f64>>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (gvkey, datadate, be, op, inv) = row?;
            records.push(CompustatRecord {
                gvkey,
                datadate: parse_stored_date(&datadate)?,
                be,
                op,
                inv,
            });
        }
        Ok(records)
    }

    /// Row counts and date coverage.
    pub fn stats(&self) -> Result<StoreStats> {
        let crsp_rows: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM crsp", [], |row| row.get(0))?;
        let securities: i64 =
            self.conn
                .query_row("SELECT COUNT(DISTINCT permno) FROM crsp", [], |row| row.get(0))?;
        let compustat_rows: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM compustat", [], |row| row.get(0))?;

        let bounds: Option<(Option<String>, Option<String>)> = self
            .conn
            .query_row("SELECT MIN(date), MAX(date) FROM crsp", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        let (first_date, last_date) = match bounds {
            Some((first, last)) => (
                first.as_deref().map(parse_stored_date).transpose()?,
                last.as_deref().map(parse_stored_date).transpose()?,
            ),
            None => (None, None),
        };

        Ok(StoreStats {
            crsp_rows: crsp_rows as usize,
            securities: securities as usize,
            compustat_rows: compustat_rows as usize,
            first_date,
            last_date,
        })
    }

    /// Remove every stored row.
    pub fn clear_all(&self) -> Result<()> {
        self.conn.execute("DELETE FROM crsp", [])?;
        self.conn.execute("DELETE FROM compustat", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crsp(permno: i64, date: NaiveDate, size: Option<SizeCategory>) -> CrspRecord {
        CrspRecord {
            permno,
            gvkey: Some(format!("{:06}", permno)),
            date,
            exchange: Exchange::Nyse,
            size_category: size,
            mktcap: 100.0 * permno as f64,
            ret_excess: 0.01,
            momentum: Some(0.1),
            volatility: None,
        }
    }

    #[test]
    fn test_store_initialization() {
        let store = PanelStore::in_memory().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.crsp_rows, 0);
        assert_eq!(stats.compustat_rows, 0);
        assert!(stats.first_date.is_none());
    }

    #[test]
    fn test_crsp_operations() {
        let store = PanelStore::in_memory().unwrap();
        let jan = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let feb = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();

        store
            .put_crsp(&[
                crsp(2, feb, Some(SizeCategory::Large)),
                crsp(1, jan, Some(SizeCategory::Micro)),
                crsp(2, jan, None),
            ])
            .unwrap();

        let records = store.crsp_records().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!((records[0].permno, records[0].date), (1, jan));
        assert_eq!((records[1].permno, records[1].date), (2, jan));
        assert_eq!(records[2].size_category, Some(SizeCategory::Large));
        assert_eq!(records[1].size_category, None);
        assert_eq!(records[0].momentum, Some(0.1));
        assert_eq!(records[0].volatility, None);

        let stats = store.stats().unwrap();
        assert_eq!(stats.crsp_rows, 3);
        assert_eq!(stats.securities, 2);
        assert_eq!(stats.first_date, Some(jan));
        assert_eq!(stats.last_date, Some(feb));
    }

    #[test]
    fn test_crsp_replace() {
        let store = PanelStore::in_memory().unwrap();
        let jan = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();

        store.put_crsp(&[crsp(1, jan, None)]).unwrap();
        let mut updated = crsp(1, jan, Some(SizeCategory::Small));
        updated.ret_excess = -0.05;
        store.put_crsp(&[updated]).unwrap();

        let records = store.crsp_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ret_excess, -0.05);
        assert_eq!(records[0].size_category, Some(SizeCategory::Small));
    }

    #[test]
    fn test_compustat_operations() {
        let store = PanelStore::in_memory().unwrap();
        let fy = NaiveDate::from_ymd_opt(2019, 12, 31).unwrap();

        store
            .put_compustat(&[CompustatRecord {
                gvkey: "001000".to_string(),
                datadate: fy,
                be: Some(50.0),
                op: Some(0.2),
                inv: None,
            }])
            .unwrap();

        let records = store.compustat_records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].gvkey, "001000");
        assert_eq!(records[0].datadate, fy);
        assert_eq!(records[0].inv, None);
    }

    #[test]
    fn test_clear_all() {
        let store = PanelStore::in_memory().unwrap();
        let jan = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        store.put_crsp(&[crsp(1, jan, None)]).unwrap();
        store.clear_all().unwrap();
        assert_eq!(store.stats().unwrap().crsp_rows, 0);
    }

    #[test]
    fn test_database_path() {
        let range = DateRange::parse("1963-01-01", "2023-12-31").unwrap();
        let path = database_path("/tmp/premia", &range);
        assert_eq!(
            path,
            PathBuf::from("/tmp/premia/1963-01-01__2023-12-31.sqlite")
        );
    }
}
