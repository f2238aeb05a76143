//! Integration tests for the on-disk panel store.

use chrono::NaiveDate;
use premia_data::files::{read_csv, write_csv};
use premia_data::{CompustatRecord, CrspRecord, DateRange, Exchange, PanelStore, database_path};

fn sample_crsp() -> Vec<CrspRecord> {
    (1..=3)
        .map(|month| CrspRecord {
            permno: 10001,
            gvkey: Some("001000".to_string()),
            date: NaiveDate::from_ymd_opt(2020, month, 1).unwrap(),
            exchange: Exchange::Nyse,
            size_category: None,
            mktcap: 250.0,
            ret_excess: 0.01 * month as f64,
            momentum: None,
            volatility: Some(0.02),
        })
        .collect()
}

#[test]
fn test_csv_import_into_database_file() {
    let dir = tempfile::tempdir().unwrap();
    let range = DateRange::parse("2020-01-01", "2020-12-31").unwrap();
    let db_path = database_path(dir.path(), &range);
    assert!(db_path.ends_with("2020-01-01__2020-12-31.sqlite"));

    let csv_path = dir.path().join("crsp.csv");
    write_csv(&csv_path, &sample_crsp()).unwrap();
    let imported: Vec<CrspRecord> = read_csv(&csv_path).unwrap();

    {
        let store = PanelStore::new(&db_path).unwrap();
        store.put_crsp(&imported).unwrap();
        store
            .put_compustat(&[CompustatRecord {
                gvkey: "001000".to_string(),
                datadate: NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
                be: Some(100.0),
                op: Some(0.3),
                inv: Some(0.05),
            }])
            .unwrap();
    }

    // Reopen to make sure rows were persisted.
    let store = PanelStore::new(&db_path).unwrap();
    let stats = store.stats().unwrap();
    assert_eq!(stats.crsp_rows, 3);
    assert_eq!(stats.securities, 1);
    assert_eq!(stats.compustat_rows, 1);
    assert_eq!(stats.last_date, NaiveDate::from_ymd_opt(2020, 3, 1));

    assert_eq!(store.crsp_records().unwrap(), sample_crsp());
    assert_eq!(store.compustat_records().unwrap().len(), 1);
}
