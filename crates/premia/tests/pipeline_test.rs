//! End-to-end tests: raw inputs through import, estimation and the report.

use chrono::NaiveDate;
use premia::data::{
    CompustatFundamentals, CrspRecord, DateRange, Exchange, PanelStore, add_months, database_path,
};
use premia::model::{FamaMacBethConfig, SizeSubset};
use premia::output::{EXPECTED_FACTORS, ResultDocument, parse_document, tables_match};
use premia::{ImportConfig, import_panel, report_document, run_subset};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const STOCKS: i64 = 60;
const MONTHS: i32 = 60;

fn gvkey(permno: i64) -> String {
    format!("{:06}", permno)
}

/// Five years of monthly rows for 60 NYSE stocks with persistent sizes.
fn crsp(rng: &mut StdRng) -> Vec<CrspRecord> {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let mut records = Vec::new();
    for permno in 1..=STOCKS {
        let base = rng.gen_range(1.0..8.0_f64).exp();
        for i in 0..MONTHS {
            records.push(CrspRecord {
                permno,
                gvkey: Some(gvkey(permno)),
                date: add_months(start, i),
                exchange: Exchange::Nyse,
                size_category: None,
                mktcap: base * rng.gen_range(-0.1..0.1_f64).exp(),
                ret_excess: rng.gen_range(-0.1..0.1),
                momentum: None,
                volatility: Some(rng.gen_range(0.01..0.05)),
            });
        }
    }
    records
}

/// December filings for 2000 through 2003.
fn fundamentals(rng: &mut StdRng) -> Vec<CompustatFundamentals> {
    let mut rows = Vec::new();
    for permno in 1..=STOCKS {
        for year in 2000..=2003 {
            let at = rng.gen_range(50.0..500.0);
            let sale = rng.gen_range(20.0..300.0);
            rows.push(CompustatFundamentals {
                gvkey: gvkey(permno),
                datadate: NaiveDate::from_ymd_opt(year, 12, 31).unwrap(),
                at: Some(at),
                seq: Some(at * rng.gen_range(0.2..0.8)),
                sale: Some(sale),
                cogs: Some(sale * rng.gen_range(0.3..0.8)),
                ..Default::default()
            });
        }
    }
    rows
}

fn imported_store(dir: &std::path::Path) -> PanelStore {
    let mut rng = StdRng::seed_from_u64(7);
    let crsp = crsp(&mut rng);
    let fundamentals = fundamentals(&mut rng);

    let range = DateRange::parse("2000-01-01", "2004-12-31").unwrap();
    let path = database_path(dir, &range);
    {
        let store = PanelStore::new(&path).unwrap();
        let summary =
            import_panel(&store, crsp, &fundamentals, None, &ImportConfig::default()).unwrap();
        assert_eq!(summary.crsp_rows, (STOCKS as usize) * (MONTHS as usize));
        assert_eq!(summary.compustat_rows, (STOCKS as usize) * 4);
    }
    PanelStore::new(&path).unwrap()
}

#[test]
fn test_report_from_stored_panel() {
    let dir = tempfile::tempdir().unwrap();
    let store = imported_store(dir.path());
    let crsp = store.crsp_records().unwrap();
    let compustat = store.compustat_records().unwrap();

    let mut seen = Vec::new();
    let document = report_document(&crsp, &compustat, &FamaMacBethConfig::default(), |s| {
        seen.push(s)
    })
    .unwrap();

    assert_eq!(seen, SizeSubset::all().to_vec());
    let titles: Vec<&str> = document.sets.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, ["All Data", "Micro Caps", "Small Caps", "Large Caps"]);
    for set in &document.sets {
        let factors: Vec<&str> = set.rows.iter().map(|r| r.factor.as_str()).collect();
        assert_eq!(factors, EXPECTED_FACTORS);
    }

    // The written document reads back to the same tables
    let path = dir.path().join("results.md");
    document.write_file(&path).unwrap();
    let reread = ResultDocument::from_file(&path).unwrap();
    reread.validate().unwrap();
    for (a, b) in document.sets.iter().zip(&reread.sets) {
        assert!(tables_match(a, b));
    }

    // A README carrying the full-sample table matches it
    let all = document.require("All Data").unwrap();
    let readme = parse_document(&format!("# premia\n\n{}", all.table_markdown())).unwrap();
    assert!(tables_match(all, &readme.sets[0]));
    assert!(!tables_match(document.require("Micro Caps").unwrap(), &readme.sets[0]));
}

#[test]
fn test_subset_run_matches_report() {
    let dir = tempfile::tempdir().unwrap();
    let store = imported_store(dir.path());
    let crsp = store.crsp_records().unwrap();
    let compustat = store.compustat_records().unwrap();
    let config = FamaMacBethConfig::default();

    let document = report_document(&crsp, &compustat, &config, |_| {}).unwrap();
    let large = run_subset(&crsp, &compustat, &config, SizeSubset::Large).unwrap();

    // Fundamentals reach the panel six months after the 2001 filings
    assert_eq!(
        large.series.dates.first().copied(),
        NaiveDate::from_ymd_opt(2002, 6, 1)
    );
    let table = document.require("Large Caps").unwrap();
    for premium in &large.premia {
        let row = table.row(&premium.factor).unwrap();
        assert_eq!(row.risk_premium, premium.risk_premium);
        assert_eq!(row.t_stat_newey_west, premium.t_stat_newey_west);
    }
}
