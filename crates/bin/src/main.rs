//! Premia CLI binary.
//!
//! Imports a CRSP/Compustat panel, estimates Fama-MacBeth risk premia and
//! writes or checks the Markdown result tables.

use clap::{ArgAction, Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use premia::{ImportConfig, REPORT_TITLE, import_panel, report_document, result_set};
use premia_data::files::{read_csv, write_csv};
use premia_data::{
    CompustatFundamentals, CompustatRecord, CrspRecord, DailyReturn, DateRange, PanelStore,
    database_path,
};
use premia_factors::Characteristic;
use premia_factors::volatility::VolFactor;
use premia_model::{CrossSectionRegression, FamaMacBeth, FamaMacBethConfig, SizeSubset};
use premia_output::report::TABLE_HEADER;
use premia_output::{ExportFormat, Exporter, ResultDocument, ResultSet, tables_match};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "premia")]
#[command(about = "Premia: Fama-MacBeth risk premia with Newey-West t-statistics", long_about = None)]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Directory holding the panel databases
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Which panel database to use.
#[derive(Args, Debug, Clone)]
struct DatabaseArgs {
    /// First month of the sample
    #[arg(long, default_value = "1960-01-01")]
    start: String,

    /// Last month of the sample
    #[arg(long = "final", default_value = "2023-12-31")]
    final_date: String,

    /// Explicit database file (overrides --start/--final)
    #[arg(long)]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build characteristics from CSV files and store the panel
    Import {
        /// Monthly CRSP rows
        #[arg(long)]
        crsp: PathBuf,

        /// Annual Compustat fundamentals
        #[arg(long)]
        compustat: PathBuf,

        /// Daily excess returns for rolling volatility
        #[arg(long)]
        daily: Option<PathBuf>,

        /// Characteristic settings (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Remove the stored panel before importing
        #[arg(long)]
        replace: bool,

        #[command(flatten)]
        db: DatabaseArgs,
    },

    /// Estimate risk premia for one size subset
    Run {
        /// all, micro, small or large (default: all)
        #[arg(long)]
        subset: Option<String>,

        /// Use OLS instead of market-cap weighted least squares
        #[arg(long)]
        ols: bool,

        /// Drop months with fewer stocks than this quantile of monthly counts
        #[arg(long)]
        drop_tail_percentile: Option<f64>,

        /// Months between fiscal year end and use of the fundamentals
        #[arg(long)]
        lag: Option<u32>,

        /// Newey-West lags
        #[arg(long)]
        max_lags: Option<usize>,

        /// Output format: markdown, csv, json or pretty-json
        #[arg(long, default_value = "markdown")]
        format: String,

        /// Write the table to this file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Estimation settings (JSON); flags take precedence
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        db: DatabaseArgs,
    },

    /// Estimate every size subset and write the results document
    Report {
        /// Results document
        #[arg(long, default_value = "results.md")]
        output: PathBuf,

        /// README to update with the All Data table
        #[arg(long)]
        readme: Option<PathBuf>,

        /// Estimation settings (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        #[command(flatten)]
        db: DatabaseArgs,
    },

    /// Check a results document and, optionally, the README table
    Check {
        /// Results document
        results: PathBuf,

        /// README whose table must equal the All Data table
        #[arg(long)]
        readme: Option<PathBuf>,
    },

    /// Build the volatility factor-mimicking portfolio
    VolFactor {
        /// Monthly CRSP rows with volatility
        #[arg(long)]
        input: PathBuf,

        /// Monthly factor returns
        #[arg(long)]
        output: PathBuf,
    },

    /// Show what a panel database holds
    Info {
        /// Also list the regression characteristics
        #[arg(long)]
        characteristics: bool,

        #[command(flatten)]
        db: DatabaseArgs,
    },
}

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Import {
            crsp,
            compustat,
            daily,
            config,
            replace,
            db,
        } => {
            let path = database_file(data_dir.as_deref(), &db)?;
            let files = ImportFiles {
                crsp: &crsp,
                compustat: &compustat,
                daily: daily.as_deref(),
            };
            import(&path, files, config.as_deref(), replace)?;
        }
        Commands::Run {
            subset,
            ols,
            drop_tail_percentile,
            lag,
            max_lags,
            format,
            output,
            config,
            db,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(subset) = subset {
                config.prepare.subset = subset.parse()?;
            }
            if ols {
                config.regression = CrossSectionRegression::Ols;
            }
            if drop_tail_percentile.is_some() {
                config.prepare.drop_tail_percentile = drop_tail_percentile;
            }
            if let Some(lag) = lag {
                config.prepare.compustat_month_lag = lag;
            }
            if max_lags.is_some() {
                config.newey_west.lags = max_lags;
            }
            let format: ExportFormat = format.parse()?;
            let path = existing_database(data_dir.as_deref(), &db)?;
            run_estimation(&path, config, format, output.as_deref())?;
        }
        Commands::Report {
            output,
            readme,
            config,
            db,
        } => {
            let config = load_config(config.as_deref())?;
            let path = existing_database(data_dir.as_deref(), &db)?;
            write_report(&path, &config, &output, readme.as_deref())?;
        }
        Commands::Check { results, readme } => {
            check(&results, readme.as_deref())?;
        }
        Commands::VolFactor { input, output } => {
            vol_factor(&input, &output)?;
        }
        Commands::Info {
            characteristics,
            db,
        } => {
            let path = existing_database(data_dir.as_deref(), &db)?;
            print_store_info(&path)?;
            if characteristics {
                print_characteristics();
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Database path for `db`, creating the data directory if needed.
fn database_file(
    data_dir: Option<&Path>,
    db: &DatabaseArgs,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(path) = &db.database {
        return Ok(path.clone());
    }
    let dir = match data_dir {
        Some(dir) => dir.to_path_buf(),
        None => dirs::data_dir()
            .map(|d| d.join("premia"))
            .ok_or("could not determine a data directory; pass --data-dir")?,
    };
    fs::create_dir_all(&dir)?;
    let range = DateRange::parse(&db.start, &db.final_date)?;
    Ok(database_path(dir, &range))
}

/// Like [`database_file`], but the database must already exist.
fn existing_database(
    data_dir: Option<&Path>,
    db: &DatabaseArgs,
) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let path = database_file(data_dir, db)?;
    if !path.exists() {
        return Err(format!(
            "no panel database at {}; run `premia import` first",
            path.display()
        )
        .into());
    }
    Ok(path)
}

fn load_config(path: Option<&Path>) -> Result<FamaMacBethConfig, Box<dyn std::error::Error>> {
    match path {
        Some(path) => Ok(serde_json::from_str(&fs::read_to_string(path)?)?),
        None => Ok(FamaMacBethConfig::default()),
    }
}

fn spinner(message: &'static str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message);
    Ok(pb)
}

fn print_banner(title: &str) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║{:^62}║", title);
    println!("╚══════════════════════════════════════════════════════════════╝\n");
}

fn load_panel(
    path: &Path,
) -> Result<(Vec<CrspRecord>, Vec<CompustatRecord>), Box<dyn std::error::Error>> {
    debug!(path = %path.display(), "opening panel database");
    let pb = spinner("Loading panel...")?;
    let store = PanelStore::new(path)?;
    let crsp = store.crsp_records()?;
    let compustat = store.compustat_records()?;
    pb.finish_with_message(format!(
        "Loaded {} CRSP rows and {} Compustat rows",
        crsp.len(),
        compustat.len()
    ));
    Ok((crsp, compustat))
}

/// Input files of an import.
#[derive(Debug, Clone, Copy)]
struct ImportFiles<'a> {
    crsp: &'a Path,
    compustat: &'a Path,
    daily: Option<&'a Path>,
}

fn import(
    path: &Path,
    files: ImportFiles<'_>,
    config: Option<&Path>,
    replace: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config: ImportConfig = match config {
        Some(config) => serde_json::from_str(&fs::read_to_string(config)?)?,
        None => ImportConfig::default(),
    };

    print_banner("PANEL IMPORT");

    let pb = spinner("Reading CSV files...")?;
    let crsp: Vec<CrspRecord> = read_csv(files.crsp)?;
    let fundamentals: Vec<CompustatFundamentals> = read_csv(files.compustat)?;
    let daily: Option<Vec<DailyReturn>> = files
        .daily
        .map(|p| read_csv::<DailyReturn, _>(p))
        .transpose()?;

    pb.set_message("Computing characteristics...");
    let store = PanelStore::new(path)?;
    if replace {
        store.clear_all()?;
    }
    let summary = import_panel(&store, crsp, &fundamentals, daily.as_deref(), &config)?;
    pb.finish_with_message("Import complete");

    println!("Database:         {}", path.display());
    println!("CRSP rows:        {}", summary.crsp_rows);
    println!("  with momentum:  {}", summary.with_momentum);
    println!("  with volatility: {}", summary.with_volatility);
    println!("Compustat years:  {}", summary.compustat_rows);
    println!(
        "NYSE breakpoints: {:.2} (small) / {:.2} (large)",
        summary.thresholds.small, summary.thresholds.large
    );
    Ok(())
}

fn run_estimation(
    path: &Path,
    config: FamaMacBethConfig,
    format: ExportFormat,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let subset = config.prepare.subset;
    let (crsp, compustat) = load_panel(path)?;

    let pb = spinner("Running cross-sectional regressions...")?;
    let result = FamaMacBeth::new(config).estimate(&crsp, &compustat)?;
    pb.finish_with_message(format!(
        "Estimated {} months ({} skipped)",
        result.series.len(),
        result.skipped.len()
    ));

    let set = result_set(subset.title(), &result.premia);
    match output {
        Some(output) => {
            set.export_to_file(output, format)?;
            println!("Wrote {}", output.display());
        }
        None => {
            if format == ExportFormat::Markdown {
                print_banner(&format!("RISK PREMIA: {}", subset.title().to_uppercase()));
            }
            println!("{}", set.export_to_string(format)?);
        }
    }
    Ok(())
}

fn write_report(
    path: &Path,
    config: &FamaMacBethConfig,
    output: &Path,
    readme: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    print_banner(REPORT_TITLE);
    let (crsp, compustat) = load_panel(path)?;

    let pb = ProgressBar::new(SizeSubset::all().len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("█▓░"),
    );
    pb.enable_steady_tick(Duration::from_millis(100));

    let document = report_document(&crsp, &compustat, config, |subset| {
        pb.set_message(subset.title());
        pb.inc(1);
    })?;
    pb.finish_with_message("All subsets estimated");

    document.write_file(output)?;
    println!("Wrote {}", output.display());

    if let Some(readme) = readme {
        let all = document.require(SizeSubset::All.title())?;
        update_readme(readme, all)?;
        println!("Updated {}", readme.display());
    }
    Ok(())
}

/// Replace the results table in `text`, or append one if it has none.
fn replace_table(text: &str, set: &ResultSet) -> String {
    let table = set.table_markdown();
    let lines: Vec<&str> = text.lines().collect();
    let Some(start) = lines.iter().position(|l| l.trim() == TABLE_HEADER) else {
        let mut out = text.trim_end().to_string();
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str(&table);
        return out;
    };
    let end = lines[start..]
        .iter()
        .position(|l| !l.trim_start().starts_with('|'))
        .map_or(lines.len(), |offset| start + offset);

    let mut out = String::new();
    for line in &lines[..start] {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str(&table);
    for line in &lines[end..] {
        out.push_str(line);
        out.push('\n');
    }
    out
}

fn update_readme(path: &Path, set: &ResultSet) -> Result<(), Box<dyn std::error::Error>> {
    let text = if path.exists() {
        fs::read_to_string(path)?
    } else {
        "# premia\n".to_string()
    };
    fs::write(path, replace_table(&text, set))?;
    Ok(())
}

fn check(results: &Path, readme: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let document = ResultDocument::from_file(results)?;
    document.validate()?;
    for subset in SizeSubset::all() {
        let set = document.require(subset.title())?;
        println!("✓ {}: {} rows", set.title, set.rows.len());
    }

    if let Some(readme) = readme {
        let readme_doc = ResultDocument::from_file(readme)?;
        let [table] = readme_doc.sets.as_slice() else {
            return Err(format!(
                "{} must contain exactly one results table, found {}",
                readme.display(),
                readme_doc.sets.len()
            )
            .into());
        };
        let all = document.require(SizeSubset::All.title())?;
        if !tables_match(all, table) {
            return Err(format!(
                "the table in {} differs from the All Data table in {}",
                readme.display(),
                results.display()
            )
            .into());
        }
        println!("✓ {} matches All Data", readme.display());
    }
    Ok(())
}

fn vol_factor(input: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let records: Vec<CrspRecord> = read_csv(input)?;
    let factor = VolFactor::default().compute(&records)?;
    write_csv(output, &factor)?;

    let mean = factor.iter().map(|f| f.vol).sum::<f64>() / factor.len() as f64;
    println!(
        "Volatility factor: {} months, mean {:.4}% per month",
        factor.len(),
        100.0 * mean
    );
    println!("Wrote {}", output.display());
    Ok(())
}

fn print_store_info(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let stats = PanelStore::new(path)?.stats()?;
    println!("Database:        {}", path.display());
    println!("CRSP rows:       {}", stats.crsp_rows);
    println!("Securities:      {}", stats.securities);
    println!("Compustat rows:  {}", stats.compustat_rows);
    match (stats.first_date, stats.last_date) {
        (Some(first), Some(last)) => println!("Months:          {} to {}", first, last),
        _ => println!("Months:          (empty)"),
    }
    Ok(())
}

fn print_characteristics() {
    println!("\nCharacteristics:");
    for c in Characteristic::all() {
        println!("  {:<12} {:<11} {}", c.name(), format!("{:?}", c.category()), c.description());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use premia_output::PremiumRow;

    fn all_data(premium: f64) -> ResultSet {
        ResultSet::new(
            "All Data",
            vec![PremiumRow::new("Intercept", premium, 1.0)],
        )
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "premia",
            "-vv",
            "run",
            "--subset",
            "micro",
            "--ols",
            "--max-lags",
            "3",
            "--final",
            "2020-12-31",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Commands::Run {
            subset,
            ols,
            max_lags,
            db,
            ..
        } = cli.command
        else {
            panic!("expected run");
        };
        assert_eq!(subset.as_deref(), Some("micro"));
        assert!(ols);
        assert_eq!(max_lags, Some(3));
        assert_eq!(db.final_date, "2020-12-31");
        assert_eq!(db.start, "1960-01-01");
    }

    #[test]
    fn test_database_file_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = DatabaseArgs {
            start: "2000-01-01".to_string(),
            final_date: "2010-12-31".to_string(),
            database: None,
        };
        let path = database_file(Some(dir.path()), &db).unwrap();
        assert_eq!(path, dir.path().join("2000-01-01__2010-12-31.sqlite"));
        assert!(existing_database(Some(dir.path()), &db).is_err());
    }

    #[test]
    fn test_replace_table_keeps_surrounding_text() {
        let old = all_data(0.5).table_markdown();
        let text = format!("# premia\n\nIntro.\n\n{}\nMore text.\n", old);
        let updated = replace_table(&text, &all_data(0.75));
        assert!(updated.starts_with("# premia\n\nIntro.\n\n"));
        assert!(updated.ends_with("\nMore text.\n"));
        assert!(updated.contains("| **Intercept** | 0.750 | 1.000 |"));
        assert!(!updated.contains("0.500"));
    }

    #[test]
    fn test_replace_table_appends_when_missing() {
        let updated = replace_table("# premia\n", &all_data(0.5));
        assert!(updated.starts_with("# premia\n\n| Factor |"));
        let doc = premia_output::parse_document(&updated).unwrap();
        assert!(tables_match(&doc.sets[0], &all_data(0.5)));
    }

    #[test]
    fn test_check_detects_readme_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let mut document = ResultDocument::new(REPORT_TITLE);
        for subset in SizeSubset::all() {
            let rows = premia_output::EXPECTED_FACTORS
                .iter()
                .map(|f| PremiumRow::new(*f, 0.25, 1.5))
                .collect();
            document.push(ResultSet::new(subset.title(), rows));
        }
        let results = dir.path().join("results.md");
        document.write_file(&results).unwrap();

        let readme = dir.path().join("README.md");
        update_readme(&readme, &document.sets[0]).unwrap();
        check(&results, Some(&readme)).unwrap();

        fs::write(&readme, replace_table("# premia\n", &all_data(0.5))).unwrap();
        assert!(check(&results, Some(&readme)).is_err());
    }
}
