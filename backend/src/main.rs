//! Orcamento CLI - Normalize accounting exports for the budget dashboard
//!
//! # Main Commands
//!
//! ```bash
//! orcamento convert --detailed det.csv --equipment eq.csv  # Budget sheets -> <data>/<year>/orcado.csv
//! orcamento ledger razao.csv --year 2026                   # General ledger -> realizado.csv
//! orcamento items itens.csv --year 2026                    # Itemized ledger -> detalhes.csv
//! orcamento catalog                                        # Equipment catalog JSON
//! orcamento summary                                        # Plan vs. actual overview
//! orcamento serve                                          # Serve the data directory
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! orcamento run --rule rule.json input.csv -o out.csv  # Apply any rule
//! orcamento rules [name]                               # List or dump built-in rules
//! orcamento split 'a,"b,c",d'                           # Show how a line splits
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use orcamento::api::logs::LOG_BROADCASTER;
use orcamento::dashboard::{
    compare_by, format_currency, format_percentage, kpis, load_all, variance_color, AssetSource,
    Filter, GroupKey, VarianceLevel,
};
use orcamento::transform::{
    builtin_rule, resolve_rule, year_path, CatalogSummary, ConversionSummary, ACTUALS_FILE,
    BUDGET_FILE, BUDGET_YEAR, CATALOG_FILE, PREVIOUS_YEAR,
};
use orcamento::{
    convert_budget, convert_itemized, convert_ledger, convert_with_rule, generate_catalog,
    split_line, BudgetInputs, CatalogSource, EtlConfig, QuoteMode, BUILTIN_RULES,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "orcamento")]
#[command(about = "Normalize accounting exports into budget dashboard data", long_about = None)]
struct Cli {
    /// Data root (default: $ORCAMENTO_DATA_DIR or ./data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Do not print pipeline logs
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert the budget sheets into <data>/<year>/orcado.csv
    Convert {
        /// Detailed budget sheet (previous and current year per class)
        #[arg(long)]
        detailed: Option<PathBuf>,

        /// Budget sheet per equipment (current year)
        #[arg(long)]
        equipment: Option<PathBuf>,
    },

    /// Convert a general-ledger export into <data>/<year>/realizado.csv
    Ledger {
        /// Input CSV file
        input: PathBuf,

        /// Keep only this fiscal year
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Convert an itemized ledger into <data>/<year>/detalhes.csv
    Items {
        /// Input CSV file
        input: PathBuf,

        /// Keep only this fiscal year
        #[arg(short, long)]
        year: Option<i32>,

        /// Also write the line totals to realizado.csv
        #[arg(long)]
        write_actuals: bool,
    },

    /// Generate the equipment catalog from normalized outputs
    Catalog {
        /// Normalized CSVs to scan (default: budget and actuals of both years)
        #[arg(long = "from")]
        from: Vec<PathBuf>,

        /// Raw per-equipment budget sheet to scan as well
        #[arg(long)]
        raw: Option<PathBuf>,

        /// Rule used to read --raw (built-in name or JSON file)
        #[arg(long, default_value = "equipment-budget")]
        raw_rule: String,

        /// Public copy root (default: $ORCAMENTO_PUBLIC_DIR or ./public/data)
        #[arg(long)]
        public_dir: Option<PathBuf>,

        /// Do not write the public copy
        #[arg(long)]
        no_public: bool,
    },

    /// Apply a rule (built-in name or JSON file) to any input
    Run {
        /// Input file
        input: PathBuf,

        /// Rule name or path to a rule JSON file
        #[arg(short, long)]
        rule: String,

        /// Output CSV
        #[arg(short, long)]
        output: PathBuf,

        /// Output CSV for itemized details
        #[arg(long)]
        details: Option<PathBuf>,

        /// Keep only this fiscal year (long layouts)
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// List built-in rules, or print one as JSON
    Rules {
        /// Rule to print
        name: Option<String>,
    },

    /// Split one line the way the engine does
    Split {
        line: String,

        #[arg(short, long, default_value = ",")]
        delimiter: char,

        /// Plain split (quotes are data)
        #[arg(long)]
        plain: bool,
    },

    /// Plan vs. actual overview of the data directory
    Summary {
        /// Read from a server instead of the data directory
        #[arg(long)]
        url: Option<String>,

        #[arg(long, default_value_t = BUDGET_YEAR)]
        year: i32,

        #[arg(long, value_enum, default_value = "month")]
        by: GroupBy,

        /// Class group filter ("Todas" for all)
        #[arg(long, default_value = "Todas")]
        class: String,

        /// Equipment filter ("Todos" for all)
        #[arg(long, default_value = "Todos")]
        equipment: String,
    },

    /// Serve the data directory over HTTP
    Serve {
        /// Port to listen on (default: $ORCAMENTO_PORT or 3000)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupBy {
    Month,
    Class,
    Equipment,
}

impl From<GroupBy> for GroupKey {
    fn from(by: GroupBy) -> Self {
        match by {
            GroupBy::Month => GroupKey::Month,
            GroupBy::Class => GroupKey::ClassGroup,
            GroupBy::Equipment => GroupKey::Equipment,
        }
    }
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    let mut config = EtlConfig::from_env();
    let cli = Cli::parse();

    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    LOG_BROADCASTER.set_quiet(cli.quiet);

    let result: CmdResult = match cli.command {
        Commands::Convert {
            detailed,
            equipment,
        } => cmd_convert(&config, detailed, equipment),

        Commands::Ledger { input, year } => {
            convert_ledger(&input, year, &config.data_dir).map(print_summary).map_err(Into::into)
        }

        Commands::Items {
            input,
            year,
            write_actuals,
        } => convert_itemized(&input, year, &config.data_dir, write_actuals)
            .map(print_summary)
            .map_err(Into::into),

        Commands::Catalog {
            from,
            raw,
            raw_rule,
            public_dir,
            no_public,
        } => {
            if let Some(dir) = public_dir {
                config.public_dir = dir;
            }
            cmd_catalog(&config, from, raw, &raw_rule, no_public)
        }

        Commands::Run {
            input,
            rule,
            output,
            details,
            year,
        } => cmd_run(&input, &rule, &output, details.as_deref(), year),

        Commands::Rules { name } => cmd_rules(name.as_deref()),

        Commands::Split {
            line,
            delimiter,
            plain,
        } => cmd_split(&line, delimiter, plain),

        Commands::Summary {
            url,
            year,
            by,
            class,
            equipment,
        } => cmd_summary(&config, url, year, by, &class, &equipment).await,

        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            orcamento::server::start_server(&config.data_dir, port)
                .await
                .map_err(Into::into)
        }
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_convert(
    config: &EtlConfig,
    detailed: Option<PathBuf>,
    equipment: Option<PathBuf>,
) -> CmdResult {
    if detailed.is_none() && equipment.is_none() {
        return Err("nothing to convert: pass --detailed and/or --equipment".into());
    }
    let inputs = BudgetInputs {
        detailed,
        equipment,
    };
    print_summary(convert_budget(&inputs, &config.data_dir)?);
    Ok(())
}

fn cmd_catalog(
    config: &EtlConfig,
    from: Vec<PathBuf>,
    raw: Option<PathBuf>,
    raw_rule: &str,
    no_public: bool,
) -> CmdResult {
    let mut sources: Vec<CatalogSource> = if from.is_empty() {
        [PREVIOUS_YEAR, BUDGET_YEAR]
            .iter()
            .flat_map(|&year| {
                [BUDGET_FILE, ACTUALS_FILE]
                    .map(|file| CatalogSource::Normalized(year_path(&config.data_dir, year, file)))
            })
            .collect()
    } else {
        from.into_iter().map(CatalogSource::Normalized).collect()
    };
    if let Some(path) = raw {
        sources.push(CatalogSource::Raw {
            path,
            rule: resolve_rule(raw_rule)?,
        });
    }

    let mut destinations = vec![config.data_dir.join(CATALOG_FILE)];
    if !no_public {
        destinations.push(config.public_dir.join(CATALOG_FILE));
    }

    let summary: CatalogSummary = generate_catalog(&sources, &destinations)?;
    eprintln!(
        "\n✨ {} equipment entries ({} source(s) read, {} skipped)",
        summary.catalog.equipment.len(),
        summary.scan.sources_read,
        summary.scan.sources_skipped
    );
    Ok(())
}

fn cmd_run(
    input: &Path,
    rule: &str,
    output: &Path,
    details: Option<&Path>,
    year: Option<i32>,
) -> CmdResult {
    let mut rule = resolve_rule(rule)?;
    if let Some(year) = year {
        rule = rule.with_target_year(year);
    }
    print_summary(convert_with_rule(input, &rule, output, details)?);
    Ok(())
}

fn cmd_rules(name: Option<&str>) -> CmdResult {
    match name {
        Some(name) => println!("{}", builtin_rule(name)?.to_json()?),
        None => {
            for name in BUILTIN_RULES {
                let rule = builtin_rule(name)?;
                println!("  📄 {:<16} {}", rule.name, rule.description);
            }
        }
    }
    Ok(())
}

fn cmd_split(line: &str, delimiter: char, plain: bool) -> CmdResult {
    let mode = if plain { QuoteMode::Plain } else { QuoteMode::Quoted };
    let fields = split_line(line, delimiter, mode);
    println!("{}", serde_json::to_string_pretty(&fields)?);
    Ok(())
}

async fn cmd_summary(
    config: &EtlConfig,
    url: Option<String>,
    year: i32,
    by: GroupBy,
    class: &str,
    equipment: &str,
) -> CmdResult {
    let source = match url {
        Some(url) => AssetSource::http(url),
        None => AssetSource::Dir(config.data_dir.clone()),
    };
    let data = load_all(&source, year - 1, year).await;
    let filter = Filter::new(class, equipment);
    let currency = data.config.app.currency.as_str();

    let plan = filter.apply(&data.current.budget);
    let spent = filter.apply(&data.current.actuals);
    let totals = kpis(plan.iter().copied(), spent.iter().copied());

    println!("📊 {} ({})", data.config.app.name, year);
    println!("   Planned:   {}", format_currency(totals.total_baseline, currency));
    println!("   Spent:     {}", format_currency(totals.total_current, currency));
    println!(
        "   Variance:  {} ({}) [{}]",
        format_currency(totals.variance, currency),
        format_percentage(totals.variance_pct),
        VarianceLevel::from_pct(totals.variance_pct, &data.config.alerts).label()
    );
    println!("   Executed:  {}", format_percentage(totals.pct_executed));
    println!("   Equipment: {} in catalog", data.equipment.len());
    println!();

    for row in compare_by(plan, spent, by.into()) {
        println!(
            "   {:<28} {:>18} {:>18} {:>8} {}",
            row.key,
            format_currency(row.baseline, currency),
            format_currency(row.current, currency),
            format_percentage(row.variance_pct),
            variance_color(row.variance_pct, &data.config)
        );
    }
    Ok(())
}

fn print_summary(summary: ConversionSummary) {
    eprintln!();
    for report in &summary.reports {
        eprintln!("📊 {}", report.summary());
    }
    for file in &summary.written {
        eprintln!("   💾 {} ({} rows)", file.path.display(), file.rows);
    }
    eprintln!("✨ Done!");
}
