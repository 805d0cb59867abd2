// Entry point and high-level CLI flow.
//
// By default the binary produces one report: load the case data, apply the
// filters given on the command line, print the dashboard and optionally
// export it. With `--interactive` it runs a menu where every filter or
// target change immediately recomputes the dashboard.
mod aggregate;
mod cli;
mod config;
mod dashboard;
mod error;
mod filter;
mod loader;
mod output;
mod session;
mod types;
mod util;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use cli::{Args, OutputFormat};
use config::{Config, DEFAULT_CONFIG_FILE};
use filter::{Column, FilterCriteria};
use loader::Source;
use session::Session;
use std::collections::BTreeSet;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    if args.init_config {
        if let Err(e) = handle_init_config() {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
        return;
    }

    init_logging(&args);
    debug!("Arguments: {:?}", args);

    if let Err(e) = run(args) {
        error!("{:#}", e);
        eprintln!("\nError: {:#}", e);
        std::process::exit(1);
    }
}

fn handle_init_config() -> Result<()> {
    let path = Path::new(DEFAULT_CONFIG_FILE);
    if path.exists() {
        anyhow::bail!("{} already exists; remove it first or edit it", DEFAULT_CONFIG_FILE);
    }
    std::fs::write(path, Config::default_toml())
        .with_context(|| format!("Failed to write {}", DEFAULT_CONFIG_FILE))?;
    println!("Created {} with default settings.", DEFAULT_CONFIG_FILE);
    Ok(())
}

fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: logging was already initialised");
    }
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?.unwrap_or_default(),
    };
    config.merge_with_args(args);
    config.validate().map_err(anyhow::Error::msg)?;
    Ok(config)
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let today = args.today.unwrap_or_else(|| Local::now().date_naive());
    let mut session = Session::new(
        Source::parse(&config.source.location),
        config.load_options(),
        config.dashboard.annual_target,
        today,
    );

    if args.interactive {
        run_menu(&mut session, &config);
        return Ok(());
    }

    let table = session.load().context("Failed to load case data")?;
    info!(rows = table.len(), "case data ready");

    let mut criteria = FilterCriteria::spanning(&table)
        .unwrap_or_else(|| FilterCriteria::new(today, today));
    if let Some(start) = args.start {
        criteria.start = start;
    }
    if let Some(end) = args.end {
        criteria.end = end;
    }
    criteria.categories = args.category.iter().cloned().collect();
    criteria.partners = args.partner.iter().cloned().collect();

    let dash = dashboard::build(
        &session.source.to_string(),
        &table,
        &criteria,
        session.target,
        today,
    )?;

    match config.output.format {
        OutputFormat::Table => dashboard::render(&dash, config.dashboard.preview_rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dash)?),
    }

    if let Some(dir) = &config.output.dir {
        let files = dashboard::export(&dash, Path::new(dir))?;
        if config.output.format == OutputFormat::Table {
            println!("Exported {} files to {}", files.len(), dir);
        }
    }
    Ok(())
}

/// Print `label` and read one trimmed line from stdin. `None` once stdin
/// is closed.
fn prompt(label: &str) -> Option<String> {
    print!("{}", label);
    let _ = io::stdout().flush();
    read_answer(&mut io::stdin().lock())
}

fn read_answer<R: BufRead>(reader: &mut R) -> Option<String> {
    let mut buf = String::new();
    match reader.read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// `prompt` for the handlers: a closed stdin aborts the current step.
fn ask(label: &str) -> Result<String> {
    prompt(label).context("input closed")
}

fn run_menu(session: &mut Session, config: &Config) {
    loop {
        println!("Legal Cases Dashboard");
        println!("[1] Load the data");
        println!("[2] Set date range");
        println!("[3] Select categories");
        println!("[4] Select partners");
        println!("[5] Set annual target");
        println!("[6] Show dashboard");
        println!("[7] Export dashboard");
        println!("[0] Exit\n");
        let Some(choice) = prompt("Enter choice: ") else {
            println!();
            break;
        };
        let result = match choice.as_str() {
            "1" => handle_load(session),
            "2" => handle_date_range(session),
            "3" => handle_selection(session, Column::Category),
            "4" => handle_selection(session, Column::ReceivedFrom),
            "5" => handle_target(session),
            "6" => session
                .dashboard()
                .map(|d| dashboard::render(&d, config.dashboard.preview_rows))
                .map_err(Into::into),
            "7" => handle_export(session, config),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => {
                println!("Invalid choice. Please enter 0-7.\n");
                Ok(())
            }
        };
        // A failed step aborts this interaction only; the menu keeps going.
        if let Err(e) = result {
            eprintln!("Error: {:#}\n", e);
        }
    }
}

fn handle_load(session: &mut Session) -> Result<()> {
    let table = session.load()?;
    println!("Loaded {} cases from {}", util::format_int(table.len()), session.source);
    if let Some((first, last)) = table.date_span() {
        println!("Received dates {} to {}\n", first, last);
    }
    dashboard::render_summary(&session.dashboard()?);
    Ok(())
}

fn handle_date_range(session: &mut Session) -> Result<()> {
    let current = session
        .criteria()
        .cloned()
        .context("No data loaded. Please load the data first (option 1).")?;
    let start = read_date("Start date", current.start)?;
    let end = read_date("End date", current.end)?;
    dashboard::render_summary(&session.set_date_range(start, end)?);
    Ok(())
}

fn read_date(label: &str, current: NaiveDate) -> Result<NaiveDate> {
    let input = ask(&format!("{} (YYYY-MM-DD, blank keeps {}): ", label, current))?;
    if input.is_empty() {
        return Ok(current);
    }
    NaiveDate::parse_from_str(&input, "%Y-%m-%d")
        .with_context(|| format!("'{}' is not a YYYY-MM-DD date", input))
}

fn handle_selection(session: &mut Session, column: Column) -> Result<()> {
    if !session.is_loaded() {
        anyhow::bail!("No data loaded. Please load the data first (option 1).");
    }
    let options = session.options_for(column);
    for (i, value) in options.iter().enumerate() {
        println!("  [{}] {}", i + 1, value);
    }
    let input = ask("Numbers or names, comma-separated (blank = all): ")?;
    let selected = parse_selection(&input, &options).map_err(anyhow::Error::msg)?;
    let dash = match column {
        Column::Category => session.set_categories(selected)?,
        Column::ReceivedFrom => session.set_partners(selected)?,
    };
    dashboard::render_summary(&dash);
    Ok(())
}

/// Resolve a comma-separated answer against the numbered option list.
/// Numbers pick from `options`; anything else is taken as a literal value.
fn parse_selection(input: &str, options: &[String]) -> Result<BTreeSet<String>, String> {
    let mut selected = BTreeSet::new();
    for item in input.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        match item.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => {
                selected.insert(options[n - 1].clone());
            }
            Ok(n) => return Err(format!("{} is not in the list (1-{})", n, options.len())),
            Err(_) => {
                selected.insert(item.to_string());
            }
        }
    }
    Ok(selected)
}

fn handle_target(session: &mut Session) -> Result<()> {
    let input = ask(&format!("Annual target (current {}): ", session.target))?;
    let target: f64 = input
        .parse()
        .with_context(|| format!("'{}' is not a number", input))?;
    if !target.is_finite() || target < 0.0 {
        anyhow::bail!("Annual target must be zero or more.");
    }
    dashboard::render_summary(&session.set_target(target)?);
    Ok(())
}

fn handle_export(session: &Session, config: &Config) -> Result<()> {
    let dash = session.dashboard()?;
    let dir = match &config.output.dir {
        Some(dir) => dir.clone(),
        None => ask("Export directory: ")?,
    };
    if dir.is_empty() {
        anyhow::bail!("No export directory given.");
    }
    let files = dashboard::export(&dash, Path::new(&dir))?;
    for f in &files {
        println!("  wrote {}", f.display());
    }
    println!();
    Ok(())
}
