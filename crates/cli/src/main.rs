// ABOUTME: CLI for clipping: turns a press-mention spreadsheet into one record per keyword and media type.
// ABOUTME: Also exposes the survey, single-link resolution, keyword extraction and column inspection.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use clipping_media::{
    extract_keywords, CachedFetcher, Fetcher, MediaResolver, PageFetcher, BULK_PAUSE,
};
use clipping_sheet::{
    aggregation_from_json, map_columns, process_table, read_table, survey, write_keywords_xlsx,
    write_pages_xlsx, AggregateOptions, Envelope, Field, MapperOptions, SurveyOptions,
};
use tracing::subscriber::DefaultGuard;
use tracing::{error, info};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Organize press-mention spreadsheets by keyword and media type.
#[derive(Parser, Debug)]
#[command(name = "clipping")]
#[command(about = "Resolve media links for press-mention spreadsheets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    fetch: FetchArgs,

    /// Log at debug level (overrides RUST_LOG).
    #[arg(long, global = true, default_value_t = false)]
    verbose: bool,

    /// Also write the log to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Per-request timeout in seconds.
    #[arg(long, global = true, default_value_t = 15)]
    timeout_secs: u64,

    /// Override the browser User-Agent sent with each request.
    #[arg(long, global = true)]
    user_agent: Option<String>,

    /// Extra request header as NAME:VALUE (repeatable).
    #[arg(long = "header", global = true)]
    headers: Vec<String>,

    /// Minimum pause between requests in milliseconds.
    #[arg(long, global = true)]
    pause_ms: Option<u64>,

    /// Fetch each page at most once per run.
    #[arg(long, global = true, default_value_t = false)]
    cache_pages: bool,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Output workbook path.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the JSON envelope to stdout instead of writing a workbook (unless -o is given).
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Output compact JSON instead of pretty.
    #[arg(long, default_value_t = false)]
    compact: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Map columns, aggregate by keyword and export the "Keywords" sheet.
    Process {
        /// Source spreadsheet (.xlsx, .xls, .ods or .csv).
        file: PathBuf,

        /// Sheet to read instead of the first one.
        #[arg(long)]
        sheet: Option<String>,

        #[command(flatten)]
        out: OutputArgs,

        /// Never use an image link directly for the category its page looks like.
        #[arg(long, default_value_t = false)]
        no_image_heuristic: bool,

        /// Fail instead of using the first column when no keyword header is found.
        #[arg(long, default_value_t = false)]
        no_first_column_fallback: bool,
    },

    /// Write the "Keywords" sheet from a JSON envelope produced by `process --json`.
    Export {
        /// JSON file, or "-" for stdin.
        json: PathBuf,

        /// Output workbook path.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Survey pages listed in the first column of a spreadsheet.
    Survey {
        file: PathBuf,

        #[arg(long)]
        sheet: Option<String>,

        #[command(flatten)]
        out: OutputArgs,

        /// First sheet row to survey (the header is row 1).
        #[arg(long, default_value_t = 2)]
        first_row: usize,

        /// Survey at most this many rows.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Resolve a single link for a media category.
    Resolve {
        url: String,

        /// Portal, Impresso, TV or Rádio.
        #[arg(long, default_value = "Portal")]
        category: String,
    },

    /// Print the keywords found on a page, one per line.
    Keywords { url: String },

    /// Show how the headers of a spreadsheet map onto the canonical fields.
    Columns {
        file: PathBuf,

        #[arg(long)]
        sheet: Option<String>,

        #[arg(long, default_value_t = false)]
        no_first_column_fallback: bool,
    },
}

impl Command {
    fn json_output(&self) -> bool {
        match self {
            Command::Process { out, .. } | Command::Survey { out, .. } => out.json,
            _ => false,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let _guard = match init_logging(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("error: {:#}", err);
            return ExitCode::FAILURE;
        }
    };

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let message = format!("{:#}", err);
            error!(%message, "run failed");
            if cli.command.json_output() {
                let envelope = Envelope::error(message.clone());
                match envelope.to_json(false) {
                    Ok(json) => println!("{}", json),
                    Err(_) => eprintln!("error: {}", message),
                }
            } else {
                eprintln!("error: {}", message);
            }
            ExitCode::FAILURE
        }
    }
}

/// Install the subscriber for this run. Dropping the guard ends the run's logging.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<DefaultGuard> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer);
    Ok(tracing::subscriber::set_default(subscriber))
}

fn build_fetcher(args: &FetchArgs, default_pause: Duration) -> Result<Box<dyn PageFetcher>> {
    let mut builder = Fetcher::builder()
        .timeout(Duration::from_secs(args.timeout_secs))
        .pause(args.pause_ms.map(Duration::from_millis).unwrap_or(default_pause));
    if let Some(agent) = &args.user_agent {
        builder = builder.user_agent(agent.clone());
    }
    for header in &args.headers {
        let Some((name, value)) = header.split_once(':') else {
            bail!("invalid --header {:?}, expected NAME:VALUE", header);
        };
        builder = builder.header(name.trim(), value.trim());
    }

    let fetcher = builder.build().context("failed to build HTTP client")?;
    if args.cache_pages {
        Ok(Box::new(CachedFetcher::new(fetcher)))
    } else {
        Ok(Box::new(fetcher))
    }
}

fn default_output(file: &Path, suffix: &str) -> PathBuf {
    let stem = file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "planilha".to_string());
    file.with_file_name(format!("{}_{}.xlsx", stem, suffix))
}

fn print_json(envelope: &Envelope, compact: bool) -> Result<()> {
    println!("{}", envelope.to_json(!compact)?);
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Process {
            file,
            sheet,
            out,
            no_image_heuristic,
            no_first_column_fallback,
        } => {
            let table = read_table(file, sheet.as_deref())?;
            let fetcher = build_fetcher(&cli.fetch, Duration::ZERO)?;
            let mapper_opts = MapperOptions {
                first_column_fallback: !no_first_column_fallback,
            };
            let opts = AggregateOptions {
                trust_image_media_type: !no_image_heuristic,
                ..AggregateOptions::default()
            };
            let (_, aggregation) = process_table(&table, fetcher.as_ref(), &mapper_opts, opts)?;
            let records: usize = aggregation.values().map(Vec::len).sum();
            info!(keywords = aggregation.len(), records, "aggregation finished");

            if out.json {
                if let Some(path) = &out.output {
                    write_keywords_xlsx(path, &aggregation)?;
                }
                print_json(&Envelope::keywords(aggregation), out.compact)?;
            } else {
                let path = out
                    .output
                    .clone()
                    .unwrap_or_else(|| default_output(file, "keywords"));
                write_keywords_xlsx(&path, &aggregation)?;
                println!(
                    "{} records for {} keywords written to {}",
                    records,
                    aggregation.len(),
                    path.display()
                );
            }
        }

        Command::Export { json, output } => {
            let text = if json.as_os_str() == "-" {
                io::read_to_string(io::stdin()).context("failed to read stdin")?
            } else {
                fs::read_to_string(json)
                    .with_context(|| format!("failed to read {}", json.display()))?
            };
            let aggregation = aggregation_from_json(&text)?;
            write_keywords_xlsx(output, &aggregation)?;
            println!("{} keywords written to {}", aggregation.len(), output.display());
        }

        Command::Survey {
            file,
            sheet,
            out,
            first_row,
            limit,
        } => {
            let table = read_table(file, sheet.as_deref())?;
            let fetcher = build_fetcher(&cli.fetch, BULK_PAUSE)?;
            let opts = SurveyOptions {
                first_row: *first_row,
                limit: *limit,
            };
            let reports = survey(&table, fetcher.as_ref(), &opts);

            if out.json {
                if let Some(path) = &out.output {
                    write_pages_xlsx(path, &reports)?;
                }
                print_json(&Envelope::pages(reports), out.compact)?;
            } else {
                let path = out
                    .output
                    .clone()
                    .unwrap_or_else(|| default_output(file, "pages"));
                write_pages_xlsx(&path, &reports)?;
                println!("{} pages written to {}", reports.len(), path.display());
            }
        }

        Command::Resolve { url, category } => {
            let fetcher = build_fetcher(&cli.fetch, Duration::ZERO)?;
            let resolver = MediaResolver::new(fetcher.as_ref());
            println!("{}", resolver.resolve_label(url, category));
        }

        Command::Keywords { url } => {
            let fetcher = build_fetcher(&cli.fetch, Duration::ZERO)?;
            let mut seen = HashSet::new();
            for keyword in extract_keywords(fetcher.as_ref(), url) {
                if seen.insert(keyword.clone()) {
                    println!("{}", keyword);
                }
            }
        }

        Command::Columns {
            file,
            sheet,
            no_first_column_fallback,
        } => {
            let table = read_table(file, sheet.as_deref())?;
            let opts = MapperOptions {
                first_column_fallback: !no_first_column_fallback,
            };
            let mapping = map_columns(&table.headers, &opts)?;
            for field in Field::ALL {
                match mapping.column(field) {
                    Some(column) => println!(
                        "{:<18} {} (column {})",
                        field.name(),
                        column.header,
                        column.index + 1
                    ),
                    None => println!("{:<18} -", field.name()),
                }
            }
            for note in &mapping.diagnostics {
                println!("note: {}", note);
            }
        }
    }

    Ok(())
}
