use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ingredients::config::{EngineConfig, DECISION_CHANNEL_CAPACITY};
use ingredients::conversion::UnitConverter;
use ingredients::db::{init_directory_schema, PgDecisionSink, PgIngredientDirectory, PgUnitSource};
use ingredients::decision_log::{ChannelDecisionLog, DecisionSink, TracingDecisionSink};
use ingredients::directory::{IngredientDirectory, InMemoryIngredientDirectory};
use ingredients::ingredient_integration::{ingest_recipe, summarize_batch};
use ingredients::ingredient_model::{RawLine, UnitSystem};
use ingredients::ingredient_parser::parse;
use ingredients::matcher::IngredientMatcher;
use ingredients::unit_catalog::{StaticUnitSource, UnitDirectory, UnitSource};
use sqlx::PgPool;
use std::env;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ingredient-engine")]
#[command(about = "Parse, match and convert recipe ingredient lines")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse ingredient lines (arguments, or stdin when none) and print JSON
    Parse {
        /// Ingredient lines
        lines: Vec<String>,
        /// Match against a JSON directory file instead of DATABASE_URL
        #[arg(long)]
        directory: Option<PathBuf>,
        /// Recipe id attached to log spans and decision records
        #[arg(long)]
        recipe_id: Option<String>,
        /// Recipe title attached to log spans
        #[arg(long)]
        recipe_title: Option<String>,
        /// Print a review summary to stderr after the JSON
        #[arg(long)]
        summary: bool,
    },
    /// Scale and convert one quantity
    Convert {
        #[arg(long)]
        amount: f64,
        #[arg(long)]
        unit: String,
        /// native, metric or imperial
        #[arg(long, default_value = "native")]
        system: UnitSystem,
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
        /// JSON unit table to use instead of DATABASE_URL or the built-in table
        #[arg(long)]
        units: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ingredients=info"));
    let json = env::var("LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn connect_database() -> Result<Option<PgPool>> {
    let Ok(database_url) = env::var("DATABASE_URL") else {
        return Ok(None);
    };
    info!("Connecting to ingredient directory database");
    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to DATABASE_URL")?;
    init_directory_schema(&pool).await?;
    Ok(Some(pool))
}

fn read_lines(lines: Vec<String>) -> Result<Vec<String>> {
    if !lines.is_empty() {
        return Ok(lines);
    }
    io::stdin()
        .lock()
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read ingredient lines from stdin")
}

async fn run_parse(
    config: &EngineConfig,
    lines: Vec<String>,
    directory: Option<PathBuf>,
    recipe_id: Option<String>,
    recipe_title: Option<String>,
    summary: bool,
) -> Result<()> {
    let lines: Vec<RawLine> = read_lines(lines)?
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty())
        .map(|line| {
            let mut raw = RawLine::new(line);
            raw.recipe_id = recipe_id.clone();
            raw.recipe_title = recipe_title.clone();
            raw
        })
        .collect();

    let (ingredient_directory, sink): (Arc<dyn IngredientDirectory>, Arc<dyn DecisionSink>) =
        match directory {
            Some(path) => {
                let directory = InMemoryIngredientDirectory::from_json_file(&path)
                    .with_context(|| format!("Failed to load directory {}", path.display()))?;
                let sink: Arc<dyn DecisionSink> = Arc::new(TracingDecisionSink);
                (Arc::new(directory) as Arc<dyn IngredientDirectory>, sink)
            }
            None => match connect_database().await? {
                Some(pool) => {
                    let sink: Arc<dyn DecisionSink> = Arc::new(PgDecisionSink::new(pool.clone()));
                    (Arc::new(PgIngredientDirectory::new(pool)) as Arc<dyn IngredientDirectory>, sink)
                }
                None => {
                    let parsed: Vec<_> = lines.iter().map(|line| parse(&line.text)).collect();
                    println!("{}", serde_json::to_string_pretty(&parsed)?);
                    return Ok(());
                }
            },
        };

    let (decision_log, writer) =
        ChannelDecisionLog::spawn(sink, &config.recovery, DECISION_CHANNEL_CAPACITY);
    let matcher = IngredientMatcher::new(ingredient_directory, config.matcher.clone())
        .with_decision_log(Arc::new(decision_log));

    let items = ingest_recipe(&matcher, &lines, &config.batch)
        .await
        .context("Ingredient directory unavailable")?;
    println!("{}", serde_json::to_string_pretty(&items)?);
    if summary {
        eprintln!("{}", summarize_batch(&items));
    }

    // Flush pending decision records
    drop(matcher);
    writer.await.context("Decision log writer failed")?;
    Ok(())
}

async fn run_convert(
    config: &EngineConfig,
    amount: f64,
    unit: &str,
    system: UnitSystem,
    scale: f64,
    units: Option<PathBuf>,
) -> Result<()> {
    let source: Arc<dyn UnitSource> = match units {
        Some(path) => Arc::new(
            StaticUnitSource::from_json_file(&path)
                .with_context(|| format!("Failed to load unit table {}", path.display()))?,
        ),
        None => match connect_database().await? {
            Some(pool) => Arc::new(PgUnitSource::new(pool)),
            None => Arc::new(StaticUnitSource::standard()),
        },
    };

    let converter = UnitConverter::new(Arc::new(UnitDirectory::new(source, config.recovery.clone())));
    let result = converter.convert(amount, unit, system, scale).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = EngineConfig::from_env();

    match cli.command {
        Commands::Parse {
            lines,
            directory,
            recipe_id,
            recipe_title,
            summary,
        } => run_parse(&config, lines, directory, recipe_id, recipe_title, summary).await,
        Commands::Convert {
            amount,
            unit,
            system,
            scale,
            units,
        } => run_convert(&config, amount, &unit, system, scale, units).await,
    }
}
