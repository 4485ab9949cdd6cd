//! Moviebench Command-Line Tool
//!
//! Loads fixture data into a backend and runs single benchmark queries for
//! smoke testing. The timing loop itself lives in the criterion benches and
//! external drivers; this binary only exercises one call at a time.

use std::str::FromStr;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;

use moviebench_backends::Scale;
use moviebench_core::{
    BackendKind, BenchConfig, QueryName, DEFAULT_CONCURRENCY, DEFAULT_NUMBER_OF_IDS,
};

/// Moviebench Command-Line Tool
#[derive(Parser, Debug)]
#[command(name = "moviebench")]
#[command(version, about = "Movie-review workload loader and smoke runner")]
pub struct Args {
    /// Backend to drive
    #[arg(short, long, default_value = "sqlite", value_enum)]
    pub backend: Backend,

    /// SQLite path (or :memory:) / PostgreSQL URL; EdgeDB ignores this and
    /// uses its own credential discovery
    #[arg(short, long, default_value = ":memory:")]
    pub dsn: String,

    /// Ids sampled per query
    #[arg(long, default_value_t = DEFAULT_NUMBER_OF_IDS)]
    pub number_of_ids: usize,

    /// Worker count the id pool is shaped for
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Backend {
    Sqlite,
    Postgres,
    Edgedb,
}

impl From<Backend> for BackendKind {
    fn from(value: Backend) -> Self {
        match value {
            Backend::Sqlite => BackendKind::Sqlite,
            Backend::Postgres => BackendKind::Postgres,
            Backend::Edgedb => BackendKind::EdgeDb,
        }
    }
}

/// Fixture dataset size.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ScaleArg {
    Tiny,
    Small,
    Medium,
    Large,
}

impl From<ScaleArg> for Scale {
    fn from(value: ScaleArg) -> Self {
        match value {
            ScaleArg::Tiny => Scale::Tiny,
            ScaleArg::Small => Scale::Small,
            ScaleArg::Medium => Scale::Medium,
            ScaleArg::Large => Scale::Large,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the schema and load generated fixtures
    Load {
        /// Dataset size
        #[arg(long, default_value = "medium", value_enum)]
        scale: ScaleArg,
    },
    /// Sample benchmark ids and print the pool as JSON
    Sample,
    /// Execute one query and print the resulting document
    Run {
        /// Query name (get_user, get_movie, get_person, update_movie, insert_user)
        #[arg(value_parser = QueryName::from_str)]
        query: QueryName,

        /// Use this id instead of sampling one
        #[arg(long)]
        id: Option<String>,

        /// Load fixtures at this scale first (the only way an in-memory
        /// SQLite run has data)
        #[arg(long, value_enum)]
        scale: Option<ScaleArg>,
    },
    /// Strip artifacts left behind by the mutating queries
    Reset {
        /// Only reset this query (update_movie or insert_user)
        #[arg(long, value_parser = QueryName::from_str)]
        query: Option<QueryName>,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("moviebench_cli=info".parse().unwrap())
                .add_directive("moviebench_backends=info".parse().unwrap()),
        )
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = BenchConfig::new(args.backend.into(), &args.dsn)
        .with_number_of_ids(args.number_of_ids)
        .with_concurrency(args.concurrency);

    match args.command {
        Command::Load { scale } => load(&cfg, scale.into()),
        Command::Sample => sample(&cfg),
        Command::Run { query, id, scale } => run_once(&cfg, query, id, scale.map(Into::into)),
        Command::Reset { query } => reset(&cfg, query),
    }
}

/// Load generated fixtures, then disconnect.
fn load(cfg: &BenchConfig, scale: Scale) -> Result<(), Box<dyn std::error::Error>> {
    if matches!(cfg.backend, BackendKind::Sqlite) && matches!(cfg.dsn.as_str(), "" | ":memory:") {
        return Err(
            "an in-memory SQLite database is discarded at exit; pass --dsn <path> \
             or use `run --scale` for a self-contained invocation"
                .into(),
        );
    }

    let mut adapter = moviebench_backends::connect_populated(cfg, scale)?;
    adapter.close()?;
    println!(
        "loaded {} users, {} movies, {} people into {}",
        scale.users(),
        scale.movies(),
        scale.people(),
        cfg.backend.as_str()
    );
    Ok(())
}

/// Sample ids for every query and print the pool.
fn sample(cfg: &BenchConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut adapter = moviebench_backends::connect(cfg)?;
    let pool = adapter.load_ids(cfg)?;
    println!("{}", serde_json::to_string_pretty(&pool)?);
    adapter.close()?;
    Ok(())
}

/// Run one query through the full setup/execute/cleanup cycle.
fn run_once(
    cfg: &BenchConfig,
    query: QueryName,
    id: Option<String>,
    scale: Option<Scale>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut adapter = match scale {
        Some(scale) => moviebench_backends::connect_populated(cfg, scale)?,
        None => moviebench_backends::connect(cfg)?,
    };

    let id = match id {
        Some(id) => id,
        None => {
            let pool = adapter.load_ids(cfg)?;
            pool.get(query)
                .first()
                .cloned()
                .ok_or("id pool is empty; run `load` first or pass --scale")?
        }
    };

    adapter.setup(cfg, query)?;
    let started = Instant::now();
    let document = match query {
        QueryName::GetUser => adapter.get_user(&id),
        QueryName::GetMovie => adapter.get_movie(&id),
        QueryName::GetPerson => adapter.get_person(&id),
        QueryName::UpdateMovie => adapter.update_movie(&id),
        QueryName::InsertUser => adapter.insert_user(&id),
    }?;
    info!(
        query = query.as_str(),
        elapsed_us = started.elapsed().as_micros() as u64,
        "query completed"
    );

    println!("{}", document);
    adapter.cleanup(cfg, query)?;
    adapter.close()?;
    Ok(())
}

/// Run the reset hooks for one or both mutating queries.
fn reset(
    cfg: &BenchConfig,
    query: Option<QueryName>,
) -> Result<(), Box<dyn std::error::Error>> {
    let queries = match query {
        Some(q) if q.is_mutation() => vec![q],
        Some(q) => return Err(format!("{} leaves nothing to reset", q.as_str()).into()),
        None => vec![QueryName::UpdateMovie, QueryName::InsertUser],
    };

    let mut adapter = moviebench_backends::connect(cfg)?;
    for q in queries {
        adapter.setup(cfg, q)?;
        info!(query = q.as_str(), "reset complete");
    }
    adapter.close()?;
    Ok(())
}
