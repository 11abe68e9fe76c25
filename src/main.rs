use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use triage_core::{AggregationPolicy, OutputFormat, TriageConfig};
use triage_model::cache::RecordCache;
use triage_model::diversity::rank_by_diversity;
use triage_model::graph::GraphFilter;
use triage_model::output;
use triage_model::session::AnalysisSession;

#[derive(Parser)]
#[command(
    name = "triage",
    version,
    about = "Bug triage analytics over a contribution log",
    long_about = "Turns a CSV log of contributor → bug-category contributions into a\n\
                   contribution matrix, a filterable bipartite graph, and per-contributor\n\
                   diversity metrics.\n\n\
                   Examples:\n  \
                     triage records                         Show the raw contribution log\n  \
                     triage matrix --format markdown        Contributor × category matrix\n  \
                     triage graph --min-edge-weight 3       Graph nodes and edges\n  \
                     triage diversity --sort diversity      Diversity scatter feed\n  \
                     triage breakdown alice                 Per-category counts for one contributor\n  \
                     triage report                          Everything at a glance"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .triage.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Contribution log to analyze (overrides [data] path)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose (debug) logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Show the raw contribution records
    Records,
    /// Show the contributor × bug-category contribution matrix
    #[command(long_about = "Show the contributor × bug-category contribution matrix.\n\n\
        Rows are contributors and columns are bug categories, both sorted.\n\
        By default a later record for the same (contributor, category) pair\n\
        replaces the earlier one; use --aggregation sum to add them instead.\n\n\
        Examples:\n  triage matrix\n  triage matrix --aggregation sum --format json")]
    Matrix {
        /// How duplicate (contributor, category) records combine
        #[arg(long)]
        aggregation: Option<AggregationPolicy>,
    },
    /// Build the contributor ↔ bug-category graph
    #[command(long_about = "Build the contributor ↔ bug-category graph.\n\n\
        A record becomes an edge when its weight lies within the edge-weight bounds\n\
        and its contributor's total is at least --min-total-contribs. Omitting\n\
        --max-edge-weight, or giving a value below --min-edge-weight, leaves the\n\
        upper bound open.\n\n\
        Examples:\n  triage graph\n  triage graph --min-edge-weight 3 --max-edge-weight 100 --format json")]
    Graph {
        #[command(flatten)]
        thresholds: Thresholds,
        /// How duplicate (contributor, category) records combine
        #[arg(long)]
        aggregation: Option<AggregationPolicy>,
    },
    /// Show per-contributor diversity index and frequency
    Diversity {
        /// Row order
        #[arg(long, default_value = "name")]
        sort: DiversitySort,
        /// How duplicate (contributor, category) records combine
        #[arg(long)]
        aggregation: Option<AggregationPolicy>,
    },
    /// Show per-category counts for one contributor
    Breakdown {
        /// Contributor identifier
        contributor: String,
        /// How duplicate (contributor, category) records combine
        #[arg(long)]
        aggregation: Option<AggregationPolicy>,
    },
    /// Summarize records, matrix, graph, and diversity in one pass
    Report {
        #[command(flatten)]
        thresholds: Thresholds,
        /// How duplicate (contributor, category) records combine
        #[arg(long)]
        aggregation: Option<AggregationPolicy>,
        /// Number of most-diverse contributors to list (default: 10)
        #[arg(long, default_value = "10")]
        top: usize,
    },
    /// Create a default .triage.toml configuration file
    #[command(long_about = "Create a default .triage.toml configuration file.\n\n\
        Generates a commented template with all available options.\n\
        Fails if .triage.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(clap::Args)]
struct Thresholds {
    /// Minimum per-record weight for an edge (default from config: 1)
    #[arg(long)]
    min_edge_weight: Option<u64>,
    /// Maximum per-record weight for an edge (default: unbounded)
    #[arg(long)]
    max_edge_weight: Option<u64>,
    /// Minimum contributor total for their edges to appear (default from config: 0)
    #[arg(long)]
    min_total_contribs: Option<u64>,
}

impl Thresholds {
    /// Layer CLI thresholds over the configured defaults.
    fn resolve(&self, config: &TriageConfig) -> GraphFilter {
        let min_edge_weight = self
            .min_edge_weight
            .unwrap_or(config.graph.min_edge_weight);
        let max_edge_weight = self.max_edge_weight.or(config.graph.max_edge_weight);
        let min_total_contribs = self
            .min_total_contribs
            .unwrap_or(config.graph.min_total_contribs);
        GraphFilter::new(min_edge_weight, max_edge_weight, min_total_contribs)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DiversitySort {
    /// Alphabetical by contributor
    Name,
    /// Highest diversity first
    Diversity,
}

const DEFAULT_CONFIG: &str = r#"# Bug triage configuration

[data]
# CSV with columns source, target, weight, start_date, end_date, year
# path = "data/commits.csv"

[tally]
# How repeated (contributor, category) rows combine: "last-write-wins" or "sum"
# aggregation = "last-write-wins"

[graph]
# min_edge_weight = 1
# max_edge_weight = 100
# min_total_contribs = 0
"#;

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    // stdout carries command output, so logs go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<&Path>) -> Result<TriageConfig> {
    match path {
        Some(path) => Ok(TriageConfig::from_file(path)?),
        None => {
            let default_path = Path::new(".triage.toml");
            if default_path.exists() {
                Ok(TriageConfig::from_file(default_path)?)
            } else {
                Ok(TriageConfig::default())
            }
        }
    }
}

fn open_session(
    cli: &Cli,
    config: &TriageConfig,
    aggregation: Option<AggregationPolicy>,
) -> Result<AnalysisSession> {
    let path = cli.data.as_deref().unwrap_or(config.data.path.as_path());
    let policy = aggregation.unwrap_or(config.tally.aggregation);

    if !path.exists() {
        miette::bail!(miette::miette!(
            help = "Pass --data <file>, or set [data] path in .triage.toml",
            "Contribution log not found: {}",
            path.display()
        ));
    }

    let mut cache = RecordCache::new();
    tracing::debug!(path = %path.display(), %policy, "opening session");
    Ok(AnalysisSession::open(&mut cache, path, policy)?)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!(format = %cli.format, "configuration loaded");

    let rendered = match &cli.command {
        Command::Records => {
            let session = open_session(&cli, &config, None)?;
            output::format_records(session.records(), cli.format)?
        }
        Command::Matrix { aggregation } => {
            let mut session = open_session(&cli, &config, *aggregation)?;
            output::format_matrix(&session.matrix(), cli.format)?
        }
        Command::Graph {
            thresholds,
            aggregation,
        } => {
            let filter = thresholds.resolve(&config);
            let mut session = open_session(&cli, &config, *aggregation)?;
            let graph = session.graph(filter);
            output::format_graph(&graph, &filter, cli.format)?
        }
        Command::Diversity { sort, aggregation } => {
            let mut session = open_session(&cli, &config, *aggregation)?;
            let diversity = session.diversity();
            match sort {
                DiversitySort::Name => output::format_diversity(&diversity, cli.format)?,
                DiversitySort::Diversity => {
                    output::format_diversity(&rank_by_diversity(&diversity), cli.format)?
                }
            }
        }
        Command::Breakdown {
            contributor,
            aggregation,
        } => {
            let mut session = open_session(&cli, &config, *aggregation)?;
            let counts = session.matrix().category_breakdown(contributor)?;
            output::format_breakdown(contributor, &counts, cli.format)?
        }
        Command::Report {
            thresholds,
            aggregation,
            top,
        } => {
            let filter = thresholds.resolve(&config);
            let mut session = open_session(&cli, &config, *aggregation)?;
            let report = triage_model::generate_report(&mut session, filter, *top);
            output::format_report(&report, cli.format)?
        }
        Command::Init => {
            let path = Path::new(".triage.toml");
            if path.exists() {
                miette::bail!(".triage.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            "Created .triage.toml with default configuration\n".to_string()
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "triage", &mut std::io::stdout());
            String::new()
        }
    };

    print!("{rendered}");
    Ok(())
}
