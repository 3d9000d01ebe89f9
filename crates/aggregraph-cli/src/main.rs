#![forbid(unsafe_code)]

mod cmd;
mod output;

use aggregraph_core::ExecutionMode;
use aggregraph_core::config::resolve_config;
use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use std::env;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "aggr: order type graphs and pack self-referential records",
    long_about = None
)]
struct Cli {
    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Alias for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Process multiple files on worker threads. Without a value, one
    /// worker per available CPU.
    #[arg(
        long,
        global = true,
        value_name = "WORKERS",
        num_args = 0..=1,
        default_missing_value = "0"
    )]
    parallel: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// `--parallel` wins over `[execution]` in the project config.
    fn execution_mode(&self, configured: ExecutionMode) -> ExecutionMode {
        match self.parallel {
            None => configured,
            Some(0) => ExecutionMode::Parallel {
                workers: std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get),
            },
            Some(workers) => ExecutionMode::Parallel { workers },
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Graph",
        about = "Order the types of a catalog",
        long_about = "Build the state graph of a type catalog and print its types with \
                      owners before the types they reference. Cycles never fail unless \
                      --strict is given.",
        after_help = "EXAMPLES:\n    # Aggregate roots first\n    aggr toposort --catalog types.toml\n\n    # Referenced types first\n    aggr toposort --catalog types.toml --dependencies-first\n\n    # Refuse cycles between types\n    aggr toposort --catalog types.toml --strict --json"
    )]
    Toposort(cmd::toposort::ToposortArgs),

    #[command(
        next_help_heading = "Graph",
        about = "List cycles between types",
        after_help = "EXAMPLES:\n    aggr cycles --catalog types.toml"
    )]
    Cycles(cmd::cycles::CyclesArgs),

    #[command(
        next_help_heading = "Graph",
        about = "Export the state graph",
        after_help = "EXAMPLES:\n    # Graphviz\n    aggr graph --catalog types.toml --out types.dot\n    dot -Tpng types.dot -o types.png\n\n    # Plain edge list\n    aggr graph --catalog types.toml --out edges.txt --export edges"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        next_help_heading = "Documents",
        about = "Resolve packed documents",
        long_about = "Rebuild the record graph of each packed document, resolving every \
                      reference. Fails on dangling references.",
        after_help = "EXAMPLES:\n    aggr unpack order.json\n    aggr unpack --parallel 4 exports/*.json"
    )]
    Unpack(cmd::unpack::UnpackArgs),

    #[command(
        next_help_heading = "Documents",
        about = "Unpack and pack documents again",
        after_help = "EXAMPLES:\n    aggr repack order.json --base-id 1\n    aggr repack exports/*.json --out-dir renumbered/"
    )]
    Repack(cmd::repack::RepackArgs),

    #[command(
        next_help_heading = "Documents",
        about = "Generate a synthetic document or catalog",
        after_help = "EXAMPLES:\n    aggr gen --seed 7 --records 200 > sample.json\n    aggr gen --catalog --types 20 --acyclic > types.toml"
    )]
    Gen(cmd::gen_cmd::GenArgs),

    #[command(
        next_help_heading = "Ids",
        about = "Encode, decode and generate base-64 sequence ids",
        after_help = "EXAMPLES:\n    aggr id encode 0 63 64\n    aggr id decode 10\n    aggr id next --count 3 --prefix ord- --width 6"
    )]
    Id(cmd::id::IdArgs),

    #[command(
        next_help_heading = "Project Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    aggr completions bash\n    aggr completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("AGGREGRAPH_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "aggregraph=debug,info"
        } else {
            "aggregraph=info,warn"
        })
    });

    let format = env::var("AGGREGRAPH_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli) -> (OutputMode, anyhow::Result<()>) {
    let project_root = match env::current_dir() {
        Ok(dir) => dir,
        Err(e) => return (OutputMode::Text, Err(e.into())),
    };
    let effective = match resolve_config(&project_root, cli.json) {
        Ok(config) => config,
        Err(e) => {
            let fallback = resolve_output_mode(cli.format, cli.json, "text");
            return (fallback, Err(e));
        }
    };
    let output = resolve_output_mode(cli.format, cli.json, &effective.resolved_output);
    let project = &effective.project;
    let mode = cli.execution_mode(project.execution);
    tracing::debug!(?output, ?mode, "resolved settings");

    let result = match &cli.command {
        Commands::Toposort(args) => cmd::toposort::run_toposort(args, project.graph.strict, output),
        Commands::Cycles(args) => cmd::cycles::run_cycles(args, output),
        Commands::Graph(args) => cmd::graph::run_graph(args, output),
        Commands::Unpack(args) => cmd::unpack::run_unpack(args, &project.pack, mode, output),
        Commands::Repack(args) => cmd::repack::run_repack(args, &project.pack, mode, output),
        Commands::Gen(args) => cmd::gen_cmd::run_gen(args, &project.pack),
        Commands::Id(args) => cmd::id::run_id(args, &project.ids, output),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    };
    (output, result)
}

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let (output, result) = run(&cli);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::debug!(error = ?err, "command failed");
            if render_error(output, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}
