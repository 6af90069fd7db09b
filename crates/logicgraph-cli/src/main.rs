//! Logic circuit command-line tools.
//!
//! Provides the `logicgraph` binary for inspecting, simulating and exporting
//! circuits saved in the line format, managing a blueprint library and
//! moving circuits in and out of a SQLite store.
//!
//! Reads configuration from the environment:
//! - `LOGICGRAPH_LIBRARY`: blueprint library file (default: "blueprints.json")
//! - `RUST_LOG`: log filter (default: "info"); logs go to stderr

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::info;
use tracing_subscriber::EnvFilter;

use logicgraph_core::{BlueprintLibrary, BlueprintTemplate, CircuitGraph, CoreError, Position, Rect};
use logicgraph_sim::{RandomStimulus, SimConfig, SimError, SimState, Simulator};
use logicgraph_storage::{
    export_svg, load_from_path, read_library, save_to_path, write_circuit, write_library,
    CircuitId, CircuitStore, SqliteStore, StorageError, SvgOptions,
};

/// Logic circuit tools.
#[derive(Parser)]
#[command(name = "logicgraph", about = "Logic circuit tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a JSON summary of a circuit file.
    Info {
        file: PathBuf,
    },

    /// Run a circuit and print its final state as JSON.
    Simulate {
        file: PathBuf,

        /// Number of ticks to run. Without it the circuit runs until it
        /// settles or oscillates.
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Hard tick limit.
        #[arg(long, default_value_t = 10_000)]
        max_ticks: u64,

        /// Include the per-tick trace in the output.
        #[arg(long)]
        trace: bool,

        /// Flip random switches using this seed.
        #[arg(long)]
        seed: Option<u64>,

        /// Ticks between random flips.
        #[arg(long, default_value_t = 1)]
        period: u64,

        /// Drive a labelled switch before running, e.g. `--set a=1`.
        #[arg(long = "set", value_parser = parse_assignment)]
        inputs: Vec<(String, bool)>,

        /// Labelled nodes to report.
        #[arg(short, long)]
        probe: Vec<String>,
    },

    /// Export a circuit as SVG.
    ExportSvg {
        file: PathBuf,

        /// Output path (default: stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Manage the blueprint library.
    Blueprint {
        /// Blueprint library file.
        #[arg(long, env = "LOGICGRAPH_LIBRARY", default_value = "blueprints.json")]
        library: PathBuf,

        #[command(subcommand)]
        command: BlueprintCommand,
    },

    /// Move circuits in and out of a SQLite store.
    Store {
        /// Path to the database file.
        #[arg(short, long)]
        db: String,

        #[command(subcommand)]
        command: StoreCommand,
    },
}

#[derive(Subcommand)]
enum BlueprintCommand {
    /// Save part of a circuit as a named blueprint.
    Extract {
        file: PathBuf,

        #[arg(short, long)]
        name: String,

        /// Region to sample as `x,y,w,h` (default: the whole circuit).
        #[arg(long, value_parser = parse_rect)]
        rect: Option<Rect>,
    },

    /// List library and built-in blueprints.
    List,

    /// Insert a blueprint into a circuit file.
    Place {
        file: PathBuf,

        #[arg(short, long)]
        name: String,

        #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
        x: i32,

        #[arg(short, long, default_value_t = 0, allow_hyphen_values = true)]
        y: i32,

        /// Where to write the result (default: overwrite the input).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum StoreCommand {
    /// List stored circuits.
    List,

    /// Store a circuit file under a name.
    Import {
        file: PathBuf,

        #[arg(short, long)]
        name: String,
    },

    /// Write a stored circuit to a file (default: stdout).
    Export {
        #[arg(short, long)]
        id: i64,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Sim(#[from] SimError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("no blueprint named {0:?}")]
    UnknownBlueprint(String),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}

/// Executes a command and returns what should be printed to stdout.
fn run(cli: Cli) -> Result<String, CliError> {
    match cli.command {
        Commands::Info { file } => run_info(&file),
        Commands::Simulate {
            file,
            ticks,
            max_ticks,
            trace,
            seed,
            period,
            inputs,
            probe,
        } => {
            let config = SimConfig {
                trace_enabled: trace,
                max_ticks,
                ..SimConfig::default()
            };
            run_simulate(&file, config, ticks, seed.map(|s| (s, period)), &inputs, &probe)
        }
        Commands::ExportSvg { file, output } => {
            let svg = export_svg(&load_from_path(&file)?, &SvgOptions::default());
            write_or_return(svg, output.as_deref())
        }
        Commands::Blueprint { library, command } => run_blueprint(&library, command),
        Commands::Store { db, command } => run_store(&db, command),
    }
}

fn write_or_return(text: String, output: Option<&Path>) -> Result<String, CliError> {
    match output {
        Some(path) => {
            std::fs::write(path, text)?;
            info!(path = %path.display(), "wrote output");
            Ok(String::new())
        }
        None => Ok(text),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
}

// ---------------------------------------------------------------------------
// info / simulate
// ---------------------------------------------------------------------------

fn run_info(file: &Path) -> Result<String, CliError> {
    let graph = load_from_path(file)?;

    let mut kinds: BTreeMap<&str, usize> = BTreeMap::new();
    for node in graph.nodes() {
        *kinds.entry(node.kind().name()).or_default() += 1;
    }
    let names: Vec<&str> = graph.nodes().filter_map(|n| n.name()).collect();
    let loops = graph.feedback_loops();

    Ok(pretty(&json!({
        "nodes": graph.node_count(),
        "wires": graph.wire_count(),
        "groups": graph.groups().len(),
        "start_nodes": graph.start_nodes().count(),
        "kinds": kinds,
        "named": names,
        "feedback_loops": loops.len(),
    })))
}

fn run_simulate(
    file: &Path,
    config: SimConfig,
    ticks: Option<u64>,
    stimulus: Option<(u64, u64)>,
    inputs: &[(String, bool)],
    probes: &[String],
) -> Result<String, CliError> {
    let mut sim = Simulator::new(load_from_path(file)?, config);
    for (name, on) in inputs {
        sim.set_input(name, *on)?;
    }

    let state = match (stimulus, ticks) {
        (Some((seed, period)), ticks) => {
            let mut stimulus = RandomStimulus::new(seed, period);
            sim.run_with_stimulus(ticks.unwrap_or(sim.config().max_ticks), &mut stimulus)?;
            sim.state()
        }
        (None, Some(ticks)) => {
            sim.run(ticks)?;
            sim.state()
        }
        (None, None) => sim.run_until_settled()?,
    };
    info!(tick = sim.tick(), ?state, "simulation finished");

    let mut report = serde_json::Map::new();
    for name in probes {
        report.insert(name.clone(), Value::Bool(sim.probe(name)?));
    }

    let mut out = json!({
        "state": state_json(state),
        "tick": sim.tick(),
        "probes": report,
    });
    if sim.config().trace_enabled {
        out["trace"] = serde_json::to_value(sim.trace()).map_err(SimError::from)?;
    }
    Ok(pretty(&out))
}

fn state_json(state: SimState) -> Value {
    match state {
        SimState::Idle => json!({ "kind": "idle" }),
        SimState::Running => json!({ "kind": "running" }),
        SimState::Stable { tick } => json!({ "kind": "stable", "since": tick }),
        SimState::Oscillating { period } => json!({ "kind": "oscillating", "period": period }),
        SimState::TickLimit { ticks } => json!({ "kind": "tick_limit", "ticks": ticks }),
    }
}

// ---------------------------------------------------------------------------
// blueprint
// ---------------------------------------------------------------------------

fn run_blueprint(library_path: &Path, command: BlueprintCommand) -> Result<String, CliError> {
    match command {
        BlueprintCommand::Extract { file, name, rect } => {
            let graph = load_from_path(&file)?;
            let template = match rect {
                Some(rect) => BlueprintTemplate::from_rect(&graph, name, rect)?,
                None => BlueprintTemplate::build_from_nodes(&graph, name, graph.node_ids())?,
            };
            let summary = template_json(&template, "library");
            let mut library = read_library(library_path)?;
            library.insert(template);
            write_library(&library, library_path)?;
            Ok(pretty(&summary))
        }
        BlueprintCommand::List => {
            let library = read_library(library_path)?;
            let builtin = BlueprintLibrary::builtin()?;
            let entries: Vec<Value> = library
                .iter()
                .map(|t| template_json(t, "library"))
                .chain(
                    builtin
                        .iter()
                        .filter(|t| library.get(&t.name).is_none())
                        .map(|t| template_json(t, "builtin")),
                )
                .collect();
            Ok(pretty(&Value::Array(entries)))
        }
        BlueprintCommand::Place {
            file,
            name,
            x,
            y,
            output,
        } => {
            let library = read_library(library_path)?;
            let builtin = BlueprintLibrary::builtin()?;
            let template = library
                .get(&name)
                .or_else(|| builtin.get(&name))
                .ok_or_else(|| CliError::UnknownBlueprint(name.clone()))?;

            let mut graph = load_from_path(&file)?;
            let placed = template.instantiate(&mut graph, Position::new(x, y))?;
            save_to_path(&graph, output.as_deref().unwrap_or(&file))?;
            Ok(pretty(&json!({ "placed": placed.len(), "nodes": graph.node_count() })))
        }
    }
}

fn template_json(template: &BlueprintTemplate, source: &str) -> Value {
    json!({
        "name": template.name,
        "nodes": template.nodes.len(),
        "wires": template.wires.len(),
        "io": template.nodes.iter().filter(|n| n.is_io).count(),
        "source": source,
    })
}

// ---------------------------------------------------------------------------
// store
// ---------------------------------------------------------------------------

fn run_store(db: &str, command: StoreCommand) -> Result<String, CliError> {
    let mut store = SqliteStore::new(db)?;
    match command {
        StoreCommand::List => {
            let rows: Vec<Value> = store
                .list()?
                .into_iter()
                .map(|c| json!({ "id": c.id.0, "name": c.name, "checksum": c.checksum }))
                .collect();
            Ok(pretty(&Value::Array(rows)))
        }
        StoreCommand::Import { file, name } => {
            let graph: CircuitGraph = load_from_path(&file)?;
            let id = store.create(&name)?;
            store.save(id, &graph)?;
            Ok(pretty(&json!({ "id": id.0, "name": name })))
        }
        StoreCommand::Export { id, output } => {
            let graph = store.load(CircuitId(id))?;
            write_or_return(write_circuit(&graph), output.as_deref())
        }
    }
}

// ---------------------------------------------------------------------------
// argument parsers
// ---------------------------------------------------------------------------

fn parse_rect(s: &str) -> Result<Rect, String> {
    let parts: Vec<i32> = s
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid rect '{s}': {e}"))?;
    match parts[..] {
        [x, y, w, h] if w >= 0 && h >= 0 => Ok(Rect::new(x, y, w, h)),
        _ => Err(format!("invalid rect '{s}', expected x,y,w,h with non-negative size")),
    }
}

fn parse_assignment(s: &str) -> Result<(String, bool), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid input '{s}', expected name=0 or name=1"))?;
    let on = match value.trim() {
        "1" | "on" | "true" => true,
        "0" | "off" | "false" => false,
        other => return Err(format!("invalid input value '{other}'")),
    };
    Ok((name.trim().to_owned(), on))
}
