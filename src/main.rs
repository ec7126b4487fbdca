use clap::{Parser, Subcommand};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use localization_viewer::api::{handle, Action, MetricsFormatter, OutputFormat, ViewerState};
use localization_viewer::api::formatting::TextFormatter;
use localization_viewer::core::ObjectSelector;
use localization_viewer::processing::DatasetLoader;
use localization_viewer::render::build_map_for_root;
use localization_viewer::utils::{ConfigurationManager, ViewerConfig};
use localization_viewer::BearingTriangulator;

/// Observer/target localization map viewer
#[derive(Parser, Debug)]
#[command(name = "localization-viewer")]
#[command(version, about = "Triangulate targets from observer bearings and render them on a map")]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Object record to use as ground truth (`1`, `2`, ... or `auto`)
    #[arg(long, global = true)]
    object_id: Option<ObjectSelector>,

    /// Do not attach image/metadata popups to markers
    #[arg(long, global = true)]
    no_popups: bool,

    /// Popup image width in pixels
    #[arg(long, global = true)]
    popup_width: Option<u32>,

    /// Margin around all points when fitting the view, in meters
    #[arg(long, global = true)]
    margin: Option<f64>,

    /// Skip observations that carry no yaw or heading
    #[arg(long, global = true)]
    require_bearing: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the cases under a dataset root
    Cases {
        #[arg(long)]
        root: PathBuf,
    },

    /// Render cases to an HTML map
    Render {
        #[arg(long)]
        root: PathBuf,
        /// Case to draw; repeat for several. All cases when omitted.
        #[arg(long = "case")]
        cases: Vec<String>,
        /// Output HTML file (defaults to the configured map path)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Also write observers and objects as GeoJSON
        #[arg(long)]
        geojson: Option<PathBuf>,
    },

    /// Print per-case localization metrics
    Metrics {
        #[arg(long)]
        root: PathBuf,
        #[arg(long = "case")]
        cases: Vec<String>,
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Line-driven session: root, cases, case, generate, save, clear, quit
    Interactive {
        #[arg(long)]
        root: Option<PathBuf>,
    },

    /// Write the effective configuration, overrides included, as JSON
    Config {
        /// Target file (defaults to the file given with --config)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn load_config(cli: &Cli) -> Result<ConfigurationManager, Box<dyn std::error::Error>> {
    let mut manager = match &cli.config {
        Some(path) => ConfigurationManager::from_file(path)?,
        None => ConfigurationManager::new(),
    };
    if let Some(object_id) = &cli.object_id {
        manager.set_object_id(object_id.clone())?;
    }
    if cli.no_popups {
        manager.set_popups_enabled(false);
    }
    if let Some(width) = cli.popup_width {
        manager.set_popup_width(width)?;
    }
    if let Some(margin) = cli.margin {
        manager.set_bounds_margin(margin)?;
    }
    if cli.require_bearing {
        manager.set_require_bearing(true);
    }
    if cli.verbose {
        manager.set_debug_logging(true);
    }
    Ok(manager)
}

fn init_logging(debug: bool) {
    let level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("localization_viewer={}", level))),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let mut manager = load_config(&cli)?;
    let config = manager.get_config().clone();
    init_logging(config.debug_logging);

    for warning in ConfigurationManager::validate_config(&config).warnings {
        warn!("config: {}", warning);
    }

    let estimator = BearingTriangulator::new();

    match cli.command {
        Commands::Cases { root } => {
            for case in DatasetLoader::new(&root, &config).list_cases()? {
                println!("{}", case);
            }
        }

        Commands::Render { root, cases, out, geojson } => {
            let rendered = build_map_for_root(&root, &cases, &config, &estimator)?;
            let out = out.unwrap_or_else(|| config.output.map_path.clone());
            rendered.save_html(&out)?;
            println!("Map written to {}", out.display());
            if let Some(path) = geojson {
                rendered.save_geojson(&path)?;
                println!("GeoJSON written to {}", path.display());
            }
            print!("{}", TextFormatter::compact().format_text(&rendered.metrics));
        }

        Commands::Metrics { root, cases, format } => {
            let rendered = build_map_for_root(&root, &cases, &config, &estimator)?;
            let report = MetricsFormatter::new(format).format(&rendered.metrics)?;
            print!("{}", report);
            if !report.ends_with('\n') {
                println!();
            }
        }

        Commands::Interactive { root } => run_interactive(root, &config, &estimator)?,

        Commands::Config { out } => {
            info!(modified = manager.is_modified(), "saving configuration");
            match out {
                Some(path) => {
                    manager.save_to_file(&path)?;
                    println!("Configuration written to {}", path.display());
                }
                None => {
                    manager.save()?;
                    println!("Configuration saved");
                }
            }
        }
    }

    Ok(())
}

/// One line of interactive input
#[derive(Debug, PartialEq)]
enum Command {
    Act(Action),
    ListCases,
    Save(Option<PathBuf>),
    Help,
}

fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let argument = |name: &str| {
        if rest.is_empty() {
            Err(format!("usage: {} <{}>", word, name))
        } else {
            Ok(rest.to_string())
        }
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "root" => Command::Act(Action::SetRoot(PathBuf::from(argument("dir")?))),
        "case" => Command::Act(Action::SelectCase(argument("name")?)),
        "cases" => Command::ListCases,
        "generate" | "gen" => Command::Act(Action::Generate),
        "save" => Command::Save((!rest.is_empty()).then(|| PathBuf::from(rest))),
        "clear" => Command::Act(Action::Clear),
        "quit" | "exit" => Command::Act(Action::Quit),
        "help" | "?" => Command::Help,
        other => return Err(format!("unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

const HELP: &str = "\
commands:
  root <dir>     set the dataset root
  cases          list cases under the root
  case <name>    select a case
  generate       run localization and build the map
  save [file]    write the current map as HTML
  clear          discard the current map
  quit           leave";

fn run_interactive(
    root: Option<PathBuf>,
    config: &ViewerConfig,
    estimator: &BearingTriangulator,
) -> io::Result<()> {
    let mut state = ViewerState::new();
    if let Some(root) = root {
        match handle(&mut state, Action::SetRoot(root), config, estimator) {
            Ok(outcome) => println!("{}", outcome),
            Err(e) => eprintln!("error: {}", e),
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut lines = stdin.lock().lines();
    while !state.quit_requested {
        print!("> ");
        stdout.flush()?;
        let Some(line) = lines.next() else {
            break;
        };

        let command = match parse_command(&line?) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("{}", message);
                continue;
            }
        };

        match command {
            Command::Act(action) => match handle(&mut state, action, config, estimator) {
                Ok(outcome) => println!("{}", outcome),
                Err(e) => eprintln!("error: {}", e),
            },
            Command::ListCases => {
                if state.cases.is_empty() {
                    println!("<none found>");
                }
                for case in &state.cases {
                    let marker = if state.selected_case.as_deref() == Some(case.as_str()) { "*" } else { " " };
                    println!("{} {}", marker, case);
                }
            }
            Command::Save(path) => match &state.map {
                Some(map) => {
                    let path = path.unwrap_or_else(|| config.output.map_path.clone());
                    match map.save_html(&path) {
                        Ok(()) => println!("Map written to {}", path.display()),
                        Err(e) => eprintln!("error: {}", e),
                    }
                }
                None => eprintln!("no map yet, run 'generate' first"),
            },
            Command::Help => println!("{}", HELP),
        }
    }

    info!("session ended");
    Ok(())
}
