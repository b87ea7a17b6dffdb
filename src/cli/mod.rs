//! CLI module for pyautodoc

mod args;

pub use args::{Args, Command};

use crate::analysis::{
    bind_method, get_class_from_method, get_dotted_path, get_type, import_object, AnalysisResult, Analyzer,
    CodeGraph, Entity,
};
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::error::{Error, Result};
use crate::output::{Generator, SourceLocated};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();
    init_logging(args.verbose);

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr; `RUST_LOG` wins over the verbosity flag
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn execute(args: Args) -> Result<()> {
    let verbose = args.verbose;

    match args.command {
        Command::Generate {
            config,
            output,
            source,
            keep_markers,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(output, source, keep_markers);

            if cfg.pages.is_empty() {
                return Err(Error::config_validation("no pages configured"));
            }

            let analysis = analyze(&cfg, verbose)?;
            let generator = Generator::new(&analysis.graph, &cfg)?.with_progress(verbose);
            let report = generator.generate()?;

            println!("{}", report.summary());
            println!("Documentation written to: {}", cfg.output.directory.display());
            Ok(())
        }

        Command::Resolve {
            name,
            config,
            source,
            bound,
        } => {
            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(None, source, false);
            let analysis = analyze(&cfg, verbose)?;

            let entity = if bound {
                let (class_path, method) = name
                    .rsplit_once('.')
                    .ok_or_else(|| Error::other(format!("'{}' has no method segment to bind", name)))?;
                bind_method(&analysis.graph, class_path, method)?
            } else {
                import_object(&analysis.graph, &name)?
            };

            print!("{}", describe_resolved(&analysis.graph, &entity)?);
            Ok(())
        }

        Command::Index { config, source, output } => {
            let mut cfg = load_config(config.as_deref())?;
            cfg.merge_cli(None, source, false);
            let analysis = analyze(&cfg, verbose)?;

            let json = serde_json::to_string_pretty(&analysis.graph)?;
            match output {
                Some(path) => {
                    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, json)?;
                    let stats = analysis.graph.stats();
                    println!(
                        "Index written to: {} ({} modules, {} classes, {} functions)",
                        path.display(),
                        stats.modules,
                        stats.classes,
                        stats.functions
                    );
                }
                None => println!("{}", json),
            }
            Ok(())
        }

        Command::Version => {
            println!("pyautodoc {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Explicit config file, or `autodoc.toml` in the working directory when present
fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE)),
    }
}

fn analyze(cfg: &Config, verbose: bool) -> Result<AnalysisResult> {
    let mut analyzer = Analyzer::new(cfg)?.with_verbose(verbose);
    let analysis = analyzer.analyze(&cfg.project.source)?;

    if !analysis.parse_errors.is_empty() {
        eprintln!("Parse errors ({}):", analysis.parse_errors.len());
        for (path, err) in analysis.parse_errors.iter().take(5) {
            eprintln!("  {}: {}", path.display(), err);
        }
        if analysis.parse_errors.len() > 5 {
            eprintln!("  ... and {} more", analysis.parse_errors.len() - 5);
        }
    }

    Ok(analysis)
}

/// Report for `resolve`: kind, defining path, declaring class and location
fn describe_resolved(graph: &CodeGraph, entity: &Entity) -> Result<String> {
    let kind = get_type(graph, entity)?;

    let mut out = format!("type:   {}\npath:   {}\n", kind, graph.dotted_name(entity));

    if let Some(class) = get_class_from_method(graph, entity)? {
        out.push_str(&format!("class:  {}\n", get_dotted_path(graph, class)));
    }

    let module = graph.module_id(entity.module_name(graph)).map(|id| graph.module(id));
    let file = module
        .and_then(|m| m.path.clone())
        .unwrap_or_else(|| PathBuf::from("<unknown>"));
    out.push_str(&format!("source: {}:{}\n", file.display(), entity.source_line(graph)));

    Ok(out)
}
