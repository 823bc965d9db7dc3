//! Command-line interface for the ELAN to GrAF converter
//! Reads a serialized ELAN record stream and writes one GrAF file per tier plus a metafile.
//!
//! Usage:
//!   elan2graf `<input>` [-o `<base>`] [-f `<format>`] [-c `<config>`]   - Convert a record stream
//!   elan2graf --list-formats                                     - List the output formats

use clap::{Arg, ArgAction, ArgMatches, Command};
use graf_babel::formats::GrafXmlFormat;
use graf_babel::{plan_outputs, write_outputs, FormatRegistry};
use graf_config::{GrafConfig, Loader};
use graf_core::graf::builder::AnchorPolicy;
use graf_core::graf::loader::StreamLoader;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() {
    let matches = Command::new("elan2graf")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Convert ELAN record streams (JSON or YAML) into GrAF annotation files")
        .arg_required_else_help(true)
        .arg(
            Arg::new("input")
                .help("Path to the record stream (.json, .yaml or .yml)")
                .required_unless_present("list-formats")
                .index(1),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Base path of the written files (default: input path without extension)"),
        )
        .arg(
            Arg::new("format")
                .long("format")
                .short('f')
                .help("Output format (default from config: graf-xml)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML file layered over the built-in defaults"),
        )
        .arg(
            Arg::new("abort-on-unresolved")
                .long("abort-on-unresolved")
                .help("Fail instead of skipping annotations whose time slots have no value")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log every dispatched record to stderr")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("list-formats")
                .long("list-formats")
                .help("List available output formats")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    init_logging(matches.get_flag("verbose"));

    let config = load_config(&matches).unwrap_or_else(|e| {
        eprintln!("Error: failed to load configuration: {}", e);
        std::process::exit(1);
    });

    let mut registry = FormatRegistry::with_defaults();
    registry.register(GrafXmlFormat::with_indent(config.output.indent.as_str()));

    if matches.get_flag("list-formats") {
        handle_list_formats_command(&registry);
        return;
    }

    let input = matches
        .get_one::<String>("input")
        .expect("input is required unless listing formats");
    let base = matches
        .get_one::<String>("output")
        .map(PathBuf::from)
        .unwrap_or_else(|| Path::new(input).with_extension(""));
    handle_convert_command(Path::new(input), &base, &config, &registry);
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(matches: &ArgMatches) -> Result<GrafConfig, graf_config::ConfigError> {
    let mut loader = Loader::new();
    if let Some(path) = matches.get_one::<String>("config") {
        loader = loader.with_file(path);
    }
    if let Some(format) = matches.get_one::<String>("format") {
        loader = loader.set_override("output.format", format.as_str())?;
    }
    let mut config = loader.build()?;
    if matches.get_flag("abort-on-unresolved") {
        config.conversion.unresolved_anchor = AnchorPolicy::Abort;
    }
    Ok(config)
}

/// Handle the convert command
fn handle_convert_command(input: &Path, base: &Path, config: &GrafConfig, registry: &FormatRegistry) {
    let format = registry.get(&config.output.format).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        eprintln!("\nAvailable formats: {}", registry.list_formats().join(", "));
        std::process::exit(1);
    });

    let conversion = StreamLoader::from_path(input)
        .and_then(|loader| loader.convert(config.conversion.clone()))
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    for diagnostic in &conversion.diagnostics {
        eprintln!("{}", diagnostic);
    }

    let outputs = plan_outputs(&conversion, base, format)
        .and_then(|outputs| write_outputs(&outputs).map(|_| outputs))
        .unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });

    info!(files = outputs.len(), format = format.name(), "outputs written");
    for output in &outputs {
        println!("{}", output.path.display());
    }
}

/// Handle the list-formats command
fn handle_list_formats_command(registry: &FormatRegistry) {
    println!("Available output formats:\n");
    for (name, description) in registry.describe() {
        println!("  {}", name);
        println!("    {}", description);
        println!();
    }
}
