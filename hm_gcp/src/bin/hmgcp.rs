#![deny(clippy::expect_used)]
//! Analyze a program and print its type and value.
//!
//! Usage:
//!   hmgcp program.hm
//!   hmgcp -e 'id = {x -> x}; (pair (id 1) (id "s"))' --nodes
//!   hmgcp --config analysis.toml --seed 3 --no-gcp program.hm

use std::env;
use std::fs;

use hm_gcp::{Analysis, AnalysisConfig, AnalysisError};
use log::{Level, LevelFilter, Log, Metadata, Record};

/// Writes log records to stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let tag = match record.level() {
                Level::Error => "error",
                Level::Warn => "warn",
                Level::Info => "info",
                Level::Debug => "debug",
                Level::Trace => "trace",
            };
            eprintln!("[{}] {}", tag, record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

#[derive(Debug, Default)]
struct Options {
    source: Option<String>,
    file: Option<String>,
    config: Option<String>,
    seed: Option<u64>,
    no_hm: bool,
    no_gcp: bool,
    nodes: bool,
    sigs: bool,
    json: bool,
    verbosity: usize,
}

fn usage() -> ! {
    eprintln!("Usage: hmgcp [options] <file | -e program>");
    eprintln!("  -e <program>       analyze program text");
    eprintln!("  --config <file>    load analysis settings from TOML");
    eprintln!("  --seed <n>         worklist draw rotation");
    eprintln!("  --no-hm            skip unification");
    eprintln!("  --no-gcp           skip constant propagation");
    eprintln!("  --nodes            print every node's type and value");
    eprintln!("  --sigs             print escaped function signatures");
    eprintln!("  --json             print the full result as JSON");
    eprintln!("  -v, -vv            log progress to stderr");
    std::process::exit(1);
}

fn parse_args(args: &[String]) -> Options {
    let mut opts = Options::default();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-e" => {
                i += 1;
                opts.source = Some(args.get(i).cloned().unwrap_or_else(|| usage()));
            }
            "--config" => {
                i += 1;
                opts.config = Some(args.get(i).cloned().unwrap_or_else(|| usage()));
            }
            "--seed" => {
                i += 1;
                let seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| usage());
                opts.seed = Some(seed);
            }
            "--no-hm" => opts.no_hm = true,
            "--no-gcp" => opts.no_gcp = true,
            "--nodes" => opts.nodes = true,
            "--sigs" => opts.sigs = true,
            "--json" => opts.json = true,
            "-v" => opts.verbosity = opts.verbosity.max(1),
            "-vv" => opts.verbosity = 2,
            "-h" | "--help" => usage(),
            arg if !arg.starts_with('-') => opts.file = Some(arg.to_string()),
            other => {
                eprintln!("Unknown argument: {}", other);
                usage();
            }
        }
        i += 1;
    }
    opts
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let opts = parse_args(&args);

    if opts.verbosity > 0 && log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if opts.verbosity > 1 {
            LevelFilter::Trace
        } else {
            LevelFilter::Debug
        });
    }

    let source = match (&opts.source, &opts.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Error: failed to read '{}': {}", path, e);
            std::process::exit(1);
        }),
        (None, None) => usage(),
    };

    let mut config = match &opts.config {
        Some(path) => AnalysisConfig::from_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => AnalysisConfig::default(),
    };
    if let Some(seed) = opts.seed {
        config.seed = seed;
    }
    if opts.no_hm {
        config.do_hm = false;
    }
    if opts.no_gcp {
        config.do_gcp = false;
    }

    if let Err(e) = run(&source, config, &opts) {
        eprintln!("{}", e.format_with_context(&source));
        std::process::exit(1);
    }
}

fn run(source: &str, config: AnalysisConfig, opts: &Options) -> Result<(), AnalysisError> {
    let expr = hm_gcp_parser::parse(source)?;
    let mut analysis = Analysis::from_expr(&expr, config)?;
    analysis.run()?;
    let result = analysis.result();

    if opts.json {
        match serde_json::to_string_pretty(&result) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Error: JSON serialization failed: {}", e),
        }
        return Ok(());
    }

    println!("type:  {}", result.program_type);
    println!("value: {}", result.program_value);
    if opts.nodes {
        println!();
        for node in &result.nodes {
            println!(
                "{:>4} {:<8} {:<16} {:>3}:{:<3} {} | {}",
                node.id, node.kind, node.label, node.span.line, node.span.column, node.ty, node.value
            );
        }
    }
    if opts.sigs {
        println!();
        for sig in &result.escaped {
            println!("{}", sig);
        }
    }
    for diag in &result.diagnostics {
        eprintln!("note: {}", diag);
    }
    Ok(())
}
