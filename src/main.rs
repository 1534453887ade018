//! callmap CLI - static PHP call-graph mapper
//!
//! Usage: callmap <sequence|components> [arguments]

mod cli;
mod components_cmd;
mod sequence_cmd;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use callmap::graph::{scan_with_progress, ScanConfig, ScanError, ScanOutcome};
use callmap::output::{
    generate_execution_id, output_json, ErrorResponse, JsonResponse, ScanSummary,
};
use callmap::{Config, ConfigError};

use cli::{Cli, Command, GlobalArgs, OutputArg, ScanArgs};

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "callmap=warn",
        1 => "callmap=info",
        _ => "callmap=debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(global: &GlobalArgs) -> Result<Config> {
    match &global.config {
        Some(path) => Ok(Config::load(path)?),
        None => {
            let cwd = std::env::current_dir().context("cannot determine working directory")?;
            Ok(Config::discover(&cwd)?)
        }
    }
}

/// CLI flags win over config file values.
fn resolve_scan_config(args: &ScanArgs, global: &GlobalArgs, config: &Config) -> Result<ScanConfig> {
    let roots: Vec<PathBuf> = if args.src.is_empty() {
        config.src.clone()
    } else {
        args.src.clone()
    };
    if roots.is_empty() {
        anyhow::bail!("no source roots: pass --src <DIR> or set `src` in callmap.toml");
    }
    let exclude = if args.exclude.is_empty() {
        config.exclude.clone()
    } else {
        args.exclude.clone()
    };

    let mut scan_config = ScanConfig::new(roots)
        .with_exclude(exclude)
        .with_jobs(global.jobs.or(config.jobs));
    scan_config.use_cache = !args.no_cache && config.cache.unwrap_or(true);
    Ok(scan_config)
}

/// Scan with progress logged at every tenth of the file list.
pub(crate) fn run_scan(config: &ScanConfig) -> Result<ScanOutcome> {
    let progress = |done: usize, total: usize| {
        let step = (total / 10).max(1);
        if done % step == 0 || done == total {
            tracing::info!(done, total, "scan progress");
        }
    };
    scan_with_progress(config, Some(&progress)).context("scan failed")
}

pub(crate) fn scan_summary(outcome: &ScanOutcome) -> ScanSummary {
    ScanSummary {
        files_scanned: outcome.files_scanned,
        classes: outcome.graph.class_count(),
        methods: outcome.graph.method_count(),
        edges: outcome.graph.edge_count(),
        diagnostics: outcome.diagnostics.clone(),
    }
}

/// Write rendered output to `out`, or stdout when no file is given.
pub(crate) fn emit(rendered: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(rendered.as_bytes())?;
            if !rendered.ends_with('\n') {
                writeln!(stdout)?;
            }
        }
    }
    Ok(())
}

/// Errors are reported as JSON on stdout when the command asked for JSON.
fn wants_json(cli: &Cli) -> bool {
    let output = match &cli.command {
        Some(Command::Sequence(args)) => args.sink.output,
        Some(Command::Components(args)) => args.sink.output,
        None => return false,
    };
    output == OutputArg::Json
}

fn error_kind(err: &anyhow::Error) -> &'static str {
    if err.chain().any(|cause| cause.is::<ScanError>()) {
        "scan_failed"
    } else if err.chain().any(|cause| cause.is::<ConfigError>()) {
        "invalid_config"
    } else {
        "error"
    }
}

fn report_error(err: &anyhow::Error, json: bool) {
    if json {
        let response = JsonResponse::new(
            ErrorResponse {
                error: error_kind(err).to_string(),
                message: format!("{:#}", err),
            },
            &generate_execution_id(),
        );
        if output_json(&response).is_ok() {
            return;
        }
    }
    eprintln!("Error: {:#}", err);
}

fn run(cli: Cli) -> Result<bool> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(false);
    };
    let config = load_config(&cli.global)?;

    match command {
        Command::Sequence(args) => {
            let scan_config = resolve_scan_config(&args.scan, &cli.global, &config)?;
            sequence_cmd::run_sequence(args, scan_config, &config)
        }
        Command::Components(args) => {
            let scan_config = resolve_scan_config(&args.scan, &cli.global, &config)?;
            components_cmd::run_components(args, scan_config, &config)
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("{}", callmap::version());
        return ExitCode::SUCCESS;
    }

    init_tracing(cli.global.verbose);
    let json = wants_json(&cli);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            report_error(&err, json);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let config = Config {
            src: vec![PathBuf::from("/from/config")],
            exclude: vec!["*/vendor/*".to_string()],
            jobs: Some(8),
            cache: Some(false),
            ..Default::default()
        };
        let global = GlobalArgs {
            jobs: Some(2),
            ..Default::default()
        };

        let from_config = resolve_scan_config(&ScanArgs::default(), &global, &config).unwrap();
        assert_eq!(from_config.roots, vec![PathBuf::from("/from/config")]);
        assert_eq!(from_config.exclude, vec!["*/vendor/*".to_string()]);
        assert_eq!(from_config.jobs, Some(2));
        assert!(!from_config.use_cache);

        let args = ScanArgs {
            src: vec![PathBuf::from("/from/flag")],
            ..Default::default()
        };
        let from_flags = resolve_scan_config(&args, &GlobalArgs::default(), &config).unwrap();
        assert_eq!(from_flags.roots, vec![PathBuf::from("/from/flag")]);
        assert_eq!(from_flags.jobs, Some(8));
    }

    #[test]
    fn test_missing_roots_is_an_error() {
        let err = resolve_scan_config(&ScanArgs::default(), &GlobalArgs::default(), &Config::default())
            .unwrap_err();
        assert!(err.to_string().contains("no source roots"));
    }
}
