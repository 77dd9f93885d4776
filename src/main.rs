use applinkcheck::analysis::applinks::EmptySchemePolicy;
use applinkcheck::analysis::{CheckOptions, ManifestChecker};
use applinkcheck::config::Config;
use applinkcheck::discovery::FileFinder;
use applinkcheck::parser::xml::ManifestParser;
use applinkcheck::report::{self, FileReport, Reporter, Summary};
use clap::Parser;
use colored::Colorize;
use miette::Result;
use rayon::prelude::*;
use std::path::PathBuf;
use tracing::{debug, error, info};

/// applinkcheck - Validate intent filters and App Links in Android manifests
#[derive(Parser, Debug)]
#[command(name = "applinkcheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Project directory or manifest file to check
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Target directories to scan (can be specified multiple times)
    #[arg(short, long)]
    target: Vec<PathBuf>,

    /// Patterns to exclude (can be specified multiple times)
    #[arg(short, long)]
    exclude: Vec<String>,

    /// Output format [default: terminal, or report.format from the config]
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Output file (for json/sarif formats)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Issue id to suppress, e.g. AppLinkWarning (can be specified multiple times)
    #[arg(long, value_name = "ID")]
    disable: Vec<String>,

    /// Manifest placeholder value (can be specified multiple times)
    #[arg(long, value_name = "KEY=VALUE", value_parser = parse_placeholder)]
    placeholder: Vec<(String, String)>,

    /// How filters without a scheme take part in test URL matching
    #[arg(long, value_enum)]
    empty_scheme: Option<EmptySchemeArg>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode - only output results
    #[arg(short, long)]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum OutputFormat {
    Terminal,
    Json,
    Sarif,
}

impl OutputFormat {
    fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Terminal => "terminal",
            OutputFormat::Json => "json",
            OutputFormat::Sarif => "sarif",
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum EmptySchemeArg {
    Reject,
    MatchAny,
}

impl From<EmptySchemeArg> for EmptySchemePolicy {
    fn from(arg: EmptySchemeArg) -> Self {
        match arg {
            EmptySchemeArg::Reject => EmptySchemePolicy::Reject,
            EmptySchemeArg::MatchAny => EmptySchemePolicy::MatchAny,
        }
    }
}

fn parse_placeholder(s: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty placeholder name in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    info!("applinkcheck v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    let outcome = run(&config, &cli)?;

    if outcome.failed > 0 {
        std::process::exit(2);
    }
    if outcome.errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else {
        let root = if cli.path.is_file() {
            cli.path.parent().map(PathBuf::from).unwrap_or_default()
        } else {
            cli.path.clone()
        };
        Config::from_default_locations(&root)?
    };

    // Override with CLI arguments
    if !cli.target.is_empty() {
        config.targets = cli.target.clone();
    }
    if !cli.exclude.is_empty() {
        config.exclude.extend(cli.exclude.clone());
    }
    config.checks.disabled.extend(cli.disable.iter().cloned());
    for (key, value) in &cli.placeholder {
        config.manifest.placeholders.insert(key.clone(), value.clone());
    }
    if let Some(policy) = cli.empty_scheme {
        config.matching.empty_scheme = policy.into();
    }
    if let Some(format) = cli.format {
        config.report.format = format.as_str().to_string();
    }

    Ok(config)
}

struct Outcome {
    errors: usize,
    failed: usize,
}

fn run(config: &Config, cli: &Cli) -> Result<Outcome> {
    let format: report::ReportFormat = config.report.format.parse()?;

    info!("Discovering manifests...");
    let finder = FileFinder::new(config);
    let manifests = finder.find_manifests(&cli.path)?;
    info!("Found {} manifests to check", manifests.len());

    if manifests.is_empty() && format == report::ReportFormat::Terminal {
        println!("{}", "No AndroidManifest.xml files found.".yellow());
        return Ok(Outcome {
            errors: 0,
            failed: 0,
        });
    }

    let checker = ManifestChecker::new(CheckOptions::from_config(config));
    let parser = ManifestParser::new();

    let results: Vec<Result<FileReport>> = manifests
        .par_iter()
        .map(|path| {
            let manifest = parser.parse_file(path)?;
            let diagnostics = checker.check(&manifest);
            debug!("{}: {} issues", path.display(), diagnostics.len());
            Ok(FileReport::from_manifest(manifest, diagnostics))
        })
        .collect();

    let mut reports = Vec::with_capacity(results.len());
    let mut failed = 0;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                failed += 1;
                error!("Skipping manifest: {:?}", e);
            }
        }
    }

    let reporter = Reporter::new(format, cli.output.clone()).with_source(config.report.show_source);
    reporter.report(&reports)?;

    let summary = Summary::from_files(&reports);
    Ok(Outcome {
        errors: summary.errors,
        failed,
    })
}
