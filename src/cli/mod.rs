//! CLI argument parsing and command dispatch

mod run;
mod summary;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use http_flood_core::{SimulationSpec, WorkPlan};

#[derive(Parser, Debug)]
#[command(name = "http-flood")]
#[command(author, version, about = "HTTP flood traffic simulator", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a flood simulation
    Run(RunArgs),
    /// Validate a simulation file
    Validate {
        /// Path to a JSON simulation file
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Target URL (http or https)
    #[arg(short, long)]
    pub url: Option<String>,

    /// HTTP method
    #[arg(short = 'X', long)]
    pub method: Option<String>,

    /// Request body, ignored for GET and HEAD
    #[arg(short, long)]
    pub payload: Option<String>,

    /// Extra header as "Name: value", repeatable
    #[arg(short = 'H', long = "header", value_name = "NAME: VALUE")]
    pub headers: Vec<String>,

    /// Total requests, 0 runs until interrupted
    #[arg(short, long)]
    pub sample: Option<usize>,

    /// Milliseconds between two dispatches of a worker
    #[arg(short, long)]
    pub delay: Option<u64>,

    /// Number of workers
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Do not add a random Referer header
    #[arg(long)]
    pub no_auto_referer: bool,

    /// Do not add a random User-Agent header
    #[arg(long)]
    pub no_auto_user_agent: bool,

    /// Do not add a Keep-Alive header
    #[arg(long)]
    pub no_auto_keep_alive: bool,

    /// JSON simulation file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Abort after this many seconds
    #[arg(long, value_name = "SECS")]
    pub max_duration: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Build the simulation spec from the config file and flags
    pub fn to_spec(&self) -> Result<SimulationSpec> {
        let mut spec = match &self.config {
            Some(path) => load_spec(path)?,
            None => SimulationSpec::new(String::new(), String::new()),
        };

        if let Some(url) = &self.url {
            spec.url = url.clone();
        }
        if let Some(method) = &self.method {
            spec.method = method.clone();
        }
        if let Some(payload) = &self.payload {
            spec.payload = Some(payload.clone());
        }
        for header in &self.headers {
            let (name, value) = parse_header(header)?;
            spec.headers.insert(name, value);
        }
        if let Some(sample) = self.sample {
            spec.sample = sample;
        }
        if let Some(delay) = self.delay {
            spec.delay = delay;
        }
        if let Some(threads) = self.threads {
            spec.threads = threads;
        }
        if self.no_auto_referer {
            spec.auto_referer = false;
        }
        if self.no_auto_user_agent {
            spec.auto_user_agent = false;
        }
        if self.no_auto_keep_alive {
            spec.auto_keep_alive = false;
        }

        spec.validate().context("invalid simulation")?;
        Ok(spec)
    }
}

impl Cli {
    /// Execute the selected command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Run(args) => run::run(args).await,
            Commands::Validate { config } => validate(&config),
        }
    }
}

fn load_spec(path: &Path) -> Result<SimulationSpec> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    SimulationSpec::from_json(&raw).with_context(|| format!("failed to parse {}", path.display()))
}

fn parse_header(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("header {raw:?} is not in \"Name: value\" form");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header {raw:?} has an empty name");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn validate(path: &Path) -> Result<()> {
    let spec = load_spec(path)?;
    spec.validate()
        .with_context(|| format!("{} is not a valid simulation", path.display()))?;

    let plan = WorkPlan::for_spec(&spec);
    println!("✓ {} is valid", path.display());
    println!("  Target:   {} {}", spec.http_method()?, spec.url);
    match plan.total() {
        Some(total) => println!("  Requests: {total}"),
        None => println!("  Requests: unbounded"),
    }
    println!("  Workers:  {}", plan.worker_count());
    println!("  Delay:    {} ms", spec.dispatch_delay().as_millis());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flags() {
        let cli = Cli::try_parse_from([
            "http-flood",
            "run",
            "--url",
            "http://localhost:8080/",
            "-X",
            "post",
            "--payload",
            "a=1",
            "-H",
            "X-One: 1",
            "-H",
            "X-Two:2",
            "--sample",
            "10",
            "--delay",
            "5",
            "--threads",
            "3",
            "--no-auto-referer",
            "--json",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.json);

        let spec = args.to_spec().unwrap();
        assert_eq!(spec.url, "http://localhost:8080/");
        assert_eq!(spec.http_method().unwrap(), "POST");
        assert_eq!(spec.payload.as_deref(), Some("a=1"));
        assert_eq!(spec.headers.get("X-One").map(String::as_str), Some("1"));
        assert_eq!(spec.headers.get("X-Two").map(String::as_str), Some("2"));
        assert_eq!(spec.sample, 10);
        assert_eq!(spec.delay, 5);
        assert_eq!(spec.threads, 3);
        assert!(!spec.auto_referer);
        assert!(spec.auto_user_agent);
        assert!(spec.auto_keep_alive);
    }

    #[test]
    fn test_validate_subcommand() {
        let cli =
            Cli::try_parse_from(["http-flood", "-v", "validate", "--config", "spec.json"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Validate { .. }));
    }

    #[test]
    fn test_missing_url_is_rejected() {
        let cli = Cli::try_parse_from(["http-flood", "run", "-X", "GET"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.to_spec().is_err());
    }

    #[test]
    fn test_flags_override_config_file() {
        let path = std::env::temp_dir().join(format!("http-flood-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"{"url": "http://file.example/", "method": "GET", "sample": 4, "threads": 1}"#,
        )
        .unwrap();

        let args = RunArgs {
            config: Some(path.clone()),
            sample: Some(9),
            no_auto_keep_alive: true,
            ..Default::default()
        };
        let spec = args.to_spec().unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(spec.url, "http://file.example/");
        assert_eq!(spec.sample, 9);
        assert_eq!(spec.threads, 1);
        assert!(!spec.auto_keep_alive);
    }

    #[test]
    fn test_parse_header() {
        assert_eq!(
            parse_header("Authorization: Bearer a:b").unwrap(),
            ("Authorization".to_string(), "Bearer a:b".to_string())
        );
        assert!(parse_header("no-colon").is_err());
        assert!(parse_header(": value").is_err());
    }
}
