#![allow(clippy::uninlined_format_args)]

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashprobe::config::{ConfigOverrides, SuiteConfig};
use dashprobe::errors::{Result, SuiteError};
use dashprobe::runner::Runner;
use dashprobe::scenarios::ScenarioId;
use dashprobe::types::{OutputFormat, ViewportSize};
use dashprobe::webdriver::{BrowserType, WebDriverLauncher};
use dashprobe::webdriver_manager::GLOBAL_WEBDRIVER_MANAGER;

const EXIT_SUCCESS: i32 = 0;

#[derive(Parser)]
#[command(name = "dashprobe")]
#[command(about = "End-to-end checks for the analytics dashboard", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run scenarios against an environment
    Run {
        /// Scenarios to run (all when omitted)
        #[arg(short, long = "scenario", value_enum)]
        scenarios: Vec<ScenarioId>,

        /// Target environment: local, qa, staging or production
        #[arg(short, long, env = "TEST_ENV")]
        env: Option<String>,

        /// Browser to use
        #[arg(short, long)]
        browser: Option<BrowserType>,

        /// Maximum scenarios running at once
        #[arg(short, long)]
        workers: Option<usize>,

        /// Run one scenario at a time
        #[arg(long)]
        single_worker: bool,

        /// Extra attempts for a failing scenario
        #[arg(short, long)]
        retries: Option<u32>,

        /// Run browser in visible mode (disables headless)
        #[arg(long = "no-headless")]
        no_headless: bool,

        /// JSON file overriding selector defaults
        #[arg(long)]
        selectors: Option<PathBuf>,

        /// Directory for failure screenshots and the JSON report
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Browser viewport as WIDTHxHEIGHT
        #[arg(long, value_parser = ViewportSize::parse)]
        viewport: Option<ViewportSize>,

        /// Output format
        #[arg(short, long, default_value = "simple")]
        format: OutputFormat,

        /// Start the local application before running (local environment)
        #[arg(long)]
        start_server: bool,
    },

    /// List the scenario catalog
    List,

    /// Print the resolved environment (credentials redacted)
    Env {
        /// Target environment: local, qa, staging or production
        #[arg(short, long, env = "TEST_ENV")]
        env: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr so reports on stdout stay clean
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashprobe=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let result = run(Cli::parse()).await;

    // Always clean up WebDriver processes before exiting
    GLOBAL_WEBDRIVER_MANAGER.stop_all();

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            let error_json = json!({
                "error": true,
                "message": err.to_string(),
                "exit_code": err.exit_code()
            });
            println!(
                "{}",
                serde_json::to_string(&error_json).unwrap_or_else(|_| "{}".to_string())
            );
            eprintln!("Error: {}", err);
            std::process::exit(err.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            scenarios,
            env,
            browser,
            workers,
            single_worker,
            retries,
            no_headless,
            selectors,
            output_dir,
            viewport,
            format,
            start_server,
        } => {
            let overrides = ConfigOverrides {
                environment: env,
                browser,
                headless: no_headless.then_some(false),
                workers: if single_worker { Some(1) } else { workers },
                retries,
                selectors_file: selectors,
                output_dir,
                viewport,
                start_server,
            };
            let config = Arc::new(SuiteConfig::from_process_env(&overrides)?);

            let _server = if config.run.start_server {
                Some(start_local_server(&config).await?)
            } else {
                None
            };

            let scenarios = if scenarios.is_empty() {
                ScenarioId::ALL.to_vec()
            } else {
                scenarios
            };

            let launcher = Arc::new(WebDriverLauncher::from_config(&config));
            let report = Runner::new(config.clone(), launcher).run(&scenarios).await;

            match report.write_json(&config.run.output_dir).await {
                Ok(path) => info!("Report written to {}", path.display()),
                Err(e) => warn!("Could not write report: {}", e),
            }
            print!("{}", report.render(format)?);
            if format == OutputFormat::Json {
                println!();
            }
            Ok(report.exit_code())
        }

        Commands::List => {
            for scenario in ScenarioId::ALL {
                let id = serde_json::to_value(scenario)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                println!("{:<24} [{}] {}", id, scenario.suite(), scenario.title());
            }
            Ok(EXIT_SUCCESS)
        }

        Commands::Env { env } => {
            let overrides = ConfigOverrides {
                environment: env,
                ..ConfigOverrides::default()
            };
            let config = SuiteConfig::from_process_env(&overrides)?;
            let output = json!({
                "environment": config.environment,
                "credentials": {
                    "standard": config.credentials.standard.email,
                    "admin": config.credentials.admin.email,
                    "readonly": config.credentials.readonly.email,
                },
                "workers": config.run.workers,
                "retries": config.run.retries,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&output).map_err(|e| SuiteError::Other(e.into()))?
            );
            Ok(EXIT_SUCCESS)
        }
    }
}

/// Runs the local application until the returned handle is dropped
struct ServerGuard(tokio::task::JoinHandle<()>);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[cfg(feature = "local-server")]
async fn start_local_server(config: &SuiteConfig) -> Result<ServerGuard> {
    let url = url::Url::parse(&config.environment.base_url)
        .map_err(|e| SuiteError::config(format!("Invalid base URL: {}", e)))?;
    let port = url.port_or_known_default().unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([127, 0, 0, 1], port));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| SuiteError::config(format!("Cannot bind local server to {}: {}", addr, e)))?;
    let credentials = config.credentials.clone();
    let handle = tokio::spawn(async move {
        if let Err(e) = dashprobe::mock_app::serve_on(listener, &credentials).await {
            warn!("Local application stopped: {:#}", e);
        }
    });
    Ok(ServerGuard(handle))
}

#[cfg(not(feature = "local-server"))]
async fn start_local_server(_config: &SuiteConfig) -> Result<ServerGuard> {
    Err(SuiteError::config(
        "--start-server requires building with the `local-server` feature",
    ))
}
