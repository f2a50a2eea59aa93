//! Command-line front end for the TRF6 lookup
//!
//! Runs one query through the service layer and prints the result as JSON.

use anyhow::Context;
use clap::{Parser, ValueEnum};
use pje_consulta::{
    ChromeLauncher, LaunchOptions, NavigationWait, QueryService, ScrapeConfig, Scraper, ServiceConfig, service,
};
use std::time::Duration;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Kind {
    Cpf,
    Cnpj,
}

impl Kind {
    fn as_str(self) -> &'static str {
        match self {
            Kind::Cpf => "cpf",
            Kind::Cnpj => "cnpj",
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Wait {
    /// Continue once the DOM is parsed
    Dom,
    /// Wait for the load event and let requests settle
    NetworkIdle,
}

#[derive(Parser)]
#[command(name = "pje-consulta")]
#[command(version)]
#[command(about = "Look up PJe TRF6 processes by CPF or CNPJ", long_about = None)]
struct Cli {
    /// CPF or CNPJ, punctuation allowed
    #[arg(required_unless_present = "health")]
    document: Option<String>,

    /// Document type
    #[arg(long, short = 'k', value_enum, default_value = "cpf")]
    kind: Kind,

    /// Print the capability descriptor and exit
    #[arg(long)]
    health: bool,

    /// Launch browser in headed mode (default: headless)
    #[arg(long, short = 'H')]
    headed: bool,

    /// Path to custom browser executable
    #[arg(long, value_name = "PATH")]
    executable_path: Option<String>,

    /// Persistent browser profile directory
    #[arg(long, value_name = "DIR")]
    user_data_dir: Option<String>,

    /// Enable the Chrome sandbox
    #[arg(long)]
    sandbox: bool,

    /// Navigation wait strategy
    #[arg(long, value_enum, default_value = "dom")]
    wait: Wait,

    /// Seconds to poll for results after submitting
    #[arg(long, default_value = "10")]
    results_timeout: u64,

    /// Overall budget for the query in seconds
    #[arg(long, short = 't', default_value = "180")]
    timeout: u64,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn print_json<T: serde::Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty { serde_json::to_string_pretty(value)? } else { serde_json::to_string(value)? };
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    if cli.health {
        return print_json(&service::health(), cli.pretty);
    }

    let mut options = LaunchOptions::new().headless(!cli.headed).sandbox(cli.sandbox);
    if let Some(path) = &cli.executable_path {
        options = options.chrome_path(path);
    }
    if let Some(dir) = &cli.user_data_dir {
        options = options.user_data_dir(dir);
    }

    let navigation_wait = match cli.wait {
        Wait::Dom => NavigationWait::DomContentLoaded,
        Wait::NetworkIdle => NavigationWait::NetworkIdle,
    };
    let scrape_config = ScrapeConfig::new()
        .navigation_wait(navigation_wait)
        .results_timeout(Duration::from_secs(cli.results_timeout));

    let service_config = ServiceConfig {
        query_timeout: Duration::from_secs(cli.timeout),
        ..Default::default()
    };

    log::info!(
        "Browser mode: {}, navigation wait: {:?}",
        if options.headless { "headless" } else { "headed" },
        navigation_wait
    );

    let launcher = ChromeLauncher::new(options, scrape_config.clone());
    let service = QueryService::new(Scraper::new(launcher, scrape_config), &service_config);

    let document = cli.document.as_deref().context("document is required")?;
    let result = service
        .consult(document, cli.kind.as_str())
        .await
        .with_context(|| format!("Lookup for {} failed", document))?;

    print_json(&result, cli.pretty)
}
