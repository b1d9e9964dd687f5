//! Gatehouse CLI
//!
//! Operational companion for the gatehouse crate: classify URLs against the
//! portal catalog, inspect the effective configuration, scaffold a config
//! file, and check credential availability. Useful when adjusting a
//! deployment without driving a browser.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gatehouse::{
    classify, CredentialSource, FileCredentialSource, NavigationState, PortalConfig, Selector,
};

#[derive(Parser)]
#[command(name = "gatehouse")]
#[command(about = "Portal navigation toolkit: classify URLs, inspect config and credentials")]
struct Cli {
    /// Configuration file; built-in defaults apply when absent.
    #[arg(long, short = 'C', global = true, env = "GATEHOUSE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a URL against the configured portal catalog.
    Classify { url: String },
    /// Parse a selector expression and print its structured form.
    Selector { expression: String },
    /// Configuration inspection and scaffolding.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Check whether an automated-login credential is available.
    Credential,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as YAML.
    Show,
    /// Write a default configuration file to the given path.
    Init { path: PathBuf },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Classify { url } => classify_url(&url, &config),
        Commands::Selector { expression } => parse_selector(&expression),
        Commands::Config { command } => match command {
            ConfigCommands::Show => show_config(&config),
            ConfigCommands::Init { path } => init_config(&path),
        },
        Commands::Credential => check_credential(&config),
    }
}

fn load_config(path: Option<&Path>) -> Result<PortalConfig> {
    match path {
        Some(path) => PortalConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display())),
        None => Ok(PortalConfig::default()),
    }
}

fn classify_url(url: &str, config: &PortalConfig) -> Result<()> {
    match classify(url, &config.catalog) {
        NavigationState::LoginRequired => println!("login-required"),
        NavigationState::PortalHome => println!("portal-home"),
        NavigationState::OnService(id) => {
            let profile = config.catalog.service(id);
            println!("on-service: {id} ({})", profile.display_name);
        }
        NavigationState::Unknown => println!("unknown"),
    }
    Ok(())
}

fn parse_selector(expression: &str) -> Result<()> {
    let selector = Selector::from(expression);
    if let Selector::Invalid(reason) = &selector {
        bail!("invalid selector: {reason}");
    }
    println!("{selector:?}");
    println!("canonical: {selector}");
    Ok(())
}

fn show_config(config: &PortalConfig) -> Result<()> {
    let yaml = config.to_yaml().context("serializing configuration")?;
    print!("{yaml}");
    Ok(())
}

fn init_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("{} already exists, refusing to overwrite", path.display());
    }
    let yaml = PortalConfig::default()
        .to_yaml()
        .context("serializing default configuration")?;
    std::fs::write(path, yaml)
        .with_context(|| format!("writing {}", path.display()))?;
    println!("wrote default configuration to {}", path.display());
    Ok(())
}

fn check_credential(config: &PortalConfig) -> Result<()> {
    let source = FileCredentialSource::from_config(config);
    match source.secret().context("reading credential")? {
        Some(_) => println!(
            "credential available at {} (automated login)",
            source.path().display()
        ),
        None => println!(
            "no credential at {} (manual login will be required)",
            source.path().display()
        ),
    }
    Ok(())
}
