mod prompt;
mod settings;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use cloudcore::lifecycle::{PollConfig, ServerWatch, Transition};
use cloudcore::{Cloud, CreateServer, Selection, Selector, openrc};
use colored::Colorize;
use settings::Settings;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cloudserver")]
#[command(version, about = "Create or delete a server from options, YAML file, and interactive input", long_about = None)]
struct Cli {
    /// Print debug output
    #[arg(short = 'D', long, overrides_with = "no_debug")]
    debug: bool,

    /// Disable debug output set in the configuration file
    #[arg(long, overrides_with = "debug")]
    no_debug: bool,

    /// Use YAML configuration file FILE, command-line options override file options
    #[arg(short = 'f', long, value_name = "FILE")]
    file: Option<PathBuf>,

    /// Read unset options from an OpenStack RC file
    #[arg(long, value_name = "FILE")]
    openrc: Option<PathBuf>,

    /// Cloud provider (default: "openstack")
    #[arg(short = 'P', long)]
    provider: Option<String>,

    /// Authentication URL (default: "https://identity-3.eu-de-1.cloud.sap:443/v3")
    #[arg(short = 'a', long, value_name = "URL")]
    auth_url: Option<String>,

    /// Cloud domain (default: "monsoon3")
    #[arg(short = 'd', long)]
    domain: Option<String>,

    /// Cloud project name
    #[arg(short = 'p', long)]
    project: Option<String>,

    /// Cloud region (default: "eu-de-1")
    #[arg(short = 'r', long)]
    region: Option<String>,

    /// Create VM
    #[arg(short = 'c', long)]
    create: bool,

    /// Use FLAVOR for VM creation
    #[arg(short = 'l', long)]
    flavor: Option<String>,

    /// Use IMAGE ID for VM creation
    #[arg(short = 'i', long)]
    image: Option<String>,

    /// Use KEYPAIR for VM creation
    #[arg(short = 'k', long)]
    keypair: Option<String>,

    /// Use NETWORK ID for VM creation
    #[arg(short = 'n', long)]
    network: Option<String>,

    /// Name for VM creation
    #[arg(short = 'm', long)]
    name: Option<String>,

    /// Terminate server ID, selected interactively when ID is omitted
    #[arg(short = 't', long, value_name = "ID", num_args = 0..=1, default_missing_value = "")]
    terminate: Option<String>,

    /// List servers of the project
    #[arg(long)]
    list: bool,

    /// Cloud username
    #[arg(long)]
    username: Option<String>,

    /// Cloud password (do not use on CLI)
    #[arg(long, env = "OS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Timeout in seconds
    #[arg(long)]
    timeout: Option<i64>,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            debug: if self.no_debug {
                Some(false)
            } else {
                self.debug.then_some(true)
            },
            provider: self.provider.clone(),
            auth_url: self.auth_url.clone(),
            domain: self.domain.clone(),
            domain_id: None,
            project: self.project.clone(),
            project_id: None,
            region: self.region.clone(),
            create: self.create.then_some(true),
            flavor: self.flavor.clone(),
            image: self.image.clone(),
            keypair: self.keypair.clone(),
            network: self.network.clone(),
            name: self.name.clone(),
            terminate: self.terminate.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            timeout: self.timeout,
        }
    }
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), message);
    std::process::exit(1);
}

fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let file_settings = match &cli.file {
        Some(path) if !path.exists() => fail(format!(
            "Could not find configuration file \"{}\"",
            path.display()
        )),
        Some(path) => Settings::from_file(path)?,
        None => Settings::default(),
    };

    let openrc_settings = match &cli.openrc {
        Some(path) => openrc::parse(path)?
            .map(|vars| Settings::from_openrc(&vars))
            .unwrap_or_default(),
        None => Settings::default(),
    };

    let mut settings = cli
        .settings()
        .merge(file_settings)
        .merge(openrc_settings)
        .with_defaults();

    init_tracing(settings.debug());
    tracing::debug!(
        provider = ?settings.provider,
        domain = ?settings.domain,
        project = ?settings.project,
        "options merged"
    );

    let missing = settings.missing_essentials();
    if !missing.is_empty() {
        fail(settings::missing_message(&missing));
    }

    if !settings.has_password() {
        let stdin = std::io::stdin();
        let password = prompt::ask_non_empty(
            "Enter your Cloud password: ",
            &mut stdin.lock(),
            &mut std::io::stdout(),
        )?;
        settings.password = Some(password);
    }

    let config = settings.to_configuration()?;
    let cloud = match Cloud::connect(&config).await {
        Ok(cloud) => cloud,
        Err(e) => {
            eprintln!("{}", e);
            fail("Cloud initialisation failed");
        }
    };
    let timeout = Duration::from_secs(config.timeout_secs());

    if cli.list {
        list_servers(&cloud).await?;
    }

    if settings.create() {
        create_server(&cloud, &mut settings, timeout).await?;
        return Ok(());
    }

    if let Some(id) = settings.terminate.clone() {
        terminate_server(&cloud, id, timeout).await?;
    }

    Ok(())
}

async fn list_servers(cloud: &Cloud) -> Result<()> {
    for server in cloud.compute().servers().await? {
        println!("{} ({})", server.id, server.name);
    }
    Ok(())
}

async fn select(selector: &Selector<'_>, resource_type: &str) -> Result<String> {
    match selector.select(resource_type).await? {
        Selection::Chosen(id) => Ok(id),
        Selection::Empty => Err(anyhow!("no {} available in this project", resource_type)),
    }
}

async fn create_server(cloud: &Cloud, settings: &mut Settings, timeout: Duration) -> Result<()> {
    println!("{}", "Creating server".cyan());
    let selector = Selector::new(cloud);

    for (resource_type, slot) in [
        ("flavor", &mut settings.flavor),
        ("image", &mut settings.image),
        ("keypair", &mut settings.keypair),
        ("network", &mut settings.network),
    ] {
        if slot.is_none() {
            *slot = Some(select(&selector, resource_type).await?);
        }
    }

    let name = match settings.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => {
            let stdin = std::io::stdin();
            prompt::ask_non_empty(
                "Please enter a server name: ",
                &mut stdin.lock(),
                &mut std::io::stdout(),
            )?
        }
    };

    let request = CreateServer {
        name,
        image_ref: settings.image.clone().unwrap_or_default(),
        flavor_ref: settings.flavor.clone().unwrap_or_default(),
        key_name: settings.keypair.clone(),
        networks: settings.network.clone().into_iter().collect(),
    };

    let compute = cloud.compute();
    let server = compute.create_server(&request).await?;
    ServerWatch::new(compute, &server.id)
        .wait(Transition::Create, timeout, &PollConfig::default())
        .await?;

    println!(
        "{} {} ({})",
        "Created server".green(),
        server.name,
        server.id
    );
    Ok(())
}

async fn terminate_server(cloud: &Cloud, id: String, timeout: Duration) -> Result<()> {
    println!("{}", "Terminating server".cyan());

    let id = if id.trim().is_empty() {
        select(&Selector::new(cloud), "server").await?
    } else {
        id.trim().to_string()
    };

    let compute = cloud.compute();
    let server = compute
        .servers()
        .await?
        .into_iter()
        .find(|s| s.id == id)
        .with_context(|| format!("Could not find a server with ID {}", id))?;

    compute.destroy_server(&server.id).await?;
    ServerWatch::new(compute, &server.id)
        .wait(Transition::Destroy, timeout, &PollConfig::default())
        .await?;

    println!(
        "{} {} has been terminated",
        "Server".green(),
        server.id
    );
    Ok(())
}
