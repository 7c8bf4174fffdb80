pub mod commands;
pub mod config;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::client::{RootlyClient, SessionStore};

#[derive(Parser)]
#[command(name = "rootly")]
#[command(about = "Rootly CLI - Command-line client for the Rootly BFF")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, env = "ROOTLY_SERVER_URL", help = "BFF base URL")]
    pub server: Option<String>,

    #[arg(long, global = true, env = "ROOTLY_INSECURE_TLS", help = "Accept self-signed TLS certificates")]
    pub insecure: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and session management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Plant management")]
    Plants {
        #[command(subcommand)]
        cmd: commands::plants::PlantCommands,
    },

    #[command(about = "Device management")]
    Devices {
        #[command(subcommand)]
        cmd: commands::devices::DeviceCommands,
    },

    #[command(about = "User profile and photo")]
    Users {
        #[command(subcommand)]
        cmd: commands::users::UserCommands,
    },

    #[command(about = "Sensor analytics")]
    Analytics {
        #[command(subcommand)]
        cmd: commands::analytics::AnalyticsCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

/// Client and output settings shared by every command.
pub struct Context {
    pub client: RootlyClient,
    pub output: OutputFormat,
    pub server_url: String,
}

impl Context {
    pub fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let saved = config::load_cli_config()?;
        let server_url = saved.resolve_server_url(cli.server.as_deref());
        let session = SessionStore::load(config::session_path()?);
        let client = RootlyClient::new(&server_url, cli.insecure || saved.insecure_tls, session)?;

        Ok(Self {
            client,
            output: OutputFormat::from_cli(cli),
            server_url,
        })
    }

    /// Id of the signed-in user, if any.
    pub fn session_user_id(&self) -> Option<String> {
        self.client.session().user().map(|user| user.id)
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::from_cli(&cli)?;
    tracing::debug!(server = %ctx.server_url, "Using BFF");

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &ctx).await,
        Commands::Plants { cmd } => commands::plants::handle(cmd, &ctx).await,
        Commands::Devices { cmd } => commands::devices::handle(cmd, &ctx).await,
        Commands::Users { cmd } => commands::users::handle(cmd, &ctx).await,
        Commands::Analytics { cmd } => commands::analytics::handle(cmd, &ctx).await,
    }
}
