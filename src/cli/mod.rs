pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "assistant-admin")]
#[command(about = "Administration for the assistant auth service: schema setup and user provisioning")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, env = "APP_CONFIG", help = "Path to the YAML config file")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Create the users table and seed the default admin account")]
    InitDb,

    #[command(about = "Create a user account")]
    CreateUser(commands::user::CreateUserArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
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

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| crate::config::DEFAULT_CONFIG_PATH.to_string());
    let config = crate::config::AppConfig::load_for_database(&config_path)?;

    match cli.command {
        Commands::InitDb => commands::init_db::handle(&config, output_format).await,
        Commands::CreateUser(args) => commands::user::handle(&config, args, output_format).await,
    }
}
