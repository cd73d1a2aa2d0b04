use clap::{Parser, Subcommand};
use config::ConfigCommand;
use floating_ip::FloatingIpCommand;

use crate::{output::OutputFormat, state::State};

mod config;
mod floating_ip;

#[derive(Parser)]
#[command(author, version, about, long_about = None, subcommand_required = true)]
struct Command {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Floating IP commands
    #[command(name = "floating-ip", alias = "fip")]
    FloatingIp(FloatingIpCommand),

    /// Manage the user config file
    Config(ConfigCommand),
}

/// Settings shared by every command.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// API access token
    #[arg(long, global = true, env = "DIGITALOCEAN_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Base url of the API
    #[arg(long, global = true, env = "DIGITALOCEAN_API_URL")]
    pub api_url: Option<String>,

    /// Output format
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Leave out the header row in text output
    #[arg(long, global = true)]
    pub no_header: bool,
}

pub async fn execute() -> anyhow::Result<()> {
    let cli = Command::parse();
    let state = State::new(cli.global.clone());

    CommandHandler::new(cli, &state).handle().await
}

struct CommandHandler {
    state: State,
    cli: Command,
}

impl CommandHandler {
    fn new(cli: Command, state: &State) -> Self {
        Self {
            state: state.clone(),
            cli,
        }
    }

    async fn handle(&self) -> anyhow::Result<()> {
        let state = &self.state;

        match self
            .cli
            .command
            .as_ref()
            .expect("commands are required should've been caught by clap")
        {
            Commands::FloatingIp(cmd) => cmd.execute(state).await,
            Commands::Config(cmd) => cmd.execute(state).await,
        }
    }
}
