use crate::{
    cli::floating_ip::{
        create::CreateCommand, delete::DeleteCommand, get::GetCommand, list::ListCommand,
    },
    state::State,
};

mod create;
mod delete;
mod get;
mod list;

#[derive(clap::Parser)]
#[command(long_about = "floating-ip is used to access commands on floating IPs")]
pub struct FloatingIpCommand {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create a floating IP
    #[command(alias = "c")]
    Create(CreateCommand),

    /// Get the details of a floating IP
    #[command(alias = "g")]
    Get(GetCommand),

    /// Delete a floating IP address
    #[command(alias = "d")]
    Delete(DeleteCommand),

    /// List all floating IP addresses
    #[command(alias = "ls")]
    List(ListCommand),
}

impl FloatingIpCommand {
    pub async fn execute(&self, state: &State) -> anyhow::Result<()> {
        match &self.commands {
            Commands::Create(cmd) => cmd.execute(state).await,
            Commands::Get(cmd) => cmd.execute(state).await,
            Commands::Delete(cmd) => cmd.execute(state).await,
            Commands::List(cmd) => cmd.execute(state).await,
        }
    }
}
