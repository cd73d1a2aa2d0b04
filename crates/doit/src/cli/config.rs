use crate::{state::State, user_config::UserConfigServiceState};

#[derive(clap::Parser)]
pub struct ConfigCommand {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(clap::Subcommand)]
#[clap(subcommand_required = true)]
enum Commands {
    /// Store a value (access-token, api-url) in the user config file
    Set(SetCommand),
}

impl ConfigCommand {
    pub async fn execute(&self, state: &State) -> anyhow::Result<()> {
        match &self.commands {
            Commands::Set(cmd) => cmd.execute(state).await,
        }
    }
}

#[derive(clap::Parser, Debug)]
pub struct SetCommand {
    #[arg()]
    key: String,
    #[arg()]
    value: String,
}

impl SetCommand {
    #[tracing::instrument(skip(self, state), fields(key = %self.key), level = "debug")]
    pub async fn execute(&self, state: &State) -> anyhow::Result<()> {
        tracing::debug!("writing user key to file");

        state
            .user_config_service()
            .set(&self.key, &self.value)
            .await?;

        tracing::debug!("done writing user key to file");

        Ok(())
    }
}
