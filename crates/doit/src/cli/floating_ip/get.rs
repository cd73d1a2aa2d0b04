use crate::{
    command_context::{CommandConfig, CommandContextState},
    features::floating_ips,
    state::State,
};

#[derive(clap::Parser, Debug)]
pub struct GetCommand {
    /// The floating IP address
    #[arg(value_name = "FLOATING_IP")]
    args: Vec<String>,
}

impl GetCommand {
    #[tracing::instrument(skip(state), level = "trace")]
    pub async fn execute(&self, state: &State) -> anyhow::Result<()> {
        let ctx = state.command_context(
            "floating-ip.get",
            self.args.clone(),
            CommandConfig::default(),
        );

        floating_ips::get(&ctx).await
    }
}
