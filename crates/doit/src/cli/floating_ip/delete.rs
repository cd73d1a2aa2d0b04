use crate::{
    command_context::{CommandConfig, CommandContextState},
    features::floating_ips,
    state::State,
};

#[derive(clap::Parser, Debug)]
pub struct DeleteCommand {
    /// The floating IP address
    #[arg(value_name = "FLOATING_IP")]
    args: Vec<String>,
}

impl DeleteCommand {
    #[tracing::instrument(skip(state), level = "trace")]
    pub async fn execute(&self, state: &State) -> anyhow::Result<()> {
        let ctx = state.command_context(
            "floating-ip.delete",
            self.args.clone(),
            CommandConfig::default(),
        );

        floating_ips::delete(&ctx).await
    }
}
