use crate::{
    command_context::{CommandConfig, CommandContextState},
    features::floating_ips::{self, ARG_REGION_SLUG},
    state::State,
};

#[derive(clap::Parser, Debug)]
pub struct ListCommand {
    /// Only show floating IPs in this region
    #[arg(long)]
    region: Option<String>,
}

impl ListCommand {
    #[tracing::instrument(skip(state), level = "trace")]
    pub async fn execute(&self, state: &State) -> anyhow::Result<()> {
        let config = CommandConfig::default().with(ARG_REGION_SLUG, self.region.as_ref());

        let ctx = state.command_context("floating-ip.list", Vec::new(), config);

        floating_ips::list(&ctx).await
    }
}
