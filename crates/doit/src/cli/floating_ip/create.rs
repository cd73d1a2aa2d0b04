use crate::{
    command_context::{CommandConfig, CommandContextState},
    features::floating_ips::{self, ARG_DROPLET_ID, ARG_REGION_SLUG},
    state::State,
};

#[derive(clap::Parser, Debug)]
pub struct CreateCommand {
    /// Region where to create the floating IP (mutually exclusive with --droplet-id)
    #[arg(long)]
    region: Option<String>,

    /// ID of the droplet to assign the IP to (mutually exclusive with --region)
    #[arg(long)]
    droplet_id: Option<i64>,
}

impl CreateCommand {
    #[tracing::instrument(skip(state), level = "trace")]
    pub async fn execute(&self, state: &State) -> anyhow::Result<()> {
        let config = CommandConfig::default()
            .with(ARG_REGION_SLUG, self.region.as_ref())
            .with(ARG_DROPLET_ID, self.droplet_id);

        let ctx = state.command_context("floating-ip.create", Vec::new(), config);

        floating_ips::create(&ctx).await
    }
}
