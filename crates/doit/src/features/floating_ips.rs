use doit_models::{FloatingIpCreateRequest, FloatingIps};

use crate::command_context::CommandContext;

pub const ARG_REGION_SLUG: &str = "region";
pub const ARG_DROPLET_ID: &str = "droplet-id";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("missing required arguments: {0}")]
    MissingArguments(String),

    #[error("{0}")]
    InvalidInput(String),
}

#[tracing::instrument(skip(ctx), fields(ns = %ctx.ns), level = "trace")]
pub async fn create(ctx: &CommandContext) -> anyhow::Result<()> {
    let region = ctx.config.get_string(ARG_REGION_SLUG).unwrap_or_default();
    let droplet_id = ctx.config.get_int(ARG_DROPLET_ID)?.unwrap_or_default();

    let request = match (region.is_empty(), droplet_id == 0) {
        (true, true) => {
            return Err(CommandError::MissingArguments(
                "region and droplet id can't both be blank".into(),
            )
            .into());
        }
        (false, false) => {
            return Err(CommandError::InvalidInput(
                "specify region or droplet id when creating a floating ip".into(),
            )
            .into());
        }
        (false, true) => FloatingIpCreateRequest::in_region(region),
        (true, false) => FloatingIpCreateRequest::for_droplet(droplet_id),
    };

    tracing::debug!(?request, "creating floating ip");

    let ip = ctx.floating_ips.create(&request).await?;

    ctx.output.display(&FloatingIps::single(ip))
}

#[tracing::instrument(skip(ctx), fields(ns = %ctx.ns), level = "trace")]
pub async fn get(ctx: &CommandContext) -> anyhow::Result<()> {
    let ip = single_address(ctx)?;

    let ip = ctx.floating_ips.get(ip).await?;

    ctx.output.display(&FloatingIps::single(ip))
}

#[tracing::instrument(skip(ctx), fields(ns = %ctx.ns), level = "trace")]
pub async fn delete(ctx: &CommandContext) -> anyhow::Result<()> {
    let ip = single_address(ctx)?;

    ctx.floating_ips.delete(ip).await?;

    tracing::debug!(ip, "deleted floating ip");

    Ok(())
}

#[tracing::instrument(skip(ctx), fields(ns = %ctx.ns), level = "trace")]
pub async fn list(ctx: &CommandContext) -> anyhow::Result<()> {
    let region = ctx.config.get_string(ARG_REGION_SLUG).unwrap_or_default();

    let ips = ctx.floating_ips.list().await?;

    ctx.output.display(&filter_by_region(ips, &region))
}

/// Keeps entries in `region`, or everything when `region` is empty. Order is
/// preserved.
pub fn filter_by_region(ips: FloatingIps, region: &str) -> FloatingIps {
    ips.into_inner()
        .into_iter()
        .filter(|ip| region.is_empty() || ip.region_slug() == region)
        .collect()
}

fn single_address(ctx: &CommandContext) -> anyhow::Result<&str> {
    let [arg] = ctx.args.as_slice() else {
        return Err(CommandError::MissingArguments(ctx.ns.clone()).into());
    };

    let ip = arg.trim();
    if ip.is_empty() {
        return Err(CommandError::InvalidInput("invalid ip address".into()).into());
    }

    Ok(ip)
}
