use tracing_subscriber::EnvFilter;

mod cli;
mod command_context;
mod features;
mod output;
mod services;
mod state;

mod user_config;
mod user_locations;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    cli::execute().await?;

    Ok(())
}
