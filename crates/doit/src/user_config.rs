use std::{
    collections::BTreeMap,
    ops::Deref,
    path::PathBuf,
    str::FromStr,
    sync::Arc,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tokio::{io::AsyncWriteExt, sync::OnceCell};

use crate::{
    state::State,
    user_locations::{UserLocations, UserLocationsState},
};

pub const ACCESS_TOKEN_KEY: &str = "access-token";
pub const API_URL_KEY: &str = "api-url";

const KNOWN_KEYS: &[&str] = &[ACCESS_TOKEN_KEY, API_URL_KEY];

const USER_CONFIG_FILE: &str = "doit.toml";

#[derive(Clone)]
pub struct UserConfigService {
    locations: UserLocations,

    config: Arc<OnceCell<UserConfig>>,
}

impl UserConfigService {
    pub fn new(locations: UserLocations) -> Self {
        Self {
            locations,
            config: Arc::new(OnceCell::const_new()),
        }
    }

    pub async fn get_user_config(&self) -> anyhow::Result<&UserConfig> {
        let config_path = self.config_path()?;

        let config = self
            .config
            .get_or_try_init(|| async move {
                if !config_path.exists() {
                    tracing::trace!("no user config found, using defaults");
                    return Ok::<_, anyhow::Error>(UserConfig::default());
                }

                let file = tokio::fs::read_to_string(&config_path)
                    .await
                    .context(format!(
                        "failed to load config file at path: {}",
                        config_path.display()
                    ))?;

                let user_config: UserConfig =
                    toml::from_str(&file).context("failed to parse user config")?;

                Ok(user_config)
            })
            .await?;

        Ok(config)
    }

    pub async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        if !KNOWN_KEYS.contains(&key) {
            anyhow::bail!(
                "unknown config key: {key}, expected one of: {}",
                KNOWN_KEYS.join(", ")
            );
        }

        let config_path = self.config_path()?;

        let mut user_config = if !config_path.exists() {
            toml_edit::DocumentMut::default()
        } else {
            let file = tokio::fs::read_to_string(&config_path)
                .await
                .context(format!(
                    "failed to load config file at path: {}",
                    config_path.display()
                ))?;

            toml_edit::DocumentMut::from_str(&file).context("failed to parse user config")?
        };

        if !user_config.contains_table("user") {
            user_config["user"] = toml_edit::table();
        }
        let table = user_config["user"]
            .as_table_mut()
            .context("user in config file is not a table")?;

        table[key] = toml_edit::value(value);

        if !config_path.exists()
            && let Some(parent) = config_path.parent()
        {
            tokio::fs::create_dir_all(&parent)
                .await
                .context("failed to create config dir")?;
        }

        let mut config = tokio::fs::File::create(&config_path)
            .await
            .context("failed to create config file")?;

        let output = user_config.to_string();

        config
            .write_all(output.as_bytes())
            .await
            .context("failed to write to file")?;
        config.flush().await?;

        tracing::debug!(key, path = %config_path.display(), "updated user config");

        Ok(())
    }

    fn config_path(&self) -> anyhow::Result<PathBuf> {
        Ok(self.locations.get_config()?.join(USER_CONFIG_FILE))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct UserConfig {
    #[serde(default)]
    pub user: UserSection,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Default, Serialize)]
pub struct UserSection(BTreeMap<String, String>);

impl Deref for UserSection {
    type Target = BTreeMap<String, String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub trait UserConfigServiceState {
    fn user_config_service(&self) -> UserConfigService;
}

impl UserConfigServiceState for State {
    fn user_config_service(&self) -> UserConfigService {
        UserConfigService::new(self.user_locations())
    }
}
