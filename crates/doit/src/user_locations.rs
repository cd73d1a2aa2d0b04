use std::path::PathBuf;

use anyhow::Context;

use crate::state::State;

#[derive(Clone, Default)]
pub struct UserLocations {
    config_dir: Option<PathBuf>,
}

impl UserLocations {
    #[cfg(test)]
    pub fn with_config_dir(dir: &std::path::Path) -> Self {
        Self {
            config_dir: Some(dir.to_path_buf()),
        }
    }

    #[tracing::instrument(skip(self), level = "trace")]
    pub fn get_config(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.config_dir {
            return Ok(dir.clone());
        }

        let config_dir = dirs::config_dir()
            .context("failed to find a config dir for the current user")?
            .join("doit");

        Ok(config_dir)
    }
}

pub trait UserLocationsState {
    fn user_locations(&self) -> UserLocations;
}

impl UserLocationsState for State {
    fn user_locations(&self) -> UserLocations {
        UserLocations::default()
    }
}
