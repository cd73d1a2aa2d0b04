use std::{collections::BTreeMap, sync::Arc};

use anyhow::Context;

use crate::{
    output::{Displayer, DisplayerState},
    services::floating_ips::{FloatingIpsClient, FloatingIpsClientState},
    state::State,
};

/// Everything a single command invocation needs. Built right before the
/// handler runs and dropped when it returns.
pub struct CommandContext {
    pub ns: String,
    pub args: Vec<String>,
    pub config: CommandConfig,

    pub floating_ips: FloatingIpsClient,
    pub output: Arc<dyn Displayer + Send + Sync + 'static>,
}

/// Flag values resolved for one command namespace.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommandConfig {
    values: BTreeMap<String, String>,
}

impl CommandConfig {
    pub fn with(mut self, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.values.insert(key.into(), value.to_string());
        }

        self
    }

    pub fn get_string(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    pub fn get_int(&self, key: &str) -> anyhow::Result<Option<i64>> {
        self.values
            .get(key)
            .map(|value| {
                value
                    .parse::<i64>()
                    .context(format!("{key} requires an integer, got: {value}"))
            })
            .transpose()
    }
}

pub trait CommandContextState {
    fn command_context(&self, ns: &str, args: Vec<String>, config: CommandConfig)
    -> CommandContext;
}

impl CommandContextState for State {
    fn command_context(
        &self,
        ns: &str,
        args: Vec<String>,
        config: CommandConfig,
    ) -> CommandContext {
        tracing::trace!(ns, args = %args.join(" "), "building command context");

        CommandContext {
            ns: ns.into(),
            args,
            config,
            floating_ips: self.floating_ips_client(),
            output: self.displayer(),
        }
    }
}
