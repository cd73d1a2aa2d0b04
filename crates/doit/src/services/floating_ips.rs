use std::sync::Arc;

use async_trait::async_trait;
use doit_models::{FloatingIp, FloatingIpCreateRequest, FloatingIps};

use crate::{state::State, user_config::UserConfigServiceState};

use digitalocean::DigitalOceanFloatingIps;

pub mod digitalocean;

pub struct FloatingIpsClient {
    inner: Arc<dyn FloatingIpsContract + Send + Sync + 'static>,
}

impl FloatingIpsClient {
    pub async fn create(&self, request: &FloatingIpCreateRequest) -> anyhow::Result<FloatingIp> {
        self.inner.create(request).await
    }

    pub async fn get(&self, ip: &str) -> anyhow::Result<FloatingIp> {
        self.inner.get(ip).await
    }

    pub async fn delete(&self, ip: &str) -> anyhow::Result<()> {
        self.inner.delete(ip).await
    }

    pub async fn list(&self) -> anyhow::Result<FloatingIps> {
        self.inner.list().await
    }
}

impl<T: FloatingIpsContract + Send + Sync + 'static> From<T> for FloatingIpsClient {
    fn from(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }
}

#[async_trait]
pub trait FloatingIpsContract {
    async fn create(&self, request: &FloatingIpCreateRequest) -> anyhow::Result<FloatingIp>;
    async fn get(&self, ip: &str) -> anyhow::Result<FloatingIp>;
    async fn delete(&self, ip: &str) -> anyhow::Result<()>;
    async fn list(&self) -> anyhow::Result<FloatingIps>;
}

pub trait FloatingIpsClientState {
    fn floating_ips_client(&self) -> FloatingIpsClient;
}

impl FloatingIpsClientState for State {
    fn floating_ips_client(&self) -> FloatingIpsClient {
        FloatingIpsClient::from(DigitalOceanFloatingIps::new(
            self.global.access_token.clone(),
            self.global.api_url.clone(),
            self.user_config_service(),
        ))
    }
}
