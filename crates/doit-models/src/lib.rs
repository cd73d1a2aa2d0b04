use std::ops::Deref;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloatingIp {
    pub ip: String,
    pub region: Region,

    #[serde(default)]
    pub droplet: Option<Droplet>,

    #[serde(default)]
    pub locked: bool,
}

impl FloatingIp {
    pub fn region_slug(&self) -> &str {
        &self.region.slug
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub slug: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub available: bool,

    #[serde(default)]
    pub features: Vec<String>,

    #[serde(default)]
    pub sizes: Vec<String>,
}

impl Region {
    pub fn new(slug: &str) -> Self {
        Self {
            slug: slug.into(),
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Droplet {
    pub id: i64,

    #[serde(default)]
    pub name: String,
}

/// Body of a create call. The locator that is not in use stays at its zero
/// value and is left out of the serialized request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FloatingIpCreateRequest {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub region: String,

    #[serde(skip_serializing_if = "is_zero")]
    pub droplet_id: i64,
}

impl FloatingIpCreateRequest {
    pub fn in_region(slug: impl Into<String>) -> Self {
        Self {
            region: slug.into(),
            droplet_id: 0,
        }
    }

    pub fn for_droplet(droplet_id: i64) -> Self {
        Self {
            region: String::new(),
            droplet_id,
        }
    }
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Ordered collection of floating IPs handed to the output layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FloatingIps(Vec<FloatingIp>);

impl FloatingIps {
    pub fn single(ip: FloatingIp) -> Self {
        Self(vec![ip])
    }

    pub fn into_inner(self) -> Vec<FloatingIp> {
        self.0
    }
}

impl Deref for FloatingIps {
    type Target = [FloatingIp];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<FloatingIp>> for FloatingIps {
    fn from(value: Vec<FloatingIp>) -> Self {
        Self(value)
    }
}

impl FromIterator<FloatingIp> for FloatingIps {
    fn from_iter<T: IntoIterator<Item = FloatingIp>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
