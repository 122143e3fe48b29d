//! Runtime configuration: the bind address, descriptor-set path, and
//! advertised service identity. Constructible from explicit fields, or
//! loaded from a JSON config file via `serde_json`.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

fn default_descriptor_set_path() -> String {
    "user-function.desc".to_string()
}

fn default_bind_address() -> SocketAddr {
    "0.0.0.0:8080".parse().unwrap()
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub service_name: String,
    #[serde(default = "default_service_version")]
    pub service_version: String,
    #[serde(default = "default_descriptor_set_path")]
    pub descriptor_set_path: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
}

fn default_service_version() -> String {
    "0.1.0".to_string()
}

impl RuntimeConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: default_service_version(),
            descriptor_set_path: default_descriptor_set_path(),
            bind_address: default_bind_address(),
        }
    }

    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    pub fn with_service_version(mut self, version: impl Into<String>) -> Self {
        self.service_version = version.into();
        self
    }

    pub fn with_descriptor_set_path(mut self, path: impl Into<String>) -> Self {
        self.descriptor_set_path = path.into();
        self
    }

    /// Overrides fields present in the environment: `BIND_ADDRESS`,
    /// `SERVICE_VERSION`, `DESCRIPTOR_SET_PATH`. Unset variables leave the
    /// existing value untouched.
    pub fn merge_env(mut self) -> Self {
        if let Ok(addr) = std::env::var("BIND_ADDRESS") {
            if let Ok(parsed) = addr.parse() {
                self.bind_address = parsed;
            }
        }
        if let Ok(version) = std::env::var("SERVICE_VERSION") {
            self.service_version = version;
        }
        if let Ok(path) = std::env::var("DESCRIPTOR_SET_PATH") {
            self.descriptor_set_path = path;
        }
        self
    }

    pub fn from_json(data: &str) -> serde_json::Result<Self> {
        serde_json::from_str(data)
    }
}
