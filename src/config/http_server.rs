use std::net::Ipv4Addr;
use std::net::SocketAddr;

use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Where `/metrics` and the `/config/*.yaml` artifacts are served, if at all.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HttpServerConfig {
    #[serde(default)]
    pub enabled: bool,

    /// e.g. `127.0.0.1:9100` to keep the cached documents off the pod network
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            listen_addr: default_listen_addr(),
        }
    }
}

impl HttpServerConfig {
    /// An ephemeral port would leave scrapers with nothing to point at.
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.listen_addr.port() == 0 {
            return Err(Error::InvalidConfig(format!(
                "http.listen_addr {} needs a fixed port when the server is enabled",
                self.listen_addr
            )));
        }
        Ok(())
    }
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}
