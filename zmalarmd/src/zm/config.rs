use serde_derive::Deserialize;
use std::sync::Arc;
use zmalarm_api::{Error, Result};

fn def_path() -> String {
    String::from("/zm/")
}

fn def_path_zms() -> String {
    String::from("/zm/cgi-bin/nph-zms")
}

fn def_verify_ssl() -> bool {
    true
}

fn def_ttl() -> u32 {
    5
}

/// Configuration of one ZoneMinder server. Each `[[host]]` section
/// of the config file is parsed into one of these.

#[derive(Deserialize, Clone, Debug)]
pub struct Params {
    pub name: Arc<str>,
    pub host: String,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "def_path")]
    pub path: String,
    #[serde(default = "def_path_zms")]
    pub path_zms: String,
    #[serde(default)]
    pub ssl: bool,
    #[serde(default = "def_verify_ssl")]
    pub verify_ssl: bool,
    #[serde(default = "def_ttl")]
    pub ttl: u32,
}

impl Params {
    /// Returns the scheme and authority of the server.
    pub fn server_origin(&self) -> String {
        format!(
            "{}://{}",
            if self.ssl { "https" } else { "http" },
            &self.host
        )
    }

    /// Returns the URL under which ZoneMinder's web interface (and
    /// API) lives. It always ends with a '/' so API paths can be
    /// joined to it.
    pub fn server_url(&self) -> String {
        let path = self.path.trim_matches('/');

        if path.is_empty() {
            format!("{}/", self.server_origin())
        } else {
            format!("{}/{}/", self.server_origin(), path)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::ConfigError(String::from(
                "'name' must not be empty",
            )));
        }

        if self.host.is_empty() {
            return Err(Error::ConfigError(format!(
                "host '{}' has an empty 'host' parameter",
                &self.name
            )));
        }

        if self.ttl == 0 {
            return Err(Error::ConfigError(format!(
                "host '{}' -- 'ttl' should be a positive integer",
                &self.name
            )));
        }
        Ok(())
    }
}
