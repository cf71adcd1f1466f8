use eyre::{Report, WrapErr};
use serde::Deserialize;
use std::net::{Ipv4Addr, SocketAddr};

/// Service configuration, loaded from a TOML file. Every section and key
/// has a default so a missing file yields a usable local setup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: Server,
    pub database: Database,
    pub mail: Mail,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Server {
    pub listen: SocketAddr,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Database {
    pub url: String,
}

impl Default for Database {
    fn default() -> Self {
        Self {
            url: "sqlite://rbridge.db".to_owned(),
        }
    }
}

/// Decision-notification relay. Disabled by default; when disabled,
/// decisions are logged instead of mailed.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Mail {
    pub enabled: bool,
    pub relay: String,
    pub user: String,
    pub password: String,
    pub from: String,
    /// Base URL of the front end, linked from notification bodies.
    pub app_url: String,
}

impl Default for Mail {
    fn default() -> Self {
        Self {
            enabled: false,
            relay: "smtp.gmail.com".to_owned(),
            user: String::new(),
            password: String::new(),
            from: "Research Bridge <no-reply@localhost>".to_owned(),
            app_url: "http://localhost:3000".to_owned(),
        }
    }
}

impl Config {
    pub fn load(file_name: &str) -> Result<Config, Report> {
        let text =
            std::fs::read_to_string(file_name).wrap_err("cannot load configuration file")?;
        toml::from_str(&text).wrap_err("cannot parse configuration file")
    }

    /// Load `file_name` if it exists, otherwise fall back to the defaults.
    /// Used for the implicit configuration path; an explicit `-c` goes
    /// through [`Config::load`] and fails loudly.
    pub fn load_or_default(file_name: &str) -> Result<Config, Report> {
        match std::fs::read_to_string(file_name) {
            Ok(text) => toml::from_str(&text).wrap_err("cannot parse configuration file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
            Err(e) => Err(Report::new(e).wrap_err("cannot load configuration file")),
        }
    }
}
