use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// Liveness route served next to the token endpoint.
pub const HEALTH_ROUTE: &str = "/health";

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_route() -> String {
    "/api/ghost-jwt".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Path the token endpoint is mounted on.
    #[serde(default = "default_route")]
    pub route: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            route: default_route(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).context("reading config file")?;
        let cfg: Config = serde_json::from_str(&raw).context("parsing JSON")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// File config when a path is given, defaults otherwise; `HOST`/`PORT` win over both.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut cfg = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("HOST") {
            if !host.trim().is_empty() {
                self.host = host.trim().to_string();
            }
        }
        if let Ok(port) = std::env::var("PORT") {
            self.port = port
                .trim()
                .parse()
                .with_context(|| format!("invalid PORT value {port:?}"))?;
        }
        Ok(())
    }

    /// The token route is one static path. axum panics on capture syntax it
    /// rejects, so anything that is not a plain path is refused here.
    pub fn validate(&self) -> Result<()> {
        let route = self.route.as_str();
        if !route.starts_with('/') {
            anyhow::bail!("route must start with '/': {route}");
        }
        if route == HEALTH_ROUTE {
            anyhow::bail!("route {route} is reserved for the health check");
        }
        if route.contains(['{', '}']) {
            anyhow::bail!("route must be a static path without captures: {route}");
        }
        if let Some(segment) = route
            .split('/')
            .find(|s| s.starts_with(':') || s.starts_with('*'))
        {
            anyhow::bail!("route segment {segment:?} uses capture syntax: {route}");
        }
        Ok(())
    }
}
