use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;
use std::{env, fs};

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub host: HostConfig,
    pub poll: PollConfig,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = env::current_dir() {
            candidates.push(current_dir.join("config.toml"));
            candidates.push(current_dir.join("config").join("config.toml"));
            candidates.push(current_dir.join("config").join("spotifalc.toml"));
        }

        if let Ok(exe) = env::current_exe() {
            if let Some(dir) = exe.parent() {
                candidates.push(dir.join("config.toml"));
                candidates.push(dir.join("config").join("config.toml"));
                candidates.push(dir.join("config").join("spotifalc.toml"));
            }
        }

        for path in candidates {
            if path.exists() {
                let data = fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file: {}", path.display()))?;
                let doc: ConfigDocument = toml::from_str(&data)
                    .with_context(|| format!("Failed to parse config: {}", path.display()))?;
                return Ok(doc.into());
            }
        }

        Ok(Config::default())
    }
}

#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Executable that provides the streaming-service commands over stdio.
    pub command: String,
    pub args: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            command: "spotifalc-host".to_string(),
            args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 1000 }
    }
}

impl PollConfig {
    /// Tick period, floored so a misconfigured interval cannot spin the
    /// host with requests.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(100))
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    host: HostSection,
    #[serde(default)]
    poll: PollSection,
}

impl From<ConfigDocument> for Config {
    fn from(value: ConfigDocument) -> Self {
        let defaults_host = HostConfig::default();
        let defaults_poll = PollConfig::default();

        Config {
            host: HostConfig {
                command: value.host.command.unwrap_or(defaults_host.command),
                args: value.host.args.unwrap_or(defaults_host.args),
            },
            poll: PollConfig {
                interval_ms: value.poll.interval_ms.unwrap_or(defaults_poll.interval_ms),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct HostSection {
    command: Option<String>,
    args: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct PollSection {
    interval_ms: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_parses_into_config() {
        let doc: ConfigDocument = toml::from_str(
            r#"
            [host]
            command = "my-host"
            args = ["--verbose"]

            [poll]
            interval_ms = 250
            "#,
        )
        .unwrap();
        let config: Config = doc.into();
        assert_eq!(config.host.command, "my-host");
        assert_eq!(config.host.args, vec!["--verbose".to_string()]);
        assert_eq!(config.poll.interval_ms, 250);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let doc: ConfigDocument = toml::from_str("").unwrap();
        let config: Config = doc.into();
        assert_eq!(config.host.command, "spotifalc-host");
        assert_eq!(config.poll.interval_ms, 1000);
    }

    #[test]
    fn interval_has_a_floor() {
        let poll = PollConfig { interval_ms: 1 };
        assert_eq!(poll.interval(), Duration::from_millis(100));
    }
}
