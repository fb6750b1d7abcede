use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub server: ServerSettings,
    #[serde(default)]
    pub layout: LayoutSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutSettings {
    /// Inactivity window before accumulated layout changes are flushed.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_debounce_ms() -> u64 {
    1000
}

pub fn load_server_config() -> anyhow::Result<ServerConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/server"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_defaults_to_one_second() {
        let config: ServerConfig = toml::from_str("[server]\nbind = \"0.0.0.0:8080\"").unwrap();
        assert_eq!(config.layout.debounce_ms, 1000);
    }

    #[test]
    fn test_debounce_override() {
        let config: ServerConfig =
            toml::from_str("[server]\nbind = \"0.0.0.0:8080\"\n[layout]\ndebounce_ms = 250")
                .unwrap();
        assert_eq!(config.layout.debounce_ms, 250);
    }
}
