use crate::application::query_builder::QueryDefaults;
use crate::domain::provider::ProviderId;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerSettings,
    pub nerdgraph: NerdGraphSettings,
    #[serde(default)]
    pub providers: ProviderSettings,
    #[serde(default)]
    pub query: QuerySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub listen_addr: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NerdGraphSettings {
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderSettings {
    pub enabled: Vec<ProviderId>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            enabled: ProviderId::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct QuerySettings {
    pub default_limit: u32,
    pub since_minutes: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        let defaults = QueryDefaults::default();
        Self {
            default_limit: defaults.limit,
            since_minutes: defaults.since_minutes,
        }
    }
}

impl From<&QuerySettings> for QueryDefaults {
    fn from(settings: &QuerySettings) -> Self {
        QueryDefaults {
            limit: settings.default_limit,
            since_minutes: settings.since_minutes,
        }
    }
}

/// `config/kafka.toml` overlaid with `KAFKA_OVERVIEW__SECTION__KEY` variables.
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("config/kafka").required(false))
        .add_source(
            config::Environment::with_prefix("KAFKA_OVERVIEW")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("providers.enabled")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> AppConfig {
        config::Config::builder()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults_enable_every_provider() {
        let config = parse(
            r#"
            [nerdgraph]
            endpoint = "https://api.newrelic.com/graphql"
            api_key = "NRAK-test"
            "#,
        );

        assert_eq!(config.providers.enabled, ProviderId::ALL.to_vec());
        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.nerdgraph.timeout_secs, 30);
        assert_eq!(QueryDefaults::from(&config.query).limit, 200);
    }

    #[test]
    fn test_enabled_providers_by_id() {
        let config = parse(
            r#"
            [nerdgraph]
            endpoint = "https://api.eu.newrelic.com/graphql"
            api_key = "NRAK-test"

            [providers]
            enabled = ["aws-msk", "kafka-on-host"]

            [query]
            default_limit = 50
            since_minutes = 15
            "#,
        );

        assert_eq!(config.providers.enabled, vec![ProviderId::AwsMsk, ProviderId::KafkaOnHost]);
        let defaults = QueryDefaults::from(&config.query);
        assert_eq!(defaults.limit, 50);
        assert_eq!(defaults.since_minutes, 15);
    }
}
