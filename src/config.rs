use anyhow::Context;
use log::LevelFilter;
use serde::{de, Deserialize, Deserializer};
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub feed_url: String,
    pub read_api_key: String,
    pub update_url: String,
    pub write_api_key: String,
    #[serde(deserialize_with = "deserialize_duration_from_str")]
    pub poll_interval: Duration,
    #[serde(deserialize_with = "deserialize_level_filter_from_str")]
    pub log_level: LevelFilter,
    #[serde(default)]
    pub use_syslog: bool,
}

fn deserialize_duration_from_str<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_duration::parse(s.as_str()).map_err(de::Error::custom)
}

fn deserialize_level_filter_from_str<'de, D>(deserializer: D) -> Result<LevelFilter, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    match s.to_lowercase().as_str() {
        "off" => Ok(LevelFilter::Off),
        "error" => Ok(LevelFilter::Error),
        "warn" => Ok(LevelFilter::Warn),
        "info" => Ok(LevelFilter::Info),
        "debug" => Ok(LevelFilter::Debug),
        "trace" => Ok(LevelFilter::Trace),
        _ => Err(de::Error::custom("Unknown level filter")),
    }
}

impl Config {
    pub fn read_from_file(path: &str) -> anyhow::Result<Config> {
        let mut settings = config::Config::default();
        settings
            .merge(config::File::with_name(path))
            .with_context(|| format!("Config::read_from_file(): open file {}", path))?;

        Self::from_settings(settings)
    }

    fn from_settings(settings: config::Config) -> anyhow::Result<Config> {
        let config: Config = settings
            .get("main")
            .with_context(|| "Config::read_from_file(): deserialize")?;

        if config.poll_interval.is_zero() {
            return Err(anyhow::anyhow!(
                "Config::read_from_file(): poll_interval must be greater than zero"
            ));
        }

        Ok(config)
    }
}

#[cfg(test)]
mod test {
    use super::Config;
    use log::LevelFilter;
    use std::time::Duration;

    fn parse(text: &str) -> anyhow::Result<Config> {
        let mut settings = config::Config::default();
        settings
            .merge(config::File::from_str(text, config::FileFormat::Toml))
            .unwrap();
        Config::from_settings(settings)
    }

    #[test]
    fn shipped_config_is_valid() {
        let config = parse(include_str!("nivel_agua.toml")).unwrap();

        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.update_url, "https://api.thingspeak.com/update");
        assert!(!config.use_syslog);
    }

    #[test]
    fn use_syslog_defaults_to_false() {
        let config = parse(
            r#"
[main]
feed_url = "http://localhost/feeds.json"
read_api_key = "R"
update_url = "http://localhost/update"
write_api_key = "W"
poll_interval = "250ms"
log_level = "DEBUG"
"#,
        )
        .unwrap();

        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert!(!config.use_syslog);
    }

    #[test]
    fn rejects_unknown_level_and_zero_interval() {
        let base = |interval: &str, level: &str| {
            format!(
                "[main]\nfeed_url = \"a\"\nread_api_key = \"b\"\nupdate_url = \"c\"\n\
write_api_key = \"d\"\npoll_interval = \"{}\"\nlog_level = \"{}\"\n",
                interval, level
            )
        };

        assert!(parse(&base("5s", "loud")).is_err());
        assert!(parse(&base("0s", "info")).is_err());
    }
}
