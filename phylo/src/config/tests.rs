#[cfg(test)]
mod tests {
    use crate::config::{
        ConfigBuilder, ConfigError, ConfigLoader, LogFormat, LogLevel, PhyloConfig, validation,
    };
    use crate::models::TreeSettings;
    use figment::providers::{Format, Toml};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = PhyloConfig::default();
        assert_eq!(config.logging.level, LogLevel::Info);
        assert_eq!(config.logging.format, LogFormat::Default);
        assert_eq!(config.graph.index_cache_size, 64);
        assert_eq!(config.graph.lock_timeout_ms, 5000);
        assert_eq!(config.defaults, TreeSettings::default());
        assert!(validation::validate_config(&config).is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_log_level(LogLevel::Debug)
            .with_log_format(LogFormat::Json)
            .with_log_file("/tmp/phylo.log")
            .with_index_cache_size(8)
            .with_lock_timeout_ms(250)
            .with_default_settings(TreeSettings::permissive())
            .build()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.file, Some(PathBuf::from("/tmp/phylo.log")));
        assert_eq!(config.graph.index_cache_size, 8);
        assert_eq!(config.graph.lock_timeout_ms, 250);
        assert!(!config.defaults.monogamy);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let zero_cache = ConfigBuilder::new().with_index_cache_size(0).build();
        assert!(matches!(zero_cache, Err(ConfigError::ValidationError(_))));

        let zero_timeout = ConfigBuilder::new().with_lock_timeout_ms(0).build();
        assert!(matches!(zero_timeout, Err(ConfigError::ValidationError(_))));

        let inconsistent = ConfigBuilder::new()
            .with_default_settings(TreeSettings {
                monogamy: true,
                allow_polygamy: true,
                ..TreeSettings::default()
            })
            .build();
        assert!(matches!(inconsistent, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_loader_reads_toml_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[logging]
level = "debug"
format = "compact"

[graph]
index_cache_size = 16

[defaults]
monogamy = false
allowPolygamy = true
"#
        )
        .unwrap();

        let config = ConfigLoader::new()
            .load_file(file.path())
            .unwrap()
            .extract()
            .unwrap();

        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.graph.index_cache_size, 16);
        assert_eq!(config.graph.lock_timeout_ms, 5000);
        assert!(config.defaults.allow_polygamy);
    }

    #[test]
    fn test_loader_rejects_missing_and_unknown_files() {
        let missing = ConfigLoader::new().load_file("/nonexistent/phylo.toml").map(|_| ());
        assert!(matches!(missing, Err(ConfigError::FileLoadError(_))));

        let file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        let unknown = ConfigLoader::new().load_file(file.path()).map(|_| ());
        assert!(matches!(unknown, Err(ConfigError::FileLoadError(_))));
    }

    #[test]
    fn test_loader_merge_overrides() {
        let config = ConfigLoader::new()
            .merge(Toml::string("[graph]\nlock_timeout_ms = 42"))
            .extract()
            .unwrap();
        assert_eq!(config.graph.lock_timeout_ms, 42);

        let invalid = ConfigLoader::new()
            .merge(Toml::string("[graph]\nindex_cache_size = 0"))
            .extract();
        assert!(matches!(invalid, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_env_overrides() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("PHYLO_GRAPH__INDEX_CACHE_SIZE", "5");
            jail.set_env("PHYLO_LOGGING__LEVEL", "error");

            let config = ConfigLoader::new().load_env().extract().unwrap();
            assert_eq!(config.graph.index_cache_size, 5);
            assert_eq!(config.logging.level, LogLevel::Error);
            Ok(())
        });
    }

    #[test]
    fn test_config_serialization() {
        let config = ConfigBuilder::testing().build().unwrap();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: PhyloConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_log_level_parsing() {
        assert_eq!("WARN".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert!("loud".parse::<LogLevel>().is_err());
        assert_eq!(LogLevel::Trace.to_string(), "trace");
    }
}
