use std::path::Path;

use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

/// Environment variable prefix; nested keys use `__`
/// (e.g. `GEX_ANALYSIS__DISPLAY_RANGE_PCT=0.1`).
pub const ENV_PREFIX: &str = "GEX_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from defaults, `config/Config.toml` and the
    /// environment, later sources overriding earlier ones.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Same as [`ConfigLoader::load`] with an explicit TOML path. A missing
    /// file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or environment values cannot be parsed.
    pub fn load_from(path: &str) -> Result<AppConfig> {
        Self::base(path)
            .extract()
            .with_context(|| format!("Failed to load configuration from {path}"))
    }

    /// Loads `path` with a profile overlay next to it: `config/Config.toml`
    /// with profile `weekly` also reads `config/Config.weekly.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(path: &str, profile: &str) -> Result<AppConfig> {
        Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Toml::file(profile_path(path, profile)))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load configuration from {path} for profile {profile}"))
    }

    fn base(path: &str) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}

/// `<dir>/<stem>.<profile>.toml` for a base config path.
fn profile_path(path: &str, profile: &str) -> std::path::PathBuf {
    let base = Path::new(path);
    let stem = base
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Config");
    base.with_file_name(format!("{stem}.{profile}.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::levels::FlipSearch;
    use figment::Jail;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_apply_without_files() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load().expect("defaults should load");
            assert_eq!(config, AppConfig::default());
            assert_eq!(config.analysis.contract_multiplier, dec!(100));
            assert_eq!(config.source.cache_ttl_secs, 300);
            Ok(())
        });
    }

    #[test]
    fn toml_and_env_override_defaults() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/Config.toml",
                r#"
                [analysis]
                display_range_pct = 0.1

                [analysis.classifier]
                flip_search = "nearest_to_spot"

                [source]
                default_symbol = "QQQ"
                "#,
            )?;
            jail.set_env("GEX_SOURCE__CACHE_TTL_SECS", "60");

            let config = ConfigLoader::load().expect("config should load");
            assert_eq!(config.analysis.display_range_pct, dec!(0.1));
            assert_eq!(config.analysis.classifier.flip_search, FlipSearch::NearestToSpot);
            assert_eq!(config.source.default_symbol, "QQQ");
            assert_eq!(config.source.cache_ttl_secs, 60);
            Ok(())
        });
    }

    #[test]
    fn profile_overlay_wins_over_base_file() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file("config/Config.toml", "[source]\nexpiry_offset = 1\n")?;
            jail.create_file("config/Config.weekly.toml", "[source]\nexpiry_offset = 3\n")?;

            let config = ConfigLoader::load_with_profile("config/Config.toml", "weekly")
                .expect("config should load");
            assert_eq!(config.source.expiry_offset, 3);
            Ok(())
        });
    }

    #[test]
    fn profile_overlay_follows_custom_base_path() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_dir("alt")?;
            jail.create_file("config/Config.toml", "[source]\ndefault_symbol = \"SPY\"\n")?;
            jail.create_file("alt/gex.toml", "[source]\ndefault_symbol = \"QQQ\"\nexpiry_offset = 1\n")?;
            jail.create_file("alt/gex.weekly.toml", "[source]\nexpiry_offset = 4\n")?;

            let config =
                ConfigLoader::load_with_profile("alt/gex.toml", "weekly").expect("config should load");
            assert_eq!(config.source.default_symbol, "QQQ");
            assert_eq!(config.source.expiry_offset, 4);
            Ok(())
        });
    }

    #[test]
    fn profile_path_sits_next_to_base_file() {
        assert_eq!(
            profile_path("config/Config.toml", "weekly"),
            Path::new("config/Config.weekly.toml")
        );
        assert_eq!(profile_path("gex.toml", "prod"), Path::new("gex.prod.toml"));
    }
}
