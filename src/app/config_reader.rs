use crate::app::*;
use crate::args::Args;

use serde::{Deserialize, Serialize};

pub const DEFAULT_STORAGE_PATH: &str = "feelmeter_storage.json";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin";

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeelConfig {
    #[serde(rename = "storagePath")]
    pub storage_path: Option<String>,
    #[serde(rename = "adminPassword")]
    pub admin_password: Option<String>,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "defaultCategory")]
    pub default_category: Option<String>,
    #[serde(rename = "defaultDurationDays")]
    pub default_duration_days: Option<u32>,
}

pub fn read_config(path: &Path) -> AppResult<FeelConfig> {
    let contents = fs::read_to_string(path).context(OpeningConfigSnafu { path })?;
    let config: FeelConfig =
        serde_json::from_str(&contents).context(ParsingConfigSnafu { path })?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// The effective settings, once the command line and the configuration file are merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Settings {
    pub storage_path: PathBuf,
    pub admin_password: String,
    pub user_id: Option<String>,
    pub default_category: String,
    pub default_duration_days: u32,
}

impl Settings {
    /// `config_dir` is the directory of the configuration file, against which a relative
    /// storage path is resolved.
    pub fn resolve(config: &FeelConfig, config_dir: Option<&Path>, args: &Args) -> Settings {
        let storage_path = match (&args.storage, &config.storage_path, config_dir) {
            (Some(p), _, _) => PathBuf::from(p),
            (None, Some(p), Some(dir)) if Path::new(p).is_relative() => dir.join(p),
            (None, Some(p), _) => PathBuf::from(p),
            (None, None, _) => PathBuf::from(DEFAULT_STORAGE_PATH),
        };
        Settings {
            storage_path,
            admin_password: config
                .admin_password
                .clone()
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.to_string()),
            user_id: args.user.clone().or_else(|| config.user_id.clone()),
            default_category: config
                .default_category
                .clone()
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            default_duration_days: config
                .default_duration_days
                .unwrap_or(DEFAULT_DURATION_DAYS),
        }
    }
}

/// Reads the configuration file named on the command line, if any, and merges it.
pub fn load_settings(args: &Args) -> AppResult<Settings> {
    match &args.config {
        Some(config_path) => {
            let p = Path::new(config_path);
            let config = read_config(p)?;
            let dir = p.parent().filter(|d| !d.as_os_str().is_empty());
            Ok(Settings::resolve(&config, dir, args))
        }
        None => Ok(Settings::resolve(&FeelConfig::default(), None, args)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::Command;

    fn args(storage: Option<&str>, user: Option<&str>) -> Args {
        Args {
            config: None,
            storage: storage.map(|s| s.to_string()),
            user: user.map(|s| s.to_string()),
            verbose: false,
            command: Command::Categories,
        }
    }

    #[test]
    fn defaults_without_config() {
        let s = Settings::resolve(&FeelConfig::default(), None, &args(None, None));
        assert_eq!(s.storage_path, PathBuf::from(DEFAULT_STORAGE_PATH));
        assert_eq!(s.admin_password, "admin");
        assert_eq!(s.user_id, None);
        assert_eq!(s.default_category, DEFAULT_CATEGORY);
        assert_eq!(s.default_duration_days, 7);
    }

    #[test]
    fn command_line_wins_over_file() {
        let config = FeelConfig {
            storage_path: Some("data/polls.json".to_string()),
            user_id: Some("from_file".to_string()),
            ..FeelConfig::default()
        };
        let dir = Path::new("/etc/feelmeter");
        let s = Settings::resolve(&config, Some(dir), &args(None, None));
        assert_eq!(s.storage_path, dir.join("data/polls.json"));
        assert_eq!(s.user_id.as_deref(), Some("from_file"));

        let s = Settings::resolve(&config, Some(dir), &args(Some("here.json"), Some("cli")));
        assert_eq!(s.storage_path, PathBuf::from("here.json"));
        assert_eq!(s.user_id.as_deref(), Some("cli"));
    }

    #[test]
    fn reads_camel_case_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feelmeter.json");
        fs::write(
            &path,
            r#"{"adminPassword": "s3cret", "defaultCategory": "সমাজ", "defaultDurationDays": 3}"#,
        )
        .unwrap();
        let config = read_config(&path).unwrap();
        assert_eq!(config.admin_password.as_deref(), Some("s3cret"));
        assert_eq!(config.default_duration_days, Some(3));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            read_config(&path),
            Err(AppError::ParsingConfig { .. })
        ));
        assert!(matches!(
            read_config(&dir.path().join("missing.json")),
            Err(AppError::OpeningConfig { .. })
        ));
    }
}
