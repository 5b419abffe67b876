use std::path::{Path, PathBuf};

use env_flags::env_flags;
use serde::Deserialize;

use crate::error::{ConvertError, Result};

pub const HOME_DIR_NAME: &str = ".agentport";
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Default, Deserialize)]
pub struct UserConfig {
    pub logging: Option<LoggingCfg>,
    pub convert: Option<ConvertCfg>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoggingCfg {
    pub to_file: Option<bool>,
    pub dir: Option<String>,
    pub json: Option<bool>,
    pub compact: Option<bool>,
    pub pretty: Option<bool>,
    pub level: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConvertCfg {
    pub tables_file: Option<String>, // TOML overlay for the inference tables
    pub index_name: Option<String>,
    pub groups_dir: Option<String>,
    pub definitions_dir: Option<String>,
    pub concurrency: Option<usize>,
    pub describe_from_body: Option<bool>,
}

/// `$AGENTPORT_HOME`, else `$HOME/.agentport`, else `./.agentport`.
pub fn agentport_home() -> PathBuf {
    env_flags! {
        /// Base directory for config.toml and logs.
        AGENTPORT_HOME: &str = "";
    }
    home_from(*AGENTPORT_HOME)
}

fn home_from(configured: &str) -> PathBuf {
    if !configured.is_empty() {
        return expand_home(configured);
    }
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(HOME_DIR_NAME),
        Err(_) => std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(HOME_DIR_NAME),
    }
}

pub fn load_user_config(home: &Path) -> Result<Option<UserConfig>> {
    let path = home.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let s = std::fs::read_to_string(&path).map_err(|source| ConvertError::Read {
        path: path.clone(),
        source,
    })?;
    let cfg: UserConfig = toml::from_str(&s)?;
    Ok(Some(cfg))
}

pub fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Ok(home) = std::env::var("HOME")
    {
        return PathBuf::from(home).join(stripped);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_both_sections() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
[logging]
level = "debug"
json = true

[convert]
tables_file = "~/tables.toml"
concurrency = 2
describe_from_body = true
"#,
        )
        .unwrap();
        let cfg = load_user_config(dir.path()).unwrap().unwrap();
        assert_eq!(cfg.logging.unwrap().level.as_deref(), Some("debug"));
        let convert = cfg.convert.unwrap();
        assert_eq!(convert.concurrency, Some(2));
        assert_eq!(convert.describe_from_body, Some(true));
        assert!(convert.index_name.is_none());
    }

    #[test]
    fn missing_config_is_none_and_bad_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_user_config(dir.path()).unwrap().is_none());
        std::fs::write(dir.path().join(CONFIG_FILE), "[logging\n").unwrap();
        assert!(matches!(
            load_user_config(dir.path()),
            Err(ConvertError::Tables(_))
        ));
    }

    #[test]
    fn configured_home_wins_over_the_default() {
        assert_eq!(home_from("/srv/agentport"), PathBuf::from("/srv/agentport"));
        assert!(home_from("").ends_with(HOME_DIR_NAME));
    }

    #[test]
    fn expand_home_leaves_plain_paths_alone() {
        assert_eq!(expand_home("/tmp/x"), PathBuf::from("/tmp/x"));
        assert_eq!(expand_home("rel/x"), PathBuf::from("rel/x"));
    }
}
