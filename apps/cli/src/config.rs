use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const CONFIG_DIR_ENV: &str = "FOLIO_CONFIG_DIR";
const CONFIG_DIR_NAME: &str = "folio";
const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_PORT: u16 = 3845;
const DEFAULT_GITHUB_USER: &str = "shokace";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub port: u16,
    pub github_user: String,
    pub upstream_timeout_secs: u64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            github_user: DEFAULT_GITHUB_USER.to_string(),
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: CliConfig,
    pub paths: ConfigPaths,
    pub created: bool,
}

pub fn load_or_create() -> Result<ConfigLoad, String> {
    let dir = config_dir(|name| std::env::var(name).ok())?;
    fs::create_dir_all(&dir)
        .map_err(|err| format!("create config dir {}: {}", dir.display(), err))?;
    let file = dir.join(CONFIG_FILE_NAME);
    let paths = ConfigPaths { file };

    if paths.file.exists() {
        let contents = fs::read_to_string(&paths.file)
            .map_err(|err| format!("read config {}: {}", paths.file.display(), err))?;
        let config = parse_config(&contents)
            .map_err(|err| format!("parse config {}: {}", paths.file.display(), err))?;
        return Ok(ConfigLoad {
            config,
            paths,
            created: false,
        });
    }

    let config = CliConfig::default();
    let contents =
        toml::to_string_pretty(&config).map_err(|err| format!("serialize config: {}", err))?;
    fs::write(&paths.file, contents)
        .map_err(|err| format!("write config {}: {}", paths.file.display(), err))?;

    Ok(ConfigLoad {
        config,
        paths,
        created: true,
    })
}

fn parse_config(contents: &str) -> Result<CliConfig, toml::de::Error> {
    toml::from_str(contents)
}

fn config_dir(lookup: impl Fn(&str) -> Option<String>) -> Result<PathBuf, String> {
    if let Some(dir) = lookup(CONFIG_DIR_ENV).filter(|dir| !dir.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = lookup("HOME").ok_or_else(|| "resolve HOME: not set".to_string())?;
    Ok(PathBuf::from(home).join(".config").join(CONFIG_DIR_NAME))
}
