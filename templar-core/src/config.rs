//! Process configuration.
//!
//! Layered with figment, lowest priority first:
//!
//! 1. built-in defaults (branch names, HTTP timeout)
//! 2. `<home>/.templar/config.yaml`, or an explicit path
//! 3. `TEMPLAR_<SECTION>__<KEY>` variables, e.g. `TEMPLAR_HTTP__TIMEOUT_SECS`
//! 4. the secret shorthands below
//!
//! | Variable                | Overrides             |
//! |-------------------------|-----------------------|
//! | `TEMPLAR_REPO_TOKEN`    | `repository.token`    |
//! | `TEMPLAR_LAB_PASSWORD`  | `lab.password`        |
//! | `TEMPLAR_PROD_PASSWORD` | `prod.password`       |
//! | `TEMPLAR_NOTIFY_TOKEN`  | `notify.token`        |

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::store::{records_path_at, templar_root};

pub const DEFAULT_BASE_BRANCH: &str = "main";
pub const DEFAULT_DEV_BRANCH: &str = "development";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const SECRET_VARS: [(&str, &str); 4] = [
    ("TEMPLAR_REPO_TOKEN", "repository.token"),
    ("TEMPLAR_LAB_PASSWORD", "lab.password"),
    ("TEMPLAR_PROD_PASSWORD", "prod.password"),
    ("TEMPLAR_NOTIFY_TOKEN", "notify.token"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub repository: RepositoryConfig,
    pub lab: ControllerConfig,
    pub prod: ControllerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify: Option<NotifyConfig>,
    #[serde(default)]
    pub http: HttpConfig,
}

/// Repository host API, e.g. `https://api.github.com/repos/<owner>/<repo>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub base_url: String,
    #[serde(default)]
    pub token: String,
    pub base_branch: String,
    pub dev_branch: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub base_url: String,
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Defaults to `<home>/.templar/records.yaml`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub webhook_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request deadline for every remote call.
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `<home>/.templar/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    templar_root(home).join("config.yaml")
}

impl Config {
    /// Load `<home>/.templar/config.yaml` with process environment overrides.
    pub fn load_at(home: &Path) -> Result<Self, ConfigError> {
        Self::load_from(&config_path_at(home))
    }

    /// `load_at` convenience wrapper.
    pub fn load() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Self::load_at(&home)
    }

    /// Load an explicit config file with process environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let config: Config = Self::figment(path)
            .extract()
            .map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: Box::new(e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// The provider chain behind [`Config::load_from`].
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::default(
            "repository.base_branch",
            DEFAULT_BASE_BRANCH,
        ))
        .merge(Serialized::default(
            "repository.dev_branch",
            DEFAULT_DEV_BRANCH,
        ))
        .merge(Serialized::default("http.timeout_secs", DEFAULT_TIMEOUT_SECS))
        .merge(Yaml::file(path))
        .merge(Env::prefixed("TEMPLAR_").split("__"))
        .merge(secret_env())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        require_url("repository.base_url", &self.repository.base_url)?;
        require("repository.token", &self.repository.token)?;
        require("repository.base_branch", &self.repository.base_branch)?;
        require("repository.dev_branch", &self.repository.dev_branch)?;
        if self.repository.base_branch == self.repository.dev_branch {
            return Err(ConfigError::Invalid {
                field: "repository.dev_branch",
                reason: "must differ from base_branch".to_string(),
            });
        }
        require_url("lab.base_url", &self.lab.base_url)?;
        require("lab.username", &self.lab.username)?;
        require("lab.password", &self.lab.password)?;
        require_url("prod.base_url", &self.prod.base_url)?;
        require("prod.username", &self.prod.username)?;
        require("prod.password", &self.prod.password)?;
        if let Some(notify) = &self.notify {
            require_url("notify.webhook_url", &notify.webhook_url)?;
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "http.timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Record store location, falling back to `<home>/.templar/records.yaml`.
    pub fn store_path(&self, home: &Path) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| records_path_at(home))
    }
}

/// Map the secret shorthands onto their config keys.
fn secret_env() -> Env {
    Env::raw().filter_map(|key| {
        SECRET_VARS
            .iter()
            .find(|(var, _)| key == *var)
            .map(|(_, field)| (*field).into())
    })
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing { field });
    }
    Ok(())
}

fn require_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    require(field, value)?;
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::Invalid {
            field,
            reason: format!("expected an http(s) URL, got '{value}'"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    const YAML: &str = r#"
repository:
  base_url: https://api.github.com/repos/netops/templates
  token: ghp_file
lab:
  base_url: https://lab.example.net
  username: admin
  password: lab-secret
prod:
  base_url: https://prod.example.net
  username: admin
"#;

    fn load(jail: &mut Jail, yaml: &str) -> figment::error::Result<Result<Config, ConfigError>> {
        jail.create_file("config.yaml", yaml)?;
        Ok(Config::load_from(Path::new("config.yaml")))
    }

    #[test]
    fn defaults_fill_branches_and_timeout() {
        Jail::expect_with(|jail| {
            jail.set_env("TEMPLAR_PROD_PASSWORD", "p");
            let config = load(jail, YAML)?.map_err(|e| e.to_string())?;
            assert_eq!(config.repository.base_branch, "main");
            assert_eq!(config.repository.dev_branch, "development");
            assert_eq!(config.http.timeout_secs, 30);
            assert!(config.notify.is_none());
            Ok(())
        });
    }

    #[test]
    fn missing_secret_is_reported_by_field() {
        Jail::expect_with(|jail| {
            let err = load(jail, YAML)?.unwrap_err();
            assert!(matches!(err, ConfigError::Missing { field: "prod.password" }));
            Ok(())
        });
    }

    #[test]
    fn secret_shorthands_override_file_values() {
        Jail::expect_with(|jail| {
            jail.set_env("TEMPLAR_REPO_TOKEN", "ghp_env");
            jail.set_env("TEMPLAR_PROD_PASSWORD", "prod-secret");
            let config = load(jail, YAML)?.map_err(|e| e.to_string())?;
            assert_eq!(config.repository.token, "ghp_env");
            assert_eq!(config.prod.password, "prod-secret");
            assert_eq!(config.lab.password, "lab-secret");
            Ok(())
        });
    }

    #[test]
    fn nested_variables_override_any_key() {
        Jail::expect_with(|jail| {
            jail.set_env("TEMPLAR_PROD__PASSWORD", "p");
            jail.set_env("TEMPLAR_HTTP__TIMEOUT_SECS", "5");
            jail.set_env("TEMPLAR_REPOSITORY__DEV_BRANCH", "staging");
            let config = load(jail, YAML)?.map_err(|e| e.to_string())?;
            assert_eq!(config.http.timeout_secs, 5);
            assert_eq!(config.repository.dev_branch, "staging");
            assert_eq!(config.prod.password, "p");
            Ok(())
        });
    }

    #[test]
    fn notify_token_without_webhook_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("TEMPLAR_PROD_PASSWORD", "p");
            jail.set_env("TEMPLAR_NOTIFY_TOKEN", "bot");
            let err = load(jail, YAML)?.unwrap_err();
            assert!(matches!(err, ConfigError::Missing { field: "notify.webhook_url" }));
            Ok(())
        });
    }

    #[test]
    fn malformed_yaml_names_the_file() {
        Jail::expect_with(|jail| {
            let err = load(jail, "repository: [unclosed\n")?.unwrap_err();
            assert!(matches!(err, ConfigError::Parse { .. }));
            assert!(err.to_string().contains("config.yaml"));
            Ok(())
        });
    }

    #[test]
    fn store_path_defaults_under_home() {
        Jail::expect_with(|jail| {
            jail.set_env("TEMPLAR_PROD_PASSWORD", "p");
            let config = load(jail, YAML)?.map_err(|e| e.to_string())?;
            let home = Path::new("/home/ops");
            assert_eq!(
                config.store_path(home),
                PathBuf::from("/home/ops/.templar/records.yaml")
            );
            Ok(())
        });
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let err = Config::load_at(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }
}
