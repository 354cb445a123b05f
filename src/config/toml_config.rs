use crate::domain::model::Encoding;
use crate::utils::error::{Result, SantaError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub remote: Option<RemoteConfig>,
    pub export: Option<ExportConfig>,
    pub session: Option<SessionConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    pub output_path: Option<String>,
    pub formats: Option<Vec<Encoding>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub year: Option<i32>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SantaError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SANTA_API})，找不到的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SantaError::ConfigError {
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.remote.as_ref()?.endpoint.as_deref()
    }

    pub fn timeout_seconds(&self) -> Option<u64> {
        self.remote.as_ref()?.timeout_seconds
    }

    pub fn output_path(&self) -> Option<&str> {
        self.export.as_ref()?.output_path.as_deref()
    }

    pub fn formats(&self) -> Option<&[Encoding]> {
        self.export.as_ref()?.formats.as_deref()
    }

    pub fn year(&self) -> Option<i32> {
        self.session.as_ref()?.year
    }
}
