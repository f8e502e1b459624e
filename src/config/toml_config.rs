use crate::adapters::gemini::{
    DEFAULT_ENDPOINT, DEFAULT_INSTRUCTION, DEFAULT_MODEL, DEFAULT_TIMEOUT_SECONDS,
};
use crate::config::{DEFAULT_STATE_DIR, MAX_TIMEOUT_SECONDS};
use crate::core::acquisition::DEFAULT_MAX_UPLOAD_BYTES;
use crate::core::ConfigProvider;
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::Validate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub ai: AiConfig,
    pub intake: Option<IntakeConfig>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AiConfig {
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntakeConfig {
    pub max_upload_bytes: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub state_dir: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarketError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarketError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${GEMINI_API_KEY})；找不到的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MarketError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 檔案裡沒有可用的金鑰時，改用命令列或 GEMINI_API_KEY 提供的金鑰
    pub fn with_fallback_api_key(mut self, api_key: Option<&str>) -> Self {
        if self.api_key().is_none() {
            if let Some(key) = api_key.filter(|key| !key.trim().is_empty()) {
                self.ai.api_key = Some(key.to_string());
            }
        }
        self
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        crate::utils::validation::validate_url("ai.endpoint", self.ai_endpoint())?;
        crate::utils::validation::validate_non_empty_string("ai.model", self.model())?;
        crate::utils::validation::validate_non_empty_string("ai.instruction", self.instruction())?;

        if let Some(timeout) = self.ai.timeout_seconds {
            crate::utils::validation::validate_range(
                "ai.timeout_seconds",
                timeout,
                1,
                MAX_TIMEOUT_SECONDS,
            )?;
        }

        crate::utils::validation::validate_positive_number(
            "intake.max_upload_bytes",
            self.max_upload_bytes(),
            1,
        )?;
        crate::utils::validation::validate_path("storage.state_dir", self.state_dir())?;

        Ok(())
    }
}

impl ConfigProvider for TomlConfig {
    fn ai_endpoint(&self) -> &str {
        self.ai.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    fn model(&self) -> &str {
        self.ai.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn api_key(&self) -> Option<&str> {
        // 未設定的環境變數會保留 ${...}，視同沒有金鑰
        self.ai
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty() && !key.starts_with("${"))
    }

    fn instruction(&self) -> &str {
        self.ai.instruction.as_deref().unwrap_or(DEFAULT_INSTRUCTION)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.ai.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS))
    }

    fn max_upload_bytes(&self) -> usize {
        self.intake
            .as_ref()
            .and_then(|i| i.max_upload_bytes)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES)
    }

    fn state_dir(&self) -> &str {
        self.storage
            .as_ref()
            .and_then(|s| s.state_dir.as_deref())
            .unwrap_or(DEFAULT_STATE_DIR)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
