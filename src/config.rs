use crate::error::{HfServeError, Result};
use hf_serve_common::Tag;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// hfコマンド名を上書きする環境変数
pub const HF_COMMAND_ENV: &str = "HF_SERVE_HF";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// hfコマンド
    pub hf_command: String,
    /// hfコマンドの前に付ける固定引数（例: `uv run hf` の `run hf`）
    pub hf_args: Vec<String>,
    pub timeout_seconds: u64,
    pub cache_ttl_seconds: u64,
    /// 論理削除に使うタグ
    pub removed_tag: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default_config())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| HfServeError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("hf-serve").join("config.json"))
    }

    fn default_config() -> Self {
        Self {
            hf_command: "hf".into(),
            hf_args: Vec::new(),
            timeout_seconds: 10,
            cache_ttl_seconds: 300,
            removed_tag: hf_serve_common::REMOVED_TAG.into(),
        }
    }

    /// 実際に起動するhfコマンド（環境変数を優先）
    pub fn hf_command(&self) -> String {
        match std::env::var(HF_COMMAND_ENV) {
            Ok(cmd) if !cmd.trim().is_empty() => cmd,
            _ => self.hf_command.clone(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn removed_tag(&self) -> Result<Tag> {
        Tag::new(self.removed_tag.clone())
            .map_err(|e| HfServeError::Config(format!("removed_tag が不正: {}", e)))
    }

    pub fn set_hf_command(&mut self, command: String) -> Result<()> {
        if command.trim().is_empty() {
            return Err(HfServeError::Config("hfコマンドが空です".into()));
        }
        self.hf_command = command;
        self.save()
    }

    pub fn set_timeout(&mut self, seconds: u64) -> Result<()> {
        self.timeout_seconds = seconds;
        self.save()
    }

    pub fn set_cache_ttl(&mut self, seconds: u64) -> Result<()> {
        self.cache_ttl_seconds = seconds;
        self.save()
    }
}
