use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tapix_core::GenerationOptions;
use tapix_core::dispatch::{DEFAULT_HISTORY_WINDOW, DEFAULT_MAX_TOKENS};
use tapix_ingest::LoadOptions;

use crate::llm::Provider;
use crate::state::ensure_tapix_home;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub llm: LlmSection,
    pub chat: ChatSection,
    pub data: DataSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LlmSection {
    pub provider: Provider,
    /// Falls back to the provider's default model when unset
    pub model: Option<String>,
    /// Endpoint root; the provider's public API when unset
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
    /// Environment variable holding the API key (default depends on provider)
    pub api_key_env: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatSection {
    pub max_turns_context: usize,
    pub recent_transactions: usize,
    /// "midnight" or "daylight"
    pub theme: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DataSection {
    /// Default transaction file; the bundled sample is used when unset
    pub csv: Option<PathBuf>,
    pub currency_symbol: String,
    /// Set for exports where spending is positive
    pub invert_amounts: bool,
    pub delimiter: Option<char>,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: Provider::OpenAI,
            model: None,
            base_url: None,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.4,
            timeout_secs: 30,
            api_key_env: None,
        }
    }
}

impl Default for ChatSection {
    fn default() -> Self {
        Self {
            max_turns_context: DEFAULT_HISTORY_WINDOW,
            recent_transactions: tapix_core::RECENT_LIMIT,
            theme: "midnight".to_string(),
        }
    }
}

impl Default for DataSection {
    fn default() -> Self {
        Self {
            csv: None,
            currency_symbol: "£".to_string(),
            invert_amounts: false,
            delimiter: None,
        }
    }
}

impl Config {
    /// Model precedence: `TAPIX_MODEL`, then `OPENAI_MODEL` (OpenAI only), then config, then provider default
    pub fn effective_model(&self, env: impl Fn(&str) -> Option<String>) -> String {
        let from_env = env("TAPIX_MODEL").or_else(|| {
            if self.llm.provider == Provider::OpenAI {
                env("OPENAI_MODEL")
            } else {
                None
            }
        });
        from_env
            .filter(|m| !m.trim().is_empty())
            .or_else(|| self.llm.model.clone())
            .unwrap_or_else(|| self.llm.provider.default_model().to_string())
    }

    pub fn generation_options(&self, env: impl Fn(&str) -> Option<String>) -> GenerationOptions {
        GenerationOptions {
            model: self.effective_model(env),
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature as f32,
            timeout: Duration::from_secs(self.llm.timeout_secs.max(1)),
            history_window: self.chat.max_turns_context,
        }
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.data.delimiter.and_then(|c| u8::try_from(c).ok()),
            invert_amounts: self.data.invert_amounts,
        }
    }
}

/// Reads the process environment; tests pass their own lookup instead
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_tapix_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

/// An unreadable config never stops a session: log it, use the defaults and
/// return a notice for the UI
pub fn config_or_default(loaded: Result<Config>) -> (Config, Option<String>) {
    match loaded {
        Ok(cfg) => (cfg, None),
        Err(e) => {
            warn!("ignoring config: {e:#}");
            (Config::default(), Some(format!("Ignoring config ({e:#}); using defaults.")))
        }
    }
}

pub fn save_config_to(cfg: &Config, p: &Path) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config_to(&Config::default(), &p)?;
    println!("Wrote {}", p.display());
    Ok(())
}
