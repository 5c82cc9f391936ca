use anyhow::{Context, Result, bail};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::llm::Provider;
use crate::state::ensure_tapix_home;

/// Keys stored in `~/.tapix/auth.json`. Environment variables take precedence.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuthState {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
}

impl AuthState {
    fn stored(&self, provider: Provider) -> Option<&str> {
        match provider {
            Provider::OpenAI => self.openai_api_key.as_deref(),
            Provider::Anthropic => self.anthropic_api_key.as_deref(),
            Provider::Offline => None,
        }
    }
}

fn auth_path() -> Result<PathBuf> {
    Ok(ensure_tapix_home()?.join("auth.json"))
}

pub fn load_auth() -> Result<AuthState> {
    load_auth_from(&auth_path()?)
}

pub fn load_auth_from(p: &Path) -> Result<AuthState> {
    if !p.exists() {
        return Ok(AuthState::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

/// A corrupt or unreachable key store is treated as empty; environment keys still apply
pub fn auth_or_default(loaded: Result<AuthState>) -> (AuthState, Option<String>) {
    match loaded {
        Ok(auth) => (auth, None),
        Err(e) => {
            warn!("ignoring stored keys: {e:#}");
            (
                AuthState::default(),
                Some(format!("Ignoring stored keys ({e:#}); set an API key environment variable or run `tapix auth`.")),
            )
        }
    }
}

pub fn save_auth_to(auth: &AuthState, p: &Path) -> Result<()> {
    let s = serde_json::to_string_pretty(auth)?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Env var named by `api_key_env` (or the provider's default) first, then the stored key.
/// Blank values count as absent.
pub fn resolve_api_key(
    provider: Provider,
    api_key_env: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
    auth: &AuthState,
) -> Option<String> {
    if provider == Provider::Offline {
        return None;
    }
    let var = api_key_env.or(provider.key_env())?;
    env(var)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| {
            auth.stored(provider)
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
}

fn prompt_secret(label: &str) -> Result<String> {
    print!("{label}: ");
    io::stdout().flush().ok();
    let mut s = String::new();
    io::stdin().read_line(&mut s)?;
    Ok(s.trim().to_string())
}

pub fn openai_paste_api_key() -> Result<()> {
    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    let key = prompt_secret("Paste OpenAI API key (starts with sk-)")?;
    if !key.starts_with("sk-") {
        bail!("key didn't look like an OpenAI API key (expected prefix sk-)");
    }
    auth.openai_api_key = Some(key);
    save_auth_to(&auth, &p)?;
    println!("Saved OpenAI API key to {}", p.display());
    Ok(())
}

pub fn anthropic_paste_api_key() -> Result<()> {
    let p = auth_path()?;
    let mut auth = load_auth_from(&p)?;
    let key = prompt_secret("Paste Anthropic API key (starts with sk-ant-)")?;
    if !key.starts_with("sk-ant-") {
        bail!("key didn't look like an Anthropic key (expected prefix sk-ant-)");
    }
    auth.anthropic_api_key = Some(key);
    save_auth_to(&auth, &p)?;
    println!("Saved Anthropic API key to {}", p.display());
    Ok(())
}

/// Print which providers have a usable key, without revealing it
pub fn print_status(api_key_env: Option<&str>) -> Result<()> {
    let (auth, notice) = auth_or_default(load_auth());
    if let Some(n) = notice {
        println!("note: {n}");
    }
    for provider in [Provider::OpenAI, Provider::Anthropic] {
        let state = match resolve_api_key(provider, api_key_env, crate::config::process_env, &auth) {
            Some(k) => format!("configured ({})", mask(&k)),
            None => "not configured".to_string(),
        };
        println!("{:<10} {state}", provider.as_str());
    }
    Ok(())
}

fn mask(key: &str) -> String {
    let tail: String = key.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    format!("…{tail}")
}
