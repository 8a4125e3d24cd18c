use std::path::PathBuf;

use crate::models::TransitionMode;
use crate::safety::{normalize_language, SafetyError};

/// Application-level constants
pub const APP_NAME: &str = "hrt-safety";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Language used when none is configured. Matches the bundled manifest.
pub const DEFAULT_LANGUAGE: &str = "ko";

/// Directory holding an external knowledge base.
pub const ENV_KB_DIR: &str = "HRT_SAFETY_KB_DIR";
/// Two-letter language code for localized output.
pub const ENV_LANG: &str = "HRT_SAFETY_LANG";
/// `mtf` or `ftm`.
pub const ENV_MODE: &str = "HRT_SAFETY_MODE";

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    "hrt_safety=info,warn"
}

/// External knowledge-base directory from the environment, if set.
pub fn knowledge_base_dir() -> Option<PathBuf> {
    knowledge_base_dir_from(|key| std::env::var(key).ok())
}

fn knowledge_base_dir_from(lookup: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
    lookup(ENV_KB_DIR)
        .filter(|dir| !dir.trim().is_empty())
        .map(PathBuf::from)
}

/// Construction-time choices of an engine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Normalized two-letter code.
    pub language: String,
    pub mode: TransitionMode,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            mode: TransitionMode::default(),
        }
    }
}

impl EngineSettings {
    pub fn new(language: &str, mode: TransitionMode) -> Self {
        let language = normalize_language(language);
        Self {
            language: if language.is_empty() {
                DEFAULT_LANGUAGE.to_string()
            } else {
                language
            },
            mode,
        }
    }

    /// Defaults overridden by `HRT_SAFETY_LANG` and `HRT_SAFETY_MODE`.
    pub fn from_env() -> Result<Self, SafetyError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SafetyError> {
        let defaults = Self::default();
        let language = lookup(ENV_LANG).unwrap_or(defaults.language);
        let mode = match lookup(ENV_MODE) {
            Some(raw) if !raw.trim().is_empty() => {
                raw.trim().to_lowercase().parse::<TransitionMode>()?
            }
            _ => defaults.mode,
        };
        Ok(Self::new(&language, mode))
    }
}
