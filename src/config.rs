use crate::app_dirs::AppDirs;
use crate::speech::SpeechSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_ROUNDS: usize = 10;

/// Forces a native voice id
pub const VOICE_ID_ENV: &str = "SPELL_GYM_VOICE_ID";
/// Forces the fallback command's voice name
pub const SAY_VOICE_ENV: &str = "SPELL_GYM_SAY_VOICE";
/// Word list directory
pub const LISTS_ENV: &str = "SPELL_GYM_LISTS";

/// Optional preferences stored on disk. Every field may be absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub rounds: Option<usize>,
    pub lists_dir: Option<PathBuf>,
    pub voice_id: Option<String>,
    pub fallback_voice: Option<String>,
}

impl From<&Settings> for Config {
    fn from(s: &Settings) -> Self {
        Self {
            rounds: Some(s.rounds),
            lists_dir: Some(s.lists_dir.clone()),
            voice_id: s.speech.voice_id.clone(),
            fallback_voice: s.speech.fallback_voice.clone(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!("ignoring malformed config {}: {err}", self.path.display());
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub count: Option<String>,
    pub lists: Option<PathBuf>,
}

/// Everything a run needs, resolved once at startup
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub rounds: usize,
    pub lists_dir: PathBuf,
    pub speech: SpeechSettings,
}

/// Parse a word count; anything that is not a positive integer is rejected.
pub fn parse_round_count(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok().filter(|n| *n > 0)
}

impl Settings {
    /// Merge sources with precedence command line > environment > file > defaults.
    pub fn resolve<E>(cli: &CliOverrides, lookup: E, file: &Config) -> Self
    where
        E: Fn(&str) -> Option<String>,
    {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let cli_rounds = cli.count.as_deref().and_then(|raw| {
            let parsed = parse_round_count(raw);
            if parsed.is_none() {
                tracing::warn!("word count '{raw}' is not a positive integer; using the default");
            }
            parsed
        });
        let rounds = cli_rounds
            .or(file.rounds.filter(|n| *n > 0))
            .unwrap_or(DEFAULT_ROUNDS);

        let lists_dir = cli
            .lists
            .clone()
            .or_else(|| env(LISTS_ENV).map(PathBuf::from))
            .or_else(|| file.lists_dir.clone())
            .unwrap_or_else(AppDirs::default_lists_dir);

        let speech = SpeechSettings {
            voice_id: env(VOICE_ID_ENV).or_else(|| file.voice_id.clone()),
            fallback_voice: env(SAY_VOICE_ENV).or_else(|| file.fallback_voice.clone()),
        };

        Self {
            rounds,
            lists_dir,
            speech,
        }
    }
}
