pub mod external;
pub mod native;
pub mod voice;

pub use external::{find_fallback_command, ExternalCommand};
pub use native::NativeEngine;
pub use voice::{choose_voice, VoiceInfo, VoiceTier};

use crate::error::SpeechError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum SpeechMode {
    /// Block until the utterance has been spoken
    Sync,
    /// Start speaking and return immediately
    Async,
}

/// A concrete way of producing audio.
pub trait SpeechEngine {
    fn name(&self) -> &str;

    fn speak(&mut self, text: &str, mode: SpeechMode) -> Result<(), SpeechError>;

    /// Block until every utterance started in async mode has finished.
    fn wait(&mut self) -> Result<(), SpeechError> {
        Ok(())
    }
}

/// Best-effort speech as seen by the drill. Never fails.
pub trait Speak {
    fn speak(&mut self, text: &str, mode: SpeechMode);
}

/// Voice overrides supplied through configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpeechSettings {
    /// Native voice id to force, bypassing the ranked search
    pub voice_id: Option<String>,
    /// Voice name handed to the fallback command
    pub fallback_voice: Option<String>,
}

/// Outcome of voice resolution, fixed for the rest of the run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceSelection {
    pub engine_available: bool,
    pub chosen_voice_id: Option<String>,
    pub fallback_command: Option<String>,
}

/// Decide which voice and fallback to use.
///
/// `native_voices` is `None` when no native engine could be started.
pub fn resolve_voice(
    settings: &SpeechSettings,
    native_voices: Option<&[VoiceInfo]>,
    fallback_command: Option<String>,
) -> VoiceSelection {
    let chosen = native_voices.and_then(|voices| choose_voice(voices, settings.voice_id.as_deref()));

    if let Some(picked) = chosen {
        let tier = voice::tier(picked).map(|t| t.to_string()).unwrap_or_else(|| "forced".into());
        tracing::info!(voice = %picked.id, %tier, "using speech engine voice");
    } else if native_voices.is_some() {
        tracing::warn!("no English voice found; using the system default voice");
    }

    VoiceSelection {
        engine_available: native_voices.is_some(),
        chosen_voice_id: chosen.map(|v| v.id.clone()),
        fallback_command,
    }
}

/// Spoken name for a single typed character
pub fn spoken_char(c: char) -> String {
    match c {
        ' ' => "space".to_string(),
        '-' => "dash".to_string(),
        '\'' => "apostrophe".to_string(),
        '.' => "dot".to_string(),
        c if c.is_uppercase() => format!("capital {c}"),
        c => c.to_string(),
    }
}

/// Speech with the native engine first and the external command behind it
pub struct SpeechOutput {
    selection: VoiceSelection,
    primary: Option<Box<dyn SpeechEngine>>,
    fallback: Option<Box<dyn SpeechEngine>>,
    primary_failures: usize,
    fallback_failures: usize,
    warned_fallback: bool,
    warned_silent: bool,
}

impl SpeechOutput {
    pub fn new(
        selection: VoiceSelection,
        primary: Option<Box<dyn SpeechEngine>>,
        fallback: Option<Box<dyn SpeechEngine>>,
    ) -> Self {
        Self {
            selection,
            primary,
            fallback,
            primary_failures: 0,
            fallback_failures: 0,
            warned_fallback: false,
            warned_silent: false,
        }
    }

    /// Probe the platform engine and `PATH`, then resolve the voice once.
    pub fn init(settings: &SpeechSettings) -> Self {
        let native = match NativeEngine::new() {
            Ok(engine) => Some(engine),
            Err(err) => {
                tracing::debug!("{err}");
                None
            }
        };
        let voices = native.as_ref().and_then(|engine| match engine.voices() {
            Ok(voices) => Some(voices),
            Err(err) => {
                tracing::warn!("cannot list voices: {err}");
                None
            }
        });

        let path = std::env::var_os("PATH").unwrap_or_default();
        let selection = resolve_voice(settings, voices.as_deref(), find_fallback_command(&path));

        let primary = native.and_then(|mut engine| {
            if !selection.engine_available {
                return None;
            }
            if let Some(id) = &selection.chosen_voice_id {
                if let Err(err) = engine.set_voice(id) {
                    tracing::warn!("{err}; keeping the default voice");
                }
            }
            Some(Box::new(engine) as Box<dyn SpeechEngine>)
        });
        let fallback = selection.fallback_command.as_ref().map(|program| {
            Box::new(ExternalCommand::with_default_voice(
                program.clone(),
                settings.fallback_voice.clone(),
            )) as Box<dyn SpeechEngine>
        });

        Self::new(selection, primary, fallback)
    }

    /// Speech that only logs; used when audio is not wanted.
    pub fn silent() -> Self {
        let mut out = Self::new(VoiceSelection::default(), None, None);
        out.warned_silent = true;
        out
    }

    fn speak_fallback(&mut self, text: &str, mode: SpeechMode) {
        let Some(fallback) = self.fallback.as_mut() else {
            if !self.warned_silent {
                tracing::warn!("no speech engine available; continuing without audio");
                self.warned_silent = true;
            }
            return;
        };

        if self.primary.is_none() && !self.warned_fallback {
            tracing::warn!("native speech unavailable; using slower `{}`", fallback.name());
            self.warned_fallback = true;
        }

        if let Err(err) = fallback.speak(text, mode) {
            if self.fallback_failures == 0 {
                tracing::warn!("{err}; continuing without audio");
            } else {
                tracing::debug!("{err}");
            }
            self.fallback_failures += 1;
        }
    }
}

impl Speak for SpeechOutput {
    fn speak(&mut self, text: &str, mode: SpeechMode) {
        tracing::trace!(%mode, text, "speak");

        if let Some(engine) = self.primary.as_mut() {
            match engine.speak(text, mode) {
                Ok(()) => return,
                Err(err) => {
                    if self.primary_failures == 0 {
                        tracing::warn!("{err}; retrying with the fallback command");
                    } else {
                        tracing::debug!("{err}");
                    }
                    self.primary_failures += 1;
                }
            }
        }

        self.speak_fallback(text, mode);
    }
}

impl std::fmt::Debug for SpeechOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechOutput")
            .field("selection", &self.selection)
            .field("primary", &self.primary.as_ref().map(|e| e.name().to_string()))
            .field("fallback", &self.fallback.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}
