//! Platform speech synthesis through the `tts` crate (AVFoundation on macOS,
//! SAPI/WinRT on Windows). Other platforms report the engine as unavailable
//! and rely on the command-line fallback.

use super::voice::VoiceInfo;
use super::{SpeechEngine, SpeechMode};
use crate::error::SpeechError;

#[cfg(any(target_os = "macos", target_os = "windows"))]
mod imp {
    use super::*;
    use std::time::Duration;
    use tts::Tts;

    const POLL_INTERVAL: Duration = Duration::from_millis(10);

    fn engine_err(err: tts::Error) -> SpeechError {
        SpeechError::Engine(err.to_string())
    }

    pub struct NativeEngine {
        tts: Tts,
    }

    impl NativeEngine {
        pub fn new() -> Result<Self, SpeechError> {
            let tts = Tts::default().map_err(|e| SpeechError::EngineUnavailable(e.to_string()))?;
            Ok(Self { tts })
        }

        pub fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
            let voices = self.tts.voices().map_err(engine_err)?;
            Ok(voices
                .iter()
                .map(|v| VoiceInfo::new(v.id(), v.name(), v.language().to_string()))
                .collect())
        }

        pub fn set_voice(&mut self, id: &str) -> Result<(), SpeechError> {
            let voices = self.tts.voices().map_err(engine_err)?;
            let voice = voices
                .iter()
                .find(|v| v.id() == id)
                .ok_or_else(|| SpeechError::Engine(format!("voice '{id}' disappeared")))?;
            self.tts.set_voice(voice).map_err(engine_err)
        }
    }

    impl SpeechEngine for NativeEngine {
        fn name(&self) -> &str {
            "native"
        }

        fn speak(&mut self, text: &str, mode: SpeechMode) -> Result<(), SpeechError> {
            if mode == SpeechMode::Sync {
                self.wait()?;
            }
            self.tts.speak(text, false).map_err(engine_err)?;
            if mode == SpeechMode::Sync {
                self.wait()?;
            }
            Ok(())
        }

        fn wait(&mut self) -> Result<(), SpeechError> {
            // Backends without is_speaking support report an error; treat as idle.
            while self.tts.is_speaking().unwrap_or(false) {
                std::thread::sleep(POLL_INTERVAL);
            }
            Ok(())
        }
    }
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
mod imp {
    use super::*;

    pub struct NativeEngine {
        _private: (),
    }

    impl NativeEngine {
        pub fn new() -> Result<Self, SpeechError> {
            Err(SpeechError::EngineUnavailable(
                "no native speech engine on this platform".to_string(),
            ))
        }

        pub fn voices(&self) -> Result<Vec<VoiceInfo>, SpeechError> {
            Ok(Vec::new())
        }

        pub fn set_voice(&mut self, id: &str) -> Result<(), SpeechError> {
            Err(SpeechError::Engine(format!("cannot select voice '{id}'")))
        }
    }

    impl SpeechEngine for NativeEngine {
        fn name(&self) -> &str {
            "native"
        }

        fn speak(&mut self, _text: &str, _mode: SpeechMode) -> Result<(), SpeechError> {
            Err(SpeechError::EngineUnavailable(
                "no native speech engine on this platform".to_string(),
            ))
        }
    }
}

pub use imp::NativeEngine;

impl std::fmt::Debug for NativeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeEngine").finish_non_exhaustive()
    }
}

#[cfg(all(test, not(any(target_os = "macos", target_os = "windows"))))]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn unavailable_off_macos_and_windows() {
        assert_matches!(NativeEngine::new(), Err(SpeechError::EngineUnavailable(_)));
    }
}
