use super::{SpeechEngine, SpeechMode};
use crate::error::SpeechError;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};

/// Command-line synthesizers, in order of preference
pub const FALLBACK_COMMANDS: &[&str] = &["say", "espeak-ng", "espeak", "spd-say"];

/// Voice used with macOS `say` unless overridden
pub const DEFAULT_SAY_VOICE: &str = "Samantha";

/// First known synthesizer found on `path` (a `PATH`-style list).
pub fn find_fallback_command(path: &OsStr) -> Option<String> {
    FALLBACK_COMMANDS
        .iter()
        .find(|program| {
            std::env::split_paths(path)
                .filter(|dir| !dir.as_os_str().is_empty())
                .any(|dir| present_in(&dir, program))
        })
        .map(|program| program.to_string())
}

fn present_in(dir: &Path, program: &str) -> bool {
    let candidate = dir.join(program);
    if candidate.is_file() {
        return true;
    }
    cfg!(windows) && candidate.with_extension("exe").is_file()
}

/// A non-zero exit code, as opposed to death by signal (Ctrl-C reaches children too).
fn exited_with_error(status: ExitStatus) -> bool {
    status.code().is_some_and(|code| code != 0)
}

/// Speech through an external program such as `say` or `espeak-ng`
#[derive(Debug)]
pub struct ExternalCommand {
    program: String,
    voice: Option<String>,
    voice_rejected: bool,
    pending: Vec<Pending>,
}

/// An async utterance still playing, and whether it was given the voice flag
#[derive(Debug)]
struct Pending {
    child: Child,
    with_voice: bool,
}

impl ExternalCommand {
    pub fn new(program: impl Into<String>, voice: Option<String>) -> Self {
        Self {
            program: program.into(),
            voice: voice.filter(|v| !v.trim().is_empty()),
            voice_rejected: false,
            pending: Vec::new(),
        }
    }

    /// Fallback for `program` with its customary default voice.
    pub fn with_default_voice(program: impl Into<String>, voice: Option<String>) -> Self {
        let program = program.into();
        let voice = voice.or_else(|| (program == "say").then(|| DEFAULT_SAY_VOICE.to_string()));
        Self::new(program, voice)
    }

    pub fn voice(&self) -> Option<&str> {
        if self.voice_rejected {
            None
        } else {
            self.voice.as_deref()
        }
    }

    fn use_voice(&self) -> bool {
        self.voice.is_some() && !self.voice_rejected
    }

    fn command(&self, text: &str, mode: SpeechMode, with_voice: bool) -> Command {
        let mut cmd = Command::new(&self.program);
        let spd = Path::new(&self.program).file_name() == Some(OsStr::new("spd-say"));

        if let Some(voice) = self.voice.as_deref().filter(|_| with_voice) {
            cmd.arg(if spd { "-y" } else { "-v" }).arg(voice);
        }
        if spd && mode == SpeechMode::Sync {
            cmd.arg("-w");
        }

        // words such as "-ism" must not be read as options
        cmd.arg("--")
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }

    fn spawn_err(&self, source: std::io::Error) -> SpeechError {
        SpeechError::Spawn {
            program: self.program.clone(),
            source,
        }
    }

    fn reject_voice(&mut self) {
        if !self.voice_rejected {
            tracing::warn!(
                "voice '{}' unavailable for `{}`; using its default voice",
                self.voice.as_deref().unwrap_or_default(),
                self.program
            );
            self.voice_rejected = true;
        }
    }

    /// A failure with the voice flag set drops the voice; any other failure is reported.
    fn settle(&mut self, status: ExitStatus, with_voice: bool) -> Result<(), SpeechError> {
        if status.success() {
            Ok(())
        } else if with_voice && exited_with_error(status) {
            self.reject_voice();
            Ok(())
        } else {
            Err(SpeechError::Exit {
                program: self.program.clone(),
                status,
            })
        }
    }

    /// Collect async utterances that have finished, keeping the first failure.
    fn reap(&mut self) -> Result<(), SpeechError> {
        let mut outcome = Ok(());
        let mut still_playing = Vec::with_capacity(self.pending.len());
        for mut pending in std::mem::take(&mut self.pending) {
            let settled = match pending.child.try_wait() {
                Ok(None) => {
                    still_playing.push(pending);
                    continue;
                }
                Ok(Some(status)) => self.settle(status, pending.with_voice),
                Err(source) => Err(self.spawn_err(source)),
            };
            outcome = outcome.and(settled);
        }
        self.pending = still_playing;
        outcome
    }

    fn run(&self, text: &str, with_voice: bool) -> Result<ExitStatus, SpeechError> {
        self.command(text, SpeechMode::Sync, with_voice)
            .status()
            .map_err(|e| self.spawn_err(e))
    }
}

impl SpeechEngine for ExternalCommand {
    fn name(&self) -> &str {
        &self.program
    }

    fn speak(&mut self, text: &str, mode: SpeechMode) -> Result<(), SpeechError> {
        match mode {
            SpeechMode::Async => {
                let earlier = self.reap();
                let with_voice = self.use_voice();
                let child = self
                    .command(text, mode, with_voice)
                    .spawn()
                    .map_err(|e| self.spawn_err(e))?;
                self.pending.push(Pending { child, with_voice });
                earlier
            }
            SpeechMode::Sync => {
                let earlier = self.wait();
                let with_voice = self.use_voice();
                let mut status = self.run(text, with_voice)?;
                if with_voice && exited_with_error(status) {
                    self.reject_voice();
                    status = self.run(text, false)?;
                }
                self.settle(status, false).and(earlier)
            }
        }
    }

    fn wait(&mut self) -> Result<(), SpeechError> {
        let mut outcome = Ok(());
        for mut pending in std::mem::take(&mut self.pending) {
            let settled = match pending.child.wait() {
                Ok(status) => self.settle(status, pending.with_voice),
                Err(source) => Err(self.spawn_err(source)),
            };
            outcome = outcome.and(settled);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::ffi::OsString;
    use tempfile::tempdir;

    #[test]
    fn say_gets_samantha_by_default() {
        let say = ExternalCommand::with_default_voice("say", None);
        assert_eq!(say.voice(), Some("Samantha"));

        let espeak = ExternalCommand::with_default_voice("espeak-ng", None);
        assert_eq!(espeak.voice(), None);

        let custom = ExternalCommand::with_default_voice("say", Some("Daniel".into()));
        assert_eq!(custom.voice(), Some("Daniel"));
    }

    #[test]
    fn voice_flags_follow_the_program() {
        let say = ExternalCommand::new("say", Some("Alex".into()));
        let cmd = say.command("cat", SpeechMode::Sync, true);
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(args, ["-v", "Alex", "--", "cat"]);

        let spd = ExternalCommand::new("spd-say", Some("female1".into()));
        let cmd = spd.command("cat", SpeechMode::Sync, true);
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(args, ["-y", "female1", "-w", "--", "cat"]);

        let cmd = spd.command("cat", SpeechMode::Async, false);
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(args, ["--", "cat"]);
    }

    #[test]
    fn leading_dash_words_are_not_options() {
        let espeak = ExternalCommand::new("/usr/bin/espeak-ng", None);
        let cmd = espeak.command("-ism", SpeechMode::Async, false);
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert_eq!(args, ["--", "-ism"]);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let mut cmd = ExternalCommand::new("spell-gym-no-such-synth", None);
        assert_matches!(
            cmd.speak("hello", SpeechMode::Sync),
            Err(SpeechError::Spawn { .. })
        );
        assert_matches!(
            cmd.speak("hello", SpeechMode::Async),
            Err(SpeechError::Spawn { .. })
        );
    }

    #[test]
    fn finds_first_command_on_path() {
        let first = tempdir().unwrap();
        let second = tempdir().unwrap();
        std::fs::write(second.path().join("espeak"), "").unwrap();
        std::fs::write(first.path().join("spd-say"), "").unwrap();

        let path = std::env::join_paths([first.path(), second.path()]).unwrap();

        assert_eq!(find_fallback_command(&path), Some("espeak".to_string()));
    }

    #[test]
    fn empty_path_has_no_fallback() {
        assert_eq!(find_fallback_command(&OsString::new()), None);
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::PathBuf;
        use tempfile::TempDir;

        /// An `espeak` stand-in: `body` runs with `$last` set to the spoken text
        /// and `$LOG` naming a file it can append to.
        fn synth(body: &str) -> (TempDir, PathBuf, PathBuf) {
            let dir = tempdir().unwrap();
            let log = dir.path().join("spoken.log");
            let program = dir.path().join("espeak");
            let script = format!(
                "#!/bin/sh\nLOG='{}'\nfor last; do :; done\n{body}\n",
                log.display()
            );
            std::fs::write(&program, script).unwrap();
            std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
            (dir, program, log)
        }

        fn spoken(log: &Path) -> Vec<String> {
            std::fs::read_to_string(log)
                .unwrap_or_default()
                .lines()
                .map(str::to_string)
                .collect()
        }

        const REFUSES_VOICES: &str = "[ \"$1\" = -v ] && exit 1\necho \"$last\" >> \"$LOG\"";

        #[test]
        fn rejected_voice_is_retried_without_it() {
            let (_dir, program, log) = synth(REFUSES_VOICES);
            let mut cmd = ExternalCommand::new(program.display().to_string(), Some("Bad".into()));
            assert_eq!(cmd.voice(), Some("Bad"));

            assert_matches!(cmd.speak("cat", SpeechMode::Sync), Ok(()));

            assert_eq!(spoken(&log), ["cat"]);
            assert_eq!(cmd.voice(), None);
        }

        #[test]
        fn rejected_voice_on_echoes_is_noticed() {
            let (_dir, program, log) = synth(REFUSES_VOICES);
            let mut cmd = ExternalCommand::new(program.display().to_string(), Some("Bad".into()));

            assert_matches!(cmd.speak("c", SpeechMode::Async), Ok(()));
            assert_matches!(cmd.wait(), Ok(()));
            assert_eq!(cmd.voice(), None);
            assert!(spoken(&log).is_empty());

            assert_matches!(cmd.speak("a", SpeechMode::Async), Ok(()));
            assert_matches!(cmd.speak("cat", SpeechMode::Sync), Ok(()));
            assert_eq!(spoken(&log), ["a", "cat"]);
        }

        #[test]
        fn failing_echo_is_reported() {
            let (_dir, program, _log) = synth("exit 3");
            let mut cmd = ExternalCommand::new(program.display().to_string(), None);

            assert_matches!(cmd.speak("c", SpeechMode::Async), Ok(()));
            assert_matches!(cmd.wait(), Err(SpeechError::Exit { status, .. }) if status.code() == Some(3));
        }

        #[test]
        fn sync_waits_for_pending_echoes() {
            let (_dir, program, log) =
                synth("[ \"$last\" = slow ] && sleep 0.3\necho \"$last\" >> \"$LOG\"");
            let mut cmd = ExternalCommand::new(program.display().to_string(), None);

            assert_matches!(cmd.speak("slow", SpeechMode::Async), Ok(()));
            assert_matches!(cmd.speak("fast", SpeechMode::Sync), Ok(()));

            assert_eq!(spoken(&log), ["slow", "fast"]);
            assert!(cmd.pending.is_empty());
        }
    }
}
