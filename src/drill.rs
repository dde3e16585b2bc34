use crate::error::DrillError;
use crate::input::{read_word, wait_for_enter, InputEvent};
use crate::runtime::KeySource;
use crate::session::{RoundResult, SessionState};
use crate::speech::{spoken_char, Speak, SpeechMode};
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Where a round currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Phase {
    AwaitReady,
    Speaking,
    Collecting,
    Scoring,
    SessionDone,
}

/// Drives a session: one round per word, then a summary.
#[derive(Debug)]
pub struct Drill<K, S, W> {
    keys: K,
    speaker: S,
    out: W,
    session: SessionState,
    phase: Phase,
    interrupt: Arc<AtomicBool>,
}

impl<K: KeySource, S: Speak, W: Write> Drill<K, S, W> {
    pub fn new(keys: K, speaker: S, out: W) -> Self {
        Self {
            keys,
            speaker,
            out,
            session: SessionState::default(),
            phase: Phase::AwaitReady,
            interrupt: Arc::default(),
        }
    }

    /// Share a flag that is raised from outside (a SIGINT handler) while
    /// the terminal is in cooked mode.
    pub fn with_interrupt(mut self, flag: Arc<AtomicBool>) -> Self {
        self.interrupt = flag;
        self
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn into_parts(self) -> (K, S, W, SessionState) {
        (self.keys, self.speaker, self.out, self.session)
    }

    fn enter(&mut self, phase: Phase) {
        tracing::debug!(from = %self.phase, to = %phase, "phase");
        self.phase = phase;
    }

    fn check_interrupt(&self) -> Result<(), DrillError> {
        if self.interrupt.load(Ordering::SeqCst) {
            tracing::debug!(phase = %self.phase, "interrupted by signal");
            return Err(DrillError::Interrupted);
        }
        Ok(())
    }

    fn say(&mut self, text: &str) -> Result<(), DrillError> {
        self.speaker.speak(text, SpeechMode::Sync);
        self.check_interrupt()
    }

    /// Play every word in order, then report totals.
    pub fn run(&mut self, words: &[String]) -> Result<&SessionState, DrillError> {
        let total = words.len();
        for (idx, target) in words.iter().enumerate() {
            self.play_round(idx + 1, total, target)?;
        }
        self.finish(total)?;
        Ok(&self.session)
    }

    pub fn play_round(&mut self, idx: usize, total: usize, target: &str) -> Result<&RoundResult, DrillError> {
        self.check_interrupt()?;
        self.enter(Phase::AwaitReady);
        writeln!(self.out, "Word {idx} of {total}. Press Enter when you're ready.")?;
        self.out.flush()?;
        wait_for_enter(&mut self.keys)?;

        self.enter(Phase::Speaking);
        writeln!(self.out, "Listen carefully...")?;
        self.out.flush()?;
        self.say(target)?;

        self.enter(Phase::Collecting);
        writeln!(
            self.out,
            "Type the spelling; input is hidden and spoken back as you type. Press Enter when done."
        )?;
        write!(self.out, "> ")?;
        self.out.flush()?;

        let mut retries = 0;
        let typed = {
            let Self { keys, speaker, .. } = self;
            read_word(keys, |event| match event {
                InputEvent::Char(c) => speaker.speak(&spoken_char(c), SpeechMode::Async),
                InputEvent::Retry => {
                    retries += 1;
                    tracing::debug!(retries, "buffer cleared");
                    speaker.speak("start over", SpeechMode::Sync);
                    speaker.speak(target, SpeechMode::Sync);
                }
            })?
        };
        writeln!(self.out)?;

        self.enter(Phase::Scoring);
        let round = RoundResult::new(target, typed, retries);
        let correct = round.correct;
        let typed = round.typed.clone();
        self.session.record(round);
        let score = self.session.score;

        writeln!(self.out, "Target : {target}")?;
        writeln!(self.out, "You typed: {typed}")?;
        writeln!(self.out, "Result : {}", if correct { "correct" } else { "incorrect" })?;
        writeln!(self.out, "Score  : {score} / {idx}\n")?;
        self.out.flush()?;

        let heard = if typed.is_empty() { "nothing" } else { typed.as_str() };
        self.say(&format!("You typed {heard}"))?;
        self.say(if correct {
            "The answer is correct"
        } else {
            "The answer is not correct"
        })?;
        self.say(&format!("Score is {score} out of {idx}"))?;

        Ok(&self.session.rounds[self.session.rounds.len() - 1])
    }

    fn finish(&mut self, total: usize) -> Result<(), DrillError> {
        self.enter(Phase::SessionDone);
        let SessionState {
            score,
            total_retries,
            ..
        } = self.session;

        writeln!(self.out, "Final score: {score} / {total}")?;
        writeln!(self.out, "Total retries: {total_retries}")?;
        self.out.flush()?;

        self.say(&format!("Final score {score} out of {total}"))?;
        self.say(&format!("Total retries {total_retries}"))
    }

    /// Summary of the rounds finished before an interrupt.
    pub fn report_interrupted(&mut self) -> io::Result<()> {
        writeln!(self.out, "\nInterrupted. Exiting.")?;
        let played = self.session.rounds_played();
        if played > 0 {
            writeln!(
                self.out,
                "Score so far: {} / {played}, retries: {}",
                self.session.score, self.session.total_retries
            )?;
        }
        self.out.flush()
    }
}
