use std::collections::VecDeque;
use std::io;

use crossterm::event::{self, Event as CtEvent, KeyEvent};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

/// Raw terminal mode held for the lifetime of the guard.
///
/// Dropping the guard restores the previous mode, so every exit path out of a
/// read (normal return, `?`, interrupt, unwinding panic) puts the terminal back.
#[derive(Debug)]
pub struct RawModeGuard {
    active: bool,
}

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self { active: true })
    }

    /// A guard that owns nothing, for sources that are not a terminal
    pub fn inert() -> Self {
        Self { active: false }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if self.active {
            if let Err(err) = disable_raw_mode() {
                tracing::warn!("failed to restore terminal mode: {err}");
            }
        }
    }
}

/// Source of keystrokes for the drill
pub trait KeySource {
    /// Put the source into immediate, no-echo mode until the guard drops.
    fn raw_mode(&mut self) -> io::Result<RawModeGuard> {
        Ok(RawModeGuard::inert())
    }

    /// Block until the next key event arrives.
    fn read_key(&mut self) -> io::Result<KeyEvent>;
}

/// Production key source reading the controlling terminal through crossterm
#[derive(Debug, Default)]
pub struct CrosstermKeySource;

impl CrosstermKeySource {
    pub fn new() -> Self {
        Self
    }
}

impl KeySource for CrosstermKeySource {
    fn raw_mode(&mut self) -> io::Result<RawModeGuard> {
        RawModeGuard::enable()
    }

    fn read_key(&mut self) -> io::Result<KeyEvent> {
        loop {
            if let CtEvent::Key(key) = event::read()? {
                return Ok(key);
            }
        }
    }
}

/// Scripted key source for tests and headless runs
#[derive(Debug, Default)]
pub struct TestKeySource {
    keys: VecDeque<KeyEvent>,
}

impl TestKeySource {
    pub fn new<I: IntoIterator<Item = KeyEvent>>(keys: I) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }

    pub fn push(&mut self, key: KeyEvent) {
        self.keys.push_back(key);
    }

    pub fn remaining(&self) -> usize {
        self.keys.len()
    }
}

impl KeySource for TestKeySource {
    fn read_key(&mut self) -> io::Result<KeyEvent> {
        self.keys
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no more scripted keys"))
    }
}
