use crate::error::DrillError;
use crate::runtime::KeySource;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What the reader reports back while a word is being typed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// A printable character was appended to the buffer
    Char(char),
    /// Backspace/delete wiped the buffer
    Retry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Submit,
    Clear,
    Interrupt,
    Char(char),
    Ignore,
}

pub fn classify(key: &KeyEvent) -> KeyAction {
    if key.kind != KeyEventKind::Press {
        return KeyAction::Ignore;
    }

    match key.code {
        KeyCode::Char('c') | KeyCode::Char('C') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            KeyAction::Interrupt
        }
        KeyCode::Enter => KeyAction::Submit,
        KeyCode::Backspace | KeyCode::Delete => KeyAction::Clear,
        KeyCode::Char(c)
            if !c.is_control()
                && !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            KeyAction::Char(c)
        }
        _ => KeyAction::Ignore,
    }
}

/// Collect one word from `keys` without echo.
///
/// Enter returns the buffer. Backspace clears the whole buffer and reports
/// [`InputEvent::Retry`]; every printable key is appended and reported as
/// [`InputEvent::Char`]. Ctrl-C aborts with [`DrillError::Interrupted`].
pub fn read_word<K, F>(keys: &mut K, mut on_event: F) -> Result<String, DrillError>
where
    K: KeySource + ?Sized,
    F: FnMut(InputEvent),
{
    let _raw = keys.raw_mode()?;
    let mut buffer = String::new();

    loop {
        let key = keys.read_key()?;
        match classify(&key) {
            KeyAction::Submit => return Ok(buffer),
            KeyAction::Interrupt => return Err(DrillError::Interrupted),
            KeyAction::Clear => {
                buffer.clear();
                on_event(InputEvent::Retry);
            }
            KeyAction::Char(c) => {
                buffer.push(c);
                on_event(InputEvent::Char(c));
            }
            KeyAction::Ignore => tracing::trace!(?key, "ignored key"),
        }
    }
}

/// Block until Enter is pressed, discarding anything else.
pub fn wait_for_enter<K: KeySource + ?Sized>(keys: &mut K) -> Result<(), DrillError> {
    let _raw = keys.raw_mode()?;

    loop {
        match classify(&keys.read_key()?) {
            KeyAction::Submit => return Ok(()),
            KeyAction::Interrupt => return Err(DrillError::Interrupted),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::TestKeySource;
    use assert_matches::assert_matches;
    use crossterm::event::KeyEventState;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn typed(text: &str) -> Vec<KeyEvent> {
        text.chars().map(|c| press(KeyCode::Char(c))).collect()
    }

    fn ctrl_c() -> KeyEvent {
        KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
    }

    #[test]
    fn enter_returns_typed_word() {
        let mut keys = TestKeySource::new(typed("cat"));
        keys.push(press(KeyCode::Enter));
        let mut events = vec![];

        let word = read_word(&mut keys, |e| events.push(e)).unwrap();

        assert_eq!(word, "cat");
        assert_eq!(
            events,
            vec![InputEvent::Char('c'), InputEvent::Char('a'), InputEvent::Char('t')]
        );
    }

    #[test]
    fn backspace_clears_the_whole_buffer() {
        let mut keys = TestKeySource::new(typed("cx"));
        keys.push(press(KeyCode::Backspace));
        for k in typed("cat") {
            keys.push(k);
        }
        keys.push(press(KeyCode::Enter));
        let mut retries = 0;

        let word = read_word(&mut keys, |e| {
            if e == InputEvent::Retry {
                retries += 1;
            }
        })
        .unwrap();

        assert_eq!(word, "cat");
        assert_eq!(retries, 1);
    }

    #[test]
    fn each_backspace_counts_once() {
        let mut keys = TestKeySource::new([
            press(KeyCode::Backspace),
            press(KeyCode::Delete),
            press(KeyCode::Char('a')),
            press(KeyCode::Backspace),
            press(KeyCode::Enter),
        ]);
        let mut events = vec![];

        let word = read_word(&mut keys, |e| events.push(e)).unwrap();

        assert_eq!(word, "");
        assert_eq!(events.iter().filter(|e| **e == InputEvent::Retry).count(), 3);
    }

    #[test]
    fn ctrl_c_interrupts() {
        let mut keys = TestKeySource::new(typed("ca"));
        keys.push(ctrl_c());
        keys.push(press(KeyCode::Enter));

        assert_matches!(read_word(&mut keys, |_| {}), Err(DrillError::Interrupted));
        assert_eq!(keys.remaining(), 1);
    }

    #[test]
    fn non_printable_and_released_keys_are_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('z'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        let mut keys = TestKeySource::new([
            press(KeyCode::Left),
            press(KeyCode::Tab),
            release,
            KeyEvent::new(KeyCode::Char('x'), KeyModifiers::ALT),
            KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT),
            press(KeyCode::Enter),
        ]);

        let word = read_word(&mut keys, |_| {}).unwrap();

        assert_eq!(word, "D");
    }

    #[test]
    fn spaces_are_kept() {
        let mut keys = TestKeySource::new(typed("ice cream"));
        keys.push(press(KeyCode::Enter));

        assert_eq!(read_word(&mut keys, |_| {}).unwrap(), "ice cream");
    }

    #[test]
    fn wait_for_enter_discards_other_keys() {
        let mut keys = TestKeySource::new(typed("abc"));
        keys.push(press(KeyCode::Enter));
        keys.push(press(KeyCode::Char('q')));

        wait_for_enter(&mut keys).unwrap();

        assert_eq!(keys.remaining(), 1);
    }

    #[test]
    fn wait_for_enter_can_be_interrupted() {
        let mut keys = TestKeySource::new([ctrl_c()]);
        assert_matches!(wait_for_enter(&mut keys), Err(DrillError::Interrupted));
    }
}
