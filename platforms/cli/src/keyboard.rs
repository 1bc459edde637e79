use action::Action;
use crossterm::{
    event::{self, Event as TermEvent, KeyEvent, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode},
};
use keymap::{Config, KeyMapConfig};
use quint::{Event, Input, QuintError};

/// Reads key presses in raw mode and maps them to controller events.
///
/// Raw mode is restored when the value is dropped.
pub struct Keyboard {
    keymap: Config<Action>,
}

impl Keyboard {
    pub fn new() -> Result<Self, QuintError> {
        enable_raw_mode().map_err(|e| QuintError::Io(e.to_string()))?;

        Ok(Self {
            keymap: Action::keymap_config(),
        })
    }
}

impl Drop for Keyboard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

impl Input for Keyboard {
    fn next_event(&mut self) -> Result<Event, QuintError> {
        loop {
            let TermEvent::Key(key) = event::read().map_err(|e| QuintError::Io(e.to_string()))?
            else {
                continue;
            };

            if key.kind != KeyEventKind::Press {
                continue;
            }

            if let Some(event) = translate(&self.keymap, &key) {
                return Ok(event);
            }
        }
    }
}

fn translate(keymap: &Config<Action>, key: &KeyEvent) -> Option<Event> {
    let action = keymap.get(key)?;
    log::trace!("Key {:?} mapped to {:?}", key.code, action);
    Some(Event::from(*action))
}

/// Input for runs that never consult the keyboard.
pub struct NoInput;

impl Input for NoInput {
    fn next_event(&mut self) -> Result<Event, QuintError> {
        Ok(Event::Step)
    }
}
