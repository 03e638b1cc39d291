/// Keyboard plumbing.
///
/// Steering and fire are discrete key-down events; terminal auto-repeat
/// keeps a held key firing, which is what gives the controls their
/// arcade feel. Press and Repeat both count, Release is ignored.
/// Resize events are dropped here; the renderer re-reads the terminal
/// size every frame anyway.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};

/// One drained input: a game key, or a request to leave.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum InputEvent {
    Key(KeyCode),
    Quit,
}

/// Drain all pending terminal events without blocking.
/// Call once per frame, before the simulation tick.
pub fn drain() -> io::Result<Vec<InputEvent>> {
    let mut drained = Vec::new();
    while event::poll(Duration::ZERO)? {
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Release {
                continue;
            }
            let ctrl_c = key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'));
            if ctrl_c || key.code == KeyCode::Esc {
                drained.push(InputEvent::Quit);
            } else {
                drained.push(InputEvent::Key(normalize(key.code)));
            }
        }
    }
    Ok(drained)
}

/// Shifted letters fold to lowercase so bindings stay case-insensitive.
fn normalize(code: KeyCode) -> KeyCode {
    match code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}
