use std::sync::mpsc::Receiver;
use std::time::Duration;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use tracing::trace;

use crate::domain::{AppConfig, AppError, Message, Nav};
use crate::model::{InputMode, Model};

/// Polls the terminal and the fetch channel each tick and maps what it
/// finds to messages. Key interpretation depends on the model's input
/// mode: text entry gets the raw key, everything else the keymap below.
pub struct Controller {
    event_poll_time: u64,
    rx: Receiver<Message>,
}

impl Controller {
    pub fn new(cfg: &AppConfig, rx: Receiver<Message>) -> Self {
        Self {
            event_poll_time: cfg.event_poll_ms,
            rx,
        }
    }

    pub fn handle_events(&self, model: &Model) -> Result<Vec<Message>, AppError> {
        // Completed fetches first; they never depend on the input mode.
        let mut messages: Vec<Message> = self.rx.try_iter().collect();

        if event::poll(Duration::from_millis(self.event_poll_time))? {
            match event::read()? {
                Event::Key(key) if key.kind == event::KeyEventKind::Press => {
                    if let Some(message) = map_key(model.input_mode(), key) {
                        trace!("Mapped: {key:?} => {message:?}");
                        messages.push(message);
                    }
                }
                Event::Resize(w, h) => messages.push(Message::Resize(w, h)),
                _ => {}
            }
        }
        Ok(messages)
    }
}

fn map_key(mode: InputMode, key: KeyEvent) -> Option<Message> {
    // Ctrl-C quits from anywhere, text entry included.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(Message::Quit);
    }
    match mode {
        InputMode::Editing => Some(Message::RawKey(key)),
        InputMode::Overlay => map_overlay_key(key),
        InputMode::Normal => map_normal_key(key),
    }
}

fn map_overlay_key(key: KeyEvent) -> Option<Message> {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => Some(Message::Confirm),
        KeyCode::Char('n') | KeyCode::Char('q') | KeyCode::Char('?') | KeyCode::Esc => {
            Some(Message::CloseOverlay)
        }
        _ => None,
    }
}

fn map_normal_key(key: KeyEvent) -> Option<Message> {
    let message = match key.code {
        KeyCode::Char('q') => Message::Quit,
        KeyCode::Char('?') => Message::Help,
        KeyCode::Char('t') => Message::ToggleTheme,

        KeyCode::Char('1') => Message::Goto(Nav::Dashboard),
        KeyCode::Char('2') => Message::Goto(Nav::Users),
        KeyCode::Char('3') => Message::Goto(Nav::Products),
        KeyCode::Char('4') => Message::Goto(Nav::Orders),
        KeyCode::Char('5') => Message::Goto(Nav::Settings),

        KeyCode::Char('j') | KeyCode::Down => Message::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Message::MoveUp,
        KeyCode::Char('h') | KeyCode::Left => Message::PrevPage,
        KeyCode::Char('l') | KeyCode::Right => Message::NextPage,
        KeyCode::Char('g') => Message::FirstPage,
        KeyCode::Char('G') => Message::LastPage,

        KeyCode::Char('[') => Message::HeaderLeft,
        KeyCode::Char(']') => Message::HeaderRight,
        KeyCode::Char('s') => Message::ToggleSort,

        KeyCode::Char('/') => Message::EditSearch,
        KeyCode::Char('f') => Message::CycleStatusFilter,
        KeyCode::Char('c') => Message::CycleRowStatus,

        KeyCode::Char('a') => Message::Add,
        KeyCode::Char('e') | KeyCode::Enter => Message::Edit,
        KeyCode::Char('d') => Message::Delete,
        KeyCode::Char('y') => Message::YankRow,
        KeyCode::Char('r') => Message::Refresh,
        _ => return None,
    };
    Some(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(c: char) -> KeyEvent {
        KeyEvent::from(KeyCode::Char(c))
    }

    #[test]
    fn normal_mode_maps_navigation_and_actions() {
        assert!(matches!(
            map_key(InputMode::Normal, key('2')),
            Some(Message::Goto(Nav::Users))
        ));
        assert!(matches!(
            map_key(InputMode::Normal, key('s')),
            Some(Message::ToggleSort)
        ));
        assert!(matches!(
            map_key(InputMode::Normal, KeyEvent::from(KeyCode::Right)),
            Some(Message::NextPage)
        ));
        assert!(map_key(InputMode::Normal, key('z')).is_none());
    }

    #[test]
    fn editing_mode_passes_keys_through_raw() {
        assert!(matches!(
            map_key(InputMode::Editing, key('q')),
            Some(Message::RawKey(_))
        ));
    }

    #[test]
    fn overlay_mode_only_confirms_or_dismisses() {
        assert!(matches!(
            map_key(InputMode::Overlay, key('y')),
            Some(Message::Confirm)
        ));
        assert!(matches!(
            map_key(InputMode::Overlay, KeyEvent::from(KeyCode::Esc)),
            Some(Message::CloseOverlay)
        ));
        assert!(map_key(InputMode::Overlay, key('d')).is_none());
    }

    #[test]
    fn ctrl_c_quits_even_while_typing() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(matches!(
            map_key(InputMode::Editing, ctrl_c),
            Some(Message::Quit)
        ));
    }
}
