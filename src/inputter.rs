use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Single-line text editor used by the search box, the login fields, and
/// every text field on the forms. Tracks the cursor in characters, not
/// bytes, so multi-byte input edits cleanly.
#[derive(Debug, Default, Clone)]
pub struct Inputter {
    chars: Vec<char>,
    cursor: usize,
}

/// Snapshot handed to the model after each key: the current text plus
/// whether the edit was committed (Enter) or abandoned (Esc).
#[derive(Debug, Default, Clone)]
pub struct InputResult {
    pub input: String,
    pub cursor: usize,
    pub finished: bool,
    pub canceled: bool,
}

impl Inputter {
    pub fn with_value(s: &str) -> Self {
        let chars: Vec<char> = s.chars().collect();
        let cursor = chars.len();
        Self { chars, cursor }
    }

    pub fn value(&self) -> String {
        self.chars.iter().collect()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The field text with every character masked, for password entry.
    pub fn masked(&self) -> String {
        "•".repeat(self.chars.len())
    }

    pub fn set(&mut self, s: &str) {
        self.chars = s.chars().collect();
        self.cursor = self.chars.len();
    }

    pub fn clear(&mut self) {
        self.chars.clear();
        self.cursor = 0;
    }

    pub fn read(&mut self, key: KeyEvent) -> InputResult {
        match (key.code, key.modifiers) {
            (KeyCode::Enter, _) => return self.result(true, false),
            (KeyCode::Esc, _) => return self.result(true, true),
            (KeyCode::Backspace, _) => self.backspace(),
            (KeyCode::Delete, _) => self.delete(),
            (KeyCode::Left, _) => self.cursor = self.cursor.saturating_sub(1),
            (KeyCode::Right, _) => self.cursor = (self.cursor + 1).min(self.chars.len()),
            (KeyCode::Home, _) => self.cursor = 0,
            (KeyCode::End, _) => self.cursor = self.chars.len(),
            (code, KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                if let Some(c) = code.as_char() {
                    self.chars.insert(self.cursor, c);
                    self.cursor += 1;
                }
            }
            _ => {}
        }
        self.result(false, false)
    }

    fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.chars.remove(self.cursor);
        }
    }

    fn delete(&mut self) {
        if self.cursor < self.chars.len() {
            self.chars.remove(self.cursor);
        }
    }

    fn result(&self, finished: bool, canceled: bool) -> InputResult {
        InputResult {
            input: self.value(),
            cursor: self.cursor,
            finished,
            canceled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(inputter: &mut Inputter, code: KeyCode) -> InputResult {
        inputter.read(KeyEvent::from(code))
    }

    fn type_str(inputter: &mut Inputter, s: &str) {
        for c in s.chars() {
            press(inputter, KeyCode::Char(c));
        }
    }

    #[test]
    fn typing_appends_at_the_cursor() {
        let mut input = Inputter::default();
        type_str(&mut input, "doe");
        assert_eq!(input.value(), "doe");
        assert_eq!(input.cursor(), 3);
    }

    #[test]
    fn editing_in_the_middle() {
        let mut input = Inputter::with_value("jon");
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Left);
        type_str(&mut input, "oh");
        assert_eq!(input.value(), "johon");
        press(&mut input, KeyCode::End);
        press(&mut input, KeyCode::Backspace);
        press(&mut input, KeyCode::Backspace);
        assert_eq!(input.value(), "joh");
    }

    #[test]
    fn backspace_and_delete_respect_bounds() {
        let mut input = Inputter::default();
        press(&mut input, KeyCode::Backspace);
        press(&mut input, KeyCode::Delete);
        assert_eq!(input.value(), "");

        input.set("ab");
        press(&mut input, KeyCode::Home);
        press(&mut input, KeyCode::Delete);
        assert_eq!(input.value(), "b");
    }

    #[test]
    fn multibyte_text_edits_by_character() {
        let mut input = Inputter::default();
        type_str(&mut input, "héllo");
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Left);
        press(&mut input, KeyCode::Backspace);
        assert_eq!(input.value(), "hllo");
    }

    #[test]
    fn enter_finishes_and_esc_cancels() {
        let mut input = Inputter::with_value("query");
        let done = press(&mut input, KeyCode::Enter);
        assert!(done.finished && !done.canceled);
        let gone = press(&mut input, KeyCode::Esc);
        assert!(gone.finished && gone.canceled);
        assert_eq!(gone.input, "query");
    }

    #[test]
    fn masked_hides_every_character() {
        let input = Inputter::with_value("admin123");
        assert_eq!(input.masked().chars().count(), 8);
        assert!(!input.masked().contains('a'));
    }
}
