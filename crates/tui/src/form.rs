use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

const MAX_INPUT_LEN: usize = 128;

/// Single-line editable text with a char-indexed cursor.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    cursor: usize,
    secret: bool,
}

impl TextInput {
    fn new(secret: bool) -> Self {
        Self {
            secret,
            ..Self::default()
        }
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_offset(&self, index: usize) -> usize {
        self.value
            .char_indices()
            .nth(index)
            .map(|(offset, _)| offset)
            .unwrap_or(self.value.len())
    }

    fn set(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.len();
    }

    fn move_cursor(&mut self, delta: isize) {
        let next = self.cursor as isize + delta;
        self.cursor = next.clamp(0, self.len() as isize) as usize;
    }

    fn insert(&mut self, ch: char) {
        if self.len() >= MAX_INPUT_LEN || ch.is_control() {
            return;
        }
        let offset = self.byte_offset(self.cursor);
        self.value.insert(offset, ch);
        self.cursor += 1;
    }

    fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let offset = self.byte_offset(self.cursor);
        self.value.remove(offset);
    }

    fn delete(&mut self) {
        if self.cursor < self.len() {
            let offset = self.byte_offset(self.cursor);
            self.value.remove(offset);
        }
    }

    /// Text as drawn; secrets are masked.
    pub fn display(&self) -> String {
        if self.secret {
            "*".repeat(self.len())
        } else {
            self.value.clone()
        }
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }
}

/// What a key press did to a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    Edited,
    Submit,
    Cancel,
}

/// A titled stack of labelled inputs with one focused field.
#[derive(Debug, Clone)]
pub struct Form {
    pub title: &'static str,
    labels: Vec<&'static str>,
    inputs: Vec<TextInput>,
    focus: usize,
}

impl Form {
    /// Fields are `(label, secret)` pairs.
    pub fn new(title: &'static str, fields: &[(&'static str, bool)]) -> Self {
        Self {
            title,
            labels: fields.iter().map(|(label, _)| *label).collect(),
            inputs: fields.iter().map(|(_, secret)| TextInput::new(*secret)).collect(),
            focus: 0,
        }
    }

    pub fn with_value(mut self, index: usize, value: impl Into<String>) -> Self {
        if let Some(input) = self.inputs.get_mut(index) {
            input.set(value);
        }
        self
    }

    /// Raw value of a field; empty when out of range.
    pub fn value(&self, index: usize) -> &str {
        self.inputs
            .get(index)
            .map(|input| input.value.as_str())
            .unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &TextInput)> + '_ {
        self.labels.iter().copied().zip(self.inputs.iter())
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    fn focus_step(&mut self, delta: isize) {
        let len = self.inputs.len() as isize;
        if len == 0 {
            return;
        }
        self.focus = (self.focus as isize + delta).rem_euclid(len) as usize;
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        match key.code {
            KeyCode::Esc => return FormAction::Cancel,
            KeyCode::Enter => return FormAction::Submit,
            KeyCode::Tab | KeyCode::Down => {
                self.focus_step(1);
                return FormAction::None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus_step(-1);
                return FormAction::None;
            }
            _ => {}
        }

        let Some(input) = self.inputs.get_mut(self.focus) else {
            return FormAction::None;
        };
        match key.code {
            KeyCode::Left => input.move_cursor(-1),
            KeyCode::Right => input.move_cursor(1),
            KeyCode::Home => input.cursor = 0,
            KeyCode::End => input.cursor = input.len(),
            KeyCode::Backspace => {
                input.backspace();
                return FormAction::Edited;
            }
            KeyCode::Delete => {
                input.delete();
                return FormAction::Edited;
            }
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                input.insert(ch);
                return FormAction::Edited;
            }
            _ => {}
        }
        FormAction::None
    }
}
