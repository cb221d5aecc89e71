//! Input field value objects

/// A single text input of an editor with its label and value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputField {
    pub name: String,
    pub label: String,
    pub value: String,
    pub is_multiline: bool,
}

impl InputField {
    /// Create a new empty text field
    pub fn text(name: &str, label: &str, is_multiline: bool) -> Self {
        Self::text_with_value(name, label, String::new(), is_multiline)
    }

    /// Create a new text field with initial value
    pub fn text_with_value(name: &str, label: &str, value: String, is_multiline: bool) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            value,
            is_multiline,
        }
    }

    pub fn as_text(&self) -> &str {
        &self.value
    }

    /// Value with surrounding whitespace removed
    pub fn trimmed(&self) -> &str {
        self.value.trim()
    }

    pub fn push_char(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn pop_char(&mut self) {
        self.value.pop();
    }

    /// Enter adds a line break only in multi-line fields
    pub fn newline(&mut self) {
        if self.is_multiline {
            self.value.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typing_and_backspace() {
        let mut field = InputField::text("reason", "Reason", false);
        field.push_char('O');
        field.push_char('K');
        field.pop_char();
        assert_eq!(field.as_text(), "O");
    }

    #[test]
    fn test_newline_only_in_multiline() {
        let mut single = InputField::text("name", "Name", false);
        single.newline();
        assert_eq!(single.as_text(), "");

        let mut multi = InputField::text_with_value("note", "Note", "a".into(), true);
        multi.newline();
        assert_eq!(multi.as_text(), "a\n");
    }

    #[test]
    fn test_trimmed() {
        let field = InputField::text_with_value("name", "Name", "  Bilan ".into(), false);
        assert_eq!(field.trimmed(), "Bilan");
    }
}
