//! In-progress answers of a form, keyed by field id
//!
//! Every answer is a string. Multi-choice answers are the selected options
//! joined with `;`. A missing key means the field was never answered; a key
//! holding an empty string means it was answered with nothing selected.

use super::model::{parse_options, FieldId};
use std::collections::BTreeMap;

/// Separator used when encoding multi-choice answers
pub const OPTION_SEPARATOR: &str = ";";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormResponses {
    values: BTreeMap<FieldId, String>,
}

impl FormResponses {
    pub fn get(&self, field_id: FieldId) -> Option<&str> {
        self.values.get(&field_id).map(String::as_str)
    }

    pub fn set(&mut self, field_id: FieldId, value: impl Into<String>) {
        self.values.insert(field_id, value.into());
    }

    #[cfg(test)]
    pub fn remove(&mut self, field_id: FieldId) -> Option<String> {
        self.values.remove(&field_id)
    }

    /// True when the answer is missing or empty
    pub fn is_blank(&self, field_id: FieldId) -> bool {
        self.get(field_id).map_or(true, str::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FieldId, &str)> {
        self.values.iter().map(|(id, v)| (*id, v.as_str()))
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Append a typed character to a free-text answer
    pub fn push_char(&mut self, field_id: FieldId, c: char) {
        self.values.entry(field_id).or_default().push(c);
    }

    /// Remove the last character of a free-text answer
    pub fn pop_char(&mut self, field_id: FieldId) {
        if let Some(value) = self.values.get_mut(&field_id) {
            value.pop();
        }
    }

    /// Options currently selected for a multi-choice field
    pub fn selected_options(&self, field_id: FieldId) -> Vec<String> {
        self.get(field_id).map(parse_options).unwrap_or_default()
    }

    pub fn is_option_selected(&self, field_id: FieldId, option: &str) -> bool {
        self.selected_options(field_id).iter().any(|o| o == option)
    }

    /// Check or uncheck one option of a multi-choice field.
    ///
    /// Checking appends the option if absent; unchecking removes it. An empty
    /// selection is stored as `""`, never as a missing key, so checking then
    /// unchecking an unanswered field leaves it answered with nothing selected.
    pub fn toggle_option(&mut self, field_id: FieldId, option: &str, checked: bool) {
        let mut selected = self.selected_options(field_id);
        if checked {
            if !selected.iter().any(|o| o == option) {
                selected.push(option.to_string());
            }
        } else {
            selected.retain(|o| o != option);
        }
        self.set(field_id, selected.join(OPTION_SEPARATOR));
    }

    /// Flip one option of a multi-choice field
    pub fn flip_option(&mut self, field_id: FieldId, option: &str) {
        let checked = !self.is_option_selected(field_id, option);
        self.toggle_option(field_id, option, checked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_and_empty_are_blank() {
        let mut responses = FormResponses::default();
        assert!(responses.is_blank(1));
        responses.set(1, "");
        assert!(responses.is_blank(1));
        assert_eq!(responses.get(1), Some(""));
        responses.set(1, "x");
        assert!(!responses.is_blank(1));
    }

    #[test]
    fn test_push_and_pop_char() {
        let mut responses = FormResponses::default();
        responses.push_char(7, 'a');
        responses.push_char(7, 'b');
        assert_eq!(responses.get(7), Some("ab"));
        responses.pop_char(7);
        assert_eq!(responses.get(7), Some("a"));
        responses.pop_char(8);
        assert!(responses.get(8).is_none());
    }

    #[test]
    fn test_toggle_appends_in_insertion_order() {
        let mut responses = FormResponses::default();
        responses.toggle_option(3, "Toux", true);
        responses.toggle_option(3, "Fievre", true);
        responses.toggle_option(3, "Toux", true);
        assert_eq!(responses.get(3), Some("Toux;Fievre"));
    }

    #[test]
    fn test_unchecking_last_option_stores_empty_string() {
        let mut responses = FormResponses::default();
        responses.toggle_option(3, "Toux", true);
        responses.toggle_option(3, "Toux", false);
        assert_eq!(responses.get(3), Some(""));
        assert_eq!(responses.len(), 1);
    }

    #[test]
    fn test_check_then_uncheck_restores_prior_value() {
        let mut responses = FormResponses::default();
        responses.set(3, "Fievre");
        let before = responses.clone();

        responses.toggle_option(3, "Fatigue", true);
        assert_eq!(responses.get(3), Some("Fievre;Fatigue"));
        responses.toggle_option(3, "Fatigue", false);

        assert_eq!(responses, before);
    }

    #[test]
    fn test_check_then_uncheck_on_empty_selection() {
        let mut responses = FormResponses::default();
        responses.set(3, "");
        let before = responses.clone();
        responses.toggle_option(3, "Toux", true);
        responses.toggle_option(3, "Toux", false);
        assert_eq!(responses, before);
    }

    #[test]
    fn test_check_then_uncheck_on_unanswered_stores_empty() {
        let mut responses = FormResponses::default();
        responses.toggle_option(3, "Toux", true);
        responses.toggle_option(3, "Toux", false);

        assert_eq!(responses.get(3), Some(""));
        assert_ne!(responses, FormResponses::default());
        assert!(responses.is_blank(3));
    }

    #[test]
    fn test_flip_option() {
        let mut responses = FormResponses::default();
        responses.flip_option(4, "a");
        assert!(responses.is_option_selected(4, "a"));
        responses.flip_option(4, "a");
        assert!(!responses.is_option_selected(4, "a"));
    }

    #[test]
    fn test_iter_is_ordered_by_field_id() {
        let mut responses = FormResponses::default();
        responses.set(9, "b");
        responses.set(2, "a");
        let ids: Vec<_> = responses.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 9]);
    }
}
