//! Form template, section and field definitions as served by the API

use serde::Deserialize;

/// Identifier of a form template
pub type TemplateId = i64;
/// Identifier of a form section
pub type SectionId = i64;
/// Identifier of a form field
pub type FieldId = i64;

/// Section id recorded for answers whose field is not found in the tree
pub const UNKNOWN_SECTION: SectionId = 0;

/// A named, reusable medical form definition
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FormTemplate {
    pub id: TemplateId,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// A named group of fields, possibly holding nested sub-sections
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormSection {
    pub id: SectionId,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "ordreAffichage", default)]
    pub display_order: i32,
    #[serde(rename = "champs", default)]
    pub fields: Vec<FormField>,
    #[serde(rename = "sousSections", default)]
    pub children: Vec<FormSection>,
}

impl FormSection {
    /// Whether this section (not its children) owns the field
    pub fn contains_field(&self, field_id: FieldId) -> bool {
        self.fields.iter().any(|f| f.id == field_id)
    }
}

/// One question of a form
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormField {
    pub id: FieldId,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "typeChamp")]
    pub kind: InputKind,
    #[serde(rename = "obligatoire", default)]
    pub required: bool,
    #[serde(rename = "unite", default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(rename = "valeursPossibles", default)]
    pub options: Option<String>,
}

impl FormField {
    /// Selectable options, split on `;` and trimmed
    pub fn option_list(&self) -> Vec<String> {
        self.options.as_deref().map(parse_options).unwrap_or_default()
    }
}

/// Input kind of a field, decoded leniently from the wire value
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum InputKind {
    Text,
    Number,
    MultiLine,
    Select,
    Radio,
    Checkbox,
    FreeText,
    Date,
    Unsupported(String),
}

impl From<String> for InputKind {
    fn from(raw: String) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "texte" => Self::Text,
            "number" | "nombre" | "numerique" => Self::Number,
            "textarea" => Self::MultiLine,
            "select" | "liste" => Self::Select,
            "radio" => Self::Radio,
            "checkbox" | "multiple" => Self::Checkbox,
            "string" | "texte_libre" | "free_text" => Self::FreeText,
            "date" => Self::Date,
            _ => Self::Unsupported(raw),
        }
    }
}

impl InputKind {
    /// Kinds edited by typing characters
    pub fn accepts_typing(&self) -> bool {
        matches!(
            self,
            Self::Text
                | Self::Number
                | Self::MultiLine
                | Self::FreeText
                | Self::Date
                | Self::Unsupported(_)
        )
    }

    /// Whether `c` may be typed into a field of this kind
    pub fn accepts_char(&self, c: char) -> bool {
        match self {
            Self::Number => c.is_ascii_digit() || matches!(c, '.' | ',' | '-'),
            Self::Date => c.is_ascii_digit() || c == '-',
            kind => kind.accepts_typing(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::MultiLine => "long text",
            Self::Select => "list",
            Self::Radio => "single choice",
            Self::Checkbox => "multiple choice",
            Self::FreeText => "free text",
            Self::Date => "date",
            Self::Unsupported(raw) => raw,
        }
    }
}

/// Split a `;`-delimited option string, trimming each entry and dropping blanks
pub fn parse_options(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Sort every level of the tree by display order.
///
/// `sort_by_key` is stable, so ties keep the order the API returned them in.
pub fn sort_sections(sections: &mut [FormSection]) {
    sections.sort_by_key(|s| s.display_order);
    for section in sections.iter_mut() {
        sort_sections(&mut section.children);
    }
}

/// A field together with its place in the rendered tree
#[derive(Debug, Clone, Copy)]
pub struct FieldSlot<'a> {
    pub depth: usize,
    pub field: &'a FormField,
}

/// Pre-order walk of the tree, a section's own fields before its children
pub fn field_slots(sections: &[FormSection]) -> Vec<FieldSlot<'_>> {
    fn walk<'a>(sections: &'a [FormSection], depth: usize, out: &mut Vec<FieldSlot<'a>>) {
        for section in sections {
            out.extend(section.fields.iter().map(|field| FieldSlot {
                depth,
                field,
            }));
            walk(&section.children, depth + 1, out);
        }
    }

    let mut out = Vec::new();
    walk(sections, 0, &mut out);
    out
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_options_trims_and_keeps_order() {
        assert_eq!(parse_options("a; b ;c"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_options_drops_blank_entries() {
        assert_eq!(parse_options(" ;a;;  ; b;"), vec!["a", "b"]);
        assert!(parse_options("").is_empty());
    }

    #[test]
    fn test_option_list_without_options() {
        let f = field(1, "Motif", InputKind::Text, false);
        assert!(f.option_list().is_empty());
    }

    #[test]
    fn test_input_kind_from_wire() {
        assert_eq!(InputKind::from("TEXT".to_string()), InputKind::Text);
        assert_eq!(InputKind::from("textarea".to_string()), InputKind::MultiLine);
        assert_eq!(InputKind::from("Checkbox".to_string()), InputKind::Checkbox);
        assert_eq!(InputKind::from("radio".to_string()), InputKind::Radio);
        assert_eq!(InputKind::from("date".to_string()), InputKind::Date);
        assert_eq!(
            InputKind::from("signature".to_string()),
            InputKind::Unsupported("signature".to_string())
        );
    }

    #[test]
    fn test_accepts_char_by_kind() {
        assert!(InputKind::Number.accepts_char('7'));
        assert!(InputKind::Number.accepts_char('.'));
        assert!(!InputKind::Number.accepts_char('a'));
        assert!(InputKind::Date.accepts_char('-'));
        assert!(!InputKind::Date.accepts_char('/'));
        assert!(InputKind::Text.accepts_char('é'));
        assert!(!InputKind::Select.accepts_char('a'));
    }

    #[test]
    fn test_deserialize_section_tree() {
        let json = r#"[{
            "id": 1, "nom": "Consultation", "ordreAffichage": 2,
            "champs": [{"id": 11, "nom": "Motif", "typeChamp": "TEXT", "obligatoire": true}],
            "sousSections": [{"id": 2, "nom": "Examen", "champs": [
                {"id": 21, "nom": "Signes", "typeChamp": "CHECKBOX", "valeursPossibles": "a;b"}
            ]}]
        }]"#;
        let sections: Vec<FormSection> = serde_json::from_str(json).unwrap();
        assert_eq!(sections[0].display_order, 2);
        assert!(sections[0].fields[0].required);
        assert_eq!(sections[0].children[0].display_order, 0);
        assert_eq!(sections[0].children[0].fields[0].kind, InputKind::Checkbox);
        assert_eq!(sections[0].children[0].fields[0].option_list(), vec!["a", "b"]);
    }

    #[test]
    fn test_sort_sections_is_stable_and_recursive() {
        let mut parent = section(1, 5, vec![]);
        parent.children = vec![section(12, 2, vec![]), section(11, 1, vec![])];
        let mut sections = vec![parent, section(2, 1, vec![]), section(3, 1, vec![])];

        sort_sections(&mut sections);

        let ids: Vec<_> = sections.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        let child_ids: Vec<_> = sections[2].children.iter().map(|s| s.id).collect();
        assert_eq!(child_ids, vec![11, 12]);
    }

    #[test]
    fn test_field_slots_pre_order() {
        let tree = consultation_tree();
        let slots = field_slots(&tree);
        let ids: Vec<_> = slots.iter().map(|s| s.field.id).collect();
        assert_eq!(ids, vec![101, 102, 201, 211, 212, 301]);
        assert_eq!(slots[3].depth, 2);
        assert_eq!(slots[5].depth, 0);
    }
}
