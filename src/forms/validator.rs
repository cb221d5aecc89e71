//! Required-field validation over the section tree

use super::model::{FieldId, FormSection, SectionId};
use super::responses::FormResponses;

/// First missing required field of one section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidField {
    pub section_id: SectionId,
    pub field_id: FieldId,
}

/// Outcome of a validation pass.
///
/// `flagged` holds the first invalid field of every offending section, in
/// pre-order with siblings by display order. `invalid_count` counts every
/// invalid field in the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub flagged: Vec<InvalidField>,
    pub invalid_count: usize,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid_count == 0
    }

    /// Where focus should jump after a failed validation
    pub fn first(&self) -> Option<InvalidField> {
        self.flagged.first().copied()
    }

    pub fn is_flagged(&self, field_id: FieldId) -> bool {
        self.flagged.iter().any(|f| f.field_id == field_id)
    }
}

/// Walk the whole tree and report missing required answers.
///
/// The walk never stops early: every section is visited so each one can
/// flag its own first offending field.
pub fn validate(sections: &[FormSection], responses: &FormResponses) -> ValidationReport {
    let mut report = ValidationReport::default();
    walk(sections, responses, &mut report);
    report
}

fn walk(sections: &[FormSection], responses: &FormResponses, report: &mut ValidationReport) {
    for section in sections {
        let mut invalid = section
            .fields
            .iter()
            .filter(|f| f.required && responses.is_blank(f.id));

        if let Some(first) = invalid.next() {
            report.flagged.push(InvalidField {
                section_id: section.id,
                field_id: first.id,
            });
            report.invalid_count += 1 + invalid.count();
        }

        walk(&section.children, responses, report);
    }
}
