use serde::Serialize;

use crate::error::DirectoryError;
use crate::types::{non_blank, FormFields, NewRecord};

/// Creation form state: visibility, the in-flight guard and the typed values.
///
/// Transitions: open → visible, close/cancel/reset → hidden, successful
/// submission → hidden with fields cleared. A failed submission leaves the
/// form visible with every value intact.
#[derive(Debug, Default)]
pub struct FormController {
    visible: bool,
    submitting: bool,
    fields: FormFields,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub visible: bool,
    /// Submit control is disabled while this is set.
    pub submitting: bool,
    pub fields: FormFields,
}

impl FormController {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn fields(&self) -> &FormFields {
        &self.fields
    }

    pub fn open(&mut self) {
        self.visible = true;
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }

    /// Form reset: clears the fields and hides the form.
    pub fn reset(&mut self) {
        self.fields = FormFields::default();
        self.visible = false;
    }

    /// Track the latest typed values so a failed submission can restore them.
    pub fn set_fields(&mut self, fields: FormFields) {
        self.fields = fields;
    }

    pub fn set_location(&mut self, location: String) {
        self.fields.location = location;
    }

    /// Mark the store call in flight. Returns false if one already is.
    pub fn begin_submit(&mut self, fields: FormFields) -> bool {
        if self.submitting {
            return false;
        }
        self.fields = fields;
        self.submitting = true;
        true
    }

    pub fn submit_succeeded(&mut self) {
        self.submitting = false;
        self.reset();
    }

    pub fn submit_failed(&mut self) {
        self.submitting = false;
    }

    pub fn view(&self) -> FormView {
        FormView {
            visible: self.visible,
            submitting: self.submitting,
            fields: self.fields.clone(),
        }
    }
}

/// Check required fields and produce the normalized store payload.
pub fn validate(fields: &FormFields) -> Result<NewRecord, DirectoryError> {
    let required = [
        ("name", &fields.name),
        ("category", &fields.category),
        ("location", &fields.location),
    ];
    let missing: Vec<&'static str> = required
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| *label)
        .collect();
    if !missing.is_empty() {
        return Err(DirectoryError::Validation { missing });
    }

    Ok(NewRecord {
        name: fields.name.trim().to_string(),
        category: fields.category.trim().to_string(),
        location: fields.location.trim().to_string(),
        description: non_blank(&fields.description),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(name: &str, category: &str, location: &str, description: &str) -> FormFields {
        FormFields {
            name: name.to_string(),
            category: category.to_string(),
            location: location.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn missing_name_is_a_validation_error() {
        let err = validate(&fields("", "Retail", "5th Ave", "")).unwrap_err();
        match err {
            DirectoryError::Validation { missing } => assert_eq!(missing, ["name"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn whitespace_only_counts_as_missing() {
        let err = validate(&fields("  ", "\t", "5th Ave", "")).unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::Validation { ref missing } if missing == &["name", "category"]
        ));
    }

    #[test]
    fn valid_fields_are_trimmed_and_blank_description_is_absent() {
        let record = validate(&fields(" Bolt ", " Retail", "5th Ave  ", "   ")).unwrap();
        assert_eq!(
            record,
            NewRecord {
                name: "Bolt".to_string(),
                category: "Retail".to_string(),
                location: "5th Ave".to_string(),
                description: None,
            }
        );
        let record = validate(&fields("Bolt", "Retail", "5th Ave", " Keys cut ")).unwrap();
        assert_eq!(record.description.as_deref(), Some("Keys cut"));
    }

    #[test]
    fn second_submit_is_refused_while_in_flight() {
        let mut form = FormController::default();
        form.open();
        assert!(form.begin_submit(fields("a", "b", "c", "")));
        assert!(!form.begin_submit(fields("x", "y", "z", "")));
        assert_eq!(form.fields().name, "a");
    }

    #[test]
    fn failure_keeps_values_and_success_clears_them() {
        let mut form = FormController::default();
        form.open();
        form.begin_submit(fields("Bolt", "Retail", "5th Ave", "Keys"));
        form.submit_failed();
        assert!(form.is_visible());
        assert!(!form.is_submitting());
        assert_eq!(form.fields().description, "Keys");

        form.begin_submit(fields("Bolt", "Retail", "5th Ave", "Keys"));
        form.submit_succeeded();
        assert!(!form.is_visible());
        assert_eq!(form.fields(), &FormFields::default());
    }

    #[test]
    fn toggle_flips_visibility_and_reset_hides() {
        let mut form = FormController::default();
        form.toggle();
        assert!(form.is_visible());
        form.toggle();
        assert!(!form.is_visible());
        form.open();
        form.set_fields(fields("a", "", "", ""));
        form.reset();
        assert!(!form.is_visible());
        assert!(form.fields().name.is_empty());
    }
}
