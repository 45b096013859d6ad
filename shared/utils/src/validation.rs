use crate::error::{LabQcError, LabQcResult};
use validator::{Validate, ValidationErrors};

pub fn validate_model<T: Validate>(model: &T) -> LabQcResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let error_messages = format_validation_errors(&errors);
            Err(LabQcError::validation("model", error_messages))
        }
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();

    let mut field_errors: Vec<_> = errors.field_errors().into_iter().collect();
    field_errors.sort_by_key(|(field, _)| *field);

    for (field, field_errors) in field_errors {
        for error in field_errors {
            let message = match (&error.message, error.code.as_ref()) {
                (Some(message), _) => format!("{}: {}", field, message),
                (None, "length") => format!("Length validation failed for field '{}'", field),
                (None, "range") => format!("Value out of range for field '{}'", field),
                (None, "required") => format!("Field '{}' is required", field),
                (None, code) => format!("Validation failed for field '{}': {}", field, code),
            };
            messages.push(message);
        }
    }

    messages.join(", ")
}

/// Requires a finite value strictly greater than zero.
pub fn validate_positive(field: &str, value: f64) -> LabQcResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(LabQcError::validation(
            field,
            format!("must be a positive number, got {}", value),
        ));
    }

    Ok(())
}

pub fn validate_not_blank(field: &str, value: &str) -> LabQcResult<()> {
    if value.trim().is_empty() {
        return Err(LabQcError::validation(field, "must not be empty"));
    }

    Ok(())
}
