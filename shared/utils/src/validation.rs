use crate::error::{AuditError, FreightResult};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Run `validator` rules and surface the first failure as a malformed field.
///
/// The `document` label prefixes the failing field path; nested structs extend
/// it, so `RawDocumentSet` failures read e.g. `invoice.invoice_number`.
pub fn validate_model<T: Validate>(document: &str, model: &T) -> FreightResult<()> {
    match model.validate() {
        Ok(()) => Ok(()),
        Err(errors) => {
            let mut failures = flatten_validation_errors(&errors);
            failures.sort();

            let (path, message) = failures
                .into_iter()
                .next()
                .unwrap_or_else(|| (String::new(), "validation failed".to_string()));

            Err(split_path(document, &path, message))
        }
    }
}

/// Every failing field as `(dotted.path, message)`.
pub fn flatten_validation_errors(errors: &ValidationErrors) -> Vec<(String, String)> {
    let mut failures = Vec::new();
    collect(errors, "", &mut failures);
    failures
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<(String, String)>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = match &error.message {
                        Some(message) => message.to_string(),
                        None => match error.code.as_ref() {
                            "length" => "has an invalid length".to_string(),
                            "range" => "is out of range".to_string(),
                            "required" => "is required".to_string(),
                            code => format!("failed '{}' check", code),
                        },
                    };
                    out.push((path.clone(), message));
                }
            }
            ValidationErrorsKind::Struct(inner) => collect(inner, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect(inner, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

/// `invoice.invoice_number` becomes document `invoice`, field `invoice_number`.
fn split_path(document: &str, path: &str, message: String) -> AuditError {
    match path.split_once('.') {
        Some((head, rest)) => AuditError::malformed_field(head, rest, message),
        None => AuditError::malformed_field(document, path, message),
    }
}
