// Field rules shared by the login form and the resource forms.

use crate::error::FieldErrors;
use crate::form::{FieldDescriptor, FieldKind, FormMode, FormValues};

/// Minimum password length for login and user creation.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Basic address check: one `@`, a non-empty local part and a dotted
/// domain without whitespace.
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

/// URL-safe transformation of a display name: lowercase ASCII
/// alphanumerics, everything else collapsed into single hyphens, no
/// leading or trailing hyphen.
pub fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_hyphen = false;
    for ch in value.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Check every descriptor against the current values.
pub(crate) fn check_fields(
    fields: &[FieldDescriptor],
    values: &FormValues,
    mode: FormMode,
    errors: &mut FieldErrors,
) {
    for field in fields {
        if matches!(field.kind, FieldKind::Flag { .. }) {
            continue;
        }
        let value = values.text(field.name).trim();

        if value.is_empty() {
            if field.required {
                errors.insert(field.name.into(), format!("{} is required", field.label));
            }
        } else if field.kind == FieldKind::Email && !is_email(value) {
            errors.insert(
                field.name.into(),
                "Please enter a valid email address".into(),
            );
        } else if field.kind == FieldKind::Select && value.parse::<u64>().is_err() {
            errors.insert(field.name.into(), format!("{} must be a number", field.label));
        }

        if let Some(min) = field.min_len_on_create {
            if mode == FormMode::Create && values.text(field.name).chars().count() < min {
                errors.insert(
                    field.name.into(),
                    format!("{} must be at least {min} characters", field.label),
                );
            }
        }
    }
}
