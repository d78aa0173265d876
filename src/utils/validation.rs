use std::borrow::Cow;

use validator::{ValidateEmail, ValidationError};

/// A field error carrying both a machine code and a readable message.
pub fn error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub fn is_email(value: &str) -> bool {
    value.validate_email()
}
