//! Contact form

use serde::Deserialize;
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

/// Reject values that are empty once surrounding whitespace is stripped
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("This field is required".into()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ContactMessage {
    #[validate(
        custom(function = "not_blank"),
        length(max = 120, message = "Name must be at most 120 characters")
    )]
    pub name: String,
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    #[validate(
        custom(function = "not_blank"),
        length(max = 150, message = "Subject must be at most 150 characters")
    )]
    pub subject: String,
    #[validate(custom(function = "not_blank"))]
    pub message: String,
}
