//! Pet name and type validation
//!
//! Checked at the boundary, before a record is created.

use crate::error::{PetError, Result};

pub const MAX_NAME_CHARS: usize = 20;

/// Trim and validate a pet name: 1..=20 characters, at least one letter.
pub fn validate_pet_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(PetError::InvalidInput("pet name must not be empty".into()));
    }
    if name.chars().count() > MAX_NAME_CHARS {
        return Err(PetError::InvalidInput(format!(
            "pet name must be at most {} characters",
            MAX_NAME_CHARS
        )));
    }
    if !name.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(PetError::InvalidInput(
            "pet name must contain at least one letter".into(),
        ));
    }
    if name.chars().any(char::is_control) {
        return Err(PetError::InvalidInput(
            "pet name must not contain control characters".into(),
        ));
    }
    Ok(name.to_string())
}

/// Pet types are asset keys such as `blueSheep`: ASCII letters and digits.
pub fn validate_pet_type(raw: &str) -> Result<String> {
    let pet_type = raw.trim();
    if pet_type.is_empty() {
        return Err(PetError::InvalidInput("pet type must not be empty".into()));
    }
    if !pet_type.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(PetError::InvalidInput(format!(
            "pet type '{}' must be letters and digits only",
            pet_type
        )));
    }
    Ok(pet_type.to_string())
}
