// Form and filter validation shared by search, cart and checkout

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    Required(String),

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: String,
        min: i64,
        max: i64,
        value: i64,
    },

    #[error("Date {0} is in the past")]
    DateInPast(NaiveDate),

    #[error("Invalid format for {field}: {value}")]
    InvalidFormat { field: String, value: String },
}

pub fn require(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required(field.to_string()));
    }
    Ok(())
}

pub fn check_range(field: &str, value: i64, min: i64, max: i64) -> Result<(), ValidationError> {
    if value < min || value > max {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max,
            value,
        });
    }
    Ok(())
}

// Loose check: one '@', non-empty local part, a dot somewhere in the domain
pub fn check_email(field: &str, value: &str) -> Result<(), ValidationError> {
    let value = value.trim();
    let valid = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}
