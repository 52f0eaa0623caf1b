//! Field-level request validation.

use crate::error::AppError;
use crate::model::Priority;
use regex::Regex;

pub const MAX_USERNAME_LEN: usize = 64;
pub const MAX_EMAIL_LEN: usize = 255;
pub const MAX_TITLE_LEN: usize = 255;

const EMAIL_PATTERN: &str = r"^[^@\s]+@[^@\s]+\.[^@\s]+$";

pub struct RequestValidator;

impl RequestValidator {
    /// Present and not blank. Returns the value trimmed.
    pub fn required<'a>(field: &str, value: Option<&'a str>) -> Result<&'a str, AppError> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v),
            _ => Err(AppError::Validation(format!("{} is required", field))),
        }
    }

    pub fn max_length(field: &str, value: &str, max: usize) -> Result<(), AppError> {
        if value.chars().count() > max {
            return Err(AppError::Validation(format!(
                "{} must be at most {} characters",
                field, max
            )));
        }
        Ok(())
    }

    pub fn email(field: &str, value: &str) -> Result<(), AppError> {
        let re = Regex::new(EMAIL_PATTERN).map_err(|_| AppError::Internal(format!("invalid pattern for {}", field)))?;
        if !re.is_match(value) {
            return Err(AppError::Validation(format!("{} must be a valid email", field)));
        }
        Self::max_length(field, value, MAX_EMAIL_LEN)
    }

    /// Non-blank title within the length limit, trimmed.
    pub fn title(value: Option<&str>) -> Result<String, AppError> {
        let title = Self::required("title", value)?;
        Self::max_length("title", title, MAX_TITLE_LEN)?;
        Ok(title.to_string())
    }

    /// Absent stays absent; present must name one of the enumerated priorities.
    pub fn priority(value: Option<&str>) -> Result<Option<Priority>, AppError> {
        value
            .map(|v| v.parse::<Priority>().map_err(|e| AppError::Validation(e.to_string())))
            .transpose()
    }

    pub fn positive_id(field: &str, value: Option<i64>) -> Result<i64, AppError> {
        match value {
            Some(id) if id > 0 => Ok(id),
            Some(_) => Err(AppError::Validation(format!("{} must be a positive integer", field))),
            None => Err(AppError::Validation(format!("{} is required", field))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank() {
        assert!(RequestValidator::required("username", None).is_err());
        assert!(RequestValidator::required("username", Some("   ")).is_err());
        assert_eq!(RequestValidator::required("username", Some(" ada ")).unwrap(), "ada");
    }

    #[test]
    fn email_format() {
        assert!(RequestValidator::email("email", "ada@example.com").is_ok());
        assert!(RequestValidator::email("email", "ada.example.com").is_err());
        assert!(RequestValidator::email("email", "ada@localhost").is_err());
        assert!(RequestValidator::email("email", "a da@example.com").is_err());
    }

    #[test]
    fn title_length_limit() {
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(RequestValidator::title(Some(&long)).is_err());
        assert_eq!(RequestValidator::title(Some(" Buy milk ")).unwrap(), "Buy milk");
    }

    #[test]
    fn priority_enumeration_enforced() {
        assert_eq!(RequestValidator::priority(None).unwrap(), None);
        assert_eq!(RequestValidator::priority(Some("high")).unwrap(), Some(Priority::High));
        let err = RequestValidator::priority(Some("whenever")).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn ids_must_be_positive() {
        assert_eq!(RequestValidator::positive_id("user_id", Some(3)).unwrap(), 3);
        assert!(RequestValidator::positive_id("user_id", Some(0)).is_err());
        assert!(RequestValidator::positive_id("user_id", None).is_err());
    }
}
