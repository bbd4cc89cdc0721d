//! Input validation for AlumniConnect.
//!
//! Everything here runs before a remote call is made, so a malformed form
//! never reaches the data service.

use thiserror::Error;
use url::Url;

/// Minimum password length accepted by the auth service.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum password length.
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum full name length.
pub const MAX_FULL_NAME_LENGTH: usize = 100;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Earliest accepted graduation year.
pub const MIN_BATCH_YEAR: u16 = 1900;

/// Latest accepted graduation year.
pub const MAX_BATCH_YEAR: u16 = 2100;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("email is required")]
    EmailEmpty,

    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    #[error("invalid email format")]
    EmailInvalidFormat,

    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,

    #[error("password must be at most {MAX_PASSWORD_LENGTH} characters")]
    PasswordTooLong,

    #[error("full name is required")]
    FullNameEmpty,

    #[error("full name must be at most {MAX_FULL_NAME_LENGTH} characters")]
    FullNameTooLong,

    #[error("full name contains invalid characters")]
    FullNameInvalidChars,

    /// Batch is not a four digit year in range.
    #[error("batch must be a year between {MIN_BATCH_YEAR} and {MAX_BATCH_YEAR}")]
    BatchInvalid,

    #[error("{0} is required")]
    RequiredField(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("{0} must be an http or https URL")]
    InvalidUrl(&'static str),

    #[error("you cannot send a connection request to yourself")]
    SelfConnection,

    #[error("this event is fully booked")]
    EventFullyBooked,
}

/// Validate an email address (required).
///
/// # Examples
///
/// ```
/// use alumni_connect::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("").is_err());
/// assert!(validate_email("invalid").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::EmailEmpty);
    }
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }
    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::EmailInvalidFormat);
    };
    if local.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ValidationError::EmailInvalidFormat);
    }
    if domain.split('.').any(|p| p.is_empty()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}

/// Validate a password. Length is counted in characters.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooShort);
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::PasswordTooLong);
    }
    Ok(())
}

/// Validate a sign-in form.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    validate_email(email)?;
    if password.is_empty() {
        return Err(ValidationError::RequiredField("password"));
    }
    Ok(())
}

/// Validate a full name.
///
/// ```
/// use alumni_connect::auth::validation::validate_full_name;
///
/// assert!(validate_full_name("Ada Lovelace").is_ok());
/// assert!(validate_full_name("   ").is_err());
/// ```
pub fn validate_full_name(full_name: &str) -> Result<(), ValidationError> {
    if full_name.trim().is_empty() {
        return Err(ValidationError::FullNameEmpty);
    }
    if full_name.chars().count() > MAX_FULL_NAME_LENGTH {
        return Err(ValidationError::FullNameTooLong);
    }
    if full_name.chars().any(|c| c.is_control()) {
        return Err(ValidationError::FullNameInvalidChars);
    }
    Ok(())
}

/// Validate a graduation year such as "2022".
pub fn validate_batch(batch: &str) -> Result<(), ValidationError> {
    if batch.len() != 4 || !batch.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::BatchInvalid);
    }
    match batch.parse::<u16>() {
        Ok(year) if (MIN_BATCH_YEAR..=MAX_BATCH_YEAR).contains(&year) => Ok(()),
        _ => Err(ValidationError::BatchInvalid),
    }
}

/// Validate a required text field.
pub fn validate_required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::RequiredField(field));
    }
    Ok(())
}

/// Validate an optional free-text field against a maximum length.
pub fn validate_optional_text(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<(), ValidationError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong { field, max }),
        _ => Ok(()),
    }
}

/// Validate an optional link. Empty values are accepted.
///
/// ```
/// use alumni_connect::auth::validation::validate_url;
///
/// assert!(validate_url("linkedin_url", Some("https://linkedin.com/in/ada")).is_ok());
/// assert!(validate_url("linkedin_url", None).is_ok());
/// assert!(validate_url("linkedin_url", Some("javascript:alert(1)")).is_err());
/// ```
pub fn validate_url(field: &'static str, value: Option<&str>) -> Result<(), ValidationError> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(());
    };
    match Url::parse(value.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.host().is_some() => Ok(()),
        _ => Err(ValidationError::InvalidUrl(field)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last@mail.example.org").is_ok());
    }

    #[test]
    fn test_validate_email_invalid() {
        assert_eq!(validate_email(""), Err(ValidationError::EmailEmpty));
        assert_eq!(validate_email("  "), Err(ValidationError::EmailEmpty));
        assert_eq!(
            validate_email("no-at-sign"),
            Err(ValidationError::EmailInvalidFormat)
        );
        assert_eq!(
            validate_email("@x.com"),
            Err(ValidationError::EmailInvalidFormat)
        );
        assert_eq!(
            validate_email("a@localhost"),
            Err(ValidationError::EmailInvalidFormat)
        );
        assert_eq!(
            validate_email("a@x..com"),
            Err(ValidationError::EmailInvalidFormat)
        );
        assert_eq!(
            validate_email("a b@x.com"),
            Err(ValidationError::EmailInvalidFormat)
        );
        assert_eq!(
            validate_email("a@b@x.com"),
            Err(ValidationError::EmailInvalidFormat)
        );
    }

    #[test]
    fn test_validate_email_too_long() {
        let email = format!("{}@x.com", "a".repeat(250));
        assert_eq!(validate_email(&email), Err(ValidationError::EmailTooLong));
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert_eq!(
            validate_password("12345"),
            Err(ValidationError::PasswordTooShort)
        );
        assert_eq!(
            validate_password(&"a".repeat(129)),
            Err(ValidationError::PasswordTooLong)
        );
        assert!(validate_password(&"a".repeat(128)).is_ok());
    }

    #[test]
    fn test_validate_credentials() {
        assert!(validate_credentials("a@x.com", "x").is_ok());
        assert_eq!(
            validate_credentials("a@x.com", ""),
            Err(ValidationError::RequiredField("password"))
        );
        assert_eq!(
            validate_credentials("", "secret"),
            Err(ValidationError::EmailEmpty)
        );
    }

    #[test]
    fn test_validate_full_name() {
        assert!(validate_full_name("Ada").is_ok());
        assert_eq!(validate_full_name(""), Err(ValidationError::FullNameEmpty));
        assert_eq!(
            validate_full_name(&"a".repeat(101)),
            Err(ValidationError::FullNameTooLong)
        );
        assert_eq!(
            validate_full_name("Ada\u{0007}"),
            Err(ValidationError::FullNameInvalidChars)
        );
    }

    #[test]
    fn test_validate_batch() {
        assert!(validate_batch("2022").is_ok());
        assert!(validate_batch("1900").is_ok());
        assert_eq!(validate_batch("22"), Err(ValidationError::BatchInvalid));
        assert_eq!(validate_batch("20a2"), Err(ValidationError::BatchInvalid));
        assert_eq!(validate_batch("1899"), Err(ValidationError::BatchInvalid));
        assert_eq!(validate_batch("2101"), Err(ValidationError::BatchInvalid));
    }

    #[test]
    fn test_validate_required_and_optional_text() {
        assert!(validate_required("title", "Meetup").is_ok());
        assert_eq!(
            validate_required("title", " "),
            Err(ValidationError::RequiredField("title"))
        );

        assert!(validate_optional_text("bio", None, 10).is_ok());
        assert!(validate_optional_text("bio", Some("short"), 10).is_ok());
        assert_eq!(
            validate_optional_text("bio", Some("far too long"), 10),
            Err(ValidationError::TooLong {
                field: "bio",
                max: 10
            })
        );
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("resume_url", Some("http://example.com/cv.pdf")).is_ok());
        assert!(validate_url("resume_url", Some("")).is_ok());
        assert_eq!(
            validate_url("resume_url", Some("ftp://example.com/cv.pdf")),
            Err(ValidationError::InvalidUrl("resume_url"))
        );
        assert_eq!(
            validate_url("resume_url", Some("not a url")),
            Err(ValidationError::InvalidUrl("resume_url"))
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ValidationError::RequiredField("title").to_string(),
            "title is required"
        );
        assert_eq!(
            ValidationError::PasswordTooShort.to_string(),
            "password must be at least 6 characters"
        );
    }
}
