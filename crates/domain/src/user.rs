//! Email validation shared by profile writes.

use serde::{Deserialize, Serialize};
use tenantdesk_core::{AppError, AppResult};

/// Validated, lowercased email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// Performs basic structural validation: non-empty, contains exactly one `@`,
    /// local part and domain are non-empty, domain contains at least one `.`.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        let trimmed = value.trim().to_lowercase();

        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "email address must not be empty".to_owned(),
            ));
        }

        let Some((local, domain)) = trimmed.split_once('@') else {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        };

        if local.is_empty() {
            return Err(AppError::Validation(
                "email local part must not be empty".to_owned(),
            ));
        }

        if domain.contains('@') {
            return Err(AppError::Validation(
                "email address must contain exactly one '@'".to_owned(),
            ));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(AppError::Validation(
                "email domain must contain at least one '.'".to_owned(),
            ));
        }

        if trimmed.len() > 254 {
            return Err(AppError::Validation(
                "email address must not exceed 254 characters".to_owned(),
            ));
        }

        Ok(Self(trimmed))
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn valid_email_is_lowercased() {
        let email = EmailAddress::new("  USER@Example.COM ");
        assert_eq!(
            email.map(String::from).unwrap_or_default(),
            "user@example.com"
        );
    }

    #[test]
    fn email_with_two_at_signs_is_rejected() {
        assert!(EmailAddress::new("a@b@example.com").is_err());
    }

    #[test]
    fn email_without_domain_dot_is_rejected() {
        assert!(EmailAddress::new("user@nodot").is_err());
    }

    #[test]
    fn empty_email_is_rejected() {
        assert!(EmailAddress::new("").is_err());
    }

    proptest! {
        #[test]
        fn accepted_emails_are_already_normalized(
            local in "[A-Za-z0-9._]{1,20}",
            host in "[A-Za-z]{1,20}"
        ) {
            let raw = format!("{local}@{host}.com");
            if let Ok(email) = EmailAddress::new(raw.as_str()) {
                let again = EmailAddress::new(email.as_str());
                prop_assert_eq!(again.ok(), Some(email));
            }
        }
    }
}
