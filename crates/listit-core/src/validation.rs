use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 60;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),
    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },
    #[error("A {kind} named \"{name}\" already exists")]
    Duplicate { kind: &'static str, name: String },
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least 8 characters and include a letter and a number")]
    WeakPassword,
    #[error("Passwords do not match")]
    PasswordMismatch,
}

/// Trimmed, non-empty, bounded name.
pub fn validate_name(field: &'static str, raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(ValidationError::Required(field));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_NAME_LEN,
        });
    }
    Ok(name.to_string())
}

/// Case-insensitive uniqueness among `(id, name)` pairs, ignoring the entity
/// being edited.
pub fn ensure_unique_name<'a, I>(
    kind: &'static str,
    name: &str,
    existing: I,
    editing_id: Option<&str>,
) -> Result<(), ValidationError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let wanted = name.trim().to_lowercase();
    let clash = existing
        .into_iter()
        .filter(|(id, _)| Some(*id) != editing_id)
        .any(|(_, other)| other.trim().to_lowercase() == wanted);
    if clash {
        Err(ValidationError::Duplicate {
            kind,
            name: name.trim().to_string(),
        })
    } else {
        Ok(())
    }
}

pub fn validate_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim();
    if email.is_empty() {
        return Err(ValidationError::Required("Email"));
    }
    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    let domain_ok = domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains('@');
    if local.is_empty() || !domain_ok || email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email.to_string())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Required("Password"));
    }
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if long_enough && has_letter && has_digit {
        Ok(())
    } else {
        Err(ValidationError::WeakPassword)
    }
}

pub fn validate_new_password(password: &str, confirm: &str) -> Result<(), ValidationError> {
    validate_password(password)?;
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}

/// Wait time from a rate-limit message such as
/// "For security purposes, you can only request this after 42 seconds."
pub fn parse_wait_seconds(message: &str) -> Option<u32> {
    let lower = message.to_ascii_lowercase();
    let idx = lower.find("after ")?;
    let digits: String = lower[idx + "after ".len()..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|n| *n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_names_are_rejected() {
        assert_eq!(
            validate_name("List name", "   "),
            Err(ValidationError::Required("List name"))
        );
        assert_eq!(validate_name("List name", "  Home ").unwrap(), "Home");
    }

    #[test]
    fn long_names_are_rejected() {
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(matches!(
            validate_name("Name", &long),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn uniqueness_is_case_insensitive() {
        let existing = [("1", "Work"), ("2", "Home")];
        let err = ensure_unique_name("list", "work ", existing, None).unwrap_err();
        assert_eq!(err.to_string(), "A list named \"work\" already exists");
    }

    #[test]
    fn uniqueness_ignores_entity_being_edited() {
        let existing = [("1", "Work"), ("2", "Home")];
        assert!(ensure_unique_name("list", "WORK", existing, Some("1")).is_ok());
        assert!(ensure_unique_name("list", "home", existing, Some("1")).is_err());
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("user@example.com").is_ok());
        assert_eq!(validate_email("user@localhost"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email("nope"), Err(ValidationError::InvalidEmail));
        assert_eq!(validate_email(""), Err(ValidationError::Required("Email")));
        assert_eq!(validate_email("a b@c.d"), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn password_strength() {
        assert!(validate_password("abc12345").is_ok());
        assert_eq!(validate_password("abcdefgh"), Err(ValidationError::WeakPassword));
        assert_eq!(validate_password("1234567"), Err(ValidationError::WeakPassword));
        assert_eq!(
            validate_new_password("abc12345", "abc12346"),
            Err(ValidationError::PasswordMismatch)
        );
    }

    #[test]
    fn parses_rate_limit_wait() {
        assert_eq!(
            parse_wait_seconds(
                "For security purposes, you can only request this after 42 seconds."
            ),
            Some(42)
        );
        assert_eq!(parse_wait_seconds("Email rate limit exceeded"), None);
    }
}
