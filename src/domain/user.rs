use crate::domain::error::{DomainError, FieldError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 30;
const PASSWORD_MIN: usize = 6;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields of a user that may leave the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUser {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Registration data that passed validation; the password is still plain text.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl CreateUser {
    pub fn validate(self) -> Result<NewUser, DomainError> {
        let mut errors = Vec::new();

        let username = self.username.trim().to_string();
        let len = username.chars().count();
        if username.is_empty() {
            errors.push(FieldError::new("username", "Username is required"));
        } else if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
            errors.push(FieldError::new(
                "username",
                format!("Username must be between {USERNAME_MIN} and {USERNAME_MAX} characters"),
            ));
        } else if !username.chars().all(|c| c.is_alphanumeric() || c == '_') {
            errors.push(FieldError::new(
                "username",
                "Username may only contain letters, numbers and underscores",
            ));
        }

        let email = self.email.trim().to_lowercase();
        if !looks_like_email(&email) {
            errors.push(FieldError::new("email", "Please provide a valid email"));
        }

        if self.password.chars().count() < PASSWORD_MIN {
            errors.push(FieldError::new(
                "password",
                format!("Password must be at least {PASSWORD_MIN} characters long"),
            ));
        }

        if !errors.is_empty() {
            return Err(DomainError::InvalidInput(errors));
        }

        Ok(NewUser {
            username,
            email,
            password: self.password,
        })
    }
}

fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

/// Login accepts either a username or an email as the identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub password: String,
}

impl LoginRequest {
    pub fn with_username(username: &str, password: &str) -> Self {
        Self {
            username: Some(username.to_string()),
            email: None,
            password: password.to_string(),
        }
    }

    pub fn with_email(email: &str, password: &str) -> Self {
        Self {
            username: None,
            email: Some(email.to_string()),
            password: password.to_string(),
        }
    }

    /// Returns the trimmed identifier, preferring `username` when both are sent.
    pub fn identifier(&self) -> Result<String, DomainError> {
        let mut errors = Vec::new();
        let identifier = self
            .username
            .as_deref()
            .or(self.email.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        if identifier.is_none() {
            errors.push(FieldError::new("username", "Username or email is required"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "Password is required"));
        }
        match identifier {
            Some(id) if errors.is_empty() => Ok(id),
            _ => Err(DomainError::InvalidInput(errors)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(username: &str, email: &str, password: &str) -> CreateUser {
        CreateUser {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_and_normalizes() {
        let user = create(" alice ", "Alice@X.com", "pw123456").validate().unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@x.com");
    }

    #[test]
    fn test_validate_reports_every_bad_field() {
        let err = create("", "nope", "123").validate().unwrap_err();
        match err {
            DomainError::InvalidInput(errors) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
                assert_eq!(fields, vec!["username", "email", "password"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_validate_rejects_username_with_symbols() {
        assert!(create("al ice", "a@b.co", "pw123456").validate().is_err());
        assert!(create("al", "a@b.co", "pw123456").validate().is_err());
    }

    #[test]
    fn test_email_shapes() {
        assert!(looks_like_email("a@b.co"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.co"));
        assert!(!looks_like_email("a@@b.co"));
        assert!(!looks_like_email("a b@c.co"));
    }

    #[test]
    fn test_login_identifier_prefers_username() {
        let req = LoginRequest {
            username: Some("alice".to_string()),
            email: Some("alice@x.com".to_string()),
            password: "pw".to_string(),
        };
        assert_eq!(req.identifier().unwrap(), "alice");
        assert_eq!(
            LoginRequest::with_email(" alice@x.com ", "pw").identifier().unwrap(),
            "alice@x.com"
        );
    }

    #[test]
    fn test_login_identifier_requires_fields() {
        let err = LoginRequest::default().identifier().unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(ref e) if e.len() == 2));
    }
}
