//! Request DTOs with validation.

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use authgate_auth::password::PasswordValidator;

/// Registration request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Unique username: letters, digits and underscores.
    #[validate(custom(function = "check_username"))]
    pub username: String,
    /// Plaintext password, checked against the password policy.
    #[validate(custom(function = "check_password"))]
    pub password: String,
}

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Username.
    #[validate(length(min = 1, message = "Username is required."))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required."))]
    pub password: String,
}

fn check_username(username: &str) -> Result<(), ValidationError> {
    PasswordValidator::new()
        .validate_username(username)
        .map_err(|e| ValidationError::new("username_policy").with_message(e.message.into()))
}

fn check_password(password: &str) -> Result<(), ValidationError> {
    PasswordValidator::new()
        .validate_password(password)
        .map_err(|e| ValidationError::new("password_policy").with_message(e.message.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_register_policy() {
        assert!(register("johndoe_123", "StrongPass!23").validate().is_ok());

        let errors = register("john doe", "weak").validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
    }

    #[test]
    fn test_login_requires_both_fields() {
        let req = LoginRequest {
            username: String::new(),
            password: "x".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("username"));
        assert!(!errors.field_errors().contains_key("password"));
    }
}
