//! Username and password policy for new accounts.

use authgate_core::error::AppError;

/// Characters that satisfy the special-character rule.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Validates usernames and new passwords against the account policy.
#[derive(Debug, Clone)]
pub struct PasswordValidator {
    username_min: usize,
    username_max: usize,
    password_min: usize,
    password_max: usize,
}

impl Default for PasswordValidator {
    fn default() -> Self {
        Self {
            username_min: 3,
            username_max: 50,
            password_min: 8,
            password_max: 128,
        }
    }
}

impl PasswordValidator {
    /// Creates a validator with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks a username: length bounds, then letters, digits and underscores only.
    pub fn validate_username(&self, username: &str) -> Result<(), AppError> {
        let len = username.chars().count();
        if len < self.username_min || len > self.username_max {
            return Err(AppError::validation(format!(
                "Username must be between {} and {} characters long.",
                self.username_min, self.username_max
            )));
        }

        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(AppError::validation(
                "Username may contain only letters, digits, and underscores.",
            ));
        }

        Ok(())
    }

    /// Validates a new password against all policies.
    ///
    /// Returns an error describing the first violation found.
    pub fn validate_password(&self, password: &str) -> Result<(), AppError> {
        let len = password.chars().count();
        if len < self.password_min {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long.",
                self.password_min
            )));
        }
        if len > self.password_max {
            return Err(AppError::validation(format!(
                "Password must be at most {} characters long.",
                self.password_max
            )));
        }

        if !password.chars().any(|c| c.is_ascii_uppercase()) {
            return Err(AppError::validation(
                "Password must contain at least one uppercase letter.",
            ));
        }

        if !password.chars().any(|c| c.is_ascii_lowercase()) {
            return Err(AppError::validation(
                "Password must contain at least one lowercase letter.",
            ));
        }

        if !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(AppError::validation(
                "Password must contain at least one digit.",
            ));
        }

        if !password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)) {
            return Err(AppError::validation(
                "Password must contain at least one special character.",
            ));
        }

        Ok(())
    }
}
