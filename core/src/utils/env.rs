//! Environment variable access with validation.
//!
//! Values are trimmed before use; a variable that is set but empty (or
//! whitespace-only) is treated the same as an unset one. This is the
//! environment source behind [`crate::settings::PrioritizedSetting`].

use thiserror::Error;

/// Errors that can occur when reading an environment variable.
#[derive(Debug, Error)]
pub enum EnvVarError {
    /// The variable is not set at all.
    #[error("environment variable '{name}' is not set")]
    NotFound { name: String },

    /// The variable contains bytes that are not valid UTF-8.
    #[error("environment variable '{name}' contains invalid UTF-8")]
    InvalidUtf8 { name: String },

    /// The variable is set but empty or whitespace-only.
    #[error("environment variable '{name}' is empty")]
    Empty { name: String },
}

/// Read an environment variable, requiring a non-empty value.
///
/// The returned value is trimmed of surrounding whitespace.
pub fn require_var(name: &str) -> Result<String, EnvVarError> {
    match std::env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(EnvVarError::Empty {
                    name: name.to_string(),
                })
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(std::env::VarError::NotPresent) => Err(EnvVarError::NotFound {
            name: name.to_string(),
        }),
        Err(std::env::VarError::NotUnicode(_)) => Err(EnvVarError::InvalidUtf8 {
            name: name.to_string(),
        }),
    }
}

/// Read an environment variable, treating missing, empty, or invalid
/// values as `None`.
pub fn optional_var(name: &str) -> Option<String> {
    require_var(name).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_var_is_not_found() {
        let err = require_var("STRATUS_TEST_ENV_MISSING").unwrap_err();
        assert!(matches!(err, EnvVarError::NotFound { .. }));
    }

    #[test]
    fn test_empty_var_is_rejected() {
        unsafe { std::env::set_var("STRATUS_TEST_ENV_EMPTY", "   ") };
        let err = require_var("STRATUS_TEST_ENV_EMPTY").unwrap_err();
        assert!(matches!(err, EnvVarError::Empty { .. }));
    }

    #[test]
    fn test_value_is_trimmed() {
        unsafe { std::env::set_var("STRATUS_TEST_ENV_TRIM", "  value  ") };
        assert_eq!(require_var("STRATUS_TEST_ENV_TRIM").unwrap(), "value");
        assert_eq!(
            optional_var("STRATUS_TEST_ENV_TRIM").as_deref(),
            Some("value")
        );
    }
}
