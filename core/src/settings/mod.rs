//! Configuration resolution with explicit precedence.
//!
//! [`PrioritizedSetting`] resolves a configuration value from a strict
//! precedence chain: an immediate call-site argument wins over a user-set
//! value, which wins over an environment variable, which wins over a
//! runtime system hook, which wins over the built-in default. The first
//! populated source is used; if no source is populated, resolution fails.
//!
//! A `PrioritizedSetting` is a plain mutable value and is not internally
//! thread-safe; the owning client provides synchronization. The
//! process-wide [`ClientSettings`] container does exactly that for the
//! settings this crate consumes itself.

use crate::utils::env;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;

pub mod convert;

/// Errors raised while resolving a setting.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// No source in the precedence chain produced a value.
    #[error("no configured value found for setting '{name}'")]
    Unresolved { name: String },

    /// An environment value could not be converted to the target type.
    #[error("invalid value '{value}' for setting '{name}': {reason}")]
    Conversion {
        name: String,
        value: String,
        reason: String,
    },
}

/// Converter from the raw environment string form to the typed value.
pub type Converter<T> = fn(&str) -> Result<T, String>;

/// Runtime fallback source consulted between environment and default.
pub type SystemHook<T> = Box<dyn Fn() -> Option<T> + Send + Sync>;

/// A configuration value resolved from a strict precedence chain.
///
/// Sources, highest precedence first:
///
/// 1. an immediate argument passed to [`value_or`](Self::value_or)
/// 2. the user-set value ([`set_value`](Self::set_value))
/// 3. the environment variable named by
///    [`with_env_var`](Self::with_env_var), run through the converter
/// 4. the system hook ([`with_system_hook`](Self::with_system_hook))
/// 5. the default ([`with_default`](Self::with_default))
pub struct PrioritizedSetting<T: Clone> {
    name: &'static str,
    convert: Converter<T>,
    env_var: Option<&'static str>,
    system_hook: Option<SystemHook<T>>,
    default: Option<T>,
    user_value: Option<T>,
}

impl<T: Clone> PrioritizedSetting<T> {
    /// Create a setting with no sources populated besides the converter.
    pub fn new(name: &'static str, convert: Converter<T>) -> Self {
        Self {
            name,
            convert,
            env_var: None,
            system_hook: None,
            default: None,
            user_value: None,
        }
    }

    /// Attach an environment variable source.
    pub fn with_env_var(mut self, var: &'static str) -> Self {
        self.env_var = Some(var);
        self
    }

    /// Attach a runtime hook consulted when no stronger source is set.
    pub fn with_system_hook(
        mut self,
        hook: impl Fn() -> Option<T> + Send + Sync + 'static,
    ) -> Self {
        self.system_hook = Some(Box::new(hook));
        self
    }

    /// Attach a default value, the weakest source.
    pub fn with_default(mut self, value: T) -> Self {
        self.default = Some(value);
        self
    }

    /// The setting's name, used in error messages.
    pub fn name(&self) -> &str {
        self.name
    }

    /// The environment variable backing this setting, if any.
    pub fn env_var(&self) -> Option<&str> {
        self.env_var
    }

    /// The default value, if any.
    pub fn default(&self) -> Option<&T> {
        self.default.as_ref()
    }

    /// Set the user-level value, overriding environment, hook, and default.
    pub fn set_value(&mut self, value: T) {
        self.user_value = Some(value);
    }

    /// Clear the user-level value.
    pub fn unset_value(&mut self) {
        self.user_value = None;
    }

    /// Resolve the setting from the precedence chain.
    pub fn value(&self) -> Result<T, SettingsError> {
        self.resolve(None)
    }

    /// Resolve the setting, letting `immediate` (an explicit call-site
    /// argument) win over every other source when present.
    pub fn value_or(&self, immediate: Option<T>) -> Result<T, SettingsError> {
        self.resolve(immediate)
    }

    fn resolve(&self, immediate: Option<T>) -> Result<T, SettingsError> {
        if let Some(value) = immediate {
            return Ok(value);
        }
        if let Some(value) = &self.user_value {
            return Ok(value.clone());
        }
        if let Some(var) = self.env_var {
            if let Some(raw) = env::optional_var(var) {
                return (self.convert)(&raw).map_err(|reason| SettingsError::Conversion {
                    name: self.name.to_string(),
                    value: raw,
                    reason,
                });
            }
        }
        if let Some(hook) = &self.system_hook {
            if let Some(value) = hook() {
                return Ok(value);
            }
        }
        if let Some(value) = &self.default {
            return Ok(value.clone());
        }
        Err(SettingsError::Unresolved {
            name: self.name.to_string(),
        })
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for PrioritizedSetting<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrioritizedSetting")
            .field("name", &self.name)
            .field("env_var", &self.env_var)
            .field("default", &self.default)
            .field("user_value", &self.user_value)
            .field("has_system_hook", &self.system_hook.is_some())
            .finish()
    }
}

/// Process-wide client settings, resolved lazily on first use.
///
/// Each setting is lock-guarded so the container can be shared freely;
/// the settings themselves follow the usual precedence chain, with
/// `STRATUS_*` environment variables as the environment source.
pub struct ClientSettings {
    log_level: RwLock<PrioritizedSetting<log::LevelFilter>>,
    request_timeout_secs: RwLock<PrioritizedSetting<u64>>,
    max_retries: RwLock<PrioritizedSetting<u32>>,
}

impl ClientSettings {
    fn new() -> Self {
        Self {
            log_level: RwLock::new(
                PrioritizedSetting::new("log_level", convert::parse_level)
                    .with_env_var("STRATUS_LOG_LEVEL")
                    .with_default(log::LevelFilter::Warn),
            ),
            request_timeout_secs: RwLock::new(
                PrioritizedSetting::new("request_timeout_secs", convert::parse_u64)
                    .with_env_var("STRATUS_REQUEST_TIMEOUT")
                    .with_default(30),
            ),
            max_retries: RwLock::new(
                PrioritizedSetting::new("max_retries", convert::parse_u32)
                    .with_env_var("STRATUS_MAX_RETRIES")
                    .with_default(3),
            ),
        }
    }

    /// Resolve the effective log level filter.
    pub fn log_level(&self) -> Result<log::LevelFilter, SettingsError> {
        self.log_level
            .read()
            .map_err(|_| SettingsError::Unresolved {
                name: "log_level".to_string(),
            })?
            .value()
    }

    /// Override the log level at the user-set precedence level.
    pub fn set_log_level(&self, level: log::LevelFilter) {
        if let Ok(mut setting) = self.log_level.write() {
            setting.set_value(level);
        }
    }

    /// Resolve the effective per-request timeout.
    pub fn request_timeout(&self) -> Result<Duration, SettingsError> {
        let secs = self
            .request_timeout_secs
            .read()
            .map_err(|_| SettingsError::Unresolved {
                name: "request_timeout_secs".to_string(),
            })?
            .value()?;
        Ok(Duration::from_secs(secs))
    }

    /// Override the per-request timeout at the user-set precedence level.
    pub fn set_request_timeout(&self, timeout: Duration) {
        if let Ok(mut setting) = self.request_timeout_secs.write() {
            setting.set_value(timeout.as_secs());
        }
    }

    /// Resolve the effective retry budget for transient failures.
    pub fn max_retries(&self) -> Result<u32, SettingsError> {
        self.max_retries
            .read()
            .map_err(|_| SettingsError::Unresolved {
                name: "max_retries".to_string(),
            })?
            .value()
    }

    /// Override the retry budget at the user-set precedence level.
    pub fn set_max_retries(&self, retries: u32) {
        if let Ok(mut setting) = self.max_retries.write() {
            setting.set_value(retries);
        }
    }
}

static SETTINGS: Lazy<ClientSettings> = Lazy::new(ClientSettings::new);

/// The process-wide [`ClientSettings`] instance.
pub fn settings() -> &'static ClientSettings {
    &SETTINGS
}
