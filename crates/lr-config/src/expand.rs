//! `${VAR}` expansion for string settings.
//!
//! Only the braced form is recognised. `${VAR:-default}` falls back to
//! `default` when `VAR` is unset; a bare `${VAR}` that is unset is an error.

use crate::ConfigError;

/// Name of an environment variable that was referenced but not set.
struct MissingVar(String);

/// Expand environment references in `value`, reporting failures against `field`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    // `$name` without braces is left alone (e.g. literal dollars in URLs)
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let lookup = |name: &str| -> Result<Option<String>, MissingVar> {
        std::env::var(name)
            .map(Some)
            .map_err(|_| MissingVar(name.to_owned()))
    };

    match shellexpand::env_with_context(value, lookup) {
        Ok(expanded) => Ok(expanded.into_owned()),
        Err(e) => Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.cause.0),
        }),
    }
}
