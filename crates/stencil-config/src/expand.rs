//! Environment variable and tilde expansion for config values.

use crate::ConfigError;

/// Expand `~`, `$VAR`, `${VAR}`, and `${VAR:-default}` in `value`.
///
/// `field` names the config key for error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::full(value)
        .map(std::borrow::Cow::into_owned)
        .map_err(|e| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", e.var_name),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_unchanged() {
        assert_eq!(expand_env("templates", "site.template_dir").unwrap(), "templates");
    }

    #[test]
    fn test_default_value() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("STENCIL_EXPAND_UNSET");
        }

        let value = expand_env("${STENCIL_EXPAND_UNSET:-public}", "site.output_dir").unwrap();

        assert_eq!(value, "public");
    }

    #[test]
    fn test_missing_variable() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("STENCIL_EXPAND_MISSING");
        }

        let err = expand_env("${STENCIL_EXPAND_MISSING}/site", "site.output_dir").unwrap_err();

        assert_eq!(
            err.to_string(),
            "Environment variable error in site.output_dir: ${STENCIL_EXPAND_MISSING} not set"
        );
    }
}
