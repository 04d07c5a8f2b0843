use conclave_domain::think::ThinkError;

/// Convert a [`reqwest::Error`] into a [`ThinkError`].
///
/// Timeouts and connection failures are transient (substitutable in-round);
/// everything else surfaces as permanent.
pub(crate) fn from_reqwest(e: reqwest::Error) -> ThinkError {
    if e.is_timeout() || e.is_connect() {
        ThinkError::Transient(e.to_string())
    } else {
        ThinkError::Permanent(e.to_string())
    }
}

/// Resolve the API key for a platform: a plaintext config value takes
/// precedence over the named environment variable; if neither is set,
/// errors naming the env var that was expected.
pub fn resolve_api_key(api_key: &Option<String>, api_key_env: &Option<String>) -> Result<String, ThinkError> {
    if let Some(key) = api_key {
        return Ok(key.clone());
    }

    let env_var = api_key_env
        .as_deref()
        .ok_or_else(|| ThinkError::Permanent("no api_key or api_key_env configured for platform".into()))?;

    std::env::var(env_var).map_err(|_| {
        ThinkError::Permanent(format!(
            "environment variable '{env_var}' not set or not valid UTF-8"
        ))
    })
}

/// Mask substrings that look like API keys or bearer tokens before they are
/// logged or surfaced to a client.
pub fn mask_secrets(msg: &str) -> String {
    let mut result = msg.to_string();
    for word in msg.split(|c: char| c.is_whitespace() || c == '\'' || c == '"' || c == ',') {
        let trimmed = word.trim();
        if trimmed.len() >= 20
            && trimmed
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            let masked = if trimmed.len() > 8 {
                format!("{}...{}", &trimmed[..4], &trimmed[trimmed.len() - 4..])
            } else {
                "***masked***".to_string()
            };
            result = result.replace(trimmed, &masked);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_api_key_reads_env_var() {
        let var_name = "CONCLAVE_TEST_RESOLVE_KEY_1";
        std::env::set_var(var_name, "secret-value");
        let result = resolve_api_key(&None, &Some(var_name.to_string())).unwrap();
        assert_eq!(result, "secret-value");
        std::env::remove_var(var_name);
    }

    #[test]
    fn resolve_api_key_plaintext_takes_precedence_over_env() {
        let var_name = "CONCLAVE_TEST_RESOLVE_KEY_PRECEDENCE";
        std::env::set_var(var_name, "env-value");
        let result = resolve_api_key(&Some("plaintext-value".to_string()), &Some(var_name.to_string())).unwrap();
        assert_eq!(result, "plaintext-value");
        std::env::remove_var(var_name);
    }

    #[test]
    fn resolve_api_key_missing_env_errors() {
        let err = resolve_api_key(&None, &Some("CONCLAVE_TEST_NONEXISTENT_VAR".to_string())).unwrap_err();
        assert!(matches!(err, ThinkError::Permanent(_)));
    }

    #[test]
    fn resolve_api_key_unset_field_errors() {
        let err = resolve_api_key(&None, &None).unwrap_err();
        assert!(matches!(err, ThinkError::Permanent(_)));
    }

    #[test]
    fn mask_secrets_redacts_long_alnum_tokens() {
        let msg = "failed with key sk-abcdefghijklmnopqrstuvwxyz1234 in header";
        let masked = mask_secrets(msg);
        assert!(!masked.contains("abcdefghijklmnopqrstuvwxyz1234"));
    }
}
