//! Config redaction: produce safe-to-display config snapshots.

use serde_json::Value;

use crate::schema::EsprobeConfig;

/// Keys whose string values are secrets.
static SECRET_KEYS: &[&str] = &["apiKey", "api_key", "token", "secret", "password"];

fn is_secret_key(key: &str) -> bool {
    SECRET_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

/// Serialize the config with every secret replaced by a short hint.
pub fn redact(config: &EsprobeConfig) -> Value {
    let value = serde_json::to_value(config).unwrap_or(Value::Null);
    redact_value(&value, "")
}

/// Mask a secret, keeping the first four characters as a hint.
pub fn mask_secret(secret: &str) -> String {
    if secret.chars().count() > 8 {
        format!("{}***", secret.chars().take(4).collect::<String>())
    } else {
        "***".to_string()
    }
}

fn redact_value(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) if is_secret_key(key) && !s.is_empty() => Value::String(mask_secret(s)),
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_value(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_value(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_api_key() {
        let mut config = EsprobeConfig::default();
        config.gemini.api_key = Some("AIzaSyD-very-secret-value".into());

        let redacted = redact(&config);
        let key = redacted["gemini"]["apiKey"].as_str().unwrap();
        assert_eq!(key, "AIza***");
        assert_eq!(redacted["gemini"]["model"], config.gemini.model.as_str());
    }

    #[test]
    fn short_secrets_are_fully_masked() {
        assert_eq!(mask_secret("abc"), "***");
    }
}
