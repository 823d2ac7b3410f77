use crate::constants::MAX_DOMAIN_PATTERN_LEN;
use crate::error::AppError;
use crate::models::Settings;

/// Validate a whitelist/blacklist entry. Returns the trimmed pattern.
///
/// Case is preserved: matching is case-sensitive.
pub fn validate_domain_pattern(field: &'static str, pattern: &str) -> Result<String, AppError> {
    let pattern = pattern.trim();
    let err = |reason: String| AppError::InvalidInput { field, reason };

    if pattern.is_empty() {
        return Err(err("patterns cannot be empty".into()));
    }
    if pattern.len() > MAX_DOMAIN_PATTERN_LEN {
        return Err(err(format!("'{pattern}' exceeds {MAX_DOMAIN_PATTERN_LEN} characters")));
    }
    if pattern.chars().any(|c| c.is_whitespace() || c == '/' || c == ':') {
        return Err(err(format!("'{pattern}' must be a bare domain such as example.com")));
    }
    Ok(pattern.to_string())
}

fn validate_domain_list(field: &'static str, patterns: &[String]) -> Result<Vec<String>, AppError> {
    let mut cleaned: Vec<String> = Vec::with_capacity(patterns.len());
    for pattern in patterns {
        let pattern = validate_domain_pattern(field, pattern)?;
        if !cleaned.contains(&pattern) {
            cleaned.push(pattern);
        }
    }
    Ok(cleaned)
}

/// Validate settings received from the extension. Returns the cleaned settings.
///
/// Numeric values are taken as given; only the domain lists are checked.
pub fn validate_settings(settings: &Settings) -> Result<Settings, AppError> {
    Ok(Settings {
        whitelist: validate_domain_list("whitelist", &settings.whitelist)?,
        blacklist: validate_domain_list("blacklist", &settings.blacklist)?,
        ..settings.clone()
    })
}
