//! Instance credentials with masking for safe logging
//!
//! The password is kept in a `secrecy::SecretString` so that it never shows up
//! in `Debug` output, and is only exposed when the HTTP client builds the
//! Basic authentication header.

use regex::Regex;
use secrecy::{ExposeSecret, SecretString};

/// Username/password pair for Basic authentication
#[derive(Debug, Clone)]
pub struct SecureCredentials {
    username: String,
    password: SecretString,
}

impl SecureCredentials {
    /// Creates credentials from plain values
    ///
    /// # Examples
    ///
    /// ```
    /// use app_repo_publisher::security::SecureCredentials;
    ///
    /// let credentials = SecureCredentials::new("admin", "hunter2-very-secret");
    /// assert_eq!(credentials.username(), "admin");
    /// ```
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into().into()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.expose_secret().is_empty()
    }

    /// Masks a secret for safe logging
    ///
    /// Shows only the first 3 and last 3 characters.
    /// Values shorter than 10 characters are fully masked as "****".
    ///
    /// # Examples
    ///
    /// ```
    /// use app_repo_publisher::security::SecureCredentials;
    ///
    /// assert_eq!(SecureCredentials::mask("abcdef123456"), "abc...456");
    /// assert_eq!(SecureCredentials::mask("short"), "****");
    /// ```
    pub fn mask(secret: &str) -> String {
        if secret.chars().count() < 10 {
            return "****".to_string();
        }

        let chars: Vec<char> = secret.chars().collect();
        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 3..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }

    /// Replaces every occurrence of the password in `text` with its masked form
    pub fn redact(&self, text: &str) -> String {
        let secret = self.password.expose_secret();
        if secret.is_empty() {
            return text.to_string();
        }

        match Regex::new(&regex::escape(secret)) {
            Ok(pattern) => pattern
                .replace_all(text, Self::mask(secret).as_str())
                .to_string(),
            Err(_) => text.to_string(),
        }
    }
}
