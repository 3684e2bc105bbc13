//! Secret resolution with keychain integration
//!
//! Resolves secret references like `{keychain.SERVICE}`, `{env.VAR}` and
//! `{file.PATH}` from system keychains, environment variables and files.
//!
//! Unlike config-time `${VAR}` expansion, resolution here is strict: an unset
//! variable, an empty keychain entry or an unreadable file is an error, so a
//! missing pinned record can never silently become an empty string.

use std::process::Command;

use regex::{Captures, Regex};

use crate::config::expand_home;
use crate::{Error, Result};

const SECRET_PATTERN: &str = r"\{(keychain|env|file)\.([^}]+)\}";

/// Secret resolver
///
/// Stateless: every call reads the backing store again, so rotated pins are
/// picked up on the next invocation.
#[derive(Debug, Clone)]
pub struct SecretResolver {
    pattern: Regex,
}

impl SecretResolver {
    /// Create a new secret resolver
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in pattern fails to compile.
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(SECRET_PATTERN)
            .map_err(|e| Error::Internal(format!("Invalid secret pattern: {e}")))?;
        Ok(Self { pattern })
    }

    /// Resolve a value containing secret patterns
    ///
    /// Supports:
    /// - `{keychain.SERVICE}` - macOS Keychain or Linux secret-tool
    /// - `{env.VAR}` - Environment variable
    /// - `{file.PATH}` - File contents (`~` expanded)
    ///
    /// Text outside patterns is kept verbatim.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use pin_authorizer::secrets::SecretResolver;
    /// let resolver = SecretResolver::new().unwrap();
    /// let record = resolver.resolve("{file./etc/pin-authorizer/pins.json}").unwrap();
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`Error::Secret`] if any referenced secret is missing or empty.
    pub fn resolve(&self, value: &str) -> Result<String> {
        let mut failure = None;

        let resolved = self.pattern.replace_all(value, |caps: &Captures| {
            if failure.is_some() {
                return String::new();
            }
            match Self::fetch(&caps[1], &caps[2]) {
                Ok(secret) => secret,
                Err(e) => {
                    failure = Some(e);
                    String::new()
                }
            }
        });

        match failure {
            Some(e) => Err(e),
            None => Ok(resolved.into_owned()),
        }
    }

    fn fetch(kind: &str, name: &str) -> Result<String> {
        match kind {
            "env" => Self::fetch_from_env(name),
            "file" => Self::fetch_from_file(name),
            "keychain" => Self::fetch_from_keychain(name),
            other => Err(Error::Secret(format!("Unknown secret source '{other}'"))),
        }
    }

    fn fetch_from_env(var_name: &str) -> Result<String> {
        match std::env::var(var_name) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            Ok(_) => Err(Error::Secret(format!(
                "Environment variable '{var_name}' is empty"
            ))),
            Err(_) => Err(Error::Secret(format!(
                "Environment variable '{var_name}' is not set"
            ))),
        }
    }

    fn fetch_from_file(path: &str) -> Result<String> {
        let expanded = expand_home(path);
        let contents = std::fs::read_to_string(&expanded)
            .map_err(|e| Error::Secret(format!("Cannot read secret file '{expanded}': {e}")))?;
        if contents.trim().is_empty() {
            return Err(Error::Secret(format!("Secret file '{expanded}' is empty")));
        }
        Ok(contents)
    }

    /// Fetch a secret from the system keychain
    ///
    /// # Platform Support
    ///
    /// - **macOS**: Uses `security find-generic-password`
    /// - **Linux**: Uses `secret-tool lookup`
    /// - **Other**: Returns error
    #[cfg(target_os = "macos")]
    fn fetch_from_keychain(service: &str) -> Result<String> {
        let output = Command::new("security")
            .args(["find-generic-password", "-s", service, "-w"])
            .output()
            .map_err(|e| Error::Secret(format!("Failed to access macOS Keychain: {e}")))?;

        if output.status.success() {
            let secret = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if secret.is_empty() {
                Err(Error::Secret(format!(
                    "Keychain entry '{service}' is empty. Check with: security find-generic-password -s '{service}'"
                )))
            } else {
                Ok(secret)
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(service = service, error = %stderr, "Keychain lookup failed");
            Err(Error::Secret(format!(
                "Keychain entry '{service}' not found. Add it with:\n  \
                security add-generic-password -s '{service}' -a 'pin-authorizer' -w \"$(cat pins.json)\""
            )))
        }
    }

    /// Fetch a secret from the system keychain (Linux)
    #[cfg(target_os = "linux")]
    fn fetch_from_keychain(service: &str) -> Result<String> {
        let output = Command::new("secret-tool")
            .args(["lookup", "service", service])
            .output()
            .map_err(|e| {
                Error::Secret(format!(
                    "Failed to access Linux secret service: {e}. \
                    Is libsecret installed?"
                ))
            })?;

        if output.status.success() {
            let secret = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if secret.is_empty() {
                Err(Error::Secret(format!(
                    "Secret service entry for '{service}' is empty"
                )))
            } else {
                Ok(secret)
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(service = service, error = %stderr, "Secret service lookup failed");
            Err(Error::Secret(format!(
                "Secret service entry for '{service}' not found. Add it with:\n  \
                secret-tool store --label='Pin Authorizer: {service}' service {service} < pins.json"
            )))
        }
    }

    /// Fetch from keychain (unsupported platforms)
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    fn fetch_from_keychain(_service: &str) -> Result<String> {
        Err(Error::Secret(
            "Keychain access is only supported on macOS and Linux. \
            Use {env.VAR} or {file.PATH} instead."
                .to_string(),
        ))
    }
}
