//! Per-user configuration root resolution
//!
//! Maps the host OS to the directory under which application config
//! directories live. Unrecognized platforms fail explicitly; guessing a
//! default would scatter config files in places nothing ever reads.

use std::path::PathBuf;

/// Errors from platform directory resolution
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("unsupported platform: '{0}' (only windows and linux are supported)")]
    Unsupported(String),

    #[error("environment variable '{0}' is not set")]
    MissingEnv(String),
}

/// The per-user configuration root for the current platform.
///
/// Windows: `%HOMEPATH%\AppData\Roaming`. Linux: `$XDG_CONFIG_HOME` when set
/// and non-empty, else `$HOME/.config`. Anything else fails with
/// [`PlatformError::Unsupported`].
pub fn config_prefix() -> Result<PathBuf, PlatformError> {
    resolve(std::env::consts::OS, |name| std::env::var(name).ok())
}

fn resolve(
    os: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Result<PathBuf, PlatformError> {
    match os {
        "windows" => {
            let home = env("HOMEPATH")
                .ok_or_else(|| PlatformError::MissingEnv("HOMEPATH".to_string()))?;
            Ok(PathBuf::from(home).join("AppData").join("Roaming"))
        }
        "linux" => {
            if let Some(xdg) = env("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
                return Ok(PathBuf::from(xdg));
            }
            let home =
                env("HOME").ok_or_else(|| PlatformError::MissingEnv("HOME".to_string()))?;
            Ok(PathBuf::from(home).join(".config"))
        }
        other => Err(PlatformError::Unsupported(other.to_string())),
    }
}
