//! Driver executable location and client options.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Overrides the driver executable path.
pub const DRIVER_PATH_ENV: &str = "ALETO_DRIVER_PATH";
/// Selects the transport: `oneshot` or `persistent`.
pub const DRIVER_MODE_ENV: &str = "ALETO_DRIVER_MODE";

/// Driver location relative to the running executable's directory.
pub const DRIVER_RELATIVE_DIR: &str = "bin";
pub const DRIVER_FILE_STEM: &str = "aleto-driver";

/// How requests reach the driver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransportKind {
    /// One process per request, argv in, JSON out.
    OneShot,
    /// One long-lived `serve` process exchanging JSON lines.
    #[default]
    Persistent,
}

impl TransportKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "oneshot" | "one-shot" | "one_shot" => Some(Self::OneShot),
            "persistent" | "serve" => Some(Self::Persistent),
            _ => None,
        }
    }
}

/// Settings of a `DriverClient`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverOptions {
    /// Explicit executable; `None` means next to the running program.
    pub driver_path: Option<PathBuf>,
    pub transport: TransportKind,
}

impl DriverOptions {
    pub fn with_driver_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.driver_path = Some(path.into());
        self
    }

    pub fn with_transport(mut self, transport: TransportKind) -> Self {
        self.transport = transport;
        self
    }

    /// Defaults overridden by `ALETO_DRIVER_PATH` and `ALETO_DRIVER_MODE`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(path) = lookup(DRIVER_PATH_ENV).filter(|p| !p.is_empty()) {
            options.driver_path = Some(PathBuf::from(path));
        }
        if let Some(mode) = lookup(DRIVER_MODE_ENV) {
            match TransportKind::from_str(&mode) {
                Some(kind) => options.transport = kind,
                None => tracing::warn!(%mode, "ignoring unknown {}", DRIVER_MODE_ENV),
            }
        }

        options
    }

    /// The executable to run: the explicit path, else the default location.
    pub fn resolve_driver_path(&self) -> Result<PathBuf> {
        match &self.driver_path {
            Some(path) => Ok(path.clone()),
            None => default_driver_path(),
        }
    }
}

/// Directory containing the running executable.
pub fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("cannot determine the running executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("executable {} has no parent directory", exe.display()))
}

/// `<executable dir>/bin/aleto-driver`, with the platform's executable suffix.
pub fn default_driver_path() -> Result<PathBuf> {
    Ok(driver_path_in(&executable_dir()?))
}

pub fn driver_path_in(dir: &Path) -> PathBuf {
    dir.join(DRIVER_RELATIVE_DIR).join(format!(
        "{}{}",
        DRIVER_FILE_STEM,
        std::env::consts::EXE_SUFFIX
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_options() {
        let options = DriverOptions::from_lookup(lookup(&[]));
        assert_eq!(options, DriverOptions::default());
        assert_eq!(options.transport, TransportKind::Persistent);
    }

    #[test]
    fn test_env_overrides() {
        let options = DriverOptions::from_lookup(lookup(&[
            (DRIVER_PATH_ENV, "/usr/lib/aleto/driver"),
            (DRIVER_MODE_ENV, "OneShot"),
        ]));
        assert_eq!(options.transport, TransportKind::OneShot);
        assert_eq!(
            options.resolve_driver_path().unwrap(),
            PathBuf::from("/usr/lib/aleto/driver")
        );
    }

    #[test]
    fn test_unknown_mode_keeps_default() {
        let options = DriverOptions::from_lookup(lookup(&[(DRIVER_MODE_ENV, "carrier-pigeon")]));
        assert_eq!(options.transport, TransportKind::Persistent);
    }

    #[test]
    fn test_default_location_next_to_executable() {
        let path = default_driver_path().unwrap();
        let dir = executable_dir().unwrap();
        assert!(path.starts_with(&dir));
        assert_eq!(path, driver_path_in(&dir));
        assert!(
            path.file_name()
                .is_some_and(|name| name.to_string_lossy().starts_with("aleto-driver"))
        );
        assert_eq!(
            path.parent().and_then(|p| p.file_name()),
            Some(std::ffi::OsStr::new("bin"))
        );
    }
}
