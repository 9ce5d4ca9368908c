//! Runtime settings for the supervisor.
//!
//! Everything the lifecycle controller needs is carried in an explicit
//! [`Settings`] value threaded through the entry point; there is no
//! process-wide mutable configuration. Defaults follow the stack layout
//! (`<base>/tmp` for PID files, `<base>/data/log` for logs) and can be
//! overridden by an optional `atlasctl.yml` next to the base directory.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Name of the optional settings overlay file in the base directory.
pub const CONFIG_FILE: &str = "atlasctl.yml";

/// Environment variable pointing at a virtual-runtime root. When set,
/// `<VENV>/bin` is prepended to the PATH of every spawned process and
/// `<VENV>/bin/python` runs the preparation steps.
pub const VENV_ENV: &str = "VENV";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Root of the application checkout; preparation steps run here.
    pub base_dir: PathBuf,
    /// Directory holding one `<role>.pid` file per role.
    pub pid_dir: PathBuf,
    /// Directory holding one `<role>.log` file per role (detached mode only).
    pub log_dir: PathBuf,
    /// Bind host for the application server and gateway.
    pub http_host: String,
    /// Listen port for the application server; the gateway binds the next port.
    pub http_port: u16,
    /// Worker count for roles that support it (app server, task worker).
    pub workers: usize,
    /// Detached mode: redirect role output to log files and exit after start.
    pub daemon: bool,
    /// Seconds to wait for the whole group to become live before rolling back.
    pub start_timeout_secs: u64,
    /// Log level handed to the task-queue roles.
    pub log_level: String,
    /// Virtual-runtime root from the `VENV` environment variable, if set.
    pub venv: Option<PathBuf>,
}

/// Overlay read from `atlasctl.yml`. Every field is optional; absent fields
/// keep their defaults.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    pid_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    http_host: Option<String>,
    http_port: Option<u16>,
    workers: Option<usize>,
    start_timeout_secs: Option<u64>,
    log_level: Option<String>,
}

impl Settings {
    /// Settings with stock defaults rooted at `base_dir`.
    pub fn with_base(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Settings {
            pid_dir: base_dir.join("tmp"),
            log_dir: base_dir.join("data").join("log"),
            http_host: "127.0.0.1".to_string(),
            http_port: 8080,
            workers: 4,
            daemon: false,
            start_timeout_secs: 60,
            log_level: "info".to_string(),
            venv: std::env::var_os(VENV_ENV).map(PathBuf::from),
            base_dir,
        }
    }

    /// Loads settings for `base_dir`, applying the `atlasctl.yml` overlay if
    /// one exists there.
    pub fn load(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let mut settings = Settings::with_base(base_dir);
        let config_path = settings.base_dir.join(CONFIG_FILE);
        if config_path.is_file() {
            let raw = std::fs::read_to_string(&config_path)?;
            let overlay: SettingsFile = serde_yaml::from_str(&raw)?;
            settings.apply(overlay);
            tracing::debug!("loaded settings overlay from {}", config_path.display());
        }
        Ok(settings)
    }

    fn apply(&mut self, overlay: SettingsFile) {
        if let Some(dir) = overlay.pid_dir {
            self.pid_dir = self.absolutize(dir);
        }
        if let Some(dir) = overlay.log_dir {
            self.log_dir = self.absolutize(dir);
        }
        if let Some(host) = overlay.http_host {
            self.http_host = host;
        }
        if let Some(port) = overlay.http_port {
            self.http_port = port;
        }
        if let Some(workers) = overlay.workers {
            self.workers = workers;
        }
        if let Some(secs) = overlay.start_timeout_secs {
            self.start_timeout_secs = secs;
        }
        if let Some(level) = overlay.log_level {
            self.log_level = level;
        }
    }

    fn absolutize(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn start_timeout(&self) -> Duration {
        Duration::from_secs(self.start_timeout_secs)
    }

    /// Port the realtime gateway binds (application port + 1).
    pub fn gateway_port(&self) -> u16 {
        self.http_port.saturating_add(1)
    }

    /// Interpreter used for the preparation steps: `<VENV>/bin/python` when a
    /// virtual-runtime root is configured, otherwise `python` from PATH.
    pub fn python(&self) -> PathBuf {
        match &self.venv {
            Some(venv) => venv.join("bin").join("python"),
            None => PathBuf::from("python"),
        }
    }

    /// Environment applied to every spawned process: UTF-8 stdio and, when a
    /// virtual-runtime root is set, its `bin` directory prepended to PATH.
    pub fn process_env(&self) -> Vec<(String, String)> {
        let mut env = vec![("PYTHONIOENCODING".to_string(), "UTF-8".to_string())];
        if let Some(venv) = &self.venv {
            let bin = venv.join("bin");
            let path = match std::env::var("PATH") {
                Ok(current) => format!("{}:{}", bin.display(), current),
                Err(_) => bin.display().to_string(),
            };
            env.push(("PATH".to_string(), path));
        }
        env
    }

    /// Log file path for a role, used when output is detached.
    pub fn log_file(&self, role: crate::role::Role) -> PathBuf {
        self.log_dir.join(format!("{}.log", role.name()))
    }

    /// Creates the runtime directories (pid, log, data). Failures are logged
    /// and tolerated; the first spawn or PID write will surface a real error.
    pub fn ensure_dirs(&self) {
        let data = self.base_dir.join("data");
        for dir in [
            &self.pid_dir,
            &self.log_dir,
            &data.join("static"),
            &data.join("media"),
        ] {
            if let Err(e) = std::fs::create_dir_all(dir) {
                tracing::warn!("could not create {}: {}", dir.display(), e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::Role;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn defaults_follow_base_dir() {
        let settings = Settings::with_base("/srv/atlas");
        assert_eq!(settings.pid_dir, Path::new("/srv/atlas/tmp"));
        assert_eq!(settings.log_dir, Path::new("/srv/atlas/data/log"));
        assert_eq!(settings.workers, 4);
        assert_eq!(settings.start_timeout_secs, 60);
        assert!(!settings.daemon);
        assert_eq!(settings.gateway_port(), 8081);
    }

    #[test]
    fn load_without_config_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.http_port, 8080);
    }

    #[test]
    fn overlay_overrides_and_resolves_relative_dirs() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            "http_port: 9000\nworkers: 2\npid_dir: run\n",
        )
        .unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.http_port, 9000);
        assert_eq!(settings.workers, 2);
        assert_eq!(settings.pid_dir, dir.path().join("run"));
        // untouched fields keep defaults
        assert_eq!(settings.log_dir, dir.path().join("data/log"));
    }

    #[test]
    fn unknown_overlay_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "htp_port: 9000\n").unwrap();
        assert!(Settings::load(dir.path()).is_err());
    }

    #[test]
    fn python_prefers_venv() {
        let mut settings = Settings::with_base("/srv/atlas");
        settings.venv = Some(PathBuf::from("/opt/venv"));
        assert_eq!(settings.python(), Path::new("/opt/venv/bin/python"));
        settings.venv = None;
        assert_eq!(settings.python(), Path::new("python"));
    }

    #[test]
    fn log_file_per_role() {
        let settings = Settings::with_base("/srv/atlas");
        assert_eq!(
            settings.log_file(Role::Gateway),
            Path::new("/srv/atlas/data/log/gateway.log")
        );
    }
}
