//! Support for user-facing configuration options
//!
//! Settings live in a JSON file inside the data directory. They are owned by a [`Session`](crate::Session)
//! and passed explicitly, there is no process-wide configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{PortalError, Result};

/// Name of the settings file in the data directory
pub const SETTINGS_FILE: &str = "settings.json";

/// The portal this crate talks to, unless configured otherwise
pub const DEFAULT_BASE_URL: &str = "https://raco.fib.upc.edu";

/// Requests that take longer than this are reported as transport errors
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Languages the portal can localize its content into
pub const SUPPORTED_LANGUAGES: &[&str] = &["ca", "es", "en"];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Scheme and host of the portal API
    pub base_url: Url,
    /// Whether cached documents should be refetched when they are displayed.
    ///
    /// Both `None` (never set) and `Some(false)` mean the cached copy is used as-is.
    pub enable_automatic_updates: Option<bool>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub language: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid"),
            enable_automatic_updates: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: format!("raco-pocket/{}", env!("CARGO_PKG_VERSION")),
            language: None,
        }
    }
}

impl Settings {
    /// Load the settings stored in `data_dir`, or the defaults if there is no settings file yet
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(SETTINGS_FILE);
        let file = match std::fs::File::open(&path) {
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No settings file at {:?}, using defaults", path);
                return Ok(Self::default());
            },
            Err(err) => return Err(err.into()),
            Ok(file) => file,
        };

        let settings: Self = serde_json::from_reader(file)
            .map_err(|err| PortalError::Config(format!("Invalid settings file {:?}: {}", path, err)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Store these settings in `data_dir`
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let content = serde_json::to_vec_pretty(self)
            .map_err(|err| PortalError::Config(format!("Unable to serialize settings: {}", err)))?;
        crate::utils::write_atomically(&data_dir.join(SETTINGS_FILE), &content)
    }

    /// Whether a cached document should be refetched when it is accessed
    pub fn automatic_updates(&self) -> bool {
        self.enable_automatic_updates == Some(true)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Change the preferred content language
    pub fn set_language(&mut self, code: &str) -> Result<()> {
        if SUPPORTED_LANGUAGES.contains(&code) == false {
            return Err(PortalError::Config(format!("Unsupported language {:?}", code)));
        }
        self.language = Some(code.to_string());
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            return Err(PortalError::Config("request_timeout_secs must be greater than 0".into()));
        }
        if self.base_url.cannot_be_a_base() {
            return Err(PortalError::Config(format!("{} cannot be used as a base URL", self.base_url)));
        }
        if let Some(lang) = &self.language {
            if SUPPORTED_LANGUAGES.contains(&lang.as_str()) == false {
                return Err(PortalError::Config(format!("Unsupported language {:?}", lang)));
            }
        }
        Ok(())
    }
}
