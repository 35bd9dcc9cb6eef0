//! Popup launchers for the authorization page

use std::sync::Mutex;

use convortex_core::domain::CloudError;
use convortex_core::ports::IPopupLauncher;
use tracing::info;

/// Opens the authorization URL in the user's default browser
#[derive(Debug, Default, Clone, Copy)]
pub struct WebBrowserLauncher;

impl IPopupLauncher for WebBrowserLauncher {
    fn open(&self, url: &str) -> Result<(), CloudError> {
        info!("Opening browser for authorization");
        webbrowser::open(url).map_err(|e| CloudError::Launch(e.to_string()))
    }
}

/// Records URLs instead of opening them (headless hosts, tests)
#[derive(Debug, Default)]
pub struct RecordingLauncher {
    opened: Mutex<Vec<String>>,
}

impl RecordingLauncher {
    pub fn new() -> Self {
        Self::default()
    }

    /// URLs passed to [`open`](IPopupLauncher::open), oldest first
    pub fn opened(&self) -> Vec<String> {
        self.opened
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl IPopupLauncher for RecordingLauncher {
    fn open(&self, url: &str) -> Result<(), CloudError> {
        self.opened
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(url.to_string());
        Ok(())
    }
}
