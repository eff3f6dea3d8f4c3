//! Native collaborators behind the `window`, `tray` and `app` domains.
//!
//! The bridge never drives a window system itself. Embedding hosts implement
//! these traits over their toolkit; [`headless`] provides implementations
//! that only record state, used by the stdio host and by tests.

pub mod headless;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Failure reported by a native collaborator.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HostError {
    /// The host does not offer the operation.
    #[error("{operation} is not supported by this host")]
    Unsupported {
        /// Operation name.
        operation: &'static str,
    },
    /// The host attempted the operation and failed.
    #[error("{operation} failed: {message}")]
    Failed {
        /// Operation name.
        operation: &'static str,
        /// Host explanation.
        message: String,
    },
}

/// Logical window size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    /// Width in logical pixels.
    pub width: f64,
    /// Height in logical pixels.
    pub height: f64,
}

/// Logical window position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal offset in logical pixels.
    pub x: f64,
    /// Vertical offset in logical pixels.
    pub y: f64,
}

/// State change requested of the host window.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowCommand {
    /// Makes the window visible.
    Show,
    /// Hides the window.
    Hide,
    /// Closes the window.
    Close,
    /// Gives the window keyboard focus.
    Focus,
    /// Minimises the window.
    Minimize,
    /// Maximises the window.
    Maximize,
    /// Restores a maximised window.
    Unmaximize,
    /// Centres the window on its screen.
    Center,
    /// Sets the title bar text.
    SetTitle(String),
    /// Resizes the window.
    SetSize(Size),
    /// Moves the window.
    SetPosition(Point),
    /// Keeps the window above others.
    SetAlwaysOnTop(bool),
    /// Enters or leaves fullscreen.
    SetFullscreen(bool),
}

/// Host window operations.
pub trait WindowControl {
    /// Applies a state change.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the window refuses the change.
    fn apply(&mut self, command: WindowCommand) -> Result<(), HostError>;

    /// Current size.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the size cannot be read.
    fn size(&self) -> Result<Size, HostError>;

    /// Current position.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the position cannot be read.
    fn position(&self) -> Result<Point, HostError>;

    /// Whether the window is shown.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when visibility cannot be read.
    fn is_visible(&self) -> Result<bool, HostError>;
}

/// One tray menu entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrayMenuItem {
    /// Id reported back when the entry is clicked.
    pub id: String,
    /// Visible label.
    pub label: String,
    /// Whether the entry can be clicked.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

const fn enabled_by_default() -> bool {
    true
}

/// State change requested of the tray item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrayCommand {
    /// Sets the icon from an image file.
    SetIcon(PathBuf),
    /// Sets the hover text.
    SetTooltip(String),
    /// Replaces the menu.
    SetMenu(Vec<TrayMenuItem>),
    /// Shows the tray item.
    Show,
    /// Hides the tray item.
    Hide,
}

/// Host tray operations.
pub trait TrayControl {
    /// Applies a state change.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when the tray refuses the change.
    fn apply(&mut self, command: TrayCommand) -> Result<(), HostError>;
}

/// Host application operations.
pub trait AppControl {
    /// Application display name.
    fn name(&self) -> String;

    /// Application version string.
    fn version(&self) -> String;

    /// Opens `url` with the system handler.
    ///
    /// # Errors
    ///
    /// Returns [`HostError`] when no handler accepts the URL.
    fn open_external(&mut self, url: &Url) -> Result<(), HostError>;

    /// Asks the host to exit after the current turn of its loop.
    fn quit(&mut self);
}

/// Well-known directory lookups.
pub trait DirectoryResolver {
    /// The user's home directory.
    fn home_dir(&self) -> Option<PathBuf>;

    /// The system temporary directory.
    fn temp_dir(&self) -> Option<PathBuf>;

    /// Per-user data directory for `app_name`.
    fn app_data_dir(&self, app_name: &str) -> Option<PathBuf>;
}

/// [`DirectoryResolver`] backed by the platform conventions in `dirs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDirectories;

impl DirectoryResolver for SystemDirectories {
    fn home_dir(&self) -> Option<PathBuf> {
        dirs::home_dir()
    }

    fn temp_dir(&self) -> Option<PathBuf> {
        Some(std::env::temp_dir())
    }

    fn app_data_dir(&self, app_name: &str) -> Option<PathBuf> {
        dirs::data_dir().map(|base| base.join(app_name))
    }
}
