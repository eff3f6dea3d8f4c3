//! Collaborators that keep state in memory instead of driving a display.
//!
//! Each type is cheap to clone and clones share state, so a caller can keep
//! one copy for inspection after handing the other to the bridge.

use std::cell::RefCell;
use std::rc::Rc;

use url::Url;

use super::{
    AppControl, HostError, Point, Size, TrayCommand, TrayControl, TrayMenuItem, WindowCommand,
    WindowControl,
};

/// Snapshot of a [`HeadlessWindow`].
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    /// Title bar text.
    pub title: String,
    /// Current size.
    pub size: Size,
    /// Current position.
    pub position: Point,
    /// Shown or hidden.
    pub visible: bool,
    /// Has been closed.
    pub closed: bool,
    /// Minimised.
    pub minimized: bool,
    /// Maximised.
    pub maximized: bool,
    /// Kept above other windows.
    pub always_on_top: bool,
    /// Fullscreen.
    pub fullscreen: bool,
    /// Has keyboard focus.
    pub focused: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            title: String::new(),
            size: Size {
                width: 800.0,
                height: 600.0,
            },
            position: Point { x: 0.0, y: 0.0 },
            visible: true,
            closed: false,
            minimized: false,
            maximized: false,
            always_on_top: false,
            fullscreen: false,
            focused: false,
        }
    }
}

const SCREEN: Size = Size {
    width: 1920.0,
    height: 1080.0,
};

/// In-memory window.
#[derive(Debug, Clone, Default)]
pub struct HeadlessWindow {
    state: Rc<RefCell<WindowState>>,
}

impl HeadlessWindow {
    /// Creates a visible 800x600 window.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> WindowState {
        self.state.borrow().clone()
    }
}

impl WindowControl for HeadlessWindow {
    fn apply(&mut self, command: WindowCommand) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if state.closed {
            return Err(HostError::Failed {
                operation: "window",
                message: "window is closed".to_owned(),
            });
        }
        match command {
            WindowCommand::Show => state.visible = true,
            WindowCommand::Hide => state.visible = false,
            WindowCommand::Close => {
                state.visible = false;
                state.closed = true;
            }
            WindowCommand::Focus => state.focused = true,
            WindowCommand::Minimize => state.minimized = true,
            WindowCommand::Maximize => {
                state.minimized = false;
                state.maximized = true;
            }
            WindowCommand::Unmaximize => state.maximized = false,
            WindowCommand::Center => {
                state.position = Point {
                    x: ((SCREEN.width - state.size.width) / 2.0).max(0.0),
                    y: ((SCREEN.height - state.size.height) / 2.0).max(0.0),
                };
            }
            WindowCommand::SetTitle(title) => state.title = title,
            WindowCommand::SetSize(size) => state.size = size,
            WindowCommand::SetPosition(position) => state.position = position,
            WindowCommand::SetAlwaysOnTop(enabled) => state.always_on_top = enabled,
            WindowCommand::SetFullscreen(enabled) => state.fullscreen = enabled,
        }
        Ok(())
    }

    fn size(&self) -> Result<Size, HostError> {
        Ok(self.state.borrow().size)
    }

    fn position(&self) -> Result<Point, HostError> {
        Ok(self.state.borrow().position)
    }

    fn is_visible(&self) -> Result<bool, HostError> {
        Ok(self.state.borrow().visible)
    }
}

/// Snapshot of a [`HeadlessTray`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrayState {
    /// Icon path.
    pub icon: Option<std::path::PathBuf>,
    /// Hover text.
    pub tooltip: String,
    /// Menu entries.
    pub menu: Vec<TrayMenuItem>,
    /// Shown or hidden.
    pub visible: bool,
}

/// In-memory tray item.
#[derive(Debug, Clone, Default)]
pub struct HeadlessTray {
    state: Rc<RefCell<TrayState>>,
}

impl HeadlessTray {
    /// Creates a hidden tray item with no menu.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> TrayState {
        self.state.borrow().clone()
    }
}

impl TrayControl for HeadlessTray {
    fn apply(&mut self, command: TrayCommand) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        match command {
            TrayCommand::SetIcon(path) => state.icon = Some(path),
            TrayCommand::SetTooltip(text) => state.tooltip = text,
            TrayCommand::SetMenu(items) => state.menu = items,
            TrayCommand::Show => state.visible = true,
            TrayCommand::Hide => state.visible = false,
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct AppState {
    opened: Vec<String>,
    quit_requested: bool,
}

/// In-memory application handle.
#[derive(Debug, Clone)]
pub struct HeadlessApp {
    name: String,
    version: String,
    state: Rc<RefCell<AppState>>,
}

impl HeadlessApp {
    /// Creates an application handle.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            state: Rc::default(),
        }
    }

    /// URLs passed to `open_external`, in order.
    #[must_use]
    pub fn opened(&self) -> Vec<String> {
        self.state.borrow().opened.clone()
    }

    /// Whether `quit` has been called.
    #[must_use]
    pub fn quit_requested(&self) -> bool {
        self.state.borrow().quit_requested
    }
}

impl AppControl for HeadlessApp {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn version(&self) -> String {
        self.version.clone()
    }

    fn open_external(&mut self, url: &Url) -> Result<(), HostError> {
        self.state.borrow_mut().opened.push(url.to_string());
        Ok(())
    }

    fn quit(&mut self) {
        self.state.borrow_mut().quit_requested = true;
    }
}
