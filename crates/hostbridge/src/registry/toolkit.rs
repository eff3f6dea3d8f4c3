//! Seam to the native widget toolkit.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;

use super::data::ComponentKind;

/// Owned token for one native widget.
///
/// Not `Clone`: the registry moves it into
/// [`NativeToolkit::release_widget`] exactly once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct WidgetHandle(u64);

impl WidgetHandle {
    /// Wraps a toolkit-specific identifier.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Toolkit-specific identifier.
    #[must_use]
    pub const fn raw(&self) -> u64 {
        self.0
    }
}

/// Failures reported by the toolkit.
#[derive(Debug, Error)]
pub enum ToolkitError {
    /// The toolkit refused to allocate a widget.
    #[error("toolkit could not create {kind} widget: {message}")]
    Rejected {
        /// Requested kind.
        kind: ComponentKind,
        /// Toolkit explanation.
        message: String,
    },
}

/// Native widget allocation and refresh.
pub trait NativeToolkit {
    /// Allocates a widget for `kind` configured with `options`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolkitError`] when the widget cannot be created.
    fn create_widget(
        &mut self,
        kind: ComponentKind,
        options: &Value,
    ) -> Result<WidgetHandle, ToolkitError>;

    /// Releases a widget. Called once per handle.
    fn release_widget(&mut self, handle: WidgetHandle);

    /// Asks the widget to pull fresh data from its source.
    fn request_refresh(&mut self, handle: &WidgetHandle);
}

/// Toolkit call recorded by [`HeadlessToolkit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolkitCall {
    /// A widget was allocated.
    Create {
        /// Raw handle.
        handle: u64,
        /// Widget kind.
        kind: ComponentKind,
    },
    /// A widget was released.
    Release {
        /// Raw handle.
        handle: u64,
    },
    /// A widget was asked to redraw.
    Refresh {
        /// Raw handle.
        handle: u64,
    },
}

#[derive(Debug, Default)]
struct Journal {
    next_handle: u64,
    calls: Vec<ToolkitCall>,
}

/// Toolkit without a display, journalling every call.
///
/// Clones share the journal.
#[derive(Debug, Clone, Default)]
pub struct HeadlessToolkit {
    journal: Rc<RefCell<Journal>>,
}

impl HeadlessToolkit {
    /// Creates an empty toolkit.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made so far, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<ToolkitCall> {
        self.journal.borrow().calls.clone()
    }

    /// Widgets allocated and not yet released.
    #[must_use]
    pub fn live_widgets(&self) -> usize {
        let journal = self.journal.borrow();
        let created = journal
            .calls
            .iter()
            .filter(|call| matches!(call, ToolkitCall::Create { .. }))
            .count();
        let released = journal
            .calls
            .iter()
            .filter(|call| matches!(call, ToolkitCall::Release { .. }))
            .count();
        created.saturating_sub(released)
    }
}

impl NativeToolkit for HeadlessToolkit {
    fn create_widget(
        &mut self,
        kind: ComponentKind,
        _options: &Value,
    ) -> Result<WidgetHandle, ToolkitError> {
        let mut journal = self.journal.borrow_mut();
        journal.next_handle += 1;
        let handle = journal.next_handle;
        journal.calls.push(ToolkitCall::Create { handle, kind });
        Ok(WidgetHandle::new(handle))
    }

    fn release_widget(&mut self, handle: WidgetHandle) {
        self.journal
            .borrow_mut()
            .calls
            .push(ToolkitCall::Release {
                handle: handle.raw(),
            });
    }

    fn request_refresh(&mut self, handle: &WidgetHandle) {
        self.journal
            .borrow_mut()
            .calls
            .push(ToolkitCall::Refresh {
                handle: handle.raw(),
            });
    }
}
