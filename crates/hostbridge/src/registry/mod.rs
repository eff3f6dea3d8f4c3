//! Registry of native UI components created on behalf of script code.
//!
//! Script code addresses components by a string id it chooses. The registry
//! owns, per id, the toolkit handle and the data store the widget pulls its
//! content from. Handles are released exactly once: when the component is
//! destroyed, when `create` replaces it, or when the registry is dropped.

mod data;
mod source;
mod toolkit;

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

pub use self::data::{
    Column, ComponentData, ComponentKind, ListData, Mutation, MutationError, Row, Section,
    TableData,
};
pub use self::source::{ComponentView, DataSource, ListDataSource, TableDataSource};
pub use self::toolkit::{
    HeadlessToolkit, NativeToolkit, ToolkitCall, ToolkitError, WidgetHandle,
};

use crate::response::HostEvent;

/// Tracing target for registry activity.
pub(crate) const REGISTRY_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::registry");

/// Wire name of the domain events are attributed to.
pub(crate) const NATIVE_UI_DOMAIN: &str = "nativeUI";

/// User interaction reported by a widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Interaction {
    /// A row was selected.
    Selected {
        /// Section index.
        section: usize,
        /// Row index.
        row: usize,
    },
    /// A row was activated (double click, return key).
    Activated {
        /// Section index.
        section: usize,
        /// Row index.
        row: usize,
    },
}

impl Interaction {
    const fn event_name(self) -> &'static str {
        match self {
            Self::Selected { .. } => "select",
            Self::Activated { .. } => "activate",
        }
    }

    const fn position(self) -> (usize, usize) {
        match self {
            Self::Selected { section, row } | Self::Activated { section, row } => (section, row),
        }
    }
}

/// A live component.
#[derive(Debug)]
pub struct Component {
    kind: ComponentKind,
    handle: WidgetHandle,
    data: ComponentData,
    revision: u64,
    selection: Option<(usize, usize)>,
}

impl Component {
    /// Component kind.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Current data store.
    #[must_use]
    pub const fn data(&self) -> &ComponentData {
        &self.data
    }

    /// Number of committed updates.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Last selected `(section, row)`.
    #[must_use]
    pub const fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    /// Raw toolkit handle, for diagnostics.
    #[must_use]
    pub const fn handle(&self) -> &WidgetHandle {
        &self.handle
    }

    fn view(&self) -> ComponentView<'_> {
        match &self.data {
            ComponentData::List(list) => ComponentView::List(ListDataSource::new(list)),
            ComponentData::Table(table) => ComponentView::Table(TableDataSource::new(table)),
        }
    }
}

/// Errors raised by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// No component has the id.
    #[error("component '{id}' not found")]
    NotFound {
        /// Requested id.
        id: String,
    },
    /// The caller named a different kind than the component has.
    #[error("component '{id}' is a {actual}, not a {expected}")]
    KindMismatch {
        /// Component id.
        id: String,
        /// Kind named by the caller.
        expected: ComponentKind,
        /// Kind of the live component.
        actual: ComponentKind,
    },
    /// Options or mutations did not fit the component.
    #[error("component '{id}': {source}")]
    Mutation {
        /// Component id.
        id: String,
        /// Underlying refusal.
        #[source]
        source: MutationError,
    },
    /// An interaction named a row the component does not have.
    #[error("component '{id}' has no row {row} in section {section}")]
    RowOutOfRange {
        /// Component id.
        id: String,
        /// Requested section.
        section: usize,
        /// Requested row.
        row: usize,
    },
    /// The toolkit failed.
    #[error("component '{id}': {source}")]
    Toolkit {
        /// Component id.
        id: String,
        /// Toolkit failure.
        #[source]
        source: ToolkitError,
    },
}

/// Id-keyed table of live components.
pub struct ComponentRegistry {
    toolkit: Box<dyn NativeToolkit>,
    components: HashMap<String, Component>,
}

impl ComponentRegistry {
    /// Creates an empty registry over `toolkit`.
    #[must_use]
    pub fn new(toolkit: Box<dyn NativeToolkit>) -> Self {
        Self {
            toolkit,
            components: HashMap::new(),
        }
    }

    /// Creates (or replaces) the component `id`.
    ///
    /// Options are validated before anything else happens. An existing
    /// component with the same id is destroyed, and its handle released,
    /// before the new widget is allocated.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Mutation`] for malformed options (the existing
    /// component is left alone) or [`RegistryError::Toolkit`] when allocation
    /// fails (the id is then free).
    pub fn create(
        &mut self,
        id: &str,
        kind: ComponentKind,
        options: &Value,
    ) -> Result<(), RegistryError> {
        let data = ComponentData::from_options(kind, options).map_err(|source| {
            RegistryError::Mutation {
                id: id.to_owned(),
                source,
            }
        })?;

        if let Some(previous) = self.components.remove(id) {
            debug!(
                target: REGISTRY_TARGET,
                id,
                kind = %previous.kind,
                "replacing component"
            );
            self.toolkit.release_widget(previous.handle);
        }

        let handle = self
            .toolkit
            .create_widget(kind, options)
            .map_err(|source| RegistryError::Toolkit {
                id: id.to_owned(),
                source,
            })?;
        debug!(target: REGISTRY_TARGET, id, %kind, "component created");
        self.components.insert(
            id.to_owned(),
            Component {
                kind,
                handle,
                data,
                revision: 0,
                selection: None,
            },
        );
        Ok(())
    }

    /// Applies `mutations` atomically and refreshes the widget once.
    ///
    /// Returns the new revision.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`], [`RegistryError::KindMismatch`] or
    /// [`RegistryError::Mutation`]; on error the store is unchanged and no
    /// refresh is requested.
    pub fn update(
        &mut self,
        id: &str,
        kind: Option<ComponentKind>,
        mutations: &[Mutation],
    ) -> Result<u64, RegistryError> {
        let component = lookup_mut(&mut self.components, id, kind)?;
        let mut staged = component.data.clone();
        for mutation in mutations {
            staged
                .apply(mutation)
                .map_err(|source| RegistryError::Mutation {
                    id: id.to_owned(),
                    source,
                })?;
        }
        component.data = staged;
        component.revision += 1;
        if component
            .selection
            .is_some_and(|(section, row)| component.view().row_count(section) <= row)
        {
            component.selection = None;
        }
        let revision = component.revision;
        self.toolkit.request_refresh(&component.handle);
        debug!(
            target: REGISTRY_TARGET,
            id,
            revision,
            mutations = mutations.len(),
            "component updated"
        );
        Ok(revision)
    }

    /// Destroys the component `id`.
    ///
    /// Returns `false`, without doing anything, when the id is absent or
    /// `kind` names a different kind.
    pub fn destroy(&mut self, id: &str, kind: Option<ComponentKind>) -> bool {
        let matches = self
            .components
            .get(id)
            .is_some_and(|component| kind.is_none_or(|kind| kind == component.kind));
        if !matches {
            return false;
        }
        let Some(component) = self.components.remove(id) else {
            return false;
        };
        self.toolkit.release_widget(component.handle);
        debug!(target: REGISTRY_TARGET, id, "component destroyed");
        true
    }

    /// Destroys every component, returning how many were released.
    pub fn destroy_all(&mut self) -> usize {
        let count = self.components.len();
        for (_, component) in self.components.drain() {
            self.toolkit.release_widget(component.handle);
        }
        count
    }

    /// Looks up a component, checking `kind` when given.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] or [`RegistryError::KindMismatch`].
    pub fn get(&self, id: &str, kind: Option<ComponentKind>) -> Result<&Component, RegistryError> {
        let component = self
            .components
            .get(id)
            .ok_or_else(|| RegistryError::NotFound { id: id.to_owned() })?;
        check_kind(id, component, kind)?;
        Ok(component)
    }

    /// Data source a widget pulls from.
    #[must_use]
    pub fn data_source(&self, id: &str) -> Option<ComponentView<'_>> {
        self.components.get(id).map(Component::view)
    }

    /// Records an interaction and builds the event to forward to script code.
    ///
    /// Selections are remembered so that `getSelection` can report them.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotFound`] when `id` is not live and
    /// [`RegistryError::RowOutOfRange`] when `(section, row)` is not one of
    /// its rows. Nothing is recorded on failure.
    pub fn interaction(
        &mut self,
        id: &str,
        interaction: Interaction,
    ) -> Result<HostEvent, RegistryError> {
        let component = lookup_mut(&mut self.components, id, None)?;
        let (section, row) = interaction.position();
        if row >= component.view().row_count(section) {
            return Err(RegistryError::RowOutOfRange {
                id: id.to_owned(),
                section,
                row,
            });
        }
        if matches!(interaction, Interaction::Selected { .. }) {
            component.selection = Some((section, row));
        }
        let item = component.view().snapshot(section, row).unwrap_or(Value::Null);
        Ok(HostEvent::new(
            NATIVE_UI_DOMAIN,
            id,
            interaction.event_name(),
            json!({ "section": section, "row": row, "item": item }),
        ))
    }

    /// Number of live components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Returns `true` when no component is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Returns `true` when `id` is live.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }
}

impl Drop for ComponentRegistry {
    fn drop(&mut self) {
        self.destroy_all();
    }
}

fn lookup_mut<'a>(
    components: &'a mut HashMap<String, Component>,
    id: &str,
    kind: Option<ComponentKind>,
) -> Result<&'a mut Component, RegistryError> {
    let component = components
        .get_mut(id)
        .ok_or_else(|| RegistryError::NotFound { id: id.to_owned() })?;
    check_kind(id, component, kind)?;
    Ok(component)
}

fn check_kind(
    id: &str,
    component: &Component,
    expected: Option<ComponentKind>,
) -> Result<(), RegistryError> {
    match expected {
        Some(expected) if expected != component.kind => Err(RegistryError::KindMismatch {
            id: id.to_owned(),
            expected,
            actual: component.kind,
        }),
        _ => Ok(()),
    }
}
