//! Data stores backing native UI components.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};
use thiserror::Error;

/// Supported component kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, Display,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase", ascii_case_insensitive)]
pub enum ComponentKind {
    /// Sectioned list of items.
    List,
    /// Table with named columns and keyed rows.
    Table,
}

/// One list section.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Section {
    /// Section header text.
    #[serde(default)]
    pub title: String,
    /// Items shown in the section.
    #[serde(default)]
    pub items: Vec<Value>,
}

/// One table column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Key used to look the cell up in each row.
    pub id: String,
    /// Header text.
    #[serde(default)]
    pub title: String,
    /// Preferred width in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

/// Table row keyed by column id.
pub type Row = Map<String, Value>;

/// Data for [`ComponentKind::List`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListData {
    /// Sections in display order.
    #[serde(default)]
    pub sections: Vec<Section>,
}

/// Data for [`ComponentKind::Table`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableData {
    /// Columns in display order.
    #[serde(default)]
    pub columns: Vec<Column>,
    /// Rows in display order.
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// Component data store.
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentData {
    /// List store.
    List(ListData),
    /// Table store.
    Table(TableData),
}

/// One change to a component's data store.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Mutation {
    /// Appends a list section.
    AddSection {
        /// Section header.
        #[serde(default)]
        title: String,
        /// Initial items.
        #[serde(default)]
        items: Vec<Value>,
    },
    /// Appends items to an existing list section.
    AppendItems {
        /// Section index.
        section: usize,
        /// Items to append.
        items: Vec<Value>,
    },
    /// Replaces the table columns.
    SetColumns {
        /// New columns.
        columns: Vec<Column>,
    },
    /// Appends table rows.
    AppendRows {
        /// Rows to append.
        rows: Vec<Row>,
    },
    /// Removes a contiguous run of table rows.
    RemoveRows {
        /// First row to remove.
        start: usize,
        /// Number of rows to remove.
        count: usize,
    },
    /// Empties the component; table columns are kept.
    Clear,
}

impl Mutation {
    /// Wire name of the mutation.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::AddSection { .. } => "addSection",
            Self::AppendItems { .. } => "appendItems",
            Self::SetColumns { .. } => "setColumns",
            Self::AppendRows { .. } => "appendRows",
            Self::RemoveRows { .. } => "removeRows",
            Self::Clear => "clear",
        }
    }
}

/// Reasons a mutation or initial option set was refused.
#[derive(Debug, Error)]
pub enum MutationError {
    /// Initial options could not be decoded for the kind.
    #[error("invalid {kind} options: {source}")]
    InvalidOptions {
        /// Kind being created.
        kind: ComponentKind,
        /// Decode failure.
        #[source]
        source: serde_json::Error,
    },
    /// Mutation does not apply to the component kind.
    #[error("'{op}' does not apply to a {kind}")]
    KindMismatch {
        /// Mutation name.
        op: &'static str,
        /// Kind of the target component.
        kind: ComponentKind,
    },
    /// Section index is past the end.
    #[error("section {section} out of range ({len} sections)")]
    SectionOutOfRange {
        /// Requested section.
        section: usize,
        /// Number of sections.
        len: usize,
    },
    /// Row range is past the end.
    #[error("{count} rows from {start} out of range ({len} rows)")]
    RowsOutOfRange {
        /// First row.
        start: usize,
        /// Number of rows.
        count: usize,
        /// Number of rows present.
        len: usize,
    },
}

impl ComponentData {
    /// Seeds a data store from `create` options.
    ///
    /// Lists read `sections`; tables read `columns` and `rows`. Other option
    /// fields are left for the toolkit.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::InvalidOptions`] when a seeded field has the
    /// wrong shape.
    pub fn from_options(kind: ComponentKind, options: &Value) -> Result<Self, MutationError> {
        let empty = Value::Object(Map::new());
        let options = if options.is_null() { &empty } else { options };
        let invalid = |source| MutationError::InvalidOptions { kind, source };
        match kind {
            ComponentKind::List => ListData::deserialize(options)
                .map(Self::List)
                .map_err(invalid),
            ComponentKind::Table => TableData::deserialize(options)
                .map(Self::Table)
                .map_err(invalid),
        }
    }

    /// Kind of component the store belongs to.
    #[must_use]
    pub const fn kind(&self) -> ComponentKind {
        match self {
            Self::List(_) => ComponentKind::List,
            Self::Table(_) => ComponentKind::Table,
        }
    }

    /// Applies one mutation in place.
    ///
    /// # Errors
    ///
    /// Returns a [`MutationError`] when the mutation does not fit the store.
    /// The store may be partially modified only by earlier successful calls.
    pub fn apply(&mut self, mutation: &Mutation) -> Result<(), MutationError> {
        match (self, mutation) {
            (Self::List(list), Mutation::AddSection { title, items }) => {
                list.sections.push(Section {
                    title: title.clone(),
                    items: items.clone(),
                });
                Ok(())
            }
            (Self::List(list), Mutation::AppendItems { section, items }) => {
                let len = list.sections.len();
                let target = list
                    .sections
                    .get_mut(*section)
                    .ok_or(MutationError::SectionOutOfRange {
                        section: *section,
                        len,
                    })?;
                target.items.extend(items.iter().cloned());
                Ok(())
            }
            (Self::List(list), Mutation::Clear) => {
                list.sections.clear();
                Ok(())
            }
            (Self::Table(table), Mutation::SetColumns { columns }) => {
                table.columns.clone_from(columns);
                Ok(())
            }
            (Self::Table(table), Mutation::AppendRows { rows }) => {
                table.rows.extend(rows.iter().cloned());
                Ok(())
            }
            (Self::Table(table), Mutation::RemoveRows { start, count }) => {
                let len = table.rows.len();
                let end = start.checked_add(*count).filter(|end| *end <= len).ok_or(
                    MutationError::RowsOutOfRange {
                        start: *start,
                        count: *count,
                        len,
                    },
                )?;
                table.rows.drain(*start..end);
                Ok(())
            }
            (Self::Table(table), Mutation::Clear) => {
                table.rows.clear();
                Ok(())
            }
            (data, other) => Err(MutationError::KindMismatch {
                op: other.name(),
                kind: data.kind(),
            }),
        }
    }
}
