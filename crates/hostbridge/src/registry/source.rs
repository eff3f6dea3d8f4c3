//! Pull-based data access for native widgets.
//!
//! Widgets ask for counts and cells as they draw rather than being handed a
//! snapshot. Each component kind has its own static [`DataSource`]
//! implementation borrowing the registry's store, and [`ComponentView`]
//! selects between them.

use serde_json::Value;

use super::data::{Column, ListData, Row, TableData};

/// Read-only view a widget pulls its content from.
pub trait DataSource {
    /// Number of sections. Tables always have one.
    fn section_count(&self) -> usize;

    /// Number of rows in `section`; zero when the section does not exist.
    fn row_count(&self, section: usize) -> usize;

    /// List item at `(section, row)`.
    fn item(&self, section: usize, row: usize) -> Option<&Value>;

    /// Number of table columns.
    fn column_count(&self) -> usize {
        0
    }

    /// Table column at `index`.
    fn column(&self, index: usize) -> Option<&Column> {
        let _ = index;
        None
    }

    /// Table cell at `(row, column)`.
    fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        let _ = (row, column);
        None
    }
}

/// [`DataSource`] over a list store.
#[derive(Debug, Clone, Copy)]
pub struct ListDataSource<'a> {
    data: &'a ListData,
}

impl<'a> ListDataSource<'a> {
    /// Wraps a list store.
    #[must_use]
    pub const fn new(data: &'a ListData) -> Self {
        Self { data }
    }

    /// Section header text.
    #[must_use]
    pub fn section_title(&self, section: usize) -> Option<&'a str> {
        self.data
            .sections
            .get(section)
            .map(|section| section.title.as_str())
    }
}

impl DataSource for ListDataSource<'_> {
    fn section_count(&self) -> usize {
        self.data.sections.len()
    }

    fn row_count(&self, section: usize) -> usize {
        self.data
            .sections
            .get(section)
            .map_or(0, |section| section.items.len())
    }

    fn item(&self, section: usize, row: usize) -> Option<&Value> {
        self.data.sections.get(section)?.items.get(row)
    }
}

/// [`DataSource`] over a table store.
#[derive(Debug, Clone, Copy)]
pub struct TableDataSource<'a> {
    data: &'a TableData,
}

impl<'a> TableDataSource<'a> {
    /// Wraps a table store.
    #[must_use]
    pub const fn new(data: &'a TableData) -> Self {
        Self { data }
    }

    /// Whole row, keyed by column id.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<&'a Row> {
        self.data.rows.get(row)
    }
}

impl DataSource for TableDataSource<'_> {
    fn section_count(&self) -> usize {
        1
    }

    fn row_count(&self, section: usize) -> usize {
        if section == 0 { self.data.rows.len() } else { 0 }
    }

    fn item(&self, _section: usize, _row: usize) -> Option<&Value> {
        None
    }

    fn column_count(&self) -> usize {
        self.data.columns.len()
    }

    fn column(&self, index: usize) -> Option<&Column> {
        self.data.columns.get(index)
    }

    fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        let key = &self.data.columns.get(column)?.id;
        self.data.rows.get(row)?.get(key)
    }
}

/// Data source for any component kind.
#[derive(Debug, Clone, Copy)]
pub enum ComponentView<'a> {
    /// List component.
    List(ListDataSource<'a>),
    /// Table component.
    Table(TableDataSource<'a>),
}

impl ComponentView<'_> {
    /// Item or row at `(section, row)` as a JSON value, for event payloads.
    #[must_use]
    pub fn snapshot(&self, section: usize, row: usize) -> Option<Value> {
        match self {
            Self::List(source) => source.item(section, row).cloned(),
            Self::Table(source) if section == 0 => {
                source.row(row).map(|row| Value::Object(row.clone()))
            }
            Self::Table(_) => None,
        }
    }
}

impl DataSource for ComponentView<'_> {
    fn section_count(&self) -> usize {
        match self {
            Self::List(source) => source.section_count(),
            Self::Table(source) => source.section_count(),
        }
    }

    fn row_count(&self, section: usize) -> usize {
        match self {
            Self::List(source) => source.row_count(section),
            Self::Table(source) => source.row_count(section),
        }
    }

    fn item(&self, section: usize, row: usize) -> Option<&Value> {
        match self {
            Self::List(source) => source.item(section, row),
            Self::Table(source) => source.item(section, row),
        }
    }

    fn column_count(&self) -> usize {
        match self {
            Self::List(source) => source.column_count(),
            Self::Table(source) => source.column_count(),
        }
    }

    fn column(&self, index: usize) -> Option<&Column> {
        match self {
            Self::List(source) => source.column(index),
            Self::Table(source) => source.column(index),
        }
    }

    fn cell(&self, row: usize, column: usize) -> Option<&Value> {
        match self {
            Self::List(source) => source.cell(row, column),
            Self::Table(source) => source.cell(row, column),
        }
    }
}
