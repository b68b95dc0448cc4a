//! Ordered column descriptors for tuples.

use quarry_common::{QuarryError, Result, Type};
use std::fmt;
use std::hash::{Hash, Hasher};

/// One column of a schema: its type and an optional name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub ty: Type,
    pub name: Option<String>,
}

impl Column {
    pub fn new(ty: Type, name: impl Into<String>) -> Self {
        Self {
            ty,
            name: Some(name.into()),
        }
    }

    pub fn unnamed(ty: Type) -> Self {
        Self { ty, name: None }
    }
}

/// Ordered sequence of columns describing the shape of a tuple.
///
/// Two schemas are equal when they have the same types in the same order;
/// column names do not take part in equality.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    /// Creates a schema from its columns.
    ///
    /// # Panics
    ///
    /// Panics if `columns` is empty.
    pub fn new(columns: Vec<Column>) -> Self {
        assert!(!columns.is_empty(), "a schema needs at least one column");
        Self { columns }
    }

    /// Creates a schema of named columns.
    pub fn named(fields: &[(Type, &str)]) -> Self {
        Self::new(
            fields
                .iter()
                .map(|(ty, name)| Column::new(*ty, *name))
                .collect(),
        )
    }

    /// Creates a schema whose columns have no names.
    pub fn unnamed(types: &[Type]) -> Self {
        Self::new(types.iter().copied().map(Column::unnamed).collect())
    }

    pub fn num_fields(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Column> {
        self.columns.iter()
    }

    fn column(&self, index: usize) -> Result<&Column> {
        self.columns
            .get(index)
            .ok_or(QuarryError::FieldIndexOutOfRange {
                index,
                len: self.columns.len(),
            })
    }

    /// Returns the type of the i-th column.
    pub fn field_type(&self, index: usize) -> Result<Type> {
        self.column(index).map(|c| c.ty)
    }

    /// Returns the name of the i-th column, which may be absent.
    pub fn field_name(&self, index: usize) -> Result<Option<&str>> {
        self.column(index).map(|c| c.name.as_deref())
    }

    /// Returns the position of the first column named exactly `name`.
    pub fn index_of(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name.as_deref() == Some(name))
            .ok_or_else(|| QuarryError::FieldNotFound(name.to_string()))
    }

    /// Returns the on-disk width of a tuple with this schema.
    pub fn byte_size(&self) -> usize {
        self.columns.iter().map(|c| c.ty.len()).sum()
    }

    /// Concatenates `left`'s columns followed by `right`'s.
    pub fn combine(left: &Schema, right: &Schema) -> Schema {
        let mut columns = Vec::with_capacity(left.num_fields() + right.num_fields());
        columns.extend_from_slice(&left.columns);
        columns.extend_from_slice(&right.columns);
        Schema { columns }
    }

    /// Returns a copy with every column renamed by `rename`, types unchanged.
    pub fn rename<F>(&self, mut rename: F) -> Schema
    where
        F: FnMut(Option<&str>) -> Option<String>,
    {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                ty: c.ty,
                name: rename(c.name.as_deref()),
            })
            .collect();
        Schema { columns }
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|(a, b)| a.ty == b.ty)
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.columns.len().hash(state);
        for column in &self.columns {
            column.ty.hash(state);
        }
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(
                f,
                "{}({})",
                column.ty,
                column.name.as_deref().unwrap_or("null")
            )?;
        }
        Ok(())
    }
}
