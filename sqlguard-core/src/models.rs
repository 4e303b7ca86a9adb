//! Core data models for schema representation.
//!
//! A database schema arrives from introspection as raw declaration strings
//! ([`RawSchema`]), which is also the shape persisted to the cache. Before use
//! it is parsed into a typed [`Schema`] whose columns carry a
//! [`TypeDeclaration`].

use crate::error::SchemaError;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// A parsed column type declaration such as `decimal(10,2)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDeclaration {
    /// Type name before the argument group, as declared
    pub base_type: String,
    /// Parenthesized arguments, empty when the declaration has none
    pub arguments: Vec<String>,
}

impl TypeDeclaration {
    /// Parses a raw declaration as reported by introspection.
    ///
    /// Text before the first `(` is the base type; the comma-separated
    /// contents up to the matching `)` are the arguments. Whitespace around
    /// either part is trimmed and modifiers after the group (`unsigned`,
    /// `zerofill`) are not kept.
    ///
    /// # Example
    /// ```rust
    /// use sqlguard_core::models::TypeDeclaration;
    ///
    /// let decl = TypeDeclaration::parse("decimal (10, 2)");
    /// assert_eq!(decl.base_type, "decimal");
    /// assert_eq!(decl.arguments, vec!["10", "2"]);
    ///
    /// let decl = TypeDeclaration::parse("int");
    /// assert!(decl.arguments.is_empty());
    /// ```
    pub fn parse(declaration: &str) -> Self {
        let declaration = declaration.trim();

        let Some(open) = declaration.find('(') else {
            return Self {
                base_type: declaration.to_string(),
                arguments: Vec::new(),
            };
        };

        let base_type = declaration[..open].trim().to_string();
        let rest = &declaration[open + 1..];
        let inner = rest.find(')').map_or(rest, |close| &rest[..close]);

        let arguments = if inner.trim().is_empty() {
            Vec::new()
        } else {
            inner.split(',').map(|arg| arg.trim().to_string()).collect()
        };

        Self {
            base_type,
            arguments,
        }
    }

    /// Resolves the base type to a known column kind.
    pub fn kind(&self) -> ColumnKind {
        ColumnKind::from_base_type(&self.base_type)
    }

    /// Whether values of this type are substituted as quoted strings.
    pub fn is_string_like(&self) -> bool {
        let base = self.base_type.to_lowercase();
        base.contains("char") || base.contains("text")
    }
}

impl fmt::Display for TypeDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.arguments.is_empty() {
            write!(f, "{}", self.base_type)
        } else {
            write!(f, "{}({})", self.base_type, self.arguments.join(","))
        }
    }
}

/// Column type families with a dedicated validation rule.
///
/// `Unrecognized` is the explicit fallthrough for every type without one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// tinyint, smallint, mediumint, int, bigint
    Integer,
    /// float, double
    Float,
    /// decimal(precision, scale)
    Decimal,
    /// date, `YYYY-MM-DD`
    Date,
    /// datetime, `YYYY-MM-DD HH:MM:SS`
    DateTime,
    /// time, `HH:MM:SS`
    Time,
    /// year, four digits
    Year,
    /// char(n), varchar(n)
    Char,
    /// tinytext, text, mediumtext, longtext
    Text,
    /// timestamp; no validation rule is decided yet
    Timestamp,
    /// Any other type, carrying the lower-cased base type
    Unrecognized(String),
}

impl ColumnKind {
    /// Maps a base type name to its kind.
    ///
    /// Matching is case-insensitive and only looks at the first word, so
    /// `INT UNSIGNED` resolves to [`ColumnKind::Integer`].
    pub fn from_base_type(base_type: &str) -> Self {
        let lowered = base_type.trim().to_lowercase();
        let head = lowered.split_whitespace().next().unwrap_or_default();

        match head {
            "tinyint" | "smallint" | "mediumint" | "int" | "integer" | "bigint" => Self::Integer,
            "float" | "double" => Self::Float,
            "decimal" => Self::Decimal,
            "date" => Self::Date,
            "datetime" => Self::DateTime,
            "time" => Self::Time,
            "year" => Self::Year,
            "char" | "varchar" => Self::Char,
            "tinytext" | "text" | "mediumtext" | "longtext" => Self::Text,
            "timestamp" => Self::Timestamp,
            _ => Self::Unrecognized(lowered),
        }
    }
}

/// One table of a [`RawSchema`], columns in introspection order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawTable {
    /// Table name
    pub name: String,
    /// `(column name, declaration string)` pairs
    pub columns: Vec<(String, String)>,
}

/// Table -> column -> declaration mapping exactly as introspection reports it.
///
/// This is the persisted form. It serializes as a JSON object of objects and
/// keeps table and column order stable across a load/store cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawSchema {
    /// Tables in introspection order
    pub tables: Vec<RawTable>,
}

impl RawSchema {
    /// Creates an empty raw schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a table with its columns.
    pub fn with_table<I, C, D>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = (C, D)>,
        C: Into<String>,
        D: Into<String>,
    {
        self.tables.push(RawTable {
            name: name.into(),
            columns: columns
                .into_iter()
                .map(|(column, decl)| (column.into(), decl.into()))
                .collect(),
        });
        self
    }

    /// Adds a column, creating its table on first sight.
    pub fn push_column(
        &mut self,
        table: impl Into<String>,
        column: impl Into<String>,
        declaration: impl Into<String>,
    ) {
        let table = table.into();
        let entry = (column.into(), declaration.into());
        match self.tables.iter_mut().find(|t| t.name == table) {
            Some(existing) => existing.columns.push(entry),
            None => self.tables.push(RawTable {
                name: table,
                columns: vec![entry],
            }),
        }
    }

    /// Number of tables.
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    /// Whether the schema has no tables.
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

struct Columns<'a>(&'a [(String, String)]);

impl Serialize for Columns<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (column, declaration) in self.0 {
            map.serialize_entry(column, declaration)?;
        }
        map.end()
    }
}

impl Serialize for RawSchema {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for table in &self.tables {
            map.serialize_entry(&table.name, &Columns(&table.columns))?;
        }
        map.end()
    }
}

struct OrderedColumns(Vec<(String, String)>);

impl<'de> Deserialize<'de> for OrderedColumns {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ColumnsVisitor;

        impl<'de> Visitor<'de> for ColumnsVisitor {
            type Value = OrderedColumns;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping column names to type declarations")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut columns = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((column, declaration)) = access.next_entry::<String, String>()? {
                    columns.push((column, declaration));
                }
                Ok(OrderedColumns(columns))
            }
        }

        deserializer.deserialize_map(ColumnsVisitor)
    }
}

impl<'de> Deserialize<'de> for RawSchema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = RawSchema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping table names to column objects")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut tables = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((name, columns)) = access.next_entry::<String, OrderedColumns>()? {
                    tables.push(RawTable {
                        name,
                        columns: columns.0,
                    });
                }
                Ok(RawSchema { tables })
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}

/// Typed table -> column -> declaration mapping used during sanitization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    tables: HashMap<String, HashMap<String, TypeDeclaration>>,
}

impl Schema {
    /// Looks up the declared type of a column.
    ///
    /// # Errors
    /// Returns [`SchemaError::UnknownTable`] or [`SchemaError::UnknownColumn`].
    pub fn type_of(&self, table: &str, column: &str) -> Result<&TypeDeclaration, SchemaError> {
        let columns = self
            .tables
            .get(table)
            .ok_or_else(|| SchemaError::UnknownTable {
                table: table.to_string(),
            })?;

        columns
            .get(column)
            .ok_or_else(|| SchemaError::UnknownColumn {
                table: table.to_string(),
                column: column.to_string(),
            })
    }

    /// Whether the table exists.
    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Table names, unordered.
    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Number of tables.
    pub fn table_count(&self) -> usize {
        self.tables.len()
    }
}

impl From<&RawSchema> for Schema {
    fn from(raw: &RawSchema) -> Self {
        let tables = raw
            .tables
            .iter()
            .map(|table| {
                let columns = table
                    .columns
                    .iter()
                    .map(|(column, decl)| (column.clone(), TypeDeclaration::parse(decl)))
                    .collect();
                (table.name.clone(), columns)
            })
            .collect();

        Self { tables }
    }
}

impl From<RawSchema> for Schema {
    fn from(raw: RawSchema) -> Self {
        Self::from(&raw)
    }
}
