//! Query description shared by all record backends.

use serde::{Deserialize, Serialize};

/// Sort direction for a [`SortKey`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Short form used in query strings (`asc` / `desc`).
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortKey {
    pub column: String,
    pub order: SortOrder,
}

/// Equality filter `column = value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub column: String,
    pub value: String,
}

/// A many-to-one relation fetched alongside each row.
///
/// The referenced row's `columns` are nested under the relation name, e.g.
/// `{"patients": {"name": "Ana"}}` for `Embed::new("patients", "patient_id", ["name"])`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    /// Referenced collection; also the key the nested object appears under.
    pub collection: String,
    /// Column on the queried row holding the referenced id.
    pub foreign_key: String,
    /// Columns to fetch from the referenced row.
    pub columns: Vec<String>,
}

impl Embed {
    pub fn new<I, S>(
        collection: impl Into<String>,
        foreign_key: impl Into<String>,
        columns: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collection: collection.into(),
            foreign_key: foreign_key.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

/// A read against one collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub collection: String,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub order: Vec<SortKey>,
    #[serde(default)]
    pub embed: Option<Embed>,
}

impl Query {
    /// Creates a query returning every row of `collection`.
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            filters: Vec::new(),
            order: Vec::new(),
            embed: None,
        }
    }

    /// Adds an equality filter. Filters are combined with AND.
    #[must_use]
    pub fn filter_eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push(Filter {
            column: column.into(),
            value: value.into(),
        });
        self
    }

    /// Appends an ascending sort key.
    #[must_use]
    pub fn order_asc(self, column: impl Into<String>) -> Self {
        self.order_by(column, SortOrder::Ascending)
    }

    /// Appends a descending sort key.
    #[must_use]
    pub fn order_desc(self, column: impl Into<String>) -> Self {
        self.order_by(column, SortOrder::Descending)
    }

    #[must_use]
    pub fn order_by(mut self, column: impl Into<String>, order: SortOrder) -> Self {
        self.order.push(SortKey {
            column: column.into(),
            order,
        });
        self
    }

    #[must_use]
    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = Some(embed);
        self
    }
}
