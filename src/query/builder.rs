use serde_json::Value as JsonValue;

use crate::error::{
    conflicting_selector, invalid_argument, missing_filters, FirestoreError, FirestoreResult,
};
use crate::model::FieldPath;
use crate::query::structured::encode_structured_query;
use crate::value::Value;

/// Field comparison operators understood by the structured-query endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterOperator {
    In,
    NotIn,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    ArrayContains,
    ArrayContainsAny,
    GreaterThan,
    GreaterThanOrEqual,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT_IN",
            FilterOperator::Equal => "EQUAL",
            FilterOperator::NotEqual => "NOT_EQUAL",
            FilterOperator::LessThan => "LESS_THAN",
            FilterOperator::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            FilterOperator::ArrayContains => "ARRAY_CONTAINS",
            FilterOperator::ArrayContainsAny => "ARRAY_CONTAINS_ANY",
            FilterOperator::GreaterThan => "GREATER_THAN",
            FilterOperator::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        }
    }
}

/// One comparison clause: field path, operator, comparison value.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    field: FieldPath,
    operator: FilterOperator,
    value: Value,
}

impl FieldFilter {
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn operator(&self) -> FilterOperator {
        self.operator
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrderClause {
    field: FieldPath,
    direction: Direction,
}

impl OrderClause {
    pub fn field(&self) -> &FieldPath {
        &self.field
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

/// Accumulates filters, ordering, cursors and bounds for one request.
///
/// One builder maps to exactly one in-flight logical request: every fluent
/// method consumes and returns the builder, and finalization consumes it
/// for good, so a finalized builder cannot leak state into a later request.
/// Invalid input inside a chain (an empty field path, a prefix with no
/// upper bound) is deferred and surfaces from the finalizer.
#[derive(Debug)]
pub struct QueryBuilder {
    collection_id: String,
    identifier: Option<String>,
    filters: Vec<FieldFilter>,
    order_by: Vec<OrderClause>,
    start_at: Vec<Value>,
    end_at: Vec<Value>,
    limit: Option<i64>,
    offset: Option<i64>,
    deferred: Option<FirestoreError>,
}

impl QueryBuilder {
    pub fn new(collection_id: impl Into<String>) -> Self {
        Self {
            collection_id: collection_id.into(),
            identifier: None,
            filters: Vec::new(),
            order_by: Vec::new(),
            start_at: Vec::new(),
            end_at: Vec::new(),
            limit: None,
            offset: None,
            deferred: None,
        }
    }

    pub fn equal<K, V, I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.filter_entries(FilterOperator::Equal, entries)
    }

    pub fn not_equal<K, V, I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.filter_entries(FilterOperator::NotEqual, entries)
    }

    pub fn less_than<K, V, I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.filter_entries(FilterOperator::LessThan, entries)
    }

    pub fn less_than_or_equal<K, V, I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.filter_entries(FilterOperator::LessThanOrEqual, entries)
    }

    pub fn greater_than<K, V, I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.filter_entries(FilterOperator::GreaterThan, entries)
    }

    pub fn greater_than_or_equal<K, V, I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.filter_entries(FilterOperator::GreaterThanOrEqual, entries)
    }

    /// `IN` membership. The service caps the comparison array size; the cap
    /// is not checked client-side and a violation surfaces verbatim.
    pub fn is_in<K, V, I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.filter_entries(FilterOperator::In, entries)
    }

    /// `NOT_IN` membership. See [`QueryBuilder::is_in`] on array-size caps.
    pub fn not_in<K, V, I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.filter_entries(FilterOperator::NotIn, entries)
    }

    pub fn array_contains<K, V, I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.filter_entries(FilterOperator::ArrayContains, entries)
    }

    pub fn array_contains_any<K, V, I>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.filter_entries(FilterOperator::ArrayContainsAny, entries)
    }

    /// Lexicographic prefix match, expanded into a half-open range:
    /// `field >= prefix AND field < bound`, where `bound` is the prefix with
    /// its final character's code point incremented. Prefixes whose final
    /// character has no incrementable successor (`char::MAX`, or the edge of
    /// the surrogate gap) are rejected rather than silently mis-queried.
    pub fn starts_with<K, P, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Into<String>,
    {
        for (field, prefix) in entries {
            let prefix = prefix.into();
            match prefix_upper_bound(&prefix) {
                Ok(bound) => {
                    self.push_filter(
                        field.as_ref(),
                        FilterOperator::GreaterThanOrEqual,
                        Value::from_string(prefix),
                    );
                    self.push_filter(field.as_ref(), FilterOperator::LessThan, Value::from_string(bound));
                }
                Err(err) => self.defer(err),
            }
        }
        self
    }

    /// Appends ascending order clauses; with no fields, orders by the
    /// `__name__` pseudo-field as a stable tiebreaker.
    pub fn ascending<K, I>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.order_entries(Direction::Ascending, fields)
    }

    /// Appends descending order clauses; with no fields, orders by the
    /// `__name__` pseudo-field.
    pub fn descending<K, I>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.order_entries(Direction::Descending, fields)
    }

    /// Maximum number of results. The last call wins.
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Number of results to skip. The last call wins.
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Appends an inclusive start-cursor value. Cursor values align
    /// positionally with the order clauses: the Nth value anchors the Nth
    /// clause, so a cursor with N values needs at least N clauses. When no
    /// order clause exists yet, an ascending `__name__` clause is inserted
    /// first, since a cursor is meaningless without an order.
    pub fn start_at(mut self, value: impl Into<Value>) -> Self {
        self.ensure_cursor_order();
        self.start_at.push(value.into());
        self
    }

    /// Appends an inclusive end-cursor value. See [`QueryBuilder::start_at`]
    /// for the alignment requirement.
    pub fn end_at(mut self, value: impl Into<Value>) -> Self {
        self.ensure_cursor_order();
        self.end_at.push(value.into());
        self
    }

    /// Selects a document directly by id, mutually exclusive with filters.
    pub fn identifier(mut self, id: impl Into<String>) -> Self {
        self.identifier = Some(id.into());
        self
    }

    /// Finalizes for a document-scoped operation: the document must resolve
    /// through exactly one of an explicit identifier or a filter match.
    /// Filter-based selection is submitted with a forced limit of 1; order
    /// clauses, cursors and bounds do not apply to single-document
    /// resolution and are dropped.
    pub fn into_selector(self) -> FirestoreResult<DocumentSelector> {
        if let Some(err) = self.deferred {
            return Err(err);
        }
        match (self.identifier, self.filters.is_empty()) {
            (Some(_), false) => Err(conflicting_selector(
                "A document resolves through an identifier or filters, never both",
            )),
            (Some(id), true) => Ok(DocumentSelector::ById(id)),
            (None, true) => Err(missing_filters(
                "Document operations require an identifier or at least one filter",
            )),
            (None, false) => Ok(DocumentSelector::ByFilters(StructuredQuery {
                collection_id: self.collection_id,
                filters: self.filters,
                order_by: Vec::new(),
                start_at: Vec::new(),
                end_at: Vec::new(),
                limit: Some(1),
                offset: None,
            })),
        }
    }

    /// Finalizes for a collection search: requires at least one filter and
    /// refuses an identifier.
    pub fn into_search(self) -> FirestoreResult<StructuredQuery> {
        if let Some(err) = self.deferred {
            return Err(err);
        }
        if self.identifier.is_some() {
            return Err(conflicting_selector(
                "An identifier is not a valid search selector",
            ));
        }
        if self.filters.is_empty() {
            return Err(missing_filters("Search requires at least one filter"));
        }
        Ok(StructuredQuery {
            collection_id: self.collection_id,
            filters: self.filters,
            order_by: self.order_by,
            start_at: self.start_at,
            end_at: self.end_at,
            limit: self.limit,
            offset: self.offset,
        })
    }

    fn filter_entries<K, V, I>(mut self, operator: FilterOperator, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        for (field, value) in entries {
            self.push_filter(field.as_ref(), operator, value.into());
        }
        self
    }

    fn order_entries<K, I>(mut self, direction: Direction, fields: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let mut any = false;
        for field in fields {
            any = true;
            match FieldPath::from_dot_separated(field.as_ref()) {
                Ok(path) => self.order_by.push(OrderClause {
                    field: path,
                    direction,
                }),
                Err(err) => self.defer(err),
            }
        }
        if !any {
            self.order_by.push(OrderClause {
                field: FieldPath::document_id(),
                direction,
            });
        }
        self
    }

    fn push_filter(&mut self, field: &str, operator: FilterOperator, value: Value) {
        match FieldPath::from_dot_separated(field) {
            Ok(path) => self.filters.push(FieldFilter {
                field: path,
                operator,
                value,
            }),
            Err(err) => self.defer(err),
        }
    }

    fn ensure_cursor_order(&mut self) {
        if self.order_by.is_empty() {
            self.order_by.push(OrderClause {
                field: FieldPath::document_id(),
                direction: Direction::Ascending,
            });
        }
    }

    fn defer(&mut self, err: FirestoreError) {
        // First failure wins; later chain calls keep it intact.
        self.deferred.get_or_insert(err);
    }
}

/// How a document-scoped operation locates its target.
#[derive(Debug)]
pub enum DocumentSelector {
    ById(String),
    ByFilters(StructuredQuery),
}

/// A finalized query, ready to encode as one `structuredQuery` payload.
#[derive(Clone, Debug)]
pub struct StructuredQuery {
    pub(crate) collection_id: String,
    pub(crate) filters: Vec<FieldFilter>,
    pub(crate) order_by: Vec<OrderClause>,
    pub(crate) start_at: Vec<Value>,
    pub(crate) end_at: Vec<Value>,
    pub(crate) limit: Option<i64>,
    pub(crate) offset: Option<i64>,
}

impl StructuredQuery {
    pub fn collection_id(&self) -> &str {
        &self.collection_id
    }

    pub fn filters(&self) -> &[FieldFilter] {
        &self.filters
    }

    pub fn order_by(&self) -> &[OrderClause] {
        &self.order_by
    }

    /// The complete `{"structuredQuery": {...}}` request body.
    pub fn request_body(&self) -> JsonValue {
        serde_json::json!({ "structuredQuery": encode_structured_query(self) })
    }
}

fn prefix_upper_bound(prefix: &str) -> FirestoreResult<String> {
    let mut chars: Vec<char> = prefix.chars().collect();
    let last = chars
        .pop()
        .ok_or_else(|| invalid_argument("starts_with requires a non-empty prefix"))?;
    let next = u32::from(last)
        .checked_add(1)
        .and_then(char::from_u32)
        .ok_or_else(|| {
            invalid_argument(format!(
                "starts_with cannot derive an exclusive upper bound after {last:?}"
            ))
        })?;
    chars.push(next);
    Ok(chars.into_iter().collect())
}
