mod builder;
mod structured;

pub use builder::{
    Direction, DocumentSelector, FieldFilter, FilterOperator, OrderClause, QueryBuilder,
    StructuredQuery,
};
