mod database_id;
mod field_path;
mod geo_point;

pub use database_id::DatabaseId;
pub use field_path::FieldPath;
pub use geo_point::GeoPoint;
