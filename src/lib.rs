//! A lightweight Cloud Firestore REST client.
//!
//! The crate maps a collection/document CRUD+query vocabulary onto the
//! Firestore REST wire protocol: typed field values, structured queries
//! with composite filters, commit-style writes with field transforms, and
//! OAuth2 token acquisition.
//!
//! ```no_run
//! use firestore_lite::{Database, StaticTokenProvider};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let database = Database::builder()
//!     .project("my-project")
//!     .token_provider(StaticTokenProvider::new("ya29..."))
//!     .build()?;
//!
//! let user = database
//!     .view("users")
//!     .equal([("account", "42")])
//!     .end()
//!     .await?;
//!
//! let adults = database
//!     .search("users")
//!     .greater_than_or_equal([("age", 18i64)])
//!     .descending(["age"])
//!     .limit(20)
//!     .end()
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod codec;
pub(crate) mod constants;
pub mod credentials;
pub mod error;
pub mod model;
pub mod query;
pub mod remote;
pub mod value;
pub mod writes;

pub use api::{Commit, Database, DatabaseBuilder, Document, DocumentQuery, Search};
pub use constants::{DEFAULT_DATABASE_ID, DOCUMENT_ID_FIELD};
pub use credentials::{
    AuthorizedUserCredentials, AuthorizedUserTokenProvider, JwtSigner, MetadataTokenProvider,
    NoopTokenProvider, ServiceAccountCredentials, ServiceAccountTokenProvider,
    StaticTokenProvider, TokenProvider,
};
pub use error::{FirestoreError, FirestoreErrorCode, FirestoreResult};
pub use model::{DatabaseId, FieldPath, GeoPoint};
pub use query::{Direction, FilterOperator, QueryBuilder};
pub use value::{Value, ValueKind};
