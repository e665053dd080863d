pub const DEFAULT_DATABASE_ID: &str = "(default)";

/// Pseudo-field that orders and addresses documents by resource name.
pub const DOCUMENT_ID_FIELD: &str = "__name__";

pub(crate) const FIRESTORE_API_HOST: &str = "https://firestore.googleapis.com";
pub(crate) const FIRESTORE_API_VERSION: &str = "v1";
pub(crate) const EMULATOR_HOST_ENV: &str = "FIRESTORE_EMULATOR_HOST";

pub(crate) const OAUTH_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub(crate) const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";
pub(crate) const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
pub(crate) const REFRESH_TOKEN_GRANT_TYPE: &str = "refresh_token";
pub(crate) const METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";
