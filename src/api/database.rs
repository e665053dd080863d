use std::collections::BTreeMap;
use std::sync::Arc;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use reqwest::Method;
use serde_json::Value as JsonValue;

use crate::codec::{decode_document_fields, encode_document_fields};
use crate::credentials::{NoopTokenProvider, TokenProvider, TokenProviderArc};
use crate::error::{internal_error, invalid_argument, missing_project_id, FirestoreResult};
use crate::model::DatabaseId;
use crate::query::StructuredQuery;
use crate::remote::{Connection, RequestContext};
use crate::value::Value;

use super::document::Document;
use super::operations::{Commit, DocumentAction, DocumentQuery, Search};

// Escapes query-string components; dots stay literal so update masks read
// naturally in logs and mocks.
const QUERY_COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'&')
    .add(b'=')
    .add(b'+')
    .add(b'?');

/// The client: one database plus the token source used to reach it.
///
/// Every operation method returns a fresh single-use builder; builders are
/// never cached or reused, so no filter or cursor state can leak between
/// logical requests.
#[derive(Clone)]
pub struct Database {
    connection: Connection,
    database_id: DatabaseId,
    auth: TokenProviderArc,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("connection", &self.connection)
            .field("database_id", &self.database_id)
            .field("auth", &"<dyn TokenProvider>")
            .finish()
    }
}

pub struct DatabaseBuilder {
    project_id: Option<String>,
    database: String,
    auth: TokenProviderArc,
    client: Option<reqwest::Client>,
    emulator_host: Option<String>,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder {
            project_id: None,
            database: crate::constants::DEFAULT_DATABASE_ID.to_string(),
            auth: Arc::new(NoopTokenProvider),
            client: None,
            emulator_host: None,
        }
    }

    pub fn database_id(&self) -> &DatabaseId {
        &self.database_id
    }

    /// Reads one document, selected by identifier or by filters.
    pub fn view(&self, collection: impl Into<String>) -> DocumentQuery<'_> {
        DocumentQuery::new(self, collection.into(), DocumentAction::View)
    }

    /// Deletes one document, selected by identifier or by filters. The
    /// filter path returns the removed document's fields.
    pub fn remove(&self, collection: impl Into<String>) -> DocumentQuery<'_> {
        DocumentQuery::new(self, collection.into(), DocumentAction::Remove)
    }

    /// Creates a document. With an identifier the write is direct; with
    /// filters the collection is probed first and an existing match fails
    /// with `already-exists`.
    pub fn create<K, V, I>(&self, collection: impl Into<String>, data: I) -> DocumentQuery<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let fields = collect_fields(data);
        let empty = fields.is_empty();
        let mut query =
            DocumentQuery::new(self, collection.into(), DocumentAction::Create { fields });
        if empty {
            query.defer(invalid_argument("Create requires at least one field"));
        }
        query
    }

    /// Patches a document: supplied fields are written under an update mask
    /// with an exists precondition; resolution happens first when filters
    /// are used (resolve-then-mutate, two round trips, not atomic).
    pub fn update<K, V, I>(&self, collection: impl Into<String>, data: I) -> DocumentQuery<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let fields = collect_fields(data);
        let empty = fields.is_empty();
        let mut query = DocumentQuery::new(
            self,
            collection.into(),
            DocumentAction::Update {
                fields,
                deletions: Vec::new(),
            },
        );
        if empty {
            query.defer(invalid_argument("Update requires at least one field"));
        }
        query
    }

    /// Runs a structured query over a collection (or a parent-scoped
    /// collection path such as `regions/west/cities`).
    pub fn search(&self, collection: impl Into<String>) -> Search<'_> {
        Search::new(self, collection.into())
    }

    /// Builds a commit-style write with optional field transforms. An
    /// explicit identifier is required before the commit is sent.
    pub fn set<K, V, I>(&self, collection: impl Into<String>, data: I) -> Commit<'_>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Commit::new(self, collection.into(), data)
    }

    pub(crate) async fn request_context(&self) -> FirestoreResult<RequestContext> {
        Ok(RequestContext {
            auth_token: self.auth.get_token().await?,
        })
    }

    pub(crate) fn document_name(&self, collection: &str, id: &str) -> String {
        format!(
            "{}/documents/{collection}/{id}",
            self.database_id.resource_name()
        )
    }

    pub(crate) async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> FirestoreResult<Option<Document>> {
        let path = format!("documents/{collection}/{id}");
        let context = self.request_context().await?;
        match self
            .connection
            .invoke_json_optional(Method::GET, &path, None, &context)
            .await?
        {
            Some(json) => parse_document(&json).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) async fn delete_document(&self, collection: &str, id: &str) -> FirestoreResult<()> {
        let path = format!("documents/{collection}/{id}");
        let context = self.request_context().await?;
        // DELETE on an already-missing document is a benign race.
        self.connection
            .invoke_json_optional(Method::DELETE, &path, None, &context)
            .await?;
        Ok(())
    }

    pub(crate) async fn create_document(
        &self,
        collection: &str,
        document_id: Option<&str>,
        fields: &BTreeMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let path = match document_id {
            Some(id) => format!(
                "documents/{collection}?documentId={}",
                utf8_percent_encode(id, QUERY_COMPONENT)
            ),
            None => format!("documents/{collection}"),
        };
        let body = encode_document_fields(fields);
        let context = self.request_context().await?;
        let response = self
            .connection
            .invoke_json(Method::POST, &path, Some(body), &context)
            .await?;
        parse_document(&response)
    }

    pub(crate) async fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: &BTreeMap<String, Value>,
        deletions: &[String],
    ) -> FirestoreResult<Option<Document>> {
        let mut query = String::from("?currentDocument.exists=true");
        for path in fields.keys().map(String::as_str).chain(deletions.iter().map(String::as_str)) {
            query.push_str("&updateMask.fieldPaths=");
            query.push_str(&utf8_percent_encode(path, QUERY_COMPONENT).to_string());
        }

        let path = format!("documents/{collection}/{id}{query}");
        let body = encode_document_fields(fields);
        let context = self.request_context().await?;
        match self
            .connection
            .invoke_json_optional(Method::PATCH, &path, Some(body), &context)
            .await?
        {
            Some(json) => parse_document(&json).map(Some),
            None => Ok(None),
        }
    }

    pub(crate) async fn run_query(
        &self,
        collection_path: &str,
        query: &StructuredQuery,
    ) -> FirestoreResult<Vec<Document>> {
        let path = match split_collection_path(collection_path).0 {
            Some(parent) => format!("documents/{parent}:runQuery"),
            None => "documents:runQuery".to_string(),
        };
        let body = query.request_body();
        let context = self.request_context().await?;
        let response = self
            .connection
            .invoke_json(Method::POST, &path, Some(body), &context)
            .await?;

        let entries = response
            .as_array()
            .ok_or_else(|| internal_error("runQuery response must be an array"))?;

        let mut documents = Vec::new();
        for entry in entries {
            // Entries without a document carry readTime bookkeeping only.
            let document = match entry.get("document") {
                Some(document) => document,
                None => continue,
            };
            documents.push(parse_document(document)?);
        }
        Ok(documents)
    }

    pub(crate) async fn resolve_single(
        &self,
        collection_path: &str,
        query: &StructuredQuery,
    ) -> FirestoreResult<Option<Document>> {
        let documents = self.run_query(collection_path, query).await?;
        Ok(documents.into_iter().next())
    }

    pub(crate) async fn commit(&self, body: JsonValue) -> FirestoreResult<()> {
        let context = self.request_context().await?;
        self.connection
            .invoke_json(Method::POST, "documents:commit", Some(body), &context)
            .await?;
        Ok(())
    }
}

impl DatabaseBuilder {
    pub fn project(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    pub fn token_provider(mut self, provider: impl TokenProvider) -> Self {
        self.auth = Arc::new(provider);
        self
    }

    pub fn shared_token_provider(mut self, provider: TokenProviderArc) -> Self {
        self.auth = provider;
        self
    }

    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn emulator_host(mut self, host: impl Into<String>) -> Self {
        self.emulator_host = Some(host.into());
        self
    }

    pub fn build(self) -> FirestoreResult<Database> {
        let project_id = self.project_id.ok_or_else(missing_project_id)?;
        let database_id = DatabaseId::new(project_id, self.database);

        let mut connection_builder = Connection::builder(database_id.clone());
        if let Some(client) = self.client {
            connection_builder = connection_builder.with_client(client);
        }
        if let Some(host) = self.emulator_host {
            connection_builder = connection_builder.with_emulator_host(host);
        }

        Ok(Database {
            connection: connection_builder.build()?,
            database_id,
            auth: self.auth,
        })
    }
}

pub(crate) fn split_collection_path(path: &str) -> (Option<&str>, &str) {
    match path.rfind('/') {
        Some(index) => (Some(&path[..index]), &path[index + 1..]),
        None => (None, path),
    }
}

fn collect_fields<K, V, I>(data: I) -> BTreeMap<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    data.into_iter()
        .map(|(key, value)| (key.into(), value.into()))
        .collect()
}

fn parse_document(json: &JsonValue) -> FirestoreResult<Document> {
    let name = json
        .get("name")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| internal_error("Document response missing 'name'"))?;
    let fields = decode_document_fields(json)?;
    Ok(Document::new(name, fields))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_requires_project() {
        let err = Database::builder().build().unwrap_err();
        assert_eq!(err.code_str(), "firestore/missing-project-id");
    }

    #[test]
    fn splits_parent_collection_paths() {
        assert_eq!(split_collection_path("users"), (None, "users"));
        assert_eq!(
            split_collection_path("regions/west/cities"),
            (Some("regions/west"), "cities")
        );
    }

    #[test]
    fn document_name_includes_database_resource() {
        let database = Database::builder().project("demo").build().unwrap();
        assert_eq!(
            database.document_name("users", "u1"),
            "projects/demo/databases/(default)/documents/users/u1"
        );
    }
}
