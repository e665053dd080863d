use std::collections::BTreeMap;

use crate::error::{already_exists, invalid_argument, FirestoreError, FirestoreResult};
use crate::model::FieldPath;
use crate::query::{DocumentSelector, QueryBuilder};
use crate::value::Value;
use crate::writes::UpdateWrite;

use super::database::{split_collection_path, Database};
use super::document::Document;

pub(crate) enum DocumentAction {
    View,
    Remove,
    Create {
        fields: BTreeMap<String, Value>,
    },
    Update {
        fields: BTreeMap<String, Value>,
        deletions: Vec<String>,
    },
}

/// A single-document operation under construction: view, remove, create or
/// update, targeting exactly one document via an identifier or filters.
///
/// Construct a fresh one per logical operation (the [`Database`] methods do
/// this); `end` consumes it.
pub struct DocumentQuery<'a> {
    database: &'a Database,
    collection: String,
    action: DocumentAction,
    builder: QueryBuilder,
    deferred: Option<FirestoreError>,
}

impl<'a> DocumentQuery<'a> {
    pub(crate) fn new(database: &'a Database, collection: String, action: DocumentAction) -> Self {
        let collection_id = split_collection_path(&collection).1.to_string();
        Self {
            database,
            collection,
            action,
            builder: QueryBuilder::new(collection_id),
            deferred: None,
        }
    }

    pub fn identifier(mut self, id: impl Into<String>) -> Self {
        self.builder = self.builder.identifier(id);
        self
    }

    pub fn equal<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.equal(entries);
        self
    }

    pub fn not_equal<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.not_equal(entries);
        self
    }

    pub fn less_than<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.less_than(entries);
        self
    }

    pub fn less_than_or_equal<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.less_than_or_equal(entries);
        self
    }

    pub fn greater_than<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.greater_than(entries);
        self
    }

    pub fn greater_than_or_equal<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.greater_than_or_equal(entries);
        self
    }

    pub fn is_in<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.is_in(entries);
        self
    }

    pub fn not_in<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.not_in(entries);
        self
    }

    pub fn array_contains<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.array_contains(entries);
        self
    }

    pub fn array_contains_any<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.array_contains_any(entries);
        self
    }

    pub fn starts_with<K, P, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Into<String>,
    {
        self.builder = self.builder.starts_with(entries);
        self
    }

    /// Marks a field for deletion in an update's mask. Only meaningful for
    /// [`Database::update`] operations; other actions fail at `end`.
    pub fn delete_field(mut self, field: impl AsRef<str>) -> Self {
        if !matches!(self.action, DocumentAction::Update { .. }) {
            self.defer(invalid_argument("delete_field applies to update operations"));
            return self;
        }
        match FieldPath::from_dot_separated(field.as_ref()) {
            Ok(path) => {
                if let DocumentAction::Update { deletions, .. } = &mut self.action {
                    deletions.push(path.canonical_string());
                }
            }
            Err(err) => self.defer(err),
        }
        self
    }

    pub(crate) fn defer(&mut self, err: FirestoreError) {
        self.deferred.get_or_insert(err);
    }

    /// Executes the operation.
    ///
    /// Read paths return `Ok(None)` when nothing matches; a concurrent
    /// delete between the resolve and mutate round trips also surfaces as
    /// `Ok(None)`, never as corruption.
    pub async fn end(self) -> FirestoreResult<Option<Document>> {
        let DocumentQuery {
            database,
            collection,
            action,
            builder,
            deferred,
        } = self;

        if let Some(err) = deferred {
            return Err(err);
        }
        let selector = builder.into_selector()?;

        match action {
            DocumentAction::View => match selector {
                DocumentSelector::ById(id) => database.get_document(&collection, &id).await,
                DocumentSelector::ByFilters(query) => {
                    database.resolve_single(&collection, &query).await
                }
            },
            DocumentAction::Remove => match selector {
                DocumentSelector::ById(id) => {
                    database.delete_document(&collection, &id).await?;
                    Ok(None)
                }
                DocumentSelector::ByFilters(query) => {
                    match database.resolve_single(&collection, &query).await? {
                        Some(document) => {
                            database.delete_document(&collection, document.id()).await?;
                            Ok(Some(document))
                        }
                        None => Ok(None),
                    }
                }
            },
            DocumentAction::Create { fields } => match selector {
                DocumentSelector::ById(id) => database
                    .create_document(&collection, Some(&id), &fields)
                    .await
                    .map(Some),
                DocumentSelector::ByFilters(query) => {
                    if database.resolve_single(&collection, &query).await?.is_some() {
                        return Err(already_exists(
                            "A document matching the filters already exists",
                        ));
                    }
                    database
                        .create_document(&collection, None, &fields)
                        .await
                        .map(Some)
                }
            },
            DocumentAction::Update { fields, deletions } => {
                let id = match selector {
                    DocumentSelector::ById(id) => id,
                    DocumentSelector::ByFilters(query) => {
                        match database.resolve_single(&collection, &query).await? {
                            Some(document) => document.id().to_string(),
                            None => return Ok(None),
                        }
                    }
                };
                database
                    .patch_document(&collection, &id, &fields, &deletions)
                    .await
            }
        }
    }
}

/// A collection search under construction; `end` runs the structured query
/// and returns every matching document.
pub struct Search<'a> {
    database: &'a Database,
    collection: String,
    builder: QueryBuilder,
}

impl<'a> Search<'a> {
    pub(crate) fn new(database: &'a Database, collection: String) -> Self {
        let collection_id = split_collection_path(&collection).1.to_string();
        Self {
            database,
            collection,
            builder: QueryBuilder::new(collection_id),
        }
    }

    pub fn equal<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.equal(entries);
        self
    }

    pub fn not_equal<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.not_equal(entries);
        self
    }

    pub fn less_than<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.less_than(entries);
        self
    }

    pub fn less_than_or_equal<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.less_than_or_equal(entries);
        self
    }

    pub fn greater_than<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.greater_than(entries);
        self
    }

    pub fn greater_than_or_equal<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.greater_than_or_equal(entries);
        self
    }

    pub fn is_in<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.is_in(entries);
        self
    }

    pub fn not_in<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.not_in(entries);
        self
    }

    pub fn array_contains<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.array_contains(entries);
        self
    }

    pub fn array_contains_any<K, V, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.builder = self.builder.array_contains_any(entries);
        self
    }

    pub fn starts_with<K, P, I>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: AsRef<str>,
        P: Into<String>,
    {
        self.builder = self.builder.starts_with(entries);
        self
    }

    pub fn ascending<K, I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.builder = self.builder.ascending(fields);
        self
    }

    pub fn descending<K, I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.builder = self.builder.descending(fields);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.builder = self.builder.limit(limit);
        self
    }

    pub fn offset(mut self, offset: i64) -> Self {
        self.builder = self.builder.offset(offset);
        self
    }

    pub fn start_at(mut self, value: impl Into<Value>) -> Self {
        self.builder = self.builder.start_at(value);
        self
    }

    pub fn end_at(mut self, value: impl Into<Value>) -> Self {
        self.builder = self.builder.end_at(value);
        self
    }

    pub async fn end(self) -> FirestoreResult<Vec<Document>> {
        let query = self.builder.into_search()?;
        self.database.run_query(&self.collection, &query).await
    }
}

/// A commit-style write under construction: plain fields plus server-side
/// transforms, addressed to one document identifier.
pub struct Commit<'a> {
    database: &'a Database,
    collection: String,
    identifier: Option<String>,
    write: UpdateWrite,
}

impl<'a> Commit<'a> {
    pub(crate) fn new<K, V, I>(database: &'a Database, collection: String, data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let write = data
            .into_iter()
            .fold(UpdateWrite::new(), |write, (key, value)| {
                write.set(key.into(), value)
            });
        Self {
            database,
            collection,
            identifier: None,
            write,
        }
    }

    pub fn identifier(mut self, id: impl Into<String>) -> Self {
        self.identifier = Some(id.into());
        self
    }

    pub fn increment(mut self, field: impl AsRef<str>, value: impl Into<Value>) -> Self {
        self.write = self.write.increment(field, value);
        self
    }

    pub fn append<V, I>(mut self, field: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.write = self.write.append(field, values);
        self
    }

    pub fn clear<V, I>(mut self, field: impl AsRef<str>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.write = self.write.clear(field, values);
        self
    }

    pub fn delete_field(mut self, field: impl AsRef<str>) -> Self {
        self.write = self.write.delete_field(field);
        self
    }

    pub async fn end(self) -> FirestoreResult<()> {
        let id = self
            .identifier
            .ok_or_else(|| invalid_argument("Commit requires a document identifier"))?;
        let name = self.database.document_name(&self.collection, &id);
        let body = self.write.into_commit_body(&name)?;
        self.database.commit(body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use serde_json::json;

    fn test_database(server: &MockServer) -> Database {
        Database::builder()
            .project("demo")
            .emulator_host(server.address().to_string())
            .build()
            .unwrap()
    }

    fn user_doc(id: &str, fields: serde_json::Value) -> serde_json::Value {
        json!({
            "name": format!("projects/demo/databases/(default)/documents/users/{id}"),
            "fields": fields,
        })
    }

    #[tokio::test]
    async fn view_by_identifier_fetches_document() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/projects/demo/databases/(default)/documents/users/u1");
            then.status(200)
                .json_body(user_doc("u1", json!({ "name": { "stringValue": "foo" } })));
        });

        let database = test_database(&server);
        let document = database
            .view("users")
            .identifier("u1")
            .end()
            .await
            .unwrap()
            .expect("document");
        assert_eq!(document.id(), "u1");
        assert_eq!(document.get("name"), Some(&Value::from("foo")));
    }

    #[tokio::test]
    async fn view_missing_identifier_is_none() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/projects/demo/databases/(default)/documents/users/nope");
            then.status(404)
                .json_body(json!({ "error": { "code": 404, "status": "NOT_FOUND" } }));
        });

        let database = test_database(&server);
        let result = database.view("users").identifier("nope").end().await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn view_by_filters_queries_with_limit_one() {
        let server = MockServer::start();
        let expected_body = json!({
            "structuredQuery": {
                "from": [ { "collectionId": "users" } ],
                "where": {
                    "compositeFilter": {
                        "op": "AND",
                        "filters": [
                            {
                                "fieldFilter": {
                                    "field": { "fieldPath": "account" },
                                    "op": "EQUAL",
                                    "value": { "stringValue": "2" }
                                }
                            }
                        ]
                    }
                },
                "limit": 1
            }
        });
        let _mock = server.mock(move |when, then| {
            when.method(POST)
                .path("/v1/projects/demo/databases/(default)/documents:runQuery")
                .json_body(expected_body.clone());
            then.status(200).json_body(json!([
                { "document": user_doc("u2", json!({ "count": { "integerValue": "1" } })) }
            ]));
        });

        let database = test_database(&server);
        let document = database
            .view("users")
            .equal([("account", "2")])
            .end()
            .await
            .unwrap()
            .expect("document");
        assert_eq!(document.id(), "u2");
        assert_eq!(document.get("count"), Some(&Value::from_integer(1)));
    }

    #[tokio::test]
    async fn view_by_filters_without_match_is_none() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo/databases/(default)/documents:runQuery");
            then.status(200)
                .json_body(json!([ { "readTime": "2023-01-01T00:00:00Z" } ]));
        });

        let database = test_database(&server);
        let result = database
            .view("users")
            .equal([("account", "missing")])
            .end()
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn selector_contract_checked_before_any_request() {
        let server = MockServer::start();
        let database = test_database(&server);

        let err = database.view("users").end().await.unwrap_err();
        assert_eq!(err.code_str(), "firestore/missing-filters");

        let err = database
            .view("users")
            .identifier("u1")
            .equal([("account", "2")])
            .end()
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "firestore/conflicting-selector");
    }

    #[tokio::test]
    async fn search_returns_every_document() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo/databases/(default)/documents:runQuery");
            then.status(200).json_body(json!([
                { "document": user_doc("a", json!({ "num": { "integerValue": "1" } })) },
                { "document": user_doc("b", json!({ "num": { "integerValue": "2" } })) }
            ]));
        });

        let database = test_database(&server);
        let documents = database
            .search("users")
            .greater_than([("num", 0i64)])
            .ascending(["num"])
            .end()
            .await
            .unwrap();
        assert_eq!(documents.len(), 2);
        assert_eq!(documents[0].id(), "a");
        assert_eq!(documents[1].id(), "b");
    }

    #[tokio::test]
    async fn search_scopes_to_parent_path() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST).path(
                "/v1/projects/demo/databases/(default)/documents/regions/west:runQuery",
            );
            then.status(200).json_body(json!([]));
        });

        let database = test_database(&server);
        let documents = database
            .search("regions/west/cities")
            .equal([("state", "CA")])
            .end()
            .await
            .unwrap();
        assert!(documents.is_empty());
        mock.assert();
    }

    #[tokio::test]
    async fn search_requires_filters() {
        let server = MockServer::start();
        let database = test_database(&server);
        let err = database.search("users").end().await.unwrap_err();
        assert_eq!(err.code_str(), "firestore/missing-filters");
    }

    #[tokio::test]
    async fn create_with_identifier_posts_document() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo/databases/(default)/documents/users")
                .query_param("documentId", "u7")
                .json_body(json!({
                    "fields": { "name": { "stringValue": "foo" } }
                }));
            then.status(200)
                .json_body(user_doc("u7", json!({ "name": { "stringValue": "foo" } })));
        });

        let database = test_database(&server);
        let document = database
            .create("users", [("name", "foo")])
            .identifier("u7")
            .end()
            .await
            .unwrap()
            .expect("created document");
        assert_eq!(document.id(), "u7");
        mock.assert();
    }

    #[tokio::test]
    async fn create_with_filters_fails_on_existing_match() {
        let server = MockServer::start();
        let _mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo/databases/(default)/documents:runQuery");
            then.status(200).json_body(json!([
                { "document": user_doc("existing", json!({})) }
            ]));
        });

        let database = test_database(&server);
        let err = database
            .create("users", [("name", "foo")])
            .equal([("name", "foo")])
            .end()
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "firestore/already-exists");
    }

    #[tokio::test]
    async fn create_with_filters_posts_when_absent() {
        let server = MockServer::start();
        let _query = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo/databases/(default)/documents:runQuery");
            then.status(200).json_body(json!([ {} ]));
        });
        let post = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo/databases/(default)/documents/users");
            then.status(200)
                .json_body(user_doc("generated", json!({ "name": { "stringValue": "foo" } })));
        });

        let database = test_database(&server);
        let document = database
            .create("users", [("name", "foo")])
            .equal([("name", "foo")])
            .end()
            .await
            .unwrap()
            .expect("created document");
        assert_eq!(document.id(), "generated");
        post.assert();
    }

    #[tokio::test]
    async fn create_requires_data() {
        let server = MockServer::start();
        let database = test_database(&server);
        let empty: [(&str, Value); 0] = [];
        let err = database
            .create("users", empty)
            .identifier("u1")
            .end()
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "firestore/invalid-argument");
    }

    #[tokio::test]
    async fn update_resolves_then_patches() {
        let server = MockServer::start();
        let _query = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo/databases/(default)/documents:runQuery");
            then.status(200).json_body(json!([
                { "document": user_doc("u1", json!({ "num": { "integerValue": "1" } })) }
            ]));
        });
        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/v1/projects/demo/databases/(default)/documents/users/u1")
                .query_param("currentDocument.exists", "true")
                .query_param("updateMask.fieldPaths", "num")
                .json_body(json!({
                    "fields": { "num": { "integerValue": "99" } }
                }));
            then.status(200)
                .json_body(user_doc("u1", json!({ "num": { "integerValue": "99" } })));
        });

        let database = test_database(&server);
        let document = database
            .update("users", [("num", 99i64)])
            .equal([("account", "2")])
            .end()
            .await
            .unwrap()
            .expect("updated document");
        assert_eq!(document.get("num"), Some(&Value::from_integer(99)));
        patch.assert();
    }

    #[tokio::test]
    async fn update_race_surfaces_as_none() {
        let server = MockServer::start();
        let _patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/v1/projects/demo/databases/(default)/documents/users/gone");
            then.status(404)
                .json_body(json!({ "error": { "code": 404, "status": "NOT_FOUND" } }));
        });

        let database = test_database(&server);
        let result = database
            .update("users", [("num", 1i64)])
            .identifier("gone")
            .end()
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn update_delete_field_extends_mask() {
        let server = MockServer::start();
        let patch = server.mock(|when, then| {
            when.method(PATCH)
                .path("/v1/projects/demo/databases/(default)/documents/users/u1")
                .query_param("updateMask.fieldPaths", "stale");
            then.status(200).json_body(user_doc("u1", json!({})));
        });

        let database = test_database(&server);
        database
            .update("users", [("num", 1i64)])
            .delete_field("stale")
            .identifier("u1")
            .end()
            .await
            .unwrap();
        patch.assert();
    }

    #[tokio::test]
    async fn remove_by_filters_returns_removed_document() {
        let server = MockServer::start();
        let _query = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo/databases/(default)/documents:runQuery");
            then.status(200).json_body(json!([
                { "document": user_doc("u9", json!({ "name": { "stringValue": "bye" } })) }
            ]));
        });
        let delete = server.mock(|when, then| {
            when.method(DELETE)
                .path("/v1/projects/demo/databases/(default)/documents/users/u9");
            then.status(200).json_body(json!({}));
        });

        let database = test_database(&server);
        let removed = database
            .remove("users")
            .equal([("name", "bye")])
            .end()
            .await
            .unwrap()
            .expect("removed document");
        assert_eq!(removed.id(), "u9");
        delete.assert();
    }

    #[tokio::test]
    async fn set_commits_fields_and_transforms() {
        let server = MockServer::start();
        let commit = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/projects/demo/databases/(default)/documents:commit")
                .json_body(json!({
                    "writes": [
                        {
                            "update": {
                                "name": "projects/demo/databases/(default)/documents/users/u1",
                                "fields": { "set": { "stringValue": "bar" } }
                            },
                            "updateMask": { "fieldPaths": ["set"] },
                            "updateTransforms": [
                                {
                                    "fieldPath": "inc",
                                    "increment": { "integerValue": "1" }
                                },
                                {
                                    "fieldPath": "ar",
                                    "appendMissingElements": {
                                        "values": [ { "integerValue": "2" } ]
                                    }
                                }
                            ]
                        }
                    ]
                }));
            then.status(200).json_body(json!({ "commitTime": "2023-01-01T00:00:00Z" }));
        });

        let database = test_database(&server);
        database
            .set("users", [("set", "bar")])
            .identifier("u1")
            .increment("inc", 1i64)
            .append("ar", vec![2i64])
            .end()
            .await
            .unwrap();
        commit.assert();
    }

    #[tokio::test]
    async fn set_requires_identifier() {
        let server = MockServer::start();
        let database = test_database(&server);
        let err = database.set("users", [("a", 1i64)]).end().await.unwrap_err();
        assert_eq!(err.code_str(), "firestore/invalid-argument");
    }
}
