//! HTTP client for the hosted document database's REST surface.
//!
//! # Responsibility
//! - Issue document CRUD, batch commits and structured queries.
//! - Map transport and server failures onto [`StoreError`].
//!
//! # Invariants
//! - Every request carries the configured API key.
//! - Non-success responses become `StoreError::Backend` with the server's
//!   message; a missing precondition target becomes `NotFound`.

use crate::config::RemoteSettings;
use crate::store::{StoreError, StoreResult};
use log::debug;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use serde_json::{json, Map, Value};

const API_HOST: &str = "https://firestore.googleapis.com/v1";

/// One decoded document: its id and its typed fields.
pub(crate) type DocumentEntry = (String, Map<String, Value>);

pub(crate) struct DocumentClient {
    http: Client,
    project_id: String,
    api_key: String,
}

impl DocumentClient {
    pub fn new(settings: &RemoteSettings) -> StoreResult<Self> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            project_id: settings.project_id.clone(),
            api_key: settings.api_key.clone(),
        })
    }

    fn database_path(&self) -> String {
        format!("projects/{}/databases/(default)/documents", self.project_id)
    }

    /// Full resource name for one document, as batch writes address it.
    pub fn document_name(&self, collection: &str, id: &str) -> String {
        format!("{}/{collection}/{id}", self.database_path())
    }

    fn collection_url(&self, collection: &str) -> String {
        format!("{API_HOST}/{}/{collection}", self.database_path())
    }

    fn document_url(&self, collection: &str, id: &str) -> String {
        format!("{API_HOST}/{}", self.document_name(collection, id))
    }

    /// Creates a document with a backend-assigned id; returns that id.
    pub fn create_document(&self, collection: &str, fields: Value) -> StoreResult<String> {
        let response = self
            .http
            .post(self.collection_url(collection))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "fields": fields }))
            .send()?;
        let body = require_success(response)?;
        let name = body
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::InvalidData("create response carries no name".into()))?;
        Ok(super::values::document_id(name).to_string())
    }

    /// Fetches one document; `Ok(None)` when it does not exist.
    pub fn get_document(&self, collection: &str, id: &str) -> StoreResult<Option<DocumentEntry>> {
        let response = self
            .http
            .get(self.document_url(collection, id))
            .query(&[("key", self.api_key.as_str())])
            .send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = require_success(response)?;
        Ok(Some(decode_document(&body)?))
    }

    /// Overwrites only the masked fields of an existing document.
    pub fn patch_document(
        &self,
        collection: &str,
        id: &str,
        fields: Value,
        mask: &[&str],
    ) -> StoreResult<()> {
        let mut query: Vec<(&str, &str)> = vec![
            ("key", self.api_key.as_str()),
            ("currentDocument.exists", "true"),
        ];
        for path in mask {
            query.push(("updateMask.fieldPaths", path));
        }

        let response = self
            .http
            .patch(self.document_url(collection, id))
            .query(&query)
            .json(&json!({ "fields": fields }))
            .send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        require_success(response)?;
        Ok(())
    }

    /// Deletes one document, failing with `NotFound` when it is absent.
    pub fn delete_document(&self, collection: &str, id: &str) -> StoreResult<()> {
        let response = self
            .http
            .delete(self.document_url(collection, id))
            .query(&[
                ("key", self.api_key.as_str()),
                ("currentDocument.exists", "true"),
            ])
            .send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(id.to_string()));
        }
        require_success(response)?;
        Ok(())
    }

    /// Applies a batch of writes atomically.
    pub fn commit(&self, writes: Vec<Value>) -> StoreResult<()> {
        let url = format!("{API_HOST}/{}:commit", self.database_path());
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "writes": writes }))
            .send()?;
        require_success(response)?;
        Ok(())
    }

    /// Runs a structured query and returns the matching documents.
    pub fn run_query(&self, structured_query: Value) -> StoreResult<Vec<DocumentEntry>> {
        let url = format!("{API_HOST}/{}:runQuery", self.database_path());
        let response = self
            .http
            .post(url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "structuredQuery": structured_query }))
            .send()?;
        let body = require_success(response)?;

        let rows = body
            .as_array()
            .ok_or_else(|| StoreError::InvalidData("query response is not an array".into()))?;
        let mut documents = Vec::new();
        for row in rows {
            // Rows without a document are query progress markers.
            if let Some(document) = row.get("document") {
                documents.push(decode_document(document)?);
            }
        }
        debug!(
            "event=remote_query module=store status=ok documents={}",
            documents.len()
        );
        Ok(documents)
    }
}

fn decode_document(document: &Value) -> StoreResult<DocumentEntry> {
    let name = document
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::InvalidData("document carries no name".into()))?;
    let fields = document
        .get("fields")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();
    Ok((super::values::document_id(name).to_string(), fields))
}

fn require_success(response: Response) -> StoreResult<Value> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json()?);
    }

    let message = response
        .json::<Value>()
        .ok()
        .as_ref()
        .and_then(|body| body.get("error"))
        .and_then(|error| error.get("message"))
        .and_then(Value::as_str)
        .map_or_else(|| status.to_string(), str::to_string);
    Err(StoreError::Backend {
        status: status.as_u16(),
        message,
    })
}

/// Write entry replacing only the masked fields of `name`.
pub(crate) fn update_write(name: &str, fields: Value, mask: &[&str]) -> Value {
    json!({
        "update": { "name": name, "fields": fields },
        "updateMask": { "fieldPaths": mask },
    })
}

/// Write entry removing `name`.
pub(crate) fn delete_write(name: &str) -> Value {
    json!({ "delete": name })
}

/// Write entry stamping `field_path` with the server's request time.
pub(crate) fn server_timestamp_write(name: &str, field_path: &str) -> Value {
    json!({
        "transform": {
            "document": name,
            "fieldTransforms": [
                { "fieldPath": field_path, "setToServerValue": "REQUEST_TIME" }
            ],
        },
    })
}

/// Query over one collection ordered by the order key.
pub(crate) fn ordered_query(
    collection: &str,
    descending: bool,
    limit: Option<u32>,
    project_filter: Option<&str>,
) -> Value {
    let mut query = json!({
        "from": [{ "collectionId": collection }],
        "orderBy": [{
            "field": { "fieldPath": "order" },
            "direction": if descending { "DESCENDING" } else { "ASCENDING" },
        }],
    });
    if let Some(limit) = limit {
        query["limit"] = json!(limit);
    }
    if let Some(project_id) = project_filter {
        query["where"] = project_id_filter(project_id);
    }
    query
}

/// Query selecting every task of one project, unordered.
pub(crate) fn project_tasks_query(project_id: &str) -> Value {
    json!({
        "from": [{ "collectionId": "tasks" }],
        "where": project_id_filter(project_id),
    })
}

fn project_id_filter(project_id: &str) -> Value {
    json!({
        "fieldFilter": {
            "field": { "fieldPath": "projectId" },
            "op": "EQUAL",
            "value": { "stringValue": project_id },
        },
    })
}
