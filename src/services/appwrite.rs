use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::models::{FounderProfile, InvestorRecord};
use crate::services::directory::{DirectoryError, ProfileDirectory};

/// Appwrite API client
///
/// Reads founder and investor profiles from the platform's document store.
/// Nothing here writes; profile CRUD belongs to other services.
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub founder_profiles: String,
    pub investor_profiles: String,
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
        timeout: Duration,
    ) -> Result<Self, DirectoryError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    /// List documents of a collection matching the given Appwrite queries
    async fn list_documents(
        &self,
        collection: &str,
        queries: &[String],
    ) -> Result<Vec<Value>, DirectoryError> {
        let query_string = queries
            .iter()
            .map(|q| format!("queries[]={}", urlencoding::encode(q)))
            .collect::<Vec<_>>()
            .join("&");

        let url = format!(
            "{}/databases/{}/collections/{}/documents?{}",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection,
            query_string
        );

        tracing::debug!("Listing documents from collection {}", collection);

        let response = self
            .client
            .get(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(DirectoryError::Unauthorized);
            }
            status => {
                let body = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unable to read body".to_string());
                tracing::error!("Appwrite list on {} failed: {} - {}", collection, status, body);
                return Err(DirectoryError::ApiError(format!(
                    "Failed to list {}: {}",
                    collection, status
                )));
            }
        }

        let json: Value = response.json().await?;

        json.get("documents")
            .and_then(|d| d.as_array())
            .cloned()
            .ok_or_else(|| DirectoryError::InvalidResponse("Missing documents array".into()))
    }
}

/// Appwrite wraps attributes either inline or under `data`
fn parse_document<T: DeserializeOwned>(doc: &Value) -> Result<T, serde_json::Error> {
    let data = doc.get("data").unwrap_or(doc);
    serde_json::from_value(data.clone())
}

fn equal_query(attribute: &str, values: &[String]) -> String {
    format!("equal(\"{}\", {})", attribute, Value::from(values.to_vec()))
}

#[async_trait]
impl ProfileDirectory for AppwriteClient {
    async fn get_founder(&self, founder_id: &str) -> Result<FounderProfile, DirectoryError> {
        let queries = vec![
            equal_query("userId", &[founder_id.to_string()]),
            "limit(1)".to_string(),
        ];

        let documents = self
            .list_documents(&self.collections.founder_profiles, &queries)
            .await?;

        let doc = documents.first().ok_or_else(|| {
            DirectoryError::NotFound(format!("Founder profile not found for user {}", founder_id))
        })?;

        parse_document(doc).map_err(|e| {
            DirectoryError::InvalidResponse(format!("Failed to parse founder profile: {}", e))
        })
    }

    async fn find_investors(
        &self,
        investor_ids: &[String],
    ) -> Result<Vec<InvestorRecord>, DirectoryError> {
        if investor_ids.is_empty() {
            return Ok(vec![]);
        }

        let queries = vec![
            equal_query("userId", investor_ids),
            format!("limit({})", investor_ids.len()),
        ];

        let documents = self
            .list_documents(&self.collections.investor_profiles, &queries)
            .await?;

        let investors: Vec<InvestorRecord> = documents
            .iter()
            .filter_map(|doc| match parse_document::<InvestorRecord>(doc) {
                Ok(investor) => Some(investor),
                Err(e) => {
                    tracing::warn!("Skipping unparseable investor document: {}", e);
                    None
                }
            })
            .filter(|investor| investor_ids.contains(&investor.user_id))
            .collect();

        tracing::debug!(
            "Resolved {} of {} investor ids",
            investors.len(),
            investor_ids.len()
        );

        Ok(investors)
    }
}
