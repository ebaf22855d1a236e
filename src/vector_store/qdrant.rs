//! Qdrant REST backend.
//!
//! Only the handful of endpoints the store needs are wrapped:
//!
//! | Operation | Request |
//! |-----------|---------|
//! | list | `GET /collections` |
//! | create | `PUT /collections/{name}` |
//! | upsert | `PUT /collections/{name}/points?wait=true` |
//! | search | `POST /collections/{name}/points/search` |
//! | delete | `DELETE /collections/{name}` |
//! | info | `GET /collections/{name}` |

use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use tracing::debug;

use super::{
    CollectionInfo, Metadata, MetadataFilter, Record, RetrievalResult, unsupported_filter_key,
};
use crate::error::StoreError;

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Deserialize)]
struct CollectionsList {
    collections: Vec<CollectionDescription>,
}

#[derive(Deserialize)]
struct CollectionDescription {
    name: String,
}

#[derive(Serialize)]
struct CreateCollection {
    vectors: VectorParams,
}

#[derive(Serialize)]
struct VectorParams {
    size: usize,
    distance: &'static str,
}

#[derive(Serialize)]
struct PointStruct<'a> {
    id: &'a str,
    vector: &'a [f32],
    payload: &'a Metadata,
}

#[derive(Serialize)]
struct UpsertPoints<'a> {
    points: Vec<PointStruct<'a>>,
}

#[derive(Serialize)]
struct FieldCondition<'a> {
    key: &'a str,
    #[serde(rename = "match")]
    match_value: MatchValue<'a>,
}

#[derive(Serialize)]
struct MatchValue<'a> {
    value: &'a Value,
}

#[derive(Serialize)]
struct Filter<'a> {
    must: Vec<FieldCondition<'a>>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    vector: &'a [f32],
    limit: usize,
    with_payload: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<Filter<'a>>,
}

#[derive(Deserialize)]
struct ScoredPoint {
    score: f32,
    #[serde(default)]
    payload: Option<Metadata>,
}

#[derive(Deserialize)]
struct CollectionInfoResult {
    status: String,
    #[serde(default)]
    vectors_count: Option<u64>,
    #[serde(default)]
    points_count: Option<u64>,
}

/// HTTP client for a single Qdrant server.
#[derive(Debug, Clone)]
pub struct QdrantBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl QdrantBackend {
    /// Build a client and probe the server with `GET /collections`.
    ///
    /// # Errors
    /// [`StoreError::BackendUnavailable`] if the probe fails for any reason.
    pub async fn connect(url: &str, api_key: Option<String>) -> Result<Self, StoreError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(3))
            .build()?;
        let backend = Self {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            api_key,
        };

        backend
            .list_collections()
            .await
            .map_err(|e| StoreError::BackendUnavailable(e.to_string()))?;
        Ok(backend)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let request = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.api_key {
            Some(key) => request.header("api-key", key),
            None => request,
        }
    }

    pub async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        let response = self.request(Method::GET, "/collections").send().await?;
        let list: CollectionsList = read_result(response, None).await?;
        Ok(list.collections.into_iter().map(|c| c.name).collect())
    }

    pub async fn create_collection(&self, name: &str, dim: usize) -> Result<(), StoreError> {
        let body = CreateCollection {
            vectors: VectorParams {
                size: dim,
                distance: "Cosine",
            },
        };
        let response = self
            .request(Method::PUT, &format!("/collections/{name}"))
            .json(&body)
            .send()
            .await?;
        read_result::<Value>(response, None).await?;
        Ok(())
    }

    pub async fn upsert(&self, name: &str, batch: &[Record]) -> Result<(), StoreError> {
        let body = UpsertPoints {
            points: batch
                .iter()
                .map(|r| PointStruct {
                    id: &r.id,
                    vector: &r.vector,
                    payload: &r.payload,
                })
                .collect(),
        };
        debug!(collection = name, points = batch.len(), "Upserting batch");
        let response = self
            .request(Method::PUT, &format!("/collections/{name}/points"))
            .query(&[("wait", "true")])
            .json(&body)
            .send()
            .await?;
        read_result::<Value>(response, Some(name)).await?;
        Ok(())
    }

    /// Nearest `k` points to `query`, optionally restricted by an exact-match filter.
    ///
    /// Qdrant's `match` condition only takes keywords, integers and booleans,
    /// so any other filter value fails with [`StoreError::UnsupportedFilter`]
    /// before a request is sent.
    pub async fn search(
        &self,
        name: &str,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalResult>, StoreError> {
        if let Some(key) = filter.and_then(unsupported_filter_key) {
            return Err(StoreError::UnsupportedFilter { key });
        }
        let body = SearchRequest {
            vector: query,
            limit: k,
            with_payload: true,
            filter: filter.map(|f| Filter {
                must: f
                    .iter()
                    .map(|(key, value)| FieldCondition {
                        key,
                        match_value: MatchValue { value },
                    })
                    .collect(),
            }),
        };
        let response = self
            .request(Method::POST, &format!("/collections/{name}/points/search"))
            .json(&body)
            .send()
            .await?;
        let hits: Vec<ScoredPoint> = read_result(response, Some(name)).await?;

        Ok(hits
            .into_iter()
            .map(|hit| RetrievalResult::from_payload(hit.payload.unwrap_or_default(), hit.score))
            .collect())
    }

    pub async fn delete_collection(&self, name: &str) -> Result<(), StoreError> {
        let response = self
            .request(Method::DELETE, &format!("/collections/{name}"))
            .send()
            .await?;
        read_result::<Value>(response, Some(name)).await?;
        Ok(())
    }

    pub async fn collection_info(&self, name: &str) -> Result<CollectionInfo, StoreError> {
        let response = self
            .request(Method::GET, &format!("/collections/{name}"))
            .send()
            .await?;
        let info: CollectionInfoResult = read_result(response, Some(name)).await?;
        Ok(CollectionInfo {
            name: name.to_string(),
            vectors_count: info.vectors_count.unwrap_or_default(),
            points_count: info.points_count.unwrap_or_default(),
            status: info.status,
        })
    }
}

/// Check the status and unwrap Qdrant's `{"result": ...}` envelope.
///
/// A 404 on a collection-scoped request becomes [`StoreError::CollectionNotFound`].
async fn read_result<T: DeserializeOwned>(
    response: Response,
    collection: Option<&str>,
) -> Result<T, StoreError> {
    let status = response.status();
    if let (StatusCode::NOT_FOUND, Some(name)) = (status, collection) {
        return Err(StoreError::CollectionNotFound(name.to_string()));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StoreError::Backend {
            status: status.as_u16(),
            body,
        });
    }

    let envelope: Envelope<T> = response
        .json()
        .await
        .map_err(|e| StoreError::Decode(e.to_string()))?;
    Ok(envelope.result)
}
