use std::time::Duration;

use async_trait::async_trait;
use elasticsearch::{
    auth::Credentials,
    cert::CertificateValidation,
    http::{
        request::JsonBody,
        response::Response,
        transport::{SingleNodeConnectionPool, TransportBuilder},
    },
    indices::{IndicesCreateParts, IndicesExistsParts},
    BulkParts, Elasticsearch, SearchParts, UpdateParts,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};
use url::Url;

use super::store::{nest_field, BulkIndexReport, PostStore, RawHit, SearchHits, StoreError};
use crate::config::Config;
use crate::models::identifier_to_string;
use crate::query::PostQuery;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Post store backed by a single Elasticsearch index.
#[derive(Clone)]
pub struct ElasticsearchStore {
    client: Elasticsearch,
    index: String,
}

impl ElasticsearchStore {
    /// Build the long-lived client. No request is sent until first use.
    pub fn connect(config: &Config) -> Result<Self, StoreError> {
        let parsed = Url::parse(&config.es_host)?;
        let pool = SingleNodeConnectionPool::new(parsed);
        let mut builder = TransportBuilder::new(pool).timeout(REQUEST_TIMEOUT);

        if let Some((user, password)) = config.es_credentials() {
            builder = builder.auth(Credentials::Basic(user.to_string(), password.to_string()));
        }
        if !config.es_verify_certs {
            warn!(es_host = %config.es_host, "TLS certificate validation disabled for search index");
            builder = builder.cert_validation(CertificateValidation::None);
        }

        let transport = builder.build()?;
        Ok(Self {
            client: Elasticsearch::new(transport),
            index: config.es_index.clone(),
        })
    }

    pub fn index(&self) -> &str {
        &self.index
    }
}

/// Turn a non-success response into `StoreError::Status`.
async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status_code();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl PostStore for ElasticsearchStore {
    async fn search(&self, query: &PostQuery) -> Result<SearchHits, StoreError> {
        let body = query.to_search_body();
        debug!(index = %self.index, query = %body, "searching posts");

        let response = self
            .client
            .search(SearchParts::Index(&[self.index.as_str()]))
            .body(body)
            .send()
            .await?;
        let response = check_status(response).await?;

        let search_response: SearchResponse = response.json().await?;
        let hits = search_response
            .hits
            .hits
            .into_iter()
            .filter_map(|hit| {
                hit.source.map(|source| RawHit {
                    document_id: hit.id,
                    source,
                })
            })
            .collect();

        Ok(SearchHits {
            total: search_response.hits.total.map(|t| t.value).unwrap_or(0),
            hits,
        })
    }

    async fn update_field(
        &self,
        document_id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .update(UpdateParts::IndexId(&self.index, document_id))
            .body(json!({ "doc": nest_field(field, value) }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn index_exists(&self) -> Result<bool, StoreError> {
        let response = self
            .client
            .indices()
            .exists(IndicesExistsParts::Index(&[self.index.as_str()]))
            .send()
            .await?;

        match response.status_code().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            _ => check_status(response).await.map(|_| true),
        }
    }

    async fn create_index(&self, mapping: &Value) -> Result<(), StoreError> {
        let response = self
            .client
            .indices()
            .create(IndicesCreateParts::Index(&self.index))
            .body(mapping.clone())
            .send()
            .await?;

        match check_status(response).await {
            Ok(_) => Ok(()),
            // Another replica created it first.
            Err(StoreError::Status { status: 400, body })
                if body.contains("resource_already_exists_exception") =>
            {
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn bulk_index(&self, documents: &[Value]) -> Result<BulkIndexReport, StoreError> {
        if documents.is_empty() {
            return Ok(BulkIndexReport::default());
        }

        let mut body: Vec<JsonBody<Value>> = Vec::with_capacity(documents.len() * 2);
        for doc in documents {
            let action = match doc.get("id").and_then(identifier_to_string) {
                Some(id) => json!({ "index": { "_id": id } }),
                None => json!({ "index": {} }),
            };
            body.push(action.into());
            body.push(doc.clone().into());
        }

        let response = self
            .client
            .bulk(BulkParts::Index(&self.index))
            .body(body)
            .send()
            .await?;
        let response = check_status(response).await?;
        let bulk: BulkResponse = response.json().await?;

        Ok(bulk.report())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let response = self.client.ping().send().await?;
        check_status(response).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: InnerHits,
}

#[derive(Debug, Deserialize)]
struct InnerHits {
    total: Option<TotalHits>,
    hits: Vec<PostHit>,
}

#[derive(Debug, Deserialize)]
struct TotalHits {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct PostHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<Value>,
}

impl BulkResponse {
    fn report(&self) -> BulkIndexReport {
        let mut report = BulkIndexReport::default();
        for item in &self.items {
            let Some(result) = item.get("index") else {
                report.failed += 1;
                continue;
            };
            match result.get("error") {
                Some(error) => {
                    report.failed += 1;
                    warn!(
                        document_id = result.get("_id").and_then(|v| v.as_str()).unwrap_or("-"),
                        error = %error,
                        "document rejected by bulk index"
                    );
                }
                None => report.indexed += 1,
            }
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_response_parses_total_and_ids() {
        let raw = json!({
            "took": 3,
            "hits": {
                "total": { "value": 42, "relation": "eq" },
                "hits": [
                    { "_id": "tweet1", "_source": { "id": "tweet1" } },
                    { "_id": "tweet2" }
                ]
            }
        });
        let parsed: SearchResponse = serde_json::from_value(raw).unwrap();
        assert_eq!(parsed.hits.total.unwrap().value, 42);
        assert_eq!(parsed.hits.hits[0].id, "tweet1");
        assert!(parsed.hits.hits[1].source.is_none());
    }

    #[test]
    fn test_bulk_items_tally_rejections() {
        let raw = json!({
            "errors": true,
            "items": [
                { "index": { "_id": "tweet1", "status": 201 } },
                { "index": { "_id": "tweet2", "status": 400, "error": { "type": "mapper_parsing_exception" } } },
                { "index": { "status": 400, "error": { "type": "mapper_parsing_exception" } } },
                { "delete": { "_id": "tweet3" } }
            ]
        });
        let parsed: BulkResponse = serde_json::from_value(raw).unwrap();
        let report = parsed.report();
        assert_eq!(report.indexed, 1);
        assert_eq!(report.failed, 3);
    }

    #[test]
    fn test_connect_rejects_bad_url() {
        let mut config = Config::from_vars(Vec::new()).unwrap();
        config.es_host = "not a url".to_string();
        assert!(matches!(
            ElasticsearchStore::connect(&config),
            Err(StoreError::InvalidUrl(_))
        ));
    }
}
