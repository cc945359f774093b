#![allow(dead_code)]
//! Shared fixtures: an in-memory Post store with failure injection.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use tweet_analysis_service::models::{identifier_to_string, parse_timestamp};
use tweet_analysis_service::query::PostQuery;
use tweet_analysis_service::services::{
    BulkIndexReport, PostStore, RawHit, SearchHits, StoreError,
};

#[derive(Default)]
pub struct InMemoryPostStore {
    docs: Mutex<BTreeMap<String, Value>>,
    mapping: Mutex<Option<Value>>,
    unavailable: AtomicBool,
    failing_updates: Mutex<HashSet<String>>,
    update_calls: AtomicUsize,
    generated_ids: AtomicUsize,
}

impl InMemoryPostStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_documents(documents: Vec<Value>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut docs = store.docs.lock().unwrap();
            for doc in documents {
                let key = doc
                    .get("id")
                    .and_then(identifier_to_string)
                    .expect("fixture documents carry an id");
                docs.insert(key, doc);
            }
        }
        Arc::new(store)
    }

    /// Every call fails as if the cluster were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Updates to this document are rejected.
    pub fn fail_updates_for(&self, document_id: &str) {
        self.failing_updates
            .lock()
            .unwrap()
            .insert(document_id.to_string());
    }

    pub fn document(&self, document_id: &str) -> Option<Value> {
        self.docs.lock().unwrap().get(document_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub fn created_mapping(&self) -> Option<Value> {
        self.mapping.lock().unwrap().clone()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Status {
                status: 503,
                body: "cluster unavailable".to_string(),
            });
        }
        Ok(())
    }
}

fn created_at(doc: &Value) -> Option<DateTime<Utc>> {
    doc.pointer("/meta/created_at").and_then(parse_timestamp)
}

fn set_dotted(doc: &mut Value, field: &str, value: Value) {
    let mut segments: Vec<&str> = field.split('.').collect();
    let Some(last) = segments.pop() else {
        return;
    };
    let mut current = doc;
    for segment in segments {
        if !current.get(segment).map_or(false, Value::is_object) {
            current[segment] = json!({});
        }
        current = &mut current[segment];
    }
    current[last] = value;
}

#[async_trait]
impl PostStore for InMemoryPostStore {
    async fn search(&self, query: &PostQuery) -> Result<SearchHits, StoreError> {
        self.check_available()?;
        let docs = self.docs.lock().unwrap();

        let mut matched: Vec<(Option<DateTime<Utc>>, &String, &Value)> = docs
            .iter()
            .map(|(key, doc)| (created_at(doc), key, doc))
            .filter(|(ts, _, _)| {
                query.range.is_unbounded() || ts.map_or(false, |ts| query.range.contains(ts))
            })
            .collect();
        matched.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));

        let total = matched.len() as u64;
        let hits = matched
            .into_iter()
            .take(query.limit.get() as usize)
            .map(|(_, key, doc)| RawHit {
                document_id: key.clone(),
                source: doc.clone(),
            })
            .collect();

        Ok(SearchHits { total, hits })
    }

    async fn update_field(
        &self,
        document_id: &str,
        field: &str,
        value: Value,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        self.update_calls.fetch_add(1, Ordering::SeqCst);

        if self.failing_updates.lock().unwrap().contains(document_id) {
            return Err(StoreError::Status {
                status: 400,
                body: "update rejected".to_string(),
            });
        }

        let mut docs = self.docs.lock().unwrap();
        let doc = docs.get_mut(document_id).ok_or_else(|| StoreError::Status {
            status: 404,
            body: format!("document {document_id} missing"),
        })?;
        set_dotted(doc, field, value);
        Ok(())
    }

    async fn index_exists(&self) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.mapping.lock().unwrap().is_some())
    }

    async fn create_index(&self, mapping: &Value) -> Result<(), StoreError> {
        self.check_available()?;
        *self.mapping.lock().unwrap() = Some(mapping.clone());
        Ok(())
    }

    async fn bulk_index(&self, documents: &[Value]) -> Result<BulkIndexReport, StoreError> {
        self.check_available()?;
        let mut docs = self.docs.lock().unwrap();
        let mut report = BulkIndexReport::default();

        for doc in documents {
            // A date field that cannot be parsed is rejected by the mapping.
            let bad_date = doc
                .pointer("/meta/created_at")
                .map_or(false, |raw| parse_timestamp(raw).is_none());
            if bad_date {
                report.failed += 1;
                continue;
            }

            let key = doc.get("id").and_then(identifier_to_string).unwrap_or_else(|| {
                format!("auto-{}", self.generated_ids.fetch_add(1, Ordering::SeqCst))
            });
            docs.insert(key, doc.clone());
            report.indexed += 1;
        }
        Ok(report)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

pub fn post_doc(id: &str, created_at: &str, content: &str) -> Value {
    json!({
        "id": id,
        "user": { "username": format!("user_{id}"), "handle": format!("@{id}"), "verified": false },
        "meta": { "created_at": created_at, "hashtags": ["test"] },
        "payload": { "tweet": { "content": content } },
        "metrics": { "likes": 10, "retweets": 5, "replies": 1, "emotion": null, "stance": null }
    })
}

/// Three Posts on 2024-01-01 and one on 2024-01-02.
pub fn new_year_documents() -> Vec<Value> {
    vec![
        post_doc("jan1-morning", "2024-01-01T08:00:00", "Happy new year everyone!"),
        post_doc("jan1-noon", "2024-01-01T12:00:00", "Lunch was terrible today."),
        post_doc("jan1-late", "2024-01-01T23:59:59", "Scared of what this year brings."),
        post_doc("jan2", "2024-01-02T00:00:00", "Back to work."),
    ]
}

pub fn new_year_store() -> Arc<InMemoryPostStore> {
    InMemoryPostStore::with_documents(new_year_documents())
}
