use std::sync::Arc;

use tracing::{debug, warn};

use super::store::{PostStore, StoreError};
use crate::models::Post;
use crate::query::PostQuery;

/// One Post that could not be read, classified or written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostFailure {
    pub post_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedPosts {
    /// Newest first, at most `limit`.
    pub posts: Vec<Post>,
    /// Hits in range that could not be mapped into a [`Post`].
    pub unreadable: Vec<PostFailure>,
    /// Matches in range reported by the store.
    pub total_matches: u64,
}

/// Executes Post queries and maps raw documents into [`Post`]s.
#[derive(Clone)]
pub struct RetrievalService {
    store: Arc<dyn PostStore>,
}

impl RetrievalService {
    pub fn new(store: Arc<dyn PostStore>) -> Self {
        Self { store }
    }

    pub async fn fetch(&self, query: &PostQuery) -> Result<RetrievedPosts, StoreError> {
        let limit = query.limit.get() as usize;
        let result = self.store.search(query).await?;
        let returned = result.hits.len();

        let mut posts = Vec::with_capacity(returned);
        let mut unreadable = Vec::new();
        for hit in result.hits.iter().take(limit) {
            match Post::from_source(&hit.document_id, &hit.source) {
                Ok(post) => posts.push(post),
                Err(e) => {
                    warn!(document_id = %hit.document_id, error = %e, "unreadable document");
                    unreadable.push(PostFailure {
                        post_id: hit.document_id.clone(),
                        reason: format!("unreadable document: {e}"),
                    });
                }
            }
        }

        // Newest first with id tiebreak, whatever order the backend returned.
        posts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        debug!(
            returned,
            mapped = posts.len(),
            unreadable = unreadable.len(),
            total = result.total,
            "retrieved posts"
        );

        Ok(RetrievedPosts {
            posts,
            unreadable,
            total_matches: result.total,
        })
    }
}
