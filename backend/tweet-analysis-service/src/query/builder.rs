use serde_json::{json, Value};

use super::{DateRange, ValidationError};

/// Creation timestamp of a Post inside the stored document.
pub const CREATED_AT_FIELD: &str = "meta.created_at";
/// Stable tiebreaker so equal timestamps page deterministically.
pub const ID_FIELD: &str = "id";

/// Default and hard cap for the number of Posts a single request may touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitPolicy {
    pub default: u32,
    pub max: u32,
}

impl Default for LimitPolicy {
    fn default() -> Self {
        Self {
            default: 100,
            max: 1000,
        }
    }
}

impl LimitPolicy {
    pub fn new(default: u32, max: u32) -> Self {
        Self { default, max }
    }

    /// Omitted means the default. Out-of-range values are rejected rather than clamped.
    pub fn resolve(&self, requested: Option<i64>) -> Result<ResultLimit, ValidationError> {
        match requested {
            None => Ok(ResultLimit(self.default)),
            Some(value) if value >= 1 && value <= i64::from(self.max) => {
                Ok(ResultLimit(value as u32))
            }
            Some(value) => Err(ValidationError::InvalidLimit {
                value,
                max: self.max,
            }),
        }
    }
}

/// A limit already checked against a [`LimitPolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ResultLimit(u32);

impl ResultLimit {
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Date-filtered, newest-first query for Posts.
#[derive(Debug, Clone, PartialEq)]
pub struct PostQuery {
    pub range: DateRange,
    pub limit: ResultLimit,
}

impl PostQuery {
    pub fn new(range: DateRange, limit: ResultLimit) -> Self {
        Self { range, limit }
    }

    /// Search request body for the index.
    pub fn to_search_body(&self) -> Value {
        let query = if self.range.is_unbounded() {
            json!({ "match_all": {} })
        } else {
            let mut bounds = serde_json::Map::new();
            if let Some(start) = self.range.start_rfc3339() {
                bounds.insert("gte".into(), Value::String(start));
            }
            if let Some(end) = self.range.end_rfc3339() {
                bounds.insert("lte".into(), Value::String(end));
            }
            bounds.insert(
                "format".into(),
                Value::String("strict_date_optional_time||epoch_millis".into()),
            );

            json!({
                "bool": {
                    "filter": [
                        { "range": { CREATED_AT_FIELD: Value::Object(bounds) } }
                    ]
                }
            })
        };

        json!({
            "size": self.limit.get(),
            "track_total_hits": true,
            "query": query,
            "sort": [
                { CREATED_AT_FIELD: { "order": "desc" } },
                { ID_FIELD: { "order": "asc", "unmapped_type": "keyword" } }
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_defaults_when_omitted() {
        let policy = LimitPolicy::new(20, 100);
        assert_eq!(policy.resolve(None).unwrap().get(), 20);
    }

    #[test]
    fn test_limit_within_cap_is_kept() {
        let policy = LimitPolicy::new(20, 100);
        assert_eq!(policy.resolve(Some(1)).unwrap().get(), 1);
        assert_eq!(policy.resolve(Some(100)).unwrap().get(), 100);
    }

    #[test]
    fn test_limit_out_of_range_is_rejected() {
        let policy = LimitPolicy::new(20, 100);
        for bad in [0, -1, 101, i64::MAX] {
            assert_eq!(
                policy.resolve(Some(bad)),
                Err(ValidationError::InvalidLimit { value: bad, max: 100 })
            );
        }
    }

    #[test]
    fn test_unbounded_range_matches_all() {
        let query = PostQuery::new(DateRange::unbounded(), LimitPolicy::default().resolve(Some(5)).unwrap());
        let body = query.to_search_body();

        assert_eq!(body["size"], 5);
        assert_eq!(body["query"], json!({ "match_all": {} }));
        assert_eq!(body["sort"][0][CREATED_AT_FIELD]["order"], "desc");
    }

    #[test]
    fn test_bounded_range_filters_created_at() {
        let range = DateRange::from_days(Some("2024-01-01"), Some("2024-01-01")).unwrap();
        let query = PostQuery::new(range, LimitPolicy::default().resolve(Some(10)).unwrap());
        let body = query.to_search_body();

        let bounds = &body["query"]["bool"]["filter"][0]["range"][CREATED_AT_FIELD];
        assert_eq!(bounds["gte"], "2024-01-01T00:00:00.000Z");
        assert_eq!(bounds["lte"], "2024-01-01T23:59:59.999Z");
        assert_eq!(body["track_total_hits"], true);
    }

    #[test]
    fn test_half_open_range_only_sets_present_bound() {
        let range = DateRange::from_days(None, Some("2024-01-31")).unwrap();
        let query = PostQuery::new(range, LimitPolicy::default().resolve(None).unwrap());
        let body = query.to_search_body();

        let bounds = &body["query"]["bool"]["filter"][0]["range"][CREATED_AT_FIELD];
        assert!(bounds.get("gte").is_none());
        assert_eq!(bounds["lte"], "2024-01-31T23:59:59.999Z");
    }

    #[test]
    fn test_sort_has_deterministic_tiebreaker() {
        let query = PostQuery::new(DateRange::unbounded(), LimitPolicy::default().resolve(None).unwrap());
        let sort = query.to_search_body()["sort"].clone();
        assert_eq!(sort[1][ID_FIELD]["order"], "asc");
    }
}
