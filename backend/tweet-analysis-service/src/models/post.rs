use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use utoipa::ToSchema;

/// Where the classifier's label lives inside a stored Post document.
pub const EMOTION_FIELD: &str = "metrics.emotion";

/// A stored social-media post. Only `metrics.emotion` is ever written back.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Post {
    pub id: String,
    pub user: Author,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub hashtags: Vec<String>,
    pub metrics: PostMetrics,
    /// Key of the document in the store. Usually equal to `id`.
    #[serde(skip)]
    pub document_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Author {
    pub username: String,
    pub handle: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct PostMetrics {
    pub likes: i64,
    pub retweets: i64,
    pub replies: i64,
    pub emotion: Option<String>,
    /// Reserved; never written by this service.
    pub stance: Option<String>,
}

/// Fixed label set of the emotion model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Anger,
    Disgust,
    Fear,
    Joy,
    Neutral,
    Sadness,
    Surprise,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Anger,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Joy,
        Emotion::Neutral,
        Emotion::Sadness,
        Emotion::Surprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Anger => "anger",
            Emotion::Disgust => "disgust",
            Emotion::Fear => "fear",
            Emotion::Joy => "joy",
            Emotion::Neutral => "neutral",
            Emotion::Sadness => "sadness",
            Emotion::Surprise => "surprise",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown emotion label '{0}'")]
pub struct UnknownEmotion(pub String);

impl FromStr for Emotion {
    type Err = UnknownEmotion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Emotion::ALL
            .into_iter()
            .find(|e| e.as_str() == normalized)
            .ok_or_else(|| UnknownEmotion(s.to_string()))
    }
}

/// Why a raw document could not become a [`Post`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("document {document_id} is missing required field '{field}'")]
    MissingField {
        document_id: String,
        field: &'static str,
    },
    #[error("document {document_id} has an unreadable timestamp: {value}")]
    InvalidTimestamp { document_id: String, value: String },
    #[error("document {document_id} does not match the post shape: {reason}")]
    Shape { document_id: String, reason: String },
}

// ============================================
// Raw document shape
// ============================================
//
// Ingestion stores documents without validation, so every subfield is
// optional here and defaults are filled in `Post::from_source`.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPost {
    id: Option<Value>,
    user: Option<RawUser>,
    meta: Option<RawMeta>,
    payload: Option<RawPayload>,
    metrics: Option<RawMetrics>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawUser {
    username: Option<String>,
    handle: Option<String>,
    verified: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMeta {
    created_at: Option<Value>,
    #[serde(deserialize_with = "one_or_many")]
    hashtags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPayload {
    tweet: Option<RawTweet>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTweet {
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetrics {
    likes: Option<i64>,
    retweets: Option<i64>,
    replies: Option<i64>,
    emotion: Option<String>,
    stance: Option<String>,
}

/// Keyword fields may hold a single value or an array.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        Some(OneOrMany::One(tag)) => vec![tag],
        Some(OneOrMany::Many(tags)) => tags,
        None => Vec::new(),
    })
}

impl Post {
    /// Map a raw stored document into a Post, filling defaults for optional fields.
    pub fn from_source(document_id: &str, source: &Value) -> Result<Self, MappingError> {
        let raw: RawPost =
            RawPost::deserialize(source).map_err(|e| MappingError::Shape {
                document_id: document_id.to_string(),
                reason: e.to_string(),
            })?;

        let id = raw
            .id
            .as_ref()
            .and_then(identifier_to_string)
            .unwrap_or_else(|| document_id.to_string());

        let meta = raw.meta.unwrap_or_default();
        let created_at_raw = meta.created_at.ok_or_else(|| MappingError::MissingField {
            document_id: document_id.to_string(),
            field: "meta.created_at",
        })?;
        let created_at =
            parse_timestamp(&created_at_raw).ok_or_else(|| MappingError::InvalidTimestamp {
                document_id: document_id.to_string(),
                value: created_at_raw.to_string(),
            })?;

        let content = raw
            .payload
            .and_then(|p| p.tweet)
            .and_then(|t| t.content)
            .ok_or_else(|| MappingError::MissingField {
                document_id: document_id.to_string(),
                field: "payload.tweet.content",
            })?;

        let user = raw.user.unwrap_or_default();
        let metrics = raw.metrics.unwrap_or_default();

        Ok(Post {
            id,
            user: Author {
                username: user.username.unwrap_or_else(|| "unknown".to_string()),
                handle: user.handle,
                verified: user.verified.unwrap_or(false),
            },
            content,
            created_at,
            hashtags: meta.hashtags,
            metrics: PostMetrics {
                likes: metrics.likes.unwrap_or(0),
                retweets: metrics.retweets.unwrap_or(0),
                replies: metrics.replies.unwrap_or(0),
                emotion: metrics.emotion,
                stance: metrics.stance,
            },
            document_id: document_id.to_string(),
        })
    }
}

/// Store key for a document `id` value: non-empty strings and numbers.
pub fn identifier_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a stored creation timestamp.
///
/// Accepts RFC 3339, zone-less ISO 8601 (taken as UTC, which is how the index
/// interprets it), a bare calendar day, or epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_timestamp_str(s.trim()),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn parse_timestamp_str(s: &str) -> Option<DateTime<Utc>> {
    if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
        // epoch_millis, accepted by the default date mapping
        return s.parse().ok().and_then(DateTime::from_timestamp_millis);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn full_document() -> Value {
        json!({
            "id": "tweet1",
            "user": { "username": "user1", "handle": "@user1", "verified": true },
            "meta": { "created_at": "2024-03-14T12:00:00", "hashtags": ["python", "fastapi"] },
            "payload": { "tweet": { "content": "Este es un tweet de prueba 1." } },
            "metrics": { "likes": 10, "retweets": 5, "replies": 2, "emotion": "joy", "stance": "neutral" }
        })
    }

    #[test]
    fn test_full_document_maps_every_field() {
        let post = Post::from_source("tweet1", &full_document()).unwrap();

        assert_eq!(post.id, "tweet1");
        assert_eq!(post.user.username, "user1");
        assert_eq!(post.user.handle.as_deref(), Some("@user1"));
        assert!(post.user.verified);
        assert_eq!(post.content, "Este es un tweet de prueba 1.");
        assert_eq!(post.created_at, Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap());
        assert_eq!(post.hashtags, vec!["python", "fastapi"]);
        assert_eq!(post.metrics.likes, 10);
        assert_eq!(post.metrics.emotion.as_deref(), Some("joy"));
        assert_eq!(post.metrics.stance.as_deref(), Some("neutral"));
    }

    #[test]
    fn test_missing_optional_fields_get_defaults() {
        let doc = json!({
            "meta": { "created_at": "2024-03-14T12:00:00Z" },
            "payload": { "tweet": { "content": "hello" } },
            "user": { "username": "someone" },
            "metrics": { "likes": 3, "emotion": null }
        });

        let post = Post::from_source("es-generated-id", &doc).unwrap();

        assert_eq!(post.id, "es-generated-id");
        assert_eq!(post.document_id, "es-generated-id");
        assert!(!post.user.verified);
        assert!(post.user.handle.is_none());
        assert_eq!(post.metrics.retweets, 0);
        assert_eq!(post.metrics.replies, 0);
        assert!(post.metrics.emotion.is_none());
        assert!(post.metrics.stance.is_none());
        assert!(post.hashtags.is_empty());
    }

    #[test]
    fn test_absent_user_object_defaults_to_unknown() {
        let doc = json!({
            "id": 42,
            "user": null,
            "meta": { "created_at": 1710417600000i64, "hashtags": "solo" },
            "payload": { "tweet": { "content": "hi" } }
        });

        let post = Post::from_source("42", &doc).unwrap();
        assert_eq!(post.id, "42");
        assert_eq!(post.user.username, "unknown");
        assert_eq!(post.hashtags, vec!["solo"]);
        assert_eq!(post.created_at, Utc.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_missing_content_is_a_mapping_error() {
        let doc = json!({ "id": "x", "meta": { "created_at": "2024-03-14T12:00:00" } });
        let err = Post::from_source("x", &doc).unwrap_err();
        assert!(matches!(
            err,
            MappingError::MissingField { field: "payload.tweet.content", .. }
        ));
    }

    #[test]
    fn test_unreadable_timestamp_is_a_mapping_error() {
        let doc = json!({
            "meta": { "created_at": "yesterday" },
            "payload": { "tweet": { "content": "hi" } }
        });
        let err = Post::from_source("x", &doc).unwrap_err();
        assert!(matches!(err, MappingError::InvalidTimestamp { .. }));
    }

    #[test]
    fn test_serialized_post_hides_document_id() {
        let post = Post::from_source("tweet1", &full_document()).unwrap();
        let value = serde_json::to_value(&post).unwrap();
        assert!(value.get("document_id").is_none());
        assert!(value["created_at"].as_str().unwrap().starts_with("2024-03-14"));
        assert_eq!(value["metrics"]["emotion"], "joy");
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 0).unwrap();
        for raw in [
            json!("2024-01-01T08:30:00Z"),
            json!("2024-01-01T09:30:00+01:00"),
            json!("2024-01-01T08:30:00"),
            json!("2024-01-01T08:30:00.000"),
            json!("2024-01-01 08:30:00"),
            json!("2024-01-01T08:30"),
            json!("2024-01-01 08:30"),
            json!("1704097800000"),
            json!(1704097800000i64),
        ] {
            assert_eq!(parse_timestamp(&raw), Some(expected), "{raw}");
        }
        assert_eq!(
            parse_timestamp(&json!("2024-01-01")),
            Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp(&json!(true)), None);
        assert_eq!(parse_timestamp(&json!("2024-01-01T08")), None);
    }

    #[test]
    fn test_emotion_labels_parse_case_insensitively() {
        assert_eq!("Joy".parse::<Emotion>().unwrap(), Emotion::Joy);
        assert_eq!(" SADNESS ".parse::<Emotion>().unwrap(), Emotion::Sadness);
        assert!("happiness".parse::<Emotion>().is_err());
        assert_eq!(Emotion::Surprise.to_string(), "surprise");
    }
}
