//! Typed comment/submission records, the fixed per-kind field allow-lists, and the
//! sentinels that stand in for absent values.
//!
//! Records are validated at the parse boundary: every field is optional, extra
//! fields are ignored, and numeric fields accept numbers or numeric strings (older
//! dump months store `created_utc` as a string). A value of any other type is a
//! malformed record.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author value used by Reddit for removed accounts.
pub const DELETED_AUTHOR: &str = "[deleted]";
/// Text sentinel for absent identifiers/names in SQLite rows.
pub const UNKNOWN: &str = "unknown";
/// Cell text for an absent value in TSV projections.
pub const TSV_NULL: &str = "NULL";
pub const MISSING_INT: i64 = -1;
pub const MISSING_FLOAT: f64 = -1.0;

pub const COMMENT_FIELDS: [&str; 15] = [
    "author", "subreddit", "link_id", "parent_id", "score", "ups", "downs",
    "created_utc", "body", "id", "author_flair_text", "controversiality",
    "subreddit_id", "retrieved_on", "edited",
];

pub const SUBMISSION_FIELDS: [&str; 21] = [
    "id", "subreddit", "subreddit_id", "title", "selftext", "url", "permalink",
    "created_utc", "score", "num_comments", "ups", "downs", "author",
    "author_flair_text", "is_self", "domain", "over_18", "media", "edited",
    "stickied", "distinguished",
];

/// Record kind (comment dump vs. submission dump).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Comment,
    Submission,
}

impl RecordKind {
    /// Ordered allow-list of projected fields.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::Comment => &COMMENT_FIELDS,
            RecordKind::Submission => &SUBMISSION_FIELDS,
        }
    }

    /// SQLite table holding this kind.
    pub fn table(self) -> &'static str {
        match self {
            RecordKind::Comment => "comments",
            RecordKind::Submission => "posts",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RecordKind::Comment => "comments",
            RecordKind::Submission => "submissions",
        }
    }
}

/// The `edited` field is `false` for unedited records and an epoch timestamp
/// (integer or float, depending on the dump month) otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Edited {
    Flag(bool),
    Int(i64),
    Float(f64),
}

impl Edited {
    /// Integer column value: booleans count as 0/1, integers pass through,
    /// anything else collapses to the missing sentinel.
    pub fn as_sql_int(&self) -> i64 {
        match self {
            Edited::Flag(b) => i64::from(*b),
            Edited::Int(n) => *n,
            Edited::Float(_) => MISSING_INT,
        }
    }

    fn cell(&self) -> String {
        match self {
            Edited::Flag(b) => bool_cell(*b),
            Edited::Int(n) => n.to_string(),
            Edited::Float(f) => float_cell(*f),
        }
    }
}

/// Common surface of both record kinds.
pub trait Record: DeserializeOwned + Serialize {
    const KIND: RecordKind;

    /// One cell per allow-listed field, in allow-list order; `None` when absent.
    fn cells(&self) -> Vec<Option<String>>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub link_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub score: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub ups: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub downs: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub created_utc: Option<i64>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author_flair_text: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub controversiality: Option<i64>,
    #[serde(default)]
    pub subreddit_id: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub retrieved_on: Option<f64>,
    #[serde(default)]
    pub edited: Option<Edited>,
}

impl Record for Comment {
    const KIND: RecordKind = RecordKind::Comment;

    fn cells(&self) -> Vec<Option<String>> {
        vec![
            self.author.clone(),
            self.subreddit.clone(),
            self.link_id.clone(),
            self.parent_id.clone(),
            self.score.map(|v| v.to_string()),
            self.ups.map(float_cell),
            self.downs.map(float_cell),
            self.created_utc.map(|v| v.to_string()),
            self.body.clone(),
            self.id.clone(),
            self.author_flair_text.clone(),
            self.controversiality.map(|v| v.to_string()),
            self.subreddit_id.clone(),
            self.retrieved_on.map(float_cell),
            self.edited.as_ref().map(Edited::cell),
        ]
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
    #[serde(default)]
    pub subreddit_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub selftext: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub permalink: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub created_utc: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub score: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_i64")]
    pub num_comments: Option<i64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub ups: Option<f64>,
    #[serde(default, deserialize_with = "lenient::opt_f64")]
    pub downs: Option<f64>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub author_flair_text: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub is_self: Option<bool>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub over_18: Option<bool>,
    #[serde(default)]
    pub media: Option<Value>,
    #[serde(default)]
    pub edited: Option<Edited>,
    #[serde(default, deserialize_with = "lenient::opt_bool")]
    pub stickied: Option<bool>,
    #[serde(default)]
    pub distinguished: Option<String>,
}

impl Submission {
    /// `media` as compact JSON text.
    pub fn media_text(&self) -> Option<String> {
        self.media.as_ref().map(Value::to_string)
    }
}

impl Record for Submission {
    const KIND: RecordKind = RecordKind::Submission;

    fn cells(&self) -> Vec<Option<String>> {
        vec![
            self.id.clone(),
            self.subreddit.clone(),
            self.subreddit_id.clone(),
            self.title.clone(),
            self.selftext.clone(),
            self.url.clone(),
            self.permalink.clone(),
            self.created_utc.map(|v| v.to_string()),
            self.score.map(|v| v.to_string()),
            self.num_comments.map(|v| v.to_string()),
            self.ups.map(float_cell),
            self.downs.map(float_cell),
            self.author.clone(),
            self.author_flair_text.clone(),
            self.is_self.map(bool_cell),
            self.domain.clone(),
            self.over_18.map(bool_cell),
            self.media_text(),
            self.edited.as_ref().map(Edited::cell),
            self.stickied.map(bool_cell),
            self.distinguished.clone(),
        ]
    }
}

/// Parse one JSONL line into a typed record.
#[inline]
pub fn parse_record<R: Record>(line: &str) -> serde_json::Result<R> {
    serde_json::from_str(line)
}

/// Bool → 0/1 column value, absent → -1.
#[inline]
pub fn bool_to_sql(v: Option<bool>) -> i64 {
    v.map(i64::from).unwrap_or(MISSING_INT)
}

fn bool_cell(b: bool) -> String {
    if b { "True".to_string() } else { "False".to_string() }
}

// Debug keeps the trailing ".0" on integral floats.
fn float_cell(f: f64) -> String {
    format!("{f:?}")
}

mod lenient {
    use super::*;

    fn number_to_i64(v: &Value) -> Option<i64> {
        match v {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite() && f.fract() == 0.0).map(|f| f as i64))
            }
            _ => None,
        }
    }

    fn number_to_f64(v: &Value) -> Option<f64> {
        match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn to_bool(v: &Value) -> Option<bool> {
        match v {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(0) => Some(false),
                Some(1) => Some(true),
                _ => None,
            },
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    fn convert<'de, D, T>(d: D, conv: fn(&Value) -> Option<T>, what: &str) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(d)? {
            None | Some(Value::Null) => Ok(None),
            Some(v) => conv(&v)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("expected {what}, found {v}"))),
        }
    }

    pub fn opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
        convert(d, number_to_i64, "integer")
    }

    pub fn opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        convert(d, number_to_f64, "number")
    }

    pub fn opt_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
        convert(d, to_bool, "boolean")
    }
}
