use std::fmt::{self, Display};

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::Difficulty;

/// One video of the raw listing, as dumped by the channel scraper
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawVideo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

impl RawVideo {
    /// Project the video to a catalog entry.
    ///
    /// Return None if the video has no id or a blank title.
    pub fn into_entry(self) -> Option<SketchEntry> {
        let video_id = self.id.filter(|id| !id.is_empty())?;
        let name = self.title?.trim().to_owned();

        if name.is_empty() {
            None
        } else {
            Some(SketchEntry { name, video_id })
        }
    }
}

/// A sketch kept by the title filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SketchEntry {
    pub name: String,
    #[serde(rename = "videoId")]
    pub video_id: String,
}

/// Key of the video id in the catalog records
const ID_KEY: &str = "youtubeId";
/// Read when a record has no `youtubeId`, as written by the title filter
const ID_FALLBACK_KEY: &str = "videoId";

/// Why a record cannot be enriched
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidRecord {
    NotAnObject,
    NoId,
    BadId,
}

impl Display for InvalidRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidRecord::NotAnObject => write!(f, "not a JSON object"),
            InvalidRecord::NoId => write!(f, "no '{ID_KEY}' nor '{ID_FALLBACK_KEY}'"),
            InvalidRecord::BadId => write!(f, "the video id is not a non-empty string"),
        }
    }
}

/// A catalog record going through the enrichment.
///
/// The record is kept as the JSON object it was read from: its keys keep
/// their order and only `views`, `difficulty` and `description` are ever
/// changed, new keys going last.
#[derive(Debug, Clone, PartialEq)]
pub struct SketchRecord {
    youtube_id: String,
    fields: Map<String, Value>,
}

impl SketchRecord {
    pub fn youtube_id(&self) -> &str {
        &self.youtube_id
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The sketch display name, if the record has one
    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }

    /// The locally curated tags. Entries that are not strings are ignored
    pub fn tags(&self) -> Vec<&str> {
        match self.get("tags") {
            Some(Value::Array(tags)) => tags.iter().filter_map(Value::as_str).collect(),
            _ => vec![],
        }
    }

    /// Whether the record holds a description worth keeping.
    ///
    /// Missing, `null`, `false`, `0` and empty values do not count.
    pub fn has_description(&self) -> bool {
        match self.get("description") {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => !s.is_empty(),
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
        }
    }

    /// The view count of a previous enrichment, if readable
    pub fn views(&self) -> Option<u64> {
        self.get("views").and_then(Value::as_u64)
    }

    /// The difficulty of a previous enrichment, if readable
    pub fn difficulty(&self) -> Option<Difficulty> {
        self.get("difficulty")
            .and_then(|d| Difficulty::deserialize(d).ok())
    }

    pub fn set_views(&mut self, views: u64) {
        self.fields.insert("views".to_owned(), views.into());
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.fields
            .insert("difficulty".to_owned(), difficulty.as_str().into());
    }

    pub fn set_description(&mut self, description: String) {
        self.fields
            .insert("description".to_owned(), description.into());
    }
}

impl TryFrom<Value> for SketchRecord {
    type Error = InvalidRecord;

    /// Read a record keyed by `youtubeId`, or by `videoId` when there is no
    /// `youtubeId`. In the latter case a `youtubeId` key is added.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let Value::Object(mut fields) = value else {
            return Err(InvalidRecord::NotAnObject);
        };

        let id = match fields.get(ID_KEY) {
            None | Some(Value::Null) => fields.get(ID_FALLBACK_KEY),
            id => id,
        };
        let youtube_id = match id {
            None | Some(Value::Null) => return Err(InvalidRecord::NoId),
            Some(Value::String(id)) if !id.is_empty() => id.clone(),
            Some(_) => return Err(InvalidRecord::BadId),
        };

        if !matches!(fields.get(ID_KEY), Some(Value::String(_))) {
            fields.insert(ID_KEY.to_owned(), youtube_id.clone().into());
        }

        Ok(SketchRecord { youtube_id, fields })
    }
}

impl Serialize for SketchRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}
