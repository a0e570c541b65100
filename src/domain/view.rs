// Saved dashboard views and the users that own them
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// A named dashboard layout persisted by the data service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub creator_id: String,
    #[serde(default)]
    pub creator_first: String,
    #[serde(default)]
    pub creator_last: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub public: bool,
    /// Grid cell -> plot item id
    #[serde(default)]
    pub items: BTreeMap<String, String>,
    #[serde(default = "default_grid")]
    pub columns: u32,
    #[serde(default = "default_grid")]
    pub rows: u32,
    #[serde(default = "default_step")]
    pub step: u32,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub simulation: Option<String>,
}

fn default_grid() -> u32 {
    1
}

fn default_step() -> u32 {
    1
}

impl View {
    pub fn is_public(&self) -> bool {
        self.public
    }

    pub fn created_by(&self, user_id: &str) -> bool {
        self.creator_id == user_id
    }

    /// Public views, plus private views owned by `user`.
    pub fn is_visible_to(&self, user: Option<&User>) -> bool {
        self.is_public() || user.is_some_and(|u| self.created_by(&u.id))
    }
}

/// Fields sent when saving the current layout as a new view.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewView {
    pub name: String,
    pub items: BTreeMap<String, String>,
    pub columns: u32,
    pub rows: u32,
    pub step: u32,
    pub public: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub simulation: Option<String>,
}

/// Girder writes timestamps with or without an offset; offset-less values are UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}
