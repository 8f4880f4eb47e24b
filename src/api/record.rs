//! Archive record types as returned by the metadata API.
//!
//! Decoding is lenient: JSON `null` becomes the field's default, numeric
//! fields also accept numeric strings, and a malformed review block yields an
//! empty review list instead of failing the whole record.

use std::str::FromStr;

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::debug;

use super::decode::decode_one_or_many;

/// Highest rating the archive hands out.
pub const MAX_RATING: f32 = 5.0;

/// One file entry in the archive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    /// Archive-wide unique id.
    #[serde(deserialize_with = "lenient_number")]
    pub id: u64,
    /// Title of the file.
    #[serde(deserialize_with = "null_as_default")]
    pub title: String,
    /// Archive directory, e.g. `levels/doom2/m-o/`.
    #[serde(deserialize_with = "null_as_default")]
    pub dir: String,
    /// Bare file name, no path.
    #[serde(deserialize_with = "null_as_default")]
    pub filename: String,
    /// File size in bytes.
    #[serde(deserialize_with = "lenient_number")]
    pub size: u64,
    /// Upload time in seconds since the Unix epoch.
    #[serde(deserialize_with = "lenient_number")]
    pub age: i64,
    /// Upload date as `YYYY-MM-DD`.
    #[serde(deserialize_with = "null_as_default")]
    pub date: String,
    /// Author or uploader.
    #[serde(deserialize_with = "null_as_default")]
    pub author: String,
    /// Author contact address.
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(deserialize_with = "null_as_default")]
    pub credits: String,
    /// What the work is based on (another mod, scratch, ...).
    #[serde(deserialize_with = "null_as_default")]
    pub base: String,
    #[serde(deserialize_with = "null_as_default")]
    pub buildtime: String,
    /// Editors used to build the file.
    #[serde(deserialize_with = "null_as_default")]
    pub editors: String,
    /// Known bugs.
    #[serde(deserialize_with = "null_as_default")]
    pub bugs: String,
    /// Full text file body. Only present in detail (`get`) responses.
    #[serde(deserialize_with = "null_as_default")]
    pub textfile: String,
    /// Average user rating, 0 to [`MAX_RATING`].
    #[serde(deserialize_with = "lenient_number")]
    pub rating: f32,
    /// Number of votes behind `rating`.
    #[serde(deserialize_with = "lenient_number")]
    pub votes: u32,
    /// Archive web page.
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    /// `idgames://` protocol URL.
    #[serde(deserialize_with = "null_as_default")]
    pub idgamesurl: String,
    /// Reviews in API order. Only present in detail (`get`) responses.
    #[serde(deserialize_with = "reviews_best_effort")]
    pub reviews: Vec<Review>,
}

impl Record {
    /// Archive-relative path of the file (`dir` joined with `filename`).
    #[must_use]
    pub fn archive_path(&self) -> String {
        let dir = self.dir.trim_matches('/');
        if dir.is_empty() {
            self.filename.clone()
        } else {
            format!("{dir}/{}", self.filename)
        }
    }

    /// Whole stars for display, clamped to `0..=5`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn stars(&self) -> u8 {
        if self.rating.is_nan() {
            return 0;
        }
        self.rating.clamp(0.0, MAX_RATING).floor() as u8
    }

    /// True once a detail fetch has filled in the text file or reviews.
    #[must_use]
    pub fn has_detail(&self) -> bool {
        !self.textfile.is_empty() || !self.reviews.is_empty()
    }
}

/// A user review attached to a [`Record`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Review {
    /// Review body, possibly empty.
    #[serde(deserialize_with = "null_as_default")]
    pub text: String,
    /// Vote the reviewer gave.
    #[serde(deserialize_with = "lenient_number")]
    pub vote: i32,
    /// Reviewer name; `None` means anonymous.
    #[serde(deserialize_with = "blank_as_none")]
    pub username: Option<String>,
}

impl Review {
    /// Reviewer name for display.
    #[must_use]
    pub fn author(&self) -> &str {
        self.username.as_deref().unwrap_or("Anonymous")
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|name| !name.trim().is_empty()))
}

fn lenient_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr + Default,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText<T> {
        Number(T),
        Text(String),
    }

    match Option::<NumberOrText<T>>::deserialize(deserializer)? {
        None => Ok(T::default()),
        Some(NumberOrText::Number(number)) => Ok(number),
        Some(NumberOrText::Text(text)) if text.trim().is_empty() => Ok(T::default()),
        Some(NumberOrText::Text(text)) => text
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("expected a number, found {text:?}"))),
    }
}

/// Reviews arrive as `{"review": <object or array>}`; serialized records
/// carry a plain array. Anything unreadable decodes to no reviews.
fn reviews_best_effort<'de, D>(deserializer: D) -> Result<Vec<Review>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let block = match value {
        Value::Object(mut map) if map.contains_key("review") => {
            map.remove("review").unwrap_or(Value::Null)
        }
        other => other,
    };
    Ok(decode_best_effort(&block))
}

fn decode_best_effort<T: DeserializeOwned>(block: &Value) -> Vec<T> {
    if block.is_null() {
        return Vec::new();
    }
    match decode_one_or_many(block) {
        Ok(items) => items,
        Err(error) => {
            debug!(%error, "ignoring malformed review block");
            Vec::new()
        }
    }
}
