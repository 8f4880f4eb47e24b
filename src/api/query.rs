//! Request vocabulary and parameter building for the metadata API.

use std::fmt;
use std::str::FromStr;

use super::error::{ApiError, UnknownValueError};

/// Shortest accepted search query, in characters.
pub const MIN_QUERY_LEN: usize = 3;

/// API action selector (`action=` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Get,
    Search,
    LatestFiles,
}

impl Action {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Search => "search",
            Self::LatestFiles => "latestfiles",
        }
    }
}

/// Record field a search query is matched against (`type=` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchField {
    Filename,
    Title,
    Author,
    Email,
    Description,
    Credits,
    Editors,
    Textfile,
}

impl SearchField {
    /// Every field, in API documentation order.
    pub const ALL: &'static [Self] = &[
        Self::Filename,
        Self::Title,
        Self::Author,
        Self::Email,
        Self::Description,
        Self::Credits,
        Self::Editors,
        Self::Textfile,
    ];

    /// Wire value sent to the API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Filename => "filename",
            Self::Title => "title",
            Self::Author => "author",
            Self::Email => "email",
            Self::Description => "description",
            Self::Credits => "credits",
            Self::Editors => "editors",
            Self::Textfile => "textfile",
        }
    }
}

/// Server-side ordering of search results (`sort=` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Date,
    Filename,
    Size,
    Rating,
}

impl SortKey {
    /// Every sort key, in API documentation order.
    pub const ALL: &'static [Self] = &[Self::Date, Self::Filename, Self::Size, Self::Rating];

    /// Wire value sent to the API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Filename => "filename",
            Self::Size => "size",
            Self::Rating => "rating",
        }
    }
}

/// Server-side sort direction (`dir=` parameter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    /// Both directions.
    pub const ALL: &'static [Self] = &[Self::Asc, Self::Desc];

    /// Wire value sent to the API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SearchField {
    type Err = UnknownValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_vocabulary("search field", value, Self::ALL, |v| v.as_str())
    }
}

impl FromStr for SortKey {
    type Err = UnknownValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_vocabulary("sort key", value, Self::ALL, |v| v.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = UnknownValueError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_vocabulary("sort direction", value, Self::ALL, |v| v.as_str())
    }
}

/// Case-insensitive lookup of `value` among the wire names of `all`.
fn parse_vocabulary<T: Copy>(
    kind: &'static str,
    value: &str,
    all: &[T],
    wire: fn(T) -> &'static str,
) -> Result<T, UnknownValueError> {
    let needle = value.trim();
    all.iter()
        .copied()
        .find(|candidate| wire(*candidate).eq_ignore_ascii_case(needle))
        .ok_or_else(|| UnknownValueError {
            kind,
            value: value.to_string(),
            expected: all.iter().map(|c| wire(*c)).collect::<Vec<_>>().join(", "),
        })
}

/// Selects one record by id or by archive path.
///
/// An id of 0 and an empty path count as unset. When both are unset the
/// request is still sent and the API decides what to return.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLookup {
    /// Archive record id.
    pub id: Option<u64>,
    /// Archive-relative file path, e.g. `levels/doom2/m-o/mm2.zip`.
    pub path: Option<String>,
}

impl FileLookup {
    /// Looks a record up by id.
    #[must_use]
    pub fn by_id(id: u64) -> Self {
        Self {
            id: Some(id),
            path: None,
        }
    }

    /// Looks a record up by archive path.
    pub fn by_path(path: impl Into<String>) -> Self {
        Self {
            id: None,
            path: Some(path.into()),
        }
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(id) = self.id.filter(|id| *id > 0) {
            params.push(("id", id.to_string()));
        }
        if let Some(path) = self.path.as_deref().filter(|p| !p.is_empty()) {
            params.push(("file", path.to_string()));
        }
        params
    }
}

/// One search call against a single field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    /// Search text, at least [`MIN_QUERY_LEN`] characters.
    pub query: String,
    /// Field to match; `None` lets the API pick its default.
    pub field: Option<SearchField>,
    /// Server-side sort key; `None` lets the API pick its default.
    pub sort: Option<SortKey>,
    /// Server-side sort direction; `None` lets the API pick its default.
    pub direction: Option<SortDirection>,
}

impl SearchRequest {
    /// A search with every optional parameter left to the API.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            field: None,
            sort: None,
            direction: None,
        }
    }

    /// Restricts the search to one field.
    #[must_use]
    pub fn field(mut self, field: SearchField) -> Self {
        self.field = Some(field);
        self
    }

    /// Sets the server-side ordering.
    #[must_use]
    pub fn sorted(mut self, sort: Option<SortKey>, direction: Option<SortDirection>) -> Self {
        self.sort = sort;
        self.direction = direction;
        self
    }

    pub(crate) fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("query", self.query.clone())];
        if let Some(field) = self.field {
            params.push(("type", field.as_str().to_string()));
        }
        if let Some(sort) = self.sort {
            params.push(("sort", sort.as_str().to_string()));
        }
        if let Some(direction) = self.direction {
            params.push(("dir", direction.as_str().to_string()));
        }
        params
    }
}

pub(crate) fn latest_params(limit: u32, start_id: u64) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if limit > 0 {
        params.push(("limit", limit.to_string()));
    }
    if start_id > 0 {
        params.push(("startid", start_id.to_string()));
    }
    params
}

/// Checks the minimum query length before any request is made.
///
/// # Errors
///
/// Returns [`ApiError::Validation`] when `query` has fewer than
/// [`MIN_QUERY_LEN`] characters.
pub fn validate_query(query: &str) -> Result<(), ApiError> {
    if query.chars().count() < MIN_QUERY_LEN {
        return Err(ApiError::validation(format!(
            "search query must be at least {MIN_QUERY_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_search_field_round_trips_through_from_str() {
        for field in SearchField::ALL {
            assert_eq!(field.as_str().parse::<SearchField>().unwrap(), *field);
        }
    }

    #[test]
    fn test_vocabulary_parse_is_case_insensitive() {
        assert_eq!("TITLE".parse::<SearchField>().unwrap(), SearchField::Title);
        assert_eq!(" Rating ".parse::<SortKey>().unwrap(), SortKey::Rating);
        assert_eq!("desc".parse::<SortDirection>().unwrap(), SortDirection::Desc);
    }

    #[test]
    fn test_vocabulary_parse_rejects_unknown_value() {
        let error = "popularity".parse::<SortKey>().unwrap_err();
        assert_eq!(error.kind, "sort key");
        assert_eq!(error.expected, "date, filename, size, rating");
    }

    #[test]
    fn test_lookup_params_omit_unset_values() {
        assert!(FileLookup::default().params().is_empty());
        assert!(FileLookup::by_id(0).params().is_empty());
        assert!(FileLookup::by_path("").params().is_empty());
        assert_eq!(FileLookup::by_id(42).params(), vec![("id", "42".to_string())]);
        assert_eq!(
            FileLookup::by_path("levels/doom/a.zip").params(),
            vec![("file", "levels/doom/a.zip".to_string())]
        );
    }

    #[test]
    fn test_search_params_omit_empty_options() {
        let params = SearchRequest::new("doom").params();
        assert_eq!(params, vec![("query", "doom".to_string())]);

        let params = SearchRequest::new("doom")
            .field(SearchField::Author)
            .sorted(Some(SortKey::Rating), Some(SortDirection::Desc))
            .params();
        assert_eq!(
            params,
            vec![
                ("query", "doom".to_string()),
                ("type", "author".to_string()),
                ("sort", "rating".to_string()),
                ("dir", "desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_latest_params_treat_zero_as_unset() {
        assert!(latest_params(0, 0).is_empty());
        assert_eq!(
            latest_params(50, 0),
            vec![("limit", "50".to_string())]
        );
        assert_eq!(
            latest_params(0, 1234),
            vec![("startid", "1234".to_string())]
        );
    }

    #[test]
    fn test_validate_query_boundary() {
        assert!(validate_query("ab").unwrap_err().is_validation());
        assert!(validate_query("").is_err());
        assert!(validate_query("abc").is_ok());
        // Counted in characters, not bytes.
        assert!(validate_query("éé").is_err());
    }
}
