//! Remote metadata record shape and the OMDb-style HTTP source.

use std::time::Duration;

use hashbrown::HashMap;

use super::SyncError;

/// Required length of an external identifier.
pub const EXTERNAL_ID_LEN: usize = 9;
/// Accepted external identifier prefixes (movies and people).
pub const EXTERNAL_ID_PREFIXES: [&str; 2] = ["tt", "nm"];

/// Marker the remote source uses for an absent attribute value.
const ATTRIBUTE_NULL: &str = "N/A";

/// Checks the fixed length and two-letter prefix of an external identifier.
pub fn validate_external_id(id: &str) -> Result<(), SyncError> {
    if id.len() != EXTERNAL_ID_LEN || !EXTERNAL_ID_PREFIXES.iter().any(|p| id.starts_with(p)) {
        return Err(SyncError::InvalidIdentifier(id.to_string()));
    }
    Ok(())
}

/// Field-name-to-string mapping returned by a metadata source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    fields: HashMap<String, String>,
}

impl MetadataRecord {
    /// Builds a record from field pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Inserts or replaces a field value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Gets a usable field value; empty strings and the remote null marker
    /// read as absent.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty() && *v != ATTRIBUTE_NULL)
    }
}

/// Source of remote metadata records.
///
/// `fetch` blocks; callers on an async runtime wrap it in a blocking task
/// (see the runtime's synchronize command).
pub trait MetadataSource: Send + Sync {
    /// Fetches the record for an external identifier, or fails with a
    /// connection or identifier error.
    fn fetch(&self, external_id: &str) -> Result<MetadataRecord, SyncError>;
}

/// HTTP metadata source speaking the OMDb JSON protocol.
#[derive(Debug, Clone)]
pub struct OmdbSource {
    base_url: String,
    timeout: Duration,
}

impl OmdbSource {
    /// Source pointed at the public OMDb endpoint.
    pub fn new() -> Self {
        Self::with_base_url("https://www.omdbapi.com/")
    }

    /// Source pointed at a custom endpoint, e.g. a local stub server.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl Default for OmdbSource {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataSource for OmdbSource {
    fn fetch(&self, external_id: &str) -> Result<MetadataRecord, SyncError> {
        validate_external_id(external_id)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|err| SyncError::BadConnection(err.to_string()))?;

        let body: serde_json::Value = client
            .get(&self.base_url)
            .query(&[("i", external_id), ("plot", "full"), ("r", "json")])
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|err| SyncError::BadConnection(err.to_string()))?
            .json()
            .map_err(|err| SyncError::BadConnection(err.to_string()))?;

        let Some(object) = body.as_object() else {
            return Err(SyncError::BadConnection(
                "unexpected response shape".to_string(),
            ));
        };

        // The remote reports unknown ids inside a well-formed body.
        if object.get("Response").and_then(serde_json::Value::as_str) == Some("False") {
            let reason = object
                .get("Error")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("not found");
            return Err(SyncError::InvalidIdentifier(format!(
                "{external_id}: {reason}"
            )));
        }

        Ok(MetadataRecord::from_pairs(object.iter().filter_map(
            |(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_id_requires_length_and_prefix() {
        assert!(validate_external_id("tt1375666").is_ok());
        assert!(validate_external_id("nm0000199").is_ok());
        assert!(validate_external_id("tt123").is_err());
        assert!(validate_external_id("xx1375666").is_err());
        assert!(validate_external_id("tt13756660").is_err());
    }

    #[test]
    fn null_marker_and_empty_values_read_as_absent() {
        let record =
            MetadataRecord::from_pairs([("Title", "Heat"), ("Runtime", "N/A"), ("Plot", "")]);
        assert_eq!(record.get("Title"), Some("Heat"));
        assert_eq!(record.get("Runtime"), None);
        assert_eq!(record.get("Plot"), None);
        assert_eq!(record.get("Country"), None);
    }
}
