use serde::Serialize;

use crate::cli::Target;

/// Optional build descriptors forwarded to AppHub alongside the archive.
///
/// Serialized as compact JSON and sent in the `X-AppHub-Build-Metadata`
/// header; keys the user never set are left out entirely.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    target: Option<Target>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    app_versions: Option<Vec<String>>,
}

impl BuildMetadata {
    /// Collect whatever metadata flags were given. Returns `None` when no
    /// flag carries a value, so callers can skip the header altogether.
    pub fn from_options(
        target: Option<Target>,
        name: Option<&str>,
        description: Option<&str>,
        app_versions: Option<&str>,
    ) -> Option<Self> {
        let metadata = Self {
            target,
            name: name.map(String::from),
            description: description.map(String::from),
            app_versions: app_versions
                .map(split_app_versions)
                .filter(|versions| !versions.is_empty()),
        };
        if metadata.is_empty() {
            None
        } else {
            Some(metadata)
        }
    }

    fn is_empty(&self) -> bool {
        self.target.is_none()
            && self.name.is_none()
            && self.description.is_none()
            && self.app_versions.is_none()
    }

    pub fn to_header_value(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Split a comma separated version list, dropping whitespace and empty
/// segments ("1.0, ,2.0" yields two entries).
pub fn split_app_versions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|version| !version.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{BuildMetadata, split_app_versions};
    use crate::cli::Target;

    #[test]
    fn collects_every_provided_flag() {
        let metadata = BuildMetadata::from_options(
            Some(Target::All),
            Some("nightly"),
            Some("fixes the login crash"),
            Some("1.2.0,1.3.0"),
        )
        .expect("metadata should be present");

        let value = serde_json::to_value(&metadata).expect("metadata should serialize");
        assert_eq!(value["target"], "all");
        assert_eq!(value["name"], "nightly");
        assert_eq!(value["description"], "fixes the login crash");
        assert_eq!(value["app_versions"][0], "1.2.0");
        assert_eq!(value["app_versions"][1], "1.3.0");
    }

    #[test]
    fn omits_unset_keys() {
        let metadata = BuildMetadata::from_options(None, Some("nightly"), None, None)
            .expect("metadata should be present");

        let value = serde_json::to_value(&metadata).expect("metadata should serialize");
        let object = value.as_object().expect("metadata should be a JSON object");
        assert_eq!(object.len(), 1);
        assert!(object.contains_key("name"));
    }

    #[test]
    fn no_flags_means_no_metadata() {
        assert_eq!(BuildMetadata::from_options(None, None, None, None), None);
    }

    #[test]
    fn empty_version_list_counts_as_unset() {
        assert_eq!(
            BuildMetadata::from_options(None, None, None, Some(" , ,")),
            None
        );
    }

    #[test]
    fn trims_and_splits_versions_on_commas() {
        assert_eq!(
            split_app_versions(" 1.2.0, 1.3.0 ,2.0.0"),
            vec!["1.2.0", "1.3.0", "2.0.0"]
        );
    }

    #[test]
    fn serializes_to_compact_json_header() {
        let metadata = BuildMetadata::from_options(Some(Target::Debug), None, None, Some("1.2.0"))
            .expect("metadata should be present");

        let header = metadata
            .to_header_value()
            .expect("metadata should serialize");
        assert_eq!(header, r#"{"target":"debug","app_versions":["1.2.0"]}"#);
    }
}
