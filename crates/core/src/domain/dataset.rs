use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DatasetId(pub i64);

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorId(pub i64);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub affiliation: Option<String>,
    pub orcid: Option<String>,
}

/// Descriptive metadata attached to a dataset.
///
/// `tags` is kept as the raw comma-separated string it was stored as;
/// tokenization happens in [`Dataset::tag_set`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub title: String,
    pub description: String,
    pub tags: Option<String>,
    pub dataset_doi: Option<String>,
    pub authors: Vec<Author>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    pub id: Option<DatasetId>,
    pub created_at: DateTime<Utc>,
    pub metadata: Option<DatasetMetadata>,
}

impl Dataset {
    /// Tags split on `,` exactly as stored. Tokens are not trimmed, so
    /// `"a, b"` yields `"a"` and `" b"`.
    pub fn tag_set(&self) -> HashSet<&str> {
        match self.metadata.as_ref().and_then(|meta| meta.tags.as_deref()) {
            Some(tags) if !tags.is_empty() => tags.split(',').collect(),
            _ => HashSet::new(),
        }
    }

    pub fn author_ids(&self) -> HashSet<AuthorId> {
        self.metadata
            .as_ref()
            .map(|meta| meta.authors.iter().map(|author| author.id).collect())
            .unwrap_or_default()
    }

    /// Metadata title, or `Suggested Dataset #<id>` when metadata is absent.
    pub fn title(&self) -> String {
        match (&self.metadata, self.id) {
            (Some(meta), _) => meta.title.clone(),
            (None, Some(id)) => format!("Suggested Dataset #{id}"),
            (None, None) => "Suggested Dataset".to_owned(),
        }
    }

    pub fn is_synchronized(&self) -> bool {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.dataset_doi.as_deref())
            .is_some_and(|doi| !doi.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{Author, AuthorId, Dataset, DatasetId, DatasetMetadata};

    fn dataset(tags: Option<&str>, doi: Option<&str>) -> Dataset {
        Dataset {
            id: Some(DatasetId(7)),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).single().expect("timestamp"),
            metadata: Some(DatasetMetadata {
                title: "Feature models".to_owned(),
                description: "UVL feature models".to_owned(),
                tags: tags.map(str::to_owned),
                dataset_doi: doi.map(str::to_owned),
                authors: vec![
                    Author {
                        id: AuthorId(10),
                        name: "Ada".to_owned(),
                        affiliation: None,
                        orcid: None,
                    },
                    Author {
                        id: AuthorId(11),
                        name: "Grace".to_owned(),
                        affiliation: Some("Navy".to_owned()),
                        orcid: None,
                    },
                ],
            }),
        }
    }

    #[test]
    fn tag_set_splits_on_comma_without_trimming() {
        let ds = dataset(Some("tag1, tag2,tag1"), None);
        let tags = ds.tag_set();

        assert_eq!(tags.len(), 2);
        assert!(tags.contains("tag1"));
        assert!(tags.contains(" tag2"));
        assert!(!tags.contains("tag2"));
    }

    #[test]
    fn empty_or_absent_tags_yield_empty_set() {
        assert!(dataset(Some(""), None).tag_set().is_empty());
        assert!(dataset(None, None).tag_set().is_empty());

        let bare = Dataset { metadata: None, ..dataset(Some("a"), None) };
        assert!(bare.tag_set().is_empty());
        assert!(bare.author_ids().is_empty());
    }

    #[test]
    fn title_falls_back_when_metadata_is_missing() {
        let bare = Dataset { metadata: None, ..dataset(None, None) };
        assert_eq!(bare.title(), "Suggested Dataset #7");
        assert_eq!(dataset(None, None).title(), "Feature models");
    }

    #[test]
    fn synchronized_requires_a_dataset_doi() {
        assert!(dataset(None, Some("10.1234/dataset7")).is_synchronized());
        assert!(!dataset(None, Some("  ")).is_synchronized());
        assert!(!dataset(None, None).is_synchronized());
    }

    #[test]
    fn author_ids_are_deduplicated() {
        let ds = dataset(None, None);
        let ids = ds.author_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&AuthorId(10)));
    }
}
