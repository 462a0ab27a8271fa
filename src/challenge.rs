//! Challenge registry: the ordered catalog of exercises and the guides who
//! present them.
//!
//! A catalog is immutable once loaded and is passed explicitly to whoever
//! needs it. The default catalog is compiled into the binary; a custom one can
//! be loaded from a JSON document of the same shape.

use crate::value::Bindings;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

/// One exercise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChallengeSpec {
    /// Unique positive id; also the presentation order.
    pub id: u32,
    /// Short title.
    pub title: String,
    /// What the learner is asked to do.
    pub description: String,
    /// Variables visible to the snippet before it runs.
    #[serde(default)]
    pub starter: Bindings,
    /// Variables a correct snippet leaves behind, checked in this order.
    pub expected: Bindings,
    /// Shown after a failed attempt.
    pub hint: String,
    /// A snippet that passes.
    pub solution: String,
}

/// A presentation character chosen at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Guide {
    /// Display name.
    pub name: String,
    /// One-line description used in the selection menu.
    pub tagline: String,
    /// Said once the guide is chosen.
    pub greeting: String,
    /// Said after a passed challenge; one is drawn per pass.
    #[serde(default)]
    pub encouragements: Vec<String>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogDocument {
    guides: Vec<Guide>,
    challenges: Vec<ChallengeSpec>,
}

/// Error loading a catalog.
#[derive(Debug)]
pub enum CatalogError {
    /// The catalog file could not be read.
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The document is not valid catalog JSON.
    Json(serde_json::Error),
    /// Two challenges share an id.
    DuplicateId(u32),
    /// A challenge has id 0.
    InvalidId {
        /// Title of the offending challenge.
        title: String,
    },
    /// A challenge expects nothing, so any snippet would pass it.
    NoExpected(u32),
    /// The guide list is empty.
    NoGuides,
    /// The challenge list is empty.
    NoChallenges,
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read catalog {}: {source}", path.display())
            }
            Self::Json(e) => write!(f, "invalid catalog: {e}"),
            Self::DuplicateId(id) => write!(f, "duplicate challenge id {id}"),
            Self::InvalidId { title } => {
                write!(f, "challenge '{title}' must have a positive id")
            }
            Self::NoExpected(id) => write!(f, "challenge {id} declares no expected values"),
            Self::NoGuides => write!(f, "catalog declares no guides"),
            Self::NoChallenges => write!(f, "catalog declares no challenges"),
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Validated, id-ordered challenges plus the guide list.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    guides: Vec<Guide>,
    challenges: Vec<ChallengeSpec>,
}

impl Catalog {
    /// Build a catalog, sorting challenges by id.
    ///
    /// # Errors
    ///
    /// Rejects empty lists, id 0, duplicate ids and challenges that expect
    /// nothing.
    pub fn new(
        guides: Vec<Guide>,
        mut challenges: Vec<ChallengeSpec>,
    ) -> Result<Self, CatalogError> {
        if guides.is_empty() {
            return Err(CatalogError::NoGuides);
        }
        if challenges.is_empty() {
            return Err(CatalogError::NoChallenges);
        }
        let mut seen = BTreeSet::new();
        for challenge in &challenges {
            if challenge.id == 0 {
                return Err(CatalogError::InvalidId {
                    title: challenge.title.clone(),
                });
            }
            if !seen.insert(challenge.id) {
                return Err(CatalogError::DuplicateId(challenge.id));
            }
            if challenge.expected.is_empty() {
                return Err(CatalogError::NoExpected(challenge.id));
            }
        }
        challenges.sort_by_key(|challenge| challenge.id);
        Ok(Self { guides, challenges })
    }

    /// The catalog compiled into the binary.
    ///
    /// # Errors
    ///
    /// Only if the embedded document is malformed.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Parse a catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Json`] for malformed JSON, or a validation
    /// error from [`Catalog::new`].
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument = serde_json::from_str(json)?;
        Self::new(document.guides, document.challenges)
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] when the file cannot be read, otherwise
    /// as [`Catalog::from_json`].
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Challenges in presentation order.
    #[must_use]
    pub fn challenges(&self) -> &[ChallengeSpec] {
        &self.challenges
    }

    /// Guides in menu order.
    #[must_use]
    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    /// Challenge with the given id.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&ChallengeSpec> {
        self.challenges
            .binary_search_by_key(&id, |challenge| challenge.id)
            .ok()
            .map(|index| &self.challenges[index])
    }

    /// Number of challenges.
    #[must_use]
    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    /// Always false for a validated catalog.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn challenge(id: u32) -> ChallengeSpec {
        ChallengeSpec {
            id,
            title: format!("challenge {id}"),
            description: String::new(),
            starter: Bindings::new(),
            expected: [("x", Value::Int(1))].into_iter().collect(),
            hint: String::new(),
            solution: "x = 1".into(),
        }
    }

    fn guide() -> Guide {
        Guide {
            name: "Tester".into(),
            tagline: String::new(),
            greeting: "hi".into(),
            encouragements: Vec::new(),
        }
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        assert!(catalog.len() >= 13);
        assert!(catalog.guides().len() >= 3);
        let ids: Vec<u32> = catalog.challenges().iter().map(|c| c.id).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_builtin_scenarios_present() {
        let catalog = Catalog::builtin().unwrap();
        let first = catalog.get(1).unwrap();
        assert_eq!(first.starter.get("a"), Some(&Value::Int(5)));
        assert_eq!(first.expected.get("c"), Some(&Value::Int(13)));
        let even = catalog.get(2).unwrap();
        assert_eq!(even.expected.get("is_even"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_sorted_by_id() {
        let catalog = Catalog::new(vec![guide()], vec![challenge(3), challenge(1)]).unwrap();
        assert_eq!(catalog.challenges()[0].id, 1);
        assert_eq!(catalog.get(3).unwrap().id, 3);
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn test_validation() {
        assert!(matches!(
            Catalog::new(vec![guide()], vec![challenge(1), challenge(1)]),
            Err(CatalogError::DuplicateId(1))
        ));
        assert!(matches!(
            Catalog::new(vec![guide()], vec![challenge(0)]),
            Err(CatalogError::InvalidId { .. })
        ));
        assert!(matches!(
            Catalog::new(Vec::new(), vec![challenge(1)]),
            Err(CatalogError::NoGuides)
        ));
        assert!(matches!(
            Catalog::new(vec![guide()], Vec::new()),
            Err(CatalogError::NoChallenges)
        ));
        let mut empty = challenge(4);
        empty.expected = Bindings::new();
        assert!(matches!(
            Catalog::new(vec![guide()], vec![empty]),
            Err(CatalogError::NoExpected(4))
        ));
    }

    #[test]
    fn test_json_errors() {
        assert!(matches!(
            Catalog::from_json("{\"guides\": []"),
            Err(CatalogError::Json(_))
        ));
        let negative = r#"{"guides": [], "challenges": [{"id": -1}]}"#;
        assert!(matches!(Catalog::from_json(negative), Err(CatalogError::Json(_))));
    }

    #[test]
    fn test_missing_file() {
        let err = Catalog::load(Path::new("/nonexistent/catalog.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/catalog.json"));
    }
}
