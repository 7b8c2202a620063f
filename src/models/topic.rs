//! Topic catalog model.
//!
//! The catalog is the ordered, fixed list of research topics shared by all
//! employees and projects. Its order defines the topic index space of the
//! allocation matrices.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Research topics used when no catalog is supplied.
const RESEARCH_TOPICS: [&str; 17] = [
    "General Info. System / Methodology",
    "Networks / Distributed Systems",
    "System / Architecture Integration",
    "Cogn. Architecture / Hybrid Archi",
    "Data Processing / Data Mgmt",
    "Spatial / Temporal Pattrn. Classification",
    "Training Env. / Artificial Pedagogy",
    "Visualization / UX",
    "Multi-Agent Systems",
    "Sense-Act Cycle / Embedded Systems",
    "Reasoning / Planning",
    "Natural Communic. / Autom. Explanation",
    "Cumulative Learning / Transfer Learn.",
    "Resource Control / Attention",
    "Self-Progr. / Seed-Progr. / Cogn. Growth",
    "Hardware / Robot Hardware",
    "Modeling / Simulation",
];

/// An ordered list of unique topic names.
///
/// # Example
///
/// ```
/// use allocation_engine::models::TopicCatalog;
///
/// let catalog = TopicCatalog::new(["Networks", "Robotics"]).unwrap();
/// assert_eq!(catalog.index_of("Robotics"), Some(1));
/// assert_eq!(catalog.index_of("Biology"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicCatalog {
    topics: Vec<String>,
}

impl TopicCatalog {
    /// Builds a catalog, rejecting empty, blank or repeated names.
    pub fn new<I, S>(topics: I) -> EngineResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let catalog = Self {
            topics: topics.into_iter().map(Into::into).collect(),
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// The built-in research topic catalog.
    pub fn research_topics() -> Self {
        Self {
            topics: RESEARCH_TOPICS.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Checks that the catalog is non-empty and its names are unique.
    pub fn validate(&self) -> EngineResult<()> {
        if self.topics.is_empty() {
            return Err(EngineError::InvalidTopicCatalog {
                message: "catalog is empty".to_string(),
            });
        }
        for (i, topic) in self.topics.iter().enumerate() {
            if topic.trim().is_empty() {
                return Err(EngineError::InvalidTopicCatalog {
                    message: format!("topic at position {} is blank", i),
                });
            }
            if self.topics[..i].contains(topic) {
                return Err(EngineError::InvalidTopicCatalog {
                    message: format!("topic '{}' is listed more than once", topic),
                });
            }
        }
        Ok(())
    }

    /// Position of `topic` in the catalog.
    pub fn index_of(&self, topic: &str) -> Option<usize> {
        self.topics.iter().position(|t| t == topic)
    }

    /// Name of the topic at `index`.
    pub fn name(&self, index: usize) -> Option<&str> {
        self.topics.get(index).map(String::as_str)
    }

    /// Number of topics.
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Returns true if the catalog has no topics.
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Iterates topic names in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(String::as_str)
    }
}

impl Default for TopicCatalog {
    fn default() -> Self {
        Self::research_topics()
    }
}
