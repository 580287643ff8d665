use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::MessagingError;

/// A hierarchical, `/`-separated routing key messages are published to.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    name: String,
}

impl Topic {
    pub fn of(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// A publish topic must have no empty levels and no wildcard levels.
    pub fn validate(&self) -> Result<(), MessagingError> {
        let valid = !self.name.is_empty()
            && self
                .name
                .split('/')
                .all(|level| !level.is_empty() && level != ">" && !level.ends_with('*'));
        if valid {
            Ok(())
        } else {
            Err(MessagingError::InvalidTopic(self.name.clone()))
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A topic pattern a queue subscribes with.
///
/// Levels are compared one by one:
/// - `*` matches any single level
/// - `abc*` matches any single level starting with `abc`
/// - `>` as the final level matches one or more remaining levels
///
/// Anything else must match the level exactly.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TopicSubscription {
    pattern: String,
}

impl TopicSubscription {
    pub fn of(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn matches(&self, topic: &str) -> bool {
        let mut pattern = self.pattern.split('/').peekable();
        let mut levels = topic.split('/');

        loop {
            match (pattern.next(), levels.next()) {
                (Some(">"), Some(_)) if pattern.peek().is_none() => return true,
                (Some(p), Some(level)) => {
                    if !level_matches(p, level) {
                        return false;
                    }
                }
                (None, None) => return true,
                _ => return false,
            }
        }
    }
}

fn level_matches(pattern: &str, level: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => level.starts_with(prefix),
        None => pattern == level,
    }
}

impl From<&Topic> for TopicSubscription {
    fn from(topic: &Topic) -> Self {
        Self::of(topic.name())
    }
}

impl fmt::Display for TopicSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

/// Handle to a queue on the broker.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Queue {
    name: String,
    durable: bool,
    exclusive: bool,
}

impl Queue {
    pub fn durable_exclusive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: true,
            exclusive: true,
        }
    }

    pub fn durable_non_exclusive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: true,
            exclusive: false,
        }
    }

    pub fn non_durable_exclusive(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            durable: false,
            exclusive: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_durable(&self) -> bool {
        self.durable
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }
}

impl fmt::Display for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
