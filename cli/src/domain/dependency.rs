//! Task dependency references: `"agent.task"` or bare `"task"`.

use std::fmt;

use serde::Serialize;

use crate::domain::error::TaskError;

/// A task that must run before another one.
///
/// `agent == None` means the dependency runs on whichever agent the dependent
/// task runs on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Dependency {
    pub agent: Option<String>,
    pub task: String,
}

impl Dependency {
    /// Parses a dependency string.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidDependency`] if either part is empty or the
    /// string has more than one `.` separator.
    pub fn parse(spec: &str) -> Result<Self, TaskError> {
        let invalid = || TaskError::InvalidDependency(spec.to_string());
        let mut parts = spec.split('.');
        let (agent, task) = match (parts.next(), parts.next(), parts.next()) {
            (Some(task), None, None) => (None, task),
            (Some(agent), Some(task), None) => {
                if agent.trim().is_empty() {
                    return Err(invalid());
                }
                (Some(agent.trim().to_string()), task)
            }
            _ => return Err(invalid()),
        };
        let task = task.trim();
        if task.is_empty() {
            return Err(invalid());
        }
        Ok(Self {
            agent,
            task: task.to_string(),
        })
    }

    /// Parses a list of dependency strings, failing on the first bad entry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidDependency`] for the first malformed entry.
    pub fn parse_all<S: AsRef<str>>(specs: &[S]) -> Result<Vec<Self>, TaskError> {
        specs.iter().map(|s| Self::parse(s.as_ref())).collect()
    }
}

impl fmt::Display for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.agent {
            Some(agent) => write!(f, "{agent}.{}", self.task),
            None => f.write_str(&self.task),
        }
    }
}
