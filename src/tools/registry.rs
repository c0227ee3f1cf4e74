//! Tool registry
//!
//! Tools are registered once at startup through [`ToolRegistryBuilder`]; the
//! frozen [`ToolRegistry`] is immutable and shared across every request.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use super::Tool;
use crate::error::{Result, ToolsmithError};

/// Maximum edit distance for "did you mean" suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Enable/disable configuration, resolved once when the registry is built
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolFilter {
    /// Allow-list; `None` enables everything not denied
    pub enabled: Option<Vec<String>>,
    /// Deny-list, applied after the allow-list
    pub disabled: Vec<String>,
}

impl ToolFilter {
    /// Everything enabled
    pub fn all() -> Self {
        Self::default()
    }

    /// Build from comma-separated name lists
    pub fn from_lists(enabled: Option<&str>, disabled: Option<&str>) -> Self {
        Self {
            enabled: enabled.map(split_names),
            disabled: disabled.map(split_names).unwrap_or_default(),
        }
    }

    pub fn allows(&self, name: &str) -> bool {
        let allowed = self
            .enabled
            .as_ref()
            .map_or(true, |list| list.iter().any(|n| n == name));
        allowed && !self.disabled.iter().any(|n| n == name)
    }

    fn mentioned(&self) -> impl Iterator<Item = &String> {
        self.enabled.iter().flatten().chain(self.disabled.iter())
    }
}

fn split_names(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

/// Collects tools before the registry is frozen
#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistryBuilder {
    /// Register a tool; names must be unique
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.name().to_string();
        if self.index.contains_key(&name) {
            return Err(ToolsmithError::DuplicateTool(name));
        }
        self.index.insert(name, self.tools.len());
        self.tools.push(tool);
        Ok(())
    }

    /// Freeze the registry, evaluating `filter` into a static allow-set
    pub fn build(self, filter: &ToolFilter) -> ToolRegistry {
        for name in filter.mentioned() {
            if !self.index.contains_key(name) {
                tracing::warn!("Tool filter names unknown tool '{}'", name);
            }
        }

        let allowed: HashSet<String> = self
            .tools
            .iter()
            .map(|t| t.name())
            .filter(|name| filter.allows(name))
            .map(|name| name.to_string())
            .collect();

        tracing::info!(
            "Registered {} tools ({} enabled)",
            self.tools.len(),
            allowed.len()
        );

        ToolRegistry {
            tools: self.tools,
            index: self.index,
            allowed,
        }
    }
}

/// Immutable name → tool table with insertion order preserved
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
    allowed: HashSet<String>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::default()
    }

    /// Find an enabled tool by name
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Tool>> {
        match self.index.get(name) {
            Some(&i) if self.allowed.contains(name) => Ok(self.tools[i].clone()),
            _ => Err(ToolsmithError::ToolNotFound {
                name: name.to_string(),
                suggestions: self.suggest(name),
            }),
        }
    }

    /// Enabled tools in registration order
    pub fn list(&self) -> Vec<Arc<dyn Tool>> {
        self.tools
            .iter()
            .filter(|t| self.allowed.contains(t.name()))
            .cloned()
            .collect()
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.allowed.contains(name)
    }

    /// Every registered name, disabled ones included
    pub fn registered_names(&self) -> Vec<&'static str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Enabled names close to `name`, nearest first
    fn suggest(&self, name: &str) -> Vec<String> {
        let mut scored: Vec<(usize, &str)> = self
            .list()
            .iter()
            .map(|t| (levenshtein::levenshtein(name, t.name()), t.name()))
            .filter(|(d, _)| *d <= MAX_SUGGESTION_DISTANCE)
            .collect();
        scored.sort();
        scored.into_iter().map(|(_, n)| n.to_string()).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.registered_names())
            .field("allowed", &self.allowed)
            .finish()
    }
}
