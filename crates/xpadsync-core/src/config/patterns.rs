//! Gitignore-style filename allowlist using the ignore crate

use std::path::Path;

use anyhow::Context;
use ignore::gitignore::{Gitignore, GitignoreBuilder};

use crate::error::Result;

/// Decides which source files take part in syncing
///
/// A path is included when it matches the allowlist (or the allowlist is
/// empty) and does not match any ignore pattern. Paths are relative to the
/// source directory.
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    allow: Option<Gitignore>,
    deny: Option<Gitignore>,
}

impl PatternMatcher {
    /// Build a matcher from allowlist and ignore patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any pattern is invalid.
    pub fn with_patterns(include_patterns: &[String], ignore_patterns: &[String]) -> Result<Self> {
        Ok(Self {
            allow: Self::build(include_patterns, "include")?,
            deny: Self::build(ignore_patterns, "ignore")?,
        })
    }

    fn build(patterns: &[String], kind: &str) -> Result<Option<Gitignore>> {
        if patterns.is_empty() {
            return Ok(None);
        }

        let mut builder = GitignoreBuilder::new("");
        for pattern in patterns {
            builder
                .add_line(None, pattern)
                .with_context(|| format!("Invalid {kind} pattern: '{pattern}'"))?;
        }
        let gitignore = builder
            .build()
            .with_context(|| format!("Failed to compile {kind} patterns"))?;
        Ok(Some(gitignore))
    }

    /// Check if a path should be synced
    #[must_use]
    pub fn should_include(&self, path: &Path, is_dir: bool) -> bool {
        let allowed = self
            .allow
            .as_ref()
            .is_none_or(|gi| gi.matched(path, is_dir).is_ignore());
        let denied = self
            .deny
            .as_ref()
            .is_some_and(|gi| gi.matched(path, is_dir).is_ignore());
        allowed && !denied
    }
}
