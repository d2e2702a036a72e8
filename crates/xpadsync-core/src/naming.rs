//! Destination filename derivation
//!
//! Names look like `xpad_note_<slug>_<timestamp>_<suffix>.<ext>`:
//!
//! - `slug`: the source base name with runs of non-alphanumeric characters
//!   collapsed to `_`, capped at `slug_max_length` characters
//! - `timestamp`: the note's creation time in UTC, formatted so names sort
//!   chronologically
//! - `suffix`: a short digest of the source path, so two notes with the same
//!   base name created in the same second still get distinct names
//! - `ext`: the source extension, or the configured default when there is none
//!
//! A derived name depends only on the source path and its creation time, so it
//! is the same on every run. Once chosen it is recorded in the journal and
//! reused for every later update of that note.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::fingerprint::Fingerprint;

/// Length of the path digest suffix
const SUFFIX_LEN: usize = 8;

/// Slug used when the base name has no alphanumeric characters
const UNTITLED: &str = "untitled";

/// Settings that shape destination names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPolicy {
    /// Leading prefix, e.g. `xpad_note_`
    pub prefix: String,
    /// `strftime` format for the creation timestamp
    pub timestamp_format: String,
    /// Maximum slug length in characters
    pub slug_max_length: usize,
    /// Extension used for sources without one
    pub default_extension: String,
}

impl Default for NamingPolicy {
    fn default() -> Self {
        Self {
            prefix: "xpad_note_".to_string(),
            timestamp_format: "%Y%m%d_%H%M%S".to_string(),
            slug_max_length: 50,
            default_extension: "txt".to_string(),
        }
    }
}

impl NamingPolicy {
    /// Derive the destination name for a source file
    #[must_use]
    pub fn derive_name(&self, source_path: &Path, created_at: DateTime<Utc>) -> String {
        let stem = source_path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        let slug = self.slugify(&stem);
        let timestamp = created_at.format(&self.timestamp_format);
        let suffix =
            Fingerprint::of(source_path.as_os_str().as_encoded_bytes()).short(SUFFIX_LEN);

        format!(
            "{}{slug}_{timestamp}_{suffix}.{}",
            self.prefix,
            self.extension_for(source_path)
        )
    }

    /// Whether `name` could have been derived for `source_path` at some
    /// creation time
    ///
    /// Matches on prefix, slug, path digest suffix, and extension while
    /// ignoring the timestamp, so an output file written for a note whose
    /// birth time has since changed is still recognized.
    #[must_use]
    pub fn is_derived_from(&self, name: &str, source_path: &Path) -> bool {
        let stem = source_path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        let head = format!("{}{}_", self.prefix, self.slugify(&stem));
        let tail = format!(
            "_{}.{}",
            Fingerprint::of(source_path.as_os_str().as_encoded_bytes()).short(SUFFIX_LEN),
            self.extension_for(source_path)
        );

        name.len() > head.len() + tail.len() && name.starts_with(&head) && name.ends_with(&tail)
    }

    /// Pick a name that no other note claims
    ///
    /// Returns `candidate` unchanged when it is free; otherwise appends `_2`,
    /// `_3`, ... before the extension until a free name is found. The second
    /// element reports whether disambiguation was needed.
    #[must_use]
    pub fn disambiguate(candidate: &str, taken: &HashSet<String>) -> (String, bool) {
        if !taken.contains(candidate) {
            return (candidate.to_string(), false);
        }

        let (base, ext) = match candidate.rsplit_once('.') {
            Some((base, ext)) => (base, Some(ext)),
            None => (candidate, None),
        };

        let mut n = 2usize;
        loop {
            let name = match ext {
                Some(ext) => format!("{base}_{n}.{ext}"),
                None => format!("{base}_{n}"),
            };
            if !taken.contains(&name) {
                return (name, true);
            }
            n += 1;
        }
    }

    /// Sanitize a base name into a filename-safe slug
    #[must_use]
    pub fn slugify(&self, name: &str) -> String {
        let mut slug = String::with_capacity(name.len());
        let mut pending_separator = false;

        for c in name.chars() {
            if c.is_alphanumeric() {
                if pending_separator && !slug.is_empty() {
                    slug.push('_');
                }
                pending_separator = false;
                slug.push(c);
            } else {
                pending_separator = true;
            }
        }

        let capped: String = slug.chars().take(self.slug_max_length).collect();
        let capped = capped.trim_end_matches('_');

        if capped.is_empty() {
            UNTITLED.to_string()
        } else {
            capped.to_string()
        }
    }

    fn extension_for(&self, source_path: &Path) -> String {
        source_path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .filter(|e| !e.is_empty())
            .unwrap_or_else(|| self.default_extension.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap()
    }

    #[test]
    fn test_derive_name_shape() {
        let policy = NamingPolicy::default();
        let name = policy.derive_name(Path::new("/home/u/notes/today.md"), created());

        assert!(name.starts_with("xpad_note_today_20260314_092653_"));
        assert!(name.ends_with(".md"));
        // prefix + slug + ts + suffix + ext
        assert_eq!(name.len(), "xpad_note_today_20260314_092653_".len() + 8 + 3);
    }

    #[test]
    fn test_derive_name_is_stable() {
        let policy = NamingPolicy::default();
        let path = Path::new("/home/u/.config/xpad/content-A1B2C3");

        let first = policy.derive_name(path, created());
        let second = policy.derive_name(path, created());

        assert_eq!(first, second);
    }

    #[test]
    fn test_same_stem_different_dirs_differ() {
        let policy = NamingPolicy::default();
        let a = policy.derive_name(Path::new("/a/today.md"), created());
        let b = policy.derive_name(Path::new("/b/today.md"), created());

        assert_ne!(a, b);
    }

    #[test]
    fn test_extensionless_source_uses_default() {
        let policy = NamingPolicy::default();
        let name = policy.derive_name(Path::new("/x/content-XYZ"), created());

        assert!(name.starts_with("xpad_note_content_XYZ_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn test_slugify_collapses_and_caps() {
        let policy = NamingPolicy {
            slug_max_length: 10,
            ..NamingPolicy::default()
        };

        assert_eq!(policy.slugify("a  b--c!!d"), "a_b_c_d");
        assert_eq!(policy.slugify("__leading and trailing__"), "leading_an");
        assert_eq!(policy.slugify("!!!"), "untitled");
        assert_eq!(policy.slugify("abcdefghij_k"), "abcdefghij");
        assert_eq!(policy.slugify("abcdefghi_k"), "abcdefghi");
    }

    #[test]
    fn test_slugify_keeps_unicode_letters() {
        let policy = NamingPolicy::default();
        assert_eq!(policy.slugify("café notes"), "café_notes");
    }

    #[test]
    fn test_custom_prefix_and_format() {
        let policy = NamingPolicy {
            prefix: "note-".to_string(),
            timestamp_format: "%Y-%m-%d".to_string(),
            ..NamingPolicy::default()
        };
        let name = policy.derive_name(Path::new("/n/idea.txt"), created());

        assert!(name.starts_with("note-idea_2026-03-14_"));
    }

    #[test]
    fn test_is_derived_from_ignores_timestamp() {
        let policy = NamingPolicy::default();
        let path = Path::new("/n/today.md");
        let earlier = policy.derive_name(path, created());
        let later = policy.derive_name(path, created() + chrono::Duration::seconds(90));

        assert_ne!(earlier, later);
        assert!(policy.is_derived_from(&earlier, path));
        assert!(policy.is_derived_from(&later, path));
        assert!(!policy.is_derived_from(&earlier, Path::new("/m/today.md")));
        assert!(!policy.is_derived_from(&earlier, Path::new("/n/today.txt")));
        assert!(!policy.is_derived_from("xpad_note_today_.md", path));
    }

    #[test]
    fn test_disambiguate_free_name() {
        let taken = HashSet::new();
        let (name, changed) = NamingPolicy::disambiguate("a.md", &taken);
        assert_eq!(name, "a.md");
        assert!(!changed);
    }

    #[test]
    fn test_disambiguate_appends_counter() {
        let taken: HashSet<String> = ["a.md", "a_2.md"].iter().map(|s| s.to_string()).collect();
        let (name, changed) = NamingPolicy::disambiguate("a.md", &taken);
        assert_eq!(name, "a_3.md");
        assert!(changed);
    }

    #[test]
    fn test_disambiguate_without_extension() {
        let taken: HashSet<String> = ["plain".to_string()].into_iter().collect();
        let (name, _) = NamingPolicy::disambiguate("plain", &taken);
        assert_eq!(name, "plain_2");
    }
}
