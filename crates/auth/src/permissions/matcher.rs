//! Permission pattern compilation and matching
//!
//! A pattern is a dotted node that may contain `*` wildcards. `*` matches any
//! run of characters, dots included, and may be empty. Everything else is a
//! literal. Matching is anchored at both ends and case-sensitive.
//!
//! | Pattern          | Matches                          | Does not match   |
//! |------------------|----------------------------------|------------------|
//! | `*`              | every node                       |                  |
//! | `admin.*`        | `admin.ban`, `admin.ban.temp`    | `admin`          |
//! | `admin.ban.temp` | `admin.ban.temp`                 | `admin.ban`      |
//! | `*.reload`       | `srv.reload`, `a.b.reload`       | `srv.reloaded`   |

use std::fmt;

use regex::Regex;

use crate::error::{PermissionError, PermissionResult};

/// Wildcard metacharacter
pub const WILDCARD: char = '*';

/// Pattern that grants every node
pub const WILDCARD_ALL: &str = "*";

/// Characters outside the pattern grammar; patterns containing them are rejected
pub const RESERVED_CHARS: &[char] = &['\\', '^', '$', '|', '?', '+', '(', ')', '[', ']', '{', '}'];

#[derive(Clone)]
enum Matcher {
    /// `*`
    Any,
    /// No wildcard: plain string equality
    Exact,
    /// `prefix*` with no other wildcard
    Prefix(String),
    /// Anything else
    Glob(Regex),
}

/// A compiled permission pattern
///
/// Immutable after compilation. Equality and hashing use the source string.
#[derive(Clone)]
pub struct PermissionPattern {
    source: String,
    matcher: Matcher,
}

impl PermissionPattern {
    /// Compile a pattern
    ///
    /// Fails with [`PermissionError::InvalidPattern`] for the empty string and
    /// for patterns containing any of [`RESERVED_CHARS`].
    pub fn compile(pattern: &str) -> PermissionResult<Self> {
        if pattern.is_empty() {
            return Err(invalid(pattern, "pattern is empty"));
        }

        if let Some(c) = pattern.chars().find(|c| RESERVED_CHARS.contains(c)) {
            return Err(invalid(pattern, format!("reserved character '{}'", c)));
        }

        let wildcards = pattern.matches(WILDCARD).count();
        let matcher = if pattern == WILDCARD_ALL {
            Matcher::Any
        } else if wildcards == 0 {
            Matcher::Exact
        } else if wildcards == 1 && pattern.ends_with(WILDCARD) {
            Matcher::Prefix(pattern[..pattern.len() - 1].to_string())
        } else {
            let mut expr = String::with_capacity(pattern.len() * 2 + 8);
            expr.push_str("(?s)^");
            for (i, literal) in pattern.split(WILDCARD).enumerate() {
                if i > 0 {
                    expr.push_str(".*");
                }
                expr.push_str(&regex::escape(literal));
            }
            expr.push('$');
            let re = Regex::new(&expr).map_err(|e| invalid(pattern, e.to_string()))?;
            Matcher::Glob(re)
        };

        Ok(Self {
            source: pattern.to_string(),
            matcher,
        })
    }

    /// The original pattern string
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Check whether `node` is granted by this pattern
    pub fn matches(&self, node: &str) -> bool {
        match &self.matcher {
            Matcher::Any => true,
            Matcher::Exact => self.source == node,
            Matcher::Prefix(prefix) => node.starts_with(prefix.as_str()),
            Matcher::Glob(re) => re.is_match(node),
        }
    }

    /// Returns true if the pattern contains a wildcard
    pub fn is_wildcard(&self) -> bool {
        !matches!(self.matcher, Matcher::Exact)
    }
}

fn invalid(pattern: &str, reason: impl Into<String>) -> PermissionError {
    PermissionError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: reason.into(),
    }
}

impl PartialEq for PermissionPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for PermissionPattern {}

impl std::hash::Hash for PermissionPattern {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}

impl fmt::Debug for PermissionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PermissionPattern").field(&self.source).finish()
    }
}

impl fmt::Display for PermissionPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(p: &str) -> PermissionPattern {
        PermissionPattern::compile(p).unwrap()
    }

    #[test]
    fn test_wildcard_all() {
        let p = compile("*");
        assert!(p.matches("admin.ban"));
        assert!(p.matches("anything.at.all"));
        assert!(p.matches(""));
    }

    #[test]
    fn test_exact() {
        let p = compile("admin.ban.temp");
        assert!(p.matches("admin.ban.temp"));
        assert!(!p.matches("admin.ban"));
        assert!(!p.matches("admin.ban.temp.x"));
        assert!(!p.is_wildcard());
    }

    #[test]
    fn test_dotted_prefix() {
        let p = compile("admin.kick.*");
        assert!(p.matches("admin.kick.temp"));
        assert!(p.matches("admin.kick.temp.long"));
        assert!(p.matches("admin.kick."));
        assert!(!p.matches("admin.kick"));
        assert!(!p.matches("admin.ban"));
    }

    #[test]
    fn test_dot_is_literal() {
        let p = compile("admin.*.temp");
        assert!(p.matches("admin.ban.temp"));
        assert!(p.matches("admin.ban.perm.temp"));
        assert!(!p.matches("adminXbanXtemp"));

        let exact = compile("a.b");
        assert!(!exact.matches("axb"));
    }

    #[test]
    fn test_leading_and_multiple_wildcards() {
        let p = compile("*.reload");
        assert!(p.matches("srv.reload"));
        assert!(!p.matches("srv.reloaded"));

        let p = compile("a*b*c");
        assert!(p.matches("abc"));
        assert!(p.matches("a.x.b.y.c"));
        assert!(!p.matches("a.x.c"));
    }

    #[test]
    fn test_case_sensitive() {
        let p = compile("admin.*");
        assert!(!p.matches("Admin.ban"));
    }

    #[test]
    fn test_rejects_empty_and_reserved() {
        assert!(matches!(
            PermissionPattern::compile(""),
            Err(PermissionError::InvalidPattern { .. })
        ));
        for bad in ["admin.(ban)", "a+", "a?", "x|y", "[abc]", "a\\b", "^a", "a$", "a{2}"] {
            assert!(
                matches!(
                    PermissionPattern::compile(bad),
                    Err(PermissionError::InvalidPattern { .. })
                ),
                "{} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_matching_is_stable() {
        let p = compile("srv.*.kick");
        let first = p.matches("srv.admin.kick");
        for _ in 0..10 {
            assert_eq!(p.matches("srv.admin.kick"), first);
        }
    }

    #[test]
    fn test_equality_by_source() {
        assert_eq!(compile("admin.*"), compile("admin.*"));
        assert_ne!(compile("admin.*"), compile("admin.**"));
        assert_eq!(compile("admin.*").to_string(), "admin.*");
    }
}
