//! Path pattern trie.
//!
//! Patterns are `/`-separated segments. A segment is either static text,
//! a `:name` parameter matching exactly one request segment, or a final
//! `*name` catch-all matching one or more remaining segments. Lookup prefers
//! static segments over parameters and parameters over catch-alls, falling
//! back to the less specific alternative when the more specific branch
//! cannot complete the match.
//!
//! Empty segments are ignored, so `/blog/`, `/blog` and `//blog` are the
//! same path.

use std::collections::BTreeMap;

use crate::core::GrowError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment<'a> {
    Static(&'a str),
    Param(&'a str),
    CatchAll(&'a str),
}

fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

fn parse_pattern(pattern: &str) -> Result<Vec<Segment<'_>>, GrowError> {
    let invalid = |reason: &str| GrowError::InvalidRoute {
        pattern: pattern.to_string(),
        reason: reason.to_string(),
    };

    if !pattern.starts_with('/') {
        return Err(invalid("pattern must start with '/'"));
    }

    let raw: Vec<&str> = segments(pattern).collect();
    let mut parsed = Vec::with_capacity(raw.len());
    for (index, segment) in raw.iter().copied().enumerate() {
        if let Some(name) = segment.strip_prefix(':') {
            if name.is_empty() {
                return Err(invalid("parameter segment needs a name"));
            }
            parsed.push(Segment::Param(name));
        } else if let Some(name) = segment.strip_prefix('*') {
            if name.is_empty() {
                return Err(invalid("catch-all segment needs a name"));
            }
            if index + 1 != raw.len() {
                return Err(invalid("catch-all segment must be last"));
            }
            parsed.push(Segment::CatchAll(name));
        } else {
            parsed.push(Segment::Static(segment));
        }
    }
    Ok(parsed)
}

/// Names of the parameters (and catch-all) declared by `pattern`, in order.
pub fn parameter_names(pattern: &str) -> Result<Vec<String>, GrowError> {
    Ok(parse_pattern(pattern)?
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Param(name) | Segment::CatchAll(name) => Some(name.to_string()),
            Segment::Static(_) => None,
        })
        .collect())
}

/// Build a concrete path from `pattern` by substituting `params`.
///
/// Returns `None` when a parameter has no value or a value would change the
/// path's shape (a `/` in a `:param` value, or an empty value).
pub fn expand(pattern: &str, params: &[(&str, &str)]) -> Option<String> {
    let lookup = |name: &str| params.iter().find(|(k, _)| *k == name).map(|(_, v)| *v);
    let mut path = String::new();
    for segment in parse_pattern(pattern).ok()? {
        path.push('/');
        match segment {
            Segment::Static(text) => path.push_str(text),
            Segment::Param(name) => {
                let value = lookup(name)?;
                if value.is_empty() || value.contains('/') {
                    return None;
                }
                path.push_str(value);
            }
            Segment::CatchAll(name) => {
                let value = lookup(name)?.trim_matches('/');
                if value.is_empty() {
                    return None;
                }
                path.push_str(value);
            }
        }
    }
    if path.is_empty() {
        path.push('/');
    }
    Some(path)
}

/// Parameters captured by a match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A successful lookup.
#[derive(Debug)]
pub struct Match<'a, T> {
    pub value: &'a T,
    pub params: Params,
}

/// Pattern trie with values attached to complete patterns.
#[derive(Debug)]
pub struct Trie<T> {
    root: Node<T>,
    len: usize,
}

#[derive(Debug)]
struct Node<T> {
    value: Option<T>,
    statics: BTreeMap<String, Node<T>>,
    param: Option<(String, Box<Node<T>>)>,
    catch_all: Option<(String, T)>,
}

impl<T> Default for Node<T> {
    fn default() -> Self {
        Self {
            value: None,
            statics: BTreeMap::new(),
            param: None,
            catch_all: None,
        }
    }
}

impl<T> Default for Trie<T> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            len: 0,
        }
    }
}

impl<T> Trie<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Register `value` under `pattern`.
    ///
    /// Returns `Ok(false)` without replacing anything when the pattern is
    /// already registered. Two parameters with different names at the same
    /// position are an [`GrowError::InvalidRoute`].
    pub fn define(&mut self, pattern: &str, value: T) -> Result<bool, GrowError> {
        let parsed = parse_pattern(pattern)?;
        let mut node = &mut self.root;

        for segment in parsed {
            match segment {
                Segment::Static(text) => {
                    node = node.statics.entry(text.to_string()).or_default();
                }
                Segment::Param(name) => {
                    let (existing, child) =
                        node.param.get_or_insert_with(|| (name.to_string(), Box::default()));
                    if existing.as_str() != name {
                        return Err(GrowError::InvalidRoute {
                            pattern: pattern.to_string(),
                            reason: format!("parameter `:{name}` conflicts with `:{existing}` at the same position"),
                        });
                    }
                    node = &mut **child;
                }
                Segment::CatchAll(name) => {
                    if node.catch_all.is_some() {
                        return Ok(false);
                    }
                    node.catch_all = Some((name.to_string(), value));
                    self.len += 1;
                    return Ok(true);
                }
            }
        }

        if node.value.is_some() {
            return Ok(false);
        }
        node.value = Some(value);
        self.len += 1;
        Ok(true)
    }

    /// Find the most specific pattern matching `path`.
    pub fn at(&self, path: &str) -> Option<Match<'_, T>> {
        let parts: Vec<&str> = segments(path).collect();
        let mut captured = Vec::new();
        let value = self.root.lookup(&parts, &mut captured)?;
        Some(Match {
            value,
            params: Params {
                entries: captured,
            },
        })
    }
}

impl<T> Node<T> {
    fn lookup<'a>(&'a self, parts: &[&str], captured: &mut Vec<(String, String)>) -> Option<&'a T> {
        let Some((head, rest)) = parts.split_first() else {
            return self.value.as_ref();
        };

        if let Some(child) = self.statics.get(*head) {
            if let Some(value) = child.lookup(rest, captured) {
                return Some(value);
            }
        }

        if let Some((name, child)) = &self.param {
            captured.push((name.clone(), (*head).to_string()));
            if let Some(value) = child.lookup(rest, captured) {
                return Some(value);
            }
            captured.pop();
        }

        if let Some((name, value)) = &self.catch_all {
            captured.push((name.clone(), parts.join("/")));
            return Some(value);
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie(patterns: &[&str]) -> Trie<String> {
        let mut trie = Trie::new();
        for pattern in patterns {
            assert!(trie.define(pattern, pattern.to_string()).unwrap());
        }
        trie
    }

    #[test]
    fn test_static_and_param_match() {
        let trie = trie(&["/", "/about", "/blog/:base"]);

        assert_eq!(trie.at("/").unwrap().value, "/");
        assert_eq!(trie.at("/about/").unwrap().value, "/about");

        let m = trie.at("/blog/hello").unwrap();
        assert_eq!(m.value, "/blog/:base");
        assert_eq!(m.params.get("base"), Some("hello"));

        assert!(trie.at("/blog").is_none());
        assert!(trie.at("/blog/hello/extra").is_none());
        assert!(trie.at("/nonexistent").is_none());
    }

    #[test]
    fn test_static_beats_param_with_backtracking() {
        let trie = trie(&["/blog/archive", "/blog/:base", "/blog/:base/comments"]);

        assert_eq!(trie.at("/blog/archive").unwrap().value, "/blog/archive");

        // static `archive` branch cannot finish, the parameter branch can
        let m = trie.at("/blog/archive/comments").unwrap();
        assert_eq!(m.value, "/blog/:base/comments");
        assert_eq!(m.params.get("base"), Some("archive"));

        let m = trie.at("/blog/post/comments").unwrap();
        assert_eq!(m.value, "/blog/:base/comments");
        assert_eq!(m.params.get("base"), Some("post"));
    }

    #[test]
    fn test_catch_all_is_least_specific() {
        let trie = trie(&["/static/*file", "/static/robots.txt"]);

        assert_eq!(trie.at("/static/robots.txt").unwrap().value, "/static/robots.txt");
        let m = trie.at("/static/img/logo.png").unwrap();
        assert_eq!(m.value, "/static/*file");
        assert_eq!(m.params.get("file"), Some("img/logo.png"));
        assert!(trie.at("/static").is_none());
    }

    #[test]
    fn test_duplicate_pattern_keeps_first() {
        let mut trie = Trie::new();
        assert!(trie.define("/a/:x", 1).unwrap());
        assert!(!trie.define("/a/:x", 2).unwrap());
        assert_eq!(*trie.at("/a/b").unwrap().value, 1);
        assert_eq!(trie.len(), 1);
    }

    #[test]
    fn test_invalid_patterns() {
        let mut trie = Trie::new();
        assert!(trie.define("blog", 0).is_err());
        assert!(trie.define("/a/:", 0).is_err());
        assert!(trie.define("/a/*rest/b", 0).is_err());
        trie.define("/a/:x", 0).unwrap();
        assert!(matches!(trie.define("/a/:y/b", 0), Err(GrowError::InvalidRoute { .. })));
    }

    #[test]
    fn test_expand_and_parameter_names() {
        assert_eq!(parameter_names("/blog/:base/*rest").unwrap(), vec!["base", "rest"]);
        assert_eq!(expand("/blog/:base", &[("base", "hello")]).as_deref(), Some("/blog/hello"));
        assert_eq!(expand("/", &[]).as_deref(), Some("/"));
        assert_eq!(expand("/blog/:base", &[]), None);
        assert_eq!(expand("/blog/:base", &[("base", "a/b")]), None);
    }
}
