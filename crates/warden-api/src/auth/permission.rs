// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Compiled permission patterns and the per-request capability set.
//!
//! Path pattern syntax:
//!
//! | Pattern | Matches |
//! |---------|---------|
//! | `/api/v1/user/list` | exactly that path |
//! | `/api/v1/user/{id}` | `{id}` matches one non-empty segment |
//! | `/api/v1/user/*` | `/api/v1/user` and everything below it |
//!
//! A method of `*` matches any method. Trailing slashes are ignored on both
//! sides.

use std::collections::HashSet;
use std::fmt;

use warden_core::Permission;

// =============================================================================
// PathPattern
// =============================================================================

/// One segment of a templated path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must match verbatim.
    Literal(String),
    /// Matches any non-empty segment.
    Param,
}

/// A compiled path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Literal path.
    Exact(String),
    /// Path with `{param}` placeholders.
    Template(Vec<Segment>),
    /// Prefix match; stores the prefix without the trailing `/*`.
    Prefix(String),
}

impl PathPattern {
    /// Compiles a pattern string.
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" || pattern == "/*" {
            return PathPattern::Prefix(String::new());
        }
        if let Some(prefix) = pattern.strip_suffix("/*") {
            return PathPattern::Prefix(normalize(prefix).to_string());
        }

        let normalized = normalize(pattern);
        let segments: Vec<Segment> = split(normalized)
            .map(|s| {
                if s.len() > 2 && s.starts_with('{') && s.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();

        if segments.iter().all(|s| matches!(s, Segment::Literal(_))) {
            return PathPattern::Exact(normalized.to_string());
        }

        PathPattern::Template(segments)
    }

    /// Returns `true` if `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        match self {
            PathPattern::Exact(exact) => exact == path,
            PathPattern::Prefix(prefix) => {
                path == prefix
                    || (path.starts_with(prefix.as_str())
                        && path[prefix.len()..].starts_with('/'))
            }
            PathPattern::Template(segments) => {
                let mut parts = split(path);
                for segment in segments {
                    match (segment, parts.next()) {
                        (Segment::Param, Some(part)) if !part.is_empty() => {}
                        (Segment::Literal(literal), Some(part)) if part == literal => {}
                        _ => return false,
                    }
                }
                parts.next().is_none()
            }
        }
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

fn split(path: &str) -> impl Iterator<Item = &str> {
    path.strip_prefix('/').unwrap_or(path).split('/')
}

// =============================================================================
// ApiGrant
// =============================================================================

/// A compiled `Permission::Api`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiGrant {
    method: String,
    raw_path: String,
    pattern: PathPattern,
}

impl ApiGrant {
    /// Compiles a method and path pattern.
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            raw_path: path.to_string(),
            pattern: PathPattern::parse(path),
        }
    }

    /// Returns `true` if this grant covers the request.
    pub fn matches(&self, method: &str, path: &str) -> bool {
        (self.method == "*" || self.method.eq_ignore_ascii_case(method))
            && self.pattern.matches(path)
    }

    /// Granted method.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Pattern as written.
    pub fn path(&self) -> &str {
        &self.raw_path
    }
}

impl fmt::Display for ApiGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.raw_path)
    }
}

// =============================================================================
// Permission Set
// =============================================================================

/// The union of a principal's role permissions, compiled once per request.
#[derive(Debug, Clone, Default)]
pub struct PermissionSet {
    apis: Vec<ApiGrant>,
    seen: HashSet<(String, String)>,
    actions: HashSet<String>,
}

impl PermissionSet {
    /// Creates an empty permission set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a permission set from a list of permissions.
    pub fn from_permissions<'a>(permissions: impl IntoIterator<Item = &'a Permission>) -> Self {
        let mut set = Self::new();
        for permission in permissions {
            set.add(permission);
        }
        set
    }

    /// Adds a permission to the set. Duplicates are ignored.
    pub fn add(&mut self, permission: &Permission) {
        match permission {
            Permission::Api { method, path } => {
                let key = (method.to_ascii_uppercase(), path.clone());
                if self.seen.insert(key) {
                    self.apis.push(ApiGrant::new(method, path));
                }
            }
            Permission::Action { name } => {
                self.actions.insert(name.clone());
            }
        }
    }

    /// Returns `true` if any API grant matches. Any match grants.
    pub fn allows(&self, method: &str, path: &str) -> bool {
        self.apis.iter().any(|grant| grant.matches(method, path))
    }

    /// Returns `true` if the set carries the named action.
    pub fn can(&self, action: &str) -> bool {
        self.actions.contains(action)
    }

    /// Returns the compiled API grants.
    pub fn api_grants(&self) -> &[ApiGrant] {
        &self.apis
    }

    /// Returns the number of grants in the set.
    pub fn len(&self) -> usize {
        self.apis.len() + self.actions.len()
    }

    /// Returns `true` if the set is empty.
    pub fn is_empty(&self) -> bool {
        self.apis.is_empty() && self.actions.is_empty()
    }

    /// Merges another permission set into this one.
    pub fn merge(&mut self, other: &PermissionSet) {
        for grant in &other.apis {
            let key = (grant.method.clone(), grant.raw_path.clone());
            if self.seen.insert(key) {
                self.apis.push(grant.clone());
            }
        }
        self.actions.extend(other.actions.iter().cloned());
    }
}

impl<'a> FromIterator<&'a Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = &'a Permission>>(iter: I) -> Self {
        Self::from_permissions(iter)
    }
}

// =============================================================================
// Tests
// =============================================================================
