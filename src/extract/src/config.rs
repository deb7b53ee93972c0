// Copyright Materialize, Inc. and contributors. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use rexa_expr::RECURSION_LIMIT;
use serde::{Deserialize, Serialize};

/// Knobs that control the analyses.
///
/// The default configuration reproduces the established behavior of every
/// analysis. Deserialization fills absent fields with their defaults.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Maximum nesting depth of any tree walk.
    pub recursion_limit: usize,
    /// Upper bound on the size of the CNF a normalizer may produce, forwarded
    /// to [`ConjunctiveNormalizer::to_cnf`](crate::ConjunctiveNormalizer::to_cnf).
    pub max_cnf_node_count: Option<usize>,
    /// How an accepted nested path decides whether it covers another one.
    pub nested_path_matching: PathMatching,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        ExtractConfig {
            recursion_limit: RECURSION_LIMIT,
            max_cnf_node_count: None,
            nested_path_matching: PathMatching::default(),
        }
    }
}

/// The containment test between nested field paths.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathMatching {
    /// `prefix` covers `path` if `path` starts with the string `prefix`.
    ///
    /// This is not aware of path segments: `a.b` covers `a.bc`.
    #[default]
    StringPrefix,
    /// `prefix` covers `path` if `path` is `prefix` or continues it with a
    /// `.`-separated segment.
    Segment,
}

impl PathMatching {
    /// Whether an access to `prefix` already covers an access to `path`.
    pub fn covers(&self, prefix: &str, path: &str) -> bool {
        match self {
            PathMatching::StringPrefix => path.starts_with(prefix),
            PathMatching::Segment => match path.strip_prefix(prefix) {
                Some(rest) => rest.is_empty() || rest.starts_with('.'),
                None => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_covers() {
        assert!(PathMatching::StringPrefix.covers("a.b", "a.b.c"));
        assert!(PathMatching::StringPrefix.covers("a.b", "a.bc"));
        assert!(PathMatching::StringPrefix.covers("a.b", "a.b"));
        assert!(!PathMatching::StringPrefix.covers("a.b", "a"));

        assert!(PathMatching::Segment.covers("a.b", "a.b.c"));
        assert!(!PathMatching::Segment.covers("a.b", "a.bc"));
        assert!(PathMatching::Segment.covers("a.b", "a.b"));
        assert!(!PathMatching::Segment.covers("a.b", "a"));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ExtractConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, ExtractConfig::default());

        let config: ExtractConfig =
            serde_json::from_str(r#"{"max_cnf_node_count": 64, "nested_path_matching": "segment"}"#)
                .unwrap();
        assert_eq!(config.recursion_limit, RECURSION_LIMIT);
        assert_eq!(config.max_cnf_node_count, Some(64));
        assert_eq!(config.nested_path_matching, PathMatching::Segment);
    }
}
