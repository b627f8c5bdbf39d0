//! Ancestor-aware substring search.
//!
//! One depth-first pass computes the direct matches, which root subtrees
//! contain a match, and the set of ids that must be expanded so every match
//! is reachable.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domain::arena::OrgArena;
use crate::domain::entities::{Department, NodeId};

/// A searchable text field of a department.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchField {
    Name,
    Code,
    ManagerName,
}

impl SearchField {
    pub const ALL: [SearchField; 3] = [SearchField::Name, SearchField::Code, SearchField::ManagerName];

    pub fn value<'a>(&self, node: &'a Department) -> &'a str {
        match self {
            SearchField::Name => &node.name,
            SearchField::Code => &node.code,
            SearchField::ManagerName => &node.manager_name,
        }
    }
}

impl fmt::Display for SearchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchField::Name => f.write_str("name"),
            SearchField::Code => f.write_str("code"),
            SearchField::ManagerName => f.write_str("manager_name"),
        }
    }
}

/// Byte range `[start, end)` of the first occurrence of the query in one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldMatch {
    pub field: SearchField,
    pub start: usize,
    pub end: usize,
}

/// Everything a collaborator needs to filter and expand the tree for a query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    /// The query as given; empty (also for whitespace-only input) means filtering is off
    pub query: String,
    /// Departments whose own fields contain the query
    pub direct_matches: BTreeSet<NodeId>,
    /// Roots whose subtree holds at least one match, in root order
    pub visible_roots: Vec<NodeId>,
    /// Matches plus all of their ancestors
    pub expansion_set: BTreeSet<NodeId>,
    /// Highlight spans per direct match, one per matching field
    pub highlights: BTreeMap<NodeId, Vec<FieldMatch>>,
}

impl SearchOutcome {
    /// Whether a non-empty query is in effect.
    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    pub fn is_match(&self, id: &NodeId) -> bool {
        self.direct_matches.contains(id)
    }

    pub fn spans(&self, id: &NodeId) -> &[FieldMatch] {
        self.highlights.get(id).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Case-insensitive substring search over a chosen set of fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEngine {
    fields: Vec<SearchField>,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new(SearchField::ALL.to_vec())
    }
}

impl SearchEngine {
    /// Search only `fields`; duplicates are ignored.
    pub fn new(mut fields: Vec<SearchField>) -> Self {
        fields.sort();
        fields.dedup();
        Self { fields }
    }

    pub fn fields(&self) -> &[SearchField] {
        &self.fields
    }

    /// Run `query` against the whole forest.
    ///
    /// Whitespace-only queries behave as empty; any other query is matched
    /// exactly as given, surrounding spaces included.
    #[instrument(level = "debug", skip(self, arena))]
    pub fn search(&self, arena: &OrgArena, query: &str) -> SearchOutcome {
        if query.trim().is_empty() {
            return SearchOutcome {
                visible_roots: arena.root_ids().to_vec(),
                ..SearchOutcome::default()
            };
        }

        let mut outcome = SearchOutcome {
            query: query.to_string(),
            ..SearchOutcome::default()
        };
        let needle = fold_case(query);
        let mut chain = Vec::new();
        for root in arena.roots() {
            if self.walk(arena, root, &needle, &mut chain, &mut outcome) {
                outcome.visible_roots.push(root.id.clone());
            }
        }

        debug!(
            "query {:?}: {} matches, {} expanded",
            query,
            outcome.direct_matches.len(),
            outcome.expansion_set.len()
        );
        outcome
    }

    /// Returns whether `node` or anything below it matched.
    fn walk(
        &self,
        arena: &OrgArena,
        node: &Department,
        needle: &str,
        chain: &mut Vec<NodeId>,
        outcome: &mut SearchOutcome,
    ) -> bool {
        let spans = self.field_matches(node, needle);
        let direct = !spans.is_empty();
        if direct {
            outcome.direct_matches.insert(node.id.clone());
            outcome.highlights.insert(node.id.clone(), spans);
        }

        chain.push(node.id.clone());
        let mut below = false;
        for child in arena.children(&node.id) {
            // No short-circuit: every subtree must be visited
            below |= self.walk(arena, child, needle, chain, outcome);
        }
        chain.pop();

        let hit = direct || below;
        if hit {
            outcome.expansion_set.insert(node.id.clone());
            outcome.expansion_set.extend(chain.iter().cloned());
        }
        hit
    }

    /// First occurrence of `needle` (already passed through [`fold_case`]) in each searched field.
    pub fn field_matches(&self, node: &Department, needle: &str) -> Vec<FieldMatch> {
        self.fields
            .iter()
            .filter_map(|&field| {
                find_ignore_case(field.value(node), needle)
                    .map(|(start, end)| FieldMatch { field, start, end })
            })
            .collect()
    }
}

/// Case folding used on both sides of a comparison.
///
/// Lowercases char by char, so the result never depends on the position of a
/// char in the word, and maps final sigma to `σ`.
pub fn fold_case(text: &str) -> String {
    text.chars().flat_map(fold_char).collect()
}

fn fold_char(ch: char) -> impl Iterator<Item = char> {
    ch.to_lowercase().map(|c| if c == 'ς' { 'σ' } else { c })
}

/// Byte range in `haystack` of the first case-insensitive occurrence of `needle`.
///
/// `needle` must already be passed through [`fold_case`]. The range always lies on char
/// boundaries of the original `haystack`, even when lowercasing changes byte
/// lengths.
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return None;
    }

    let mut lowered = String::with_capacity(haystack.len());
    // origin[i]: byte offset in `haystack` of the char that produced lowered byte i
    let mut origin = Vec::with_capacity(haystack.len());
    for (idx, ch) in haystack.char_indices() {
        for lower in fold_char(ch) {
            let before = lowered.len();
            lowered.push(lower);
            origin.resize(origin.len() + (lowered.len() - before), idx);
        }
    }

    let pos = lowered.find(needle)?;
    let start = origin[pos];
    let last = origin[pos + needle.len() - 1];
    let end = last + haystack[last..].chars().next().map_or(0, char::len_utf8);
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("React团队", "react", Some((0, 5)))]
    #[case("前端开发组", "开发", Some((6, 12)))]
    #[case("TECH-001", "h-0", Some((3, 6)))]
    #[case("技术部", "sales", None)]
    #[case("", "a", None)]
    #[case("abc", "", None)]
    #[case("ΟΔΟΣ", "ΟΔΟΣ", Some((0, 8)))]
    #[case("ΟΔΟΣ", "οδος", Some((0, 8)))]
    #[case("οδος", "ΟΔΟΣ", Some((0, 8)))]
    #[case("ΝΕΑ ΟΔΟΣ", "σ ", None)]
    fn given_haystack_when_finding_ignore_case_then_returns_byte_range(
        #[case] haystack: &str,
        #[case] needle: &str,
        #[case] expected: Option<(usize, usize)>,
    ) {
        assert_eq!(find_ignore_case(haystack, &fold_case(needle)), expected);
    }

    #[test]
    fn given_final_sigma_when_folding_then_same_as_medial_sigma() {
        assert_eq!(fold_case("ΟΔΟΣ"), fold_case("οδος"));
        assert_eq!(fold_case("ΟΔΟΣ"), "οδοσ");
    }

    #[test]
    fn given_expanding_lowercase_when_finding_then_range_stays_on_char_boundaries() {
        // 'İ' lowercases to two chars ("i" + combining dot)
        let haystack = "xİy";
        let (start, end) = find_ignore_case(haystack, "i").unwrap();
        assert_eq!(&haystack[start..end], "İ");
    }

    #[test]
    fn given_duplicate_fields_when_building_engine_then_deduplicated() {
        let engine = SearchEngine::new(vec![SearchField::Code, SearchField::Name, SearchField::Code]);
        assert_eq!(engine.fields(), &[SearchField::Name, SearchField::Code]);
    }
}
