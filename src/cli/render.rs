//! Terminal rendering of the forest with `termtree`.
//!
//! Highlighting uses the spans computed by the search engine; nothing here
//! searches on its own.

use std::collections::BTreeSet;

use colored::Colorize;
use termtree::Tree;

use crate::domain::{Department, NodeId, OrgArena, SearchField, SearchOutcome, Status};

/// What to show and what to expand.
pub struct TreeView<'a> {
    arena: &'a OrgArena,
    outcome: &'a SearchOutcome,
    expanded: &'a BTreeSet<NodeId>,
    expand_all: bool,
}

impl<'a> TreeView<'a> {
    pub fn new(
        arena: &'a OrgArena,
        outcome: &'a SearchOutcome,
        expanded: &'a BTreeSet<NodeId>,
    ) -> Self {
        Self {
            arena,
            outcome,
            expanded,
            expand_all: false,
        }
    }

    pub fn expand_all(mut self, expand_all: bool) -> Self {
        self.expand_all = expand_all;
        self
    }

    /// One tree per visible root.
    pub fn render(&self) -> Vec<Tree<String>> {
        self.outcome
            .visible_roots
            .iter()
            .filter_map(|id| self.arena.find_by_id(id))
            .map(|root| self.build(root))
            .collect()
    }

    fn build(&self, node: &Department) -> Tree<String> {
        let open = self.expand_all || self.expanded.contains(&node.id);
        let mut label = self.label(node);
        if !open && !node.children.is_empty() {
            let hidden = self.arena.descendants(&node.id).len();
            label.push_str(&format!(" {}", format!("[+{hidden}]").dimmed()));
        }

        let mut tree = Tree::new(label);
        if open {
            for child in self.arena.children(&node.id) {
                tree.push(self.build(child));
            }
        }
        tree
    }

    fn label(&self, node: &Department) -> String {
        let span = |field: SearchField| {
            self.outcome
                .spans(&node.id)
                .iter()
                .find(|m| m.field == field)
                .map(|m| (m.start, m.end))
        };

        let mut label = format!(
            "{} ({})",
            highlight(&node.name, span(SearchField::Name)),
            highlight(&node.code, span(SearchField::Code))
        );
        if !node.manager_name.is_empty() {
            label.push_str(&format!(
                " · {}",
                highlight(&node.manager_name, span(SearchField::ManagerName))
            ));
        }
        label.push_str(&format!(" · {} members", node.member_count));
        if node.status == Status::Disabled {
            label.push_str(&format!(" {}", "[disabled]".dimmed()));
        }
        label
    }
}

/// Wrap `text[start..end]` in highlight styling.
pub fn highlight(text: &str, span: Option<(usize, usize)>) -> String {
    match span {
        Some((start, end)) if start < end && text.get(start..end).is_some() => format!(
            "{}{}{}",
            &text[..start],
            text[start..end].yellow().bold(),
            &text[end..]
        ),
        _ => text.to_string(),
    }
}
