//! CST navigation primitives.
//!
//! Everything here is pure and read-only, and depends only on node kind tags
//! and the tree shape. A missing match is `None` or an empty `Vec`.

use std::cmp::Ordering;

use lsp_types::Position;
use tree_sitter::{Node, Point};

use crate::line_index::point_from_position;
use crate::source_file::SourceTree;

/// Check if a node is a comment that should be skipped.
pub fn is_comment(kind: &str) -> bool {
    matches!(kind, "line_comment" | "block_comment")
}

/// All direct children of `node`, anonymous tokens included.
pub fn children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.child_count()).filter_map(move |i| node.child(i))
}

/// Direct named children of `node`.
pub fn named_children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.named_child_count()).filter_map(move |i| node.named_child(i))
}

/// The first direct child of `node` with the given kind.
pub fn first_child_of_kind<'t>(kind: &str, node: Node<'t>) -> Option<Node<'t>> {
    children(node).find(|child| child.kind() == kind)
}

/// Every direct child of `node` whose kind is one of `kinds`.
pub fn children_of_kinds<'t>(kinds: &[&str], node: Node<'t>) -> Vec<Node<'t>> {
    children(node)
        .filter(|child| kinds.contains(&child.kind()))
        .collect()
}

/// Every descendant of `node` (excluding `node`) with the given kind, in pre-order.
pub fn descendants_of_kind<'t>(kind: &str, node: Node<'t>) -> Vec<Node<'t>> {
    let mut found = Vec::new();
    collect_descendants(kind, node, &mut found);
    found
}

fn collect_descendants<'t>(kind: &str, node: Node<'t>, found: &mut Vec<Node<'t>>) {
    for child in children(node) {
        if child.kind() == kind {
            found.push(child);
        }
        collect_descendants(kind, child, found);
    }
}

/// The first node in pre-order (starting with `node` itself) with the given kind.
pub fn first_descendant_or_self_of_kind<'t>(kind: &str, node: Node<'t>) -> Option<Node<'t>> {
    if node.kind() == kind {
        return Some(node);
    }
    children(node).find_map(|child| first_descendant_or_self_of_kind(kind, child))
}

/// Whether `node` is a direct child of the file root.
pub fn is_top_level(node: Node<'_>) -> bool {
    node.parent().is_some_and(|parent| parent.parent().is_none())
}

/// Walk from `node` (inclusive) up the parent chain to the first node of `kind`.
///
/// With `top_level_only`, a match only counts if its parent is the file root,
/// so nested declarations of the same kind are skipped.
pub fn ancestor_of_kind<'t>(kind: &str, node: Node<'t>, top_level_only: bool) -> Option<Node<'t>> {
    let mut current = Some(node);
    while let Some(candidate) = current {
        if candidate.kind() == kind && (!top_level_only || is_top_level(candidate)) {
            return Some(candidate);
        }
        current = candidate.parent();
    }
    None
}

/// Every node of `kind` on the parent chain of `node` (inclusive), innermost first.
pub fn ancestors_of_kind<'t>(kind: &str, node: Node<'t>) -> Vec<Node<'t>> {
    std::iter::successors(Some(node), |n| n.parent())
        .filter(|n| n.kind() == kind)
        .collect()
}

/// The named node under the cursor.
///
/// If the character just before the cursor is an identifier character, the
/// lookup uses the range `[column - 1, column)` so that a cursor trailing a
/// just-typed identifier maps to that identifier rather than to whatever
/// starts at the cursor. Otherwise a point lookup at the cursor is done.
pub fn node_at_position<'t>(source: &'t SourceTree, point: Point) -> Option<Node<'t>> {
    let root = source.root();
    let trails_identifier = point.column > 0
        && source.line_text(point.row).is_some_and(|line| {
            line.get(..point.column)
                .and_then(|before| before.chars().next_back())
                .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
        });
    if trails_identifier {
        let start = Point::new(point.row, point.column - 1);
        root.named_descendant_for_point_range(start, point)
    } else {
        root.named_descendant_for_point_range(point, point)
    }
}

/// [`node_at_position`] for an LSP (UTF-16) position.
pub fn node_at_lsp_position(source: &SourceTree, position: Position) -> Option<Node<'_>> {
    let point = point_from_position(source.text(), position)?;
    node_at_position(source, point)
}

fn compare_points(a: Point, b: Point) -> Ordering {
    (a.row, a.column).cmp(&(b.row, b.column))
}

fn has_tokens(node: Node<'_>) -> bool {
    node.end_byte() != node.start_byte()
}

fn rightmost_with_tokens<'t>(nodes: &[Node<'t>]) -> Option<Node<'t>> {
    nodes.iter().rev().copied().find(|n| has_tokens(*n))
}

fn rightmost_leaf(node: Node<'_>) -> Option<Node<'_>> {
    if node.child_count() == 0 {
        return Some(node);
    }
    let children: Vec<_> = children(node).collect();
    rightmost_with_tokens(&children).and_then(rightmost_leaf)
}

/// The rightmost leaf under `node` that ends at or before `point`.
///
/// With the cursor inside a token, that token is returned. Zero-width nodes
/// (error recovery artifacts) are skipped and never returned.
pub fn previous_node(node: Node<'_>, point: Point) -> Option<Node<'_>> {
    if node.child_count() == 0 {
        return Some(node);
    }
    let children: Vec<_> = children(node).collect();
    for (i, child) in children.iter().enumerate() {
        if !has_tokens(*child) || compare_points(point, child.end_position()) != Ordering::Less {
            continue;
        }
        if compare_points(point, child.start_position()) != Ordering::Greater {
            return rightmost_with_tokens(&children[..i]).and_then(rightmost_leaf);
        }
        return previous_node(*child, point);
    }
    rightmost_with_tokens(&children).and_then(rightmost_leaf)
}

fn leftmost_leaf(mut node: Node<'_>) -> Node<'_> {
    while let Some(child) = node.child(0) {
        node = child;
    }
    node
}

/// The leaf following `node` in document order.
pub fn next_node(node: Node<'_>) -> Option<Node<'_>> {
    let mut current = node;
    let sibling = loop {
        if let Some(sibling) = current.next_sibling() {
            break sibling;
        }
        current = current.parent()?;
    };
    Some(leftmost_leaf(sibling))
}

/// Every leaf under `root` in document order.
pub fn leaves(root: Node<'_>) -> impl Iterator<Item = Node<'_>> {
    std::iter::successors(Some(leftmost_leaf(root)), |leaf| next_node(*leaf))
}

/// The first named node on the line before `point`, clamped to line 0.
pub fn named_node_on_line_before(root: Node<'_>, point: Point) -> Option<Node<'_>> {
    let line = Point::new(point.row.saturating_sub(1), 0);
    root.named_descendant_for_point_range(line, line)
}

/// The first named node on the line after `point`, clamped to the last line.
pub fn named_node_on_line_after(root: Node<'_>, point: Point) -> Option<Node<'_>> {
    let last_row = root.end_position().row;
    let line = Point::new((point.row + 1).min(last_row), 0);
    root.named_descendant_for_point_range(line, line)
}
