//! Shared helpers for analyzer integration tests.

use elm_analyzer::{FileId, Forest, SourceTree};
use elm_syntax::Node;

/// Build a forest of writeable files from `(uri, text)` pairs.
#[allow(dead_code)]
pub fn forest(files: &[(&str, &str)]) -> Forest {
    let mut forest = Forest::new();
    for (uri, text) in files {
        let source = SourceTree::parse(FileId::new(*uri), *text, true).expect("parse");
        forest.insert(source, false);
    }
    forest
}

#[allow(dead_code)]
pub fn tree<'f>(forest: &'f Forest, uri: &str) -> &'f SourceTree {
    forest.get_tree(&FileId::new(uri)).expect("file in forest")
}

/// The smallest named node covering the first `ident` after `context`.
#[allow(dead_code)]
pub fn node_at<'f>(source: &'f SourceTree, context: &str, ident: &str) -> Node<'f> {
    let text = source.text().to_string();
    let start = text
        .find(context)
        .unwrap_or_else(|| panic!("{context:?} not found"));
    let offset = start
        + text[start..]
            .find(ident)
            .unwrap_or_else(|| panic!("{ident:?} not found after {context:?}"));
    source
        .root()
        .named_descendant_for_byte_range(offset, offset + ident.len())
        .expect("node at offset")
}
