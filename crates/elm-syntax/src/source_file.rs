//! Source files and their concrete syntax trees.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};

use derive_more::Display;
use ropey::Rope;
use serde::Serialize;
use tree_sitter::{LanguageError, Node, Parser, Point, Tree};

thread_local! {
    static PARSER: RefCell<Option<Parser>> = RefCell::new(new_parser().ok());
}

/// Create a parser configured for the Elm grammar.
pub fn new_parser() -> Result<Parser, LanguageError> {
    let mut parser = Parser::new();
    parser.set_language(&tree_sitter_elm::LANGUAGE.into())?;
    Ok(parser)
}

/// Parse a rope with a caller-provided parser, reading the text chunk by chunk.
pub fn parse_with_rope(parser: &mut Parser, rope: &Rope, old_tree: Option<&Tree>) -> Option<Tree> {
    let len = rope.len_bytes();
    parser.parse_with_options(
        &mut |byte: usize, _position: Point| {
            if byte >= len {
                return &b""[..];
            }
            let (chunk, chunk_start, _, _) = rope.chunk_at_byte(byte);
            &chunk.as_bytes()[byte - chunk_start..]
        },
        old_tree,
        None,
    )
}

/// Parse a rope with the parser cached in the current thread.
///
/// Returns `None` when the grammar could not be loaded or parsing was aborted.
pub fn parse_with_thread_local(rope: &Rope, old_tree: Option<&Tree>) -> Option<Tree> {
    PARSER.with(|parser| {
        let mut parser = parser.borrow_mut();
        parse_with_rope(parser.as_mut()?, rope, old_tree)
    })
}

/// Identity of a source file: its `file://` URI.
#[derive(Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// Convert a filesystem path to a `file://` identity.
    ///
    /// Relative paths are made absolute against the working directory and
    /// the path is percent-encoded, so a file loaded from disk and the same
    /// file opened by an editor share one identity.
    pub fn from_path(path: &Path) -> Self {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let path_str = absolute.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "/");
        let encoded = percent_encode(&path_str);
        if encoded.starts_with('/') {
            Self(format!("file://{encoded}"))
        } else {
            // Drive-letter paths
            Self(format!("file:///{encoded}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Extract the path component of a `file://` identity.
    pub fn to_path(&self) -> Option<PathBuf> {
        let path = self.0.strip_prefix("file://")?;
        Some(PathBuf::from(percent_decode(path)))
    }
}

impl From<&lsp_types::Uri> for FileId {
    /// `file://` URIs are re-encoded through their path so that editor and
    /// disk spellings of one file agree. Other schemes are kept verbatim.
    fn from(uri: &lsp_types::Uri) -> Self {
        let file = Self(uri.as_str().to_owned());
        match file.to_path() {
            Some(path) if path.is_absolute() => Self::from_path(&path),
            _ => file,
        }
    }
}

fn percent_encode(path: &str) -> String {
    let mut encoded = String::with_capacity(path.len());
    for byte in path.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' | b':' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && let Some(hex) = s.get(i + 1..i + 3)
            && let Ok(byte) = u8::from_str_radix(hex, 16)
        {
            decoded.push(byte);
            i += 3;
            continue;
        }
        decoded.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&decoded).into_owned()
}

/// One parsed file: the tree, the text it was parsed from, and its identity.
///
/// Immutable once built; an edit produces a new `SourceTree`.
pub struct SourceTree {
    file: FileId,
    text: Rope,
    tree: Tree,
    writeable: bool,
}

impl SourceTree {
    pub fn new(file: FileId, text: Rope, tree: Tree, writeable: bool) -> Self {
        Self {
            file,
            text,
            tree,
            writeable,
        }
    }

    /// Parse `text` into a new tree.
    pub fn parse(file: FileId, text: impl Into<Rope>, writeable: bool) -> Option<Self> {
        let text = text.into();
        let tree = parse_with_thread_local(&text, None)?;
        Some(Self::new(file, text, tree, writeable))
    }

    pub fn file(&self) -> &FileId {
        &self.file
    }

    pub fn text(&self) -> &Rope {
        &self.text
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn root(&self) -> Node<'_> {
        self.tree.root_node()
    }

    /// Project files are writeable; dependency sources are read-only.
    pub fn is_writeable(&self) -> bool {
        self.writeable
    }

    /// The source text covered by `node`.
    pub fn text_of(&self, node: Node<'_>) -> Cow<'_, str> {
        let len = self.text.len_bytes();
        let start = self.text.byte_to_char(node.start_byte().min(len));
        let end = self.text.byte_to_char(node.end_byte().min(len));
        self.text.slice(start..end).into()
    }

    /// The text of line `row` without its line terminator.
    pub fn line_text(&self, row: usize) -> Option<Cow<'_, str>> {
        if row >= self.text.len_lines() {
            return None;
        }
        let line: Cow<'_, str> = self.text.line(row).into();
        Some(match line {
            Cow::Borrowed(s) => Cow::Borrowed(s.trim_end_matches(['\n', '\r'])),
            Cow::Owned(s) => Cow::Owned(s.trim_end_matches(['\n', '\r']).to_owned()),
        })
    }
}

impl fmt::Debug for SourceTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceTree")
            .field("file", &self.file)
            .field("writeable", &self.writeable)
            .field("len_bytes", &self.text.len_bytes())
            .finish()
    }
}
