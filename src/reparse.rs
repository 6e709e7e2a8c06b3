//! Keeping the forest in sync with editor buffers and the filesystem.
//!
//! Every change reparses the whole buffer from scratch; the previous tree is
//! never reused. The new tree then replaces the old entry in one step.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use lsp_types::{
    DidChangeTextDocumentParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    TextDocumentContentChangeEvent,
};
use ropey::Rope;
use tree_sitter::{Parser, Tree};
use walkdir::WalkDir;

use elm_syntax::{FileId, new_parser, offset_from_position, parse_with_rope};

use crate::error::{AnalysisError, AnalysisResult};
use crate::forest::Forest;

/// Applies document notifications to a [`Forest`].
pub struct ReparseHandler {
    parser: Parser,
}

impl ReparseHandler {
    pub fn new() -> AnalysisResult<Self> {
        Ok(Self {
            parser: new_parser()?,
        })
    }

    fn parse(&mut self, file: &FileId, text: &Rope) -> AnalysisResult<Tree> {
        parse_with_rope(&mut self.parser, text, None).ok_or_else(|| AnalysisError::Parse { file: file.clone() })
    }

    /// Install the text of a newly opened document.
    pub fn did_open(&mut self, forest: &mut Forest, params: DidOpenTextDocumentParams) -> AnalysisResult<()> {
        let file = FileId::from(&params.text_document.uri);
        tracing::info!(uri = %file, "Document opened");
        let text = Rope::from_str(&params.text_document.text);
        let tree = self.parse(&file, &text)?;
        let writeable = forest
            .get_tree(&file)
            .is_none_or(|source| source.is_writeable());
        forest.set_tree(file, true, writeable, text, tree);
        Ok(())
    }

    /// Apply content changes and reparse.
    ///
    /// A file not yet in the forest is read from disk first. Each change is
    /// applied to the buffer and the whole buffer reparsed, so the installed
    /// tree always matches the final text.
    pub fn did_change(&mut self, forest: &mut Forest, params: DidChangeTextDocumentParams) -> AnalysisResult<()> {
        let file = FileId::from(&params.text_document.uri);
        let (mut text, open, writeable) = match forest.entry(&file) {
            Some(entry) => (
                entry.source().text().clone(),
                entry.is_open(),
                entry.source().is_writeable(),
            ),
            None => {
                tracing::debug!(uri = %file, "Change for unknown document, reading from disk");
                (read_file(&file)?, true, true)
            }
        };

        let mut tree = None;
        for change in &params.content_changes {
            apply_change(&file, &mut text, change)?;
            tree = Some(self.parse(&file, &text)?);
        }
        let tree = match tree {
            Some(tree) => tree,
            None => self.parse(&file, &text)?,
        };

        tracing::debug!(
            uri = %file,
            version = params.text_document.version,
            changes = params.content_changes.len(),
            "Document reparsed"
        );
        forest.set_tree(file, open, writeable, text, tree);
        Ok(())
    }

    /// Mark a document closed. Its tree stays in the forest.
    pub fn did_close(&mut self, forest: &mut Forest, params: DidCloseTextDocumentParams) {
        let file = FileId::from(&params.text_document.uri);
        if forest.set_open(&file, false) {
            tracing::info!(uri = %file, "Document closed");
        } else {
            tracing::debug!(uri = %file, "Closed a document that was never loaded");
        }
    }

    /// Parse a file from disk into the forest.
    pub fn load_file(&mut self, forest: &mut Forest, path: &Path, writeable: bool) -> AnalysisResult<FileId> {
        let text = read_path(path)?;
        let file = FileId::from_path(path);
        let tree = self.parse(&file, &text)?;
        let open = forest.entry(&file).is_some_and(|entry| entry.is_open());
        forest.set_tree(file.clone(), open, writeable, text, tree);
        Ok(file)
    }

    /// Load every `.elm` file under `root`. Returns the number of files loaded.
    ///
    /// Files that cannot be read or parsed are logged and skipped.
    pub fn load_directory(&mut self, forest: &mut Forest, root: &Path, writeable: bool) -> usize {
        let mut loaded = 0;
        let entries = WalkDir::new(root)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(error) => {
                    tracing::warn!(%error, "Skipping unreadable directory entry");
                    None
                }
            })
            .filter(|entry| {
                entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "elm")
            });

        for entry in entries {
            match self.load_file(forest, entry.path(), writeable) {
                Ok(_) => loaded += 1,
                Err(error) => tracing::warn!(path = %entry.path().display(), %error, "Skipping file"),
            }
        }
        tracing::info!(root = %root.display(), loaded, "Loaded directory");
        loaded
    }
}

fn read_path(path: &Path) -> AnalysisResult<Rope> {
    let file = File::open(path).map_err(|e| AnalysisError::read(path, e))?;
    Rope::from_reader(BufReader::new(file)).map_err(|e| AnalysisError::read(path, e))
}

fn read_file(file: &FileId) -> AnalysisResult<Rope> {
    let path = file.to_path().ok_or_else(|| AnalysisError::NotAFile { file: file.clone() })?;
    read_path(&path)
}

/// Apply one content change to `text`. A change without a range replaces everything.
fn apply_change(file: &FileId, text: &mut Rope, change: &TextDocumentContentChangeEvent) -> AnalysisResult<()> {
    let Some(range) = change.range else {
        *text = Rope::from_str(&change.text);
        return Ok(());
    };
    let invalid = || AnalysisError::InvalidRange { file: file.clone() };
    let start = offset_from_position(text, range.start.line, range.start.character).ok_or_else(invalid)?;
    let end = offset_from_position(text, range.end.line, range.end.character).ok_or_else(invalid)?;
    if end < start {
        return Err(invalid());
    }
    let start_char = text.byte_to_char(start);
    let end_char = text.byte_to_char(end);
    text.remove(start_char..end_char);
    text.insert(start_char, &change.text);
    Ok(())
}
