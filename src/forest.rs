//! The forest: one parsed tree per file.
//!
//! The forest is an explicitly owned registry. Replacing an entry requires
//! `&mut Forest`, while every query borrows `&Forest`, so a resolution that
//! holds nodes of some tree cannot overlap with a swap of that tree.

use std::collections::HashMap;

use elm_syntax::{FileId, ModuleIndex, SourceTree};
use ropey::Rope;
use tree_sitter::Tree;

/// A tree installed in the forest, with the tables derived from it.
#[derive(Debug)]
pub struct ForestEntry {
    source: SourceTree,
    open: bool,
    index: ModuleIndex,
}

impl ForestEntry {
    pub fn source(&self) -> &SourceTree {
        &self.source
    }

    /// Whether the file is open in the editor.
    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn index(&self) -> &ModuleIndex {
        &self.index
    }
}

#[derive(Debug, Default)]
pub struct Forest {
    entries: HashMap<FileId, ForestEntry>,
    /// Module name -> files declaring it, writeable files first, then in
    /// installation order.
    modules: HashMap<String, Vec<FileId>>,
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_tree(&self, file: &FileId) -> Option<&SourceTree> {
        self.entries.get(file).map(ForestEntry::source)
    }

    pub fn entry(&self, file: &FileId) -> Option<&ForestEntry> {
        self.entries.get(file)
    }

    pub fn index(&self, file: &FileId) -> Option<&ModuleIndex> {
        self.entries.get(file).map(ForestEntry::index)
    }

    /// Install a tree for `file`, replacing any previous entry as a whole.
    pub fn set_tree(&mut self, file: FileId, open: bool, writeable: bool, text: Rope, tree: Tree) {
        self.insert(SourceTree::new(file, text, tree, writeable), open);
    }

    /// Install an already built source tree, recomputing its module index.
    pub fn insert(&mut self, source: SourceTree, open: bool) {
        let file = source.file().clone();
        let index = ModuleIndex::build(&source);
        tracing::debug!(
            uri = %file,
            module = index.name.as_deref().unwrap_or("<none>"),
            imports = index.imports.len(),
            "Installing tree"
        );

        let keeps_slot = self.entries.get(&file).is_some_and(|previous| {
            previous.index.name == index.name && previous.source.is_writeable() == source.is_writeable()
        });
        if !keeps_slot {
            self.unregister_module(&file);
            if let Some(name) = &index.name {
                let entries = &self.entries;
                let files = self.modules.entry(name.clone()).or_default();
                // Writeable files go after the writeable ones already registered
                let position = if source.is_writeable() {
                    files
                        .iter()
                        .take_while(|f| entries.get(*f).is_some_and(|e| e.source.is_writeable()))
                        .count()
                } else {
                    files.len()
                };
                files.insert(position, file.clone());
            }
        }
        self.entries.insert(file, ForestEntry { source, open, index });
    }

    /// Mark an installed file as open or closed in the editor.
    pub fn set_open(&mut self, file: &FileId, open: bool) -> bool {
        match self.entries.get_mut(file) {
            Some(entry) => {
                entry.open = open;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, file: &FileId) -> Option<ForestEntry> {
        self.unregister_module(file);
        self.entries.remove(file)
    }

    fn unregister_module(&mut self, file: &FileId) {
        let Some(name) = self.entries.get(file).and_then(|e| e.index.name.clone()) else {
            return;
        };
        if let Some(files) = self.modules.get_mut(&name) {
            files.retain(|f| f != file);
            if files.is_empty() {
                self.modules.remove(&name);
            }
        }
    }

    /// The tree declaring module `name`, preferring project files.
    pub fn by_module_name(&self, name: &str) -> Option<&SourceTree> {
        let file = self.modules.get(name)?.first()?;
        self.get_tree(file)
    }

    /// Every `(file, tree, writeable)` entry.
    pub fn iter(&self) -> impl Iterator<Item = (&FileId, &SourceTree, bool)> {
        self.entries
            .iter()
            .map(|(file, entry)| (file, &entry.source, entry.source.is_writeable()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(uri: &str, text: &str, writeable: bool) -> SourceTree {
        SourceTree::parse(FileId::new(uri), text, writeable).expect("parse")
    }

    #[test]
    fn test_insert_and_lookup_by_module_name() {
        let mut forest = Forest::new();
        forest.insert(source("file:///src/A/B.elm", "module A.B exposing (..)\n\nx = 1\n", true), false);
        assert_eq!(forest.len(), 1);
        let tree = forest.by_module_name("A.B").unwrap();
        assert_eq!(tree.file().as_str(), "file:///src/A/B.elm");
        assert!(forest.by_module_name("A").is_none());
    }

    #[test]
    fn test_replace_is_wholesale() {
        let mut forest = Forest::new();
        let file = FileId::new("file:///src/A.elm");
        forest.insert(source(file.as_str(), "module A exposing (..)\n", true), true);
        forest.insert(source(file.as_str(), "module Renamed exposing (..)\n", true), true);

        assert_eq!(forest.len(), 1);
        assert!(forest.by_module_name("A").is_none());
        assert!(forest.by_module_name("Renamed").is_some());
        assert_eq!(forest.index(&file).unwrap().name.as_deref(), Some("Renamed"));
    }

    #[test]
    fn test_project_files_win_over_dependencies() {
        let mut forest = Forest::new();
        forest.insert(source("file:///deps/List.elm", "module List exposing (..)\n", false), false);
        forest.insert(source("file:///src/List.elm", "module List exposing (..)\n", true), false);
        let tree = forest.by_module_name("List").unwrap();
        assert!(tree.is_writeable());

        let writeable: Vec<_> = forest.iter().filter(|(_, _, w)| *w).collect();
        assert_eq!(writeable.len(), 1);
    }

    #[test]
    fn test_first_installed_wins_among_project_files() {
        let mut forest = Forest::new();
        let text = "module Dup exposing (..)\n";
        forest.insert(source("file:///src/First.elm", text, true), false);
        forest.insert(source("file:///src/Second.elm", text, true), false);
        forest.insert(source("file:///deps/Dup.elm", text, false), false);
        assert_eq!(forest.by_module_name("Dup").unwrap().file().as_str(), "file:///src/First.elm");

        // Reinstalling the winner after an edit keeps it in front
        forest.insert(source("file:///src/First.elm", "module Dup exposing (..)\n\nx = 1\n", true), true);
        assert_eq!(forest.by_module_name("Dup").unwrap().file().as_str(), "file:///src/First.elm");

        forest.remove(&FileId::new("file:///src/First.elm"));
        assert_eq!(forest.by_module_name("Dup").unwrap().file().as_str(), "file:///src/Second.elm");
    }

    #[test]
    fn test_remove_and_open_flag() {
        let mut forest = Forest::new();
        let file = FileId::new("file:///src/A.elm");
        forest.insert(source(file.as_str(), "module A exposing (..)\n", true), false);
        assert!(forest.set_open(&file, true));
        assert!(forest.entry(&file).unwrap().is_open());
        assert!(forest.remove(&file).is_some());
        assert!(forest.by_module_name("A").is_none());
        assert!(!forest.set_open(&file, true));
        assert!(forest.is_empty());
    }
}
