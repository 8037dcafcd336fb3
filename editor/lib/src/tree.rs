use std::collections::BTreeSet;

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TreeError {
    #[error("empty path")]
    EmptyPath,
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("{0} already exists")]
    DuplicateName(String),
    #[error("{0} is both a file and a folder")]
    PathConflict(String),
    #[error("no such file or folder: {0}")]
    NotFound(String),
    #[error("{0} is not a folder")]
    NotAFolder(String),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    File { content: String },
    Folder { children: Vec<FileNode> },
}

/// An entry of the virtual file tree.
///
/// `path` is the full `/` separated path from the tree root and is unique
/// within a tree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl FileNode {
    pub fn file(name: &str, path: &str, content: String) -> Self {
        FileNode {
            name: name.to_string(),
            path: path.to_string(),
            kind: NodeKind::File { content },
        }
    }

    pub fn folder(name: &str, path: &str) -> Self {
        FileNode {
            name: name.to_string(),
            path: path.to_string(),
            kind: NodeKind::Folder {
                children: Vec::new(),
            },
        }
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    pub fn content(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::File { content } => Some(content),
            NodeKind::Folder { .. } => None,
        }
    }

    pub fn children(&self) -> &[FileNode] {
        match &self.kind {
            NodeKind::File { .. } => &[],
            NodeKind::Folder { children } => children,
        }
    }
}

/// A file handed over by the file or directory picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Path relative to the picked directory, `/` separated
    pub relative_path: String,
    pub content: String,
}

impl UploadedFile {
    pub fn new(relative_path: impl Into<String>, content: impl Into<String>) -> Self {
        UploadedFile {
            relative_path: relative_path.into(),
            content: content.into(),
        }
    }

    /// Path segments, with empty segments from stray separators dropped.
    pub fn segments(&self) -> Vec<&str> {
        self.relative_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect()
    }

    pub fn normalized_path(&self) -> Option<String> {
        let segments = self.segments();
        if segments.is_empty() {
            None
        } else {
            Some(segments.join("/"))
        }
    }
}

/// In-memory tree of the files the user opened, with the folders currently
/// expanded in the explorer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    roots: Vec<FileNode>,
    expanded: BTreeSet<String>,
}

impl FileTree {
    pub fn new() -> Self {
        FileTree::default()
    }

    /// A tree made of the single picked file.
    pub fn from_file(name: &str, content: String) -> Self {
        FileTree {
            roots: vec![FileNode::file(name, name, content)],
            expanded: BTreeSet::new(),
        }
    }

    /// Build a tree from a directory listing.
    ///
    /// Folders are created the first time a path prefix is seen and siblings
    /// keep their first-seen order. A later entry with the same path replaces
    /// the content of the earlier one.
    pub fn from_folder<I>(files: I) -> Result<Self, TreeError>
    where
        I: IntoIterator<Item = UploadedFile>,
    {
        let mut tree = FileTree::new();
        for file in files {
            tree.insert(&file)?;
        }
        debug!("Built file tree with {} top-level entries", tree.roots.len());
        Ok(tree)
    }

    fn insert(&mut self, file: &UploadedFile) -> Result<(), TreeError> {
        let segments = file.segments();
        let (file_name, folders) = segments.split_last().ok_or(TreeError::EmptyPath)?;

        let mut level = &mut self.roots;
        let mut path = String::new();
        for folder in folders {
            path = join(&path, folder);
            let index = match level.iter().position(|node| node.name == *folder) {
                Some(index) => index,
                None => {
                    trace!("Creating folder {}", path);
                    level.push(FileNode::folder(folder, &path));
                    level.len() - 1
                }
            };
            level = match &mut level[index].kind {
                NodeKind::Folder { children } => children,
                NodeKind::File { .. } => return Err(TreeError::PathConflict(path)),
            };
        }

        let path = join(&path, file_name);
        match level.iter_mut().find(|node| node.name == *file_name) {
            Some(node) => match &mut node.kind {
                NodeKind::File { content } => {
                    debug!("Replacing duplicate entry {}", path);
                    *content = file.content.clone();
                }
                NodeKind::Folder { .. } => return Err(TreeError::PathConflict(path)),
            },
            None => level.push(FileNode::file(file_name, &path, file.content.clone())),
        }
        Ok(())
    }

    /// Append an empty file at the top level.
    pub fn create_file(&mut self, name: &str) -> Result<&FileNode, TreeError> {
        if name.trim().is_empty() || name.contains('/') {
            return Err(TreeError::InvalidName(name.to_string()));
        }
        if self.roots.iter().any(|node| node.name == name) {
            return Err(TreeError::DuplicateName(name.to_string()));
        }

        self.roots.push(FileNode::file(name, name, String::new()));
        Ok(&self.roots[self.roots.len() - 1])
    }

    pub fn roots(&self) -> &[FileNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn find(&self, path: &str) -> Option<&FileNode> {
        let mut level = self.roots.as_slice();
        let mut found = None;
        for segment in path.split('/').filter(|segment| !segment.is_empty()) {
            let node = level.iter().find(|node| node.name == segment)?;
            level = node.children();
            found = Some(node);
        }
        found
    }

    /// Flip the expanded state of the folder at `path` and return the new state.
    pub fn toggle(&mut self, path: &str) -> Result<bool, TreeError> {
        match self.find(path) {
            None => Err(TreeError::NotFound(path.to_string())),
            Some(node) if node.is_file() => Err(TreeError::NotAFolder(path.to_string())),
            Some(node) => {
                let path = node.path.clone();
                if self.expanded.remove(&path) {
                    Ok(false)
                } else {
                    self.expanded.insert(path);
                    Ok(true)
                }
            }
        }
    }

    pub fn is_expanded(&self, path: &str) -> bool {
        self.expanded.contains(path)
    }

    pub fn expand_all(&mut self) {
        let mut folders = Vec::new();
        walk(&self.roots, 0, &mut |_, node| {
            if !node.is_file() {
                folders.push(node.path.clone());
            }
        });
        self.expanded.extend(folders);
    }

    /// Every file node, depth first in tree order.
    pub fn files(&self) -> Vec<&FileNode> {
        let mut files = Vec::new();
        walk(&self.roots, 0, &mut |_, node| {
            if node.is_file() {
                files.push(node);
            }
        });
        files
    }

    /// The rows of the explorer: every node whose ancestors are all expanded,
    /// with its depth.
    pub fn visible(&self) -> Vec<(usize, &FileNode)> {
        let mut rows = Vec::new();
        self.collect_visible(&self.roots, 0, &mut rows);
        rows
    }

    fn collect_visible<'a>(
        &'a self,
        nodes: &'a [FileNode],
        depth: usize,
        rows: &mut Vec<(usize, &'a FileNode)>,
    ) {
        for node in nodes {
            rows.push((depth, node));
            if self.is_expanded(&node.path) {
                self.collect_visible(node.children(), depth + 1, rows);
            }
        }
    }
}

fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

fn walk<'a, F>(nodes: &'a [FileNode], depth: usize, visit: &mut F)
where
    F: FnMut(usize, &'a FileNode),
{
    for node in nodes {
        visit(depth, node);
        walk(node.children(), depth + 1, visit);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn upload(entries: &[(&str, &str)]) -> Result<FileTree, TreeError> {
        FileTree::from_folder(
            entries
                .iter()
                .map(|(path, content)| UploadedFile::new(*path, *content)),
        )
    }

    fn assert_unique_siblings(nodes: &[FileNode]) {
        let names: HashSet<&str> = nodes.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(names.len(), nodes.len());
        for node in nodes {
            assert_unique_siblings(node.children());
        }
    }

    #[test]
    fn test_single_file_tree() {
        let tree = FileTree::from_file("main.py", "print(1)".to_string());

        assert_eq!(tree.roots().len(), 1);
        let node = tree.find("main.py").unwrap();
        assert_eq!(node.path, "main.py");
        assert_eq!(node.content(), Some("print(1)"));
    }

    #[test]
    fn test_nested_folder_upload() {
        let tree = upload(&[("a/x.py", "x"), ("a/b/y.js", "y")]).unwrap();

        assert_eq!(tree.roots().len(), 1);
        let a = &tree.roots()[0];
        assert_eq!((a.name.as_str(), a.path.as_str()), ("a", "a"));
        assert!(!a.is_file());

        let children = a.children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "x.py");
        assert_eq!(children[0].path, "a/x.py");
        assert_eq!(children[0].content(), Some("x"));
        assert_eq!(children[1].name, "b");
        assert_eq!(children[1].path, "a/b");

        let y = &children[1].children()[0];
        assert_eq!(y.name, "y.js");
        assert_eq!(y.path, "a/b/y.js");
        assert_eq!(y.content(), Some("y"));
    }

    #[test]
    fn test_siblings_keep_first_seen_order() {
        let tree = upload(&[
            ("p/z.txt", ""),
            ("p/m/1.txt", ""),
            ("p/a.txt", ""),
            ("p/m/0.txt", ""),
        ])
        .unwrap();

        let names: Vec<&str> = tree.roots()[0]
            .children()
            .iter()
            .map(|node| node.name.as_str())
            .collect();
        assert_eq!(names, vec!["z.txt", "m", "a.txt"]);
        let nested: Vec<&str> = tree
            .find("p/m")
            .unwrap()
            .children()
            .iter()
            .map(|node| node.name.as_str())
            .collect();
        assert_eq!(nested, vec!["1.txt", "0.txt"]);
    }

    #[test]
    fn test_duplicate_path_replaces_content() {
        let tree = upload(&[("a/x.py", "old"), ("a/x.py", "new")]).unwrap();

        assert_eq!(tree.find("a").unwrap().children().len(), 1);
        assert_eq!(tree.find("a/x.py").unwrap().content(), Some("new"));
        assert_unique_siblings(tree.roots());
    }

    #[test]
    fn test_file_folder_conflict() {
        assert_eq!(
            upload(&[("a/x", ""), ("a/x/y", "")]).unwrap_err(),
            TreeError::PathConflict("a/x".to_string())
        );
        assert_eq!(
            upload(&[("a/x/y", ""), ("a/x", "")]).unwrap_err(),
            TreeError::PathConflict("a/x".to_string())
        );
    }

    #[test]
    fn test_stray_separators_are_ignored() {
        let tree = upload(&[("/a//b/c.txt/", "c")]).unwrap();

        assert_eq!(tree.find("a/b/c.txt").unwrap().path, "a/b/c.txt");
        assert_eq!(upload(&[("//", "")]).unwrap_err(), TreeError::EmptyPath);
    }

    #[test]
    fn test_create_file() {
        let mut tree = upload(&[("a/x.py", "")]).unwrap();

        let node = tree.create_file("notes.md").unwrap();
        assert_eq!(node.path, "notes.md");
        assert_eq!(node.content(), Some(""));
        assert_eq!(tree.roots().len(), 2);

        assert_eq!(
            tree.create_file("notes.md").unwrap_err(),
            TreeError::DuplicateName("notes.md".to_string())
        );
        assert_eq!(
            tree.create_file("a").unwrap_err(),
            TreeError::DuplicateName("a".to_string())
        );
        assert!(matches!(tree.create_file(" "), Err(TreeError::InvalidName(_))));
        assert!(matches!(tree.create_file("a/b.py"), Err(TreeError::InvalidName(_))));
    }

    #[test]
    fn test_toggle() {
        let mut tree = upload(&[("a/b/y.js", "")]).unwrap();

        assert!(!tree.is_expanded("a"));
        assert_eq!(tree.toggle("a"), Ok(true));
        assert!(tree.is_expanded("a"));
        assert_eq!(tree.toggle("a"), Ok(false));
        assert!(!tree.is_expanded("a"));

        assert_eq!(
            tree.toggle("a/b/y.js"),
            Err(TreeError::NotAFolder("a/b/y.js".to_string()))
        );
        assert_eq!(tree.toggle("nope"), Err(TreeError::NotFound("nope".to_string())));
    }

    #[test]
    fn test_visible_rows_follow_expansion() {
        let mut tree = upload(&[("a/x.py", ""), ("a/b/y.js", ""), ("z.txt", "")]).unwrap();

        let rows = |tree: &FileTree| -> Vec<(usize, String)> {
            tree.visible()
                .into_iter()
                .map(|(depth, node)| (depth, node.path.clone()))
                .collect()
        };

        assert_eq!(rows(&tree), vec![(0, "a".to_string()), (0, "z.txt".to_string())]);

        tree.toggle("a").unwrap();
        assert_eq!(
            rows(&tree),
            vec![
                (0, "a".to_string()),
                (1, "a/x.py".to_string()),
                (1, "a/b".to_string()),
                (0, "z.txt".to_string()),
            ]
        );

        tree.expand_all();
        assert_eq!(rows(&tree).len(), 5);
    }

    #[test]
    fn test_files_depth_first() {
        let tree = upload(&[("a/b/y.js", ""), ("a/x.py", ""), ("z.txt", "")]).unwrap();

        let paths: Vec<&str> = tree.files().iter().map(|node| node.path.as_str()).collect();
        assert_eq!(paths, vec!["a/b/y.js", "a/x.py", "z.txt"]);
    }

    #[test]
    fn test_node_serialization() {
        let tree = upload(&[("a/x.py", "x")]).unwrap();

        let value = serde_json::to_value(&tree.roots()[0]).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "name": "a",
                "path": "a",
                "type": "folder",
                "children": [
                    { "name": "x.py", "path": "a/x.py", "type": "file", "content": "x" }
                ]
            })
        );
    }
}
