use std::{
    fs,
    path::{Component, Path},
};

use anyhow::{anyhow, Context, Result};
use editor_lib::tree::UploadedFile;
use log::{debug, trace};
use walkdir::WalkDir;

/// Read a single file, returning its file name and its content.
pub fn load_file(path: &Path) -> Result<(String, String)> {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("{} is not a file", path.display()))?;
    let content = read_text(path)?;
    Ok((name, content))
}

/// Read every file below `dir`. Paths are relative to the parent of `dir`, so
/// they start with the directory name, and use `/` as separator.
///
/// The filesystem root has no name to start with and is refused.
pub fn load_folder(dir: &Path) -> Result<Vec<UploadedFile>> {
    let dir = dir
        .canonicalize()
        .with_context(|| format!("cannot open directory {}", dir.display()))?;
    let base = walk_base(&dir)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(&dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("cannot walk {}", dir.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = relative_path(entry.path(), base);
        trace!("Picked {}", relative);
        files.push(UploadedFile::new(relative, read_text(entry.path())?));
    }

    debug!("Loaded {} files from {}", files.len(), dir.display());
    Ok(files)
}

fn walk_base(dir: &Path) -> Result<&Path> {
    match (dir.parent(), dir.file_name()) {
        (Some(parent), Some(_)) => Ok(parent),
        _ => Err(anyhow!("{} has no directory name to load", dir.display())),
    }
}

fn relative_path(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .filter_map(|component| match component {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    #[test]
    fn test_load_folder_keeps_directory_name() {
        let root = tempfile::tempdir().unwrap();
        let project = root.path().join("proj");
        fs::create_dir_all(project.join("lib")).unwrap();
        fs::write(project.join("main.py"), "print(1)").unwrap();
        fs::write(project.join("lib").join("util.js"), "export {}").unwrap();

        let files = load_folder(&project).unwrap();

        let paths: Vec<_> = files.iter().map(|file| file.relative_path.as_str()).collect();
        assert_eq!(paths, vec!["proj/lib/util.js", "proj/main.py"]);
        assert_eq!(files[1].content, "print(1)");
    }

    #[test]
    fn test_load_file() {
        let root = tempfile::tempdir().unwrap();
        let path = root.path().join("hello.rs");
        fs::write(&path, "fn main() {}").unwrap();

        let (name, content) = load_file(&path).unwrap();
        assert_eq!(name, "hello.rs");
        assert_eq!(content, "fn main() {}");
    }

    #[test]
    fn test_root_is_refused() {
        assert!(walk_base(Path::new("/")).is_err());
        assert_eq!(
            walk_base(Path::new("/home/proj")).unwrap(),
            Path::new("/home")
        );
    }

    #[test]
    fn test_missing_directory() {
        let root = tempfile::tempdir().unwrap();
        assert!(load_folder(&root.path().join("missing")).is_err());
    }
}
