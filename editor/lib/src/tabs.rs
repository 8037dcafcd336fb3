use log::debug;
use serde::{Deserialize, Serialize};

use crate::SessionError;

/// An open editing session bound to a file path.
///
/// The content is a copy of the file at open time and is never written back
/// into the tree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub path: String,
    pub name: String,
    pub content: String,
    pub language: String,
}

impl Tab {
    pub fn new(path: &str, name: &str, content: String, language: &str) -> Self {
        Tab {
            path: path.to_string(),
            name: name.to_string(),
            content,
            language: language.to_string(),
        }
    }
}

/// Ordered set of open tabs, keyed by path, with at most one active tab.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TabSet {
    tabs: Vec<Tab>,
    active: Option<String>,
}

impl TabSet {
    pub fn new() -> Self {
        TabSet::default()
    }

    /// Activate the tab of `tab.path`, appending `tab` first if that path is
    /// not open yet. Returns whether a new tab was added.
    pub fn open(&mut self, tab: Tab) -> bool {
        let path = tab.path.clone();
        let added = if self.get(&path).is_some() {
            debug!("Tab {} already open", path);
            false
        } else {
            self.tabs.push(tab);
            true
        };
        self.active = Some(path);
        added
    }

    pub fn activate(&mut self, path: &str) -> Result<&Tab, SessionError> {
        let index = self.position(path)?;
        self.active = Some(path.to_string());
        Ok(&self.tabs[index])
    }

    /// Replace the content of `path`, which must be the active tab.
    pub fn edit(&mut self, path: &str, content: String) -> Result<(), SessionError> {
        if self.active.as_deref() != Some(path) {
            return Err(SessionError::NotActive(path.to_string()));
        }
        let index = self.position(path)?;
        self.tabs[index].content = content;
        Ok(())
    }

    pub fn set_language(&mut self, language: &str) -> Result<(), SessionError> {
        let tab = self.active_mut().ok_or(SessionError::NoActiveTab)?;
        tab.language = language.to_string();
        Ok(())
    }

    /// Remove the tab of `path`. When it was active, the most recently added
    /// remaining tab becomes active, or none if no tab is left.
    pub fn close(&mut self, path: &str) -> Result<Tab, SessionError> {
        let index = self.position(path)?;
        let tab = self.tabs.remove(index);
        if self.active.as_deref() == Some(path) {
            self.active = self.tabs.last().map(|tab| tab.path.clone());
        }
        Ok(tab)
    }

    pub fn get(&self, path: &str) -> Option<&Tab> {
        self.tabs.iter().find(|tab| tab.path == path)
    }

    pub fn active(&self) -> Option<&Tab> {
        self.active.as_deref().and_then(|path| self.get(path))
    }

    fn active_mut(&mut self) -> Option<&mut Tab> {
        let path = self.active.as_deref()?;
        self.tabs.iter_mut().find(|tab| tab.path == path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tab> {
        self.tabs.iter()
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    fn position(&self, path: &str) -> Result<usize, SessionError> {
        self.tabs
            .iter()
            .position(|tab| tab.path == path)
            .ok_or_else(|| SessionError::UnknownTab(path.to_string()))
    }
}
