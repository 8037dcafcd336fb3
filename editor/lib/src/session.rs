use std::io::{Seek, Write};

use log::{debug, info, warn};
use shared::{ApiStatus, RunCodeRequest, RunCodeResponse};

use crate::{
    archive::{write_archive, ArchiveError},
    language::detect_language,
    relay::{RelayApi, RelayClientError},
    tabs::{Tab, TabSet},
    transcript::{PendingReply, Transcript},
    tree::{FileTree, TreeError, UploadedFile},
    SessionError,
};

pub const DEFAULT_CONTENT: &str = "// Start coding here...";
pub const DEFAULT_LANGUAGE: &str = "javascript";
pub const OUTPUT_PLACEHOLDER: &str = "Run your code to see the output here...";
pub const RUNNING: &str = "Running...";
pub const NO_RESULT: &str = "No output generated or no valid response from API.";
pub const CHAT_FAILURE_PREFIX: &str = "Failed to reach server: ";

/// What the editor surface shows. Always derived from the active tab, or the
/// session defaults when no tab is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditorView<'a> {
    pub content: &'a str,
    pub language: &'a str,
    pub path: Option<&'a str>,
    pub file_name: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: String,
    pub content: String,
}

/// State of one editor session: the virtual file tree, the open tabs, the
/// chat transcript and the output panel.
#[derive(Debug, Clone)]
pub struct Session {
    tree: FileTree,
    tabs: TabSet,
    transcript: Transcript,
    output: Option<String>,
    default_content: String,
    default_language: String,
}

impl Default for Session {
    fn default() -> Self {
        Session::with_defaults(DEFAULT_CONTENT, DEFAULT_LANGUAGE)
    }
}

impl Session {
    pub fn new() -> Self {
        Session::default()
    }

    pub fn with_defaults(content: &str, language: &str) -> Self {
        Session {
            tree: FileTree::new(),
            tabs: TabSet::new(),
            transcript: Transcript::new(),
            output: None,
            default_content: content.to_string(),
            default_language: language.to_string(),
        }
    }

    pub fn editor(&self) -> EditorView<'_> {
        match self.tabs.active() {
            Some(tab) => EditorView {
                content: &tab.content,
                language: &tab.language,
                path: Some(&tab.path),
                file_name: Some(&tab.name),
            },
            None => EditorView {
                content: &self.default_content,
                language: &self.default_language,
                path: None,
                file_name: None,
            },
        }
    }

    pub fn tree(&self) -> &FileTree {
        &self.tree
    }

    pub fn tabs(&self) -> &TabSet {
        &self.tabs
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn output(&self) -> &str {
        self.output.as_deref().unwrap_or(OUTPUT_PLACEHOLDER)
    }

    /// Replace the tree with a single picked file and open it.
    pub fn open_file(&mut self, name: &str, content: String) {
        info!("Opening file {}", name);
        self.tree = FileTree::from_file(name, content.clone());
        self.tabs
            .open(Tab::new(name, name, content, detect_language(name)));
    }

    /// Replace the tree with a picked directory and open its first file whose
    /// name does not start with a dot. Returns the path of that file.
    ///
    /// An empty listing leaves the session untouched.
    pub fn open_folder(&mut self, files: Vec<UploadedFile>) -> Result<Option<String>, SessionError> {
        if files.is_empty() {
            debug!("No files picked, keeping the current tree");
            return Ok(None);
        }

        let first = files
            .iter()
            .find(|file| {
                file.segments()
                    .last()
                    .is_some_and(|name| !name.starts_with('.'))
            })
            .and_then(UploadedFile::normalized_path);

        self.tree = FileTree::from_folder(files)?;
        info!("Opened folder with {} files", self.tree.files().len());

        if let Some(path) = &first {
            self.open_node(path)?;
        }
        Ok(first)
    }

    /// Open the file node at `path` of the tree, reusing its tab if any.
    pub fn open_node(&mut self, path: &str) -> Result<&Tab, SessionError> {
        let node = self
            .tree
            .find(path)
            .ok_or_else(|| TreeError::NotFound(path.to_string()))?;
        let content = node
            .content()
            .ok_or_else(|| SessionError::NotAFile(path.to_string()))?;

        let tab = Tab::new(
            &node.path,
            &node.name,
            content.to_string(),
            detect_language(&node.name),
        );
        let key = tab.path.clone();
        debug!("Opening tab {}", key);
        self.tabs.open(tab);
        self.tabs.activate(&key)
    }

    pub fn toggle_folder(&mut self, path: &str) -> Result<bool, SessionError> {
        Ok(self.tree.toggle(path)?)
    }

    /// Create an empty top-level file and open it.
    pub fn create_file(&mut self, name: &str) -> Result<(), SessionError> {
        self.tree.create_file(name)?;
        if self.tabs.get(name).is_some() {
            // a tab left over from a previous tree must not shadow the new file
            self.tabs.close(name)?;
        }
        self.tabs
            .open(Tab::new(name, name, String::new(), detect_language(name)));
        Ok(())
    }

    pub fn switch_tab(&mut self, path: &str) -> Result<(), SessionError> {
        self.tabs.activate(path)?;
        Ok(())
    }

    pub fn close_tab(&mut self, path: &str) -> Result<(), SessionError> {
        self.tabs.close(path)?;
        Ok(())
    }

    pub fn edit(&mut self, path: &str, content: String) -> Result<(), SessionError> {
        self.tabs.edit(path, content)
    }

    pub fn edit_active(&mut self, content: String) -> Result<(), SessionError> {
        let path = self
            .tabs
            .active()
            .map(|tab| tab.path.clone())
            .ok_or(SessionError::NoActiveTab)?;
        self.tabs.edit(&path, content)
    }

    pub fn set_language(&mut self, language: &str) -> Result<(), SessionError> {
        self.tabs.set_language(language)
    }

    /// Build the request for the editor content and mark the run as pending.
    pub fn begin_run(&mut self, stdin: Option<&str>) -> RunCodeRequest {
        let view = self.editor();
        let request = RunCodeRequest {
            code: view.content.to_string(),
            language: view.language.to_string(),
            stdin: Some(stdin.unwrap_or_default().to_string()),
        };
        self.output = Some(RUNNING.to_string());
        request
    }

    pub fn finish_run(&mut self, outcome: Result<RunCodeResponse, RelayClientError>) {
        let output = match outcome {
            Ok(response) => render_run_output(&response),
            Err(e) => {
                warn!("Run failed: {}", e);
                format!("Error: {}", e)
            }
        };
        self.output = Some(output);
    }

    pub async fn run(&mut self, relay: &dyn RelayApi, stdin: Option<&str>) -> &str {
        let request = self.begin_run(stdin);
        let outcome = relay.run_code(&request).await;
        self.finish_run(outcome);
        self.output()
    }

    /// Record `message` and a reply placeholder. Blank messages are ignored.
    pub fn begin_chat(&mut self, message: &str) -> Option<PendingReply> {
        if message.trim().is_empty() {
            return None;
        }
        self.transcript.push_user(message);
        Some(self.transcript.begin_reply())
    }

    pub fn finish_chat(
        &mut self,
        reply: PendingReply,
        outcome: Result<String, RelayClientError>,
    ) -> Result<(), SessionError> {
        let content = match outcome {
            Ok(text) => text,
            Err(e) => {
                warn!("Chat failed: {}", e);
                format!("{}{}", CHAT_FAILURE_PREFIX, e)
            }
        };
        self.transcript.resolve(reply, content)
    }

    pub async fn chat(&mut self, relay: &dyn RelayApi, message: &str) -> Result<(), SessionError> {
        let Some(reply) = self.begin_chat(message) else {
            return Ok(());
        };
        let outcome = relay.chat(message).await;
        self.finish_chat(reply, outcome)
    }

    /// The editor content as a text file.
    pub fn download(&self) -> Download {
        let view = self.editor();
        Download {
            file_name: view
                .file_name
                .map(str::to_string)
                .unwrap_or_else(|| format!("code.{}", view.language)),
            content: view.content.to_string(),
        }
    }

    pub fn archive<W: Write + Seek>(&self, writer: W) -> Result<W, ArchiveError> {
        write_archive(&self.tree, writer)
    }
}

/// Text of the output panel for a relay answer.
pub fn render_run_output(response: &RunCodeResponse) -> String {
    match response.api_status {
        ApiStatus::Success => {
            let Some(data) = &response.data else {
                return NO_RESULT.to_string();
            };
            if let Some(stdout) = non_empty(&data.stdout) {
                format!("Output:\n{}", stdout)
            } else if let Some(stderr) = non_empty(&data.stderr) {
                format!("Runtime Error:\n{}", stderr)
            } else if let Some(compile_output) = non_empty(&data.compile_output) {
                format!("Compilation Error:\n{}", compile_output)
            } else {
                NO_RESULT.to_string()
            }
        }
        ApiStatus::Error => format!(
            "Error: {}",
            response.message.as_deref().unwrap_or("Unknown error")
        ),
    }
}

fn non_empty(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|text| !text.is_empty())
}
