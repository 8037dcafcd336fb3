pub mod archive;
pub mod language;
pub mod relay;
pub mod session;
pub mod tabs;
pub mod transcript;
pub mod tree;

use thiserror::Error;

pub use session::Session;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    #[error(transparent)]
    Tree(#[from] tree::TreeError),
    #[error("{0} is not a file")]
    NotAFile(String),
    #[error("no open tab for {0}")]
    UnknownTab(String),
    #[error("{0} is not the active tab")]
    NotActive(String),
    #[error("no active tab")]
    NoActiveTab,
    #[error("no pending reply {0}")]
    UnknownReply(u64),
}
