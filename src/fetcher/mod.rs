pub mod git;
pub mod walker;

pub use git::{is_remote_target, GitFetcher};
pub use walker::{FileWalker, WalkedFile};
