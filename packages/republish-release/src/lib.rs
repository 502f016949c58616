pub mod client;
pub mod data;
pub mod error;
pub mod github;
pub mod job;
pub mod notes;
pub mod probe;
pub mod replacer;

// Re-export common types
pub use client::ReleaseClient;
pub use data::{Asset, Release};
pub use error::{ClientError, ErrorKind, Precondition, ReplaceError, Step};
pub use github::GitHubReleaseClient;
pub use job::{AssetRole, ReplacementJob};
pub use notes::{patch_release_notes, update_release_notes, NotesPatch};
pub use probe::{probe_url, ProbeReport};
pub use replacer::{validate_preconditions, AssetReplacer, ReplaceOptions, ReplaceOutcome};
