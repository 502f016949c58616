use std::path::PathBuf;

use republish_utils::utc_timestamp;

pub const ARCHIVE_EXTENSION: &str = "7z";

/// Role of an asset, encoded in its name suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetRole {
    /// `<pkg>.7z`, what users download.
    Current,
    /// `<pkg>_new.7z`, uploaded but not yet published.
    New,
    /// `<pkg>_old.7z`, the previous archive waiting for deletion.
    Old,
}

impl AssetRole {
    pub fn suffix(&self) -> &'static str {
        match self {
            AssetRole::Current => "",
            AssetRole::New => "_new",
            AssetRole::Old => "_old",
        }
    }
}

/// One replacement of a package's archive on the release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementJob {
    pub package: String,
    pub archive: PathBuf,
    /// UTC time written into the release notes.
    pub timestamp: String,
}

impl ReplacementJob {
    pub fn new(package: impl Into<String>, archive: impl Into<PathBuf>) -> Self {
        Self {
            package: package.into(),
            archive: archive.into(),
            timestamp: utc_timestamp(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    pub fn asset_name(&self, role: AssetRole) -> String {
        format!("{}{}.{}", self.package, role.suffix(), ARCHIVE_EXTENSION)
    }

    pub fn current_name(&self) -> String {
        self.asset_name(AssetRole::Current)
    }

    pub fn new_name(&self) -> String {
        self.asset_name(AssetRole::New)
    }

    pub fn old_name(&self) -> String {
        self.asset_name(AssetRole::Old)
    }
}
