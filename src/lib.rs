//! Republishing of prebuilt toolchain archives attached to a GitHub release.
//!
//! The member crates are re-exported here so the whole flow can be driven
//! from one dependency.

pub use republish_config as config;
pub use republish_release as release;
pub use republish_snapshot as snapshot;
pub use republish_utils as utils;

pub use republish_config::ReleaseConfig;
pub use republish_release::{
    AssetReplacer, ClientError, GitHubReleaseClient, ReleaseClient, ReplaceError,
    ReplaceOptions, ReplaceOutcome, ReplacementJob,
};
pub use republish_snapshot::{changed, PackageFamily, PackageSnapshot};
