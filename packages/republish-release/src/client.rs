use async_trait::async_trait;
use std::path::Path;

use crate::data::{Asset, Release};
use crate::error::ClientError;
use crate::probe::ProbeReport;

/// Operations the replacer needs from the release-hosting service.
///
/// Every mutating call is independent on the remote side; there is no
/// transaction spanning them.
#[async_trait]
pub trait ReleaseClient: Send + Sync {
    async fn get_release_by_tag(&self, tag: &str) -> Result<Release, ClientError>;

    /// Uploads `archive` as a new asset called `name`.
    async fn upload_asset(
        &self,
        release_id: u64,
        name: &str,
        archive: &Path,
    ) -> Result<Asset, ClientError>;

    async fn rename_asset(&self, asset_id: u64, name: &str) -> Result<Asset, ClientError>;

    async fn delete_asset(&self, asset_id: u64) -> Result<(), ClientError>;

    async fn update_release_body(&self, release_id: u64, body: &str)
        -> Result<Release, ClientError>;

    /// Checks the public download URL of an asset. Never fails; problems are
    /// described in the report.
    async fn probe_download(&self, tag: &str, asset_name: &str) -> ProbeReport;
}
