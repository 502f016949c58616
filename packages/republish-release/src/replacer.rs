//! The asset replacement protocol.
//!
//! GitHub has no "replace asset" call, so a package archive is swapped in
//! through separately fallible steps:
//!
//! 1. fetch the release by tag
//! 2. require `<pkg>.7z` and refuse if `<pkg>_old.7z` or `<pkg>_new.7z` exist
//! 3. upload the archive as `<pkg>_new.7z`
//! 4. wait a fixed delay for the service to finish processing the upload
//! 5. rename `<pkg>.7z` to `<pkg>_old.7z`
//! 6. rename `<pkg>_new.7z` to `<pkg>.7z`
//! 7. delete `<pkg>_old.7z`
//! 8. patch the package row of the release notes
//!
//! A failure at step 5 is the most sensitive one: until someone renames the
//! assets by hand no asset carries the canonical name. A failure at step 7 is
//! reported but does not fail the job, the published archive is already
//! correct. Nothing is retried.
//!
//! The step 2 check is not a lock. Two jobs for the same package running at
//! once race between steps 2 and 7 and must be prevented by the caller.

use std::io;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use republish_config::ReleaseConfig;
use republish_utils::elapsed_secs;

use crate::client::ReleaseClient;
use crate::data::{Asset, Release};
use crate::error::{ClientError, Precondition, ReplaceError, Step};
use crate::job::ReplacementJob;
use crate::notes::patch_release_notes;
use crate::probe::ProbeReport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOptions {
    /// Tag of the release holding the archives.
    pub tag: String,
    /// Build identifier written into the release notes.
    pub build_number: String,
    pub stabilization_delay: Duration,
}

impl ReplaceOptions {
    pub fn from_config(config: &ReleaseConfig) -> Self {
        Self {
            tag: config.tag.clone(),
            build_number: config.build_number.to_string(),
            stabilization_delay: config.stabilization_delay,
        }
    }
}

/// Result of a job that published the new archive.
#[derive(Debug)]
pub struct ReplaceOutcome {
    pub release_id: u64,
    /// The uploaded asset, now under the canonical name.
    pub asset: Asset,
    /// Id of the previous archive.
    pub retired_asset_id: u64,
    /// Set when the previous archive could not be deleted. It is left on
    /// the release as `<pkg>_old.7z` and blocks the next run.
    pub cleanup_error: Option<ClientError>,
    /// False when the release notes have no row for the package.
    pub notes_updated: bool,
    pub probe: ProbeReport,
}

impl ReplaceOutcome {
    pub fn is_clean(&self) -> bool {
        self.cleanup_error.is_none() && self.notes_updated
    }
}

/// Checks the asset list before anything is mutated and returns the id of
/// the current asset.
pub fn validate_preconditions(
    release: &Release,
    job: &ReplacementJob,
) -> Result<u64, Precondition> {
    let current = release
        .find_asset(&job.current_name())
        .ok_or_else(|| Precondition::CurrentMissing(job.current_name()))?;
    if release.has_asset(&job.old_name()) {
        return Err(Precondition::StaleOld(job.old_name()));
    }
    if release.has_asset(&job.new_name()) {
        return Err(Precondition::StaleNew(job.new_name()));
    }
    Ok(current.id)
}

fn step_failed(step: Step, source: ClientError) -> ReplaceError {
    let err = ReplaceError::Step { step, source };
    error!(step = %step, "{err}");
    if let Some(hint) = err.recovery_hint() {
        error!(step = %step, "manual recovery needed: {hint}");
    }
    err
}

pub struct AssetReplacer<C> {
    client: C,
    options: ReplaceOptions,
}

impl<C: ReleaseClient> AssetReplacer<C> {
    pub fn new(client: C, options: ReplaceOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn options(&self) -> &ReplaceOptions {
        &self.options
    }

    /// Runs the whole protocol for `job`. Any error is fatal and names the
    /// step it happened in.
    pub async fn run(&self, job: &ReplacementJob) -> Result<ReplaceOutcome, ReplaceError> {
        info!(
            package = %job.package,
            tag = %self.options.tag,
            "Upload {} file & update release notes",
            job.current_name()
        );

        let release = self
            .client
            .get_release_by_tag(&self.options.tag)
            .await
            .map_err(|e| step_failed(Step::FetchRelease, e))?;

        let current_id = validate_preconditions(&release, job).map_err(|e| {
            error!(step = %Step::ValidatePreconditions, "{e}");
            ReplaceError::from(e)
        })?;

        let uploaded = self.upload_new(&release, job).await?;

        if !self.options.stabilization_delay.is_zero() {
            info!(
                delay_ms = self.options.stabilization_delay.as_millis() as u64,
                "waiting before renaming assets"
            );
            tokio::time::sleep(self.options.stabilization_delay).await;
        }

        let time_start = Instant::now();
        self.client
            .rename_asset(current_id, &job.old_name())
            .await
            .map_err(|e| step_failed(Step::RenameCurrentToOld, e))?;
        let published = self
            .client
            .rename_asset(uploaded.id, &job.current_name())
            .await
            .map_err(|e| step_failed(Step::RenameNewToCurrent, e))?;
        info!("Rename time: {} secs", elapsed_secs(time_start));

        let cleanup_error = match self.client.delete_asset(current_id).await {
            Ok(()) => None,
            Err(e) => {
                error!(
                    step = %Step::DeleteOld,
                    asset_id = current_id,
                    "{e}; {} stays on the release and blocks the next run",
                    job.old_name()
                );
                Some(e)
            }
        };

        let notes_updated = self.patch_notes(&release, job).await?;

        let probe = self
            .client
            .probe_download(&self.options.tag, &job.current_name())
            .await;
        if probe.is_reachable() {
            info!("Download {probe}");
        } else {
            warn!("Download {probe}");
        }

        Ok(ReplaceOutcome {
            release_id: release.id,
            asset: published,
            retired_asset_id: current_id,
            cleanup_error,
            notes_updated,
            probe,
        })
    }

    async fn upload_new(
        &self,
        release: &Release,
        job: &ReplacementJob,
    ) -> Result<Asset, ReplaceError> {
        let local_error = |source: io::Error| {
            step_failed(
                Step::UploadNew,
                ClientError::LocalIo {
                    path: job.archive.clone(),
                    source,
                },
            )
        };
        match tokio::fs::metadata(&job.archive).await {
            Ok(meta) if meta.is_file() => {}
            Ok(_) => return Err(local_error(io::Error::other("not a regular file"))),
            Err(e) => return Err(local_error(e)),
        }

        let time_start = Instant::now();
        let asset = self
            .client
            .upload_asset(release.id, &job.new_name(), &job.archive)
            .await
            .map_err(|e| step_failed(Step::UploadNew, e))?;
        info!(
            asset_id = asset.id,
            size = asset.size,
            "Upload time: {} secs",
            elapsed_secs(time_start)
        );
        Ok(asset)
    }

    async fn patch_notes(
        &self,
        release: &Release,
        job: &ReplacementJob,
    ) -> Result<bool, ReplaceError> {
        let patch = patch_release_notes(
            release.body_text(),
            &job.package,
            &job.timestamp,
            &self.options.build_number,
        );
        if !patch.matched {
            warn!(
                package = %job.package,
                "release notes have no row for the package, leaving them unchanged"
            );
            return Ok(false);
        }
        self.client
            .update_release_body(release.id, &patch.body)
            .await
            .map_err(|e| step_failed(Step::PatchNotes, e))?;
        Ok(true)
    }
}
