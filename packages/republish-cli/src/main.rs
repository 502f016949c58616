mod telemetry;

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, warn};

use republish_config::ReleaseConfig;
use republish_release::{
    update_release_notes, AssetReplacer, GitHubReleaseClient, ReplaceError, ReplaceOptions,
    ReplacementJob,
};
use republish_snapshot::{changed, two_column, PackageFamily, PackageSnapshot};
use republish_utils::utc_timestamp;

const DEFAULT_PACMAN: &str = "C:/msys64/usr/bin/pacman.exe";
const LISTING_WIDTH: usize = 48;

#[derive(Parser)]
#[command(name = "republish")]
#[command(about = "Republish prebuilt toolchain archives on a GitHub release")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record the installed packages of a family, one per line
    Snapshot {
        /// Package family: ucrt64, mingw64, mingw32 or msys2
        family: PackageFamily,
        /// pacman executable to query
        #[arg(long, default_value = DEFAULT_PACMAN)]
        pacman: PathBuf,
        /// Write the snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replace the family's archive on the release if its packages changed
    Publish {
        /// Package family: ucrt64, mingw64, mingw32 or msys2
        family: PackageFamily,
        /// Snapshot taken before the package update
        #[arg(long)]
        before: PathBuf,
        /// Snapshot taken after the package update
        #[arg(long)]
        after: PathBuf,
        /// Archive to upload, defaults to <family>.7z
        #[arg(long)]
        archive: Option<PathBuf>,
    },
    /// Print release notes with the family's row patched, without uploading
    Notes {
        /// Package family: ucrt64, mingw64, mingw32 or msys2
        family: PackageFamily,
        /// File holding the current release notes
        #[arg(long)]
        body: PathBuf,
        /// Build number to write
        #[arg(long, default_value = "0")]
        build: String,
        /// Timestamp to write, defaults to now
        #[arg(long)]
        time: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    telemetry::setup();

    let cli = Cli::parse();
    match run(cli.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Snapshot {
            family,
            pacman,
            output,
        } => {
            let snapshot = PackageSnapshot::capture(&pacman, family).await?;
            match output {
                Some(path) => {
                    snapshot.write(&path).await?;
                    info!(
                        packages = snapshot.len(),
                        "wrote {family} snapshot to {}",
                        path.display()
                    );
                }
                None => print!("{}", snapshot.to_lines()),
            }
        }
        Commands::Publish {
            family,
            before,
            after,
            archive,
        } => {
            let archive = archive.unwrap_or_else(|| PathBuf::from(format!("{family}.7z")));
            publish(family, &before, &after, archive).await?;
        }
        Commands::Notes {
            family,
            body,
            build,
            time,
        } => {
            let text = tokio::fs::read_to_string(&body).await?;
            let time = time.unwrap_or_else(utc_timestamp);
            print!(
                "{}",
                update_release_notes(&text, family.name(), &time, &build)
            );
        }
    }
    Ok(())
}

async fn publish(
    family: PackageFamily,
    before: &Path,
    after: &Path,
    archive: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    let before = PackageSnapshot::read(before).await?;
    let after = PackageSnapshot::read(after).await?;

    let names: Vec<String> = after
        .packages()
        .iter()
        .map(|package| family.short_name(package).to_string())
        .collect();
    println!(
        "\n{}",
        two_column(&names, LISTING_WIDTH, &family.listing_header())
    );

    if !changed(&before, &after) {
        info!("** No update to {family} needed **");
        return Ok(());
    }
    info!("** Uploading {family} 7z **");

    let config = ReleaseConfig::from_env()?;
    let job = ReplacementJob::new(family.name(), archive);
    let replacer = AssetReplacer::new(
        GitHubReleaseClient::new(&config),
        ReplaceOptions::from_config(&config),
    );

    match replacer.run(&job).await {
        Ok(outcome) => {
            if let Some(e) = &outcome.cleanup_error {
                warn!(
                    "{} was published but {} could not be deleted: {e}",
                    job.current_name(),
                    job.old_name()
                );
            }
            info!(
                asset_id = outcome.asset.id,
                notes_updated = outcome.notes_updated,
                "published {}",
                job.current_name()
            );
            Ok(())
        }
        Err(e) => {
            report_failure(&job, &e);
            Err(e.into())
        }
    }
}

fn report_failure(job: &ReplacementJob, err: &ReplaceError) {
    error!(
        package = %job.package,
        step = %err.step(),
        kind = ?err.kind(),
        "replacement aborted"
    );
    if let Some(hint) = err.recovery_hint() {
        eprintln!("{}: {hint}", job.current_name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_publish() {
        let cli = Cli::try_parse_from([
            "republish",
            "publish",
            "UCRT64",
            "--before",
            "before.txt",
            "--after",
            "after.txt",
        ])
        .unwrap();
        match cli.command {
            Commands::Publish {
                family,
                before,
                after,
                archive,
            } => {
                assert_eq!(family, PackageFamily::Ucrt64);
                assert_eq!(before, PathBuf::from("before.txt"));
                assert_eq!(after, PathBuf::from("after.txt"));
                assert!(archive.is_none());
            }
            _ => panic!("expected publish"),
        }
    }

    #[test]
    fn test_rejects_unknown_family() {
        assert!(Cli::try_parse_from(["republish", "notes", "clang64", "--body", "b.md"]).is_err());
    }

    #[test]
    fn test_snapshot_default_pacman() {
        let cli = Cli::try_parse_from(["republish", "snapshot", "msys2"]).unwrap();
        match cli.command {
            Commands::Snapshot { pacman, output, .. } => {
                assert_eq!(pacman, PathBuf::from(DEFAULT_PACMAN));
                assert!(output.is_none());
            }
            _ => panic!("expected snapshot"),
        }
    }

    #[tokio::test]
    async fn test_publish_unchanged_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let before = dir.path().join("before.txt");
        let after = dir.path().join("after.txt");
        let snapshot = PackageSnapshot::new(vec!["mingw-w64-i686-gcc 13.2.0-3".to_string()]);
        snapshot.write(&before).await.unwrap();
        snapshot.write(&after).await.unwrap();

        // no environment or archive is needed when nothing changed
        publish(
            PackageFamily::Mingw32,
            &before,
            &after,
            dir.path().join("missing.7z"),
        )
        .await
        .unwrap();
    }
}
