use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::process::Command;

use crate::family::PackageFamily;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited with {status}: {stderr}")]
    Command {
        program: String,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("snapshot file {}: {source}", path.display())]
    File {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Installed packages of one family, in package-manager order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSnapshot {
    packages: Vec<String>,
}

/// Whether a package-manager run changed anything. Order matters: a pure
/// reordering counts as a change.
pub fn changed(before: &PackageSnapshot, after: &PackageSnapshot) -> bool {
    before.packages != after.packages
}

impl PackageSnapshot {
    pub fn new(packages: Vec<String>) -> Self {
        Self { packages }
    }

    /// Builds a snapshot from `pacman -Q` style output, keeping the lines
    /// that belong to `family`.
    pub fn from_listing(output: &str, family: PackageFamily) -> Self {
        let packages = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && family.includes(line))
            .map(str::to_string)
            .collect();
        Self { packages }
    }

    pub fn packages(&self) -> &[String] {
        &self.packages
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn changed_from(&self, before: &PackageSnapshot) -> bool {
        changed(before, self)
    }

    /// Queries the installed packages with `<pacman> -Q`.
    pub async fn capture(pacman: &Path, family: PackageFamily) -> Result<Self, SnapshotError> {
        Self::capture_command(pacman.as_os_str(), &["-Q"], family).await
    }

    pub async fn capture_command(
        program: &OsStr,
        args: &[&str],
        family: PackageFamily,
    ) -> Result<Self, SnapshotError> {
        let program_name = program.to_string_lossy().to_string();
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|source| SnapshotError::Spawn {
                program: program_name.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(SnapshotError::Command {
                program: program_name,
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        let snapshot = Self::from_listing(&String::from_utf8_lossy(&output.stdout), family);
        tracing::debug!(
            family = %family,
            packages = snapshot.len(),
            "captured package snapshot"
        );
        Ok(snapshot)
    }

    /// Reads a snapshot written by [`PackageSnapshot::write`]: one package
    /// per line.
    pub async fn read(path: &Path) -> Result<Self, SnapshotError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SnapshotError::File {
                path: path.to_path_buf(),
                source,
            })?;
        let packages = content
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self { packages })
    }

    pub async fn write(&self, path: &Path) -> Result<(), SnapshotError> {
        tokio::fs::write(path, self.to_lines())
            .await
            .map_err(|source| SnapshotError::File {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn to_lines(&self) -> String {
        let mut out = self.packages.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(names: &[&str]) -> PackageSnapshot {
        PackageSnapshot::new(names.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_identical_snapshots_unchanged() {
        let before = snapshot(&["gcc 13.2.0-3", "make 4.4-2", "zlib 1.3-1"]);
        let after = before.clone();
        assert!(!changed(&before, &after));
        assert!(!changed(&PackageSnapshot::default(), &PackageSnapshot::default()));
    }

    #[test]
    fn test_every_reordering_is_a_change() {
        let base = ["gcc 13.2.0-3", "make 4.4-2", "zlib 1.3-1"];
        let orders = [[0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        let before = snapshot(&base);
        for order in orders {
            let after = snapshot(&order.map(|i| base[i]));
            assert!(changed(&before, &after), "{order:?} should be a change");
        }
    }

    #[test]
    fn test_version_bump_is_a_change() {
        let before = snapshot(&["gcc 13.2.0-3", "make 4.4-2"]);
        let after = snapshot(&["gcc 13.2.0-4", "make 4.4-2"]);
        assert!(after.changed_from(&before));
    }

    #[test]
    fn test_swap_for_unrelated_package_is_a_change() {
        let before = snapshot(&["gcc 13.2.0-3", "make 4.4-2"]);
        let after = snapshot(&["gcc 13.2.0-3", "ragel 6.10-1"]);
        assert!(changed(&before, &after));
        assert!(changed(&before, &snapshot(&["gcc 13.2.0-3"])));
    }

    #[test]
    fn test_from_listing_filters_family() {
        let output = "bash 5.2.026-1\n\
            mingw-w64-ucrt-x86_64-gcc 13.2.0-3\n\
            mingw-w64-x86_64-gcc 13.2.0-3\n\
            \n\
            mingw-w64-ucrt-x86_64-make 4.4-2\r\n";
        let ucrt = PackageSnapshot::from_listing(output, PackageFamily::Ucrt64);
        assert_eq!(
            ucrt.packages(),
            ["mingw-w64-ucrt-x86_64-gcc 13.2.0-3", "mingw-w64-ucrt-x86_64-make 4.4-2"]
        );

        let msys2 = PackageSnapshot::from_listing(output, PackageFamily::Msys2);
        assert_eq!(msys2.packages(), ["bash 5.2.026-1"]);
    }

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("before.txt");
        let before = snapshot(&["gcc 13.2.0-3", "make 4.4-2"]);
        before.write(&path).await.unwrap();

        let loaded = PackageSnapshot::read(&path).await.unwrap();
        assert_eq!(loaded, before);
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PackageSnapshot::read(&dir.path().join("nope.txt"))
            .await
            .unwrap_err();
        assert!(matches!(err, SnapshotError::File { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_command() {
        let snapshot = PackageSnapshot::capture_command(
            OsStr::new("sh"),
            &["-c", "printf 'bash 5.2\\nmingw-w64-i686-gcc 13.2.0-3\\n'"],
            PackageFamily::Mingw32,
        )
        .await
        .unwrap();
        assert_eq!(snapshot.packages(), ["mingw-w64-i686-gcc 13.2.0-3"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_capture_command_failure() {
        let err = PackageSnapshot::capture_command(
            OsStr::new("sh"),
            &["-c", "echo broken >&2; exit 3"],
            PackageFamily::Msys2,
        )
        .await
        .unwrap_err();
        match err {
            SnapshotError::Command { stderr, .. } => assert_eq!(stderr, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
