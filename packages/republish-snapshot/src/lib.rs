pub mod family;
pub mod listing;
pub mod snapshot;

// Re-export common types
pub use family::{PackageFamily, UnknownFamily};
pub use listing::two_column;
pub use snapshot::{changed, PackageSnapshot, SnapshotError};
