//! Release-notes table patching.
//!
//! The release body carries one markdown table row per package:
//!
//! ```text
//! | **ucrt64** | 2024-01-01 00:00:00 UTC |    42 |
//! ```
//!
//! Only the columns after the package cell are rewritten.

use once_cell::sync::Lazy;
use regex::Regex;

/// Width the build number is right-justified to.
pub const BUILD_COLUMN_WIDTH: usize = 6;

static PACKAGE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(\| +\*\*(?P<name>[^*\r\n]+)\*\* +\|)[^\r\n]+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotesPatch {
    pub body: String,
    /// False when no row for the package exists; `body` is then unchanged.
    pub matched: bool,
}

/// Rewrites the first row for `name` to ` <time> | <build> |`, leaving every
/// other byte of `body` alone.
pub fn patch_release_notes(body: &str, name: &str, time: &str, build: &str) -> NotesPatch {
    let row = PACKAGE_ROW
        .captures_iter(body)
        .find(|caps| caps.name("name").map(|m| m.as_str()) == Some(name));

    let Some(caps) = row else {
        return NotesPatch {
            body: body.to_string(),
            matched: false,
        };
    };
    let (Some(whole), Some(cell)) = (caps.get(0), caps.get(1)) else {
        return NotesPatch {
            body: body.to_string(),
            matched: false,
        };
    };

    let mut patched = String::with_capacity(body.len() + 16);
    patched.push_str(&body[..whole.start()]);
    patched.push_str(cell.as_str());
    patched.push_str(&format!(
        " {time} | {build:>width$} |",
        width = BUILD_COLUMN_WIDTH
    ));
    patched.push_str(&body[whole.end()..]);
    NotesPatch {
        body: patched,
        matched: true,
    }
}

pub fn update_release_notes(body: &str, name: &str, time: &str, build: &str) -> String {
    patch_release_notes(body, name, time, build).body
}
