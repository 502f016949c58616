use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Toolchain families published as separate `<name>.7z` assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageFamily {
    Ucrt64,
    Mingw64,
    Mingw32,
    Msys2,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid package type {0:?}, must be ucrt64, mingw64, mingw32, or msys2")]
pub struct UnknownFamily(pub String);

impl PackageFamily {
    pub const ALL: [PackageFamily; 4] = [
        PackageFamily::Ucrt64,
        PackageFamily::Mingw64,
        PackageFamily::Mingw32,
        PackageFamily::Msys2,
    ];

    /// Asset base name, also the row key in the release notes.
    pub fn name(&self) -> &'static str {
        match self {
            PackageFamily::Ucrt64 => "ucrt64",
            PackageFamily::Mingw64 => "mingw64",
            PackageFamily::Mingw32 => "mingw32",
            PackageFamily::Msys2 => "msys2",
        }
    }

    /// Package-name prefix of the family. For `msys2` this is the prefix of
    /// the packages it excludes.
    pub fn package_prefix(&self) -> &'static str {
        match self {
            PackageFamily::Ucrt64 => "mingw-w64-ucrt-x86_64-",
            PackageFamily::Mingw64 => "mingw-w64-x86_64-",
            PackageFamily::Mingw32 => "mingw-w64-i686-",
            PackageFamily::Msys2 => "mingw-w64-",
        }
    }

    pub fn includes(&self, package: &str) -> bool {
        match self {
            PackageFamily::Msys2 => !package.starts_with(self.package_prefix()),
            _ => package.starts_with(self.package_prefix()),
        }
    }

    /// Package name as shown in listings, without the family prefix.
    pub fn short_name<'a>(&self, package: &'a str) -> &'a str {
        match self {
            PackageFamily::Msys2 => package,
            _ => package
                .strip_prefix(self.package_prefix())
                .unwrap_or(package),
        }
    }

    pub fn listing_header(&self) -> String {
        match self {
            PackageFamily::Msys2 => "Installed MSYS2 Packages".to_string(),
            _ => format!(
                "Installed {} Packages",
                self.package_prefix().trim_end_matches('-')
            ),
        }
    }
}

impl fmt::Display for PackageFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PackageFamily {
    type Err = UnknownFamily;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        PackageFamily::ALL
            .into_iter()
            .find(|family| family.name() == wanted)
            .ok_or_else(|| UnknownFamily(s.to_string()))
    }
}
