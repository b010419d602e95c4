//! Host platform detection and native package types.
//!
//! The layout of an app image and the default install location of a package
//! are pure functions of the operating system the packager runs on. The
//! operating system is fixed at compile time, so there is nothing to
//! reconfigure at runtime.
//!
//! # Supported Platforms
//!
//! | Platform | Package Types |
//! |----------|--------------|
//! | Linux | .deb, .rpm |
//! | macOS | .dmg, .pkg |
//! | Windows | .msi, .exe |

use std::fmt;

/// Operating system an app image is built for.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum OperatingSystem {
    /// Linux distributions.
    Linux,
    /// Microsoft Windows.
    Windows,
    /// Apple macOS.
    MacOs,
}

impl OperatingSystem {
    /// The operating system this process runs on.
    pub const fn current() -> Self {
        if cfg!(target_os = "windows") {
            OperatingSystem::Windows
        } else if cfg!(target_os = "macos") {
            OperatingSystem::MacOs
        } else {
            OperatingSystem::Linux
        }
    }

    /// Token recorded in the `platform` attribute of the app image file.
    pub fn platform_token(&self) -> &'static str {
        match self {
            OperatingSystem::Linux => "linux",
            OperatingSystem::Windows => "windows",
            OperatingSystem::MacOs => "macOS",
        }
    }

    /// Parses a token written by [`platform_token`](Self::platform_token).
    pub fn from_platform_token(token: &str) -> Option<Self> {
        match token {
            "linux" => Some(OperatingSystem::Linux),
            "windows" => Some(OperatingSystem::Windows),
            "macOS" => Some(OperatingSystem::MacOs),
            _ => None,
        }
    }

    /// File name of a launcher executable on this platform.
    pub fn executable_name(&self, name: &str) -> String {
        match self {
            OperatingSystem::Windows => format!("{name}.exe"),
            _ => name.to_string(),
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.platform_token())
    }
}

/// Supported native package types.
///
/// The installer backends producing these formats are external collaborators;
/// the pipeline only needs the type to derive install locations and to let
/// platform packagers attach their tasks.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[non_exhaustive]
pub enum PackageType {
    /// Debian package (.deb).
    Deb,

    /// RPM package (.rpm).
    Rpm,

    /// Windows Installer package (.msi).
    Msi,

    /// Windows executable installer (.exe).
    Exe,

    /// macOS disk image (.dmg).
    Dmg,

    /// macOS installer package (.pkg).
    Pkg,
}

impl PackageType {
    /// Returns the short name for this package type.
    ///
    /// This is the lowercase identifier used in CLI input and file names.
    pub fn short_name(&self) -> &'static str {
        match self {
            PackageType::Deb => "deb",
            PackageType::Rpm => "rpm",
            PackageType::Msi => "msi",
            PackageType::Exe => "exe",
            PackageType::Dmg => "dmg",
            PackageType::Pkg => "pkg",
        }
    }

    /// Parses a short name.
    pub fn from_short_name(name: &str) -> Option<Self> {
        match name {
            "deb" => Some(PackageType::Deb),
            "rpm" => Some(PackageType::Rpm),
            "msi" => Some(PackageType::Msi),
            "exe" => Some(PackageType::Exe),
            "dmg" => Some(PackageType::Dmg),
            "pkg" => Some(PackageType::Pkg),
            _ => None,
        }
    }

    /// Operating system the package installs on.
    pub fn operating_system(&self) -> OperatingSystem {
        match self {
            PackageType::Deb | PackageType::Rpm => OperatingSystem::Linux,
            PackageType::Msi | PackageType::Exe => OperatingSystem::Windows,
            PackageType::Dmg | PackageType::Pkg => OperatingSystem::MacOs,
        }
    }

    /// Returns all package types available on the current platform.
    pub fn all_for_current_platform() -> Vec<PackageType> {
        match OperatingSystem::current() {
            OperatingSystem::Linux => vec![PackageType::Deb, PackageType::Rpm],
            OperatingSystem::MacOs => vec![PackageType::Dmg, PackageType::Pkg],
            OperatingSystem::Windows => vec![PackageType::Msi, PackageType::Exe],
        }
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_token_round_trip() {
        for os in [
            OperatingSystem::Linux,
            OperatingSystem::Windows,
            OperatingSystem::MacOs,
        ] {
            assert_eq!(
                OperatingSystem::from_platform_token(os.platform_token()),
                Some(os)
            );
        }
        assert_eq!(OperatingSystem::from_platform_token("solaris"), None);
    }

    #[test]
    fn test_current_platform_types() {
        let types = PackageType::all_for_current_platform();
        assert!(!types.is_empty());
        for t in types {
            assert_eq!(t.operating_system(), OperatingSystem::current());
        }
    }

    #[test]
    fn test_package_type_short_names() {
        assert_eq!(PackageType::Deb.short_name(), "deb");
        assert_eq!(PackageType::from_short_name("msi"), Some(PackageType::Msi));
        assert_eq!(PackageType::from_short_name("app-image"), None);
    }
}
