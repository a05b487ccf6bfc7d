//! Platform-specific naming conventions.
//!
//! Release assets, launcher names, and the set of "native binary" file
//! extensions all vary by operating system.

/// Extensions of files the sanitizer treats as replaceable binaries.
///
/// `exe` and `dll` are purged everywhere, matching archives built for
/// Windows; `so` and `dylib` cover the shared-library equivalents.
pub const NATIVE_BINARY_EXTENSIONS: &[&str] = &["exe", "dll", "so", "dylib"];

/// Return the asset-name marker identifying the build for this platform.
///
/// # Examples
///
/// ```
/// use simple64_updater::platform::default_asset_marker;
///
/// assert!(default_asset_marker().starts_with("simple64-"));
/// ```
#[must_use]
pub const fn default_asset_marker() -> &'static str {
    if cfg!(target_os = "windows") {
        "simple64-win64"
    } else if cfg!(target_os = "macos") {
        "simple64-mac"
    } else {
        "simple64-linux64"
    }
}

/// Append the platform executable suffix (`.exe` on Windows) to `base`.
#[must_use]
pub fn executable_name(base: &str) -> String {
    let suffix = std::env::consts::EXE_SUFFIX;
    if suffix.is_empty() || base.ends_with(suffix) {
        base.to_owned()
    } else {
        format!("{base}{suffix}")
    }
}

/// Return true if `file_name` ends in one of [`NATIVE_BINARY_EXTENSIONS`].
///
/// The comparison ignores ASCII case, so `APP.EXE` qualifies.
///
/// # Examples
///
/// ```
/// use simple64_updater::platform::is_native_binary;
///
/// assert!(is_native_binary("simple64-gui.exe"));
/// assert!(is_native_binary("SDL2.DLL"));
/// assert!(!is_native_binary("keep.dat"));
/// assert!(!is_native_binary("exe"));
/// ```
#[must_use]
pub fn is_native_binary(file_name: &str) -> bool {
    let Some((_, extension)) = file_name.rsplit_once('.') else {
        return false;
    };
    NATIVE_BINARY_EXTENSIONS
        .iter()
        .any(|candidate| extension.eq_ignore_ascii_case(candidate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::exe("simple64-gui.exe", true)]
    #[case::dll("libstdc++-6.dll", true)]
    #[case::upper("SDL2.DLL", true)]
    #[case::shared_object("libmupen64plus.so", true)]
    #[case::dylib("libSDL2.dylib", true)]
    #[case::save("mario.eep", false)]
    #[case::config("mupen64plus.cfg", false)]
    #[case::versioned_so("libfoo.so.2", false)]
    #[case::bare_extension(".exe", true)]
    #[case::no_extension("simple64-gui", false)]
    #[case::contains_exe("exe.txt", false)]
    fn classifies_native_binaries(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_native_binary(name), expected, "{name}");
    }

    #[test]
    fn executable_name_is_idempotent() {
        let once = executable_name("simple64-gui");
        assert_eq!(executable_name(&once), once);
    }

    #[cfg(not(windows))]
    #[test]
    fn executable_name_has_no_suffix_on_unix() {
        assert_eq!(executable_name("simple64-gui"), "simple64-gui");
    }

    #[cfg(windows)]
    #[test]
    fn executable_name_appends_exe_on_windows() {
        assert_eq!(executable_name("simple64-gui"), "simple64-gui.exe");
    }
}
