//! Naming of generated artifacts.
//!
//! Module archives (`Foo.jar`) are compiled into dependency libraries named
//! `FooLib.tcz`. The packager is told the bare library file name with `/n`,
//! while the manifest lists the library as generated.

use std::sync::LazyLock;

use regex::Regex;

/// Suffix of module archives on the classpath.
pub const MODULE_SUFFIX: &str = ".jar";

/// Suffix that replaces [`MODULE_SUFFIX`] on generated libraries.
pub const LIBRARY_SUFFIX: &str = "Lib.tcz";

static MODULE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.jar$").expect("valid module suffix regex"));

static LIBRARY_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*[/\\]([^/\\]*Lib\.tcz)$").expect("valid library file regex")
});

/// Map a module path to its generated library name.
///
/// Paths without a `.jar` suffix are returned unchanged.
pub fn to_library_artifact_name(module_path: &str) -> String {
    MODULE_SUFFIX_RE
        .replace(module_path, LIBRARY_SUFFIX)
        .into_owned()
}

/// Extract the bare library file name from a directory-qualified path.
///
/// Returns the input unchanged when it has no directory component or does
/// not end in [`LIBRARY_SUFFIX`].
pub fn to_manifest_reference_name(library_path: &str) -> String {
    match LIBRARY_FILE_RE.captures(library_path) {
        Some(caps) => caps[1].to_string(),
        None => library_path.to_string(),
    }
}

/// Build the default main target path from a (possibly qualified) class name.
///
/// `com.acme.MainApp` with `.jar` and `target/` gives `target/MainApp.jar`.
pub fn main_target_for(class_name: &str, extension: &str, prefix: &str) -> String {
    let simple = class_name.rsplit('.').next().unwrap_or(class_name);
    format!("{}{}{}", prefix, simple, extension)
}
