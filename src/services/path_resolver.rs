//! Relative paths from the host configuration directory to an arbitrary file.
//!
//! The host's device loader only accepts paths relative to its configuration
//! directory. A file picked anywhere on disk is reached by climbing from that
//! directory to the nearest ancestor that also contains the file, then
//! descending again:
//!
//! ```text
//! root     = /opt/tool/cfg
//! selected = /opt/other/devices/x86.cfg
//! result   = ../../other/devices/x86.cfg
//! ```
//!
//! Paths are handled as raw strings. Separator and case follow the host
//! platform exactly so the result is accepted verbatim by the host.

use camino::{Utf8Path, Utf8PathBuf};

/// Separator and parent-directory token of a path flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathStyle {
    pub separator: char,
    pub ascend: &'static str,
}

impl PathStyle {
    pub const UNIX: PathStyle = PathStyle {
        separator: '/',
        ascend: "../",
    };

    pub const WINDOWS: PathStyle = PathStyle {
        separator: '\\',
        ascend: "..\\",
    };

    /// Style of the platform this crate was built for.
    pub const fn host() -> PathStyle {
        if cfg!(windows) { Self::WINDOWS } else { Self::UNIX }
    }
}

/// Compute the path of `selected` relative to `root` using the host path style.
///
/// Returns `None` when `selected` is empty or shares no ancestor with `root`.
pub fn resolve(selected: &str, root: &str) -> Option<String> {
    resolve_with(selected, root, PathStyle::host())
}

/// Compute the path of `selected` relative to `root` for an explicit path style.
pub fn resolve_with(selected: &str, root: &str, style: PathStyle) -> Option<String> {
    if selected.is_empty() {
        return None;
    }

    // "cfg/" and "cfg" name the same directory
    let mut ancestor = root.trim_end_matches(style.separator);
    let mut ascents = 0usize;

    while !contains_below(selected, ancestor, style.separator) {
        let cut = ancestor.rfind(style.separator)?;
        ancestor = &ancestor[..cut];
        ascents += 1;

        // Stripping the last separator of an absolute path leaves nothing to match
        if ancestor.is_empty() {
            tracing::debug!("No common ancestor between {} and {}", selected, root);
            return None;
        }
    }

    // Skip the separator that follows the ancestor
    let tail = &selected[ancestor.len() + style.separator.len_utf8()..];
    if tail.is_empty() {
        return None;
    }

    let mut relative = style.ascend.repeat(ascents);
    relative.push_str(tail);

    tracing::debug!(
        "Resolved {} against {} via {} ({} levels up): {}",
        selected,
        root,
        ancestor,
        ascents,
        relative
    );
    Some(relative)
}

/// True when `path` lies strictly below the directory `dir`.
fn contains_below(path: &str, dir: &str, separator: char) -> bool {
    !dir.is_empty()
        && path.starts_with(dir)
        && path[dir.len()..].starts_with(separator)
}

/// Join a relative path produced by [`resolve`] back onto the root it was computed for.
pub fn join_relative(root: &Utf8Path, relative: &str) -> Utf8PathBuf {
    root.join(relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_below_root_needs_no_ascent() {
        assert_eq!(
            resolve_with("/opt/tool/cfg/arm/generic.cfg", "/opt/tool/cfg", PathStyle::UNIX),
            Some("arm/generic.cfg".to_string())
        );
    }

    #[test]
    fn test_sibling_tree_climbs_to_common_ancestor() {
        assert_eq!(
            resolve_with("/opt/other/devices/x86.cfg", "/opt/tool/cfg", PathStyle::UNIX),
            Some("../../other/devices/x86.cfg".to_string())
        );
    }

    #[test]
    fn test_no_common_ancestor_fails() {
        assert_eq!(resolve_with("/tmp/x.cfg", "/opt/tool/cfg", PathStyle::UNIX), None);
    }

    #[test]
    fn test_empty_selection_fails() {
        assert_eq!(resolve_with("", "/opt/tool/cfg", PathStyle::UNIX), None);
    }

    #[test]
    fn test_partial_segment_is_not_an_ancestor() {
        // "cfg" must not match the front of "cfgx"
        assert_eq!(
            resolve_with("/opt/tool/cfgx/a.cfg", "/opt/tool/cfg", PathStyle::UNIX),
            Some("../cfgx/a.cfg".to_string())
        );
    }

    #[test]
    fn test_trailing_separator_has_no_tail() {
        assert_eq!(resolve_with("/opt/tool/cfg/", "/opt/tool/cfg", PathStyle::UNIX), None);
    }

    #[test]
    fn test_trailing_separator_on_root_is_ignored() {
        assert_eq!(
            resolve_with("/opt/tool/cfg/a.cfg", "/opt/tool/cfg/", PathStyle::UNIX),
            Some("a.cfg".to_string())
        );
    }

    #[test]
    fn test_windows_style() {
        let root = "C:\\Program Files\\IDA\\cfg";

        assert_eq!(
            resolve_with("C:\\Program Files\\IDA\\cfg\\avr.cfg", root, PathStyle::WINDOWS),
            Some("avr.cfg".to_string())
        );
        assert_eq!(
            resolve_with("C:\\work\\cfgs\\pic.cfg", root, PathStyle::WINDOWS),
            Some("..\\..\\..\\work\\cfgs\\pic.cfg".to_string())
        );
        assert_eq!(resolve_with("D:\\pic.cfg", root, PathStyle::WINDOWS), None);
    }

    #[test]
    fn test_comparison_is_case_sensitive() {
        assert_eq!(
            resolve_with("/Opt/tool/cfg/a.cfg", "/opt/tool/cfg", PathStyle::UNIX),
            None
        );
    }

    #[test]
    fn test_join_relative_rebuilds_location() {
        let root = Utf8Path::new("/opt/tool/cfg");
        let joined = join_relative(root, "../../other/devices/x86.cfg");
        assert_eq!(joined.as_str(), "/opt/tool/cfg/../../other/devices/x86.cfg");
    }
}
