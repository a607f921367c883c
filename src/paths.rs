//! Game path handling
//!
//! Manifests list game paths with mixed case and, occasionally, Windows
//! separators. Everything the classifier looks at goes through
//! `normalize_game_path` first so the pattern tables can stay lowercase.

/// Normalize a game path for matching (lowercase, forward slashes, trimmed)
pub fn normalize_game_path(path: &str) -> String {
    path.trim()
        .to_lowercase()
        .replace('\\', "/")
        .trim_matches('/')
        .to_string()
}

/// Get the filename from a path (handles both / and \)
pub fn file_name(path: &str) -> &str {
    path.rfind(['\\', '/'])
        .map(|idx| &path[idx + 1..])
        .unwrap_or(path)
}

/// Get file extension (without the dot)
pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    name.rfind('.').map(|idx| &name[idx + 1..])
}

/// Get the file stem (filename without extension)
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    name.rfind('.').map(|idx| &name[..idx]).unwrap_or(name)
}

/// Split a normalized path into its directory segments and file name
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Returns true if any segment equals `segment` exactly.
pub fn has_segment(path: &str, segment: &str) -> bool {
    segments(path).any(|s| s == segment)
}

/// Returns the segment following `marker`, if present.
/// `segment_after("chara/human/c0101/obj/hair/h0001/x.mdl", "hair")` -> `Some("h0001")`
pub fn segment_after<'a>(path: &'a str, marker: &str) -> Option<&'a str> {
    let mut iter = segments(path);
    while let Some(seg) = iter.next() {
        if seg == marker {
            return iter.next();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(
            normalize_game_path("Chara\\Human\\C0101\\obj\\body\\b0001\\model\\c0101b0001.mdl"),
            "chara/human/c0101/obj/body/b0001/model/c0101b0001.mdl"
        );
        assert_eq!(normalize_game_path("/vfx/common/eff/x.avfx "), "vfx/common/eff/x.avfx");
    }

    #[test]
    fn test_file_name() {
        assert_eq!(file_name("chara/human/c0101/obj/hair/h0001/model/c0101h0001_hir.mdl"), "c0101h0001_hir.mdl");
        assert_eq!(file_name("idle.pap"), "idle.pap");
        assert_eq!(file_name("chara\\x.tex"), "x.tex");
    }

    #[test]
    fn test_extension_and_stem() {
        assert_eq!(extension("a/b/c0101e0000_dwn.mdl"), Some("mdl"));
        assert_eq!(extension("a/b/noext"), None);
        assert_eq!(file_stem("a/b/c0101e0000_dwn.mdl"), "c0101e0000_dwn");
    }

    #[test]
    fn test_segment_after() {
        let path = "chara/human/c0101/obj/hair/h0001/model/c0101h0001_hir.mdl";
        assert_eq!(segment_after(path, "hair"), Some("h0001"));
        assert_eq!(segment_after(path, "human"), Some("c0101"));
        assert_eq!(segment_after(path, "face"), None);
        assert!(has_segment(path, "obj"));
        assert!(!has_segment(path, "ob"));
    }
}
