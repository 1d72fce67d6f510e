use crate::build_id;
use crate::error::{CompilerError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    Written,
    /// On-disk content already matched; the file was not touched
    Unchanged,
}

/// Finalize the build id and write `content` to `path` if it differs.
pub fn write_generated(path: &Path, content: &str) -> Result<WriteStatus> {
    let finalized = build_id::finalize(content);

    if let Ok(existing) = fs::read_to_string(path) {
        if existing == finalized {
            log::debug!("Unchanged {}", path.display());
            return Ok(WriteStatus::Unchanged);
        }
    }

    write_atomic(path, finalized.as_bytes()).map_err(|source| CompilerError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Wrote {}", path.display());
    Ok(WriteStatus::Written)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| std::io::Error::other("output path has no parent"))?;
    fs::create_dir_all(parent)?;

    let tmp = parent.join(format!(
        ".{}.tmp-{}",
        path.file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("generated"),
        std::process::id()
    ));

    {
        let mut file = File::create(&tmp)?;
        file.write_all(bytes)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_id::BUILD_ID_PLACEHOLDER;
    use std::time::{Duration, SystemTime};
    use tempfile::tempdir;

    #[test]
    fn writes_finalized_content_and_creates_parents() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("nested/dir/AGENTS.md");

        let status = write_generated(&path, &format!("# A\n{BUILD_ID_PLACEHOLDER}\n")).unwrap();

        assert_eq!(status, WriteStatus::Written);
        let written = fs::read_to_string(&path).unwrap();
        assert!(!written.contains("__BUILD_ID__"));
        assert!(written.starts_with("# A\n<!-- Build ID: "));
    }

    #[test]
    fn identical_content_is_left_untouched() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("AGENTS.md");
        let content = format!("# A\n{BUILD_ID_PLACEHOLDER}\nbody\n");
        write_generated(&path, &content).unwrap();

        let old = SystemTime::now() - Duration::from_secs(3600);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(old)
            .unwrap();

        assert_eq!(write_generated(&path, &content).unwrap(), WriteStatus::Unchanged);
        assert_eq!(fs::metadata(&path).unwrap().modified().unwrap(), old);
    }

    #[test]
    fn leaves_no_temp_files_behind() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("AGENTS.md");
        write_generated(&path, "first\n").unwrap();
        write_generated(&path, "second\n").unwrap();

        let names: Vec<String> = fs::read_dir(temp.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["AGENTS.md".to_string()]);
        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
    }

    #[test]
    fn write_failure_is_reported_with_path() {
        let temp = tempdir().unwrap();
        fs::write(temp.path().join("blocker"), "file").unwrap();
        let path = temp.path().join("blocker/AGENTS.md");

        let err = write_generated(&path, "x\n").unwrap_err();
        assert!(matches!(err, CompilerError::Write { .. }));
        assert!(err.to_string().contains("blocker"));
    }
}
