use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use filetime::FileTime;

use time::OffsetDateTime;
use time::macros::format_description;
use tracing::{debug, info};

use crate::{ContinuationError, ContinuationResult};

pub const SESSION_DIR_PREFIX: &str = "training_continuation_";
pub const BACKUP_DIR_NAME: &str = "backup";
pub const MANIFEST_FILE_NAME: &str = "training_files.txt";
pub const OUTPUT_PREFIX_NAME: &str = "output";

/// On-disk layout of one continuation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingSession {
    root: PathBuf,
    timestamp: String,
}

impl TrainingSession {
    /// Create `<work_root>/training_continuation_<timestamp>/` and its `backup/`
    /// subdirectory.
    ///
    /// The session directory may already exist; the backup directory may not.
    pub fn create(work_root: &Path, created_at: OffsetDateTime) -> ContinuationResult<Self> {
        let timestamp = format_timestamp(created_at);
        let root = work_root.join(format!("{SESSION_DIR_PREFIX}{timestamp}"));

        fs::create_dir_all(&root).map_err(|e| ContinuationError::io(&root, e))?;

        let session = Self { root, timestamp };
        let backup_dir = session.backup_dir();
        fs::create_dir(&backup_dir).map_err(|e| ContinuationError::io(&backup_dir, e))?;

        info!(session = %session.root.display(), "created training session");
        Ok(session)
    }

    /// Current local time, or UTC when the local offset is not available.
    pub fn now() -> OffsetDateTime {
        OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.root.join(BACKUP_DIR_NAME)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE_NAME)
    }

    pub fn output_prefix(&self) -> PathBuf {
        self.root.join(OUTPUT_PREFIX_NAME)
    }

    /// Path prefix shared by a sample's `.tiff` and `.box` files, also used as
    /// its manifest entry.
    pub fn sample_prefix(&self, base_name: impl AsRef<OsStr>) -> PathBuf {
        self.root.join(base_name.as_ref())
    }

    /// Copy the model into `backup/`, keeping its permissions and modification
    /// time. Returns the path of the copy.
    pub fn backup_model(&self, model: &Path) -> ContinuationResult<PathBuf> {
        let file_name = model.file_name().ok_or_else(|| {
            ContinuationError::io(
                model,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "model path has no file name"),
            )
        })?;
        let target = self.backup_dir().join(file_name);

        fs::copy(model, &target).map_err(|e| ContinuationError::io(model, e))?;

        // The copy may be read-only, so set the time by path rather than
        // through an open handle.
        let meta = fs::metadata(model).map_err(|e| ContinuationError::io(model, e))?;
        filetime::set_file_mtime(&target, FileTime::from_last_modification_time(&meta))
            .map_err(|e| ContinuationError::io(&target, e))?;

        debug!(from = %model.display(), to = %target.display(), "backed up model");
        Ok(target)
    }

    /// Write one entry per line. No trailing newline; no entries gives an
    /// empty file. Entries are written as raw path bytes where the platform
    /// allows it, so names that are not valid UTF-8 survive.
    pub fn write_manifest(&self, entries: &[PathBuf]) -> ContinuationResult<PathBuf> {
        let path = self.manifest_path();
        let mut contents = Vec::new();
        for (idx, entry) in entries.iter().enumerate() {
            if idx > 0 {
                contents.push(b'\n');
            }
            contents.extend_from_slice(&path_bytes(entry));
        }
        fs::write(&path, contents).map_err(|e| ContinuationError::io(&path, e))?;
        info!(manifest = %path.display(), entries = entries.len(), "wrote training manifest");
        Ok(path)
    }
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    std::borrow::Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> std::borrow::Cow<'_, [u8]> {
    match path.to_string_lossy() {
        std::borrow::Cow::Borrowed(s) => std::borrow::Cow::Borrowed(s.as_bytes()),
        std::borrow::Cow::Owned(s) => std::borrow::Cow::Owned(s.into_bytes()),
    }
}

pub fn format_timestamp(at: OffsetDateTime) -> String {
    let format = format_description!("[year][month][day]_[hour][minute][second]");
    // The description only uses numeric date components, which always format.
    at.format(&format)
        .unwrap_or_else(|_| at.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn timestamp_has_second_granularity() {
        let at = datetime!(2024-03-07 09:05:02 UTC);
        assert_eq!(format_timestamp(at), "20240307_090502");
    }

    #[test]
    fn creates_layout_under_work_root() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let session = TrainingSession::create(dir.path(), datetime!(2024-01-02 03:04:05 UTC))?;

        assert_eq!(
            session.root(),
            dir.path().join("training_continuation_20240102_030405")
        );
        assert!(session.backup_dir().is_dir());
        assert_eq!(session.manifest_path(), session.root().join("training_files.txt"));
        assert_eq!(session.output_prefix(), session.root().join("output"));
        Ok(())
    }

    #[test]
    fn relative_work_root_keeps_paths_relative() {
        let session = TrainingSession {
            root: Path::new("").join("training_continuation_20240102_030405"),
            timestamp: "20240102_030405".into(),
        };
        assert_eq!(
            session.sample_prefix("a"),
            PathBuf::from("training_continuation_20240102_030405/a")
        );
    }

    #[test]
    fn second_session_in_same_second_fails_on_backup_dir() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let at = datetime!(2024-01-02 03:04:05 UTC);
        TrainingSession::create(dir.path(), at)?;

        let err = TrainingSession::create(dir.path(), at).unwrap_err();
        assert!(matches!(err, ContinuationError::Io { .. }));
        Ok(())
    }

    #[test]
    fn backup_copies_bytes_and_mtime() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let model = dir.path().join("eng.traineddata");
        fs::write(&model, b"\x00model-bytes\xff")?;

        let session = TrainingSession::create(dir.path(), datetime!(2024-01-02 03:04:05 UTC))?;
        let backup = session.backup_model(&model)?;

        assert_eq!(backup, session.backup_dir().join("eng.traineddata"));
        assert_eq!(fs::read(&backup)?, fs::read(&model)?);
        assert_eq!(
            fs::metadata(&backup)?.modified()?,
            fs::metadata(&model)?.modified()?
        );
        Ok(())
    }

    #[test]
    fn backup_of_read_only_model_keeps_mtime() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let model = dir.path().join("eng.traineddata");
        fs::write(&model, b"model")?;
        let old = FileTime::from_unix_time(1_600_000_000, 0);
        filetime::set_file_mtime(&model, old)?;
        let mut perms = fs::metadata(&model)?.permissions();
        perms.set_readonly(true);
        fs::set_permissions(&model, perms)?;

        let session = TrainingSession::create(dir.path(), datetime!(2024-01-02 03:04:05 UTC))?;
        let backup = session.backup_model(&model)?;

        assert!(fs::metadata(&backup)?.permissions().readonly());
        assert_eq!(
            FileTime::from_last_modification_time(&fs::metadata(&backup)?),
            old
        );
        Ok(())
    }

    #[test]
    fn backup_of_missing_model_fails()-> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let session = TrainingSession::create(dir.path(), datetime!(2024-01-02 03:04:05 UTC))?;

        let err = session.backup_model(&dir.path().join("missing.traineddata")).unwrap_err();
        assert!(matches!(err, ContinuationError::Io { .. }));
        Ok(())
    }

    #[test]
    fn manifest_has_no_trailing_newline() -> anyhow::Result<()> {
        let dir = tempfile::TempDir::new()?;
        let session = TrainingSession::create(dir.path(), datetime!(2024-01-02 03:04:05 UTC))?;

        let path = session.write_manifest(&[PathBuf::from("x/a"), PathBuf::from("x/c")])?;
        assert_eq!(fs::read_to_string(path)?, "x/a\nx/c");

        let path = session.write_manifest(&[])?;
        assert_eq!(fs::read_to_string(path)?, "");
        Ok(())
    }
}
