use std::ffi::OsStr;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use crate::common::encoding::{native_to_portable, NativeString};
use crate::common::error::{OperationError, Result};
use crate::common::mode::FileOpenMode;
use crate::common::stream::FileHandle;
use crate::common::types::{FileSystemConfig, PortablePath};
use crate::filesystem::FileSystem;
use crate::logging;
use crate::DEV_NULL;

/// POSIX backend. Links need no directory flag and full resolution is
/// available through `realpath(3)`.
pub struct PosixFileSystem {
    _private: (),
}

impl PosixFileSystem {
    pub fn new(config: Option<&FileSystemConfig>) -> Self {
        // Every flag is Windows-specific; read them only to validate.
        let _ = FileSystemConfig::effective_flags(config);
        Self { _private: () }
    }
}

impl Default for PosixFileSystem {
    fn default() -> Self {
        Self::new(None)
    }
}

fn native_path(value: &NativeString) -> &Path {
    Path::new(OsStr::from_bytes(value.as_bytes()))
}

fn io_failure(operation: &'static str, err: &std::io::Error) -> OperationError {
    let err = OperationError::from_io(operation, err);
    logging::failure(logging::TARGET_POSIX, &err);
    err
}

impl FileSystem for PosixFileSystem {
    fn create_symlink(&self, target: &PortablePath, link_path: &PortablePath) -> Result<()> {
        let native_target = NativeString::from_portable(target.as_bytes())?;
        let native_link = NativeString::from_portable(link_path.as_bytes())?;
        log::debug!(target: logging::TARGET_POSIX, "symlink {link_path} -> {target}");
        std::os::unix::fs::symlink(native_path(&native_target), native_path(&native_link))
            .map_err(|err| io_failure("symlink", &err))
    }

    fn read_symlink(&self, link_path: &PortablePath) -> Result<PortablePath> {
        let native_link = NativeString::from_portable(link_path.as_bytes())?;
        let target =
            fs::read_link(native_path(&native_link)).map_err(|err| io_failure("readlink", &err))?;
        native_to_portable(target.as_os_str().as_bytes())
    }

    fn resolve_symlink(&self, link_path: &PortablePath) -> Result<PortablePath> {
        let native_link = NativeString::from_portable(link_path.as_bytes())?;
        let resolved = fs::canonicalize(native_path(&native_link))
            .map_err(|err| io_failure("realpath", &err))?;
        native_to_portable(resolved.as_os_str().as_bytes())
    }

    fn open_file(&self, path: &PortablePath, mode: &FileOpenMode) -> Result<FileHandle> {
        let native_file = NativeString::from_portable(path.as_bytes())?;
        let rendered = mode.without_text_flag().to_mode_string();
        let native_mode = NativeString::from_portable(rendered.as_bytes())?;
        let stream = unsafe { libc::fopen(native_file.as_ptr(), native_mode.as_ptr()) };
        if stream.is_null() {
            let err = OperationError::last_os_error("fopen");
            logging::failure(logging::TARGET_POSIX, &err);
            return Err(err);
        }
        unsafe { FileHandle::from_raw(stream) }.ok_or_else(|| OperationError::native("fopen", None))
    }

    fn dev_null(&self) -> &'static str {
        DEV_NULL
    }
}
