use windows_sys::Win32::Foundation::{ERROR_INVALID_REPARSE_DATA, ERROR_NOT_A_REPARSE_POINT};
use windows_sys::Win32::Storage::FileSystem::{
    FILE_ATTRIBUTE_DIRECTORY, SYMBOLIC_LINK_FLAG_ALLOW_UNPRIVILEGED_CREATE,
    SYMBOLIC_LINK_FLAG_DIRECTORY,
};

use super::win32;
use crate::common::encoding::{wide_to_portable, WideString};
use crate::common::error::{OperationError, Result};
use crate::common::mode::FileOpenMode;
use crate::common::stream::FileHandle;
use crate::common::types::{
    FileSystemConfig, PortablePath, HOSTFS_FLAG_ALLOW_UNPRIVILEGED_SYMLINK,
    HOSTFS_FLAG_KEEP_VERBATIM_PREFIX,
};
use crate::filesystem::FileSystem;
use crate::logging;
use crate::reparse::{self, ReparseParseError};
use crate::DEV_NULL;

pub struct WindowsFileSystem {
    flags: u32,
}

impl WindowsFileSystem {
    pub fn new(config: Option<&FileSystemConfig>) -> Self {
        Self {
            flags: FileSystemConfig::effective_flags(config),
        }
    }

    fn has_flag(&self, flag: u32) -> bool {
        (self.flags & flag) != 0
    }
}

impl Default for WindowsFileSystem {
    fn default() -> Self {
        Self::new(None)
    }
}

fn reparse_error(err: ReparseParseError) -> OperationError {
    let code = match err {
        ReparseParseError::Truncated => ERROR_INVALID_REPARSE_DATA,
        ReparseParseError::UnsupportedTag(tag) => {
            log::debug!(target: logging::TARGET_WINDOWS, "reparse tag {tag:#x} is not a link");
            ERROR_NOT_A_REPARSE_POINT
        }
    };
    OperationError::native("FSCTL_GET_REPARSE_POINT", Some(code))
}

impl FileSystem for WindowsFileSystem {
    fn create_symlink(&self, target: &PortablePath, link_path: &PortablePath) -> Result<()> {
        let wide_target = WideString::from_portable(target.as_bytes())?;
        let wide_link = WideString::from_portable(link_path.as_bytes())?;

        // The OS reads a relative target from the link's directory and a
        // root-relative one from the link's drive, so look it up there.
        let lookup = WideString::from_units(&reparse::resolve_against_link(
            wide_link.as_units(),
            wide_target.as_units(),
        ));
        let attrs = win32::get_file_attributes(&lookup)?;

        let mut flags = 0;
        if (attrs & FILE_ATTRIBUTE_DIRECTORY) != 0 {
            flags |= SYMBOLIC_LINK_FLAG_DIRECTORY;
        }
        if self.has_flag(HOSTFS_FLAG_ALLOW_UNPRIVILEGED_SYMLINK) {
            flags |= SYMBOLIC_LINK_FLAG_ALLOW_UNPRIVILEGED_CREATE;
        }
        log::debug!(
            target: logging::TARGET_WINDOWS,
            "CreateSymbolicLinkW {link_path} -> {target} (flags {flags:#x})"
        );
        win32::create_symbolic_link(&wide_link, &wide_target, flags)
    }

    fn read_symlink(&self, link_path: &PortablePath) -> Result<PortablePath> {
        let wide_link = WideString::from_portable(link_path.as_bytes())?;

        let data = {
            let handle = win32::open_reparse_point(&wide_link)?;
            win32::read_reparse_data(&handle)?
        };
        let target = reparse::parse_reparse_buffer(&data).map_err(reparse_error)?;
        let stored = reparse::strip_nt_prefix(&target.path);
        log::trace!(
            target: logging::TARGET_WINDOWS,
            "{link_path}: {:?} target, relative={}",
            target.kind,
            target.relative
        );

        let absolute = reparse::resolve_against_link(wide_link.as_units(), &stored);
        let full = win32::full_path_name(&WideString::from_units(&absolute))?;
        let full = if self.has_flag(HOSTFS_FLAG_KEEP_VERBATIM_PREFIX) {
            reparse::add_verbatim_prefix(&full)
        } else {
            reparse::strip_verbatim_prefix(&full)
        };
        wide_to_portable(&full)
    }

    fn resolve_symlink(&self, link_path: &PortablePath) -> Result<PortablePath> {
        let err = OperationError::unsupported("resolve_symlink");
        log::debug!(target: logging::TARGET_WINDOWS, "{link_path}: {err}");
        Err(err)
    }

    fn open_file(&self, path: &PortablePath, mode: &FileOpenMode) -> Result<FileHandle> {
        let wide_path = WideString::from_portable(path.as_bytes())?;
        let wide_mode = WideString::from_portable(mode.to_mode_string().as_bytes())?;
        win32::wfopen(&wide_path, &wide_mode)
    }

    fn dev_null(&self) -> &'static str {
        DEV_NULL
    }
}
