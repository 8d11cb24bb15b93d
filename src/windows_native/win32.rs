use std::ffi::c_void;

use windows_sys::Win32::Foundation::{
    CloseHandle, ERROR_FILENAME_EXCED_RANGE, HANDLE, INVALID_HANDLE_VALUE,
};
use windows_sys::Win32::Storage::FileSystem::{
    CreateFileW, CreateSymbolicLinkW, GetFileAttributesW, GetFullPathNameW,
    FILE_FLAG_BACKUP_SEMANTICS, FILE_FLAG_OPEN_REPARSE_POINT, FILE_READ_ATTRIBUTES,
    FILE_SHARE_DELETE, FILE_SHARE_READ, FILE_SHARE_WRITE, INVALID_FILE_ATTRIBUTES, OPEN_EXISTING,
};
use windows_sys::Win32::System::Ioctl::FSCTL_GET_REPARSE_POINT;
use windows_sys::Win32::System::IO::DeviceIoControl;

use crate::common::encoding::WideString;
use crate::common::error::{OperationError, Result};
use crate::common::stream::FileHandle;
use crate::logging;
use crate::reparse::MAXIMUM_REPARSE_DATA_BUFFER_SIZE;

/// Longest path the wide API accepts, in UTF-16 units.
pub const MAX_LONG_PATH: usize = 32_767;

extern "C" {
    fn _wfopen_s(
        stream: *mut *mut libc::FILE,
        filename: *const u16,
        mode: *const u16,
    ) -> libc::c_int;
}

/// Owns a file handle and closes it when dropped.
pub struct HandleGuard(HANDLE);

impl HandleGuard {
    pub fn raw(&self) -> HANDLE {
        self.0
    }
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.0);
        }
    }
}

fn last_error(operation: &'static str) -> OperationError {
    let err = OperationError::last_os_error(operation);
    logging::failure(logging::TARGET_WINDOWS, &err);
    err
}

pub fn get_file_attributes(path: &WideString) -> Result<u32> {
    let attrs = unsafe { GetFileAttributesW(path.as_ptr()) };
    if attrs == INVALID_FILE_ATTRIBUTES {
        return Err(last_error("GetFileAttributesW"));
    }
    Ok(attrs)
}

pub fn create_symbolic_link(link: &WideString, target: &WideString, flags: u32) -> Result<()> {
    let ok = unsafe { CreateSymbolicLinkW(link.as_ptr(), target.as_ptr(), flags) };
    if ok == 0 {
        return Err(last_error("CreateSymbolicLinkW"));
    }
    Ok(())
}

/// Opens the link itself, never what it points to. Backup semantics let
/// directory links open as well.
pub fn open_reparse_point(path: &WideString) -> Result<HandleGuard> {
    let handle = unsafe {
        CreateFileW(
            path.as_ptr(),
            FILE_READ_ATTRIBUTES,
            FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE,
            std::ptr::null_mut(),
            OPEN_EXISTING,
            FILE_FLAG_OPEN_REPARSE_POINT | FILE_FLAG_BACKUP_SEMANTICS,
            0,
        )
    };
    if handle == INVALID_HANDLE_VALUE {
        return Err(last_error("CreateFileW"));
    }
    Ok(HandleGuard(handle))
}

pub fn read_reparse_data(handle: &HandleGuard) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; MAXIMUM_REPARSE_DATA_BUFFER_SIZE];
    let mut returned: u32 = 0;
    let ok = unsafe {
        DeviceIoControl(
            handle.raw(),
            FSCTL_GET_REPARSE_POINT,
            std::ptr::null(),
            0,
            buf.as_mut_ptr() as *mut c_void,
            buf.len() as u32,
            &mut returned,
            std::ptr::null_mut(),
        )
    };
    if ok == 0 {
        return Err(last_error("DeviceIoControl"));
    }
    buf.truncate(returned as usize);
    Ok(buf)
}

/// OS normalization of a path (`.`/`..`, separators, drive-relative forms)
/// without touching the file system.
pub fn full_path_name(path: &WideString) -> Result<Vec<u16>> {
    let mut buf = vec![0u16; MAX_LONG_PATH + 1];
    let len = unsafe {
        GetFullPathNameW(
            path.as_ptr(),
            buf.len() as u32,
            buf.as_mut_ptr(),
            std::ptr::null_mut(),
        )
    } as usize;
    if len == 0 {
        return Err(last_error("GetFullPathNameW"));
    }
    if len >= buf.len() {
        // The return value is the required size, not a path length.
        return Err(OperationError::native(
            "GetFullPathNameW",
            Some(ERROR_FILENAME_EXCED_RANGE),
        ));
    }
    buf.truncate(len);
    Ok(buf)
}

pub fn wfopen(path: &WideString, mode: &WideString) -> Result<FileHandle> {
    let mut stream: *mut libc::FILE = std::ptr::null_mut();
    let rc = unsafe { _wfopen_s(&mut stream, path.as_ptr(), mode.as_ptr()) };
    if rc != 0 {
        // errno, not a Win32 code, so it stays out of the error.
        log::debug!(
            target: logging::TARGET_WINDOWS,
            operation = "_wfopen_s", errno = rc;
            "_wfopen_s failed with errno {rc}"
        );
        return Err(OperationError::native("_wfopen_s", None));
    }
    unsafe { FileHandle::from_raw(stream) }
        .ok_or_else(|| OperationError::native("_wfopen_s", None))
}
