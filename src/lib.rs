mod common;
mod ffi;
mod filesystem;
mod logging;

#[cfg(any(target_os = "windows", test))]
mod reparse;

#[cfg(target_os = "windows")]
mod windows_native;
#[cfg(target_os = "windows")]
pub use windows_native::WindowsFileSystem as PlatformFileSystem;

#[cfg(unix)]
mod posix;
#[cfg(unix)]
pub use posix::PosixFileSystem as PlatformFileSystem;

#[cfg(not(any(target_os = "windows", unix)))]
compile_error!("hostfs only supports Windows and Unix targets.");

pub use crate::common::encoding::{
    native_to_portable, wide_to_portable, NativeString, WideString, PATH_CONVERSION_ERROR,
};
pub use crate::common::error::{ConversionStage, ErrorKind, OperationError, Result};
pub use crate::common::mode::{FileOpenMode, OpenAccess, Translation};
pub use crate::common::stream::FileHandle;
pub use crate::common::types::*;
pub use crate::ffi::*;
pub use crate::filesystem::FileSystem;

/// Path of the device that discards all writes on the current platform.
#[cfg(target_os = "windows")]
pub const DEV_NULL: &str = "nul";
/// Path of the device that discards all writes on the current platform.
#[cfg(unix)]
pub const DEV_NULL: &str = "/dev/null";
