use core::ffi::c_char;
use std::fmt;

#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HostFsStatus {
    Ok = 0,
    EncodingFailure = 1,
    NativeFailure = 2,
    Unsupported = 3,
    InvalidArgument = 4,
}

#[repr(i32)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HostFsLogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct HostFsStringView {
    pub ptr: *const c_char,
    pub len: usize,
}

impl HostFsStringView {
    pub const fn empty() -> Self {
        Self {
            ptr: std::ptr::null(),
            len: 0,
        }
    }

    pub(crate) const fn from_static(value: &'static str) -> Self {
        Self {
            ptr: value.as_ptr() as *const c_char,
            len: value.len(),
        }
    }
}

/// Bits for `hostfs_log_set_components`, one per `hostfs::<component>`
/// log target.
pub const HOSTFS_LOG_COMPONENT_ENCODING: u32 = 1 << 0;
pub const HOSTFS_LOG_COMPONENT_CONFIG: u32 = 1 << 1;
pub const HOSTFS_LOG_COMPONENT_WINDOWS: u32 = 1 << 2;
pub const HOSTFS_LOG_COMPONENT_POSIX: u32 = 1 << 3;
pub const HOSTFS_LOG_COMPONENT_ALL: u32 = HOSTFS_LOG_COMPONENT_ENCODING
    | HOSTFS_LOG_COMPONENT_CONFIG
    | HOSTFS_LOG_COMPONENT_WINDOWS
    | HOSTFS_LOG_COMPONENT_POSIX;

/// One log record handed to the host callback. Views are valid only for the
/// duration of the call. For a failed native call `operation` names the OS
/// function and `native_code` carries its error when `has_native_code` is
/// non-zero; both are empty/zero for other records.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct HostFsLogRecord {
    pub level: HostFsLogLevel,
    pub component: u32,
    pub target: HostFsStringView,
    pub message: HostFsStringView,
    pub operation: HostFsStringView,
    pub has_native_code: u32,
    pub native_code: u32,
    pub file: HostFsStringView,
    pub line: u32,
}

/// Filled in by the C ABI when an operation fails and the caller passed a
/// non-null pointer. `native_code` is meaningful only when `has_native_code`
/// is non-zero.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct HostFsErrorInfo {
    pub size: u32,
    pub status: HostFsStatus,
    pub has_native_code: u32,
    pub native_code: u32,
    pub reserved: [u64; 4],
}

impl Default for HostFsErrorInfo {
    fn default() -> Self {
        Self {
            size: std::mem::size_of::<HostFsErrorInfo>() as u32,
            status: HostFsStatus::Ok,
            has_native_code: 0,
            native_code: 0,
            reserved: [0; 4],
        }
    }
}

/// Passes `SYMBOLIC_LINK_FLAG_ALLOW_UNPRIVILEGED_CREATE` when creating links
/// (Windows Developer Mode). Ignored elsewhere.
pub const HOSTFS_FLAG_ALLOW_UNPRIVILEGED_SYMLINK: u32 = 1 << 0;
/// Return `read_symlink` results in verbatim `\\?\` form. Ignored elsewhere.
pub const HOSTFS_FLAG_KEEP_VERBATIM_PREFIX: u32 = 1 << 1;

pub(crate) const HOSTFS_KNOWN_FLAGS: u32 =
    HOSTFS_FLAG_ALLOW_UNPRIVILEGED_SYMLINK | HOSTFS_FLAG_KEEP_VERBATIM_PREFIX;

#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct FileSystemConfig {
    pub size: u32,
    pub flags: u32,
    pub reserved: [u64; 6],
}

impl Default for FileSystemConfig {
    fn default() -> Self {
        Self::with_flags(0)
    }
}

impl FileSystemConfig {
    pub fn with_flags(flags: u32) -> Self {
        Self {
            size: std::mem::size_of::<FileSystemConfig>() as u32,
            flags,
            reserved: [0; 6],
        }
    }

    /// Flags of a config that may come from an older caller. Undersized
    /// structs are treated as the default configuration.
    pub(crate) fn effective_flags(config: Option<&FileSystemConfig>) -> u32 {
        let Some(config) = config else {
            return 0;
        };
        if (config.size as usize) < std::mem::size_of::<FileSystemConfig>() {
            log::warn!(
                target: crate::logging::TARGET_CONFIG,
                "config size {} is smaller than expected, using defaults",
                config.size
            );
            return 0;
        }
        let unknown = config.flags & !HOSTFS_KNOWN_FLAGS;
        if unknown != 0 {
            log::warn!(
                target: crate::logging::TARGET_CONFIG,
                "ignoring unknown config flags {unknown:#x}"
            );
        }
        config.flags & HOSTFS_KNOWN_FLAGS
    }
}

/// A file-system path in the portable encoding (UTF-8 bytes).
///
/// Values are never validated on construction; validation happens when a
/// path crosses into native form, so invalid bytes surface as an
/// encoding failure from the operation that tried to use them.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortablePath(Vec<u8>);

impl PortablePath {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn to_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<&str> for PortablePath {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for PortablePath {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl From<&[u8]> for PortablePath {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl From<Vec<u8>> for PortablePath {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl AsRef<[u8]> for PortablePath {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for PortablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}
