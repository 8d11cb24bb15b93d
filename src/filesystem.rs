use crate::common::error::Result;
use crate::common::mode::FileOpenMode;
use crate::common::stream::FileHandle;
use crate::common::types::PortablePath;

/// Portable file-system operations consumed by the host layer.
///
/// Every path argument is converted to native form before any OS call and
/// every returned path is converted back; a failed conversion is reported as
/// an encoding failure and nothing touches the file system. Implementations
/// hold no mutable state.
pub trait FileSystem: Send + Sync {
    /// Creates `link_path` pointing at `target`.
    fn create_symlink(&self, target: &PortablePath, link_path: &PortablePath) -> Result<()>;

    /// Returns what `link_path` points at without following it further.
    fn read_symlink(&self, link_path: &PortablePath) -> Result<PortablePath>;

    /// Follows the whole chain of links to a real path. Backends that cannot
    /// do this return `OperationError::Unsupported`; callers then fall back to
    /// repeated `read_symlink`.
    fn resolve_symlink(&self, link_path: &PortablePath) -> Result<PortablePath>;

    /// Opens a C stdio stream on `path`. The mode is rendered in its
    /// canonical form before it reaches the C runtime.
    fn open_file(&self, path: &PortablePath, mode: &FileOpenMode) -> Result<FileHandle>;

    /// Path of the platform's null device, usable with `open_file`.
    fn dev_null(&self) -> &'static str;
}
