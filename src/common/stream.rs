use std::io;
use std::ptr::NonNull;

use crate::common::error::{OperationError, Result};

/// An open C stdio stream returned by `FileSystem::open_file`.
///
/// The stream is closed on drop. Use [`FileHandle::into_raw`] to hand it to C
/// code that takes over ownership.
#[derive(Debug)]
pub struct FileHandle {
    stream: NonNull<libc::FILE>,
}

// A FILE* carries its own lock in every C runtime we target.
unsafe impl Send for FileHandle {}

impl FileHandle {
    /// Takes ownership of `stream`. Returns `None` for a null pointer.
    ///
    /// # Safety
    /// `stream` must be a live stream that nothing else will close.
    pub unsafe fn from_raw(stream: *mut libc::FILE) -> Option<Self> {
        NonNull::new(stream).map(|stream| Self { stream })
    }

    pub fn as_raw(&self) -> *mut libc::FILE {
        self.stream.as_ptr()
    }

    pub fn into_raw(self) -> *mut libc::FILE {
        let stream = self.stream.as_ptr();
        std::mem::forget(self);
        stream
    }

    /// Closes the stream and reports a failed final flush.
    pub fn close(self) -> Result<()> {
        let stream = self.into_raw();
        let rc = unsafe { libc::fclose(stream) };
        if rc != 0 {
            return Err(OperationError::last_os_error("fclose"));
        }
        Ok(())
    }
}

impl Drop for FileHandle {
    fn drop(&mut self) {
        unsafe {
            libc::fclose(self.stream.as_ptr());
        }
    }
}

impl io::Read for FileHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let stream = self.stream.as_ptr();
        let read = unsafe { libc::fread(buf.as_mut_ptr().cast(), 1, buf.len(), stream) };
        if read == 0 && unsafe { libc::ferror(stream) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(read)
    }
}

impl io::Write for FileHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let written =
            unsafe { libc::fwrite(buf.as_ptr().cast(), 1, buf.len(), self.stream.as_ptr()) };
        if written == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        if unsafe { libc::fflush(self.stream.as_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}
