use core::ffi::{c_char, c_void};

use crate::common::encoding::PATH_CONVERSION_ERROR;
use crate::common::error::OperationError;
use crate::common::mode::FileOpenMode;
use crate::common::types::*;
use crate::filesystem::FileSystem;
use crate::logging::{self, HostFsLogCallback};
use crate::{PlatformFileSystem, DEV_NULL};

#[repr(C)]
pub struct HostFsHandle {
    inner: Box<dyn FileSystem>,
}

unsafe fn view_bytes<'a>(view: *const HostFsStringView) -> Result<&'a [u8], HostFsStatus> {
    let view = view.as_ref().ok_or(HostFsStatus::InvalidArgument)?;
    if view.ptr.is_null() {
        if view.len != 0 {
            return Err(HostFsStatus::InvalidArgument);
        }
        return Ok(&[]);
    }
    Ok(std::slice::from_raw_parts(view.ptr as *const u8, view.len))
}

fn write_error_info(out_error: *mut HostFsErrorInfo, status: HostFsStatus, code: Option<u32>) {
    let Some(out) = (unsafe { out_error.as_mut() }) else {
        return;
    };
    *out = HostFsErrorInfo {
        status,
        has_native_code: code.is_some() as u32,
        native_code: code.unwrap_or(0),
        ..HostFsErrorInfo::default()
    };
}

fn report(out_error: *mut HostFsErrorInfo, err: &OperationError) -> HostFsStatus {
    let status = err.status();
    write_error_info(out_error, status, err.native_code());
    status
}

fn reject(out_error: *mut HostFsErrorInfo, status: HostFsStatus) -> HostFsStatus {
    write_error_info(out_error, status, None);
    status
}

/// Copies `bytes` into a `malloc` allocation the caller frees with
/// `hostfs_free_string`.
fn write_string_view(bytes: &[u8], out: &mut HostFsStringView) -> Result<(), HostFsStatus> {
    if bytes.is_empty() {
        *out = HostFsStringView::empty();
        return Ok(());
    }
    let ptr = unsafe { libc::malloc(bytes.len()) } as *mut u8;
    if ptr.is_null() {
        return Err(HostFsStatus::NativeFailure);
    }
    unsafe {
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, bytes.len());
    }
    out.ptr = ptr as *const c_char;
    out.len = bytes.len();
    Ok(())
}

#[no_mangle]
pub extern "C" fn hostfs_create(config: *const FileSystemConfig) -> *mut HostFsHandle {
    let config = unsafe { config.as_ref() };
    let handle = HostFsHandle {
        inner: Box::new(PlatformFileSystem::new(config)),
    };
    Box::into_raw(Box::new(handle))
}

#[no_mangle]
pub extern "C" fn hostfs_destroy(handle: *mut HostFsHandle) {
    if handle.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(handle));
    }
}

#[no_mangle]
pub extern "C" fn hostfs_create_symlink(
    handle: *mut HostFsHandle,
    target: *const HostFsStringView,
    link_path: *const HostFsStringView,
    out_error: *mut HostFsErrorInfo,
) -> HostFsStatus {
    let Some(h) = (unsafe { handle.as_ref() }) else {
        return reject(out_error, HostFsStatus::InvalidArgument);
    };
    let (target, link_path) = match unsafe { (view_bytes(target), view_bytes(link_path)) } {
        (Ok(target), Ok(link_path)) => (PortablePath::from(target), PortablePath::from(link_path)),
        (Err(status), _) | (_, Err(status)) => return reject(out_error, status),
    };
    match h.inner.create_symlink(&target, &link_path) {
        Ok(()) => HostFsStatus::Ok,
        Err(err) => report(out_error, &err),
    }
}

type PathQuery = fn(&dyn FileSystem, &PortablePath) -> crate::Result<PortablePath>;

fn path_query(
    handle: *mut HostFsHandle,
    link_path: *const HostFsStringView,
    out_path: *mut HostFsStringView,
    out_error: *mut HostFsErrorInfo,
    query: PathQuery,
) -> HostFsStatus {
    let Some(h) = (unsafe { handle.as_ref() }) else {
        return reject(out_error, HostFsStatus::InvalidArgument);
    };
    let Some(out_path) = (unsafe { out_path.as_mut() }) else {
        return reject(out_error, HostFsStatus::InvalidArgument);
    };
    *out_path = HostFsStringView::empty();
    let link_path = match unsafe { view_bytes(link_path) } {
        Ok(bytes) => PortablePath::from(bytes),
        Err(status) => return reject(out_error, status),
    };
    match query(h.inner.as_ref(), &link_path) {
        Ok(resolved) => match write_string_view(resolved.as_bytes(), out_path) {
            Ok(()) => HostFsStatus::Ok,
            Err(status) => reject(out_error, status),
        },
        Err(err) => report(out_error, &err),
    }
}

#[no_mangle]
pub extern "C" fn hostfs_read_symlink(
    handle: *mut HostFsHandle,
    link_path: *const HostFsStringView,
    out_path: *mut HostFsStringView,
    out_error: *mut HostFsErrorInfo,
) -> HostFsStatus {
    path_query(handle, link_path, out_path, out_error, |fs, path| fs.read_symlink(path))
}

#[no_mangle]
pub extern "C" fn hostfs_resolve_symlink(
    handle: *mut HostFsHandle,
    link_path: *const HostFsStringView,
    out_path: *mut HostFsStringView,
    out_error: *mut HostFsErrorInfo,
) -> HostFsStatus {
    path_query(handle, link_path, out_path, out_error, |fs, path| fs.resolve_symlink(path))
}

/// Opens a C stdio stream. On success `*out_file` owns the stream and the
/// caller closes it with `fclose`.
#[no_mangle]
pub extern "C" fn hostfs_fopen(
    handle: *mut HostFsHandle,
    path: *const HostFsStringView,
    mode: *const HostFsStringView,
    out_file: *mut *mut libc::FILE,
    out_error: *mut HostFsErrorInfo,
) -> HostFsStatus {
    let Some(h) = (unsafe { handle.as_ref() }) else {
        return reject(out_error, HostFsStatus::InvalidArgument);
    };
    let Some(out_file) = (unsafe { out_file.as_mut() }) else {
        return reject(out_error, HostFsStatus::InvalidArgument);
    };
    *out_file = std::ptr::null_mut();
    let (path, mode) = match unsafe { (view_bytes(path), view_bytes(mode)) } {
        (Ok(path), Ok(mode)) => (PortablePath::from(path), mode),
        (Err(status), _) | (_, Err(status)) => return reject(out_error, status),
    };
    let mode = match FileOpenMode::parse(mode) {
        Ok(mode) => mode,
        Err(err) => return report(out_error, &err),
    };
    match h.inner.open_file(&path, &mode) {
        Ok(file) => {
            *out_file = file.into_raw();
            HostFsStatus::Ok
        }
        Err(err) => report(out_error, &err),
    }
}

#[no_mangle]
pub extern "C" fn hostfs_free_string(value: HostFsStringView) {
    if value.ptr.is_null() {
        return;
    }
    unsafe {
        libc::free(value.ptr as *mut libc::c_void);
    }
}

#[no_mangle]
pub extern "C" fn hostfs_dev_null() -> HostFsStringView {
    HostFsStringView::from_static(DEV_NULL)
}

#[no_mangle]
pub extern "C" fn hostfs_path_conversion_error() -> HostFsStringView {
    HostFsStringView::from_static(PATH_CONVERSION_ERROR)
}

#[no_mangle]
pub extern "C" fn hostfs_log_set_stderr(level: HostFsLogLevel) -> HostFsStatus {
    logging::log_set_stderr(level)
}

#[no_mangle]
pub extern "C" fn hostfs_log_set_callback(
    callback: HostFsLogCallback,
    user_data: *mut c_void,
    level: HostFsLogLevel,
) -> HostFsStatus {
    logging::log_set_callback(callback, user_data, level)
}

#[no_mangle]
pub extern "C" fn hostfs_log_set_level(level: HostFsLogLevel) -> HostFsStatus {
    logging::log_set_level(level)
}

#[no_mangle]
pub extern "C" fn hostfs_log_set_components(mask: u32) -> HostFsStatus {
    logging::log_set_components(mask)
}

#[no_mangle]
pub extern "C" fn hostfs_log_disable() -> HostFsStatus {
    logging::log_disable()
}
