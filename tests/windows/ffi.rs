use std::ffi::c_char;

use hostfs::*;

struct TestHandle {
    handle: *mut HostFsHandle,
}

impl TestHandle {
    fn new() -> Self {
        Self {
            handle: hostfs_create(std::ptr::null()),
        }
    }
}

impl Drop for TestHandle {
    fn drop(&mut self) {
        hostfs_destroy(self.handle);
    }
}

fn make_view(value: &[u8]) -> (Vec<u8>, HostFsStringView) {
    let bytes = value.to_vec();
    let view = HostFsStringView {
        ptr: bytes.as_ptr() as *const c_char,
        len: bytes.len(),
    };
    (bytes, view)
}

#[test]
fn resolve_symlink_reports_unsupported() {
    let handle = TestHandle::new();
    let (_l, link_view) = make_view(b"C:\\link.txt");
    let mut out = HostFsStringView::empty();
    let mut info = HostFsErrorInfo::default();

    let status = hostfs_resolve_symlink(handle.handle, &link_view, &mut out, &mut info);
    assert_eq!(status, HostFsStatus::Unsupported);
    assert_eq!(info.status, HostFsStatus::Unsupported);
    assert_eq!(info.has_native_code, 0);
    assert!(out.ptr.is_null());
}

#[test]
fn read_symlink_missing_reports_native_code() {
    let handle = TestHandle::new();
    let mut path = std::env::temp_dir();
    path.push(format!("hostfs_ffi_missing_{}", std::process::id()));
    let (_l, link_view) = make_view(path.to_str().unwrap().as_bytes());
    let mut out = HostFsStringView::empty();
    let mut info = HostFsErrorInfo::default();

    let status = hostfs_read_symlink(handle.handle, &link_view, &mut out, &mut info);
    assert_eq!(status, HostFsStatus::NativeFailure);
    assert_eq!(info.has_native_code, 1);
    assert_eq!(info.native_code, 2);
}

#[test]
fn fopen_nul_device() {
    let handle = TestHandle::new();
    let dev_null = hostfs_dev_null();
    let (_m, mode_view) = make_view(b"w");
    let mut file: *mut libc::FILE = std::ptr::null_mut();

    let status = hostfs_fopen(handle.handle, &dev_null, &mode_view, &mut file, std::ptr::null_mut());
    assert_eq!(status, HostFsStatus::Ok);
    assert!(!file.is_null());
    assert_eq!(unsafe { libc::fclose(file) }, 0);
}
