use std::ffi::c_void;
use std::sync::Mutex;
use std::thread::{self, ThreadId};

use hostfs::*;

use super::support::TempDir;

/// What a callback saw, reduced to owned data.
#[derive(Debug)]
struct Seen {
    thread: ThreadId,
    level: HostFsLogLevel,
    component: u32,
    operation: String,
    native_code: Option<u32>,
}

static SEEN: Mutex<Vec<Seen>> = Mutex::new(Vec::new());
// The backend is process-wide; tests that reconfigure it take turns.
static LOG_MUTEX: Mutex<()> = Mutex::new(());

fn view_str(view: &HostFsStringView) -> String {
    if view.ptr.is_null() {
        return String::new();
    }
    let bytes = unsafe { std::slice::from_raw_parts(view.ptr as *const u8, view.len) };
    String::from_utf8_lossy(bytes).into_owned()
}

extern "C" fn record_callback(record: *const HostFsLogRecord, _user_data: *mut c_void) {
    let Some(rec) = (unsafe { record.as_ref() }) else {
        return;
    };
    SEEN.lock().unwrap().push(Seen {
        thread: thread::current().id(),
        level: rec.level,
        component: rec.component,
        operation: view_str(&rec.operation),
        native_code: (rec.has_native_code != 0).then_some(rec.native_code),
    });
}

/// Records emitted on this test's thread; other tests in the binary run
/// hostfs operations concurrently.
fn take_seen() -> Vec<Seen> {
    let me = thread::current().id();
    let mut seen = SEEN.lock().unwrap();
    let (mine, others): (Vec<_>, Vec<_>) = seen.drain(..).partition(|s| s.thread == me);
    *seen = others;
    mine
}

fn capture(level: HostFsLogLevel, components: u32) {
    assert_eq!(
        hostfs_log_set_callback(Some(record_callback), std::ptr::null_mut(), level),
        HostFsStatus::Ok
    );
    assert_eq!(hostfs_log_set_components(components), HostFsStatus::Ok);
    take_seen();
}

fn reset() {
    hostfs_log_disable();
    hostfs_log_set_components(HOSTFS_LOG_COMPONENT_ALL);
}

#[test]
fn failed_read_symlink_reports_operation_and_errno() {
    let _guard = LOG_MUTEX.lock().unwrap();
    capture(HostFsLogLevel::Debug, HOSTFS_LOG_COMPONENT_ALL);

    let temp = TempDir::new("log_readlink");
    let err = PlatformFileSystem::default()
        .read_symlink(&temp.join("missing").as_str().into())
        .unwrap_err();
    assert_eq!(err.native_code(), Some(libc::ENOENT as u32));

    let seen = take_seen();
    reset();
    let failure = seen
        .iter()
        .find(|s| s.operation == "readlink")
        .expect("readlink failure record");
    assert_eq!(failure.level, HostFsLogLevel::Debug);
    assert_eq!(failure.component, HOSTFS_LOG_COMPONENT_POSIX);
    assert_eq!(failure.native_code, Some(libc::ENOENT as u32));
}

#[test]
fn component_mask_filters_backend_records() {
    let _guard = LOG_MUTEX.lock().unwrap();
    capture(HostFsLogLevel::Debug, HOSTFS_LOG_COMPONENT_ENCODING);

    let temp = TempDir::new("log_mask");
    let fs = PlatformFileSystem::default();
    fs.read_symlink(&temp.join("missing").as_str().into())
        .unwrap_err();
    fs.read_symlink(&PortablePath::new(b"/tmp/\xff".to_vec()))
        .unwrap_err();

    let seen = take_seen();
    reset();
    assert!(seen.iter().all(|s| s.component == HOSTFS_LOG_COMPONENT_ENCODING));
    let encoding = seen.first().expect("encoding failure record");
    assert!(encoding.operation.is_empty());
    assert_eq!(encoding.native_code, None);
}

#[test]
fn level_above_debug_hides_failures() {
    let _guard = LOG_MUTEX.lock().unwrap();
    capture(HostFsLogLevel::Warn, HOSTFS_LOG_COMPONENT_ALL);

    let temp = TempDir::new("log_level");
    PlatformFileSystem::default()
        .open_file(&temp.join("missing").as_str().into(), &FileOpenMode::read())
        .unwrap_err();

    let seen = take_seen();
    reset();
    assert!(seen.is_empty(), "unexpected records: {seen:?}");
}

#[test]
fn undersized_config_warns_under_config_component() {
    let _guard = LOG_MUTEX.lock().unwrap();
    capture(HostFsLogLevel::Warn, HOSTFS_LOG_COMPONENT_CONFIG);

    let mut config = FileSystemConfig::default();
    config.size = 1;
    drop(PlatformFileSystem::new(Some(&config)));

    let seen = take_seen();
    reset();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].level, HostFsLogLevel::Warn);
    assert_eq!(seen[0].component, HOSTFS_LOG_COMPONENT_CONFIG);
}

#[test]
fn unknown_component_bits_are_rejected() {
    assert_eq!(hostfs_log_set_components(1 << 20), HostFsStatus::InvalidArgument);
}
