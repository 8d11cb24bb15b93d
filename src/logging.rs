//! `log` backend for hosts that embed hostfs through the C ABI.
//!
//! Every record hostfs emits uses a `hostfs::<component>` target; the host
//! chooses a sink, a level and the components it wants, and records from
//! other crates are never forwarded. Failed operations go through
//! [`failure`], which attaches the native operation and its error code as
//! structured fields. The callback sink hands those to the host as record
//! fields; the stderr sink appends them to the line.

use core::ffi::{c_char, c_void};
use std::fmt::Write as _;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{OnceLock, RwLock};

use log::kv::{self, Key, Value, VisitSource};
use log::{Level, LevelFilter, Log, Metadata, Record};

use crate::common::error::OperationError;
use crate::common::types::{
    HostFsLogLevel, HostFsLogRecord, HostFsStatus, HostFsStringView, HOSTFS_LOG_COMPONENT_ALL,
    HOSTFS_LOG_COMPONENT_CONFIG, HOSTFS_LOG_COMPONENT_ENCODING, HOSTFS_LOG_COMPONENT_POSIX,
    HOSTFS_LOG_COMPONENT_WINDOWS,
};

pub type HostFsLogCallback =
    Option<extern "C" fn(record: *const HostFsLogRecord, user_data: *mut c_void)>;

pub(crate) const TARGET_ENCODING: &str = "hostfs::encoding";
pub(crate) const TARGET_CONFIG: &str = "hostfs::config";
pub(crate) const TARGET_WINDOWS: &str = "hostfs::windows";
pub(crate) const TARGET_POSIX: &str = "hostfs::posix";

const COMPONENTS: [(&str, u32); 4] = [
    (TARGET_ENCODING, HOSTFS_LOG_COMPONENT_ENCODING),
    (TARGET_CONFIG, HOSTFS_LOG_COMPONENT_CONFIG),
    (TARGET_WINDOWS, HOSTFS_LOG_COMPONENT_WINDOWS),
    (TARGET_POSIX, HOSTFS_LOG_COMPONENT_POSIX),
];

const KEY_OPERATION: &str = "operation";
const KEY_NATIVE_CODE: &str = "native_code";

/// Component bit for a record target; `None` for anything outside hostfs.
fn component_of(target: &str) -> Option<u32> {
    COMPONENTS
        .iter()
        .find(|(prefix, _)| {
            target
                .strip_prefix(*prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
        })
        .map(|(_, bit)| *bit)
}

/// Logs a failed operation at debug level under `target`.
pub(crate) fn failure(target: &'static str, err: &OperationError) {
    match (err.operation(), err.native_code()) {
        (Some(operation), Some(code)) => {
            log::debug!(target: target, operation = operation, native_code = code; "{err}")
        }
        (Some(operation), None) => log::debug!(target: target, operation = operation; "{err}"),
        (None, _) => log::debug!(target: target, "{err}"),
    }
}

#[derive(Default)]
struct FailureFields {
    operation: Option<String>,
    native_code: Option<u32>,
}

impl<'kvs> VisitSource<'kvs> for FailureFields {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), kv::Error> {
        match key.as_str() {
            KEY_OPERATION => self.operation = Some(value.to_string()),
            KEY_NATIVE_CODE => {
                self.native_code = value.to_u64().and_then(|code| u32::try_from(code).ok())
            }
            _ => {}
        }
        Ok(())
    }
}

impl FailureFields {
    fn from_record(record: &Record) -> Self {
        let mut fields = Self::default();
        // The visitor never fails, so neither does the walk.
        let _ = record.key_values().visit(&mut fields);
        fields
    }
}

#[derive(Copy, Clone)]
enum Sink {
    Disabled,
    Stderr,
    Callback {
        callback: extern "C" fn(record: *const HostFsLogRecord, user_data: *mut c_void),
        user_data: usize,
    },
}

/// Process-wide backend. The level lives in `log::max_level`; this only
/// tracks where records go and which components pass.
pub struct HostFsLogger {
    sink: RwLock<Sink>,
    components: AtomicU32,
}

impl HostFsLogger {
    const fn new() -> Self {
        Self {
            sink: RwLock::new(Sink::Disabled),
            components: AtomicU32::new(HOSTFS_LOG_COMPONENT_ALL),
        }
    }

    fn sink(&self) -> Sink {
        self.sink.read().map(|sink| *sink).unwrap_or(Sink::Disabled)
    }

    fn set_sink(&self, sink: Sink) {
        if let Ok(mut slot) = self.sink.write() {
            *slot = sink;
        }
    }

    fn wants(&self, component: u32) -> bool {
        self.components.load(Ordering::Relaxed) & component != 0
    }
}

impl Log for HostFsLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
            && component_of(metadata.target()).is_some_and(|bit| self.wants(bit))
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(component) = component_of(record.target()) else {
            return;
        };
        // Copied out so the callback may call back into hostfs_log_*.
        match self.sink() {
            Sink::Disabled => {}
            Sink::Stderr => eprintln!("{}", stderr_line(record)),
            Sink::Callback {
                callback,
                user_data,
            } => emit_callback(callback, user_data as *mut c_void, component, record),
        }
    }

    fn flush(&self) {}
}

fn stderr_line(record: &Record) -> String {
    let fields = FailureFields::from_record(record);
    let mut line = format!("[hostfs][{}][{}] {}", record.level(), record.target(), record.args());
    if let Some(operation) = &fields.operation {
        let _ = write!(line, " {KEY_OPERATION}={operation}");
    }
    if let Some(code) = fields.native_code {
        let _ = write!(line, " {KEY_NATIVE_CODE}={code}");
    }
    line
}

fn emit_callback(
    callback: extern "C" fn(record: *const HostFsLogRecord, user_data: *mut c_void),
    user_data: *mut c_void,
    component: u32,
    record: &Record,
) {
    let message = record.args().to_string();
    let fields = FailureFields::from_record(record);
    let c_record = HostFsLogRecord {
        level: level_to_hostfs(record.level()),
        component,
        target: string_view(record.target()),
        message: string_view(&message),
        operation: string_view(fields.operation.as_deref().unwrap_or("")),
        has_native_code: fields.native_code.is_some() as u32,
        native_code: fields.native_code.unwrap_or(0),
        file: string_view(record.file().unwrap_or("")),
        line: record.line().unwrap_or(0),
    };
    callback(&c_record, user_data);
}

static LOGGER: HostFsLogger = HostFsLogger::new();
static REGISTERED: OnceLock<bool> = OnceLock::new();

/// Registers the backend on first use. False when the host process already
/// installed its own `log` backend: hostfs records then go there and only
/// the global level is ours to change.
fn registered() -> bool {
    *REGISTERED.get_or_init(|| match log::set_logger(&LOGGER) {
        Ok(()) => {
            log::set_max_level(LevelFilter::Off);
            true
        }
        Err(_) => {
            log::warn!(
                target: TARGET_CONFIG,
                "a log backend is already installed; hostfs records go to it and the \
                 stderr and callback sinks are unavailable"
            );
            false
        }
    })
}

fn level_filter(level: HostFsLogLevel) -> LevelFilter {
    match level {
        HostFsLogLevel::Off => LevelFilter::Off,
        HostFsLogLevel::Error => LevelFilter::Error,
        HostFsLogLevel::Warn => LevelFilter::Warn,
        HostFsLogLevel::Info => LevelFilter::Info,
        HostFsLogLevel::Debug => LevelFilter::Debug,
        HostFsLogLevel::Trace => LevelFilter::Trace,
    }
}

fn level_to_hostfs(level: Level) -> HostFsLogLevel {
    match level {
        Level::Error => HostFsLogLevel::Error,
        Level::Warn => HostFsLogLevel::Warn,
        Level::Info => HostFsLogLevel::Info,
        Level::Debug => HostFsLogLevel::Debug,
        Level::Trace => HostFsLogLevel::Trace,
    }
}

fn string_view(value: &str) -> HostFsStringView {
    HostFsStringView {
        ptr: value.as_ptr() as *const c_char,
        len: value.len(),
    }
}

pub fn log_set_stderr(level: HostFsLogLevel) -> HostFsStatus {
    if !registered() {
        return HostFsStatus::Unsupported;
    }
    LOGGER.set_sink(Sink::Stderr);
    log::set_max_level(level_filter(level));
    HostFsStatus::Ok
}

pub fn log_set_callback(
    callback: HostFsLogCallback,
    user_data: *mut c_void,
    level: HostFsLogLevel,
) -> HostFsStatus {
    let Some(callback) = callback else {
        return log_disable();
    };
    if !registered() {
        return HostFsStatus::Unsupported;
    }
    LOGGER.set_sink(Sink::Callback {
        callback,
        user_data: user_data as usize,
    });
    log::set_max_level(level_filter(level));
    HostFsStatus::Ok
}

pub fn log_set_level(level: HostFsLogLevel) -> HostFsStatus {
    registered();
    log::set_max_level(level_filter(level));
    HostFsStatus::Ok
}

/// Restricts forwarding to the `HOSTFS_LOG_COMPONENT_*` bits in `mask`.
pub fn log_set_components(mask: u32) -> HostFsStatus {
    if mask & !HOSTFS_LOG_COMPONENT_ALL != 0 {
        return HostFsStatus::InvalidArgument;
    }
    if !registered() {
        return HostFsStatus::Unsupported;
    }
    LOGGER.components.store(mask, Ordering::Relaxed);
    HostFsStatus::Ok
}

pub fn log_disable() -> HostFsStatus {
    if registered() {
        LOGGER.set_sink(Sink::Disabled);
    }
    log::set_max_level(LevelFilter::Off);
    HostFsStatus::Ok
}
