use std::fmt;
use std::io;

use thiserror::Error;

use crate::common::encoding::PATH_CONVERSION_ERROR;
use crate::common::types::HostFsStatus;

pub type Result<T> = std::result::Result<T, OperationError>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    EncodingFailure,
    NativeFailure,
    Unsupported,
    InvalidArgument,
}

/// Which direction of the portable/native conversion failed.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConversionStage {
    /// Caller-supplied text going to the OS.
    Input,
    /// Text returned by the OS coming back to the caller.
    Output,
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionStage::Input => f.write_str("input"),
            ConversionStage::Output => f.write_str("output"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum OperationError {
    #[error("{msg} ({stage} stage)", msg = PATH_CONVERSION_ERROR)]
    Encoding { stage: ConversionStage },

    #[error("{operation} failed: {}", describe_native(.code))]
    Native {
        operation: &'static str,
        code: Option<u32>,
    },

    #[error("{operation}() isn't implemented on this platform")]
    Unsupported { operation: &'static str },

    #[error("invalid argument: {detail}")]
    InvalidArgument { detail: String },
}

fn describe_native(code: &Option<u32>) -> String {
    match code {
        Some(code) => {
            let os = io::Error::from_raw_os_error(*code as i32);
            format!("{os} (native error {code})")
        }
        None => "no native error code available".to_string(),
    }
}

impl OperationError {
    pub fn encoding(stage: ConversionStage) -> Self {
        OperationError::Encoding { stage }
    }

    pub fn native(operation: &'static str, code: Option<u32>) -> Self {
        OperationError::Native { operation, code }
    }

    pub fn unsupported(operation: &'static str) -> Self {
        OperationError::Unsupported { operation }
    }

    pub fn invalid_argument(detail: impl Into<String>) -> Self {
        OperationError::InvalidArgument {
            detail: detail.into(),
        }
    }

    /// Captures the calling thread's last OS error (`GetLastError` / `errno`).
    /// Must be called before anything else can overwrite it.
    pub fn last_os_error(operation: &'static str) -> Self {
        Self::from_io(operation, &io::Error::last_os_error())
    }

    pub fn from_io(operation: &'static str, err: &io::Error) -> Self {
        OperationError::Native {
            operation,
            code: err.raw_os_error().map(|code| code as u32),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            OperationError::Encoding { .. } => ErrorKind::EncodingFailure,
            OperationError::Native { .. } => ErrorKind::NativeFailure,
            OperationError::Unsupported { .. } => ErrorKind::Unsupported,
            OperationError::InvalidArgument { .. } => ErrorKind::InvalidArgument,
        }
    }

    /// The OS function (or unsupported operation) the error is about.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            OperationError::Native { operation, .. }
            | OperationError::Unsupported { operation } => Some(*operation),
            _ => None,
        }
    }

    pub fn native_code(&self) -> Option<u32> {
        match self {
            OperationError::Native { code, .. } => *code,
            _ => None,
        }
    }

    pub fn status(&self) -> HostFsStatus {
        match self.kind() {
            ErrorKind::EncodingFailure => HostFsStatus::EncodingFailure,
            ErrorKind::NativeFailure => HostFsStatus::NativeFailure,
            ErrorKind::Unsupported => HostFsStatus::Unsupported,
            ErrorKind::InvalidArgument => HostFsStatus::InvalidArgument,
        }
    }
}
