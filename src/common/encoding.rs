use std::ffi::{CStr, CString};

use crate::common::error::{ConversionStage, OperationError, Result};
use crate::common::types::PortablePath;

pub const PATH_CONVERSION_ERROR: &str = "Error converting path between UTF-8 and native encoding";

fn input_failure(detail: &str) -> OperationError {
    log::debug!(target: crate::logging::TARGET_ENCODING, "input conversion failed: {detail}");
    OperationError::encoding(ConversionStage::Input)
}

fn output_failure(detail: &str) -> OperationError {
    log::debug!(target: crate::logging::TARGET_ENCODING, "output conversion failed: {detail}");
    OperationError::encoding(ConversionStage::Output)
}

fn portable_str(bytes: &[u8]) -> Result<&str> {
    if bytes.contains(&0) {
        return Err(input_failure("embedded NUL"));
    }
    std::str::from_utf8(bytes).map_err(|_| input_failure("invalid UTF-8"))
}

/// NUL-terminated UTF-16 text, the native encoding of the wide Win32 API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WideString {
    units: Vec<u16>,
}

impl WideString {
    pub fn from_portable(bytes: &[u8]) -> Result<Self> {
        let text = portable_str(bytes)?;
        Ok(Self {
            units: text.encode_utf16().chain(std::iter::once(0)).collect(),
        })
    }

    /// Wraps units that are already native. Anything after an embedded NUL
    /// would be invisible to the OS, so the value is cut there.
    pub(crate) fn from_units(units: &[u16]) -> Self {
        let end = units.iter().position(|unit| *unit == 0).unwrap_or(units.len());
        let mut owned = Vec::with_capacity(end + 1);
        owned.extend_from_slice(&units[..end]);
        owned.push(0);
        Self { units: owned }
    }

    pub fn as_ptr(&self) -> *const u16 {
        self.units.as_ptr()
    }

    /// The code units without the terminator.
    pub fn as_units(&self) -> &[u16] {
        &self.units[..self.units.len() - 1]
    }
}

/// Converts native UTF-16 back to a portable path. Stops at the first NUL.
pub fn wide_to_portable(units: &[u16]) -> Result<PortablePath> {
    let end = units.iter().position(|unit| *unit == 0).unwrap_or(units.len());
    String::from_utf16(&units[..end])
        .map(PortablePath::from)
        .map_err(|_| output_failure("unpaired UTF-16 surrogate"))
}

/// NUL-terminated bytes for the narrow POSIX and C runtime API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NativeString {
    value: CString,
}

impl NativeString {
    pub fn from_portable(bytes: &[u8]) -> Result<Self> {
        let text = portable_str(bytes)?;
        let value = CString::new(text).map_err(|_| input_failure("embedded NUL"))?;
        Ok(Self { value })
    }

    pub fn as_ptr(&self) -> *const libc::c_char {
        self.value.as_ptr()
    }

    pub fn as_c_str(&self) -> &CStr {
        &self.value
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.value.as_bytes()
    }
}

/// Converts native bytes back to a portable path; they must be UTF-8.
pub fn native_to_portable(bytes: &[u8]) -> Result<PortablePath> {
    std::str::from_utf8(bytes)
        .map(PortablePath::from)
        .map_err(|_| output_failure("invalid UTF-8"))
}
