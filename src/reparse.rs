//! Decoding of `FSCTL_GET_REPARSE_POINT` output and the Windows path
//! manipulation `read_symlink` needs around it.
//!
//! Everything here works on raw bytes and UTF-16 units so it can be unit
//! tested on any host.

pub const IO_REPARSE_TAG_MOUNT_POINT: u32 = 0xA000_0003;
pub const IO_REPARSE_TAG_SYMLINK: u32 = 0xA000_000C;
pub const SYMLINK_FLAG_RELATIVE: u32 = 0x0000_0001;
pub const MAXIMUM_REPARSE_DATA_BUFFER_SIZE: usize = 16 * 1024;

// ReparseTag (u32), ReparseDataLength (u16), Reserved (u16).
const HEADER_LEN: usize = 8;
// Four u16 name offsets/lengths.
const NAME_FIELDS_LEN: usize = 8;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum LinkKind {
    Symlink,
    MountPoint,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReparseTarget {
    pub kind: LinkKind,
    /// Target as stored, still carrying any `\??\` prefix.
    pub path: Vec<u16>,
    pub relative: bool,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ReparseParseError {
    Truncated,
    UnsupportedTag(u32),
}

fn read_u16(buf: &[u8], at: usize) -> Result<u16, ReparseParseError> {
    buf.get(at..at + 2)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or(ReparseParseError::Truncated)
}

fn read_u32(buf: &[u8], at: usize) -> Result<u32, ReparseParseError> {
    buf.get(at..at + 4)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or(ReparseParseError::Truncated)
}

fn read_name(path_buffer: &[u8], offset: u16, len: u16) -> Result<Vec<u16>, ReparseParseError> {
    let start = offset as usize;
    let end = start + len as usize;
    if len % 2 != 0 {
        return Err(ReparseParseError::Truncated);
    }
    let bytes = path_buffer
        .get(start..end)
        .ok_or(ReparseParseError::Truncated)?;
    Ok(bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// Decodes a `REPARSE_DATA_BUFFER` for a symlink or mount point.
///
/// The substitute name is preferred; the print name is used only when the
/// substitute name is empty.
pub fn parse_reparse_buffer(buf: &[u8]) -> Result<ReparseTarget, ReparseParseError> {
    let tag = read_u32(buf, 0)?;
    let data_len = read_u16(buf, 4)? as usize;
    if buf.len() < HEADER_LEN + data_len {
        return Err(ReparseParseError::Truncated);
    }
    let data = &buf[HEADER_LEN..HEADER_LEN + data_len];

    let (kind, flags, path_start) = match tag {
        IO_REPARSE_TAG_SYMLINK => (
            LinkKind::Symlink,
            read_u32(data, NAME_FIELDS_LEN)?,
            NAME_FIELDS_LEN + 4,
        ),
        IO_REPARSE_TAG_MOUNT_POINT => (LinkKind::MountPoint, 0, NAME_FIELDS_LEN),
        other => return Err(ReparseParseError::UnsupportedTag(other)),
    };

    let substitute_offset = read_u16(data, 0)?;
    let substitute_len = read_u16(data, 2)?;
    let print_offset = read_u16(data, 4)?;
    let print_len = read_u16(data, 6)?;
    let path_buffer = data.get(path_start..).ok_or(ReparseParseError::Truncated)?;

    let mut path = read_name(path_buffer, substitute_offset, substitute_len)?;
    if path.is_empty() {
        path = read_name(path_buffer, print_offset, print_len)?;
    }

    Ok(ReparseTarget {
        kind,
        path,
        relative: (flags & SYMLINK_FLAG_RELATIVE) != 0,
    })
}

fn units(value: &str) -> Vec<u16> {
    value.encode_utf16().collect()
}

fn is_separator(unit: u16) -> bool {
    unit == b'\\' as u16 || unit == b'/' as u16
}

fn ascii_lower(unit: u16) -> u16 {
    if (b'A' as u16..=b'Z' as u16).contains(&unit) {
        unit + 32
    } else {
        unit
    }
}

fn is_ascii_letter(unit: u16) -> bool {
    (b'a' as u16..=b'z' as u16).contains(&ascii_lower(unit))
}

fn replace_prefix(path: &[u16], prefix: &str, replacement: &str) -> Option<Vec<u16>> {
    let prefix = units(prefix);
    if path.len() < prefix.len() {
        return None;
    }
    let (head, rest) = path.split_at(prefix.len());
    if !head
        .iter()
        .zip(prefix.iter())
        .all(|(a, b)| ascii_lower(*a) == ascii_lower(*b))
    {
        return None;
    }
    let mut out = units(replacement);
    out.extend_from_slice(rest);
    Some(out)
}

fn has_drive_prefix(path: &[u16]) -> bool {
    path.len() >= 2 && is_ascii_letter(path[0]) && path[1] == b':' as u16
}

/// Drops the NT object-manager prefix stored in reparse data:
/// `\??\C:\x` becomes `C:\x` and `\??\UNC\srv\share` becomes `\\srv\share`.
/// Anything else under `\??\` (volume GUIDs, device names) has no plain
/// Win32 spelling and keeps a verbatim `\\?\` prefix instead.
pub fn strip_nt_prefix(path: &[u16]) -> Vec<u16> {
    if let Some(unc) = replace_prefix(path, "\\??\\UNC\\", "\\\\") {
        return unc;
    }
    match replace_prefix(path, "\\??\\", "") {
        Some(rest) if has_drive_prefix(&rest) => rest,
        Some(rest) => {
            let mut out = units("\\\\?\\");
            out.extend_from_slice(&rest);
            out
        }
        None => path.to_vec(),
    }
}

/// Drops a Win32 verbatim prefix when the remainder is an ordinary drive or
/// UNC path. Volume GUID paths keep it, since they have no other spelling.
pub fn strip_verbatim_prefix(path: &[u16]) -> Vec<u16> {
    if let Some(unc) = replace_prefix(path, "\\\\?\\UNC\\", "\\\\") {
        return unc;
    }
    match replace_prefix(path, "\\\\?\\", "") {
        Some(rest) if has_drive_prefix(&rest) => rest,
        _ => path.to_vec(),
    }
}

/// Spells a drive or UNC path in verbatim form: `C:\x` becomes `\\?\C:\x`
/// and `\\srv\share` becomes `\\?\UNC\srv\share`. Paths already in
/// verbatim or device form, or without a drive or share, come back as is.
pub fn add_verbatim_prefix(path: &[u16]) -> Vec<u16> {
    if has_drive_prefix(path) {
        let mut out = units("\\\\?\\");
        out.extend_from_slice(path);
        return out;
    }
    let is_device = replace_prefix(path, "\\\\?\\", "").is_some()
        || replace_prefix(path, "\\\\.\\", "").is_some();
    if !is_device && path.len() > 2 && is_separator(path[0]) && is_separator(path[1]) {
        let mut out = units("\\\\?\\UNC\\");
        out.extend_from_slice(&path[2..]);
        return out;
    }
    path.to_vec()
}

/// True when `path` is interpreted relative to a directory rather than a
/// root: no leading separator and no drive letter.
pub fn is_relative(path: &[u16]) -> bool {
    match path.first() {
        None => true,
        Some(first) if is_separator(*first) => false,
        Some(_) => !has_drive_prefix(path),
    }
}

/// True for `\x`: rooted, but on whatever drive the path is read against.
pub fn is_root_relative(path: &[u16]) -> bool {
    match path {
        [first, rest @ ..] => {
            is_separator(*first) && !rest.first().is_some_and(|unit| is_separator(*unit))
        }
        [] => false,
    }
}

/// Index just past `count` separator-delimited components starting at
/// `start`, or the end of `path` if it runs out first.
fn component_end(path: &[u16], start: usize, count: usize) -> usize {
    let mut end = start;
    for i in 0..count {
        if i > 0 {
            end += 1;
        }
        match path[end..].iter().position(|unit| is_separator(*unit)) {
            Some(pos) => end += pos,
            None => return path.len(),
        }
    }
    end
}

/// The drive (`C:`), share (`\\srv\share`) or verbatim volume
/// (`\\?\C:`, `\\?\Volume{..}`) a path lives on. `None` when the path
/// itself depends on the current drive.
fn path_root(path: &[u16]) -> Option<&[u16]> {
    if has_drive_prefix(path) {
        return Some(&path[..2]);
    }
    if replace_prefix(path, "\\\\?\\UNC\\", "").is_some() {
        return Some(&path[..component_end(path, 8, 2)]);
    }
    let device = replace_prefix(path, "\\\\?\\", "")
        .or_else(|| replace_prefix(path, "\\\\.\\", ""));
    if let Some(rest) = device {
        if has_drive_prefix(&rest) {
            return Some(&path[..6]);
        }
        return Some(&path[..component_end(path, 4, 1)]);
    }
    if path.len() >= 2 && is_separator(path[0]) && is_separator(path[1]) {
        return Some(&path[..component_end(path, 2, 2)]);
    }
    None
}

/// Resolves a relative link target against the directory holding the link.
/// A link path without any separator lives in the current directory, so the
/// target is returned as is.
pub fn join_relative(link_path: &[u16], target: &[u16]) -> Vec<u16> {
    match link_path.iter().rposition(|unit| is_separator(*unit)) {
        Some(idx) => {
            let mut out = Vec::with_capacity(idx + 1 + target.len());
            out.extend_from_slice(&link_path[..=idx]);
            out.extend_from_slice(target);
            out
        }
        None => target.to_vec(),
    }
}

/// Places a link target the way the OS does when it follows the link:
/// relative targets under the link's directory, root-relative targets on
/// the link's drive or share. Absolute targets come back unchanged.
pub fn resolve_against_link(link_path: &[u16], target: &[u16]) -> Vec<u16> {
    if is_root_relative(target) {
        return match path_root(link_path) {
            Some(root) => {
                let mut out = root.to_vec();
                out.extend_from_slice(target);
                out
            }
            None => target.to_vec(),
        };
    }
    if is_relative(target) {
        return join_relative(link_path, target);
    }
    target.to_vec()
}
