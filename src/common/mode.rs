use crate::common::error::{ConversionStage, OperationError, Result};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OpenAccess {
    Read,
    Write,
    Append,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Translation {
    /// Whatever the C runtime defaults to.
    Default,
    Binary,
    Text,
}

/// A C stdio open mode (`"r"`, `"wb+"`, `"ax"`...).
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct FileOpenMode {
    access: OpenAccess,
    update: bool,
    translation: Translation,
    exclusive: bool,
}

impl FileOpenMode {
    const fn with_access(access: OpenAccess) -> Self {
        Self {
            access,
            update: false,
            translation: Translation::Default,
            exclusive: false,
        }
    }

    pub const fn read() -> Self {
        Self::with_access(OpenAccess::Read)
    }

    pub const fn write() -> Self {
        Self::with_access(OpenAccess::Write)
    }

    pub const fn append() -> Self {
        Self::with_access(OpenAccess::Append)
    }

    pub const fn update(mut self) -> Self {
        self.update = true;
        self
    }

    pub const fn binary(mut self) -> Self {
        self.translation = Translation::Binary;
        self
    }

    pub const fn text(mut self) -> Self {
        self.translation = Translation::Text;
        self
    }

    /// Fail if the file already exists. Only valid with write access.
    pub fn exclusive(mut self) -> Result<Self> {
        if self.access != OpenAccess::Write {
            return Err(OperationError::invalid_argument(
                "exclusive open requires write access",
            ));
        }
        self.exclusive = true;
        Ok(self)
    }

    pub fn access(&self) -> OpenAccess {
        self.access
    }

    pub fn is_update(&self) -> bool {
        self.update
    }

    pub fn translation(&self) -> Translation {
        self.translation
    }

    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }

    /// Parses a portable-encoded stdio mode. Modifiers may appear in any
    /// order after the access letter, each at most once.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|_| OperationError::encoding(ConversionStage::Input))?;
        let invalid = || OperationError::invalid_argument(format!("invalid open mode {text:?}"));

        let mut chars = text.chars();
        let mut mode = match chars.next() {
            Some('r') => Self::read(),
            Some('w') => Self::write(),
            Some('a') => Self::append(),
            _ => return Err(invalid()),
        };

        let mut seen_translation = false;
        for ch in chars {
            match ch {
                '+' if !mode.update => mode.update = true,
                'b' if !seen_translation => {
                    mode.translation = Translation::Binary;
                    seen_translation = true;
                }
                't' if !seen_translation => {
                    mode.translation = Translation::Text;
                    seen_translation = true;
                }
                'x' if !mode.exclusive && mode.access == OpenAccess::Write => {
                    mode.exclusive = true
                }
                _ => return Err(invalid()),
            }
        }
        Ok(mode)
    }

    /// Canonical mode string: access letter, translation, `+`, then `x`.
    pub fn to_mode_string(&self) -> String {
        let mut out = String::with_capacity(4);
        out.push(match self.access {
            OpenAccess::Read => 'r',
            OpenAccess::Write => 'w',
            OpenAccess::Append => 'a',
        });
        match self.translation {
            Translation::Default => {}
            Translation::Binary => out.push('b'),
            Translation::Text => out.push('t'),
        }
        if self.update {
            out.push('+');
        }
        if self.exclusive {
            out.push('x');
        }
        out
    }

    /// Same mode without an explicit text flag, which POSIX libc does not
    /// define.
    pub(crate) fn without_text_flag(mut self) -> Self {
        if self.translation == Translation::Text {
            self.translation = Translation::Default;
        }
        self
    }
}
