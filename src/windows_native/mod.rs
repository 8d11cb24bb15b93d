mod filesystem;
mod win32;

pub use filesystem::WindowsFileSystem;
