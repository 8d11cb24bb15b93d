mod filesystem;

pub use filesystem::PosixFileSystem;
