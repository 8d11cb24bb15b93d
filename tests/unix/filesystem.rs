use std::ffi::OsStr;
use std::fs;
use std::io::{Read, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::Path;

use hostfs::*;

use super::support::TempDir;

fn platform() -> PlatformFileSystem {
    PlatformFileSystem::new(None)
}

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn platform_filesystem_is_shareable() {
    assert_send_sync::<PlatformFileSystem>();
}

#[test]
fn create_then_read_symlink() {
    let temp = TempDir::new("create_read");
    let target = temp.join("target.txt");
    let link = temp.join("link.txt");
    fs::write(&target, b"data").expect("write target");

    platform().create_symlink(&target.as_str().into(), &link.as_str().into()).unwrap();

    let read = platform().read_symlink(&link.as_str().into()).unwrap();
    assert_eq!(read, PortablePath::from(target.as_str()));
}

#[test]
fn read_symlink_returns_stored_relative_target() {
    let temp = TempDir::new("relative");
    fs::create_dir(temp.path.join("data")).unwrap();
    fs::write(temp.path.join("data/file.bin"), b"x").unwrap();
    let link = temp.join("link.bin");

    platform().create_symlink(&"data/file.bin".into(), &link.as_str().into()).unwrap();

    assert_eq!(
        platform().read_symlink(&link.as_str().into()).unwrap(),
        PortablePath::from("data/file.bin")
    );
    let contents = fs::read(&link).unwrap();
    assert_eq!(contents, b"x");
}

#[test]
fn read_symlink_missing_path_is_native_failure() {
    let temp = TempDir::new("missing");
    let err = platform().read_symlink(&temp.join("nope").as_str().into()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NativeFailure);
    assert_eq!(err.native_code(), Some(libc::ENOENT as u32));
}

#[test]
fn read_symlink_on_regular_file_is_native_failure() {
    let temp = TempDir::new("regular");
    let file = temp.join("plain.txt");
    fs::write(&file, b"data").unwrap();
    let err = platform().read_symlink(&file.as_str().into()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NativeFailure);
    assert_eq!(err.native_code(), Some(libc::EINVAL as u32));
}

#[test]
fn read_symlink_non_utf8_target_fails_at_output() {
    let temp = TempDir::new("bad_target");
    let link = temp.path.join("link");
    std::os::unix::fs::symlink(Path::new(OsStr::from_bytes(b"bad\xff\xfename")), &link).unwrap();

    let err = platform()
        .read_symlink(&link.to_str().unwrap().into())
        .unwrap_err();
    assert_eq!(err, OperationError::encoding(ConversionStage::Output));
}

#[test]
fn create_symlink_over_existing_entry_fails() {
    let temp = TempDir::new("exists");
    let target = temp.join("target.txt");
    let link = temp.join("link.txt");
    fs::write(&target, b"data").unwrap();
    fs::write(&link, b"already here").unwrap();

    let err = platform()
        .create_symlink(&target.as_str().into(), &link.as_str().into())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NativeFailure);
    assert_eq!(err.native_code(), Some(libc::EEXIST as u32));
    assert_eq!(fs::read(&link).unwrap(), b"already here");
}

#[test]
fn create_symlink_with_invalid_bytes_touches_nothing() {
    let temp = TempDir::new("bad_input");
    let target = temp.join("target.txt");
    let mut link = temp.join("link").into_bytes();
    link.extend_from_slice(b"\xc3\x28");

    let err = platform()
        .create_symlink(&target.as_str().into(), &PortablePath::new(link))
        .unwrap_err();
    assert_eq!(err, OperationError::encoding(ConversionStage::Input));
    assert_eq!(temp.entry_count(), 0);

    let err = platform()
        .create_symlink(&PortablePath::new(b"t\0x".to_vec()), &temp.join("l").as_str().into())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::EncodingFailure);
    assert_eq!(temp.entry_count(), 0);
}

#[test]
fn resolve_symlink_follows_chain() {
    let temp = TempDir::new("chain");
    let target = temp.join("real.txt");
    fs::write(&target, b"data").unwrap();
    let first = temp.join("first");
    let second = temp.join("second");

    platform().create_symlink(&"real.txt".into(), &first.as_str().into()).unwrap();
    platform().create_symlink(&first.as_str().into(), &second.as_str().into()).unwrap();

    let resolved = platform().resolve_symlink(&second.as_str().into()).unwrap();
    assert_eq!(resolved, PortablePath::from(target.as_str()));
}

#[test]
fn resolve_symlink_dangling_is_native_failure() {
    let temp = TempDir::new("dangling");
    let link = temp.join("dangling");
    platform().create_symlink(&"missing".into(), &link.as_str().into()).unwrap();
    let err = platform().resolve_symlink(&link.as_str().into()).unwrap_err();
    assert_eq!(err.native_code(), Some(libc::ENOENT as u32));
}

#[test]
fn open_file_write_then_read() {
    let temp = TempDir::new("open_rw");
    let path: PortablePath = temp.join("stream.txt").as_str().into();

    let mut file = platform().open_file(&path, &FileOpenMode::write().binary()).unwrap();
    file.write_all(b"hello stream").unwrap();
    file.close().unwrap();

    let mut file = platform().open_file(&path, &FileOpenMode::parse(b"rb").unwrap()).unwrap();
    let mut contents = String::new();
    file.read_to_string(&mut contents).unwrap();
    assert_eq!(contents, "hello stream");

    let mut file = platform().open_file(&path, &FileOpenMode::append().text()).unwrap();
    file.write_all(b"!").unwrap();
    drop(file);
    assert_eq!(fs::read(temp.path.join("stream.txt")).unwrap(), b"hello stream!");
}

#[test]
fn open_file_missing_for_read_is_native_failure() {
    let temp = TempDir::new("open_missing");
    let err = platform()
        .open_file(&temp.join("absent").as_str().into(), &FileOpenMode::read())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NativeFailure);
    assert_eq!(err.native_code(), Some(libc::ENOENT as u32));
}

#[test]
fn open_file_exclusive_rejects_existing() {
    let temp = TempDir::new("open_excl");
    let path = temp.join("once.txt");
    let mode = FileOpenMode::write().exclusive().unwrap();

    drop(platform().open_file(&path.as_str().into(), &mode).unwrap());
    let err = platform().open_file(&path.as_str().into(), &mode).unwrap_err();
    assert_eq!(err.native_code(), Some(libc::EEXIST as u32));
}

#[test]
fn open_file_with_invalid_bytes_creates_nothing() {
    let temp = TempDir::new("open_bad");
    let mut path = temp.join("file").into_bytes();
    path.push(0xff);

    let err = platform()
        .open_file(&PortablePath::new(path), &FileOpenMode::write())
        .unwrap_err();
    assert_eq!(err, OperationError::encoding(ConversionStage::Input));
    assert_eq!(temp.entry_count(), 0);
}

#[test]
fn dev_null_accepts_writes() {
    let fs = platform();
    assert_eq!(fs.dev_null(), DEV_NULL);
    let mut sink = fs
        .open_file(&fs.dev_null().into(), &FileOpenMode::write())
        .unwrap();
    sink.write_all(&[0u8; 4096]).unwrap();
    sink.flush().unwrap();
}

#[test]
fn trait_object_dispatch() {
    let temp = TempDir::new("dyn");
    let target = temp.join("t");
    fs::write(&target, b"").unwrap();
    let link = temp.join("l");

    let boxed: Box<dyn FileSystem> = Box::new(PlatformFileSystem::new(Some(&FileSystemConfig::default())));
    boxed.create_symlink(&target.as_str().into(), &link.as_str().into()).unwrap();
    assert_eq!(boxed.read_symlink(&link.as_str().into()).unwrap().to_str(), Some(target.as_str()));
}
