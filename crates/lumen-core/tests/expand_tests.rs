use lumen_core::error::Error;
use lumen_core::upload::{expand, is_supported_archive, InputKind};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn write_file(path: &Path, contents: &[u8]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn file_names(files: &[std::path::PathBuf]) -> Vec<String> {
    let mut names: Vec<String> = files
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_single_file_expansion() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.jpg");
    write_file(&path, b"jpeg bytes");

    let expansion = expand(&path).unwrap();
    assert_eq!(expansion.kind, InputKind::SingleFile);
    assert_eq!(expansion.files, vec![path]);
    assert!(expansion.label.is_none());
}

#[test]
fn test_missing_path_is_an_error() {
    let dir = TempDir::new().unwrap();
    let result = expand(&dir.path().join("nope.jpg"));
    assert!(matches!(result, Err(Error::FileNotFound(_))));
}

#[test]
fn test_directory_expansion_walks_recursively_and_skips_hidden() {
    let dir = TempDir::new().unwrap();
    write_file(&dir.path().join("a.jpg"), b"a");
    write_file(&dir.path().join("sub/b.png"), b"b");
    write_file(&dir.path().join("sub/deeper/c.mov"), b"c");
    write_file(&dir.path().join(".hidden.jpg"), b"h");
    write_file(&dir.path().join("sub/.DS_Store"), b"d");

    let expansion = expand(dir.path()).unwrap();
    assert_eq!(expansion.kind, InputKind::Directory);
    assert_eq!(
        file_names(&expansion.files),
        vec!["a.jpg", "b.png", "c.mov"]
    );
    assert_eq!(
        expansion.label.as_deref(),
        dir.path().file_name().map(|n| n.to_str().unwrap())
    );
}

#[test]
fn test_bare_compression_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("photo.jpg.gz");
    write_file(&path, b"not really gzip");

    let result = expand(&path);
    assert!(matches!(result, Err(Error::UnsupportedArchive(_))));
}

#[test]
fn test_archive_detection_by_extension() {
    assert!(is_supported_archive(Path::new("x.zip")));
    assert!(is_supported_archive(Path::new("x.tar")));
    assert!(is_supported_archive(Path::new("x.tar.gz")));
    assert!(is_supported_archive(Path::new("x.tgz")));
    assert!(is_supported_archive(Path::new("x.tar.bz2")));
    assert!(is_supported_archive(Path::new("x.tar.xz")));
    assert!(is_supported_archive(Path::new("X.ZIP")));
    assert!(!is_supported_archive(Path::new("x.gz")));
    assert!(!is_supported_archive(Path::new("x.jpg")));
    assert!(!is_supported_archive(Path::new("x")));
}

#[test]
fn test_zip_expansion_extracts_all_entries() {
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("vacation.zip");

    let file = File::create(&archive_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    writer.start_file("one.jpg", options).unwrap();
    writer.write_all(b"first").unwrap();
    writer.start_file("nested/two.png", options).unwrap();
    writer.write_all(b"second").unwrap();
    writer.finish().unwrap();

    let expansion = expand(&archive_path).unwrap();
    assert_eq!(expansion.kind, InputKind::Archive);
    assert_eq!(expansion.label.as_deref(), Some("vacation"));
    assert_eq!(file_names(&expansion.files), vec!["one.jpg", "two.png"]);

    let mut contents: Vec<Vec<u8>> = expansion
        .files
        .iter()
        .map(|p| fs::read(p).unwrap())
        .collect();
    contents.sort();
    assert_eq!(contents, vec![b"first".to_vec(), b"second".to_vec()]);
}

#[test]
fn test_zip_traversal_entries_are_never_extracted() {
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("evil.zip");

    let file = File::create(&archive_path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::FileOptions::default();
    writer.start_file("../escape.txt", options).unwrap();
    writer.write_all(b"nope").unwrap();
    writer.start_file("/abs/escape.txt", options).unwrap();
    writer.write_all(b"nope").unwrap();
    writer.start_file("safe.jpg", options).unwrap();
    writer.write_all(b"ok").unwrap();
    writer.finish().unwrap();

    let expansion = expand(&archive_path).unwrap();
    assert_eq!(file_names(&expansion.files), vec!["safe.jpg"]);
    // Nothing escaped next to the archive
    assert!(!dir.path().join("escape.txt").exists());
    assert!(!Path::new("/abs/escape.txt").exists());
}

#[test]
fn test_tar_expansion_round_trip() {
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("trip.tar");

    let file = File::create(&archive_path).unwrap();
    let mut builder = tar::Builder::new(file);
    append_tar_entry(&mut builder, "a.jpg", b"alpha");
    append_tar_entry(&mut builder, "sub/b.mov", b"beta");
    builder.finish().unwrap();

    let expansion = expand(&archive_path).unwrap();
    assert_eq!(expansion.kind, InputKind::Archive);
    assert_eq!(expansion.label.as_deref(), Some("trip"));
    assert_eq!(file_names(&expansion.files), vec!["a.jpg", "b.mov"]);
}

#[test]
fn test_tar_gz_expansion_round_trip() {
    let dir = TempDir::new().unwrap();
    let archive_path = dir.path().join("trip.tar.gz");

    let file = File::create(&archive_path).unwrap();
    let encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    append_tar_entry(&mut builder, "c.png", b"gamma");
    builder.into_inner().unwrap().finish().unwrap();

    let expansion = expand(&archive_path).unwrap();
    assert_eq!(expansion.kind, InputKind::Archive);
    // "trip.tar.gz" stems to "trip.tar"
    assert_eq!(expansion.label.as_deref(), Some("trip.tar"));
    assert_eq!(file_names(&expansion.files), vec!["c.png"]);
    assert_eq!(fs::read(&expansion.files[0]).unwrap(), b"gamma");
}

fn append_tar_entry<W: Write>(builder: &mut tar::Builder<W>, name: &str, data: &[u8]) {
    let mut header = tar::Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder.append_data(&mut header, name, data).unwrap();
}
