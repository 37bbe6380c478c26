//! Fixtures shared by the pipeline tests.

use crate::Context;
use epubfix_config::{Config, Metadata, Rule};
use epubfix_storage::StagingArea;
use epubfix_transform::Pipelines;
use std::io::{Cursor, Read, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

pub const MIMETYPE: &[u8] = b"application/epub+zip";
pub const CONTAINER: &[u8] = b"<?xml version=\"1.0\"?>\n<container version=\"1.0\"/>\n";
pub const OPF: &[u8] = b"<package><metadata><dc:title>A Book</dc:title></metadata></package>\n";
pub const CHAPTER: &[u8] = b"<html><body><p><em>Hello</em>, world</p></body></html>\n";
/// Not valid UTF-8.
pub const COVER: &[u8] = b"\xFF\xD8\xFF\xE0\x00\x10JFIF\x00\x01\xFF\xFE\x80\x81";

/// Write a zip to `path`. Names ending in `/` become directory entries.
pub fn write_archive(path: &Path, entries: &[(&str, &[u8])]) {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, content) in entries {
        if name.ends_with('/') {
            zip.add_directory(name.to_string(), options).unwrap();
        } else {
            zip.start_file(name.to_string(), options).unwrap();
            zip.write_all(content).unwrap();
        }
    }
    std::fs::write(path, zip.finish().unwrap().into_inner()).unwrap();
}

pub fn book(path: &Path) {
    write_archive(
        path,
        &[
            ("mimetype", MIMETYPE),
            ("META-INF/container.xml", CONTAINER),
            ("OEBPS/", b"".as_slice()),
            ("OEBPS/content.opf", OPF),
            ("OEBPS/Text/chapter1.xhtml", CHAPTER),
            ("OEBPS/Images/cover.jpg", COVER),
        ],
    );
}

/// Every member of the archive at `path`, in archive order.
pub fn read_archive(path: &Path) -> Vec<(String, Vec<u8>)> {
    let mut zip = ZipArchive::new(Cursor::new(std::fs::read(path).unwrap())).unwrap();
    (0..zip.len())
        .map(|index| {
            let mut file = zip.by_index(index).unwrap();
            let mut content = Vec::new();
            file.read_to_end(&mut content).unwrap();
            (file.name().to_string(), content)
        })
        .collect()
}

pub fn member(members: &[(String, Vec<u8>)], name: &str) -> Option<Vec<u8>> {
    members.iter().find(|(member, _)| member == name).map(|(_, content)| content.clone())
}

/// Rewrites `<em>` as `<i>` in HTML members.
pub fn config() -> Config {
    let mut config = Config::default();
    config
        .regexes
        .insert("html".to_string(), vec![Rule::new("<em>", "<i>"), Rule::new("</em>", "</i>")]);
    config
}

pub fn context(dir: &Path, config: &Config) -> Context {
    let staging = StagingArea::new(dir.join("out")).unwrap();
    let pipelines = Pipelines::build(config, &Metadata::new()).unwrap();
    Context::new(dir.join("book.epub"), staging, pipelines).with_backup_prefix(config.backup_prefix.clone())
}
