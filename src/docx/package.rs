use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::reader::parse_document_xml;
use super::tree::Document;
use super::writer::write_document_xml;
use crate::error::{EngineError, EngineResult};

pub const DOCUMENT_PART: &str = "word/document.xml";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

#[derive(Debug, Clone)]
struct PackageEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
}

#[derive(Debug, Clone)]
pub struct DocxPackage {
    source: Option<PathBuf>,
    entries: Vec<PackageEntry>,
    pub document: Document,
}

impl DocxPackage {
    pub fn open(path: &Path) -> EngineResult<Self> {
        let file = File::open(path).map_err(|err| EngineError::io(path, err))?;
        let mut archive = ZipArchive::new(file).map_err(|source| EngineError::Zip {
            path: path.to_path_buf(),
            source,
        })?;

        let mut entries = Vec::with_capacity(archive.len());
        let mut document_xml = None;

        for index in 0..archive.len() {
            let mut entry = archive.by_index(index).map_err(|source| EngineError::Zip {
                path: path.to_path_buf(),
                source,
            })?;
            if entry.is_dir() {
                continue;
            }

            let name = entry.name().to_string();
            let compression = entry.compression();
            let mut data = Vec::new();
            entry
                .read_to_end(&mut data)
                .map_err(|err| EngineError::io(path, err))?;

            if name == DOCUMENT_PART {
                let xml = String::from_utf8(data.clone()).map_err(|_| {
                    EngineError::structural(format!(
                        "{DOCUMENT_PART} in {} is not valid utf-8",
                        path.display()
                    ))
                })?;
                document_xml = Some(xml);
            }

            entries.push(PackageEntry {
                name,
                data,
                compression,
            });
        }

        let xml = document_xml.ok_or_else(|| {
            EngineError::structural(format!("{} has no {DOCUMENT_PART}", path.display()))
        })?;
        let document = parse_document_xml(&xml)?;
        debug!(
            path = %path.display(),
            parts = entries.len(),
            blocks = document.body.len(),
            "opened docx package"
        );

        Ok(Self {
            source: Some(path.to_path_buf()),
            entries,
            document,
        })
    }

    pub fn from_document(document: Document) -> Self {
        let part = |name: &str, data: &str| PackageEntry {
            name: name.to_string(),
            data: data.as_bytes().to_vec(),
            compression: CompressionMethod::Deflated,
        };

        Self {
            source: None,
            entries: vec![
                part("[Content_Types].xml", CONTENT_TYPES),
                part("_rels/.rels", ROOT_RELS),
                part(DOCUMENT_PART, ""),
            ],
            document,
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn part_names(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.name.as_str()).collect()
    }

    // Writes next to the target and renames over it so readers never see a partial file.
    pub fn save(&self, path: &Path) -> EngineResult<()> {
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&directory).map_err(|err| EngineError::io(&directory, err))?;

        let temp = NamedTempFile::new_in(&directory).map_err(|err| EngineError::io(&directory, err))?;
        let zip_error = |source| EngineError::Zip {
            path: path.to_path_buf(),
            source,
        };

        let document_xml = write_document_xml(&self.document);
        let mut writer = ZipWriter::new(temp.as_file());
        for entry in &self.entries {
            let compression = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(compression);
            writer
                .start_file(entry.name.as_str(), options)
                .map_err(zip_error)?;

            let data = if entry.name == DOCUMENT_PART {
                document_xml.as_bytes()
            } else {
                entry.data.as_slice()
            };
            writer
                .write_all(data)
                .map_err(|err| EngineError::io(path, err))?;
        }
        writer.finish().map_err(zip_error)?;

        temp.persist(path)
            .map_err(|err| EngineError::io(path, err.error))?;
        debug!(path = %path.display(), "saved docx package");
        Ok(())
    }
}

pub struct ScopedDocx {
    file: NamedTempFile,
}

impl ScopedDocx {
    pub fn new() -> EngineResult<Self> {
        let file = tempfile::Builder::new()
            .prefix("qualdoc-")
            .suffix(".docx")
            .tempfile()
            .map_err(|err| EngineError::io(std::env::temp_dir(), err))?;
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
