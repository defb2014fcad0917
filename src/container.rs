//! ZIP container for WordprocessingML packages.
//!
//! Reading resolves the main document part through the package
//! relationships; writing emits the three parts a minimal `.docx` needs.

use crate::error::{Error, Result};
use std::cell::RefCell;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Package-relative path of the main document part.
pub const DOCUMENT_PART: &str = "word/document.xml";

const PACKAGE_RELS_PART: &str = "_rels/.rels";
const CONTENT_TYPES_PART: &str = "[Content_Types].xml";

const OFFICE_DOCUMENT_REL: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";

const PACKAGE_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

/// A relationship entry from a .rels part.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path
    pub target: String,
}

/// Compression applied to every part when writing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl From<Compression> for CompressionMethod {
    fn from(c: Compression) -> Self {
        match c {
            Compression::Deflated => CompressionMethod::Deflated,
            Compression::Stored => CompressionMethod::Stored,
        }
    }
}

/// Read access to a `.docx` package.
pub struct DocxPackage {
    archive: RefCell<ZipArchive<Cursor<Vec<u8>>>>,
}

impl DocxPackage {
    /// Open a package from a file path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = BufReader::new(file);
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Open a package from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Open a package from a reader.
    pub fn from_reader<R: Read + Seek>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Check if a part exists.
    pub fn exists(&self, path: &str) -> bool {
        let archive = self.archive.borrow();
        let found = archive.file_names().any(|n| n == path);
        found
    }

    /// Read a part as raw bytes.
    pub fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive
            .by_name(path)
            .map_err(|_| Error::MissingComponent(path.to_string()))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Read an XML part as text, decoding UTF-8 or BOM-marked UTF-16.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let bytes = self.read_binary(path)?;
        decode_xml_bytes(&bytes)
    }

    /// Package-level relationships; empty when `_rels/.rels` is absent.
    pub fn package_relationships(&self) -> Result<Vec<Relationship>> {
        match self.read_xml(PACKAGE_RELS_PART) {
            Ok(xml) => parse_relationships(&xml),
            Err(Error::MissingComponent(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Path of the main document part.
    ///
    /// Falls back to `word/document.xml` when the relationships do not name one.
    pub fn main_document_path(&self) -> Result<String> {
        let rels = self.package_relationships()?;
        let target = rels
            .iter()
            .find(|r| r.rel_type == OFFICE_DOCUMENT_REL)
            .map(|r| r.target.trim_start_matches('/').to_string());
        Ok(target.unwrap_or_else(|| DOCUMENT_PART.to_string()))
    }

    /// Read the main document part.
    pub fn read_main_document(&self) -> Result<String> {
        let path = self.main_document_path()?;
        self.read_xml(&path)
    }
}

impl std::fmt::Debug for DocxPackage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocxPackage")
            .field("files", &self.archive.borrow().len())
            .finish()
    }
}

/// Write a package holding `document_xml` as its main part.
pub fn write_package<W: Write + Seek>(
    out: W,
    document_xml: &[u8],
    compression: Compression,
) -> Result<W> {
    let mut zip = ZipWriter::new(out);
    let options = SimpleFileOptions::default().compression_method(compression.into());

    zip.start_file(PACKAGE_RELS_PART, options)?;
    zip.write_all(PACKAGE_RELS_XML.as_bytes())?;

    zip.start_file(DOCUMENT_PART, options)?;
    zip.write_all(document_xml)?;

    zip.start_file(CONTENT_TYPES_PART, options)?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())?;

    Ok(zip.finish()?)
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut rels = Vec::new();
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                };
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        _ => {}
                    }
                }
                if !rel.id.is_empty() {
                    rels.push(rel);
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(Error::XmlParse(e.to_string())),
            _ => {}
        }
    }

    Ok(rels)
}

/// Decode XML bytes handling UTF-8 (with or without BOM) and UTF-16 with BOM.
///
/// The XML declaration of a UTF-16 part is rewritten to name UTF-8, since
/// the returned string is UTF-8.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    let invalid = |e: &dyn std::fmt::Display| Error::InvalidData(format!("bad XML encoding: {}", e));

    if let Some(rest) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8(rest.to_vec()).map_err(|e| invalid(&e));
    }

    let utf16 = |rest: &[u8], from: fn([u8; 2]) -> u16| -> Result<String> {
        let units = rest.chunks_exact(2).map(|pair| from([pair[0], pair[1]]));
        let text = char::decode_utf16(units)
            .collect::<std::result::Result<String, _>>()
            .map_err(|e| invalid(&e))?;
        Ok(text.replacen("encoding=\"UTF-16\"", "encoding=\"UTF-8\"", 1)
            .replacen("encoding=\"utf-16\"", "encoding=\"UTF-8\"", 1))
    };

    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return utf16(rest, u16::from_be_bytes);
    }

    match String::from_utf8(bytes.to_vec()) {
        Ok(s) => Ok(s),
        Err(_) => Ok(String::from_utf8_lossy(bytes).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_xml_bytes() {
        let utf16_le = b"\xFF\xFE<\0?\0x\0m\0l\0>\0";
        assert_eq!(decode_xml_bytes(utf16_le).unwrap(), "<?xml>");

        let utf16_be = b"\xFE\xFF\0<\0?\0x\0m\0l\0>";
        assert_eq!(decode_xml_bytes(utf16_be).unwrap(), "<?xml>");

        let utf8_bom = b"\xEF\xBB\xBF<?xml>";
        assert_eq!(decode_xml_bytes(utf8_bom).unwrap(), "<?xml>");

        assert_eq!(decode_xml_bytes(b"<?xml>").unwrap(), "<?xml>");
    }

    #[test]
    fn test_utf16_declaration_rewritten() {
        let text = r#"<?xml version="1.0" encoding="UTF-16"?><a/>"#;
        let mut bytes = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let decoded = decode_xml_bytes(&bytes).unwrap();
        assert!(decoded.contains(r#"encoding="UTF-8""#));
    }

    #[test]
    fn test_write_then_read_package() {
        let body = br#"<w:document><w:body/></w:document>"#;
        let cursor = write_package(Cursor::new(Vec::new()), body, Compression::Deflated).unwrap();
        let package = DocxPackage::from_bytes(cursor.into_inner()).unwrap();

        assert!(package.exists(CONTENT_TYPES_PART));
        assert!(package.exists(PACKAGE_RELS_PART));
        assert_eq!(package.main_document_path().unwrap(), DOCUMENT_PART);
        assert_eq!(package.read_main_document().unwrap().as_bytes(), body);
    }

    #[test]
    fn test_parse_relationships() {
        let rels = parse_relationships(PACKAGE_RELS_XML).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].id, "rId1");
        assert_eq!(rels[0].rel_type, OFFICE_DOCUMENT_REL);
        assert_eq!(rels[0].target, "word/document.xml");
    }

    #[test]
    fn test_missing_part() {
        let cursor = write_package(Cursor::new(Vec::new()), b"<a/>", Compression::Stored).unwrap();
        let package = DocxPackage::from_bytes(cursor.into_inner()).unwrap();
        assert!(matches!(
            package.read_xml("word/styles.xml"),
            Err(Error::MissingComponent(_))
        ));
    }
}
