use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::Path;

use log::debug;
use quick_xml::Reader;
use quick_xml::events::Event;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::wml;
use crate::dom::{NodeId, XmlDom, parse_xml, to_xml_string};
use crate::error::{Error, Result};
use crate::util::{decode_part, part_dir, resolve_part_path};

const PACKAGE_RELS: &str = "_rels/.rels";
const DEFAULT_MAIN_PART: &str = "word/document.xml";

const REL_OFFICE_DOCUMENT: &str = "/officeDocument";
const REL_HEADER: &str = "/header";
const REL_FOOTER: &str = "/footer";

/// Role of a parsed content part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartKind {
    /// Main document (`w:document`/`w:body`).
    Body,
    Header,
    Footer,
}

/// A content part of the package, parsed into its own DOM.
#[derive(Debug, Clone)]
pub struct Part {
    /// Zip entry name, e.g. `word/document.xml`.
    pub name: String,
    pub kind: PartKind,
    pub dom: XmlDom,
}

impl Part {
    /// The node whose subtree holds the part's content: `w:body` for the main
    /// document, the root element (`w:hdr`/`w:ftr`) otherwise.
    pub fn content_root(&self) -> Result<NodeId> {
        let root = self
            .dom
            .root_element()
            .ok_or_else(|| Error::InvalidDocx(format!("{} has no root element", self.name)))?;
        match self.kind {
            PartKind::Body => self
                .dom
                .child_element(root, wml::BODY)
                .ok_or_else(|| Error::MissingPart(format!("{}: w:body", self.name))),
            PartKind::Header | PartKind::Footer => Ok(root),
        }
    }
}

/// Raw zip entry, kept so untouched entries are written back byte-for-byte.
#[derive(Debug, Clone)]
struct Entry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// An opened DOCX package held in memory.
///
/// Every zip entry is read up front; the main document and its headers and
/// footers are parsed into [`Part`]s that can be mutated before [`save`].
///
/// [`save`]: DocxPackage::save
#[derive(Debug, Clone)]
pub struct DocxPackage {
    entries: Vec<Entry>,
    parts: Vec<Part>,
}

impl DocxPackage {
    /// Open a DOCX file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    /// Read a DOCX package from any [`Read`] + [`Seek`] source.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut entries = Vec::with_capacity(archive.len());

        for index in 0..archive.len() {
            let mut file = archive.by_index(index)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            entries.push(Entry {
                name: file.name().to_string(),
                compression: file.compression(),
                is_dir: file.is_dir(),
                data,
            });
        }

        let mut package = Self {
            entries,
            parts: Vec::new(),
        };

        let main = package.find_main_part()?;
        debug!("main document part: {main}");
        let rels_name = rels_path_for(&main);
        let base_dir = part_dir(&main).to_string();

        let mut parts = vec![package.load_part(&main, PartKind::Body)?];
        if let Some(rels) = package.entry(&rels_name) {
            for rel in parse_relationships(rels)? {
                if rel.external {
                    continue;
                }
                let kind = if rel.rel_type.ends_with(REL_HEADER) {
                    PartKind::Header
                } else if rel.rel_type.ends_with(REL_FOOTER) {
                    PartKind::Footer
                } else {
                    continue;
                };
                let name = resolve_part_path(&base_dir, &rel.target);
                if parts.iter().any(|p| p.name == name) {
                    continue;
                }
                debug!("{kind:?} part: {name}");
                parts.push(package.load_part(&name, kind)?);
            }
        }

        package.parts = parts;
        Ok(package)
    }

    /// Write the package to a file on disk, replacing it.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)
    }

    /// Write the package to any [`Write`] + [`Seek`] destination.
    ///
    /// Entries keep their original order and compression; parsed parts are
    /// re-serialized, everything else is copied unchanged.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<()> {
        let mut zip = ZipWriter::new(writer);

        for entry in &self.entries {
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = SimpleFileOptions::default().compression_method(method);

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)?;
                continue;
            }

            zip.start_file(entry.name.as_str(), options)?;
            match self.part(&entry.name) {
                Some(part) => zip.write_all(to_xml_string(&part.dom).as_bytes())?,
                None => zip.write_all(&entry.data)?,
            }
        }

        zip.finish()?;
        Ok(())
    }

    /// Parsed content parts: the main document first, then headers and
    /// footers in relationship order.
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn parts_mut(&mut self) -> &mut [Part] {
        &mut self.parts
    }

    pub fn part(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// The main document part.
    pub fn main_part(&self) -> Option<&Part> {
        self.parts.iter().find(|p| p.kind == PartKind::Body)
    }

    /// Names of every zip entry, in archive order.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Raw bytes of a zip entry as read from the source package.
    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    fn find_main_part(&self) -> Result<String> {
        let Some(rels) = self.entry(PACKAGE_RELS) else {
            return if self.entry(DEFAULT_MAIN_PART).is_some() {
                Ok(DEFAULT_MAIN_PART.to_string())
            } else {
                Err(Error::MissingPart(PACKAGE_RELS.to_string()))
            };
        };

        parse_relationships(rels)?
            .into_iter()
            .find(|rel| !rel.external && rel.rel_type.ends_with(REL_OFFICE_DOCUMENT))
            .map(|rel| resolve_part_path("", &rel.target))
            .ok_or_else(|| {
                Error::InvalidDocx("no officeDocument relationship in _rels/.rels".into())
            })
    }

    fn load_part(&self, name: &str, kind: PartKind) -> Result<Part> {
        let data = self
            .entry(name)
            .ok_or_else(|| Error::MissingPart(name.to_string()))?;
        let text = decode_part(data);
        let dom = parse_xml(&text)?;
        Ok(Part {
            name: name.to_string(),
            kind,
            dom,
        })
    }
}

/// `word/document.xml` -> `word/_rels/document.xml.rels`
fn rels_path_for(part: &str) -> String {
    let dir = part_dir(part);
    let file = part.rsplit('/').next().unwrap_or(part);
    if dir.is_empty() {
        format!("_rels/{file}.rels")
    } else {
        format!("{dir}/_rels/{file}.rels")
    }
}

struct Relationship {
    rel_type: String,
    target: String,
    external: bool,
}

fn parse_relationships(bytes: &[u8]) -> Result<Vec<Relationship>> {
    let content = decode_part(bytes);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().trim_text(true);

    let mut relationships = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship {
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };
                for attr in e.attributes() {
                    let attr = attr.map_err(|err| {
                        Error::InvalidDocx(format!("relationship attribute: {err}"))
                    })?;
                    let value = String::from_utf8_lossy(&attr.value).into_owned();
                    match attr.key.as_ref() {
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"TargetMode" => rel.external = value == "External",
                        _ => {}
                    }
                }
                relationships.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }
    Ok(relationships)
}

/// Extract local name from potentially namespaced XML name
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn build_docx(files: &[(&str, &str)]) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();
        for (name, content) in files {
            zip.start_file(*name, options).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

    const DOC_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId7" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/><Relationship Id="rId8" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/><Relationship Id="rId9" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com" TargetMode="External"/></Relationships>"#;

    const DOCUMENT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Body</w:t></w:r></w:p></w:body></w:document>"#;

    const HEADER: &str = r#"<w:hdr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t>Head</w:t></w:r></w:p></w:hdr>"#;

    const FOOTER: &str = r#"<w:ftr xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:p><w:r><w:t>Foot</w:t></w:r></w:p></w:ftr>"#;

    fn sample() -> Vec<u8> {
        build_docx(&[
            ("[Content_Types].xml", "<Types/>"),
            ("_rels/.rels", RELS),
            ("word/document.xml", DOCUMENT),
            ("word/_rels/document.xml.rels", DOC_RELS),
            ("word/header1.xml", HEADER),
            ("word/footer1.xml", FOOTER),
        ])
    }

    #[test]
    fn test_open_finds_body_header_footer() {
        let package = DocxPackage::from_reader(Cursor::new(sample())).unwrap();
        let kinds: Vec<_> = package.parts().iter().map(|p| (p.name.as_str(), p.kind)).collect();
        assert_eq!(
            kinds,
            vec![
                ("word/document.xml", PartKind::Body),
                ("word/header1.xml", PartKind::Header),
                ("word/footer1.xml", PartKind::Footer),
            ]
        );

        let main = package.main_part().unwrap();
        let body = main.content_root().unwrap();
        assert_eq!(wml::full_text(&main.dom, body), "Body");
    }

    #[test]
    fn test_write_round_trip_keeps_entries() {
        let package = DocxPackage::from_reader(Cursor::new(sample())).unwrap();
        let mut out = Cursor::new(Vec::new());
        package.write_to(&mut out).unwrap();

        let reread = DocxPackage::from_reader(Cursor::new(out.into_inner())).unwrap();
        let names: Vec<_> = reread.entry_names().collect();
        assert_eq!(names[0], "[Content_Types].xml");
        assert_eq!(names.len(), 6);
        let header = reread.part("word/header1.xml").unwrap();
        assert_eq!(
            wml::full_text(&header.dom, header.content_root().unwrap()),
            "Head"
        );
    }

    #[test]
    fn test_missing_main_part_is_error() {
        let bytes = build_docx(&[("_rels/.rels", RELS)]);
        assert!(matches!(
            DocxPackage::from_reader(Cursor::new(bytes)),
            Err(Error::MissingPart(_))
        ));
    }

    #[test]
    fn test_malformed_relationship_attribute_is_error() {
        let rels = RELS.replace(r#"Id="rId1""#, r#"Id="rId1" Id="rId2""#);
        let bytes = build_docx(&[("_rels/.rels", rels.as_str()), ("word/document.xml", DOCUMENT)]);
        assert!(matches!(
            DocxPackage::from_reader(Cursor::new(bytes)),
            Err(Error::InvalidDocx(_))
        ));
    }

    #[test]
    fn test_rels_path_for() {
        assert_eq!(rels_path_for("word/document.xml"), "word/_rels/document.xml.rels");
        assert_eq!(rels_path_for("document.xml"), "_rels/document.xml.rels");
    }
}
