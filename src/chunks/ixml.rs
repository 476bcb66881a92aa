use std::collections::HashSet;
use std::fmt;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use super::{ChunkCodec, payload_size, split_chunk};
use crate::prelude::*;

const ROOT: &str = "BWFXML";

/// The `iXML` chunk: header framing around an XML document.
///
/// The payload is kept as raw bytes. [`IxmlDocument`] gives a flattened view
/// of it when the fields are needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataXmlChunk {
    header: ChunkHeader,
    xml: Vec<u8>,
}

impl MetadataXmlChunk {
    /// Fails when the document is too long for the chunk size field.
    pub fn encode(xml: Vec<u8>, endian: Endian) -> Result<Self> {
        let size = payload_size(Self::KIND, xml.len())?;
        Ok(MetadataXmlChunk {
            header: ChunkHeader::encode(FourCC::IXML, size, endian),
            xml,
        })
    }

    pub fn from_document(document: &IxmlDocument, endian: Endian) -> Result<Self> {
        Self::encode(document.to_xml()?, endian)
    }

    pub fn xml(&self) -> &[u8] {
        &self.xml
    }

    pub fn document(&self) -> Result<IxmlDocument> {
        IxmlDocument::parse(&self.xml)
    }
}

impl ChunkCodec for MetadataXmlChunk {
    const KIND: &'static str = "metadata XML";
    const ID: FourCC = FourCC::IXML;
    const MIN_PAYLOAD: usize = 0;

    fn decode(data: &[u8], endian: Endian) -> Result<Self> {
        let (header, payload) = split_chunk(data, endian, Self::KIND, Self::MIN_PAYLOAD)?;
        Ok(MetadataXmlChunk {
            header,
            xml: payload.to_vec(),
        })
    }

    fn header(&self) -> &ChunkHeader {
        &self.header
    }

    fn payload(&self) -> Vec<u8> {
        self.xml.clone()
    }
}

/// iXML fields flattened to `PATH/TO/ELEMENT = value`, root element excluded.
///
/// Entries keep document order. Repeated elements (tracks of a
/// `TRACK_LIST`, say) give repeated paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IxmlDocument {
    entries: Vec<(String, String)>,
}

impl IxmlDocument {
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let end = xml.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        let mut reader = Reader::from_reader(&xml[..end]);
        reader.config_mut().trim_text(true);

        let mut entries = Vec::new();
        let mut buf = Vec::new();
        // Open elements and whether each has child elements
        let mut path: Vec<(String, bool)> = Vec::new();
        let mut text = String::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(ref e) => {
                    if let Some(parent) = path.last_mut() {
                        parent.1 = true;
                    }
                    path.push((String::from_utf8_lossy(e.name().as_ref()).into_owned(), false));
                    text.clear();
                }
                Event::End(_) => {
                    if let Some((_, has_children)) = path.last()
                        && !has_children
                        && path.len() > 1
                    {
                        entries.push((join(&path[1..]), text.trim().to_string()));
                    }
                    path.pop();
                    text.clear();
                }
                Event::Empty(ref e) => {
                    if let Some(parent) = path.last_mut() {
                        parent.1 = true;
                    }
                    if !path.is_empty() {
                        let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                        let mut key = join(&path[1..]);
                        if !key.is_empty() {
                            key.push('/');
                        }
                        key.push_str(&name);
                        entries.push((key, String::new()));
                    }
                }
                Event::Text(ref e) => {
                    text.push_str(&e.unescape().map_err(quick_xml::Error::from)?);
                }
                Event::CData(ref e) => {
                    text.push_str(&String::from_utf8_lossy(e));
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        trace!("parsed {} iXML entries", entries.len());
        Ok(IxmlDocument { entries })
    }

    /// First value stored under `path`.
    pub fn get(&self, path: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| key == path)
            .map(|(_, value)| value.as_str())
    }

    /// Replaces the first value under `path`, or adds it at the end.
    pub fn set(&mut self, path: &str, value: &str) {
        match self.entries.iter_mut().find(|(key, _)| key == path) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((path.to_string(), value.to_string())),
        }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes the entries back as a `BWFXML` document.
    ///
    /// Consecutive entries sharing a parent path go into one element. When a
    /// child name repeats inside the open parent, the parent is closed and
    /// opened again, so repeated groups come back as repeated elements.
    pub fn to_xml(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        writer.write_event(Event::Start(BytesStart::new(ROOT)))?;

        let mut open: Vec<(&str, HashSet<&str>)> = Vec::new();

        for (key, value) in &self.entries {
            let parts: Vec<&str> = key.split('/').filter(|p| !p.is_empty()).collect();
            let Some((leaf, parents)) = parts.split_last() else {
                continue;
            };

            let common = open
                .iter()
                .zip(parents.iter())
                .take_while(|((name, _), parent)| name == *parent)
                .count();
            while open.len() > common {
                close(&mut writer, &mut open)?;
            }

            let repeated = match open.last() {
                Some((_, seen)) => open.len() == parents.len() && seen.contains(leaf),
                None => false,
            };
            if repeated {
                close(&mut writer, &mut open)?;
            }

            for parent in &parents[open.len()..] {
                writer.write_event(Event::Start(BytesStart::new(*parent)))?;
                open.push((*parent, HashSet::new()));
            }

            writer.write_event(Event::Start(BytesStart::new(*leaf)))?;
            writer.write_event(Event::Text(BytesText::new(value)))?;
            writer.write_event(Event::End(BytesEnd::new(*leaf)))?;

            if let Some((_, seen)) = open.last_mut() {
                seen.insert(*leaf);
            }
        }

        while !open.is_empty() {
            close(&mut writer, &mut open)?;
        }
        writer.write_event(Event::End(BytesEnd::new(ROOT)))?;

        Ok(writer.into_inner())
    }
}

fn join(path: &[(String, bool)]) -> String {
    path.iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join("/")
}

fn close(writer: &mut Writer<Vec<u8>>, open: &mut Vec<(&str, HashSet<&str>)>) -> Result<()> {
    if let Some((name, _)) = open.pop() {
        writer.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(())
}

impl fmt::Display for IxmlDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{} = {}", key, value)?;
        }
        Ok(())
    }
}
