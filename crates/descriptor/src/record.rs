//! Generic "object of class X" records.
//!
//! The descriptor is a flat list of `<object class="…">` elements, each
//! holding `<id name="…">` and `<property name="…">` children that may nest
//! further. Only the object subtrees are materialized; everything else in
//! the document is streamed past.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

const OBJECT_TAG: &str = "object";

/// One step of a field path: an element tag and the value of its `name`
/// attribute.
pub(crate) type Step = (&'static str, &'static str);
/// A chain of steps from a record down to the element holding a value.
pub(crate) type FieldPath = &'static [Step];

/// An element inside an object record.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    pub(crate) tag: String,
    pub(crate) name: Option<String>,
    pub(crate) class: Option<String>,
    pub(crate) text: String,
    pub(crate) children: Vec<Record>,
}

impl Record {
    fn from_start(reader: &Reader<&[u8]>, start: &BytesStart<'_>) -> Result<Self> {
        let decoder = reader.decoder();
        let tag = decoder.decode(start.name().as_ref()).or_raise(|| ErrorKind::Encoding("tag name"))?.into_owned();
        let mut record = Record { tag, ..Default::default() };
        for attr in start.attributes().flatten() {
            let value = || -> Result<String> {
                Ok(decoder.decode(&attr.value).or_raise(|| ErrorKind::Encoding("attribute"))?.into_owned())
            };
            match attr.key.as_ref() {
                b"name" => record.name = Some(value()?),
                b"class" => record.class = Some(value()?),
                _ => {},
            }
        }
        Ok(record)
    }

    /// The direct child with the given tag and `name` attribute.
    pub(crate) fn child(&self, tag: &str, name: &str) -> Option<&Record> {
        self.children.iter().find(|c| c.tag == tag && c.name.as_deref() == Some(name))
    }

    /// Follows `path` from this record.
    pub(crate) fn find(&self, path: FieldPath) -> Option<&Record> {
        path.iter().try_fold(self, |record, (tag, name)| record.child(tag, name))
    }

    /// The trimmed text of the first candidate path that resolves to
    /// non-empty text.
    pub(crate) fn pick(&self, candidates: &[FieldPath]) -> Option<String> {
        candidates
            .iter()
            .filter_map(|path| self.find(path))
            .map(|record| record.text.trim())
            .find(|text| !text.is_empty())
            .map(str::to_string)
    }

    /// Whether this is an `<object>` of the given class.
    pub(crate) fn is_class(&self, class: &str) -> bool {
        self.class.as_deref() == Some(class)
    }

    /// This record or the first descendant of the given class, depth first.
    pub(crate) fn find_class(&self, class: &str) -> Option<&Record> {
        match self.is_class(class) {
            true => Some(self),
            false => self.children.iter().find_map(|child| child.find_class(class)),
        }
    }
}

/// Streams `bytes`, calling `visit` once for every complete object record in
/// document order.
pub(crate) fn for_each_object(bytes: &[u8], visit: impl FnMut(Record)) -> Result<()> {
    stream(bytes, |record| record.tag == OBJECT_TAG, visit)
}

/// Materializes the whole document under its root element.
pub(crate) fn read_root(bytes: &[u8]) -> Result<Option<Record>> {
    let mut root = None;
    stream(bytes, |_| true, |record| {
        root.get_or_insert(record);
    })?;
    Ok(root)
}

/// Streams `bytes`; any element outside a record for which `starts` holds
/// becomes a record of its own.
fn stream(bytes: &[u8], starts: impl Fn(&Record) -> bool, mut visit: impl FnMut(Record)) -> Result<()> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    // Elements currently open inside an object; empty while between objects.
    let mut stack: Vec<Record> = Vec::new();

    loop {
        let event = reader
            .read_event_into(&mut buf)
            .or_raise(|| ErrorKind::MalformedXml(u64::try_from(reader.buffer_position()).unwrap_or(0)))?;
        match event {
            Event::Start(e) => {
                let record = Record::from_start(&reader, &e)?;
                if !stack.is_empty() || starts(&record) {
                    stack.push(record);
                }
            },
            Event::Empty(e) => {
                let record = Record::from_start(&reader, &e)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(record),
                    None if starts(&record) => visit(record),
                    None => {},
                }
            },
            Event::End(_) => {
                if let Some(record) = stack.pop() {
                    match stack.last_mut() {
                        Some(parent) => parent.children.push(record),
                        None => visit(record),
                    }
                }
            },
            Event::Text(e) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&e.decode().or_raise(|| ErrorKind::Encoding("text"))?);
                }
            },
            Event::CData(e) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&reader.decoder().decode(&e).or_raise(|| ErrorKind::Encoding("CDATA"))?);
                }
            },
            Event::GeneralRef(e) => {
                if let Some(top) = stack.last_mut() {
                    let name = e.decode().or_raise(|| ErrorKind::Encoding("entity"))?;
                    let entity = format!("&{name};");
                    top.text.push_str(&quick_xml::escape::unescape(&entity).or_raise(|| ErrorKind::Encoding("entity"))?);
                }
            },
            Event::Eof => break,
            _ => {},
        }
        buf.clear();
    }

    if !stack.is_empty() {
        exn::bail!(ErrorKind::Truncated);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(xml: &str) -> Result<Vec<Record>> {
        let mut records = Vec::new();
        for_each_object(xml.as_bytes(), |r| records.push(r))?;
        Ok(records)
    }

    #[test]
    fn test_objects_are_collected_in_order() {
        let records = collect(
            r#"<hibernate-generic datetime="x">
                <object class="Space" package="p"><id name="id">1</id></object>
                <object class="Page" package="p"><id name="id">2</id></object>
            </hibernate-generic>"#,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].is_class("Space"));
        assert!(records[1].is_class("Page"));
    }

    #[test]
    fn test_text_cdata_and_entities_are_joined() {
        let records = collect(
            r#"<r><object class="Page">
                <property name="title"><![CDATA[Q&A <notes>]]></property>
                <property name="body">Fish &amp; Chips &#38; more</property>
            </object></r>"#,
        )
        .unwrap();
        let page = &records[0];
        assert_eq!(page.pick(&[&[("property", "title")]]).as_deref(), Some("Q&A <notes>"));
        assert_eq!(page.pick(&[&[("property", "body")]]).as_deref(), Some("Fish & Chips & more"));
    }

    #[test]
    fn test_pick_skips_empty_candidates() {
        let records = collect(
            r#"<r><object class="Page">
                <id name="id">   </id>
                <property name="id">42</property>
                <property name="parent" class="Page"><id name="id">7</id></property>
            </object></r>"#,
        )
        .unwrap();
        let page = &records[0];
        assert_eq!(page.pick(&[&[("id", "id")], &[("property", "id")]]).as_deref(), Some("42"));
        assert_eq!(page.pick(&[&[("property", "parent"), ("id", "id")]]).as_deref(), Some("7"));
        assert_eq!(page.pick(&[&[("property", "missing")]]), None);
    }

    #[test]
    fn test_empty_object_element() {
        let records = collect(r#"<r><object class="Space"/></r>"#).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].children.is_empty());
    }

    #[test]
    fn test_read_root_keeps_the_whole_tree() {
        let root = read_root(
            br#"<?xml version="1.0"?>
            <hibernate-generic><object class="Page"><id name="id">4</id></object></hibernate-generic>"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(root.tag, "hibernate-generic");
        let page = root.find_class("Page").unwrap();
        assert_eq!(page.pick(&[&[("id", "id")]]).as_deref(), Some("4"));
        assert!(root.find_class("Space").is_none());
        assert_eq!(read_root(b"").unwrap(), None);
    }

    #[test]
    fn test_mismatched_tags_fail() {
        assert!(collect(r#"<r><object class="Page"><id name="id">1</property></object></r>"#).is_err());
    }

    #[test]
    fn test_truncated_document_fails() {
        let err = collect(r#"<r><object class="Page"><id name="id">1</id>"#).unwrap_err();
        assert_eq!(*err, ErrorKind::Truncated);
    }
}
