//! Core document properties from `docProps/core.xml`.

use crate::common::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::BTreeMap;

/// Parse core properties (author, created, modified, ...) into a map.
///
/// Keys are tag localnames (`title`, `creator`, `lastModifiedBy`, ...);
/// values are the element text, `None` for empty elements.
///
/// ```xml
/// <cp:coreProperties xmlns:cp="...">
///     <dc:title>Operate ROMAR swarf unit</dc:title>
///     <dc:creator>Shay Hill</dc:creator>
///     <cp:revision>6</cp:revision>
/// </cp:coreProperties>
/// ```
pub fn collect_core_properties(xml_bytes: &[u8]) -> Result<BTreeMap<String, Option<String>>> {
    let mut reader = Reader::from_reader(xml_bytes);
    reader.config_mut().trim_text(true);

    let mut properties = BTreeMap::new();
    let mut current: Option<String> = None;
    let mut depth = 0usize;
    let mut buf = Vec::with_capacity(512);

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth == 2 {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    properties.insert(name.clone(), None);
                    current = Some(name);
                }
            },
            Ok(Event::Empty(e)) => {
                if depth == 1 {
                    let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                    properties.insert(name, None);
                }
            },
            Ok(Event::Text(e)) => {
                if let Some(name) = &current {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    if !text.trim().is_empty() {
                        properties.insert(name.clone(), Some(text.trim().to_string()));
                    }
                }
            },
            Ok(Event::End(_)) => {
                if depth == 2 {
                    current = None;
                }
                depth = depth.saturating_sub(1);
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e.to_string())),
            _ => {},
        }
        buf.clear();
    }

    Ok(properties)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_core_properties() {
        let xml = br#"<?xml version="1.0"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
    xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/">
  <dc:title>Test Document</dc:title>
  <dc:creator>An Author</dc:creator>
  <cp:revision>6</cp:revision>
  <cp:lastPrinted/>
  <dcterms:modified>2019-01-11T11:41:00Z</dcterms:modified>
</cp:coreProperties>"#;
        let props = collect_core_properties(xml).unwrap();
        assert_eq!(props["title"].as_deref(), Some("Test Document"));
        assert_eq!(props["creator"].as_deref(), Some("An Author"));
        assert_eq!(props["revision"].as_deref(), Some("6"));
        assert_eq!(props["lastPrinted"], None);
        assert_eq!(props["modified"].as_deref(), Some("2019-01-11T11:41:00Z"));
    }

    #[test]
    fn test_empty_root_yields_empty_map() {
        let xml = br#"<cp:coreProperties xmlns:cp="x"/>"#;
        assert!(collect_core_properties(xml).unwrap().is_empty());
    }
}
