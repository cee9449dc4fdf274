// xml/element.rs - Minimal element tree read with quick-xml

use crate::error::{TsError, TsResult};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parses a document holding exactly one root element. Declarations,
    /// comments and processing instructions are skipped.
    pub fn parse(xml: &str) -> TsResult<XmlElement> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(false);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root = None;
        loop {
            match reader.read_event().map_err(|e| xml_error(&reader, e))? {
                Event::Start(start) => stack.push(Self::from_start(&start)?),
                Event::Empty(start) => {
                    let element = Self::from_start(&start)?;
                    Self::close(element, &mut stack, &mut root)?;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| TsError::format("Unexpected closing tag"))?;
                    Self::close(element, &mut stack, &mut root)?;
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| xml_error(&reader, e))?;
                    match stack.last_mut() {
                        Some(parent) => parent.push_text(&text),
                        None if text.trim().is_empty() => {}
                        None => return Err(TsError::format("Text outside the root element")),
                    }
                }
                Event::CData(data) => {
                    let bytes = data.into_inner();
                    let text = std::str::from_utf8(&bytes)
                        .map_err(|e| TsError::format(e.to_string()))?;
                    if let Some(parent) = stack.last_mut() {
                        parent.push_text(text);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }
        if !stack.is_empty() {
            return Err(TsError::format("Unclosed element"));
        }
        root.ok_or_else(|| TsError::format("No root element"))
    }

    fn from_start(start: &BytesStart<'_>) -> TsResult<XmlElement> {
        let name = std::str::from_utf8(start.name().as_ref())
            .map_err(|e| TsError::format(e.to_string()))?
            .to_string();
        let mut attributes = Vec::new();
        for attr in start.attributes() {
            let attr = attr.map_err(|e| TsError::format(e.to_string()))?;
            let key = std::str::from_utf8(attr.key.as_ref())
                .map_err(|e| TsError::format(e.to_string()))?
                .to_string();
            let value = attr
                .unescape_value()
                .map_err(|e| TsError::format(e.to_string()))?
                .into_owned();
            attributes.push((key, value));
        }
        Ok(XmlElement {
            name,
            attributes,
            children: Vec::new(),
        })
    }

    fn close(
        element: XmlElement,
        stack: &mut [XmlElement],
        root: &mut Option<XmlElement>,
    ) -> TsResult<()> {
        match stack.last_mut() {
            Some(parent) => parent.children.push(XmlNode::Element(element)),
            None if root.is_none() => *root = Some(element),
            None => return Err(TsError::format("More than one root element")),
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        if let Some(XmlNode::Text(last)) = self.children.last_mut() {
            last.push_str(text);
        } else {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> + '_ {
        self.children.iter().filter_map(|child| match child {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    pub fn has_child_elements(&self) -> bool {
        self.elements().next().is_some()
    }

    /// Direct text content. Whitespace-only content counts as formatting and
    /// reads as empty unless the element has `xml:space="preserve"`.
    pub fn text(&self) -> String {
        let text: String = self
            .children
            .iter()
            .filter_map(|child| match child {
                XmlNode::Text(t) => Some(t.as_str()),
                XmlNode::Element(_) => None,
            })
            .collect();
        if text.trim().is_empty() && self.attr("xml:space") != Some("preserve") {
            String::new()
        } else {
            text
        }
    }
}

fn xml_error(reader: &Reader<&[u8]>, err: quick_xml::Error) -> TsError {
    TsError::format(format!("{} at byte {}", err, reader.buffer_position()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tree() {
        let xml = r#"<?xml version="1.0"?>
<Str>
  <!-- comment -->
  <Field name="a &amp; b">
    <Run ws="en">x &lt; y</Run>
  </Field>
  <Run ws="fr"/>
</Str>"#;
        let root = XmlElement::parse(xml).unwrap();
        assert_eq!(root.name, "Str");
        let children: Vec<_> = root.elements().collect();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].attr("name"), Some("a & b"));
        let run = children[0].elements().next().unwrap();
        assert_eq!(run.text(), "x < y");
        assert_eq!(children[1].text(), "");
        assert!(!children[1].has_child_elements());
    }

    #[test]
    fn test_whitespace_text() {
        let root = XmlElement::parse(r#"<Str><Run ws="en">  </Run><Run xml:space="preserve" ws="en">  </Run></Str>"#)
            .unwrap();
        let runs: Vec<_> = root.elements().collect();
        assert_eq!(runs[0].text(), "");
        assert_eq!(runs[1].text(), "  ");
    }

    #[test]
    fn test_cdata_and_char_refs() {
        let root = XmlElement::parse("<Run>a<![CDATA[<b>]]>&#xD;</Run>").unwrap();
        assert_eq!(root.text(), "a<b>\r");
    }

    #[test]
    fn test_malformed_documents() {
        for xml in ["", "<Str>", "<Str></Run>", "<Str/><Str/>", "text<Str/>"] {
            let err = XmlElement::parse(xml).unwrap_err();
            assert!(err.is_format_error(), "{:?}", xml);
        }
    }
}
