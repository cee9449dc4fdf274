// xml/mod.rs - TsString <-> XML element form

pub mod attrs;
pub mod element;

pub use element::{XmlElement, XmlNode};

use crate::error::{TsError, TsResult};
use crate::inc_builder::TsIncStrBldr;
use crate::props::{ObjectData, PropsBuilder, int_keys, str_keys, toggle, variation};
use crate::string::{NormalizationForm, TsString, make_string};
use crate::ws::WritingSystemResolver;
use attrs::{XML_SPACE, is_forced_mark_item, read_run_attributes, resolve_ws, write_run_attributes};
use log::{debug, trace};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

pub const STR: &str = "Str";
pub const ASTR: &str = "AStr";
pub const RUN: &str = "Run";
pub const FIELD: &str = "Field";
pub const ITEM: &str = "Item";

/// Placeholder text of runs that stand for an embedded object.
pub const OBJECT_REPLACEMENT: char = '\u{FFFC}';

pub const DEFAULT_HEX_LINE_WIDTH: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Writes an `AStr` root carrying this writing system instead of `Str`.
    pub ws: Option<i32>,
    /// When false, picture and name-GUID runs are left out.
    pub embed_object_data: bool,
    pub indent: bool,
    pub hex_line_width: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            ws: None,
            embed_object_data: true,
            indent: false,
            hex_line_width: DEFAULT_HEX_LINE_WIDTH,
        }
    }
}

/// Encodes `tss` as a `Str` (or `AStr` when `ws` is given) element.
pub fn encode(
    tss: &TsString,
    resolver: &dyn WritingSystemResolver,
    ws: Option<i32>,
    embed_object_data: bool,
    indent: bool,
) -> TsResult<String> {
    let opts = EncodeOptions {
        ws,
        embed_object_data,
        indent,
        ..EncodeOptions::default()
    };
    encode_with(tss, resolver, &opts)
}

pub fn encode_with(
    tss: &TsString,
    resolver: &dyn WritingSystemResolver,
    opts: &EncodeOptions,
) -> TsResult<String> {
    let tss = tss.normalized(NormalizationForm::Nfc);
    let mut writer = if opts.indent {
        Writer::new_with_indent(Vec::new(), b' ', 2)
    } else {
        Writer::new(Vec::new())
    };

    let root_name = if opts.ws.is_some() { ASTR } else { STR };
    let mut root = BytesStart::new(root_name);
    if let Some(ws) = opts.ws {
        let id = resolver
            .id(ws)
            .map_err(|_| TsError::InvalidWritingSystem(ws))?;
        root.push_attribute(("ws", NormalizationForm::Nfc.apply(&id).as_str()));
    }
    writer.write_event(Event::Start(root))?;

    let mut open_field: Option<String> = None;
    for (irun, (range, props)) in tss.iter_runs().enumerate() {
        let object = props.object_data();
        if !opts.embed_object_data && object.as_ref().is_some_and(|o| o.is_hot_reference()) {
            debug!("Skipping object run {}", irun);
            continue;
        }

        let field = props.str_prop(str_keys::FIELD_NAME);
        if field != open_field.as_deref() {
            if open_field.take().is_some() {
                writer.write_event(Event::End(BytesEnd::new(FIELD)))?;
            }
            if let Some(name) = field {
                let mut start = BytesStart::new(FIELD);
                start.push_attribute(("name", name));
                writer.write_event(Event::Start(start))?;
                open_field = Some(name.to_string());
            }
        }

        let item = is_forced_mark_item(props);
        if item {
            writer.write_event(Event::Start(BytesStart::new(ITEM)))?;
        }

        let mut start = BytesStart::new(RUN);
        for (name, value) in write_run_attributes(props, resolver) {
            start.push_attribute((name.as_str(), value.as_str()));
        }
        let body = match &object {
            Some(ObjectData::Picture { bytes, .. }) => to_hex(bytes, opts.hex_line_width),
            Some(
                ObjectData::NameGuid(_)
                | ObjectData::OwnNameGuid(_)
                | ObjectData::ContextString(_)
                | ObjectData::MoveableObject(_),
            ) => String::new(),
            Some(ObjectData::ExternalPath(_) | ObjectData::Embedded(_)) | None => {
                tss.rope().slice(range).to_string()
            }
        };
        if body.is_empty() {
            writer.write_event(Event::Empty(start))?;
        } else {
            if body.chars().all(char::is_whitespace) {
                start.push_attribute((XML_SPACE, "preserve"));
            }
            writer.write_event(Event::Start(start))?;
            let escaped = escape_text(&body);
            writer.write_event(Event::Text(BytesText::from_escaped(escaped.as_str())))?;
            writer.write_event(Event::End(BytesEnd::new(RUN)))?;
        }

        if item {
            writer.write_event(Event::End(BytesEnd::new(ITEM)))?;
        }
    }
    if open_field.is_some() {
        writer.write_event(Event::End(BytesEnd::new(FIELD)))?;
    }
    writer.write_event(Event::End(BytesEnd::new(root_name)))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| TsError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Decodes XML text holding a `Str` or `AStr` element.
pub fn decode(xml: &str, resolver: &dyn WritingSystemResolver) -> TsResult<TsString> {
    let root = XmlElement::parse(xml)?;
    decode_element(&root, resolver)
}

/// Decodes an `AStr` element, returning its writing system with the string.
pub fn decode_alternative(
    xml: &str,
    resolver: &dyn WritingSystemResolver,
) -> TsResult<(i32, TsString)> {
    let root = XmlElement::parse(xml)?;
    if root.name != ASTR {
        return Err(TsError::format(format!("Expected {} but found {}", ASTR, root.name)));
    }
    let id = root
        .attr("ws")
        .ok_or_else(|| TsError::format("AStr element is missing a ws attribute"))?;
    let ws = resolve_ws(&NormalizationForm::Nfc.apply(id), resolver)?;
    Ok((ws, decode_element(&root, resolver)?))
}

pub fn decode_element(
    root: &XmlElement,
    resolver: &dyn WritingSystemResolver,
) -> TsResult<TsString> {
    if root.name != STR && root.name != ASTR {
        return Err(TsError::format(format!(
            "Expected {} or {} but found {}",
            STR, ASTR, root.name
        )));
    }
    if let Some(tss) = decode_single_run(root, resolver)? {
        trace!("Decoded single-run string");
        return Ok(tss);
    }

    let mut decoder = RunDecoder {
        resolver,
        bldr: TsIncStrBldr::new(),
        runs: 0,
    };
    decoder.walk(root, None, false)?;
    if decoder.runs == 0 {
        return Err(TsError::format("A string with no runs is not a string"));
    }
    Ok(decoder.bldr.get_string())
}

/// Shortcut for `<Str><Run ws="..">text</Run></Str>`. `None` when the
/// element has any other shape.
fn decode_single_run(
    root: &XmlElement,
    resolver: &dyn WritingSystemResolver,
) -> TsResult<Option<TsString>> {
    let mut children = root.elements();
    let (Some(run), None) = (children.next(), children.next()) else {
        return Ok(None);
    };
    if run.name != RUN || run.has_child_elements() || !root.text().is_empty() {
        return Ok(None);
    }
    let [(name, id)] = run.attributes.as_slice() else {
        return Ok(None);
    };
    if name != "ws" {
        return Ok(None);
    }
    let ws = resolve_ws(id, resolver)?;
    let text = NormalizationForm::Nfd.apply(&run.text());
    make_string(&text, ws).map(Some)
}

struct RunDecoder<'a> {
    resolver: &'a dyn WritingSystemResolver,
    bldr: TsIncStrBldr,
    runs: usize,
}

impl RunDecoder<'_> {
    fn walk(&mut self, element: &XmlElement, field: Option<&str>, item: bool) -> TsResult<()> {
        for child in element.elements() {
            match child.name.as_str() {
                RUN => self.run(child, field, item)?,
                FIELD if field.is_none() && !item => {
                    self.walk(child, child.attr("name"), item)?;
                }
                ITEM if !item => self.walk(child, field, true)?,
                other => {
                    return Err(TsError::format(format!(
                        "Unexpected {} element inside {}",
                        other, element.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn run(&mut self, element: &XmlElement, field: Option<&str>, item: bool) -> TsResult<()> {
        let raw = element.text();
        let mut props = PropsBuilder::new();
        let shape = read_run_attributes(&element.attributes, self.resolver, &mut props)?;
        if !shape.has_ws && !raw.chars().next().is_some_and(|c| u32::from(c) <= 13) {
            return Err(TsError::format("Run element is missing a ws attribute"));
        }
        if let Some(name) = field {
            props.set_str_prop(str_keys::FIELD_NAME, Some(name));
        }
        if item {
            props.set_int_prop(int_keys::MARK_ITEM, variation::ENUM, toggle::FORCE_ON);
        }

        let mut text = match shape.picture {
            Some(odd) => {
                let picture = ObjectData::Picture {
                    odd,
                    bytes: from_hex(&raw)?,
                };
                props.set_str_prop(str_keys::OBJ_DATA, Some(&picture.to_prop_string()));
                String::new()
            }
            None => NormalizationForm::Nfd.apply(&raw),
        };
        let props = props.get_props();
        if text.is_empty() && props.object_data().is_some_and(|o| o.needs_placeholder()) {
            text.push(OBJECT_REPLACEMENT);
        }
        self.bldr.append_with_props(&text, &props)?;
        self.runs += 1;
        Ok(())
    }
}

/// Escapes markup characters, and control characters as character references
/// so they survive line-ending normalization.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\t' | '\n' => out.push(c),
            c if c.is_control() => out.push_str(&format!("&#x{:X};", u32::from(c))),
            c => out.push(c),
        }
    }
    out
}

/// Uppercase hex, one line per `width` characters (no wrapping for 0).
fn to_hex(bytes: &[u8], width: usize) -> String {
    let mut out = String::with_capacity(bytes.len() * 2 + bytes.len() * 2 / width.max(1));
    let mut column = 0;
    for byte in bytes {
        for digit in [byte >> 4, byte & 0x0f] {
            if width > 0 && column == width {
                out.push('\n');
                column = 0;
            }
            out.push(char::from_digit(u32::from(digit), 16).unwrap_or('0').to_ascii_uppercase());
            column += 1;
        }
    }
    out
}

fn from_hex(text: &str) -> TsResult<Vec<u8>> {
    let digits = text
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| {
            c.to_digit(16)
                .ok_or_else(|| TsError::format(format!("Bad hex digit '{}' in picture data", c)))
        })
        .collect::<TsResult<Vec<u32>>>()?;
    if digits.len() % 2 != 0 {
        return Err(TsError::format("Odd number of hex digits in picture data"));
    }
    Ok(digits
        .chunks(2)
        .map(|pair| ((pair[0] << 4) | pair[1]) as u8)
        .collect())
}
