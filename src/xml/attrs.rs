// xml/attrs.rs - Run attributes <-> text properties

use crate::error::{TsError, TsResult};
use crate::props::{
    IntProp, ObjectData, PropKey, PropsBuilder, TextProps, int_keys, str_keys, toggle, variation,
};
use crate::ws::WritingSystemResolver;
use log::warn;
use uuid::Uuid;

pub const XML_SPACE: &str = "xml:space";
const INT_PREFIX: &str = "int-";
const STR_PREFIX: &str = "str-";

/// Color value meaning "no color".
pub const TRANSPARENT: i32 = 0xC000_0000_u32 as i32;

#[derive(Debug, Clone, Copy)]
enum IntFormat {
    WsId,
    Toggle,
    Named(&'static [&'static str]),
    Measure(&'static str),
    Color,
}

struct IntAttr {
    key: PropKey,
    name: &'static str,
    format: IntFormat,
}

const TOGGLE_NAMES: &[&str] = &["off", "on", "invert"];
const SUPERSCRIPT_NAMES: &[&str] = &["off", "super", "sub"];
const UNDERLINE_NAMES: &[&str] = &[
    "none",
    "dotted",
    "dashed",
    "single",
    "double",
    "strikethrough",
    "squiggle",
];
const ALIGN_NAMES: &[&str] = &["leading", "left", "center", "right", "trailing", "justify"];

const INT_ATTRS: &[IntAttr] = &[
    IntAttr { key: int_keys::WS, name: "ws", format: IntFormat::WsId },
    IntAttr { key: int_keys::BASE_WS, name: "wsBase", format: IntFormat::WsId },
    IntAttr { key: int_keys::ITALIC, name: "italic", format: IntFormat::Toggle },
    IntAttr { key: int_keys::BOLD, name: "bold", format: IntFormat::Toggle },
    IntAttr {
        key: int_keys::SUPERSCRIPT,
        name: "superscript",
        format: IntFormat::Named(SUPERSCRIPT_NAMES),
    },
    IntAttr {
        key: int_keys::UNDERLINE,
        name: "underline",
        format: IntFormat::Named(UNDERLINE_NAMES),
    },
    IntAttr {
        key: int_keys::FONT_SIZE,
        name: "fontsize",
        format: IntFormat::Measure("fontsizeUnit"),
    },
    IntAttr {
        key: int_keys::OFFSET,
        name: "offset",
        format: IntFormat::Measure("offsetUnit"),
    },
    IntAttr { key: int_keys::FORE_COLOR, name: "forecolor", format: IntFormat::Color },
    IntAttr { key: int_keys::BACK_COLOR, name: "backcolor", format: IntFormat::Color },
    IntAttr { key: int_keys::UNDER_COLOR, name: "undercolor", format: IntFormat::Color },
    IntAttr {
        key: int_keys::ALIGN,
        name: "align",
        format: IntFormat::Named(ALIGN_NAMES),
    },
];

const STR_ATTRS: &[(PropKey, &str)] = &[
    (str_keys::FONT_FAMILY, "fontFamily"),
    (str_keys::TAGS, "tags"),
    (str_keys::FONT_VARIATIONS, "fontVariations"),
    (str_keys::NAMED_STYLE, "namedStyle"),
];

// Object data attributes, one per kind. Pictures keep their bytes in the run body.
const LINK: &str = "link";
const OWN_LINK: &str = "ownlink";
const CONTEXT_STRING: &str = "contextString";
const MOVEABLE_OBJ: &str = "moveableObj";
const EXTERNAL_LINK: &str = "externalLink";
const EMBEDDED: &str = "embedded";
const PICTURE: &str = "picture";

/// What the run attributes say about the run body.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunShape {
    pub has_ws: bool,
    /// `Some(odd)` when the body is hex picture data.
    pub picture: Option<bool>,
}

/// Attributes for every property of `props` except the field name and the
/// mark item flag, which are carried by wrapper elements.
pub fn write_run_attributes(
    props: &TextProps,
    resolver: &dyn WritingSystemResolver,
) -> Vec<(String, String)> {
    let mut attrs = Vec::new();
    for (key, prop) in props.int_props() {
        if key == int_keys::MARK_ITEM {
            continue;
        }
        let written = INT_ATTRS
            .iter()
            .find(|a| a.key == key)
            .and_then(|a| format_int(a, prop, resolver));
        match written {
            Some(mut pairs) => attrs.append(&mut pairs),
            None => attrs.push((
                format!("{}{}", INT_PREFIX, key),
                format!("{},{}", prop.variation, prop.value),
            )),
        }
    }
    for (key, value) in props.str_props() {
        match key {
            str_keys::FIELD_NAME => {}
            str_keys::OBJ_DATA => attrs.push(object_data_attribute(value)),
            _ => match STR_ATTRS.iter().find(|(k, _)| *k == key) {
                Some((_, name)) => attrs.push((name.to_string(), value.to_string())),
                None => attrs.push((format!("{}{}", STR_PREFIX, key), value.to_string())),
            },
        }
    }
    attrs
}

fn format_int(
    attr: &IntAttr,
    prop: IntProp,
    resolver: &dyn WritingSystemResolver,
) -> Option<Vec<(String, String)>> {
    let name = attr.name.to_string();
    match attr.format {
        IntFormat::WsId => match resolver.id(prop.value) {
            Ok(id) if prop.variation == variation::DEFAULT => Some(vec![(name, id)]),
            Ok(_) => None,
            Err(e) => {
                warn!("Writing {} as a raw handle: {}", attr.name, e);
                None
            }
        },
        IntFormat::Toggle => enum_name(TOGGLE_NAMES, prop).map(|v| vec![(name, v)]),
        IntFormat::Named(names) => enum_name(names, prop).map(|v| vec![(name, v)]),
        IntFormat::Measure(unit_attr) => {
            let unit = match prop.variation {
                variation::MILLI_POINT => "mpt",
                variation::RELATIVE => "rel",
                _ => return None,
            };
            Some(vec![
                (name, prop.value.to_string()),
                (unit_attr.to_string(), unit.to_string()),
            ])
        }
        IntFormat::Color => {
            if prop.variation != variation::DEFAULT {
                return None;
            }
            match prop.value {
                TRANSPARENT => Some(vec![(name, "transparent".to_string())]),
                0..=0x00FF_FFFF => Some(vec![(name, format!("{:06x}", prop.value))]),
                _ => None,
            }
        }
    }
}

fn enum_name(names: &[&str], prop: IntProp) -> Option<String> {
    if prop.variation != variation::ENUM {
        return None;
    }
    usize::try_from(prop.value)
        .ok()
        .and_then(|i| names.get(i))
        .map(|s| s.to_string())
}

fn object_data_attribute(raw: &str) -> (String, String) {
    match ObjectData::parse(raw) {
        Ok(data) => {
            let (name, value) = match data {
                ObjectData::NameGuid(g) => (LINK, g.to_string()),
                ObjectData::OwnNameGuid(g) => (OWN_LINK, g.to_string()),
                ObjectData::ContextString(g) => (CONTEXT_STRING, g.to_string()),
                ObjectData::MoveableObject(g) => (MOVEABLE_OBJ, g.to_string()),
                ObjectData::ExternalPath(p) => (EXTERNAL_LINK, p),
                ObjectData::Embedded(s) => (EMBEDDED, s),
                ObjectData::Picture { odd, .. } => {
                    let parity = if odd { "odd" } else { "even" };
                    (PICTURE, parity.to_string())
                }
            };
            (name.to_string(), value)
        }
        Err(e) => {
            warn!("Writing unreadable object data verbatim: {}", e);
            (format!("{}{}", STR_PREFIX, str_keys::OBJ_DATA), raw.to_string())
        }
    }
}

/// Reads the attributes of a `Run` element into `bldr`.
pub fn read_run_attributes(
    attrs: &[(String, String)],
    resolver: &dyn WritingSystemResolver,
    bldr: &mut PropsBuilder,
) -> TsResult<RunShape> {
    let mut shape = RunShape::default();
    for (name, value) in attrs {
        let name = name.as_str();
        if name == XML_SPACE {
            continue;
        }
        if let Some(attr) = INT_ATTRS.iter().find(|a| a.name == name) {
            if attr.key == int_keys::WS {
                shape.has_ws = true;
            }
            let prop = parse_int(attr, value, attrs, resolver)?;
            bldr.set_int_prop(attr.key, prop.variation, prop.value);
        } else if let Some((key, _)) = STR_ATTRS.iter().find(|(_, n)| *n == name) {
            bldr.set_str_prop(*key, Some(value));
        } else if let Some(data) = parse_object_data(name, value)? {
            if let ObjectData::Picture { odd, .. } = data {
                // bytes are filled in from the body
                shape.picture = Some(odd);
            } else {
                bldr.set_str_prop(str_keys::OBJ_DATA, Some(&data.to_prop_string()));
            }
        } else if let Some(key) = name.strip_prefix(INT_PREFIX) {
            let key = parse_key(name, key)?;
            let (var, val) = value
                .split_once(',')
                .and_then(|(v, x)| {
                    Some((v.trim().parse::<i32>().ok()?, x.trim().parse::<i32>().ok()?))
                })
                .ok_or_else(|| bad_value(name, value))?;
            if key == int_keys::WS {
                shape.has_ws = true;
            }
            bldr.set_int_prop(key, var, val);
        } else if let Some(key) = name.strip_prefix(STR_PREFIX) {
            let key = parse_key(name, key)?;
            bldr.set_str_prop(key, Some(value));
        } else if !INT_ATTRS.iter().any(|a| matches!(a.format, IntFormat::Measure(u) if u == name)) {
            warn!("Ignoring unknown run attribute {}", name);
        }
    }
    Ok(shape)
}

fn parse_int(
    attr: &IntAttr,
    value: &str,
    attrs: &[(String, String)],
    resolver: &dyn WritingSystemResolver,
) -> TsResult<IntProp> {
    let named = |names: &[&str]| {
        names
            .iter()
            .position(|n| *n == value)
            .map(|i| IntProp::new(variation::ENUM, i as i32))
            .ok_or_else(|| bad_value(attr.name, value))
    };
    match attr.format {
        IntFormat::WsId => {
            let ws = resolve_ws(value, resolver)?;
            Ok(IntProp::new(variation::DEFAULT, ws))
        }
        IntFormat::Toggle => named(TOGGLE_NAMES),
        IntFormat::Named(names) => named(names),
        IntFormat::Measure(unit_attr) => {
            let unit = attrs
                .iter()
                .find(|(n, _)| n == unit_attr)
                .map(|(_, v)| v.as_str())
                .unwrap_or("mpt");
            let var = match unit {
                "mpt" => variation::MILLI_POINT,
                "rel" => variation::RELATIVE,
                _ => return Err(bad_value(unit_attr, unit)),
            };
            let val = value.parse().map_err(|_| bad_value(attr.name, value))?;
            Ok(IntProp::new(var, val))
        }
        IntFormat::Color => {
            if value == "transparent" {
                return Ok(IntProp::new(variation::DEFAULT, TRANSPARENT));
            }
            let val = i32::from_str_radix(value, 16).map_err(|_| bad_value(attr.name, value))?;
            Ok(IntProp::new(variation::DEFAULT, val))
        }
    }
}

fn parse_object_data(name: &str, value: &str) -> TsResult<Option<ObjectData>> {
    let guid = || Uuid::parse_str(value).map_err(|_| bad_value(name, value));
    Ok(Some(match name {
        LINK => ObjectData::NameGuid(guid()?),
        OWN_LINK => ObjectData::OwnNameGuid(guid()?),
        CONTEXT_STRING => ObjectData::ContextString(guid()?),
        MOVEABLE_OBJ => ObjectData::MoveableObject(guid()?),
        EXTERNAL_LINK => ObjectData::ExternalPath(value.to_string()),
        EMBEDDED => ObjectData::Embedded(value.to_string()),
        PICTURE => ObjectData::Picture {
            odd: match value {
                "odd" => true,
                "even" => false,
                _ => return Err(bad_value(name, value)),
            },
            bytes: Vec::new(),
        },
        _ => return Ok(None),
    }))
}

/// Resolves a writing system identifier, wrapping resolver failures.
pub fn resolve_ws(id: &str, resolver: &dyn WritingSystemResolver) -> TsResult<i32> {
    resolver
        .handle(id)
        .map_err(|source| TsError::UnknownWritingSystem {
            id: id.to_string(),
            source,
        })
}

fn parse_key(name: &str, key: &str) -> TsResult<PropKey> {
    key.parse()
        .map_err(|_| TsError::format(format!("Bad property key in attribute {}", name)))
}

fn bad_value(name: &str, value: &str) -> TsError {
    TsError::format(format!("Bad value '{}' for attribute {}", value, name))
}

/// Marks a run as a forced-on list item.
pub fn is_forced_mark_item(props: &TextProps) -> bool {
    props
        .int_prop(int_keys::MARK_ITEM)
        .is_some_and(|p| p.value == toggle::FORCE_ON)
}
