// props/object_data.rs - Typed view of the object-data string property

use uuid::Uuid;

/// One-byte discriminator stored as the first character of an object-data property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectDataKind {
    PictEvenHot = 1,
    PictOddHot = 2,
    NameGuidHot = 3,
    ExternalPathName = 4,
    OwnNameGuidHot = 5,
    EmbeddedObjectData = 6,
    ContextString = 7,
    GuidMoveableObjDisp = 8,
}

impl ObjectDataKind {
    pub fn from_tag(tag: u32) -> Option<Self> {
        Some(match tag {
            1 => Self::PictEvenHot,
            2 => Self::PictOddHot,
            3 => Self::NameGuidHot,
            4 => Self::ExternalPathName,
            5 => Self::OwnNameGuidHot,
            6 => Self::EmbeddedObjectData,
            7 => Self::ContextString,
            8 => Self::GuidMoveableObjDisp,
            _ => return None,
        })
    }

    pub fn tag(self) -> char {
        char::from(self as u8)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectData {
    /// Picture bytes; `odd` records the parity flag the data was stored with.
    Picture { odd: bool, bytes: Vec<u8> },
    NameGuid(Uuid),
    OwnNameGuid(Uuid),
    ContextString(Uuid),
    MoveableObject(Uuid),
    ExternalPath(String),
    Embedded(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ObjectDataError {
    #[error("Empty object data")]
    Empty,
    #[error("Unknown object data tag {0}")]
    UnknownTag(u32),
    #[error("Invalid GUID in object data: {0}")]
    BadGuid(String),
    #[error("Picture data contains a non-byte character")]
    BadPicture,
}

impl ObjectData {
    pub fn kind(&self) -> ObjectDataKind {
        match self {
            ObjectData::Picture { odd: false, .. } => ObjectDataKind::PictEvenHot,
            ObjectData::Picture { odd: true, .. } => ObjectDataKind::PictOddHot,
            ObjectData::NameGuid(_) => ObjectDataKind::NameGuidHot,
            ObjectData::OwnNameGuid(_) => ObjectDataKind::OwnNameGuidHot,
            ObjectData::ContextString(_) => ObjectDataKind::ContextString,
            ObjectData::MoveableObject(_) => ObjectDataKind::GuidMoveableObjDisp,
            ObjectData::ExternalPath(_) => ObjectDataKind::ExternalPathName,
            ObjectData::Embedded(_) => ObjectDataKind::EmbeddedObjectData,
        }
    }

    /// Whether a run carrying this object stands for the object rather than for
    /// its own text, and so is represented by U+FFFC.
    pub fn needs_placeholder(&self) -> bool {
        !matches!(
            self,
            ObjectData::ExternalPath(_) | ObjectData::Embedded(_)
        )
    }

    /// Interactive references that are dropped when embedded data is not written.
    pub fn is_hot_reference(&self) -> bool {
        matches!(
            self,
            ObjectData::Picture { .. } | ObjectData::NameGuid(_)
        )
    }

    pub fn parse(raw: &str) -> Result<Self, ObjectDataError> {
        let mut chars = raw.chars();
        let tag = chars.next().ok_or(ObjectDataError::Empty)? as u32;
        let kind = ObjectDataKind::from_tag(tag).ok_or(ObjectDataError::UnknownTag(tag))?;
        let payload = chars.as_str();
        let guid = || {
            Uuid::parse_str(payload).map_err(|_| ObjectDataError::BadGuid(payload.to_string()))
        };
        Ok(match kind {
            ObjectDataKind::PictEvenHot | ObjectDataKind::PictOddHot => {
                let bytes = payload
                    .chars()
                    .map(|c| u8::try_from(u32::from(c)).map_err(|_| ObjectDataError::BadPicture))
                    .collect::<Result<Vec<_>, _>>()?;
                ObjectData::Picture {
                    odd: kind == ObjectDataKind::PictOddHot,
                    bytes,
                }
            }
            ObjectDataKind::NameGuidHot => ObjectData::NameGuid(guid()?),
            ObjectDataKind::OwnNameGuidHot => ObjectData::OwnNameGuid(guid()?),
            ObjectDataKind::ContextString => ObjectData::ContextString(guid()?),
            ObjectDataKind::GuidMoveableObjDisp => ObjectData::MoveableObject(guid()?),
            ObjectDataKind::ExternalPathName => ObjectData::ExternalPath(payload.to_string()),
            ObjectDataKind::EmbeddedObjectData => ObjectData::Embedded(payload.to_string()),
        })
    }

    /// String property form: tag character followed by the payload.
    /// Picture bytes are stored one per character.
    pub fn to_prop_string(&self) -> String {
        let mut out = String::new();
        out.push(self.kind().tag());
        match self {
            ObjectData::Picture { bytes, .. } => out.extend(bytes.iter().map(|&b| char::from(b))),
            ObjectData::NameGuid(g)
            | ObjectData::OwnNameGuid(g)
            | ObjectData::ContextString(g)
            | ObjectData::MoveableObject(g) => out.push_str(&g.hyphenated().to_string()),
            ObjectData::ExternalPath(s) | ObjectData::Embedded(s) => out.push_str(s),
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guid_prop_string() {
        let guid = Uuid::parse_str("0f3a2b4c-1d2e-4f50-8a6b-7c8d9e0f1a2b").unwrap();
        let data = ObjectData::OwnNameGuid(guid);
        let raw = data.to_prop_string();
        assert_eq!(raw.chars().next(), Some('\u{5}'));
        assert_eq!(ObjectData::parse(&raw).unwrap(), data);
        assert!(data.needs_placeholder());
        assert!(!data.is_hot_reference());
    }

    #[test]
    fn test_picture_bytes_survive() {
        let data = ObjectData::Picture {
            odd: true,
            bytes: vec![0x00, 0x7f, 0x80, 0xff],
        };
        let raw = data.to_prop_string();
        assert_eq!(raw.chars().count(), 5);
        assert_eq!(ObjectData::parse(&raw).unwrap(), data);
        assert_eq!(data.kind(), ObjectDataKind::PictOddHot);
    }

    #[test]
    fn test_bad_payloads() {
        assert_eq!(ObjectData::parse(""), Err(ObjectDataError::Empty));
        assert_eq!(ObjectData::parse("\u{63}x"), Err(ObjectDataError::UnknownTag(0x63)));
        assert!(matches!(
            ObjectData::parse("\u{3}not-a-guid"),
            Err(ObjectDataError::BadGuid(_))
        ));
        assert_eq!(
            ObjectData::parse("\u{1}\u{100}"),
            Err(ObjectDataError::BadPicture)
        );
    }

    #[test]
    fn test_external_path_keeps_text() {
        let data = ObjectData::parse("\u{4}https://example.org/a b").unwrap();
        assert_eq!(data, ObjectData::ExternalPath("https://example.org/a b".to_string()));
        assert!(!data.needs_placeholder());
    }
}
