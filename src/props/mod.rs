// props/mod.rs - Immutable text property bags and their builder

pub mod object_data;

pub use object_data::{ObjectData, ObjectDataKind};

use crate::error::{TsError, TsResult};
use std::sync::Arc;

pub type PropKey = i32;

/// Integer property keys.
pub mod int_keys {
    use super::PropKey;

    pub const WS: PropKey = 1;
    pub const ITALIC: PropKey = 2;
    pub const BOLD: PropKey = 3;
    pub const SUPERSCRIPT: PropKey = 4;
    pub const UNDERLINE: PropKey = 5;
    pub const FONT_SIZE: PropKey = 6;
    pub const OFFSET: PropKey = 7;
    pub const FORE_COLOR: PropKey = 8;
    pub const BACK_COLOR: PropKey = 9;
    pub const UNDER_COLOR: PropKey = 10;
    pub const BASE_WS: PropKey = 16;
    pub const ALIGN: PropKey = 17;
    pub const MARK_ITEM: PropKey = 26;
}

/// String property keys.
pub mod str_keys {
    use super::PropKey;

    pub const FONT_FAMILY: PropKey = 1;
    pub const OBJ_DATA: PropKey = 6;
    pub const TAGS: PropKey = 7;
    pub const FONT_VARIATIONS: PropKey = 8;
    pub const NAMED_STYLE: PropKey = 133;
    pub const FIELD_NAME: PropKey = 9998;
}

/// Variation tags carried next to every integer property value.
pub mod variation {
    pub const DEFAULT: i32 = 0;
    pub const MILLI_POINT: i32 = 1;
    pub const RELATIVE: i32 = 2;
    pub const ENUM: i32 = 3;
}

/// Values of toggle-style properties (bold, italic, mark item).
pub mod toggle {
    pub const OFF: i32 = 0;
    pub const FORCE_ON: i32 = 1;
    pub const INVERT: i32 = 2;
}

/// Value returned by the legacy lookups for a key that is not present.
pub const MISSING: i32 = -1;

/// An integer property: the value plus its variation tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IntProp {
    pub variation: i32,
    pub value: i32,
}

impl IntProp {
    pub const fn new(variation: i32, value: i32) -> Self {
        Self { variation, value }
    }

    pub fn is_delete_marker(&self) -> bool {
        self.variation == MISSING && self.value == MISSING
    }
}

/// Immutable, key-ordered collection of integer and string properties.
///
/// Both tables are kept sorted by key with unique keys, so value equality
/// is a straight comparison of the two sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TextProps {
    int_props: Vec<(PropKey, IntProp)>,
    str_props: Vec<(PropKey, String)>,
}

impl TextProps {
    pub fn empty() -> Arc<TextProps> {
        Arc::new(TextProps::default())
    }

    /// Bag holding only a writing system.
    pub fn with_ws(ws: i32) -> Arc<TextProps> {
        let mut bldr = PropsBuilder::new();
        bldr.set_int_prop(int_keys::WS, variation::DEFAULT, ws);
        bldr.get_props()
    }

    pub fn is_empty(&self) -> bool {
        self.int_props.is_empty() && self.str_props.is_empty()
    }

    pub fn int_prop_count(&self) -> usize {
        self.int_props.len()
    }

    pub fn int_prop_by_index(&self, index: usize) -> TsResult<(PropKey, IntProp)> {
        self.int_props
            .get(index)
            .copied()
            .ok_or(TsError::IndexOutOfRange {
                index,
                count: self.int_props.len(),
            })
    }

    pub fn int_prop(&self, key: PropKey) -> Option<IntProp> {
        self.int_props
            .binary_search_by_key(&key, |(k, _)| *k)
            .ok()
            .map(|i| self.int_props[i].1)
    }

    /// Legacy lookup: `(variation, value)`, or `(-1, -1)` when the key is absent.
    ///
    /// A stored `(-1, -1)` cannot be told apart from a missing key.
    pub fn int_prop_values(&self, key: PropKey) -> (i32, i32) {
        self.int_prop(key)
            .map(|p| (p.variation, p.value))
            .unwrap_or((MISSING, MISSING))
    }

    pub fn str_prop_count(&self) -> usize {
        self.str_props.len()
    }

    pub fn str_prop_by_index(&self, index: usize) -> TsResult<(PropKey, &str)> {
        self.str_props
            .get(index)
            .map(|(k, v)| (*k, v.as_str()))
            .ok_or(TsError::IndexOutOfRange {
                index,
                count: self.str_props.len(),
            })
    }

    pub fn str_prop(&self, key: PropKey) -> Option<&str> {
        self.str_props
            .binary_search_by_key(&key, |(k, _)| *k)
            .ok()
            .map(|i| self.str_props[i].1.as_str())
    }

    pub fn int_props(&self) -> impl Iterator<Item = (PropKey, IntProp)> + '_ {
        self.int_props.iter().copied()
    }

    pub fn str_props(&self) -> impl Iterator<Item = (PropKey, &str)> + '_ {
        self.str_props.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Writing system handle, if set.
    pub fn ws(&self) -> Option<i32> {
        self.int_prop(int_keys::WS).map(|p| p.value)
    }

    /// Decoded object-data property. Malformed payloads read as `None`.
    pub fn object_data(&self) -> Option<ObjectData> {
        self.str_prop(str_keys::OBJ_DATA)
            .and_then(|raw| ObjectData::parse(raw).ok())
    }

    pub fn to_builder(&self) -> PropsBuilder {
        PropsBuilder {
            props: self.clone(),
        }
    }

    /// Copy of `self` with one integer property set (or deleted by `(-1, -1)`).
    pub fn with_int_prop(&self, key: PropKey, variation: i32, value: i32) -> TextProps {
        let mut bldr = self.to_builder();
        bldr.set_int_prop(key, variation, value);
        bldr.props
    }

    /// Copy of `self` with one string property set (or deleted by an empty value).
    pub fn with_str_prop(&self, key: PropKey, value: Option<&str>) -> TextProps {
        let mut bldr = self.to_builder();
        bldr.set_str_prop(key, value);
        bldr.props
    }
}

/// Mutable builder producing [`TextProps`] bags.
#[derive(Debug, Clone, Default)]
pub struct PropsBuilder {
    props: TextProps,
}

impl PropsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an integer property. `(-1, -1)` removes it.
    pub fn set_int_prop(&mut self, key: PropKey, variation: i32, value: i32) -> &mut Self {
        let prop = IntProp::new(variation, value);
        let table = &mut self.props.int_props;
        match table.binary_search_by_key(&key, |(k, _)| *k) {
            Ok(i) if prop.is_delete_marker() => {
                table.remove(i);
            }
            Ok(i) => table[i].1 = prop,
            Err(_) if prop.is_delete_marker() => {}
            Err(i) => table.insert(i, (key, prop)),
        }
        self
    }

    /// Sets a string property. `None` or an empty string removes it.
    pub fn set_str_prop(&mut self, key: PropKey, value: Option<&str>) -> &mut Self {
        let table = &mut self.props.str_props;
        let value = value.filter(|v| !v.is_empty());
        match (table.binary_search_by_key(&key, |(k, _)| *k), value) {
            (Ok(i), None) => {
                table.remove(i);
            }
            (Ok(i), Some(v)) => table[i].1 = v.to_string(),
            (Err(_), None) => {}
            (Err(i), Some(v)) => table.insert(i, (key, v.to_string())),
        }
        self
    }

    pub fn int_prop(&self, key: PropKey) -> Option<IntProp> {
        self.props.int_prop(key)
    }

    pub fn str_prop(&self, key: PropKey) -> Option<&str> {
        self.props.str_prop(key)
    }

    pub fn int_prop_count(&self) -> usize {
        self.props.int_prop_count()
    }

    pub fn str_prop_count(&self) -> usize {
        self.props.str_prop_count()
    }

    pub fn clear(&mut self) {
        self.props = TextProps::default();
    }

    pub fn get_props(&self) -> Arc<TextProps> {
        Arc::new(self.props.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Arc<TextProps> {
        let mut bldr = PropsBuilder::new();
        bldr.set_int_prop(int_keys::BOLD, variation::ENUM, toggle::FORCE_ON)
            .set_int_prop(int_keys::WS, variation::DEFAULT, 7)
            .set_str_prop(str_keys::NAMED_STYLE, Some("Emphasis"))
            .set_str_prop(str_keys::FONT_FAMILY, Some("Charis SIL"));
        bldr.get_props()
    }

    #[test]
    fn test_props_are_key_ordered() {
        let props = sample();
        assert_eq!(props.int_prop_count(), 2);
        assert_eq!(props.int_prop_by_index(0).unwrap().0, int_keys::WS);
        assert_eq!(props.int_prop_by_index(1).unwrap().0, int_keys::BOLD);
        assert_eq!(
            props.str_prop_by_index(0).unwrap(),
            (str_keys::FONT_FAMILY, "Charis SIL")
        );
        assert_eq!(props.ws(), Some(7));
    }

    #[test]
    fn test_soft_miss() {
        let props = sample();
        assert_eq!(props.int_prop_values(int_keys::FONT_SIZE), (-1, -1));
        assert_eq!(props.int_prop(int_keys::FONT_SIZE), None);
        assert_eq!(props.str_prop(str_keys::TAGS), None);
        assert_eq!(
            props.int_prop_values(int_keys::BOLD),
            (variation::ENUM, toggle::FORCE_ON)
        );
    }

    #[test]
    fn test_index_out_of_range() {
        let props = sample();
        let err = props.int_prop_by_index(props.int_prop_count()).unwrap_err();
        assert!(matches!(err, TsError::IndexOutOfRange { index: 2, count: 2 }));
        assert!(props.str_prop_by_index(5).unwrap_err().is_range_error());
    }

    #[test]
    fn test_delete_markers() {
        let props = sample();
        let mut bldr = props.to_builder();
        bldr.set_int_prop(int_keys::BOLD, -1, -1);
        bldr.set_str_prop(str_keys::NAMED_STYLE, Some(""));
        bldr.set_str_prop(str_keys::FONT_FAMILY, None);
        // deleting absent keys is a no-op
        bldr.set_int_prop(int_keys::ALIGN, -1, -1);
        let props = bldr.get_props();
        assert_eq!(props.int_prop_count(), 1);
        assert_eq!(props.str_prop_count(), 0);
    }

    #[test]
    fn test_value_equality() {
        let a = sample();
        let mut bldr = PropsBuilder::new();
        // insertion order must not matter
        bldr.set_str_prop(str_keys::FONT_FAMILY, Some("Charis SIL"))
            .set_str_prop(str_keys::NAMED_STYLE, Some("Emphasis"))
            .set_int_prop(int_keys::WS, variation::DEFAULT, 7)
            .set_int_prop(int_keys::BOLD, variation::ENUM, toggle::FORCE_ON);
        let b = bldr.get_props();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);

        let c = Arc::new(b.with_int_prop(int_keys::BOLD, variation::ENUM, toggle::OFF));
        assert_ne!(a, c);
    }

    #[test]
    fn test_with_ws() {
        let props = TextProps::with_ws(3);
        assert_eq!(props.int_prop_values(int_keys::WS), (variation::DEFAULT, 3));
        assert!(TextProps::empty().is_empty());
    }
}
