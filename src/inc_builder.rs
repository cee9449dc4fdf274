// inc_builder.rs - Append-only string construction

use crate::builder::TsStrBldr;
use crate::error::TsResult;
use crate::props::{PropKey, PropsBuilder, TextProps};
use crate::string::{Run, TsString};
use std::sync::Arc;

/// Builds a string left to right. Appended text takes the current props,
/// which are changed with `set_int_prop`/`set_str_prop` between appends.
#[derive(Debug, Clone, Default)]
pub struct TsIncStrBldr {
    bldr: TsStrBldr,
    props: PropsBuilder,
}

impl TsIncStrBldr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.bldr.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bldr.is_empty()
    }

    pub fn append(&mut self, text: &str) -> TsResult<()> {
        let props = self.props.get_props();
        self.append_with_props(text, &props)
    }

    pub fn append_with_props(&mut self, text: &str, props: &Arc<TextProps>) -> TsResult<()> {
        let end = self.bldr.len();
        if end == 0 && text.is_empty() {
            // nothing to append, but an empty result should still carry the style
            return self.bldr.set_props(0, 0, props);
        }
        self.bldr
            .replace_runs(end, end, text, &[Run::new(text.chars().count(), props.clone())])
    }

    pub fn append_string(&mut self, tss: &TsString) -> TsResult<()> {
        let end = self.bldr.len();
        self.bldr.replace_string(end, end, tss)
    }

    pub fn set_int_prop(&mut self, key: PropKey, variation: i32, value: i32) {
        self.props.set_int_prop(key, variation, value);
    }

    pub fn set_str_prop(&mut self, key: PropKey, value: Option<&str>) {
        self.props.set_str_prop(key, value);
    }

    /// Props the next append will use.
    pub fn current_props(&self) -> Arc<TextProps> {
        self.props.get_props()
    }

    pub fn clear_props(&mut self) {
        self.props.clear();
    }

    pub fn get_string(&self) -> TsString {
        self.bldr.get_string()
    }

    /// Drops the text and the current props.
    pub fn clear(&mut self) {
        self.bldr.clear();
        self.props.clear();
    }
}
