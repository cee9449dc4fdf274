// Common test utilities for building styled strings

use std::sync::Arc;
use tsstring::TsString;
use tsstring::props::{PropsBuilder, TextProps, int_keys, str_keys, variation};
use tsstring::ws::WsRegistry;

/// Registry with "en" = 1, "fr" = 2, "de" = 3.
#[allow(dead_code)]
pub fn registry() -> WsRegistry {
    WsRegistry::with_ids(["en", "fr", "de"])
}

/// Props with a writing system and a named style.
#[allow(dead_code)]
pub fn style(ws: i32, name: &str) -> Arc<TextProps> {
    let mut bldr = PropsBuilder::new();
    bldr.set_int_prop(int_keys::WS, variation::DEFAULT, ws)
        .set_str_prop(str_keys::NAMED_STYLE, Some(name));
    bldr.get_props()
}

/// Checks the run table and that no two adjacent runs share props.
#[allow(dead_code)]
pub fn assert_invariants(tss: &TsString) {
    if let Err(msg) = tss.check_invariants() {
        panic!("broken invariants: {} in {:?}", msg, tss);
    }
    for pair in tss.runs().windows(2) {
        assert!(pair[0].props != pair[1].props, "unmerged runs in {:?}", tss);
    }
}
