// Property-based tests using proptest
// Random edit scripts are replayed against a plain per-character model

mod common;

use common::{assert_invariants, registry};
use proptest::prelude::*;
use tsstring::props::{MISSING, TextProps, int_keys, toggle, variation};
use tsstring::string::NormalizationForm;
use tsstring::{TsStrBldr, xml};

#[derive(Debug, Clone)]
enum Edit {
    /// Replace a range (given as fractions of the length) with styled text.
    Replace { at: u8, span: u8, text: String, ws: Option<i32> },
    /// Toggle bold over a range.
    Bold { at: u8, span: u8, on: bool },
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        (any::<u8>(), 0u8..4, "[a-c ]{0,4}", prop::option::of(1i32..=3)).prop_map(
            |(at, span, text, ws)| Edit::Replace { at, span, text, ws }
        ),
        (any::<u8>(), 0u8..6, any::<bool>()).prop_map(|(at, span, on)| Edit::Bold { at, span, on }),
    ]
}

/// Resolves a fractional position and span to a valid `[min, lim)`.
fn range(len: usize, at: u8, span: u8) -> (usize, usize) {
    let min = if len == 0 { 0 } else { at as usize % (len + 1) };
    (min, (min + span as usize).min(len))
}

/// Style of one character: writing system and bold flag.
type CharStyle = (i32, bool);

fn style_of(props: &TextProps) -> CharStyle {
    (
        props.ws().unwrap_or(0),
        props.int_prop(int_keys::BOLD).is_some(),
    )
}

proptest! {
    #[test]
    fn edits_match_per_char_model(edits in prop::collection::vec(edit_strategy(), 1..25)) {
        let mut bldr = TsStrBldr::with_props("", TextProps::with_ws(1));
        let mut model: Vec<(char, CharStyle)> = Vec::new();

        for edit in edits {
            match edit {
                Edit::Replace { at, span, text, ws } => {
                    let (min, lim) = range(model.len(), at, span);
                    let char_style = match ws {
                        Some(ws) => (ws, false),
                        None => style_of(bldr.props_at(min.saturating_sub(1)).unwrap()),
                    };
                    let props = ws.map(TextProps::with_ws);
                    bldr.replace(min, lim, &text, props.as_ref()).unwrap();
                    model.splice(min..lim, text.chars().map(|c| (c, char_style)));
                }
                Edit::Bold { at, span, on } => {
                    let (min, lim) = range(model.len(), at, span);
                    let (var, val) = if on {
                        (variation::ENUM, toggle::FORCE_ON)
                    } else {
                        (MISSING, MISSING)
                    };
                    bldr.set_int_prop(min, lim, int_keys::BOLD, var, val).unwrap();
                    for entry in &mut model[min..lim] {
                        entry.1.1 = on;
                    }
                }
            }

            let tss = bldr.get_string();
            assert_invariants(&tss);
            let expected: String = model.iter().map(|(c, _)| *c).collect();
            prop_assert_eq!(tss.text(), expected);
            for (i, (_, char_style)) in model.iter().enumerate() {
                prop_assert_eq!(style_of(tss.props_at(i).unwrap()), *char_style);
            }
            let boundaries = model.windows(2).filter(|w| w[0].1 != w[1].1).count();
            prop_assert_eq!(tss.run_count(), if model.is_empty() { 1 } else { boundaries + 1 });
        }
    }
}

proptest! {
    #[test]
    fn codec_round_trip_preserves_decomposed_text(
        pieces in prop::collection::vec(("[a-zé<>& \\t]{1,6}", 1i32..=3, any::<bool>()), 1..6),
        indent in any::<bool>()
    ) {
        let mut bldr = TsStrBldr::new();
        for (text, ws, bold) in &pieces {
            let end = bldr.len();
            bldr.replace(end, end, text, Some(&TextProps::with_ws(*ws))).unwrap();
            if *bold {
                let lim = bldr.len();
                bldr.set_int_prop(end, lim, int_keys::BOLD, variation::ENUM, toggle::FORCE_ON)
                    .unwrap();
            }
        }
        let tss = bldr.get_string().normalized(NormalizationForm::Nfd);
        let resolver = registry();

        let encoded = xml::encode(&tss, &resolver, None, true, indent).unwrap();
        let decoded = xml::decode(&encoded, &resolver).unwrap();
        assert_invariants(&decoded);
        prop_assert_eq!(decoded, tss);
    }
}
