// dump.rs - Serializable view of a string's runs, for inspection

use crate::props::PropKey;
use crate::string::TsString;
use crate::ws::WritingSystemResolver;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StringDump {
    pub text: String,
    pub runs: Vec<RunDump>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunDump {
    pub min: usize,
    pub lim: usize,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ws: Option<String>,
    pub int_props: Vec<IntPropDump>,
    pub str_props: Vec<StrPropDump>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntPropDump {
    pub key: PropKey,
    pub variation: i32,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StrPropDump {
    pub key: PropKey,
    pub value: String,
}

impl StringDump {
    pub fn new(tss: &TsString, resolver: &dyn WritingSystemResolver) -> Self {
        let runs = tss
            .iter_runs()
            .map(|(range, props)| RunDump {
                min: range.start,
                lim: range.end,
                text: tss.rope().slice(range).to_string(),
                ws: props.ws().and_then(|ws| resolver.id(ws).ok()),
                int_props: props
                    .int_props()
                    .map(|(key, p)| IntPropDump {
                        key,
                        variation: p.variation,
                        value: p.value,
                    })
                    .collect(),
                str_props: props
                    .str_props()
                    // object data is mostly binary
                    .map(|(key, value)| StrPropDump {
                        key,
                        value: value.escape_debug().to_string(),
                    })
                    .collect(),
            })
            .collect();
        Self {
            text: tss.text(),
            runs,
        }
    }

    /// One line per run: `[min, lim) ws "text"`.
    pub fn to_lines(&self) -> Vec<String> {
        self.runs
            .iter()
            .map(|run| {
                format!(
                    "[{}, {}) {} {:?}",
                    run.min,
                    run.lim,
                    run.ws.as_deref().unwrap_or("-"),
                    run.text
                )
            })
            .collect()
    }
}
