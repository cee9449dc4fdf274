// lib.rs - Library root for tsstring

pub mod builder;
pub mod cli;
pub mod config;
pub mod dump;
pub mod error;
pub mod inc_builder;
pub mod props;
pub mod string;
pub mod ws;
pub mod xml;

pub use builder::TsStrBldr;
pub use error::{TsError, TsResult};
pub use inc_builder::TsIncStrBldr;
pub use props::{IntProp, PropKey, PropsBuilder, TextProps};
pub use string::{NormalizationForm, Run, TsString, empty_string, make_string};
pub use ws::{WritingSystemResolver, WsError, WsRegistry};
