// string.rs - Immutable rich strings: text plus a gapless list of formatting runs

use crate::builder::TsStrBldr;
use crate::error::{TsError, TsResult};
use crate::props::TextProps;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use ropey::Rope;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;
use unicode_normalization::{UnicodeNormalization, is_nfc, is_nfd, is_nfkc, is_nfkd};

/// A run of text sharing one property bag. The start is implicit: the end
/// of the previous run, or 0 for the first run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub end: usize,
    pub props: Arc<TextProps>,
}

impl Run {
    pub fn new(end: usize, props: Arc<TextProps>) -> Self {
        Self { end, props }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationForm {
    Nfc,
    Nfd,
    Nfkc,
    Nfkd,
}

impl NormalizationForm {
    pub fn apply(self, text: &str) -> String {
        match self {
            NormalizationForm::Nfc => text.nfc().collect(),
            NormalizationForm::Nfd => text.nfd().collect(),
            NormalizationForm::Nfkc => text.nfkc().collect(),
            NormalizationForm::Nfkd => text.nfkd().collect(),
        }
    }

    pub fn is_normalized(self, text: &str) -> bool {
        match self {
            NormalizationForm::Nfc => is_nfc(text),
            NormalizationForm::Nfd => is_nfd(text),
            NormalizationForm::Nfkc => is_nfkc(text),
            NormalizationForm::Nfkd => is_nfkd(text),
        }
    }
}

/// Immutable rich string.
///
/// Runs are sorted by strictly increasing `end`, the last run ends at the
/// text length, and no two neighbours have equal props. The empty string is
/// a single zero-length run.
#[derive(Clone, PartialEq, Eq)]
pub struct TsString {
    text: Rope,
    runs: Arc<[Run]>,
}

static EMPTY_STRINGS: Lazy<DashMap<i32, TsString>> = Lazy::new(DashMap::new);

impl TsString {
    /// Caller guarantees the run invariants.
    pub(crate) fn from_parts(text: Rope, runs: Vec<Run>) -> Self {
        debug_assert!(check_runs(&runs, text.len_chars()).is_ok());
        Self {
            text,
            runs: runs.into(),
        }
    }

    /// One run over `text` carrying `props`.
    pub fn with_props(text: &str, props: Arc<TextProps>) -> Self {
        let text = Rope::from_str(text);
        let runs = vec![Run::new(text.len_chars(), props)];
        Self::from_parts(text, runs)
    }

    pub fn len(&self) -> usize {
        self.text.len_chars()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    /// The text, or `None` for the empty string.
    pub fn text_opt(&self) -> Option<String> {
        (!self.is_empty()).then(|| self.text())
    }

    pub fn rope(&self) -> &Rope {
        &self.text
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    /// Index of the run containing `ich`. `ich == len` maps to the last run.
    pub fn run_at(&self, ich: usize) -> TsResult<usize> {
        if ich > self.len() {
            return Err(TsError::Range {
                min: ich,
                lim: ich,
                len: self.len(),
            });
        }
        Ok(run_containing(&self.runs, ich))
    }

    pub fn run_bounds(&self, irun: usize) -> TsResult<Range<usize>> {
        run_bounds(&self.runs, irun)
    }

    pub fn run_props(&self, irun: usize) -> TsResult<&Arc<TextProps>> {
        self.runs
            .get(irun)
            .map(|r| &r.props)
            .ok_or(TsError::IndexOutOfRange {
                index: irun,
                count: self.runs.len(),
            })
    }

    pub fn run_text(&self, irun: usize) -> TsResult<String> {
        let bounds = self.run_bounds(irun)?;
        Ok(self.text.slice(bounds).to_string())
    }

    pub fn props_at(&self, ich: usize) -> TsResult<&Arc<TextProps>> {
        let irun = self.run_at(ich)?;
        Ok(&self.runs[irun].props)
    }

    /// Iterates `(range, props)` for every run.
    pub fn iter_runs(&self) -> impl Iterator<Item = (Range<usize>, &Arc<TextProps>)> + '_ {
        let mut start = 0;
        self.runs.iter().map(move |run| {
            let range = start..run.end;
            start = run.end;
            (range, &run.props)
        })
    }

    /// Run-preserving copy of `[min, lim)`.
    pub fn substring(&self, min: usize, lim: usize) -> TsResult<TsString> {
        check_range(min, lim, self.len())?;
        if min == 0 && lim == self.len() {
            return Ok(self.clone());
        }
        let mut runs = Vec::new();
        for (range, props) in self.iter_runs() {
            if range.end <= min || range.start >= lim {
                continue;
            }
            runs.push(Run::new(range.end.min(lim) - min, props.clone()));
        }
        if runs.is_empty() {
            runs.push(Run::new(0, self.props_at(min)?.clone()));
        }
        Ok(TsString::from_parts(
            Rope::from(self.text.slice(min..lim)),
            runs,
        ))
    }

    pub fn to_builder(&self) -> TsStrBldr {
        TsStrBldr::from_string(self)
    }

    /// Normalizes each run separately, so nothing composes or reorders across
    /// a property boundary. Runs that become equal-adjacent are merged.
    pub fn normalized(&self, form: NormalizationForm) -> TsString {
        if self.is_normalized(form) {
            return self.clone();
        }
        let mut text = String::with_capacity(self.text.len_bytes());
        let mut runs: Vec<Run> = Vec::with_capacity(self.runs.len());
        let mut end = 0;
        for (range, props) in self.iter_runs() {
            let piece = form.apply(&self.text.slice(range).to_string());
            end += piece.chars().count();
            text.push_str(&piece);
            match runs.last_mut() {
                Some(last) if last.props == *props => last.end = end,
                _ => runs.push(Run::new(end, props.clone())),
            }
        }
        TsString::from_parts(Rope::from_str(&text), runs)
    }

    pub fn is_normalized(&self, form: NormalizationForm) -> bool {
        self.iter_runs()
            .all(|(range, _)| form.is_normalized(&self.text.slice(range).to_string()))
    }

    /// Verifies the run invariants. Always `Ok` for values built by this crate.
    pub fn check_invariants(&self) -> Result<(), String> {
        check_runs(&self.runs, self.len())
    }
}

impl fmt::Debug for TsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TsString")
            .field("text", &self.text.to_string())
            .field("runs", &self.runs)
            .finish()
    }
}

impl fmt::Display for TsString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// Plain string in writing system `ws`. Empty text yields the interned empty string.
pub fn make_string(text: &str, ws: i32) -> TsResult<TsString> {
    if ws <= 0 {
        return Err(TsError::InvalidWritingSystem(ws));
    }
    if text.is_empty() {
        return empty_string(ws);
    }
    Ok(TsString::with_props(text, TextProps::with_ws(ws)))
}

/// Like [`make_string`] for the first `length` chars of `text`.
pub fn make_string_prefix(text: &str, length: usize, ws: i32) -> TsResult<TsString> {
    let prefix = char_prefix(text, length)?;
    make_string(prefix, ws)
}

/// First `length` chars of `text` as one run with the given props.
pub fn make_string_with_props(
    text: &str,
    length: usize,
    props: Option<Arc<TextProps>>,
) -> TsResult<TsString> {
    let props = props.ok_or(TsError::NullArgument("props"))?;
    let prefix = char_prefix(text, length)?;
    Ok(TsString::with_props(prefix, props))
}

/// The canonical empty string for `ws`, created once per handle.
pub fn empty_string(ws: i32) -> TsResult<TsString> {
    if ws <= 0 {
        return Err(TsError::InvalidWritingSystem(ws));
    }
    let entry = EMPTY_STRINGS
        .entry(ws)
        .or_insert_with(|| TsString::with_props("", TextProps::with_ws(ws)));
    Ok(entry.value().clone())
}

fn char_prefix(text: &str, length: usize) -> TsResult<&str> {
    match text.char_indices().nth(length) {
        Some((byte, _)) => Ok(&text[..byte]),
        None if text.chars().count() == length => Ok(text),
        None => Err(TsError::Range {
            min: 0,
            lim: length,
            len: text.chars().count(),
        }),
    }
}

pub(crate) fn check_range(min: usize, lim: usize, len: usize) -> TsResult<()> {
    if min > lim || lim > len {
        return Err(TsError::Range { min, lim, len });
    }
    Ok(())
}

/// Index of the run holding `ich`; the last run for `ich` at or past the end.
pub(crate) fn run_containing(runs: &[Run], ich: usize) -> usize {
    runs.partition_point(|r| r.end <= ich).min(runs.len() - 1)
}

pub(crate) fn run_bounds(runs: &[Run], irun: usize) -> TsResult<Range<usize>> {
    let run = runs.get(irun).ok_or(TsError::IndexOutOfRange {
        index: irun,
        count: runs.len(),
    })?;
    let start = if irun == 0 { 0 } else { runs[irun - 1].end };
    Ok(start..run.end)
}

pub(crate) fn check_runs(runs: &[Run], len: usize) -> Result<(), String> {
    let Some(last) = runs.last() else {
        return Err("no runs".to_string());
    };
    if last.end != len {
        return Err(format!("last run ends at {} but length is {}", last.end, len));
    }
    if runs.len() == 1 {
        return Ok(());
    }
    let mut start = 0;
    for (i, run) in runs.iter().enumerate() {
        if run.end <= start {
            return Err(format!("run {} is empty or out of order", i));
        }
        if i > 0 && runs[i - 1].props == run.props {
            return Err(format!("runs {} and {} have equal props", i - 1, i));
        }
        start = run.end;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::props::{PropsBuilder, int_keys, str_keys, variation};

    fn styled(style: &str) -> Arc<TextProps> {
        let mut bldr = PropsBuilder::new();
        bldr.set_int_prop(int_keys::WS, variation::DEFAULT, 1)
            .set_str_prop(str_keys::NAMED_STYLE, Some(style));
        bldr.get_props()
    }

    fn two_runs() -> TsString {
        let mut bldr = TsStrBldr::new();
        bldr.replace(0, 0, "Hello", Some(&styled("A"))).unwrap();
        bldr.replace(5, 5, "World", Some(&styled("B"))).unwrap();
        bldr.get_string()
    }

    #[test]
    fn test_make_string() {
        let tss = make_string("abc", 4).unwrap();
        assert_eq!(tss.text(), "abc");
        assert_eq!(tss.run_count(), 1);
        assert_eq!(tss.run_props(0).unwrap().ws(), Some(4));
        assert!(make_string("abc", 0).unwrap_err().is_range_error());
    }

    #[test]
    fn test_empty_string_is_interned() {
        let a = empty_string(12).unwrap();
        let b = make_string("", 12).unwrap();
        assert_eq!(a, b);
        assert!(Arc::ptr_eq(&a.runs, &b.runs));
        assert_eq!(a.text_opt(), None);
        assert_eq!(a.run_count(), 1);
        assert_eq!(a.runs()[0].end, 0);
        assert!(empty_string(-3).is_err());
    }

    #[test]
    fn test_prefix_factories() {
        let tss = make_string_prefix("héllo", 2, 1).unwrap();
        assert_eq!(tss.text(), "hé");
        assert!(make_string_prefix("abc", 4, 1).unwrap_err().is_range_error());
        assert_eq!(make_string_prefix("abc", 3, 1).unwrap().len(), 3);

        let err = make_string_with_props("abc", 2, None).unwrap_err();
        assert!(matches!(err, TsError::NullArgument("props")));
        let tss = make_string_with_props("abc", 2, Some(styled("X"))).unwrap();
        assert_eq!(tss.text(), "ab");
    }

    #[test]
    fn test_run_queries() {
        let tss = two_runs();
        assert_eq!(tss.run_count(), 2);
        assert_eq!(tss.run_at(0).unwrap(), 0);
        assert_eq!(tss.run_at(5).unwrap(), 1);
        assert_eq!(tss.run_at(10).unwrap(), 1);
        assert!(tss.run_at(11).is_err());
        assert_eq!(tss.run_bounds(1).unwrap(), 5..10);
        assert_eq!(tss.run_text(0).unwrap(), "Hello");
        assert!(tss.run_bounds(2).unwrap_err().is_range_error());
        tss.check_invariants().unwrap();
    }

    #[test]
    fn test_substring() {
        let tss = two_runs();
        let sub = tss.substring(3, 7).unwrap();
        assert_eq!(sub.text(), "loWo");
        assert_eq!(sub.runs().iter().map(|r| r.end).collect::<Vec<_>>(), vec![2, 4]);
        let empty = tss.substring(5, 5).unwrap();
        assert_eq!(empty.run_count(), 1);
        assert_eq!(*empty.run_props(0).unwrap(), styled("B"));
        assert!(tss.substring(4, 2).is_err());
    }

    #[test]
    fn test_normalization_stays_inside_runs() {
        // "e" + combining acute split across two differently styled runs
        let mut bldr = TsStrBldr::new();
        bldr.replace(0, 0, "cafe", Some(&styled("A"))).unwrap();
        bldr.replace(4, 4, "\u{301}", Some(&styled("B"))).unwrap();
        bldr.replace(5, 5, "e\u{301}", Some(&styled("A"))).unwrap();
        let tss = bldr.get_string();

        let nfc = tss.normalized(NormalizationForm::Nfc);
        assert_eq!(nfc.text(), "cafe\u{301}\u{e9}");
        assert_eq!(nfc.runs().iter().map(|r| r.end).collect::<Vec<_>>(), vec![4, 5, 6]);
        assert!(nfc.is_normalized(NormalizationForm::Nfc));

        let nfd = nfc.normalized(NormalizationForm::Nfd);
        assert_eq!(nfd, tss);
    }
}
