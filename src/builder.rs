// builder.rs - Mutable range-edit engine producing TsString snapshots

use crate::error::{TsError, TsResult};
use crate::props::{PropKey, TextProps};
use crate::string::{Run, TsString, check_range, run_bounds, run_containing};
use log::trace;
use ropey::Rope;
use std::ops::Range;
use std::sync::Arc;

/// Editable rich text.
///
/// Holds the same invariants as [`TsString`] between calls. Every method
/// validates its arguments before touching the buffer, so a failed call
/// leaves the builder unchanged.
#[derive(Debug, Clone)]
pub struct TsStrBldr {
    text: Rope,
    runs: Vec<Run>,
}

impl Default for TsStrBldr {
    fn default() -> Self {
        Self::new()
    }
}

impl TsStrBldr {
    pub fn new() -> Self {
        Self {
            text: Rope::new(),
            runs: vec![Run::new(0, TextProps::empty())],
        }
    }

    pub fn from_string(tss: &TsString) -> Self {
        Self {
            text: tss.rope().clone(),
            runs: tss.runs().to_vec(),
        }
    }

    /// Builder over `text` carrying a single property bag.
    pub fn with_props(text: &str, props: Arc<TextProps>) -> Self {
        let text = Rope::from_str(text);
        let runs = vec![Run::new(text.len_chars(), props)];
        Self { text, runs }
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

    /// Text of `[min, lim)`.
    pub fn fetch_chars(&self, min: usize, lim: usize) -> TsResult<String> {
        check_range(min, lim, self.len())?;
        Ok(self.text.slice(min..lim).to_string())
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn run_count(&self) -> usize {
        self.runs.len()
    }

    pub fn run_at(&self, ich: usize) -> TsResult<usize> {
        check_range(ich, ich, self.len())?;
        Ok(run_containing(&self.runs, ich))
    }

    pub fn run_bounds(&self, irun: usize) -> TsResult<Range<usize>> {
        run_bounds(&self.runs, irun)
    }

    pub fn props_at(&self, ich: usize) -> TsResult<&Arc<TextProps>> {
        let irun = self.run_at(ich)?;
        Ok(&self.runs[irun].props)
    }

    /// Snapshot of the current state. Later edits do not affect it.
    pub fn get_string(&self) -> TsString {
        TsString::from_parts(self.text.clone(), self.runs.clone())
    }

    /// Back to an empty buffer with one empty run.
    pub fn clear(&mut self) {
        self.text = Rope::new();
        self.runs = vec![Run::new(0, TextProps::empty())];
    }

    /// Replaces `[min, lim)` with `text`, all of it carrying `props`.
    ///
    /// With `props == None` the new text takes the props of the character
    /// before `min`, or of the first run when `min == 0`.
    pub fn replace(
        &mut self,
        min: usize,
        lim: usize,
        text: &str,
        props: Option<&Arc<TextProps>>,
    ) -> TsResult<()> {
        check_range(min, lim, self.len())?;
        let props = match props {
            Some(props) => props.clone(),
            None => self.runs[run_containing(&self.runs, min.saturating_sub(1))]
                .props
                .clone(),
        };
        let ins_len = text.chars().count();
        self.replace_runs(min, lim, text, &[Run::new(ins_len, props)])
    }

    /// Replaces `[min, lim)` with the text and runs of `tss`.
    pub fn replace_string(&mut self, min: usize, lim: usize, tss: &TsString) -> TsResult<()> {
        self.replace_runs(min, lim, &tss.text(), tss.runs())
    }

    /// Replaces `[min, lim)` with `text` formatted by `ins_runs`, whose ends
    /// are relative to the start of `text` and must cover it exactly.
    pub fn replace_runs(
        &mut self,
        min: usize,
        lim: usize,
        text: &str,
        ins_runs: &[Run],
    ) -> TsResult<()> {
        let len = self.len();
        check_range(min, lim, len)?;
        let ins_len = text.chars().count();
        validate_inserted_runs(ins_len, ins_runs)?;

        if min == 0 && lim == len && ins_len == 0 {
            // Keep a style for whatever gets typed next.
            let props = ins_runs
                .first()
                .map(|r| r.props.clone())
                .unwrap_or_else(|| self.runs[0].props.clone());
            self.text = Rope::new();
            self.runs = vec![Run::new(0, props)];
            return Ok(());
        }
        if min == lim && ins_len == 0 {
            return Ok(());
        }

        let first = self.runs.partition_point(|r| r.end <= min);
        let last = self.runs.partition_point(|r| r.end <= lim);

        self.text.remove(min..lim);
        self.text.insert(min, text);

        let mut replacement = Vec::with_capacity(ins_runs.len() + 1);
        if first < self.runs.len() && run_start(&self.runs, first) < min {
            trace!("Splitting run {} at {}", first, min);
            replacement.push(Run::new(min, self.runs[first].props.clone()));
        }
        if ins_len > 0 {
            replacement.extend(
                ins_runs
                    .iter()
                    .map(|r| Run::new(r.end + min, r.props.clone())),
            );
        }
        let inserted = replacement.len();
        self.runs.splice(first..last, replacement);

        let new_lim = min + ins_len;
        for run in &mut self.runs[first + inserted..] {
            run.end = run.end + new_lim - lim;
        }

        // Boundaries that may now be redundant: one before the splice through
        // one after it.
        let lo = first.saturating_sub(1);
        let hi = (first + inserted + 1).min(self.runs.len());
        self.merge_runs(lo, hi);
        Ok(())
    }

    /// Replaces the props of every run overlapping `[min, lim)`.
    pub fn set_props(&mut self, min: usize, lim: usize, props: &Arc<TextProps>) -> TsResult<()> {
        self.apply_props(min, lim, |_| props.clone())
    }

    /// Sets (or with `(-1, -1)` removes) one integer property over `[min, lim)`.
    pub fn set_int_prop(
        &mut self,
        min: usize,
        lim: usize,
        key: PropKey,
        variation: i32,
        value: i32,
    ) -> TsResult<()> {
        self.apply_props(min, lim, |old| {
            Arc::new(old.with_int_prop(key, variation, value))
        })
    }

    /// Sets (or with `None`/empty removes) one string property over `[min, lim)`.
    pub fn set_str_prop(
        &mut self,
        min: usize,
        lim: usize,
        key: PropKey,
        value: Option<&str>,
    ) -> TsResult<()> {
        self.apply_props(min, lim, |old| Arc::new(old.with_str_prop(key, value)))
    }

    fn apply_props<F>(&mut self, min: usize, lim: usize, transform: F) -> TsResult<()>
    where
        F: Fn(&Arc<TextProps>) -> Arc<TextProps>,
    {
        check_range(min, lim, self.len())?;
        if min == lim {
            // Styling the empty string sets the style of text typed later.
            if self.is_empty() {
                self.runs[0].props = transform(&self.runs[0].props);
            }
            return Ok(());
        }

        let mut first = run_containing(&self.runs, min);
        if run_start(&self.runs, first) < min {
            let props = self.runs[first].props.clone();
            self.runs.insert(first, Run::new(min, props));
            first += 1;
        }
        let last = self.runs.partition_point(|r| r.end < lim);
        if self.runs[last].end > lim {
            let props = self.runs[last].props.clone();
            self.runs.insert(last, Run::new(lim, props));
        }

        // Right to left, so merging only removes entries already visited.
        for irun in (first..=last).rev() {
            self.runs[irun].props = transform(&self.runs[irun].props);
            if irun + 1 < self.runs.len() && self.runs[irun].props == self.runs[irun + 1].props {
                self.runs.remove(irun);
            }
        }
        if first > 0 && self.runs[first - 1].props == self.runs[first].props {
            self.runs.remove(first - 1);
        }
        Ok(())
    }

    /// Drops zero-length and redundant boundaries among runs `[lo, hi)`.
    fn merge_runs(&mut self, lo: usize, hi: usize) {
        let mut irun = hi.min(self.runs.len());
        while irun > lo + 1 {
            irun -= 1;
            let prev = &self.runs[irun - 1];
            let cur = &self.runs[irun];
            if prev.end == run_start(&self.runs, irun - 1) || prev.props == cur.props {
                trace!("Merging run {} into {}", irun - 1, irun);
                self.runs.remove(irun - 1);
            } else if cur.end == prev.end {
                self.runs.remove(irun);
            }
        }
    }
}

fn run_start(runs: &[Run], irun: usize) -> usize {
    if irun == 0 { 0 } else { runs[irun - 1].end }
}

fn validate_inserted_runs(ins_len: usize, ins_runs: &[Run]) -> TsResult<()> {
    let Some(last) = ins_runs.last() else {
        return if ins_len == 0 {
            Ok(())
        } else {
            Err(TsError::NullArgument("runs"))
        };
    };
    if last.end != ins_len {
        return Err(TsError::Range {
            min: 0,
            lim: last.end,
            len: ins_len,
        });
    }
    if ins_len > 0 {
        let mut start = 0;
        for run in ins_runs {
            if run.end <= start {
                return Err(TsError::Range {
                    min: start,
                    lim: run.end,
                    len: ins_len,
                });
            }
            start = run.end;
        }
    }
    Ok(())
}
