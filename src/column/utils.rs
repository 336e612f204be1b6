//! Write operations on the columns of a packet
//!
//! Every operation applies to all the columns showing the given format, and does nothing if
//! there is no such column, if the column is not writable, or if the whole set is not
//! writable. Texts are silently truncated to the maximum length of the column.
//!
//! Content before the fence of a column is kept by all operations. `set_str`, `add_str`
//! and the other `add_*` operations replace the content after the fence; the `append_*`
//! operations extend it.

use std::fmt;

use crate::column::{push_bounded, truncated, Column, ColumnFormat, ColumnSelector, ColumnSet, ColumnText};

const DEFAULT_SEPARATOR: &str = ", ";

impl<'a> Column<'a> {
    /// Drop the content after the fence
    fn truncate_to_fence(&mut self) {
        if self.fence == 0 {
            self.text.reset();
        } else {
            let fence = self.fence;
            let buf = self.text.materialize();
            if fence < buf.len() {
                buf.truncate(fence);
            }
        }
    }

    fn append(&mut self, s: &str) {
        let max = self.max_len;
        push_bounded(self.text.materialize(), max, s);
    }

    fn prepend(&mut self, prefix: &str) -> usize {
        let max = self.max_len;
        let prefix = truncated(prefix, max);
        let buf = self.text.materialize();
        let orig = std::mem::take(buf);
        buf.push_str(prefix);
        push_bounded(buf, max, &orig);
        prefix.len()
    }

    fn clamp_fence(&mut self) {
        self.fence = self.fence.min(self.text.len());
    }
}

impl<'a> ColumnSet<'a> {
    fn for_each_target<F>(&mut self, format: ColumnFormat, mut f: F)
    where
        F: FnMut(&mut Column<'a>),
    {
        if !self.writable {
            return;
        }
        let range = match self.range_of(format) {
            Some(r) => r,
            None => return,
        };
        for col in self.columns[range].iter_mut() {
            if col.writable && col.shows(format) {
                f(col);
            }
        }
    }

    /// Enable or disable writes to the whole set, or to the columns showing one format
    pub fn set_writable<S: Into<ColumnSelector>>(&mut self, target: S, writable: bool) {
        match target.into() {
            ColumnSelector::All => self.writable = writable,
            ColumnSelector::Format(format) => {
                if let Some(range) = self.range_of(format) {
                    for col in self.columns[range].iter_mut() {
                        if col.shows(format) {
                            col.writable = writable;
                        }
                    }
                }
            }
        }
    }

    /// Returns true if writes are allowed
    ///
    /// A set that is not writable overrides the flag of every column.
    pub fn get_writable<S: Into<ColumnSelector>>(&self, target: S) -> bool {
        let format = match target.into() {
            ColumnSelector::All => return self.writable,
            ColumnSelector::Format(_) if !self.writable => return false,
            ColumnSelector::Format(f) => f,
        };
        self.range_of(format)
            .and_then(|range| {
                self.columns[range]
                    .iter()
                    .find(|col| col.shows(format))
                    .map(|col| col.writable)
            })
            .unwrap_or(false)
    }

    /// Text of the columns showing `format`
    ///
    /// Returns None if there is no such column or if it is not writable.
    pub fn get_text(&self, format: ColumnFormat) -> Option<&str> {
        if !self.writable {
            return None;
        }
        let range = self.range_of(format)?;
        self.columns[range]
            .iter()
            .filter(|col| col.writable && col.shows(format))
            .last()
            .map(Column::text)
    }

    /// Clear the content after the fence, and the filter value
    pub fn clear(&mut self, format: ColumnFormat) {
        self.for_each_target(format, |col| {
            col.truncate_to_fence();
            col.expr.clear();
            col.expr_val.clear();
        });
    }

    /// Protect the current content from later writes
    pub fn set_fence(&mut self, format: ColumnFormat) {
        self.for_each_target(format, |col| col.fence = col.text.len());
    }

    pub fn clear_fence(&mut self, format: ColumnFormat) {
        self.for_each_target(format, |col| col.fence = 0);
    }

    /// Set the text to `s`
    ///
    /// On an unfenced column the text borrows `s`, which must outlive the packet. On a fenced
    /// column `s` is copied after the fence.
    pub fn set_str(&mut self, format: ColumnFormat, s: &'a str) {
        self.for_each_target(format, |col| {
            if col.fence == 0 {
                col.text = ColumnText::Borrowed(truncated(s, col.max_len));
            } else {
                col.truncate_to_fence();
                col.append(s);
            }
        });
    }

    /// Set the text to a copy of `s`
    pub fn add_str(&mut self, format: ColumnFormat, s: &str) {
        self.for_each_target(format, |col| {
            col.truncate_to_fence();
            col.append(s);
        });
    }

    pub fn append_str(&mut self, format: ColumnFormat, s: &str) {
        self.for_each_target(format, |col| col.append(s));
    }

    /// Append `s`, preceded by `sep` (default `", "`) if the column is not empty
    pub fn append_sep_str(&mut self, format: ColumnFormat, sep: Option<&str>, s: &str) {
        let sep = sep.unwrap_or(DEFAULT_SEPARATOR);
        self.for_each_target(format, |col| {
            if !col.text.is_empty() {
                col.append(sep);
            }
            col.append(s);
        });
    }

    /// Set the text to a copy of each of `items`, concatenated
    pub fn add_lstr(&mut self, format: ColumnFormat, items: &[&str]) {
        self.for_each_target(format, |col| {
            col.truncate_to_fence();
            for s in items {
                col.append(s);
            }
        });
    }

    pub fn append_lstr(&mut self, format: ColumnFormat, items: &[&str]) {
        self.for_each_target(format, |col| {
            for s in items {
                col.append(s);
            }
        });
    }

    /// Formatting is skipped when no column would receive the text
    fn format_for(&self, format: ColumnFormat, args: fmt::Arguments) -> Option<String> {
        if self.any_writable(format) {
            Some(fmt::format(args))
        } else {
            None
        }
    }

    fn any_writable(&self, format: ColumnFormat) -> bool {
        self.writable
            && self
                .range_of(format)
                .map(|r| self.columns[r].iter().any(|c| c.writable && c.shows(format)))
                .unwrap_or(false)
    }

    pub fn add_fstr(&mut self, format: ColumnFormat, args: fmt::Arguments) {
        if let Some(s) = self.format_for(format, args) {
            self.add_str(format, &s);
        }
    }

    pub fn append_fstr(&mut self, format: ColumnFormat, args: fmt::Arguments) {
        if let Some(s) = self.format_for(format, args) {
            self.append_str(format, &s);
        }
    }

    pub fn append_sep_fstr(&mut self, format: ColumnFormat, sep: Option<&str>, args: fmt::Arguments) {
        if let Some(s) = self.format_for(format, args) {
            self.append_sep_str(format, sep, &s);
        }
    }

    /// Insert text at the start; an existing fence moves with the content
    pub fn prepend_fstr(&mut self, format: ColumnFormat, args: fmt::Arguments) {
        if let Some(s) = self.format_for(format, args) {
            self.for_each_target(format, |col| {
                let n = col.prepend(&s);
                if col.fence > 0 {
                    col.fence += n;
                }
                col.clamp_fence();
            });
        }
    }

    /// Insert text at the start, and make sure it is fenced
    pub fn prepend_fence_fstr(&mut self, format: ColumnFormat, args: fmt::Arguments) {
        if let Some(s) = self.format_for(format, args) {
            self.for_each_target(format, |col| {
                let n = col.prepend(&s);
                if col.fence > 0 {
                    col.fence += n;
                } else {
                    col.fence = n;
                }
                col.clamp_fence();
            });
        }
    }

    /// Set the filter field name and value of the columns showing `format`
    pub fn set_expr(&mut self, format: ColumnFormat, expr: &str, val: &str) {
        self.for_each_target(format, |col| col.set_expr(expr, val));
    }
}
