//! Summary columns of the packet list
//!
//! A [`ColumnSet`] is created once per capture from a list of [`ColumnSpec`], reset with
//! [`ColumnSet::init`] before each packet, written by the dissectors through the operations of
//! the [`utils`] module, then completed by [`ColumnSet::fill_in`] and
//! [`ColumnSet::fill_custom`] and read with [`ColumnSet::row`].
//!
//! Each column owns its text as a [`ColumnText`]: either borrowed from the caller (set with
//! [`ColumnSet::set_str`] on an unfenced column), or an owned buffer. Operations that extend
//! the text first turn a borrowed text into an owned one.

use std::fmt;

use crate::column::time::TimeDisplay;

pub mod fill;
pub mod time;
pub mod utils;

/// Maximum length of a column text
pub const COL_MAX_LEN: usize = 2048;
/// Maximum length of the text of the Info column
pub const COL_MAX_INFO_LEN: usize = 4096;

/// The kind of value a column shows
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnFormat {
    Number,
    ClsTime,
    AbsTime,
    AbsYmdTime,
    AbsYdoyTime,
    UtcTime,
    UtcYmdTime,
    UtcYdoyTime,
    RelTime,
    DeltaTime,
    DeltaTimeDis,
    EpochTime,
    DefSrc,
    UnresSrc,
    DefDst,
    UnresDst,
    DefSrcPort,
    UnresSrcPort,
    DefDstPort,
    UnresDstPort,
    Protocol,
    PacketLength,
    CumulativeBytes,
    Info,
    Custom,
}

impl ColumnFormat {
    pub const COUNT: usize = 25;

    pub const ALL: [ColumnFormat; ColumnFormat::COUNT] = [
        ColumnFormat::Number,
        ColumnFormat::ClsTime,
        ColumnFormat::AbsTime,
        ColumnFormat::AbsYmdTime,
        ColumnFormat::AbsYdoyTime,
        ColumnFormat::UtcTime,
        ColumnFormat::UtcYmdTime,
        ColumnFormat::UtcYdoyTime,
        ColumnFormat::RelTime,
        ColumnFormat::DeltaTime,
        ColumnFormat::DeltaTimeDis,
        ColumnFormat::EpochTime,
        ColumnFormat::DefSrc,
        ColumnFormat::UnresSrc,
        ColumnFormat::DefDst,
        ColumnFormat::UnresDst,
        ColumnFormat::DefSrcPort,
        ColumnFormat::UnresSrcPort,
        ColumnFormat::DefDstPort,
        ColumnFormat::UnresDstPort,
        ColumnFormat::Protocol,
        ColumnFormat::PacketLength,
        ColumnFormat::CumulativeBytes,
        ColumnFormat::Info,
        ColumnFormat::Custom,
    ];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Default title of a column of this format
    pub fn title(self) -> &'static str {
        match self {
            ColumnFormat::Number => "No.",
            ColumnFormat::ClsTime => "Time",
            ColumnFormat::AbsTime => "Absolute time",
            ColumnFormat::AbsYmdTime => "Absolute date, as YYYY-MM-DD, and time",
            ColumnFormat::AbsYdoyTime => "Absolute date, as YYYY/DOY, and time",
            ColumnFormat::UtcTime => "UTC time",
            ColumnFormat::UtcYmdTime => "UTC date, as YYYY-MM-DD, and time",
            ColumnFormat::UtcYdoyTime => "UTC date, as YYYY/DOY, and time",
            ColumnFormat::RelTime => "Relative time",
            ColumnFormat::DeltaTime => "Delta time",
            ColumnFormat::DeltaTimeDis => "Delta time displayed",
            ColumnFormat::EpochTime => "Epoch time",
            ColumnFormat::DefSrc => "Source",
            ColumnFormat::UnresSrc => "Source address (unresolved)",
            ColumnFormat::DefDst => "Destination",
            ColumnFormat::UnresDst => "Destination address (unresolved)",
            ColumnFormat::DefSrcPort => "Source port",
            ColumnFormat::UnresSrcPort => "Source port (unresolved)",
            ColumnFormat::DefDstPort => "Destination port",
            ColumnFormat::UnresDstPort => "Destination port (unresolved)",
            ColumnFormat::Protocol => "Protocol",
            ColumnFormat::PacketLength => "Length",
            ColumnFormat::CumulativeBytes => "Cumulative Bytes",
            ColumnFormat::Info => "Info",
            ColumnFormat::Custom => "Custom",
        }
    }

    /// Maximum text length of a column of this format
    pub fn max_len(self) -> usize {
        match self {
            ColumnFormat::Info => COL_MAX_INFO_LEN,
            _ => COL_MAX_LEN,
        }
    }

    pub fn is_time(self) -> bool {
        matches!(
            self,
            ColumnFormat::ClsTime
                | ColumnFormat::AbsTime
                | ColumnFormat::AbsYmdTime
                | ColumnFormat::AbsYdoyTime
                | ColumnFormat::UtcTime
                | ColumnFormat::UtcYmdTime
                | ColumnFormat::UtcYdoyTime
                | ColumnFormat::RelTime
                | ColumnFormat::DeltaTime
                | ColumnFormat::DeltaTimeDis
                | ColumnFormat::EpochTime
        )
    }

    /// Formats whose writes are shown by a column of this format
    fn matches(self) -> &'static [ColumnFormat] {
        use ColumnFormat::*;
        match self {
            DefSrc => &[DefSrc, UnresSrc],
            DefDst => &[DefDst, UnresDst],
            DefSrcPort => &[DefSrcPort, UnresSrcPort],
            DefDstPort => &[DefDstPort, UnresDstPort],
            Number => &[Number],
            ClsTime => &[ClsTime],
            AbsTime => &[AbsTime],
            AbsYmdTime => &[AbsYmdTime],
            AbsYdoyTime => &[AbsYdoyTime],
            UtcTime => &[UtcTime],
            UtcYmdTime => &[UtcYmdTime],
            UtcYdoyTime => &[UtcYdoyTime],
            RelTime => &[RelTime],
            DeltaTime => &[DeltaTime],
            DeltaTimeDis => &[DeltaTimeDis],
            EpochTime => &[EpochTime],
            UnresSrc => &[UnresSrc],
            UnresDst => &[UnresDst],
            UnresSrcPort => &[UnresSrcPort],
            UnresDstPort => &[UnresDstPort],
            Protocol => &[Protocol],
            PacketLength => &[PacketLength],
            CumulativeBytes => &[CumulativeBytes],
            Info => &[Info],
            Custom => &[Custom],
        }
    }
}

impl fmt::Display for ColumnFormat {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Target of [`ColumnSet::set_writable`] and [`ColumnSet::get_writable`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColumnSelector {
    /// The whole column set
    All,
    Format(ColumnFormat),
}

impl From<ColumnFormat> for ColumnSelector {
    fn from(f: ColumnFormat) -> Self {
        ColumnSelector::Format(f)
    }
}

/// Text of a column: borrowed from the caller, or owned
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnText<'a> {
    Borrowed(&'a str),
    Owned(String),
}

impl<'a> ColumnText<'a> {
    #[inline]
    pub fn as_str(&self) -> &str {
        match self {
            ColumnText::Borrowed(s) => s,
            ColumnText::Owned(s) => s.as_str(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.as_str().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.as_str().is_empty()
    }

    #[inline]
    pub fn is_borrowed(&self) -> bool {
        matches!(self, ColumnText::Borrowed(_))
    }

    /// Return the owned buffer, copying a borrowed text into it first
    pub(crate) fn materialize(&mut self) -> &mut String {
        if let ColumnText::Borrowed(s) = *self {
            *self = ColumnText::Owned(s.to_owned());
        }
        match self {
            ColumnText::Owned(s) => s,
            // a borrowed text was replaced above
            ColumnText::Borrowed(_) => unreachable!(),
        }
    }

    /// Reset to an empty owned buffer, keeping its allocation
    pub(crate) fn reset(&mut self) {
        match self {
            ColumnText::Owned(s) => s.clear(),
            ColumnText::Borrowed(_) => *self = ColumnText::Owned(String::new()),
        }
    }
}

impl<'a> Default for ColumnText<'a> {
    fn default() -> Self {
        ColumnText::Owned(String::new())
    }
}

/// Field list of a custom column, compiled from `field1 || field2 ...`
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomFields {
    pub fields: Vec<String>,
    /// 0 for all occurrences, `n` for the n-th, `-n` for the n-th from the end
    pub occurrence: i32,
}

impl CustomFields {
    /// Compile a custom field expression, or return None if it names no field
    pub fn compile(expr: &str, occurrence: i32) -> Option<CustomFields> {
        let fields: Vec<String> = expr
            .split("||")
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_owned)
            .collect();
        if fields.is_empty() || fields.iter().any(|f| f.contains(char::is_whitespace)) {
            return None;
        }
        Some(CustomFields { fields, occurrence })
    }
}

/// One column of the summary row
#[derive(Clone, Debug)]
pub struct Column<'a> {
    pub(crate) format: ColumnFormat,
    pub(crate) title: String,
    pub(crate) fmt_matx: [bool; ColumnFormat::COUNT],
    pub(crate) text: ColumnText<'a>,
    pub(crate) fence: usize,
    pub(crate) writable: bool,
    pub(crate) max_len: usize,
    /// Filter field name for "apply as filter"
    pub(crate) expr: String,
    /// Filter value for "apply as filter"
    pub(crate) expr_val: String,
    pub(crate) custom: Option<CustomFields>,
}

impl<'a> Column<'a> {
    fn new(spec: &ColumnSpec) -> Column<'a> {
        let mut fmt_matx = [false; ColumnFormat::COUNT];
        for f in spec.format.matches() {
            fmt_matx[f.index()] = true;
        }
        let custom = match spec.format {
            ColumnFormat::Custom => CustomFields::compile(&spec.custom_fields, spec.custom_occurrence),
            _ => None,
        };
        Column {
            format: spec.format,
            title: spec.title.clone(),
            fmt_matx,
            text: ColumnText::default(),
            fence: 0,
            writable: true,
            max_len: spec.format.max_len(),
            expr: String::new(),
            expr_val: String::new(),
            custom,
        }
    }

    #[inline]
    pub fn format(&self) -> ColumnFormat {
        self.format
    }

    #[inline]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[inline]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    #[inline]
    pub fn content(&self) -> &ColumnText<'a> {
        &self.text
    }

    #[inline]
    pub fn fence(&self) -> usize {
        self.fence
    }

    #[inline]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    #[inline]
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    pub fn expr_val(&self) -> &str {
        &self.expr_val
    }

    pub fn custom_fields(&self) -> Option<&CustomFields> {
        self.custom.as_ref()
    }

    #[inline]
    pub(crate) fn shows(&self, format: ColumnFormat) -> bool {
        self.fmt_matx[format.index()]
    }

    /// Replace the text, ignoring the fence
    pub(crate) fn set_owned(&mut self, s: &str) {
        self.text.reset();
        let max = self.max_len;
        push_bounded(self.text.materialize(), max, s);
    }

    pub(crate) fn set_expr(&mut self, expr: &str, val: &str) {
        self.expr.clear();
        push_bounded(&mut self.expr, COL_MAX_LEN, expr);
        self.expr_val.clear();
        push_bounded(&mut self.expr_val, COL_MAX_LEN, val);
    }
}

/// Append `s` to `buf`, dropping what does not fit in `max` bytes
pub(crate) fn push_bounded(buf: &mut String, max: usize, s: &str) {
    if buf.len() >= max {
        return;
    }
    buf.push_str(truncated(s, max - buf.len()));
}

/// Longest prefix of `s` of at most `max` bytes ending on a char boundary
pub(crate) fn truncated(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Description of one column of the configured layout
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpec {
    pub title: String,
    pub format: ColumnFormat,
    /// Fields of a custom column (`a || b`)
    pub custom_fields: String,
    pub custom_occurrence: i32,
}

impl ColumnSpec {
    pub fn new(format: ColumnFormat) -> ColumnSpec {
        ColumnSpec {
            title: format.title().to_owned(),
            format,
            custom_fields: String::new(),
            custom_occurrence: 0,
        }
    }

    pub fn with_title<S: Into<String>>(mut self, title: S) -> ColumnSpec {
        self.title = title.into();
        self
    }

    pub fn custom<S: Into<String>>(title: S, fields: &str, occurrence: i32) -> ColumnSpec {
        ColumnSpec {
            title: title.into(),
            format: ColumnFormat::Custom,
            custom_fields: fields.to_owned(),
            custom_occurrence: occurrence,
        }
    }
}

/// The classic No. / Time / Source / Destination / Protocol / Length / Info layout
pub fn default_columns() -> Vec<ColumnSpec> {
    [
        ColumnFormat::Number,
        ColumnFormat::ClsTime,
        ColumnFormat::DefSrc,
        ColumnFormat::DefDst,
        ColumnFormat::Protocol,
        ColumnFormat::PacketLength,
        ColumnFormat::Info,
    ]
    .iter()
    .map(|f| ColumnSpec::new(*f))
    .collect()
}

/// The columns of one packet row
#[derive(Debug)]
pub struct ColumnSet<'a> {
    pub(crate) columns: Vec<Column<'a>>,
    pub(crate) col_first: [Option<usize>; ColumnFormat::COUNT],
    pub(crate) col_last: [Option<usize>; ColumnFormat::COUNT],
    pub(crate) writable: bool,
    pub(crate) time: TimeDisplay,
    custom_extractors: bool,
}

impl<'a> ColumnSet<'a> {
    /// Build the column set of a capture session
    pub fn setup(specs: &[ColumnSpec], time: TimeDisplay) -> ColumnSet<'a> {
        let columns: Vec<Column> = specs.iter().map(Column::new).collect();
        let mut col_first = [None; ColumnFormat::COUNT];
        let mut col_last = [None; ColumnFormat::COUNT];
        for (i, col) in columns.iter().enumerate() {
            for f in ColumnFormat::ALL.iter() {
                if col.shows(*f) {
                    let idx = f.index();
                    if col_first[idx].is_none() {
                        col_first[idx] = Some(i);
                    }
                    col_last[idx] = Some(i);
                }
            }
        }
        ColumnSet {
            columns,
            col_first,
            col_last,
            writable: true,
            time,
            custom_extractors: false,
        }
    }

    /// Reset all columns before dissecting a packet
    pub fn init(&mut self) {
        for col in self.columns.iter_mut() {
            col.text.reset();
            col.fence = 0;
            col.writable = true;
            col.expr.clear();
            col.expr_val.clear();
        }
        self.writable = true;
    }

    /// Release all columns at the end of the session
    pub fn cleanup(&mut self) {
        self.columns.clear();
        self.col_first = [None; ColumnFormat::COUNT];
        self.col_last = [None; ColumnFormat::COUNT];
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, i: usize) -> Option<&Column<'a>> {
        self.columns.get(i)
    }

    pub fn columns(&self) -> &[Column<'a>] {
        &self.columns
    }

    /// Text of column `i`
    pub fn text_at(&self, i: usize) -> Option<&str> {
        self.columns.get(i).map(Column::text)
    }

    /// Returns true if at least one column shows `format`
    pub fn has_format(&self, format: ColumnFormat) -> bool {
        self.col_first[format.index()].is_some()
    }

    /// Index range of the columns showing `format`
    pub fn range_of(&self, format: ColumnFormat) -> Option<std::ops::RangeInclusive<usize>> {
        match (self.col_first[format.index()], self.col_last[format.index()]) {
            (Some(first), Some(last)) => Some(first..=last),
            _ => None,
        }
    }

    pub fn time_display(&self) -> TimeDisplay {
        self.time
    }

    pub fn set_time_display(&mut self, time: TimeDisplay) {
        self.time = time;
    }

    /// Returns true if custom field extractors are available
    pub fn has_custom_extractors(&self) -> bool {
        self.custom_extractors
    }

    pub fn set_custom_extractors(&mut self, enabled: bool) {
        self.custom_extractors = enabled;
    }

    /// Snapshot of the finalized texts and filters
    pub fn row(&self) -> ColumnRow {
        let cells = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, col)| ColumnCell {
                format: col.format,
                title: col.title.clone(),
                text: col.text().to_owned(),
                filter: self.filter_expression(i),
            })
            .collect();
        ColumnRow { cells }
    }
}

/// Finalized column of one packet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnCell {
    pub format: ColumnFormat,
    pub title: String,
    pub text: String,
    /// Filter matching this value, if any
    pub filter: Option<String>,
}

/// Finalized columns of one packet
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ColumnRow {
    pub cells: Vec<ColumnCell>,
}

impl ColumnRow {
    /// Text of the first column showing `format`
    pub fn text(&self, format: ColumnFormat) -> Option<&str> {
        self.cells
            .iter()
            .find(|c| c.format == format)
            .map(|c| c.text.as_str())
    }

    /// Text of the first column titled `title`
    pub fn by_title(&self, title: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|c| c.title == title)
            .map(|c| c.text.as_str())
    }

    pub fn texts(&self) -> Vec<&str> {
        self.cells.iter().map(|c| c.text.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_last_use_the_format_matrix() {
        let specs = vec![
            ColumnSpec::new(ColumnFormat::UnresSrc),
            ColumnSpec::new(ColumnFormat::Info),
            ColumnSpec::new(ColumnFormat::DefSrc),
        ];
        let set = ColumnSet::setup(&specs, TimeDisplay::default());
        assert_eq!(set.range_of(ColumnFormat::UnresSrc), Some(0..=2));
        assert_eq!(set.range_of(ColumnFormat::DefSrc), Some(2..=2));
        assert_eq!(set.range_of(ColumnFormat::Info), Some(1..=1));
        assert!(!set.has_format(ColumnFormat::Protocol));
        assert_eq!(set.column(1).map(Column::max_len), Some(COL_MAX_INFO_LEN));
    }

    #[test]
    fn compile_custom_fields() {
        let c = CustomFields::compile("9p.fid || 9p.newfid", -1).expect("compiled");
        assert_eq!(c.fields, vec!["9p.fid", "9p.newfid"]);
        assert!(CustomFields::compile(" || ", 0).is_none());
        assert!(CustomFields::compile("a b", 0).is_none());
    }

    #[test]
    fn truncate_on_char_boundary() {
        assert_eq!(truncated("abcdef", 4), "abcd");
        assert_eq!(truncated("aé", 2), "a");
        let mut s = String::from("xy");
        push_bounded(&mut s, 4, "123");
        assert_eq!(s, "xy12");
    }
}
