//! Rendering of timestamps in time columns

use chrono::{DateTime, Local, Utc};

use crate::column::{Column, ColumnFormat, ColumnSet};
use crate::frame::{FrameContext, NsTime};

/// Shown instead of a relative or delta time for a reference frame
pub const REF_TIME_MARKER: &str = "*REF*";

/// How timestamps are shown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampFormat {
    /// Seconds since the first (or reference) frame
    Relative,
    /// Local time of day
    Absolute,
    /// Local date (`YYYY-MM-DD`) and time
    AbsoluteWithYmd,
    /// Local date (`YYYY/DOY`) and time
    AbsoluteWithYdoy,
    Utc,
    UtcWithYmd,
    UtcWithYdoy,
    /// Seconds since the previous captured frame
    Delta,
    /// Seconds since the previous displayed frame
    DeltaDisplayed,
    /// Seconds since 1970-01-01 00:00:00 UTC
    Epoch,
}

impl Default for TimestampFormat {
    fn default() -> Self {
        TimestampFormat::Relative
    }
}

impl TimestampFormat {
    /// Format rendered by a time column, `configured` being used by the generic time column
    pub fn for_column(format: ColumnFormat, configured: TimestampFormat) -> Option<TimestampFormat> {
        let f = match format {
            ColumnFormat::ClsTime => configured,
            ColumnFormat::AbsTime => TimestampFormat::Absolute,
            ColumnFormat::AbsYmdTime => TimestampFormat::AbsoluteWithYmd,
            ColumnFormat::AbsYdoyTime => TimestampFormat::AbsoluteWithYdoy,
            ColumnFormat::UtcTime => TimestampFormat::Utc,
            ColumnFormat::UtcYmdTime => TimestampFormat::UtcWithYmd,
            ColumnFormat::UtcYdoyTime => TimestampFormat::UtcWithYdoy,
            ColumnFormat::RelTime => TimestampFormat::Relative,
            ColumnFormat::DeltaTime => TimestampFormat::Delta,
            ColumnFormat::DeltaTimeDis => TimestampFormat::DeltaDisplayed,
            ColumnFormat::EpochTime => TimestampFormat::Epoch,
            _ => return None,
        };
        Some(f)
    }

    /// Returns true for formats showing a time difference
    pub fn is_relative(self) -> bool {
        matches!(
            self,
            TimestampFormat::Relative | TimestampFormat::Delta | TimestampFormat::DeltaDisplayed
        )
    }

    /// Filter field matching this rendering
    pub fn filter_field(self) -> &'static str {
        match self {
            TimestampFormat::Relative => "frame.time_relative",
            TimestampFormat::Absolute
            | TimestampFormat::AbsoluteWithYmd
            | TimestampFormat::AbsoluteWithYdoy => "frame.time",
            TimestampFormat::Utc | TimestampFormat::UtcWithYmd | TimestampFormat::UtcWithYdoy => {
                "frame.time_utc"
            }
            TimestampFormat::Delta => "frame.time_delta",
            TimestampFormat::DeltaDisplayed => "frame.time_delta_displayed",
            TimestampFormat::Epoch => "frame.time_epoch",
        }
    }
}

/// Number of fractional digits shown
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampPrecision {
    /// The precision of the capture
    Auto,
    Sec,
    DSec,
    CSec,
    MSec,
    USec,
    NSec,
}

impl Default for TimestampPrecision {
    fn default() -> Self {
        TimestampPrecision::Auto
    }
}

impl TimestampPrecision {
    pub fn digits(self, frame_precision: u8) -> usize {
        match self {
            TimestampPrecision::Auto => usize::from(frame_precision.min(9)),
            TimestampPrecision::Sec => 0,
            TimestampPrecision::DSec => 1,
            TimestampPrecision::CSec => 2,
            TimestampPrecision::MSec => 3,
            TimestampPrecision::USec => 6,
            TimestampPrecision::NSec => 9,
        }
    }
}

/// Time display settings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TimeDisplay {
    pub format: TimestampFormat,
    pub precision: TimestampPrecision,
}

impl TimeDisplay {
    pub fn new(format: TimestampFormat, precision: TimestampPrecision) -> TimeDisplay {
        TimeDisplay { format, precision }
    }
}

fn push_fraction(out: &mut String, nsecs: u32, digits: usize) {
    if digits == 0 {
        return;
    }
    let digits = digits.min(9);
    let frac = nsecs / 10u32.pow(9 - digits as u32);
    out.push_str(&format!(".{:0width$}", frac, width = digits));
}

/// Render a signed time as seconds, with `digits` fractional digits (truncated)
pub fn format_signed(t: NsTime, digits: usize) -> String {
    let mut out = String::new();
    if t.is_negative() {
        out.push('-');
    }
    out.push_str(&t.secs.unsigned_abs().to_string());
    push_fraction(&mut out, t.nsecs.unsigned_abs(), digits);
    out
}

/// Render an absolute time as a date and/or time of day
///
/// Returns None for relative formats, and for times chrono cannot represent.
pub fn format_absolute(t: NsTime, format: TimestampFormat, digits: usize) -> Option<String> {
    if t.nsecs < 0 {
        return None;
    }
    let utc: DateTime<Utc> = DateTime::from_timestamp(t.secs, t.nsecs as u32)?;
    let mut out = match format {
        TimestampFormat::Absolute => utc.with_timezone(&Local).format("%H:%M:%S").to_string(),
        TimestampFormat::AbsoluteWithYmd => utc
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        TimestampFormat::AbsoluteWithYdoy => utc
            .with_timezone(&Local)
            .format("%Y/%j %H:%M:%S")
            .to_string(),
        TimestampFormat::Utc => utc.format("%H:%M:%S").to_string(),
        TimestampFormat::UtcWithYmd => utc.format("%Y-%m-%d %H:%M:%S").to_string(),
        TimestampFormat::UtcWithYdoy => utc.format("%Y/%j %H:%M:%S").to_string(),
        _ => return None,
    };
    push_fraction(&mut out, t.nsecs as u32, digits);
    Some(out)
}

/// A rendered time, with the filter matching it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedTime {
    pub text: String,
    pub expr: &'static str,
    pub expr_val: String,
}

/// Render the timestamp of `frame` in `format`
pub fn render_frame_time(
    frame: &FrameContext,
    format: TimestampFormat,
    precision: TimestampPrecision,
) -> RenderedTime {
    if frame.ref_time && format.is_relative() {
        return RenderedTime {
            text: REF_TIME_MARKER.to_owned(),
            expr: "frame.ref_time",
            expr_val: String::new(),
        };
    }
    let digits = precision.digits(frame.ts_precision);
    let text = match format {
        TimestampFormat::Relative => format_signed(frame.rel_ts, digits),
        TimestampFormat::Delta => format_signed(frame.delta_ts, digits),
        TimestampFormat::DeltaDisplayed => format_signed(frame.delta_dis_ts, digits),
        TimestampFormat::Epoch => format_signed(frame.abs_ts, digits),
        _ => match format_absolute(frame.abs_ts, format, digits) {
            Some(s) => s,
            None => "Not representable".to_owned(),
        },
    };
    let expr_val = if format.is_relative() || format == TimestampFormat::Epoch {
        text.clone()
    } else {
        format!("\"{}\"", text)
    };
    RenderedTime {
        text,
        expr: format.filter_field(),
        expr_val,
    }
}

impl<'a> Column<'a> {
    /// Render the frame time into a time column, ignoring writability
    pub(crate) fn fill_time(&mut self, frame: &FrameContext, time: TimeDisplay, fill_expr: bool) {
        let format = match TimestampFormat::for_column(self.format, time.format) {
            Some(f) => f,
            None => return,
        };
        let rendered = render_frame_time(frame, format, time.precision);
        self.set_owned(&rendered.text);
        if fill_expr {
            self.set_expr(rendered.expr, &rendered.expr_val);
        }
    }
}

impl<'a> ColumnSet<'a> {
    /// Render `ts` as a signed time into the columns showing `format`
    ///
    /// `fieldname` is the filter field the value belongs to.
    pub fn set_time(&mut self, format: ColumnFormat, ts: &NsTime, fieldname: &str) {
        let digits = self.time.precision.digits(9);
        let text = format_signed(*ts, digits);
        self.add_str(format, &text);
        self.set_expr(format, fieldname, &text);
    }

    /// Render the frame time into the time columns showing `format`
    pub fn set_frame_time(&mut self, frame: &FrameContext, format: ColumnFormat) {
        if !format.is_time() {
            return;
        }
        let time = self.time;
        let range = match self.range_of(format) {
            Some(r) if self.writable => r,
            _ => return,
        };
        for col in self.columns[range].iter_mut() {
            if col.writable && col.shows(format) {
                col.fill_time(frame, time, true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signed_times() {
        assert_eq!(format_signed(NsTime::new(1, 234_567_891), 6), "1.234567");
        assert_eq!(format_signed(NsTime::new(0, -5_000_000), 3), "-0.005");
        assert_eq!(format_signed(NsTime::new(12, 0), 0), "12");
    }

    #[test]
    fn utc_times() {
        let t = NsTime::new(1_700_000_000, 123_456_789);
        assert_eq!(
            format_absolute(t, TimestampFormat::UtcWithYmd, 3).as_deref(),
            Some("2023-11-14 22:13:20.123")
        );
        assert_eq!(
            format_absolute(t, TimestampFormat::UtcWithYdoy, 0).as_deref(),
            Some("2023/318 22:13:20")
        );
        assert_eq!(format_absolute(t, TimestampFormat::Relative, 3), None);
    }

    #[test]
    fn reference_frame_marker() {
        let frame = FrameContext {
            ref_time: true,
            rel_ts: NsTime::new(3, 0),
            abs_ts: NsTime::new(1_700_000_000, 0),
            ts_precision: 6,
            ..FrameContext::default()
        };
        let r = render_frame_time(&frame, TimestampFormat::Relative, TimestampPrecision::Auto);
        assert_eq!(r.text, REF_TIME_MARKER);
        assert_eq!(r.expr, "frame.ref_time");
        let r = render_frame_time(&frame, TimestampFormat::Epoch, TimestampPrecision::MSec);
        assert_eq!(r.text, "1700000000.000");
        assert_eq!(r.expr, "frame.time_epoch");
        let r = render_frame_time(&frame, TimestampFormat::Utc, TimestampPrecision::Sec);
        assert_eq!(r.expr_val, "\"22:13:20\"");
    }
}
