//! Columns completed after dissection: frame data, addresses, ports and custom fields

use tracing::trace;

use crate::column::{Column, ColumnFormat, ColumnSet};
use crate::frame::{Address, FrameContext, PortType};
use crate::tree::{FieldValue, ProtoTree};

fn fill_address(col: &mut Column, addr: Address, side: &str, fill_expr: bool) {
    if let Address::None = addr {
        return;
    }
    let text = addr.to_string();
    col.set_owned(&text);
    if let (true, Some(prefix)) = (fill_expr, addr.filter_prefix()) {
        col.set_expr(&format!("{}.{}", prefix, side), &text);
    }
}

fn fill_port(col: &mut Column, pt: PortType, port: u16, side: &str, fill_expr: bool) {
    let prefix = match pt.filter_prefix() {
        Some(p) => p,
        None => return,
    };
    let text = port.to_string();
    col.set_owned(&text);
    if fill_expr {
        col.set_expr(&format!("{}.{}", prefix, side), &text);
    }
}

impl<'a> ColumnSet<'a> {
    /// Render the columns that come from the frame itself
    ///
    /// Frame data columns (number, times, lengths) are rendered only if `fill_fd_columns` is
    /// set; filter expressions only if `fill_col_exprs` is set. Writability is not checked:
    /// these values are known regardless of what the dissectors did.
    pub fn fill_in(&mut self, frame: &FrameContext, fill_col_exprs: bool, fill_fd_columns: bool) {
        let time = self.time;
        for col in self.columns.iter_mut() {
            match col.format {
                ColumnFormat::Number if fill_fd_columns => {
                    let text = frame.number.to_string();
                    col.set_owned(&text);
                    if fill_col_exprs {
                        col.set_expr("frame.number", &text);
                    }
                }
                f if f.is_time() && fill_fd_columns => col.fill_time(frame, time, fill_col_exprs),
                ColumnFormat::PacketLength if fill_fd_columns => {
                    let text = frame.pkt_len.to_string();
                    col.set_owned(&text);
                    if fill_col_exprs {
                        col.set_expr("frame.len", &text);
                    }
                }
                ColumnFormat::CumulativeBytes if fill_fd_columns => {
                    let text = frame.cum_bytes.to_string();
                    col.set_owned(&text);
                    if fill_col_exprs {
                        col.set_expr("frame.cum_bytes", &text);
                    }
                }
                ColumnFormat::DefSrc | ColumnFormat::UnresSrc => {
                    fill_address(col, frame.src, "src", fill_col_exprs)
                }
                ColumnFormat::DefDst | ColumnFormat::UnresDst => {
                    fill_address(col, frame.dst, "dst", fill_col_exprs)
                }
                ColumnFormat::DefSrcPort | ColumnFormat::UnresSrcPort => {
                    fill_port(col, frame.port_type, frame.src_port, "srcport", fill_col_exprs)
                }
                ColumnFormat::DefDstPort | ColumnFormat::UnresDstPort => {
                    fill_port(col, frame.port_type, frame.dst_port, "dstport", fill_col_exprs)
                }
                _ => (),
            }
        }
    }

    /// Render the custom columns from the values of the decoded fields
    ///
    /// Values are joined with `,`. The filter of a custom column uses the field of the
    /// first shown value.
    pub fn fill_custom(&mut self, tree: &ProtoTree) {
        for col in self.columns.iter_mut() {
            let custom = match (col.format, col.custom.as_ref()) {
                (ColumnFormat::Custom, Some(c)) => c,
                _ => continue,
            };
            let matches: Vec<(&str, &FieldValue)> = tree
                .iter()
                .filter_map(|n| {
                    let abbrev = n.abbrev()?;
                    if custom.fields.iter().any(|f| f == abbrev) {
                        Some((abbrev, &n.value))
                    } else {
                        None
                    }
                })
                .collect();
            let selected: &[(&str, &FieldValue)] = match custom.occurrence {
                0 => &matches[..],
                n if n > 0 => {
                    let idx = (n - 1) as usize;
                    matches.get(idx..=idx).unwrap_or(&[])
                }
                n => {
                    let back = n.unsigned_abs() as usize;
                    if back <= matches.len() {
                        let idx = matches.len() - back;
                        &matches[idx..=idx]
                    } else {
                        &[]
                    }
                }
            };
            let text = selected
                .iter()
                .map(|(_, v)| v.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let val = selected
                .iter()
                .map(|(_, v)| v.to_filter_string())
                .collect::<Vec<_>>()
                .join(",");
            trace!(column = %col.title, values = selected.len(), "custom column");
            col.set_owned(&text);
            match selected.first() {
                Some((abbrev, _)) => col.set_expr(abbrev, &val),
                None => col.set_expr("", ""),
            }
        }
    }

    /// Filter matching the value of column `i`
    ///
    /// Returns `<expr> == <value>`, or `<expr>` alone for a field without value, or None
    /// if the column has no filter.
    pub fn filter_expression(&self, i: usize) -> Option<String> {
        let col = self.columns.get(i)?;
        if col.expr.is_empty() {
            None
        } else if col.expr_val.is_empty() {
            Some(col.expr.clone())
        } else {
            Some(format!("{} == {}", col.expr, col.expr_val))
        }
    }
}
