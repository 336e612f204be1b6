use packet_dissect::*;

fn info_columns() -> ColumnSet<'static> {
    let specs = vec![
        ColumnSpec::new(ColumnFormat::Protocol),
        ColumnSpec::new(ColumnFormat::Info),
    ];
    let mut cols = ColumnSet::setup(&specs, TimeDisplay::default());
    cols.init();
    cols
}

#[test]
fn test_fence_survives_clear() {
    let mut cols = info_columns();
    cols.set_str(ColumnFormat::Info, "A");
    cols.set_fence(ColumnFormat::Info);
    cols.append_str(ColumnFormat::Info, "B");
    assert_eq!(cols.get_text(ColumnFormat::Info), Some("AB"));
    cols.clear(ColumnFormat::Info);
    assert_eq!(cols.get_text(ColumnFormat::Info), Some("A"));
    // set_str after the fence copies, and keeps the fenced prefix
    cols.set_str(ColumnFormat::Info, "C");
    assert_eq!(cols.get_text(ColumnFormat::Info), Some("AC"));
    cols.clear_fence(ColumnFormat::Info);
    cols.clear(ColumnFormat::Info);
    assert_eq!(cols.get_text(ColumnFormat::Info), Some(""));
}

#[test]
fn test_fence_invariant_under_all_writes() {
    let mut cols = info_columns();
    cols.add_str(ColumnFormat::Info, "fixed");
    cols.set_fence(ColumnFormat::Info);
    cols.add_str(ColumnFormat::Info, "x");
    cols.add_fstr(ColumnFormat::Info, format_args!("{}", 12));
    cols.add_lstr(ColumnFormat::Info, &["a", "b"]);
    cols.append_sep_str(ColumnFormat::Info, None, "c");
    cols.clear(ColumnFormat::Info);
    cols.append_lstr(ColumnFormat::Info, &["d"]);
    let text = cols.get_text(ColumnFormat::Info).unwrap_or("");
    assert!(text.starts_with("fixed"), "fenced prefix lost: {:?}", text);
    assert_eq!(text, "fixedd");
}

#[test]
fn test_alias_materialization() {
    static PROTO: &str = "9P";
    let mut cols = info_columns();
    cols.set_str(ColumnFormat::Protocol, PROTO);
    let col = cols.column(0).expect("protocol column");
    assert!(col.content().is_borrowed());
    assert_eq!(col.text().as_ptr(), PROTO.as_ptr());
    cols.append_str(ColumnFormat::Protocol, "/TCP");
    let col = cols.column(0).expect("protocol column");
    assert!(!col.content().is_borrowed());
    assert_eq!(col.text(), "9P/TCP");
    assert_eq!(PROTO, "9P");
}

#[test]
fn test_writability_override() {
    let mut cols = info_columns();
    cols.set_writable(ColumnFormat::Info, true);
    cols.set_writable(ColumnSelector::All, false);
    assert!(!cols.get_writable(ColumnFormat::Info));
    assert!(!cols.get_writable(ColumnSelector::All));
    cols.add_str(ColumnFormat::Info, "ignored");
    assert_eq!(cols.get_text(ColumnFormat::Info), None);
    cols.set_writable(ColumnSelector::All, true);
    assert!(cols.get_writable(ColumnFormat::Info));
    assert_eq!(cols.get_text(ColumnFormat::Info), Some(""));
    // a column that is not writable is left alone
    cols.set_writable(ColumnFormat::Info, false);
    cols.add_str(ColumnFormat::Info, "ignored");
    cols.set_writable(ColumnFormat::Info, true);
    assert_eq!(cols.get_text(ColumnFormat::Info), Some(""));
}

#[test]
fn test_truncation() {
    let mut cols = info_columns();
    let long = "x".repeat(COL_MAX_INFO_LEN + 100);
    cols.add_str(ColumnFormat::Info, &long);
    assert_eq!(cols.get_text(ColumnFormat::Info).map(str::len), Some(COL_MAX_INFO_LEN));
    cols.append_str(ColumnFormat::Info, "more");
    assert_eq!(cols.get_text(ColumnFormat::Info).map(str::len), Some(COL_MAX_INFO_LEN));

    let long = "y".repeat(COL_MAX_LEN * 2);
    cols.add_str(ColumnFormat::Protocol, &long);
    assert_eq!(cols.get_text(ColumnFormat::Protocol).map(str::len), Some(COL_MAX_LEN));
    cols.prepend_fstr(ColumnFormat::Protocol, format_args!("zz"));
    let text = cols.get_text(ColumnFormat::Protocol).unwrap_or("");
    assert_eq!(text.len(), COL_MAX_LEN);
    assert!(text.starts_with("zzy"));
}

#[test]
fn test_prepend_fence() {
    let mut cols = info_columns();
    cols.add_str(ColumnFormat::Info, "body");
    cols.prepend_fence_fstr(ColumnFormat::Info, format_args!("[{}] ", "hdr"));
    assert_eq!(cols.get_text(ColumnFormat::Info), Some("[hdr] body"));
    cols.clear(ColumnFormat::Info);
    assert_eq!(cols.get_text(ColumnFormat::Info), Some("[hdr] "));
}

#[test]
fn test_fan_out_and_absent_format() {
    let specs = vec![
        ColumnSpec::new(ColumnFormat::Info).with_title("Info 1"),
        ColumnSpec::new(ColumnFormat::Protocol),
        ColumnSpec::new(ColumnFormat::Info).with_title("Info 2"),
    ];
    let mut cols = ColumnSet::setup(&specs, TimeDisplay::default());
    cols.init();
    cols.add_str(ColumnFormat::Info, "both");
    assert_eq!(cols.text_at(0), Some("both"));
    assert_eq!(cols.text_at(1), Some(""));
    assert_eq!(cols.text_at(2), Some("both"));
    // no such column: nothing happens
    cols.add_str(ColumnFormat::DefSrc, "nowhere");
    assert_eq!(cols.get_text(ColumnFormat::DefSrc), None);
}

#[test]
fn test_init_resets_everything() {
    let mut cols = info_columns();
    cols.add_str(ColumnFormat::Info, "A");
    cols.set_fence(ColumnFormat::Info);
    cols.set_writable(ColumnSelector::All, false);
    cols.init();
    assert!(cols.get_writable(ColumnSelector::All));
    cols.add_str(ColumnFormat::Info, "B");
    assert_eq!(cols.get_text(ColumnFormat::Info), Some("B"));
}
