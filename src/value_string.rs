//! `code -> name` lookup tables for enumerated fields

use std::borrow::Cow;

/// One entry of a lookup table
pub type ValueString = (u32, &'static str);

/// Return the name of `value`, or None if it is not in the table
pub fn try_val_to_str(value: u32, table: &[ValueString]) -> Option<&'static str> {
    table.iter().find(|(v, _)| *v == value).map(|(_, s)| *s)
}

/// Return the name of `value`, or `fallback`
#[inline]
pub fn val_to_str_const(value: u32, table: &[ValueString], fallback: &'static str) -> &'static str {
    try_val_to_str(value, table).unwrap_or(fallback)
}

/// Return the name of `value`, or `Unknown (0x..)`
pub fn val_to_str(value: u32, table: &[ValueString]) -> Cow<'static, str> {
    match try_val_to_str(value, table) {
        Some(s) => Cow::Borrowed(s),
        None => Cow::Owned(format!("Unknown (0x{:02x})", value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &[ValueString] = &[(0, "zero"), (7, "seven")];

    #[test]
    fn lookup_and_fallback() {
        assert_eq!(try_val_to_str(7, TABLE), Some("seven"));
        assert_eq!(val_to_str_const(8, TABLE, "?"), "?");
        assert_eq!(val_to_str(0, TABLE), "zero");
        assert_eq!(val_to_str(0x1a, TABLE), "Unknown (0x1a)");
    }
}
