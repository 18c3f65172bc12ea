//! A1-style cell references.

/// Excel's last row (1-based count).
pub const MAX_ROWS: u32 = 1_048_576;
/// Excel's last column, `XFD` (1-based count).
pub const MAX_COLS: u32 = 16_384;

/// Parse a reference like `"B3"` or `"$B$3"` into zero-based `(row, col)`.
///
/// Letters must come before digits. References past the Excel maxima are
/// rejected.
pub fn parse_cell_ref(cell_ref: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_col = false;
    let mut saw_row = false;

    for &b in cell_ref {
        match b {
            b'$' => {}
            b'A'..=b'Z' | b'a'..=b'z' if !saw_row => {
                let digit = u32::from(b.to_ascii_uppercase() - b'A') + 1;
                col = col.checked_mul(26)?.checked_add(digit)?;
                saw_col = true;
            }
            b'0'..=b'9' => {
                row = row.checked_mul(10)?.checked_add(u32::from(b - b'0'))?;
                saw_row = true;
            }
            _ => return None,
        }
    }

    if !saw_col || !saw_row || row == 0 || row > MAX_ROWS || col > MAX_COLS {
        return None;
    }

    Some((row - 1, col - 1))
}

/// Parse `"A1:C4"` (or a lone `"A1"`) into zero-based inclusive
/// `(start_row, start_col, end_row, end_col)`, normalized so start <= end.
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    let range = range.trim();
    let (start, end) = range.split_once(':').unwrap_or((range, range));
    let (r0, c0) = parse_cell_ref(start.as_bytes())?;
    let (r1, c1) = parse_cell_ref(end.as_bytes())?;
    Some((r0.min(r1), c0.min(c1), r0.max(r1), c0.max(c1)))
}

/// Zero-based column index to letters (`0 -> "A"`, `27 -> "AB"`).
pub fn col_name(col: u32) -> String {
    let mut n = col + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        // rem < 26, fits in u8
        #[allow(clippy::cast_possible_truncation)]
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Zero-based `(row, col)` to `"B3"`.
pub fn cell_name(row: u32, col: u32) -> String {
    format!("{}{}", col_name(col), row + 1)
}
