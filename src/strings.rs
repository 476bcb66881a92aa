/// Converts bytes to text with leading and trailing NUL characters removed.
pub fn trim_nulls(data: &[u8]) -> String {
    let start = data.iter().position(|&b| b != 0).unwrap_or(data.len());
    let end = data.iter().rposition(|&b| b != 0).map_or(start, |i| i + 1);
    String::from_utf8_lossy(&data[start..end]).into_owned()
}

/// Copies text into a fixed-width, NUL-filled field, cutting it at the field width.
pub fn fixed_field<const N: usize>(value: &str) -> [u8; N] {
    let mut field = [0u8; N];
    let len = value.len().min(N);
    field[..len].copy_from_slice(&value.as_bytes()[..len]);
    field
}
