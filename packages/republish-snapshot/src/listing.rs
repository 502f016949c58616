const DASH: char = '\u{2500}';

/// Lays `items` out in two columns, filling the left column first, under a
/// dash-framed header repeated over both columns.
pub fn two_column(items: &[String], width: usize, header: &str) -> String {
    let header_len = header.chars().count();
    let pad = width.saturating_sub(header_len + 5) / 2;
    let framed = if pad > 0 {
        let dashes: String = std::iter::repeat(DASH).take(pad).collect();
        format!("{dashes} {header} {dashes}")
    } else {
        header.to_string()
    };

    let mut out = format!("{framed:<width$}{framed}\n");

    let split = items.len() / 2;
    let offset = split + items.len() % 2;
    for i in 0..split {
        out.push_str(&format!("{:<width$}{}\n", items[i], items[i + offset]));
    }
    if items.len() % 2 == 1 {
        out.push_str(&items[split]);
        out.push('\n');
    }
    out
}
