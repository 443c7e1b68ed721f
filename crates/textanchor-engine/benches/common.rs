// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_source_text(lines: usize) -> String {
    let mut content = String::with_capacity(lines * 40);
    for line in 0..lines {
        let ending = if line % 7 == 0 { "\r\n" } else { "\n" };
        content.push_str(&format!(
            "{}let value_{} = compute({});{}",
            "    ".repeat(line % 4),
            line,
            line * 3,
            ending
        ));
    }
    content
}

/// Deterministic offsets spread over `len` bytes, all on ASCII text.
#[allow(dead_code)]
pub fn spread_offsets(len: usize, count: usize) -> Vec<usize> {
    let step = (len / count.max(1)).max(1);
    (0..count).map(|i| (i * step + i % 5).min(len)).collect()
}
