//! Helpers shared by the build script and its unit tests

/// Widest message line that fits inside the error box
const BOX_WIDTH: usize = 64;

/// Format error message lines with box drawing
///
/// Long lines are cut on a character boundary and marked with `...`.
pub fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.chars().count() > BOX_WIDTH {
                let head: String = line.chars().take(BOX_WIDTH - 3).collect();
                format!("{}...", head)
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
