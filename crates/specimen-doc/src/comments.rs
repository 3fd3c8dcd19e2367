//! `/*md ... */` documentation blocks inside stylesheets.

const OPEN: &str = "/*md";
const CLOSE: &str = "*/";

/// Extract the bodies of all `/*md` comment blocks, in source order.
///
/// The opening marker must be followed by whitespace. Bodies are dedented by
/// their common leading indentation. An unclosed block runs to the end of
/// the source.
pub fn extract_doc_blocks(source: &str) -> Vec<String> {
    let mut blocks = Vec::new();
    let mut rest = source;

    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];

        if !after.starts_with(char::is_whitespace) {
            rest = after;
            continue;
        }

        let (body, next) = match after.find(CLOSE) {
            Some(end) => (&after[..end], &after[end + CLOSE.len()..]),
            None => (after, ""),
        };

        let body = dedent(body);
        if !body.is_empty() {
            blocks.push(body);
        }
        rest = next;
    }

    blocks
}

fn dedent(body: &str) -> String {
    let indent = body
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    body.lines()
        .map(|line| {
            if line.len() >= indent && line.is_char_boundary(indent) {
                &line[indent..]
            } else {
                line.trim_start()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .trim_end()
        .to_string()
}
