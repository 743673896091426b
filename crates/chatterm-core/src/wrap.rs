//! Word-boundary line reflow for fixed-width display.

use unicode_width::UnicodeWidthStr;

/// Reflow `text` into lines no wider than `max_width` display columns.
///
/// Tokens are packed greedily, one space between them. A token wider than
/// `max_width` is placed on its own line as-is; content is never truncated.
pub fn wrap(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0;

    for token in text.split_whitespace() {
        let token_width = token.width();
        if current.is_empty() {
            current.push_str(token);
            current_width = token_width;
        } else if current_width + 1 + token_width <= max_width {
            current.push(' ');
            current.push_str(token);
            current_width += 1 + token_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(token);
            current_width = token_width;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Wrap `content` to `width` only when it is longer than `threshold` characters.
pub fn reflow(content: &str, threshold: usize, width: usize) -> String {
    if content.chars().count() > threshold {
        wrap(content, width).join("\n")
    } else {
        content.to_string()
    }
}
