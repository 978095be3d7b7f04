//! Text helpers for SVG output

/// Escape text for use in SVG character data and attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters are not allowed in XML 1.0
            c if c.is_control() && c != '\n' && c != '\t' => {}
            c => out.push(c),
        }
    }
    out
}

/// Greedy word wrap by character count.
///
/// Words longer than `max_chars` are placed on a line of their own. When the
/// text needs more than `max_lines`, the last kept line ends with an ellipsis.
pub fn wrap(text: &str, max_chars: usize, max_lines: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };

        if needed > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }

    if max_lines > 0 && lines.len() > max_lines {
        lines.truncate(max_lines);
        if let Some(last) = lines.last_mut() {
            let trimmed = last.trim_end_matches(['.', ',', ';', ':']).to_string();
            *last = format!("{trimmed}…");
        }
    }

    lines
}

/// Collapse whitespace and shorten to at most `max_chars` characters,
/// ending with an ellipsis when anything was cut. Breaks at the last space
/// that fits, or mid-word when there is none.
pub fn fit_line(text: &str, max_chars: usize) -> String {
    let line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if line.chars().count() <= max_chars {
        return line;
    }

    let kept: String = line.chars().take(max_chars.saturating_sub(1)).collect();
    let end = kept.rfind(' ').filter(|&i| i > 0).unwrap_or(kept.len());
    format!("{}…", kept[..end].trim_end())
}
