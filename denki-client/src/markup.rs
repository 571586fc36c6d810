//! The comment markup subset the composer toolbar emits: `**bold**`,
//! `*italic*`, `- ` bulleted lines and `1. ` numbered lines.

#[derive(Clone, Copy, Eq, PartialEq)]
enum ListKind {
    Unordered,
    Ordered,
}

/// Renders comment text to HTML. The input is plain text: entities are
/// escaped first, markup is expanded afterwards. Class names are part of the
/// stylesheet contract.
pub fn render_markup(content: &str) -> String {
    let mut out = String::with_capacity(content.len() + 64);
    let mut in_list: Option<ListKind> = None;
    for line in content.lines() {
        let (kind, text) = classify(line);
        if in_list.is_some() && in_list != kind {
            out.push_str(match in_list {
                Some(ListKind::Unordered) => "</ul>",
                _ => "</ol>",
            });
            in_list = None;
        }
        match kind {
            Some(ListKind::Unordered) => {
                if in_list.is_none() {
                    out.push_str("<ul class=\"list-disc pl-6\">");
                    in_list = kind;
                }
                out.push_str("<li class=\"list-disc\">");
                out.push_str(&inline(text));
                out.push_str("</li>");
            }
            Some(ListKind::Ordered) => {
                if in_list.is_none() {
                    out.push_str("<ol class=\"list-decimal pl-6\">");
                    in_list = kind;
                }
                out.push_str("<li class=\"list-decimal\">");
                out.push_str(&inline(text));
                out.push_str("</li>");
            }
            None => {
                out.push_str("<p>");
                out.push_str(&inline(text));
                out.push_str("</p>");
            }
        }
    }
    match in_list {
        Some(ListKind::Unordered) => out.push_str("</ul>"),
        Some(ListKind::Ordered) => out.push_str("</ol>"),
        None => (),
    }
    out
}

// A list line is "- item" or "12. item" with a non-empty item.
fn classify(line: &str) -> (Option<ListKind>, &str) {
    if let Some(item) = line.strip_prefix("- ") {
        if !item.is_empty() {
            return (Some(ListKind::Unordered), item);
        }
    }
    let digits = line.bytes().take_while(|b| b.is_ascii_digit()).count();
    if digits > 0 {
        if let Some(item) = line[digits..].strip_prefix(". ") {
            if !item.is_empty() {
                return (Some(ListKind::Ordered), item);
            }
        }
    }
    (None, line)
}

fn inline(text: &str) -> String {
    let escaped = escape(text);
    let bold = expand_pairs(&escaped, "**", "<span class=\"bold\">", "</span>");
    expand_pairs(&bold, "*", "<span class=\"italic\">", "</span>")
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

// Expands non-overlapping delimiter pairs left to right. A delimiter without
// a closing partner stays literal.
fn expand_pairs(s: &str, delim: &str, open: &str, close: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    loop {
        let start = match rest.find(delim) {
            Some(start) => start,
            None => {
                out.push_str(rest);
                return out;
            }
        };
        let after = &rest[start + delim.len()..];
        let end = match after.find(delim) {
            Some(end) => end,
            None => {
                out.push_str(rest);
                return out;
            }
        };
        out.push_str(&rest[..start]);
        out.push_str(open);
        out.push_str(&after[..end]);
        out.push_str(close);
        rest = &after[end + delim.len()..];
    }
}
