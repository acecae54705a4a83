//! HTML to plain-text extraction.

use regex::Regex;

/// Flattens an HTML document to normalized plain text.
///
/// Script and style elements (and comments) are removed entirely. Every
/// remaining text node is trimmed and put on its own line, then each line is
/// split on double spaces and the resulting phrases are joined with single
/// spaces.
pub fn extract_text(html: &str) -> String {
    let without_hidden = strip_hidden_elements(html);
    let lines = text_nodes(&without_hidden).join("\n");
    normalize_whitespace(&lines)
}

fn strip_hidden_elements(html: &str) -> String {
    let comments = Regex::new(r"(?s)<!--.*?-->").expect("valid comment regex");
    let script = Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("valid script regex");
    let style = Regex::new(r"(?is)<style\b[^>]*>.*?</style\s*>").expect("valid style regex");
    // An unterminated block runs to the end of the document.
    let open_script = Regex::new(r"(?is)<script\b[^>]*>.*$").expect("valid open script regex");
    let open_style = Regex::new(r"(?is)<style\b[^>]*>.*$").expect("valid open style regex");

    let out = comments.replace_all(html, " ");
    let out = script.replace_all(&out, " ");
    let out = style.replace_all(&out, " ");
    let out = open_script.replace_all(&out, " ");
    open_style.replace_all(&out, " ").into_owned()
}

fn text_nodes(html: &str) -> Vec<String> {
    // A bare `<` in text is not a tag.
    let tags = Regex::new(r"(?s)<[A-Za-z/!?][^>]*>").expect("valid tags regex");
    tags.split(html)
        .map(decode_entities)
        .map(|node| node.trim().to_string())
        .filter(|node| !node.is_empty())
        .collect()
}

/// Line-based then double-space-based normalization.
pub fn normalize_whitespace(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .flat_map(|line| line.split("  "))
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let entity = Regex::new(r"&(#[0-9]+|#[xX][0-9a-fA-F]+|[a-zA-Z]+);").expect("valid entity regex");
    entity
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            decode_entity(name).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let decoded = match name {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" => "©",
        "reg" => "®",
        "trade" => "™",
        "hellip" => "…",
        "mdash" => "—",
        "ndash" => "–",
        "rsquo" => "’",
        "lsquo" => "‘",
        "rdquo" => "”",
        "ldquo" => "“",
        "euro" => "€",
        "pound" => "£",
        _ => return None,
    };
    Some(decoded.to_string())
}
