//! Tiny helpers for the Office Open XML parts we read and write by hand.

/// A matched element: raw attribute text and inner body (`None` when self-closing).
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    attrs: &'a str,
    pub body: Option<&'a str>,
}

impl<'a> Element<'a> {
    /// Look up an attribute value by its (possibly prefixed) name.
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        let mut rest = self.attrs;
        while let Some(eq) = rest.find('=') {
            let key = rest[..eq].trim();
            let after = rest[eq + 1..].trim_start();
            let quote = after.chars().next()?;
            if quote != '"' && quote != '\'' {
                return None;
            }
            let value_end = after[1..].find(quote)?;
            if key == name {
                return Some(&after[1..1 + value_end]);
            }
            rest = &after[value_end + 2..];
        }
        None
    }
}

/// Iterator over the non-nested elements named `tag` in `xml`.
pub struct Elements<'a> {
    rest: &'a str,
    open: String,
    close: String,
}

pub fn elements<'a>(xml: &'a str, tag: &str) -> Elements<'a> {
    Elements {
        rest: xml,
        open: format!("<{}", tag),
        close: format!("</{}>", tag),
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Element<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let start = self.rest.find(&self.open)?;
            let after = &self.rest[start + self.open.len()..];

            // `<c` must not match `<cols>`
            match after.chars().next() {
                Some(c) if c == '>' || c == '/' || c.is_whitespace() => {}
                _ => {
                    self.rest = after;
                    continue;
                }
            }

            let tag_end = after.find('>')?;
            let head = &after[..tag_end];
            if let Some(attrs) = head.strip_suffix('/') {
                self.rest = &after[tag_end + 1..];
                return Some(Element {
                    attrs: attrs.trim(),
                    body: None,
                });
            }

            let content = &after[tag_end + 1..];
            let body_end = content.find(&self.close)?;
            self.rest = &content[body_end + self.close.len()..];
            return Some(Element {
                attrs: head.trim(),
                body: Some(&content[..body_end]),
            });
        }
    }
}

pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';') else {
            out.push_str(tail);
            return out;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
                .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                .and_then(char::from_u32),
        };
        match decoded {
            Some(c) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_elements_and_skips_longer_tag_names() {
        let xml = r#"<cols><col/></cols><c r="A1" t="s"><v>0</v></c><c r="B1"/>"#;
        let cells: Vec<_> = elements(xml, "c").collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].attr("r"), Some("A1"));
        assert_eq!(cells[0].attr("t"), Some("s"));
        assert_eq!(cells[0].body, Some("<v>0</v>"));
        assert_eq!(cells[1].attr("r"), Some("B1"));
        assert!(cells[1].body.is_none());
    }

    #[test]
    fn escape_then_unescape_restores_text() {
        let text = r#"Waste < 5 & "low" 'ok' > 1"#;
        assert_eq!(unescape(&escape(text)), text);
        assert_eq!(unescape("&#65;&#x42;"), "AB");
        assert_eq!(unescape("a & b"), "a & b");
    }
}
