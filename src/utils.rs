//! Text helpers for portal pages: legacy decoding, entity decoding and whitespace cleanup

/// Decode an ISO-8859-1 byte buffer
///
/// Every byte maps to the code point of the same value, so this cannot fail.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decode the HTML character references the portal emits
///
/// Handles `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;` and numeric
/// references (`&#39;`, `&#x27;`). Unknown or malformed references are kept verbatim.
pub fn decode_html_entities(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        match tail.find(';').and_then(|semi| {
            decode_reference(&tail[1..semi]).map(|decoded| (decoded, semi))
        }) {
            Some((decoded, semi)) => {
                out.push(decoded);
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

fn decode_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let num = name.strip_prefix('#')?;
            let value = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

/// Collapse runs of interior spaces into a single space
pub fn collapse_spaces(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch == ' ' {
            if !prev_space {
                out.push(ch);
            }
            prev_space = true;
        } else {
            out.push(ch);
            prev_space = false;
        }
    }
    out
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_latin1() {
        // "Andalucía" with í as 0xED
        let bytes = b"Andaluc\xeda";
        assert_eq!(decode_latin1(bytes), "Andalucía");
        assert_eq!(decode_latin1(b""), "");
    }

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(decode_html_entities("Castell-Platja d&#39;Aro"), "Castell-Platja d'Aro");
        assert_eq!(decode_html_entities("L&#x27;Escala"), "L'Escala");
        assert_eq!(decode_html_entities("A &amp; B &lt;C&gt;"), "A & B <C>");
        assert_eq!(decode_html_entities("&quot;Playa&quot;"), "\"Playa\"");
    }

    #[test]
    fn test_decode_html_entities_keeps_unknown() {
        assert_eq!(decode_html_entities("R&D"), "R&D");
        assert_eq!(decode_html_entities("&bogus; &"), "&bogus; &");
        assert_eq!(decode_html_entities("&#zz;"), "&#zz;");
    }

    #[test]
    fn test_collapse_spaces() {
        assert_eq!(collapse_spaces("Playa  de   la Malagueta"), "Playa de la Malagueta");
        assert_eq!(collapse_spaces("Cala"), "Cala");
    }
}
