//! Decoding of literal token text into values.
//!
//! The lexer only delimits literals; everything that can be wrong with one
//! (overflow, a bad escape, an unterminated quote) is reported from here.

/// Splits an optional sign and radix prefix off an integer literal.
fn split_integer(text: &str) -> (bool, u32, &str) {
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };

    let prefixed = |prefix_lower: &str, prefix_upper: &str| {
        body.strip_prefix(prefix_lower)
            .or_else(|| body.strip_prefix(prefix_upper))
    };

    if let Some(digits) = prefixed("0x", "0X") {
        (negative, 16, digits)
    } else if let Some(digits) = prefixed("0o", "0O") {
        (negative, 8, digits)
    } else if let Some(digits) = prefixed("0b", "0B") {
        (negative, 2, digits)
    } else {
        (negative, 10, body)
    }
}

pub(crate) fn decode_int(text: &str) -> Result<i64, String> {
    let (negative, radix, digits) = split_integer(text);
    let magnitude = u64::from_str_radix(digits, radix)
        .map_err(|_| format!("integer literal `{}` does not fit in int", text))?;

    let value = if negative {
        -i128::from(magnitude)
    } else {
        i128::from(magnitude)
    };
    i64::try_from(value).map_err(|_| format!("integer literal `{}` does not fit in int", text))
}

pub(crate) fn decode_uint(text: &str) -> Result<u64, String> {
    let body = text
        .strip_suffix(['u', 'U'])
        .ok_or_else(|| format!("unsigned literal `{}` has no `u` suffix", text))?;

    let (negative, radix, digits) = split_integer(body);
    if negative {
        return Err(format!("unsigned literal `{}` cannot be negative", text));
    }
    u64::from_str_radix(digits, radix).map_err(|_| format!("unsigned literal `{}` does not fit in uint", text))
}

pub(crate) fn decode_float(text: &str) -> Result<f64, String> {
    let value: f64 = text
        .parse()
        .map_err(|_| format!("invalid float literal `{}`", text))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(format!("float literal `{}` is out of range", text))
    }
}

pub(crate) fn decode_string(raw: &[u8]) -> Result<String, String> {
    let decoded = decode_quoted(raw, false)?;
    String::from_utf8(decoded).map_err(|_| "invalid UTF-8 in string literal".to_string())
}

pub(crate) fn decode_bytes(raw: &[u8]) -> Result<Vec<u8>, String> {
    decode_quoted(raw, true)
}

/// Strips prefix and quotes, then resolves escapes unless the literal is raw.
fn decode_quoted(raw: &[u8], bytes: bool) -> Result<Vec<u8>, String> {
    let prefix_len = raw
        .iter()
        .take_while(|b| matches!(b, b'r' | b'R' | b'b' | b'B'))
        .count();
    let is_raw = raw[..prefix_len].iter().any(|b| matches!(b, b'r' | b'R'));

    let Some(&quote) = raw.get(prefix_len) else {
        return Err("missing opening quote".to_string());
    };
    let triple = [quote; 3];
    let delimiter: &[u8] = if raw[prefix_len..].starts_with(&triple) {
        &triple
    } else {
        &triple[..1]
    };

    let open = prefix_len + delimiter.len();
    let body = closed_body(raw, open, delimiter, is_raw).ok_or_else(|| "unterminated string literal".to_string())?;

    if is_raw {
        Ok(body.to_vec())
    } else {
        unescape(body, bytes)
    }
}

/// The literal's content between its delimiters, or `None` when the closing
/// delimiter is missing. Escaped quotes do not close the literal.
fn closed_body<'a>(raw: &'a [u8], open: usize, delimiter: &[u8], is_raw: bool) -> Option<&'a [u8]> {
    let mut i = open;
    while i < raw.len() {
        if !is_raw && raw[i] == b'\\' {
            i += 2;
            continue;
        }
        if raw[i..].starts_with(delimiter) {
            return Some(&raw[open..i]);
        }
        i += 1;
    }
    None
}

fn hex_value(digits: &[u8]) -> Option<u32> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_hexdigit) {
        return None;
    }
    let text = std::str::from_utf8(digits).ok()?;
    u32::from_str_radix(text, 16).ok()
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

/// Pushes a code point below 256: a raw byte in bytes literals, the matching
/// character in strings.
fn push_small(out: &mut Vec<u8>, value: u32, bytes: bool) -> Result<(), String> {
    let byte = u8::try_from(value).map_err(|_| format!("escape value {} is out of range", value))?;
    if bytes {
        out.push(byte);
    } else {
        push_char(out, char::from(byte));
    }
    Ok(())
}

fn unescape(body: &[u8], bytes: bool) -> Result<Vec<u8>, String> {
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;

    while i < body.len() {
        let b = body[i];
        if b != b'\\' {
            out.push(b);
            i += 1;
            continue;
        }

        let Some(&escape) = body.get(i + 1) else {
            return Err("dangling `\\` at end of literal".to_string());
        };
        i += 2;

        let simple = match escape {
            b'\\' => Some(b'\\'),
            b'"' => Some(b'"'),
            b'\'' => Some(b'\''),
            b'`' => Some(b'`'),
            b'?' => Some(b'?'),
            b'a' => Some(0x07),
            b'b' => Some(0x08),
            b'f' => Some(0x0c),
            b'n' => Some(b'\n'),
            b'r' => Some(b'\r'),
            b't' => Some(b'\t'),
            b'v' => Some(0x0b),
            _ => None,
        };
        if let Some(byte) = simple {
            out.push(byte);
            continue;
        }

        match escape {
            b'x' | b'X' => {
                let digits = body.get(i..i + 2).ok_or("`\\x` needs two hex digits")?;
                let value = hex_value(digits).ok_or("`\\x` needs two hex digits")?;
                push_small(&mut out, value, bytes)?;
                i += 2;
            }
            b'u' | b'U' => {
                if bytes {
                    return Err("unicode escapes are not allowed in bytes literals".to_string());
                }
                let width = if escape == b'u' { 4 } else { 8 };
                let digits = body
                    .get(i..i + width)
                    .ok_or_else(|| format!("`\\{}` needs {} hex digits", escape as char, width))?;
                let value = hex_value(digits)
                    .ok_or_else(|| format!("`\\{}` needs {} hex digits", escape as char, width))?;
                let c = char::from_u32(value).ok_or_else(|| format!("invalid code point U+{:X}", value))?;
                push_char(&mut out, c);
                i += width;
            }
            b'0'..=b'3' => {
                let digits = body.get(i - 1..i + 2).ok_or("octal escapes need three digits")?;
                if !digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                    return Err("octal escapes need three digits".to_string());
                }
                let value = digits.iter().fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                push_small(&mut out, value, bytes)?;
                i += 2;
            }
            other => {
                return Err(format!("invalid escape sequence `\\{}`", char::from(other)));
            }
        }
    }

    Ok(out)
}
