use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum NeedleError {
    #[error("Empty pattern")]
    Empty,

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Character {0:?} cannot be represented in UCS-2")]
    Unrepresentable(char),
}

/// Parse a search pattern typed by the user into bytes.
///
/// `x <hex>` searches hex bytes, `w <text>` searches text encoded as UCS-2
/// little endian and `s <text>` searches the text as is. Without a prefix the
/// pattern is tried as hex first and taken literally if that fails.
pub fn parse_needle(input: &str) -> Result<Vec<u8>, NeedleError> {
    let input = input.trim_start();
    if input.trim_end().is_empty() {
        return Err(NeedleError::Empty);
    }

    let (prefix, rest) = match input.split_once(char::is_whitespace) {
        Some((prefix, rest)) => (prefix, rest.trim_start()),
        None => (input, ""),
    };

    // A lone prefix is a literal one letter search
    if rest.is_empty() && matches!(prefix, "x" | "w" | "s") {
        return Ok(prefix.as_bytes().to_vec());
    }

    match prefix {
        "x" => unhex(rest),
        "w" => utf8_to_ucs2(rest),
        "s" => Ok(rest.as_bytes().to_vec()),
        _ => Ok(unhex(input).unwrap_or_else(|_| input.as_bytes().to_vec())),
    }
}

/// Decode hex digit pairs, whitespace is allowed between pairs.
pub fn unhex(hex: &str) -> Result<Vec<u8>, NeedleError> {
    let invalid = || NeedleError::InvalidHex(hex.to_string());
    let mut bytes = Vec::with_capacity(hex.len() / 2);
    let mut chars = hex.chars();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            continue;
        }

        let hi = c.to_digit(16).ok_or_else(invalid)?;
        let lo = chars
            .next()
            .and_then(|c| c.to_digit(16))
            .ok_or_else(invalid)?;
        bytes.push((hi << 4 | lo) as u8);
    }

    if bytes.is_empty() {
        return Err(NeedleError::Empty);
    }

    Ok(bytes)
}

fn utf8_to_ucs2(text: &str) -> Result<Vec<u8>, NeedleError> {
    let mut bytes = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let code = ch as u32;
        if code > 0xffff {
            return Err(NeedleError::Unrepresentable(ch));
        }

        bytes.push(code as u8);
        bytes.push((code >> 8) as u8);
    }

    Ok(bytes)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hex_prefix() {
        assert_eq!(Ok(vec![0xde, 0xad, 0xbe, 0xef]), parse_needle("x deadbeef"));
        assert_eq!(Ok(vec![0xde, 0xad, 0xbe, 0xef]), parse_needle("x de ad BE ef"));
        assert!(matches!(parse_needle("x d ead"), Err(NeedleError::InvalidHex(_))));
        assert!(matches!(parse_needle("x abc"), Err(NeedleError::InvalidHex(_))));
    }

    #[test]
    fn ucs2_prefix() {
        assert_eq!(Ok(vec![b'h', 0, b'i', 0]), parse_needle("w hi"));
        assert_eq!(Ok(vec![0xe4, 0x00, 0xac, 0x20]), parse_needle("w ä€"));
        assert_eq!(
            Err(NeedleError::Unrepresentable('😀')),
            parse_needle("w a😀")
        );
    }

    #[test]
    fn string_prefix() {
        assert_eq!(Ok(b"hello world".to_vec()), parse_needle("s hello world"));
        assert_eq!(Ok(b"s".to_vec()), parse_needle("s"));
        assert_eq!(Ok(b"x".to_vec()), parse_needle("x"));
    }

    #[test]
    fn no_prefix() {
        assert_eq!(Ok(vec![0xca, 0xfe]), parse_needle("cafe"));
        assert_eq!(Ok(b"coffee".to_vec()), parse_needle("coffee"));
        assert_eq!(Ok(b"hello there".to_vec()), parse_needle("hello there"));
    }

    #[test]
    fn empty() {
        assert_eq!(Err(NeedleError::Empty), parse_needle(""));
        assert_eq!(Err(NeedleError::Empty), parse_needle("   "));
    }
}
