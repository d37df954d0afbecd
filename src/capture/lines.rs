//! Hex capture line parsing

use crate::core::error::ExtractError;

/// Parse one hex row into bytes.
///
/// Whitespace, `-`, `:` and `,` separators and `0x` prefixes are ignored.
/// Returns `Ok(None)` for blank and comment-only lines.
pub fn parse_capture_line(line: &str) -> Result<Option<Vec<u8>>, String> {
    let content = line.split('#').next().unwrap_or("");
    let mut digits = String::with_capacity(content.len());
    for token in content.split(|c: char| c.is_whitespace() || matches!(c, '-' | ':' | ',')) {
        let token = token
            .strip_prefix("0x")
            .or_else(|| token.strip_prefix("0X"))
            .unwrap_or(token);
        digits.push_str(token);
    }
    if digits.is_empty() {
        return Ok(None);
    }
    hex::decode(&digits).map(Some).map_err(|e| e.to_string())
}

/// Parse a capture, one report per non-blank line
pub fn parse_capture_lines<'a, I>(lines: I) -> Result<Vec<Vec<u8>>, ExtractError>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut reports = Vec::new();
    for (index, line) in lines.into_iter().enumerate() {
        match parse_capture_line(line) {
            Ok(Some(report)) => reports.push(report),
            Ok(None) => {}
            Err(reason) => {
                return Err(ExtractError::BadHex {
                    line: index + 1,
                    reason,
                })
            }
        }
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formats() {
        assert_eq!(parse_capture_line("f0 00 01").unwrap(), Some(vec![0xF0, 0x00, 0x01]));
        assert_eq!(parse_capture_line("F0:00:01").unwrap(), Some(vec![0xF0, 0x00, 0x01]));
        assert_eq!(parse_capture_line("0xF0 0x00,0x01").unwrap(), Some(vec![0xF0, 0x00, 0x01]));
        assert_eq!(parse_capture_line("f0-00-01 # tail").unwrap(), Some(vec![0xF0, 0x00, 0x01]));
        assert_eq!(parse_capture_line("   ").unwrap(), None);
        assert_eq!(parse_capture_line("# just a comment").unwrap(), None);
    }

    #[test]
    fn test_bad_line_reports_number() {
        let err = parse_capture_lines(["f000", "", "f0z"]).unwrap_err();
        match err {
            ExtractError::BadHex { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected {:?}", other),
        }
    }
}
