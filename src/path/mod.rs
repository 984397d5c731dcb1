// SPDX-License-Identifier: MIT OR Apache-2.0
//! XPath-style path handling.
//!
//! gNMI paths are structured messages, but operators think in XPath-like
//! strings such as `/interfaces/interface[name=Gi0/0/0/0]/state`. This
//! module converts between the two representations.

use std::collections::HashMap;

use crate::api::gnmi::{Path, PathElem};
use crate::error::{GnmiError, Result};

/// Parse an XPath-style string into a gNMI `Path`.
///
/// Segments are separated by `/` outside of key filters. Each segment may
/// carry any number of `[key=value]` filters; values may be quoted with
/// single or double quotes and may themselves contain `/`, `]` or `=`.
pub fn parse_xpath(xpath: &str, origin: Option<&str>) -> Result<Path> {
    let trimmed = xpath.trim().trim_matches('/');
    let mut elems = Vec::new();

    for segment in split_segments(trimmed)? {
        if segment.is_empty() {
            return Err(GnmiError::Validation(format!(
                "empty path element in xpath {xpath:?}"
            )));
        }
        elems.push(parse_segment(&segment)?);
    }

    Ok(Path {
        origin: origin.unwrap_or_default().to_string(),
        elem: elems,
        target: String::new(),
    })
}

/// Build the `Path` used by the CLI passthrough: a single element whose
/// name is the raw command string.
pub fn parse_cli(command: &str) -> Result<Path> {
    let command = command.trim();
    if command.is_empty() {
        return Err(GnmiError::Validation(
            "CLI command must not be empty".to_string(),
        ));
    }
    Ok(Path {
        origin: String::new(),
        elem: vec![PathElem {
            name: command.to_string(),
            key: HashMap::new(),
        }],
        target: String::new(),
    })
}

/// Render a `Path` back into its XPath-style string form.
///
/// Keys are emitted in sorted order so the output is stable.
pub fn path_to_xpath(path: &Path) -> String {
    let mut out = String::new();
    if !path.origin.is_empty() {
        out.push_str(&path.origin);
        out.push(':');
    }
    for elem in &path.elem {
        out.push('/');
        out.push_str(&elem.name);
        let mut keys: Vec<_> = elem.key.iter().collect();
        keys.sort_by(|a, b| a.0.cmp(b.0));
        for (k, v) in keys {
            out.push('[');
            out.push_str(k);
            out.push('=');
            out.push_str(v);
            out.push(']');
        }
    }
    out
}

/// Split an xpath on `/` separators that are not inside a key filter or a
/// quoted value.
fn split_segments(xpath: &str) -> Result<Vec<String>> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in xpath.chars() {
        match ch {
            '\'' | '"' if depth > 0 => {
                match quote {
                    None => quote = Some(ch),
                    Some(q) if q == ch => quote = None,
                    Some(_) => {}
                }
                current.push(ch);
            }
            '[' if quote.is_none() => {
                depth += 1;
                current.push(ch);
            }
            ']' if quote.is_none() => {
                if depth == 0 {
                    return Err(GnmiError::Validation(format!(
                        "unmatched ']' in xpath {xpath:?}"
                    )));
                }
                depth -= 1;
                current.push(ch);
            }
            '/' if depth == 0 && quote.is_none() => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }

    if depth != 0 || quote.is_some() {
        return Err(GnmiError::Validation(format!(
            "unterminated key filter in xpath {xpath:?}"
        )));
    }
    if !current.is_empty() || !segments.is_empty() {
        segments.push(current);
    }
    Ok(segments)
}

/// Parse a single segment, e.g. `interface[name=Gi0/0/0/0][unit=0]`.
fn parse_segment(segment: &str) -> Result<PathElem> {
    let (name, rest) = match segment.find('[') {
        Some(idx) => (&segment[..idx], &segment[idx..]),
        None => (segment, ""),
    };
    if name.is_empty() {
        return Err(GnmiError::Validation(format!(
            "key filter without element name in segment {segment:?}"
        )));
    }

    let mut keys = HashMap::new();
    let mut rest = rest;
    while !rest.is_empty() {
        if !rest.starts_with('[') {
            return Err(GnmiError::Validation(format!(
                "trailing characters after key filter in segment {segment:?}"
            )));
        }
        let close = find_filter_end(rest).ok_or_else(|| {
            GnmiError::Validation(format!("unterminated key filter in segment {segment:?}"))
        })?;
        let filter = &rest[1..close];
        let (key, value) = filter.split_once('=').ok_or_else(|| {
            GnmiError::Validation(format!("key filter {filter:?} is missing '='"))
        })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(GnmiError::Validation(format!(
                "empty key name in segment {segment:?}"
            )));
        }
        let value = unquote(value.trim());
        if keys.insert(key.to_string(), value).is_some() {
            return Err(GnmiError::Validation(format!(
                "duplicate key {key:?} in segment {segment:?}"
            )));
        }
        rest = &rest[close + 1..];
    }

    Ok(PathElem {
        name: name.to_string(),
        key: keys,
    })
}

/// Find the index of the `]` that closes the filter opening at byte 0,
/// honoring quoted values.
fn find_filter_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (idx, ch) in s.char_indices().skip(1) {
        match (ch, quote) {
            ('\'' | '"', None) => quote = Some(ch),
            (c, Some(q)) if c == q => quote = None,
            (']', None) => return Some(idx),
            _ => {}
        }
    }
    None
}

fn unquote(value: &str) -> String {
    let bytes = value.as_bytes();
    if bytes.len() >= 2
        && (bytes[0] == b'\'' || bytes[0] == b'"')
        && bytes[bytes.len() - 1] == bytes[0]
    {
        value[1..value.len() - 1].to_string()
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_xpath() {
        let path = parse_xpath("/interfaces/interface/state/counters", None).unwrap();
        assert!(path.origin.is_empty());
        let names: Vec<_> = path.elem.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["interfaces", "interface", "state", "counters"]);
        assert!(path.elem.iter().all(|e| e.key.is_empty()));
    }

    #[test]
    fn test_parse_xpath_with_keys() {
        let path = parse_xpath("/interfaces/interface[name=Gi0/0/0/0]/state", None).unwrap();
        assert_eq!(path.elem.len(), 3);
        assert_eq!(path.elem[1].name, "interface");
        assert_eq!(path.elem[1].key["name"], "Gi0/0/0/0");
    }

    #[test]
    fn test_parse_xpath_multiple_keys() {
        let path = parse_xpath("/a/b[x=1][y=2]/c", None).unwrap();
        assert_eq!(path.elem[1].key.len(), 2);
        assert_eq!(path.elem[1].key["x"], "1");
        assert_eq!(path.elem[1].key["y"], "2");
    }

    #[test]
    fn test_parse_xpath_quoted_value() {
        let path = parse_xpath("/acl/set[name='mgmt/in'][type=\"v4\"]", None).unwrap();
        assert_eq!(path.elem[1].key["name"], "mgmt/in");
        assert_eq!(path.elem[1].key["type"], "v4");
    }

    #[test]
    fn test_parse_xpath_origin() {
        let path = parse_xpath("interfaces/interface", Some("openconfig")).unwrap();
        assert_eq!(path.origin, "openconfig");
    }

    #[test]
    fn test_parse_xpath_duplicate_key_rejected() {
        let err = parse_xpath("/a/b[x=1][x=2]", None).unwrap_err();
        assert!(matches!(err, GnmiError::Validation(_)));
    }

    #[test]
    fn test_parse_xpath_unterminated_filter_rejected() {
        let err = parse_xpath("/a/b[x=1", None).unwrap_err();
        assert!(matches!(err, GnmiError::Validation(_)));
    }

    #[test]
    fn test_parse_xpath_filter_without_name_rejected() {
        let err = parse_xpath("/a/[x=1]", None).unwrap_err();
        assert!(matches!(err, GnmiError::Validation(_)));
    }

    #[test]
    fn test_parse_xpath_missing_equals_rejected() {
        let err = parse_xpath("/a/b[x]", None).unwrap_err();
        assert!(matches!(err, GnmiError::Validation(_)));
    }

    #[test]
    fn test_parse_cli_wraps_command() {
        let path = parse_cli("show version").unwrap();
        assert_eq!(path.elem.len(), 1);
        assert_eq!(path.elem[0].name, "show version");
    }

    #[test]
    fn test_parse_cli_empty_rejected() {
        assert!(matches!(
            parse_cli("  "),
            Err(GnmiError::Validation(_))
        ));
    }

    #[test]
    fn test_path_to_xpath_round() {
        let path = parse_xpath("/interfaces/interface[name=eth0]/state", None).unwrap();
        assert_eq!(path_to_xpath(&path), "/interfaces/interface[name=eth0]/state");
    }

    #[test]
    fn test_path_to_xpath_with_origin() {
        let path = parse_xpath("/system/config", Some("openconfig")).unwrap();
        assert_eq!(path_to_xpath(&path), "openconfig:/system/config");
    }
}
