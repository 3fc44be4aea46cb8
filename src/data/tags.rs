//! Tags live in a single delimited column; in memory they are always an ordered list.

const DELIMITER: char = ',';

/// An empty list is stored as `NULL`.
pub fn encode_tags(tags: &[String]) -> Option<String> {
    if tags.is_empty() {
        None
    } else {
        Some(tags.join(&DELIMITER.to_string()))
    }
}

pub fn decode_tags(stored: Option<&str>) -> Vec<String> {
    match stored {
        Some(s) if !s.is_empty() => s.split(DELIMITER).map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_encode_joins_in_order() {
        assert_eq!(encode_tags(&tags(&["go", "rust"])), Some("go,rust".to_string()));
    }

    #[test]
    fn test_empty_list_is_null() {
        assert_eq!(encode_tags(&[]), None);
        assert!(decode_tags(None).is_empty());
        assert!(decode_tags(Some("")).is_empty());
    }

    #[test]
    fn test_decode_keeps_order_and_duplicates() {
        let original = tags(&["web", "rust", "web"]);
        let stored = encode_tags(&original);
        assert_eq!(decode_tags(stored.as_deref()), original);
    }
}
