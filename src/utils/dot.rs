//! DOT format utilities for graph visualization.
//!
//! Control flow graphs are exported in Graphviz DOT format by
//! [`IlControlFlowGraph::to_dot`](crate::cfg::IlControlFlowGraph::to_dot). Block labels
//! contain rendered IL expressions, which routinely carry quotes, comparison operators
//! and string literals, so everything placed into a label goes through [`escape_dot`].

/// Escapes a string for safe use in DOT format labels and identifiers.
///
/// Handles every character with special meaning inside a quoted DOT label:
/// quotes, backslashes, newlines, record braces, pipes and angle brackets.
///
/// # Arguments
///
/// * `s` - The string to escape
///
/// # Returns
///
/// A new string with all special characters escaped.
///
/// # Examples
///
/// ```rust
/// use smxscope::utils::escape_dot;
///
/// assert_eq!(escape_dot("a < b"), "a \\< b");
/// assert_eq!(escape_dot("{x}"), "\\{x\\}");
/// ```
#[must_use]
pub fn escape_dot(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => {}
            '<' | '>' | '{' | '}' | '|' => {
                escaped.push('\\');
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_dot_plain() {
        assert_eq!(escape_dot("local_12 = 4"), "local_12 = 4");
    }

    #[test]
    fn test_escape_dot_quotes_and_backslash() {
        assert_eq!(escape_dot("\"%s\\n\""), "\\\"%s\\\\n\\\"");
    }

    #[test]
    fn test_escape_dot_newlines() {
        assert_eq!(escape_dot("a\r\nb"), "a\\nb");
    }

    #[test]
    fn test_escape_dot_comparisons() {
        assert_eq!(escape_dot("x <= y"), "x \\<= y");
        assert_eq!(escape_dot("x >= y"), "x \\>= y");
    }

    #[test]
    fn test_escape_dot_record_characters() {
        assert_eq!(escape_dot("a || b"), "a \\|\\| b");
        assert_eq!(escape_dot("{}"), "\\{\\}");
    }
}
