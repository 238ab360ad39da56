//! Classification of completed lines.
//!
//! Every line the modem emits is either part of the response to a pending
//! command or an unsolicited notification. The distinction is entirely
//! caller-configured: a line belongs to the async path when it starts with
//! one of the registered async prefixes (for example `+UUPSDA:` on u-blox
//! modems), otherwise it is a response line.

/// Which path a completed line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    /// Part of the response to a pending command.
    Response,
    /// An unsolicited notification.
    AsyncEvent,
}

/// Classify a completed line against the active async prefix set.
///
/// Prefixes are scanned in declared order; the first prefix the line starts
/// with wins. A line matching no prefix is a response line. Classification
/// always sees the full completed line, never a partial buffer.
pub fn classify(line: &str, async_prefixes: &[String]) -> LineClass {
    for prefix in async_prefixes {
        if line.starts_with(prefix.as_str()) {
            return LineClass::AsyncEvent;
        }
    }
    LineClass::Response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_prefix_routes_async() {
        let prefixes = vec!["+UUPSDA:".to_string()];
        assert_eq!(classify("+UUPSDA: 0,0", &prefixes), LineClass::AsyncEvent);
    }

    #[test]
    fn test_non_matching_line_routes_response() {
        let prefixes = vec!["+UUPSDA:".to_string()];
        assert_eq!(classify("OK", &prefixes), LineClass::Response);
    }

    #[test]
    fn test_prefix_must_match_at_line_start() {
        let prefixes = vec!["+UUPSDA:".to_string()];
        assert_eq!(classify("x +UUPSDA: 0,0", &prefixes), LineClass::Response);
    }

    #[test]
    fn test_empty_prefix_set_routes_everything_to_response() {
        assert_eq!(classify("+CREG: 2", &[]), LineClass::Response);
    }
}
