//! AT-style modem line protocol
//!
//! This crate provides the IO-free protocol logic for talking to AT-style
//! modems over a byte-stream transport: framing raw bytes into lines,
//! classifying each line as command response or unsolicited notification,
//! and detecting the line that concludes a multi-line response.
//!
//! # Protocol Overview
//!
//! Communication is line-oriented text:
//!
//! - **Commands** (host → modem): text terminated with `\r\n`
//! - **Responses** (modem → host): CR/LF-delimited lines, concluded by a
//!   caller-configured terminator line such as `OK` or `ERROR`
//! - **Unsolicited notifications**: lines starting with caller-configured
//!   prefixes (conventionally `+`-prefixed), interleaved with responses
//! - **Prompt mode**: during interactive exchanges (payload uploads) a
//!   designated byte such as `>` terminates a line without any newline
//!
//! No command vocabulary is hardcoded; terminators, async prefixes, and the
//! prompt byte are all configuration.
//!
//! # Example
//!
//! ```rust
//! use atlink_protocol::{classify, EndCriteria, LineClass, LineFramer};
//!
//! let mut framer = LineFramer::new();
//! assert_eq!(framer.push_byte(b'O', None), None);
//! assert_eq!(framer.push_byte(b'K', None), None);
//! let line = framer.push_byte(b'\r', None).unwrap();
//!
//! let prefixes = vec!["+UUPSDA:".to_string()];
//! assert_eq!(classify(&line, &prefixes), LineClass::Response);
//!
//! let criteria = EndCriteria::new(["OK", "ERROR", "+CME ERROR:*"]);
//! assert!(criteria.is_end_of_response(&line, None));
//! ```

mod classify;
mod codec;
mod matcher;

pub use classify::*;
pub use codec::*;
pub use matcher::*;
