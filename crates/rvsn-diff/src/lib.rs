//! Line diffs and edit scripts for rvsn.
//!
//! Texts are handled as byte sequences split on `\n`. The empty text is the
//! zero-length sequence of lines, not a single empty line, and joining the
//! lines back with `\n` reproduces the original bytes exactly.
//!
//! # Example
//!
//! ```
//! use rvsn_diff::{apply_script, create_script};
//!
//! let script = create_script(b"a\nb\nc", b"a\nc\nd");
//! assert_eq!(apply_script(b"a\nb\nc", &script).unwrap(), b"a\nc\nd");
//! ```

mod codec;
mod error;
mod script;
mod unified;

pub use codec::{diff, join_lines, lcs_length, split_lines, DiffLine, LineTag};
pub use error::{DiffError, DiffResult};
pub use script::{decode_script, encode_script};
pub use unified::unified_diff;

/// Build the edit script turning `from` into `to`.
pub fn create_script(from: &[u8], to: &[u8]) -> Vec<u8> {
    let from_lines = split_lines(from);
    let to_lines = split_lines(to);
    encode_script(&diff(&from_lines, &to_lines))
}

/// Apply an edit script produced by [`create_script`] to `original`.
pub fn apply_script(original: &[u8], script: &[u8]) -> DiffResult<Vec<u8>> {
    decode_script(original, script)
}
