//! Compact edit scripts.
//!
//! A script is a `\n`-separated list of instructions:
//!
//! - `<pos>a<count>` followed by `count` lines: insert those lines after the
//!   first `pos` lines of the original;
//! - `<pos>d<count>`: delete `count` original lines starting at `pos`.
//!
//! Positions always refer to the original text, never to the output.
//! Original lines between instructions are copied unchanged.

use crate::codec::{join_lines, split_lines, DiffLine, LineTag};
use crate::error::{DiffError, DiffResult};

/// Encode a diff as an edit script turning the older text into the newer.
pub fn encode_script(diff: &[DiffLine<'_>]) -> Vec<u8> {
    let mut encoder = Encoder::default();

    for entry in diff {
        match entry.tag {
            LineTag::Preserved => {
                encoder.flush_delete();
                encoder.flush_insert();
                encoder.file_pos += 1;
            }
            LineTag::Deleted => {
                encoder.flush_insert();
                if encoder.to_delete == 0 {
                    encoder.delete_start = encoder.file_pos;
                }
                encoder.to_delete += 1;
                encoder.file_pos += 1;
            }
            LineTag::New => {
                encoder.flush_delete();
                encoder.pending.push(entry.line);
            }
        }
    }

    encoder.flush_delete();
    encoder.flush_insert();
    encoder.out
}

#[derive(Default)]
struct Encoder<'a> {
    out: Vec<u8>,
    lines_written: usize,
    file_pos: usize,
    delete_start: usize,
    to_delete: usize,
    pending: Vec<&'a [u8]>,
}

impl<'a> Encoder<'a> {
    fn line(&mut self, bytes: &[u8]) {
        if self.lines_written > 0 {
            self.out.push(b'\n');
        }
        self.out.extend_from_slice(bytes);
        self.lines_written += 1;
    }

    fn flush_delete(&mut self) {
        if self.to_delete > 0 {
            let instruction = format!("{}d{}", self.delete_start, self.to_delete);
            self.line(instruction.as_bytes());
            self.to_delete = 0;
        }
    }

    fn flush_insert(&mut self) {
        if !self.pending.is_empty() {
            let instruction = format!("{}a{}", self.file_pos, self.pending.len());
            self.line(instruction.as_bytes());
            let pending = std::mem::take(&mut self.pending);
            for line in pending {
                self.line(line);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Append,
    Delete,
}

fn parse_instruction(line: &[u8]) -> Option<(usize, Op, usize)> {
    let text = std::str::from_utf8(line).ok()?;
    let split = text.find(|c: char| !c.is_ascii_digit())?;
    let (pos, rest) = text.split_at(split);
    let op = match rest.as_bytes().first()? {
        b'a' => Op::Append,
        b'd' => Op::Delete,
        _ => return None,
    };
    let count = &rest[1..];
    if pos.is_empty() || count.is_empty() || !count.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((pos.parse().ok()?, op, count.parse().ok()?))
}

/// Replay an edit script against `original`.
///
/// An empty script leaves the original unchanged.
pub fn decode_script(original: &[u8], script: &[u8]) -> DiffResult<Vec<u8>> {
    if script.is_empty() {
        return Ok(original.to_vec());
    }

    let old = split_lines(original);
    let mut new_lines: Vec<&[u8]> = Vec::with_capacity(old.len());
    let mut old_pos = 0;
    let mut to_append = 0;

    for (idx, line) in script.split(|b| *b == b'\n').enumerate() {
        if to_append > 0 {
            new_lines.push(line);
            to_append -= 1;
            continue;
        }

        let line_no = idx + 1;
        let (pos, op, count) = parse_instruction(line).ok_or_else(|| {
            DiffError::malformed(
                line_no,
                format!("expected instruction, found {:?}", String::from_utf8_lossy(line)),
            )
        })?;

        if pos < old_pos || pos > old.len() {
            return Err(DiffError::malformed(
                line_no,
                format!(
                    "position {pos} outside {old_pos}..={} of the original",
                    old.len()
                ),
            ));
        }
        new_lines.extend_from_slice(&old[old_pos..pos]);
        old_pos = pos;

        match op {
            Op::Append => to_append = count,
            Op::Delete => {
                if pos + count > old.len() {
                    return Err(DiffError::malformed(
                        line_no,
                        format!("deleting {count} lines at {pos} overruns the original"),
                    ));
                }
                old_pos += count;
            }
        }
    }

    if to_append > 0 {
        return Err(DiffError::malformed(
            script.split(|b| *b == b'\n').count(),
            format!("script ends with {to_append} inserted lines missing"),
        ));
    }

    new_lines.extend_from_slice(&old[old_pos..]);
    Ok(join_lines(&new_lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{diff, lcs_length};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn script_between(older: &str, newer: &str) -> String {
        let a = split_lines(older.as_bytes());
        let b = split_lines(newer.as_bytes());
        String::from_utf8(encode_script(&diff(&a, &b))).unwrap()
    }

    fn round_trip(older: &str, newer: &str) {
        let script = script_between(older, newer);
        let decoded = decode_script(older.as_bytes(), script.as_bytes()).unwrap();
        assert_eq!(
            String::from_utf8(decoded).unwrap(),
            newer,
            "script {script:?} from {older:?}"
        );
    }

    #[test]
    fn test_encode_identical_is_empty() {
        assert_eq!(script_between("a\nb", "a\nb"), "");
        assert_eq!(script_between("", ""), "");
    }

    #[test]
    fn test_encode_positions_refer_to_original() {
        assert_eq!(script_between("x\na\ny", "x\nb\ny"), "1d1\n2a1\nb");
        assert_eq!(script_between("a\nb\nc", "a\nc"), "1d1");
        assert_eq!(script_between("a", "a\nb\nc"), "1a2\nb\nc");
        assert_eq!(script_between("", "hello"), "0a1\nhello");
        assert_eq!(script_between("hello", ""), "0d1");
    }

    #[test]
    fn test_decode_trailing_newline_matters() {
        round_trip("hello", "hello\n");
        round_trip("hello\n", "hello");
        round_trip("", "\n");
        round_trip("\n", "");
    }

    #[test]
    fn test_round_trip_examples() {
        round_trip("hello", "hello world");
        round_trip("a\nb\nc\nd", "d\nc\nb\na");
        round_trip("1\n2\n3\n4\n5", "0\n1\n3\n5\n6");
        round_trip("same\nsame\nsame", "same");
        round_trip("x", "0a1\n1d2");
    }

    #[test]
    fn test_inserted_lines_that_look_like_instructions() {
        round_trip("3d1\n0a5", "0a1\n3d1\n7a9");
    }

    #[test]
    fn test_decode_empty_script_returns_original() {
        assert_eq!(decode_script(b"abc\ndef", b"").unwrap(), b"abc\ndef");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            decode_script(b"a\nb", b"nonsense"),
            Err(DiffError::MalformedScript { line: 1, .. })
        ));
        assert!(decode_script(b"a\nb", b"5d1").is_err());
        assert!(decode_script(b"a\nb", b"1d5").is_err());
        assert!(decode_script(b"a\nb", b"1a3\nx").is_err());
        assert!(decode_script(b"a\nb", b"2d0\n1d1").is_err());
    }

    #[test]
    fn test_random_round_trips_and_edit_counts() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let alphabet = ["", "a", "b", "c", "0a1", "1d1", "  x"];

        let random_text = |rng: &mut StdRng| -> String {
            let len = rng.gen_range(0..12);
            let lines: Vec<&str> = (0..len)
                .map(|_| alphabet[rng.gen_range(0..alphabet.len())])
                .collect();
            lines.join("\n")
        };

        for _ in 0..500 {
            let older = random_text(&mut rng);
            let newer = random_text(&mut rng);
            round_trip(&older, &newer);

            let a = split_lines(older.as_bytes());
            let b = split_lines(newer.as_bytes());
            let d = diff(&a, &b);
            let edits = d
                .iter()
                .filter(|l| l.tag != LineTag::Preserved)
                .count();
            assert_eq!(edits, a.len() + b.len() - 2 * lcs_length(&a, &b));
        }
    }
}
