//! Longest-common-subsequence line diff.

use std::collections::HashMap;

/// What happened to a line between the older and the newer text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTag {
    /// Present in both texts.
    Preserved,
    /// Only present in the older text.
    Deleted,
    /// Only present in the newer text.
    New,
}

/// One line of a diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffLine<'a> {
    pub tag: LineTag,
    pub line: &'a [u8],
}

impl<'a> DiffLine<'a> {
    fn preserved(line: &'a [u8]) -> Self {
        Self {
            tag: LineTag::Preserved,
            line,
        }
    }

    fn deleted(line: &'a [u8]) -> Self {
        Self {
            tag: LineTag::Deleted,
            line,
        }
    }

    fn new_line(line: &'a [u8]) -> Self {
        Self {
            tag: LineTag::New,
            line,
        }
    }
}

/// Split a text into lines on `\n`.
///
/// The empty text has no lines; any other text has one more line than it
/// has separators.
pub fn split_lines(text: &[u8]) -> Vec<&[u8]> {
    if text.is_empty() {
        return Vec::new();
    }
    text.split(|b| *b == b'\n').collect()
}

/// Inverse of [`split_lines`].
pub fn join_lines<L: AsRef<[u8]>>(lines: &[L]) -> Vec<u8> {
    let mut out = Vec::with_capacity(lines.iter().map(|l| l.as_ref().len() + 1).sum());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push(b'\n');
        }
        out.extend_from_slice(line.as_ref());
    }
    out
}

/// Compute the line diff between `older` and `newer`.
///
/// The common prefix and suffix are emitted as preserved lines without
/// entering the quadratic part. On ties the backtrack prefers a new line,
/// then a deleted line, then a preserved one; outputs depend on this order.
pub fn diff<'a>(older: &[&'a [u8]], newer: &[&'a [u8]]) -> Vec<DiffLine<'a>> {
    let mut start = 0;
    while start < older.len() && start < newer.len() && older[start] == newer[start] {
        start += 1;
    }

    let mut older_end = older.len();
    let mut newer_end = newer.len();
    while start < older_end && start < newer_end && older[older_end - 1] == newer[newer_end - 1] {
        older_end -= 1;
        newer_end -= 1;
    }

    let mut out = Vec::with_capacity(older.len().max(newer.len()));
    out.extend(older[..start].iter().map(|l| DiffLine::preserved(*l)));
    out.extend(diff_middle(
        &older[start..older_end],
        &newer[start..newer_end],
    ));
    out.extend(older[older_end..].iter().map(|l| DiffLine::preserved(*l)));
    out
}

/// Length of the longest common subsequence of two line sequences.
pub fn lcs_length(older: &[&[u8]], newer: &[&[u8]]) -> usize {
    let (older_ids, newer_ids) = intern(older, newer);
    LcsTable::build(&older_ids, &newer_ids).get(older.len(), newer.len()) as usize
}

fn diff_middle<'a>(older: &[&'a [u8]], newer: &[&'a [u8]]) -> Vec<DiffLine<'a>> {
    let (older_ids, newer_ids) = intern(older, newer);
    let table = LcsTable::build(&older_ids, &newer_ids);

    let mut out = Vec::with_capacity(older.len() + newer.len());
    let mut row = older.len();
    let mut col = newer.len();

    while row > 0 || col > 0 {
        if col > 0 && table.get(row, col) == table.get(row, col - 1) {
            out.push(DiffLine::new_line(newer[col - 1]));
            col -= 1;
        } else if row > 0 && table.get(row, col) == table.get(row - 1, col) {
            out.push(DiffLine::deleted(older[row - 1]));
            row -= 1;
        } else {
            out.push(DiffLine::preserved(older[row - 1]));
            row -= 1;
            col -= 1;
        }
    }

    out.reverse();
    out
}

/// Replace every distinct line by a small integer so the table compares ids.
fn intern<'a>(older: &[&'a [u8]], newer: &[&'a [u8]]) -> (Vec<usize>, Vec<usize>) {
    let mut ids: HashMap<&'a [u8], usize> = HashMap::new();
    let mut lookup = |lines: &[&'a [u8]]| -> Vec<usize> {
        lines
            .iter()
            .map(|line| {
                let next = ids.len();
                *ids.entry(*line).or_insert(next)
            })
            .collect()
    };
    let older_ids = lookup(older);
    let newer_ids = lookup(newer);
    (older_ids, newer_ids)
}

/// `(older.len() + 1) x (newer.len() + 1)` table of LCS lengths of prefixes.
struct LcsTable {
    cols: usize,
    cells: Vec<u32>,
}

impl LcsTable {
    fn build(older: &[usize], newer: &[usize]) -> Self {
        let cols = newer.len() + 1;
        let mut cells = vec![0u32; (older.len() + 1) * cols];

        for row in 1..=older.len() {
            for col in 1..=newer.len() {
                cells[row * cols + col] = if older[row - 1] == newer[col - 1] {
                    cells[(row - 1) * cols + col - 1] + 1
                } else {
                    cells[(row - 1) * cols + col].max(cells[row * cols + col - 1])
                };
            }
        }

        Self { cols, cells }
    }

    fn get(&self, row: usize, col: usize) -> u32 {
        self.cells[row * self.cols + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<&[u8]> {
        split_lines(text.as_bytes())
    }

    fn tags(diff: &[DiffLine<'_>]) -> Vec<(LineTag, String)> {
        diff.iter()
            .map(|d| (d.tag, String::from_utf8_lossy(d.line).into_owned()))
            .collect()
    }

    #[test]
    fn test_split_lines_empty_text_has_no_lines() {
        assert!(split_lines(b"").is_empty());
        assert_eq!(split_lines(b"\n").len(), 2);
        assert_eq!(split_lines(b"a\nb"), vec![&b"a"[..], &b"b"[..]]);
    }

    #[test]
    fn test_join_lines_inverts_split() {
        for text in ["", "\n", "a", "a\n", "a\n\nb", "\n\n"] {
            assert_eq!(join_lines(&split_lines(text.as_bytes())), text.as_bytes());
        }
    }

    #[test]
    fn test_diff_identical_is_all_preserved() {
        let a = lines("x\ny\nz");
        let d = diff(&a, &a);
        assert_eq!(d.len(), 3);
        assert!(d.iter().all(|l| l.tag == LineTag::Preserved));
    }

    #[test]
    fn test_diff_replacement_inside_common_context() {
        let d = diff(&lines("x\na\ny"), &lines("x\nb\ny"));
        assert_eq!(
            tags(&d),
            vec![
                (LineTag::Preserved, "x".to_string()),
                (LineTag::Deleted, "a".to_string()),
                (LineTag::New, "b".to_string()),
                (LineTag::Preserved, "y".to_string()),
            ]
        );
    }

    #[test]
    fn test_diff_tie_break_prefers_new_then_deleted() {
        // Both "a" and "b" are valid common subsequences here; the backtrack
        // keeps "b" because it consumes newer lines first.
        let d = diff(&lines("a\nb"), &lines("b\na"));
        assert_eq!(
            tags(&d),
            vec![
                (LineTag::Deleted, "a".to_string()),
                (LineTag::Preserved, "b".to_string()),
                (LineTag::New, "a".to_string()),
            ]
        );
    }

    #[test]
    fn test_diff_against_empty() {
        let d = diff(&[], &lines("a\nb"));
        assert_eq!(d.len(), 2);
        assert!(d.iter().all(|l| l.tag == LineTag::New));

        let d = diff(&lines("a\nb"), &[]);
        assert!(d.iter().all(|l| l.tag == LineTag::Deleted));
    }

    #[test]
    fn test_edit_count_matches_lcs() {
        let a = lines("a\nb\nc\nd\ne\nf");
        let b = lines("a\nc\nd\nx\nf\ng");
        let d = diff(&a, &b);
        let edits = d.iter().filter(|l| l.tag != LineTag::Preserved).count();
        assert_eq!(edits, a.len() + b.len() - 2 * lcs_length(&a, &b));
        assert_eq!(lcs_length(&a, &b), 4);
    }
}
