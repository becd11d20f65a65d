//! Unified diff rendering for display.
//!
//! Only used to show changes to a reader. Stored history always goes
//! through edit scripts.

use similar::{ChangeTag, DiffOp, TextDiff};

const CONTEXT_LINES: usize = 3;

/// Render a unified diff between two texts, labelled with `label`.
///
/// Returns an empty string when the texts are identical.
pub fn unified_diff(old: &str, new: &str, label: &str) -> String {
    let diff = TextDiff::from_lines(old, new);
    let groups = diff.grouped_ops(CONTEXT_LINES);
    if groups.is_empty() {
        return String::new();
    }

    let mut output = String::new();
    output.push_str(&format!("--- a/{}\n", label));
    output.push_str(&format!("+++ b/{}\n", label));

    for group in &groups {
        output.push_str(&hunk_header(group));

        for op in group {
            for change in diff.iter_changes(op) {
                let sign = match change.tag() {
                    ChangeTag::Delete => "-",
                    ChangeTag::Insert => "+",
                    ChangeTag::Equal => " ",
                };

                output.push_str(sign);
                output.push_str(change.value());
                if !change.value().ends_with('\n') {
                    output.push_str("\n\\ No newline at end of file\n");
                }
            }
        }
    }

    output
}

fn hunk_header(group: &[DiffOp]) -> String {
    let (Some(first), Some(last)) = (group.first(), group.last()) else {
        return String::new();
    };
    let old_start = first.old_range().start;
    let old_len = last.old_range().end - old_start;
    let new_start = first.new_range().start;
    let new_len = last.new_range().end - new_start;

    format!(
        "@@ -{} +{} @@\n",
        range(old_start, old_len),
        range(new_start, new_len)
    )
}

fn range(start: usize, len: usize) -> String {
    match len {
        0 => format!("{},0", start),
        1 => format!("{}", start + 1),
        _ => format!("{},{}", start + 1, len),
    }
}
