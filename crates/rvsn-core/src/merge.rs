//! Merge-join over two sorted sequences.

use std::cmp::Ordering;

/// One step of a merge-join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Merged<L, R> {
    /// Present only in the left sequence.
    Left(L),
    /// Present only in the right sequence.
    Right(R),
    /// Present in both.
    Both(L, R),
}

/// Walk two sequences sorted by `cmp` in lockstep.
///
/// Both inputs must already be ordered consistently with `cmp`.
pub fn merge_join<L, R, F>(left: Vec<L>, right: Vec<R>, mut cmp: F) -> Vec<Merged<L, R>>
where
    F: FnMut(&L, &R) -> Ordering,
{
    let mut out = Vec::with_capacity(left.len().max(right.len()));
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let order = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => cmp(l, r),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => break,
        };
        match order {
            Ordering::Less => out.extend(left.next().map(Merged::Left)),
            Ordering::Greater => out.extend(right.next().map(Merged::Right)),
            Ordering::Equal => {
                if let (Some(l), Some(r)) = (left.next(), right.next()) {
                    out.push(Merged::Both(l, r));
                }
            }
        }
    }

    out
}

/// Merge two sorted vectors into one sorted vector, keeping duplicates.
pub fn merge_sorted<T, F>(left: Vec<T>, right: Vec<T>, mut cmp: F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    let mut out = Vec::with_capacity(left.len() + right.len());
    for step in merge_join(left, right, &mut cmp) {
        match step {
            Merged::Left(item) | Merged::Right(item) => out.push(item),
            Merged::Both(l, r) => {
                out.push(l);
                out.push(r);
            }
        }
    }
    out
}
