//! Sort-and-sweep interval merging with a gap tolerance.

/// Half-open genomic interval carrying a payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Interval<T> {
    pub start: i64,
    pub end: i64,
    pub data: T,
}

impl<T> Interval<T> {
    pub fn new(start: i64, end: i64, data: T) -> Self {
        Self { start, end, data }
    }

    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Result of merging one or more intervals.
#[derive(Debug, Clone, PartialEq)]
pub struct Merged<T> {
    pub start: i64,
    pub end: i64,
    /// Payload of the earliest member, with later members folded in.
    pub data: T,
    /// Number of input intervals folded into this one.
    pub members: usize,
    /// Sum of member lengths (before tolerance expansion).
    pub member_bp: i64,
}

impl<T> Merged<T> {
    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Merge intervals whose gap is at most `2 * tolerance`.
///
/// Every interval is widened by `tolerance` on both sides, overlapping or
/// touching widened intervals are folded together, and the result is shrunk
/// back by `tolerance`. The earliest interval keeps its payload and `reduce`
/// folds each later member's payload into it. Output is sorted by start.
pub fn merge_with<T, F>(
    intervals: Vec<Interval<T>>,
    tolerance: u32,
    mut reduce: F,
) -> Vec<Merged<T>>
where
    F: FnMut(&mut T, T),
{
    let pad = i64::from(tolerance);
    let mut widened: Vec<Interval<T>> = intervals
        .into_iter()
        .map(|iv| Interval::new(iv.start - pad, iv.end + pad, iv.data))
        .collect();
    // Stable, so ties keep input order.
    widened.sort_by_key(|iv| iv.start);

    let mut merged: Vec<Merged<T>> = Vec::with_capacity(widened.len());
    for iv in widened {
        let member_bp = iv.len() - 2 * pad;
        if let Some(last) = merged.last_mut()
            && iv.start <= last.end
        {
            last.end = last.end.max(iv.end);
            last.members += 1;
            last.member_bp += member_bp;
            reduce(&mut last.data, iv.data);
            continue;
        }
        merged.push(Merged {
            start: iv.start,
            end: iv.end,
            data: iv.data,
            members: 1,
            member_bp,
        });
    }

    for m in &mut merged {
        m.start += pad;
        m.end -= pad;
    }
    merged
}
