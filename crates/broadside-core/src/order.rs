use std::cmp::Ordering;

/// Compare two round names using natural ordering.
///
/// Runs of ASCII digits compare by numeric value, everything else compares
/// character by character. Names that are equal under that rule (e.g. `r01`
/// and `r1`) fall back to plain string comparison so the ordering is total.
pub fn compare_round_names(a: &str, b: &str) -> Ordering {
    natural_cmp(a, b).then_with(|| a.cmp(b))
}

fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.char_indices().peekable();
    let mut right = b.char_indices().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some((i, ca)), Some((j, cb))) => {
                if ca.is_ascii_digit() && cb.is_ascii_digit() {
                    let run_a = digit_run(a, i);
                    let run_b = digit_run(b, j);
                    let ord = compare_digit_runs(run_a, run_b);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    for _ in 0..run_a.len() {
                        left.next();
                    }
                    for _ in 0..run_b.len() {
                        right.next();
                    }
                } else {
                    let ord = ca.cmp(&cb);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                    left.next();
                    right.next();
                }
            }
        }
    }
}

fn digit_run(s: &str, start: usize) -> &str {
    let end = s[start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(s.len(), |offset| start + offset);
    &s[start..end]
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Sort round names in place using [`compare_round_names`].
pub fn sort_round_names(names: &mut [String]) {
    names.sort_by(|a, b| compare_round_names(a, b));
}
