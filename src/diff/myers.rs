//! Myers' O(ND) diff with the middle-snake bisection, over chars.

use super::cleanup::cleanup_merge;
use super::{Chunk, Operation};

/// Raw edit script for `a` -> `b`, merged but not semantically cleaned
pub(super) fn diff_chars(a: &[char], b: &[char]) -> Vec<Chunk> {
    if a == b {
        return if a.is_empty() {
            Vec::new()
        } else {
            vec![Chunk::new(Operation::Equal, a)]
        };
    }

    let prefix = common_prefix(a, b);
    let (a_rest, b_rest) = (&a[prefix..], &b[prefix..]);
    let suffix = common_suffix(a_rest, b_rest);
    let a_mid = &a_rest[..a_rest.len() - suffix];
    let b_mid = &b_rest[..b_rest.len() - suffix];

    let mut chunks = Vec::new();
    if prefix > 0 {
        chunks.push(Chunk::new(Operation::Equal, &a[..prefix]));
    }
    chunks.extend(compute(a_mid, b_mid));
    if suffix > 0 {
        chunks.push(Chunk::new(Operation::Equal, &a_rest[a_rest.len() - suffix..]));
    }

    cleanup_merge(&mut chunks);
    chunks
}

pub(super) fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

pub(super) fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter().rev().zip(b.iter().rev()).take_while(|(x, y)| x == y).count()
}

/// Diff two inputs that share no prefix or suffix
fn compute(a: &[char], b: &[char]) -> Vec<Chunk> {
    if a.is_empty() {
        return if b.is_empty() {
            Vec::new()
        } else {
            vec![Chunk::new(Operation::Insert, b)]
        };
    }
    if b.is_empty() {
        return vec![Chunk::new(Operation::Delete, a)];
    }

    let (long, short, op) = if a.len() > b.len() {
        (a, b, Operation::Delete)
    } else {
        (b, a, Operation::Insert)
    };

    if let Some(at) = find(long, short) {
        return vec![
            Chunk::new(op, &long[..at]),
            Chunk::new(Operation::Equal, short),
            Chunk::new(op, &long[at + short.len()..]),
        ];
    }

    if short.len() == 1 {
        // Single char that is not in the other text
        return replace(a, b);
    }

    bisect(a, b)
}

fn replace(a: &[char], b: &[char]) -> Vec<Chunk> {
    vec![Chunk::new(Operation::Delete, a), Chunk::new(Operation::Insert, b)]
}

pub(super) fn find(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Walk forward and reverse paths until they overlap, then split there
fn bisect(a: &[char], b: &[char]) -> Vec<Chunk> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max_d = (n + m + 1) / 2;
    let v_offset = max_d;
    let v_len = 2 * max_d;
    let mut v1 = vec![-1isize; v_len as usize];
    let mut v2 = vec![-1isize; v_len as usize];
    v1[(v_offset + 1) as usize] = 0;
    v2[(v_offset + 1) as usize] = 0;

    let delta = n - m;
    // Odd delta: the forward path checks for overlap, otherwise the reverse one
    let front = delta % 2 != 0;

    let (mut k1_start, mut k1_end, mut k2_start, mut k2_end) = (0isize, 0isize, 0isize, 0isize);

    for d in 0..max_d {
        let mut k1 = -d + k1_start;
        while k1 <= d - k1_end {
            let k1_offset = v_offset + k1;
            let mut x1 = if k1 == -d
                || (k1 != d && v1[(k1_offset - 1) as usize] < v1[(k1_offset + 1) as usize])
            {
                v1[(k1_offset + 1) as usize]
            } else {
                v1[(k1_offset - 1) as usize] + 1
            };
            let mut y1 = x1 - k1;
            while x1 < n && y1 < m && a[x1 as usize] == b[y1 as usize] {
                x1 += 1;
                y1 += 1;
            }
            v1[k1_offset as usize] = x1;

            if x1 > n {
                k1_end += 2;
            } else if y1 > m {
                k1_start += 2;
            } else if front {
                let k2_offset = v_offset + delta - k1;
                if k2_offset >= 0 && k2_offset < v_len && v2[k2_offset as usize] != -1 {
                    let x2 = n - v2[k2_offset as usize];
                    if x1 >= x2 {
                        if let Some(split) = split(a, b, x1, y1) {
                            return split;
                        }
                    }
                }
            }
            k1 += 2;
        }

        let mut k2 = -d + k2_start;
        while k2 <= d - k2_end {
            let k2_offset = v_offset + k2;
            let mut x2 = if k2 == -d
                || (k2 != d && v2[(k2_offset - 1) as usize] < v2[(k2_offset + 1) as usize])
            {
                v2[(k2_offset + 1) as usize]
            } else {
                v2[(k2_offset - 1) as usize] + 1
            };
            let mut y2 = x2 - k2;
            while x2 < n && y2 < m && a[(n - x2 - 1) as usize] == b[(m - y2 - 1) as usize] {
                x2 += 1;
                y2 += 1;
            }
            v2[k2_offset as usize] = x2;

            if x2 > n {
                k2_end += 2;
            } else if y2 > m {
                k2_start += 2;
            } else if !front {
                let k1_offset = v_offset + delta - k2;
                if k1_offset >= 0 && k1_offset < v_len && v1[k1_offset as usize] != -1 {
                    let x1 = v1[k1_offset as usize];
                    let y1 = v_offset + x1 - k1_offset;
                    if x1 >= n - x2 {
                        if let Some(split) = split(a, b, x1, y1) {
                            return split;
                        }
                    }
                }
            }
            k2 += 2;
        }
    }

    // No commonality at all
    replace(a, b)
}

/// Diff both halves around the snake point independently
fn split(a: &[char], b: &[char], x: isize, y: isize) -> Option<Vec<Chunk>> {
    if x < 0 || y < 0 || x as usize > a.len() || y as usize > b.len() {
        return None;
    }
    let (x, y) = (x as usize, y as usize);
    let mut chunks = diff_chars(&a[..x], &b[..y]);
    chunks.extend(diff_chars(&a[x..], &b[y..]));
    Some(chunks)
}
