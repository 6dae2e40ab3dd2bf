//! Post-processing passes over a raw edit script.
//!
//! `cleanup_merge` normalises the script. `cleanup_semantic` trades
//! minimality for readability: short equalities sandwiched between larger
//! edits are folded into those edits, single edits slide onto word and line
//! boundaries, and a delete/insert pair that overlaps is split around the
//! shared text.

use super::myers::{common_prefix, common_suffix, find};
use super::{Chunk, Operation};

/// Merge neighbouring runs of the same kind, factor common text out of
/// delete/insert pairs and slide single edits to absorb their neighbours.
pub(super) fn cleanup_merge(chunks: &mut Vec<Chunk>) {
    loop {
        coalesce(chunks);
        if !shift_single_edits(chunks) {
            break;
        }
    }
}

fn coalesce(chunks: &mut Vec<Chunk>) {
    let mut merged: Vec<Chunk> = Vec::with_capacity(chunks.len());
    let mut deleted: Vec<char> = Vec::new();
    let mut inserted: Vec<char> = Vec::new();

    for chunk in chunks.drain(..) {
        match chunk.op {
            Operation::Delete => deleted.extend(chunk.chars),
            Operation::Insert => inserted.extend(chunk.chars),
            Operation::Equal => {
                flush_edits(&mut merged, &mut deleted, &mut inserted);
                push_equal(&mut merged, chunk.chars);
            }
        }
    }
    flush_edits(&mut merged, &mut deleted, &mut inserted);
    *chunks = merged;
}

fn push_equal(merged: &mut Vec<Chunk>, chars: Vec<char>) {
    if chars.is_empty() {
        return;
    }
    match merged.last_mut() {
        Some(last) if last.op == Operation::Equal => last.chars.extend(chars),
        _ => merged.push(Chunk::new(Operation::Equal, chars)),
    }
}

fn flush_edits(merged: &mut Vec<Chunk>, deleted: &mut Vec<char>, inserted: &mut Vec<char>) {
    let mut tail = Vec::new();
    if !deleted.is_empty() && !inserted.is_empty() {
        let prefix = common_prefix(deleted, inserted);
        if prefix > 0 {
            push_equal(merged, inserted[..prefix].to_vec());
            deleted.drain(..prefix);
            inserted.drain(..prefix);
        }
        let suffix = common_suffix(deleted, inserted);
        if suffix > 0 {
            tail = inserted.split_off(inserted.len() - suffix);
            deleted.truncate(deleted.len() - suffix);
        }
    }
    if !deleted.is_empty() {
        merged.push(Chunk::new(Operation::Delete, std::mem::take(deleted)));
    }
    if !inserted.is_empty() {
        merged.push(Chunk::new(Operation::Insert, std::mem::take(inserted)));
    }
    push_equal(merged, tail);
}

/// `A<ins>BA</ins>C` becomes `<ins>AB</ins>AC`, and `A<ins>BC</ins>B`
/// becomes `AB<ins>CB</ins>`. Returns whether anything moved.
fn shift_single_edits(chunks: &mut Vec<Chunk>) -> bool {
    let mut i = 1;
    while i + 1 < chunks.len() {
        if chunks[i - 1].op == Operation::Equal && chunks[i + 1].op == Operation::Equal {
            let prev = chunks[i - 1].chars.clone();
            let next = chunks[i + 1].chars.clone();
            let edit = &chunks[i].chars;

            if !prev.is_empty() && edit.ends_with(&prev) {
                let mut shifted = prev.clone();
                shifted.extend_from_slice(&edit[..edit.len() - prev.len()]);
                chunks[i].chars = shifted;
                let mut following = prev;
                following.extend(next);
                chunks[i + 1].chars = following;
                chunks.remove(i - 1);
                return true;
            }
            if !next.is_empty() && edit.starts_with(&next) {
                let mut shifted = edit[next.len()..].to_vec();
                shifted.extend_from_slice(&next);
                chunks[i].chars = shifted;
                chunks[i - 1].chars.extend(next);
                chunks.remove(i + 1);
                return true;
            }
        }
        i += 1;
    }
    false
}

/// Fold equalities that are no longer than the edits on both sides of them
/// into those edits, then align and split what remains.
pub(crate) fn cleanup_semantic(chunks: &mut Vec<Chunk>) {
    let mut changed = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<Vec<char>> = None;
    // Edit lengths before and after the last equality
    let (mut ins_before, mut del_before, mut ins_after, mut del_after) = (0, 0, 0, 0);

    let mut i = 0;
    while i < chunks.len() {
        if chunks[i].op == Operation::Equal {
            equalities.push(i);
            ins_before = ins_after;
            del_before = del_after;
            ins_after = 0;
            del_after = 0;
            last_equality = Some(chunks[i].chars.clone());
            i += 1;
            continue;
        }

        if chunks[i].op == Operation::Insert {
            ins_after += chunks[i].chars.len();
        } else {
            del_after += chunks[i].chars.len();
        }

        let fold = match &last_equality {
            Some(eq) => {
                eq.len() <= ins_before.max(del_before) && eq.len() <= ins_after.max(del_after)
            }
            None => false,
        };
        if fold {
            if let (Some(at), Some(eq)) = (equalities.pop(), last_equality.take()) {
                chunks.insert(at, Chunk::new(Operation::Delete, eq));
                chunks[at + 1].op = Operation::Insert;
                // The equality before it has to be looked at again
                equalities.pop();
                i = equalities.last().map(|&e| e + 1).unwrap_or(0);
                ins_before = 0;
                del_before = 0;
                ins_after = 0;
                del_after = 0;
                changed = true;
                continue;
            }
        }
        i += 1;
    }

    if changed {
        cleanup_merge(chunks);
    }
    cleanup_semantic_lossless(chunks);
    extract_overlaps(chunks);
    coalesce(chunks);
}

/// Slide each single edit between two equalities to the position where its
/// edges fall on the most natural boundaries.
fn cleanup_semantic_lossless(chunks: &mut Vec<Chunk>) {
    let mut i = 1;
    while i + 1 < chunks.len() {
        if chunks[i - 1].op != Operation::Equal || chunks[i + 1].op != Operation::Equal {
            i += 1;
            continue;
        }

        let mut before = chunks[i - 1].chars.clone();
        let mut edit = chunks[i].chars.clone();
        let mut after = chunks[i + 1].chars.clone();

        // Start from the leftmost position
        let shared = common_suffix(&before, &edit);
        if shared > 0 {
            let common = edit[edit.len() - shared..].to_vec();
            before.truncate(before.len() - shared);
            let mut moved = common.clone();
            moved.extend_from_slice(&edit[..edit.len() - shared]);
            edit = moved;
            let mut tail = common;
            tail.extend(after);
            after = tail;
        }

        let mut best = (before.clone(), edit.clone(), after.clone());
        let mut best_score = boundary_score(&before, &edit) + boundary_score(&edit, &after);
        while !edit.is_empty() && !after.is_empty() && edit[0] == after[0] {
            before.push(edit.remove(0));
            edit.push(after.remove(0));
            let score = boundary_score(&before, &edit) + boundary_score(&edit, &after);
            // >= prefers the rightmost of equally good positions
            if score >= best_score {
                best_score = score;
                best = (before.clone(), edit.clone(), after.clone());
            }
        }

        let (best_before, best_edit, best_after) = best;
        if chunks[i - 1].chars == best_before {
            i += 1;
            continue;
        }

        let mut at = i;
        if best_before.is_empty() {
            chunks.remove(at - 1);
            at -= 1;
        } else {
            chunks[at - 1].chars = best_before;
        }
        chunks[at].chars = best_edit;
        if best_after.is_empty() {
            chunks.remove(at + 1);
            i = at;
        } else {
            chunks[at + 1].chars = best_after;
            i = at + 1;
        }
    }
}

/// Score how well the boundary between `one` and `two` sits on a natural
/// break, from 6 (edge of the text) down to 0 (inside a word).
fn boundary_score(one: &[char], two: &[char]) -> u8 {
    let (Some(&c1), Some(&c2)) = (one.last(), two.first()) else {
        return 6;
    };

    let non_alnum1 = !c1.is_alphanumeric();
    let non_alnum2 = !c2.is_alphanumeric();
    let space1 = non_alnum1 && c1.is_whitespace();
    let space2 = non_alnum2 && c2.is_whitespace();
    let line_break1 = space1 && (c1 == '\r' || c1 == '\n');
    let line_break2 = space2 && (c2 == '\r' || c2 == '\n');
    let blank_line1 = line_break1 && (one.ends_with(&['\n', '\n']) || one.ends_with(&['\n', '\r', '\n']));
    let blank_line2 = line_break2
        && [&['\n', '\n'][..], &['\n', '\r', '\n'], &['\r', '\n', '\n'], &['\r', '\n', '\r', '\n']]
            .iter()
            .any(|p| two.starts_with(p));

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alnum1 && !space1 && space2 {
        // End of sentence
        3
    } else if space1 || space2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

/// `<del>abcxxx</del><ins>xxxdef</ins>` becomes
/// `<del>abc</del>xxx<ins>def</ins>` when the overlap is at least half of
/// either edit. The reverse overlap swaps the two edits around it.
fn extract_overlaps(chunks: &mut Vec<Chunk>) {
    let mut i = 1;
    while i < chunks.len() {
        if chunks[i - 1].op == Operation::Delete && chunks[i].op == Operation::Insert {
            let deletion = chunks[i - 1].chars.clone();
            let insertion = chunks[i].chars.clone();
            let forward = common_overlap(&deletion, &insertion);
            let reverse = common_overlap(&insertion, &deletion);

            if forward >= reverse {
                if forward > 0 && (forward * 2 >= deletion.len() || forward * 2 >= insertion.len()) {
                    chunks.insert(i, Chunk::new(Operation::Equal, &insertion[..forward]));
                    chunks[i - 1].chars = deletion[..deletion.len() - forward].to_vec();
                    chunks[i + 1].chars = insertion[forward..].to_vec();
                    i += 1;
                }
            } else if reverse * 2 >= deletion.len() || reverse * 2 >= insertion.len() {
                chunks.insert(i, Chunk::new(Operation::Equal, &deletion[..reverse]));
                chunks[i - 1] = Chunk::new(Operation::Insert, &insertion[..insertion.len() - reverse]);
                chunks[i + 1] = Chunk::new(Operation::Delete, &deletion[reverse..]);
                i += 1;
            }
            i += 1;
        }
        i += 1;
    }
}

/// Length of the longest suffix of `one` that is a prefix of `two`
fn common_overlap(one: &[char], two: &[char]) -> usize {
    let len = one.len().min(two.len());
    if len == 0 {
        return 0;
    }
    let one = &one[one.len() - len..];
    let two = &two[..len];
    if one == two {
        return len;
    }

    let mut best = 0;
    let mut length = 1;
    loop {
        let pattern = &one[len - length..];
        let Some(found) = find(two, pattern) else {
            return best;
        };
        length += found;
        if found == 0 || one[len - length..] == two[..length] {
            best = length;
            length += 1;
        }
        if length > len {
            return best;
        }
    }
}
