/// Greedy byte-pair merge over a `RankTable`.
///
/// The adjacent pair with the lowest rank merges first; equal ranks merge
/// left to right. Candidate merges sit in a min-heap keyed by
/// `(rank, left span, version)`; live spans are chained through `next`/`prev`
/// so a merge only touches its two neighbours. The ranks produced equal those
/// of rescanning for the minimum pair after every merge.
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::error::{CodecError, Result};
use crate::rank_table::RankTable;
use crate::Rank;

pub fn byte_pair_encode(piece: &[u8], table: &RankTable) -> Result<Vec<Rank>> {
    let n = piece.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    if n == 1 {
        return table
            .get(piece, 0, 1)
            .map(|rank| vec![rank])
            .ok_or_else(|| missing_byte(piece, 0));
    }

    // spans[i] = (start, end) of the token currently starting at byte i.
    let mut spans: Vec<(usize, usize)> = (0..n).map(|i| (i, i + 1)).collect();

    let mut next: Vec<usize> = (1..=n).collect();
    let mut prev: Vec<usize> = (0..n).map(|i| if i == 0 { usize::MAX } else { i - 1 }).collect();
    let mut alive = vec![true; n];

    // A heap entry is live only while its version matches the span's.
    let mut version: Vec<u32> = vec![0; n];

    let mut heap: BinaryHeap<Reverse<(Rank, usize, u32)>> = BinaryHeap::with_capacity(n);

    // Rank of spans[i] joined with the next live span, if the table has it.
    let pair_rank = |i: usize, spans: &[(usize, usize)], next: &[usize]| -> Option<Rank> {
        let j = next[i];
        if j >= n {
            return None;
        }
        table.get(piece, spans[i].0, spans[j].1)
    };

    for i in 0..n - 1 {
        if let Some(rank) = pair_rank(i, &spans, &next) {
            heap.push(Reverse((rank, i, 0)));
        }
    }

    while let Some(Reverse((rank, i, g))) = heap.pop() {
        if !alive[i] || version[i] != g {
            continue;
        }
        let j = next[i];
        if j >= n || !alive[j] {
            continue;
        }
        // Stale if the neighbour changed after the push.
        if pair_rank(i, &spans, &next) != Some(rank) {
            continue;
        }

        spans[i].1 = spans[j].1;
        version[i] += 1;
        alive[j] = false;
        let k = next[j];
        next[i] = k;
        if k < n {
            prev[k] = i;
        }

        if prev[i] != usize::MAX {
            let p = prev[i];
            if let Some(r) = pair_rank(p, &spans, &next) {
                heap.push(Reverse((r, p, version[p])));
            }
        }
        if next[i] < n {
            if let Some(r) = pair_rank(i, &spans, &next) {
                heap.push(Reverse((r, i, version[i])));
            }
        }
    }

    let mut out = Vec::new();
    let mut i = 0;
    while i < n {
        let (start, end) = spans[i];
        match table.get(piece, start, end) {
            Some(rank) => out.push(rank),
            None => return Err(missing_byte(piece, start)),
        }
        i = next[i];
    }
    Ok(out)
}

#[cold]
fn missing_byte(piece: &[u8], at: usize) -> CodecError {
    CodecError::MissingByte {
        byte: piece[at],
        piece: String::from_utf8_lossy(piece).into_owned(),
    }
}
