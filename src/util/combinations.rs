//! Lazy cartesian products.
//!
//! [`Product`] walks every combination in odometer order, keeping a single
//! index vector as state. [`RankedProduct`] yields combinations of scored
//! choices in ascending total score, expanding a frontier one combination at
//! a time.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use ahash::AHashSet;

/// Every combination picking one element per slot, last slot varying fastest.
#[derive(Debug, Clone)]
pub struct Product<'a, T> {
    slots: &'a [Vec<T>],
    indices: Vec<usize>,
    done: bool,
}

impl<'a, T> Product<'a, T> {
    pub fn new(slots: &'a [Vec<T>]) -> Self {
        let done = slots.is_empty() || slots.iter().any(Vec::is_empty);
        Product {
            slots,
            indices: vec![0; slots.len()],
            done,
        }
    }

    /// Number of combinations, saturating on overflow.
    pub fn count_all(&self) -> usize {
        if self.slots.is_empty() {
            return 0;
        }
        self.slots
            .iter()
            .fold(1usize, |acc, slot| acc.saturating_mul(slot.len()))
    }

    fn advance(&mut self) {
        for pos in (0..self.indices.len()).rev() {
            self.indices[pos] += 1;
            if self.indices[pos] < self.slots[pos].len() {
                return;
            }
            self.indices[pos] = 0;
        }
        self.done = true;
    }
}

impl<'a, T> Iterator for Product<'a, T> {
    type Item = Vec<&'a T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let slots = self.slots;
        let item = self
            .indices
            .iter()
            .zip(slots)
            .map(|(&i, slot)| &slot[i])
            .collect();
        self.advance();
        Some(item)
    }
}

#[derive(Debug)]
struct Frontier {
    score: f64,
    indices: Vec<usize>,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    // Reversed so the max-heap pops the lowest score, then the lowest indices.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.indices.cmp(&self.indices))
    }
}

/// Combinations of scored choices in ascending order of summed score.
///
/// Each slot's scores must be sorted ascending. Items are the chosen index
/// per slot and the total score. Ties are broken by comparing index vectors.
#[derive(Debug)]
pub struct RankedProduct {
    scores: Vec<Vec<f64>>,
    heap: BinaryHeap<Frontier>,
    seen: AHashSet<Vec<usize>>,
}

impl RankedProduct {
    pub fn new(scores: Vec<Vec<f64>>) -> Self {
        let mut heap = BinaryHeap::new();
        let mut seen = AHashSet::new();
        if !scores.is_empty() && scores.iter().all(|slot| !slot.is_empty()) {
            let indices = vec![0; scores.len()];
            let score = total(&scores, &indices);
            seen.insert(indices.clone());
            heap.push(Frontier { score, indices });
        }
        RankedProduct { scores, heap, seen }
    }
}

impl Iterator for RankedProduct {
    type Item = (Vec<usize>, f64);

    fn next(&mut self) -> Option<Self::Item> {
        let Frontier { score, indices } = self.heap.pop()?;
        for pos in 0..indices.len() {
            let slot = &self.scores[pos];
            let next = indices[pos] + 1;
            if next >= slot.len() {
                continue;
            }
            let mut successor = indices.clone();
            successor[pos] = next;
            if self.seen.insert(successor.clone()) {
                let score = total(&self.scores, &successor);
                self.heap.push(Frontier {
                    score,
                    indices: successor,
                });
            }
        }
        Some((indices, score))
    }
}

fn total(scores: &[Vec<f64>], indices: &[usize]) -> f64 {
    indices
        .iter()
        .zip(scores)
        .map(|(&i, slot)| slot[i])
        .sum()
}
