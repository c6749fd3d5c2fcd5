//! Буфер восстановления порядка для sink-а `OrderedPool`.
//!
//! Принадлежит одному потоку, синхронизация не нужна. Все элементы внутри
//! имеют номер больше `next_expected`; `next_expected` растет ровно на 1 при
//! каждой выдаче. Объем памяти ограничен максимальным разбросом между самым
//! быстрым и самым медленным воркером.
//!
//! ```
//! use fastpool::reorder::ReorderBuffer;
//!
//! let mut buffer = ReorderBuffer::new();
//! let mut out = Vec::new();
//! buffer.push(2, "c", |_, v| out.push(v));
//! buffer.push(0, "a", |_, v| out.push(v));
//! assert_eq!(out, ["a"]);
//! buffer.push(1, "b", |_, v| out.push(v));
//! assert_eq!(out, ["a", "b", "c"]);
//! ```

use std::collections::BTreeMap;


#[derive(Debug)]
pub struct ReorderBuffer<T> {
    pending: BTreeMap<u64, T>,
    next_expected: u64,
    peak: usize,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self {
            pending: BTreeMap::new(),
            next_expected: 0,
            peak: 0,
        }
    }

    /// Принять элемент с номером `sequence` и выдать через `release` все,
    /// что теперь идет подряд. Возвращает количество выданных.
    ///
    /// Повторный или уже выданный номер отбрасывается с предупреждением.
    pub fn push<F>(&mut self, sequence: u64, item: T, mut release: F) -> usize
    where
        F: FnMut(u64, T),
    {
        if sequence != self.next_expected {
            if sequence < self.next_expected || self.pending.contains_key(&sequence) {
                log::warn!(
                    "dropping duplicate item #{sequence} (next expected #{})",
                    self.next_expected
                );
                return 0;
            }
            self.pending.insert(sequence, item);
            self.peak = self.peak.max(self.pending.len());
            return 0;
        }

        release(sequence, item);
        self.next_expected += 1;
        let mut released = 1;

        while let Some(entry) = self.pending.first_entry() {
            if *entry.key() != self.next_expected {
                break;
            }
            release(self.next_expected, entry.remove());
            self.next_expected += 1;
            released += 1;
        }
        released
    }

    #[inline]
    pub fn next_expected(&self) -> u64 {
        self.next_expected
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Максимальное число одновременно отложенных элементов
    #[inline]
    pub fn peak(&self) -> usize {
        self.peak
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn collect(buffer: &mut ReorderBuffer<u64>, seqs: &[u64]) -> Vec<u64> {
        let mut out = Vec::new();
        for &seq in seqs {
            buffer.push(seq, seq * 10, |s, v| {
                assert_eq!(v, s * 10);
                out.push(s);
            });
        }
        out
    }

    #[test]
    fn in_order_passes_straight_through() {
        let mut buffer = ReorderBuffer::new();
        assert_eq!(collect(&mut buffer, &[0, 1, 2, 3]), vec![0, 1, 2, 3]);
        assert_eq!(buffer.peak(), 0);
        assert_eq!(buffer.next_expected(), 4);
    }

    #[test]
    fn reversed_is_held_until_head_arrives() {
        let mut buffer = ReorderBuffer::new();
        assert!(collect(&mut buffer, &[4, 3, 2, 1]).is_empty());
        assert_eq!(buffer.len(), 4);

        let mut out = Vec::new();
        let released = buffer.push(0, 0, |s, _| out.push(s));
        assert_eq!(released, 5);
        assert_eq!(out, vec![0, 1, 2, 3, 4]);
        assert!(buffer.is_empty());
        assert_eq!(buffer.peak(), 4);
    }

    #[test]
    fn gap_stops_release() {
        let mut buffer = ReorderBuffer::new();
        assert_eq!(collect(&mut buffer, &[0, 2, 3, 5]), vec![0]);
        assert_eq!(collect(&mut buffer, &[1]), vec![1, 2, 3]);
        assert_eq!(buffer.next_expected(), 4);
        assert_eq!(buffer.len(), 1);
        assert_eq!(collect(&mut buffer, &[4]), vec![4, 5]);
    }

    #[test]
    fn duplicates_are_dropped() {
        let mut buffer = ReorderBuffer::new();
        assert_eq!(collect(&mut buffer, &[0, 2, 2, 0]), vec![0]);
        assert_eq!(buffer.len(), 1);
        assert_eq!(collect(&mut buffer, &[1]), vec![1, 2]);
    }
}
