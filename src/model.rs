use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};


/// Снимок счетчиков пула
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Принято через `add`/`try_add`
    pub submitted: u64,
    /// Успешно обработано воркерами
    pub processed: u64,
    /// Паники в worker- или sink-функции
    pub failed: u64,
    /// Передано в sink-функцию (у `OneWayPool` всегда 0)
    pub delivered: u64,
    /// Элементы, взятые из чужой домашней очереди
    pub stolen: u64,
    /// Максимальный размер буфера переупорядочивания
    pub peak_pending: usize,
}

impl PoolMetrics {
    pub fn in_flight(&self) -> u64 {
        self.submitted.saturating_sub(self.processed + self.failed)
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.processed + self.failed;
        if total == 0 {
            return 1.0;
        }
        self.processed as f64 / total as f64
    }
}


/// Какой пул собрать в `pool::build`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Результаты приходят в порядке завершения
    Unsorted,
    /// Результаты приходят в порядке подачи
    Ordered,
    /// Очередь на каждого воркера плюс кража работы
    Stealing,
}


#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub submitted: AtomicU64,
    pub processed: AtomicU64,
    pub failed: AtomicU64,
    pub delivered: AtomicU64,
    pub stolen: AtomicU64,
    pub peak_pending: AtomicUsize,
}

impl Counters {
    #[inline]
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PoolMetrics {
        PoolMetrics {
            submitted: self.submitted.load(Ordering::Relaxed),
            processed: self.processed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            stolen: self.stolen.load(Ordering::Relaxed),
            peak_pending: self.peak_pending.load(Ordering::Relaxed),
        }
    }
}
