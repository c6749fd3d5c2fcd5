//! Двухфазное завершение пула.
//!
//! 1. `accepting_input` -> false, воркеры дочищают входные очереди
//!    неблокирующими попытками и выходят; все воркеры join-ятся.
//! 2. Только после этого `accepting_output` -> false, sink дочищает
//!    выходную очередь тем же циклом и тоже join-ится.
//!
//! Обратный порядок позволил бы sink-у увидеть пустую выходную очередь и
//! выйти, пока воркеры еще держат результаты в руках.

use std::sync::atomic::{AtomicBool, Ordering};


#[derive(Debug)]
pub(crate) struct Lifecycle {
    accepting_input: AtomicBool,
    accepting_output: AtomicBool,
}

impl Lifecycle {
    pub fn new() -> Self {
        Self {
            accepting_input: AtomicBool::new(true),
            accepting_output: AtomicBool::new(true),
        }
    }

    #[inline]
    pub fn input(&self) -> &AtomicBool {
        &self.accepting_input
    }

    #[inline]
    pub fn output(&self) -> &AtomicBool {
        &self.accepting_output
    }

    /// true только для первого вызова
    pub fn stop_input(&self) -> bool {
        self.accepting_input.swap(false, Ordering::AcqRel)
    }

    pub fn stop_output(&self) -> bool {
        self.accepting_output.swap(false, Ordering::AcqRel)
    }
}


/// Общий цикл воркеров и sink-а.
///
/// Пока `accepting` поднят, элементы берутся через `wait` (блокировка с
/// таймаутом, `None` = таймаут). После сброса флага цикл переключается на
/// `try_next` и крутится, пока последняя попытка была успешной.
pub(crate) fn drain_loop<T, W, N, H>(accepting: &AtomicBool, mut wait: W, mut try_next: N, mut handle: H)
where
    W: FnMut() -> Option<T>,
    N: FnMut() -> Option<T>,
    H: FnMut(T),
{
    loop {
        if accepting.load(Ordering::Acquire) {
            if let Some(item) = wait() {
                handle(item);
            }
        } else {
            match try_next() {
                Some(item) => handle(item),
                None => break,
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::unbounded;
    use std::{sync::Arc, thread, time::Duration};

    #[test]
    fn drains_everything_left_after_stop() {
        let (tx, rx) = unbounded();
        for i in 0..10 {
            tx.send(i).unwrap();
        }
        let flag = AtomicBool::new(false);
        let mut seen = Vec::new();
        drain_loop(
            &flag,
            || rx.recv_timeout(Duration::from_millis(1)).ok(),
            || rx.try_recv().ok(),
            |i| seen.push(i),
        );
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn keeps_waiting_until_flag_drops() {
        let lifecycle = Arc::new(Lifecycle::new());
        let (tx, rx) = unbounded::<u32>();

        let flags = lifecycle.clone();
        let consumer = thread::spawn(move || {
            let mut count = 0;
            drain_loop(
                flags.input(),
                || rx.recv_timeout(Duration::from_millis(1)).ok(),
                || rx.try_recv().ok(),
                |_| count += 1,
            );
            count
        });

        thread::sleep(Duration::from_millis(20));
        for i in 0..100 {
            tx.send(i).unwrap();
        }
        assert!(lifecycle.stop_input());
        assert!(!lifecycle.stop_input());
        assert_eq!(consumer.join().unwrap(), 100);
    }
}
