use std::{
    any::Any,
    fmt,
    io,
};
use thiserror::Error;


/// Ошибки конструирования пула
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("pool needs at least one worker thread")]
    InvalidThreadCount,
    #[error("queue capacity must be at least 1")]
    InvalidCapacity,
    #[error("failed to spawn thread '{name}': {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// `add` не смог передать элемент: все получатели очереди уже завершились.
/// Элемент возвращается вызывающему.
#[derive(PartialEq, Eq, Clone, Copy, Error)]
#[error("pool input queue is disconnected")]
pub struct SubmitError<I>(pub I);

impl<I> SubmitError<I> {
    pub fn into_inner(self) -> I {
        self.0
    }
}

impl<I> fmt::Debug for SubmitError<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SubmitError(..)")
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Error)]
pub enum TrySubmitError<I> {
    #[error("pool input queue is full")]
    Full(I),
    #[error("pool input queue is disconnected")]
    Disconnected(I),
}

impl<I> TrySubmitError<I> {
    pub fn into_inner(self) -> I {
        match self {
            TrySubmitError::Full(item) | TrySubmitError::Disconnected(item) => item,
        }
    }

    pub fn is_full(&self) -> bool {
        matches!(self, TrySubmitError::Full(_))
    }
}

impl<I> fmt::Debug for TrySubmitError<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrySubmitError::Full(_) => f.write_str("Full(..)"),
            TrySubmitError::Disconnected(_) => f.write_str("Disconnected(..)"),
        }
    }
}


/// На каком этапе упала пользовательская функция
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Worker,
    Sink,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Worker => f.write_str("worker"),
            Stage::Sink => f.write_str("sink"),
        }
    }
}

/// Паника внутри worker- или sink-функции на конкретном элементе.
/// Поток при этом продолжает работу.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{stage} function panicked{}{}: {message}", thread_suffix(.thread), sequence_suffix(.sequence))]
pub struct Failure {
    pub stage: Stage,
    /// Индекс воркера; у sink-а индекса нет
    pub thread: Option<usize>,
    /// Номер элемента, только для пула с сохранением порядка
    pub sequence: Option<u64>,
    pub message: String,
}

fn thread_suffix(thread: &Option<usize>) -> String {
    match thread {
        Some(index) => format!(" on worker {index}"),
        None => String::new(),
    }
}

fn sequence_suffix(sequence: &Option<u64>) -> String {
    match sequence {
        Some(seq) => format!(" (item #{seq})"),
        None => String::new(),
    }
}

pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
