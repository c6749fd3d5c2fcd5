//! Подача элементов во входные очереди с ограниченным ожиданием.
//!
//! Сначала до `spins` неблокирующих попыток с нарастающим backoff, затем
//! блокирующий `send`: канал сам разбудит отправителя, когда воркер
//! освободит место, так что CPU не крутится вхолостую.

use super::errors::{SubmitError, TrySubmitError};
use crossbeam::{
    channel::{SendError, Sender, TrySendError},
    utils::Backoff,
};


pub(crate) fn submit<T>(queue: &Sender<T>, item: T, spins: u32) -> Result<(), SubmitError<T>> {
    let backoff = Backoff::new();
    let mut item = item;
    for _ in 0..spins {
        match queue.try_send(item) {
            Ok(()) => return Ok(()),
            Err(TrySendError::Full(back)) => item = back,
            Err(TrySendError::Disconnected(back)) => return Err(SubmitError(back)),
        }
        backoff.snooze();
    }
    queue.send(item).map_err(|SendError(back)| SubmitError(back))
}

#[inline]
pub(crate) fn try_submit<T>(queue: &Sender<T>, item: T) -> Result<(), TrySubmitError<T>> {
    queue.try_send(item).map_err(|e| match e {
        TrySendError::Full(back) => TrySubmitError::Full(back),
        TrySendError::Disconnected(back) => TrySubmitError::Disconnected(back),
    })
}
