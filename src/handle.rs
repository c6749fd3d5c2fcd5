use super::errors::{panic_message, PoolError};
use std::thread::{self, JoinHandle};


/// Набор именованных OS-потоков одного пула
pub(crate) struct ThreadGroup {
    prefix: String,
    handles: Vec<JoinHandle<()>>,
}

impl ThreadGroup {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            handles: Vec::new(),
        }
    }

    pub fn spawn<F>(&mut self, role: &str, f: F) -> Result<(), PoolError>
    where
        F: FnOnce() + Send + 'static,
    {
        let name = format!("{}-{}", self.prefix, role);
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(f)
            .map_err(|source| PoolError::Spawn { name, source })?;
        self.handles.push(handle);
        Ok(())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Повторный вызов ничего не делает
    pub fn join(&mut self) {
        for handle in self.handles.drain(..) {
            let name = handle.thread().name().unwrap_or("<unnamed>").to_owned();
            if let Err(payload) = handle.join() {
                log::error!("thread {name} exited abnormally: {}", panic_message(payload));
            }
        }
    }
}
