use super::{
    errors::{PoolError, SubmitError, TrySubmitError},
    handle::ThreadGroup,
    lifecycle::drain_loop,
    model::{Counters, PoolMetrics},
    pool::{Config, Pool, Shared, SharedRef},
    submit::{submit, try_submit},
};
use crossbeam::channel::{bounded, Sender};
use std::sync::Arc;


/// Одностадийный пул: воркеры сами выполняют побочный эффект (например,
/// запись), выходной очереди и sink-а нет. Завершение однофазное.
pub struct OneWayPool<I> {
    input: Sender<I>,
    shared: SharedRef,
    workers: ThreadGroup,
    submit_spins: u32,
}

impl<I: Send + 'static> OneWayPool<I> {
    pub fn new<W>(num_threads: usize, worker: W) -> Result<Self, PoolError>
    where
        W: Fn(I) + Send + Sync + 'static,
    {
        Self::with_config(Config::default().with_threads(num_threads), worker)
    }

    pub fn with_config<W>(config: Config, worker: W) -> Result<Self, PoolError>
    where
        W: Fn(I) + Send + Sync + 'static,
    {
        config.validate()?;
        let (input_tx, input_rx) = bounded::<I>(config.queue_capacity);
        let shared = Shared::new(&config);
        let poll = config.poll_interval;

        let mut pool = Self {
            input: input_tx,
            shared: shared.clone(),
            workers: ThreadGroup::new(&config.thread_name),
            submit_spins: config.submit_spins,
        };

        let worker = Arc::new(worker);
        for index in 0..config.num_threads {
            let rx = input_rx.clone();
            let shared = shared.clone();
            let worker = worker.clone();
            pool.workers.spawn(&format!("worker-{index}"), move || {
                drain_loop(
                    shared.lifecycle.input(),
                    || rx.recv_timeout(poll).ok(),
                    || rx.try_recv().ok(),
                    |item: I| {
                        let _ = shared.process(index, None, || worker(item));
                    },
                );
            })?;
        }

        log::debug!(
            "one-way pool started: {} workers, capacity {}",
            pool.workers.len(),
            config.queue_capacity
        );
        Ok(pool)
    }

    pub fn add(&mut self, item: I) -> Result<(), SubmitError<I>> {
        submit(&self.input, item, self.submit_spins)?;
        Counters::bump(&self.shared.counters.submitted);
        Ok(())
    }

    pub fn try_add(&mut self, item: I) -> Result<(), TrySubmitError<I>> {
        try_submit(&self.input, item)?;
        Counters::bump(&self.shared.counters.submitted);
        Ok(())
    }

    /// Остановить пул, дождавшись обработки всех элементов
    pub fn join(mut self) -> PoolMetrics {
        self.close();
        self.metrics()
    }
}

impl<I> OneWayPool<I> {
    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        self.shared.counters.snapshot()
    }

    fn close(&mut self) {
        if self.shared.lifecycle.stop_input() {
            self.workers.join();
            log::debug!("one-way pool stopped: {:?}", self.metrics());
        }
    }
}

impl<I> Drop for OneWayPool<I> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<I: Send + 'static> Pool<I> for OneWayPool<I> {
    fn add(&mut self, item: I) -> Result<(), SubmitError<I>> {
        OneWayPool::add(self, item)
    }

    fn try_add(&mut self, item: I) -> Result<(), TrySubmitError<I>> {
        OneWayPool::try_add(self, item)
    }

    fn metrics(&self) -> PoolMetrics {
        OneWayPool::metrics(self)
    }

    fn join(self: Box<Self>) -> PoolMetrics {
        OneWayPool::join(*self)
    }
}
