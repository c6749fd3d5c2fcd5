use super::{
    errors::{PoolError, SubmitError, TrySubmitError},
    handle::ThreadGroup,
    lifecycle::drain_loop,
    model::{Counters, PoolMetrics},
    pool::{Config, Pool, Shared, SharedRef},
    submit::{submit, try_submit},
};
use crossbeam::channel::{bounded, unbounded, Sender};
use std::sync::Arc;


/// N воркеров с общей входной и общей выходной очередью, один sink-поток.
/// Результаты приходят в sink в порядке завершения.
pub struct UnsortedPool<I> {
    input: Sender<I>,
    shared: SharedRef,
    workers: ThreadGroup,
    sink: ThreadGroup,
    submit_spins: u32,
}

impl<I: Send + 'static> UnsortedPool<I> {
    pub fn new<O, W, S>(num_threads: usize, worker: W, sink: S) -> Result<Self, PoolError>
    where
        O: Send + 'static,
        W: Fn(I) -> O + Send + Sync + 'static,
        S: FnMut(O) + Send + 'static,
    {
        Self::with_config(Config::default().with_threads(num_threads), worker, sink)
    }

    pub fn with_config<O, W, S>(config: Config, worker: W, mut sink: S) -> Result<Self, PoolError>
    where
        O: Send + 'static,
        W: Fn(I) -> O + Send + Sync + 'static,
        S: FnMut(O) + Send + 'static,
    {
        config.validate()?;
        let (input_tx, input_rx) = bounded::<I>(config.queue_capacity);
        let (output_tx, output_rx) = unbounded::<O>();
        let shared = Shared::new(&config);
        let poll = config.poll_interval;

        // при ошибке spawn уже запущенные потоки остановит Drop
        let mut pool = Self {
            input: input_tx,
            shared: shared.clone(),
            workers: ThreadGroup::new(&config.thread_name),
            sink: ThreadGroup::new(&config.thread_name),
            submit_spins: config.submit_spins,
        };

        let worker = Arc::new(worker);
        for index in 0..config.num_threads {
            let rx = input_rx.clone();
            let tx = output_tx.clone();
            let shared = shared.clone();
            let worker = worker.clone();
            pool.workers.spawn(&format!("worker-{index}"), move || {
                drain_loop(
                    shared.lifecycle.input(),
                    || rx.recv_timeout(poll).ok(),
                    || rx.try_recv().ok(),
                    |item: I| {
                        if let Some(out) = shared.process(index, None, || worker(item)) {
                            let _ = tx.send(out);
                        }
                    },
                );
            })?;
        }
        drop(output_tx);

        pool.sink.spawn("sink", move || {
            drain_loop(
                shared.lifecycle.output(),
                || output_rx.recv_timeout(poll).ok(),
                || output_rx.try_recv().ok(),
                |out: O| shared.deliver(None, || sink(out)),
            );
        })?;

        log::debug!(
            "unsorted pool started: {} workers, capacity {}",
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

    /// Остановить пул, дождавшись доставки всех элементов
    pub fn join(mut self) -> PoolMetrics {
        self.close();
        self.metrics()
    }
}

impl<I> UnsortedPool<I> {
    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        self.shared.counters.snapshot()
    }

    fn close(&mut self) {
        let first = self.shared.lifecycle.stop_input();
        self.workers.join();
        self.shared.lifecycle.stop_output();
        self.sink.join();
        if first {
            log::debug!("unsorted pool stopped: {:?}", self.metrics());
        }
    }
}

impl<I> Drop for UnsortedPool<I> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<I: Send + 'static> Pool<I> for UnsortedPool<I> {
    fn add(&mut self, item: I) -> Result<(), SubmitError<I>> {
        UnsortedPool::add(self, item)
    }

    fn try_add(&mut self, item: I) -> Result<(), TrySubmitError<I>> {
        UnsortedPool::try_add(self, item)
    }

    fn metrics(&self) -> PoolMetrics {
        UnsortedPool::metrics(self)
    }

    fn join(self: Box<Self>) -> PoolMetrics {
        UnsortedPool::join(*self)
    }
}
