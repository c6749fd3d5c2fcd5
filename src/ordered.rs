use super::{
    errors::{PoolError, SubmitError, TrySubmitError},
    handle::ThreadGroup,
    lifecycle::drain_loop,
    model::{Counters, PoolMetrics},
    pool::{Config, Pool, Shared, SharedRef},
    reorder::ReorderBuffer,
    submit::{submit, try_submit},
};
use crossbeam::channel::{bounded, unbounded, Sender};
use std::sync::{atomic::Ordering, Arc};


/// Элемент с номером подачи
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequenced<T> {
    pub sequence: u64,
    pub value: T,
}


/// Пул, отдающий результаты в sink строго в порядке подачи.
///
/// Номера раздает единственный производитель: `add` принимает `&mut self`,
/// так что несколько потоков могут подавать элементы только через внешнюю
/// синхронизацию, которая заодно упорядочивает нумерацию.
///
/// Из `num_threads` один поток отводится под sink: воркеров запускается
/// `num_threads - 1`, но не меньше одного.
pub struct OrderedPool<I> {
    input: Sender<Sequenced<I>>,
    next_sequence: u64,
    shared: SharedRef,
    workers: ThreadGroup,
    sink: ThreadGroup,
    submit_spins: u32,
}

impl<I: Send + 'static> OrderedPool<I> {
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
        let (input_tx, input_rx) = bounded::<Sequenced<I>>(config.queue_capacity);
        // None - воркер упал на этом элементе, sink его пропускает
        let (output_tx, output_rx) = unbounded::<Sequenced<Option<O>>>();
        let shared = Shared::new(&config);
        let poll = config.poll_interval;

        let mut pool = Self {
            input: input_tx,
            next_sequence: 0,
            shared: shared.clone(),
            workers: ThreadGroup::new(&config.thread_name),
            sink: ThreadGroup::new(&config.thread_name),
            submit_spins: config.submit_spins,
        };

        let worker = Arc::new(worker);
        let num_workers = config.num_threads.saturating_sub(1).max(1);
        for index in 0..num_workers {
            let rx = input_rx.clone();
            let tx = output_tx.clone();
            let shared = shared.clone();
            let worker = worker.clone();
            pool.workers.spawn(&format!("worker-{index}"), move || {
                drain_loop(
                    shared.lifecycle.input(),
                    || rx.recv_timeout(poll).ok(),
                    || rx.try_recv().ok(),
                    |item: Sequenced<I>| {
                        let Sequenced { sequence, value } = item;
                        let value = shared.process(index, Some(sequence), || worker(value));
                        let _ = tx.send(Sequenced { sequence, value });
                    },
                );
            })?;
        }
        drop(output_tx);

        pool.sink.spawn("sink", move || {
            let mut pending = ReorderBuffer::new();
            drain_loop(
                shared.lifecycle.output(),
                || output_rx.recv_timeout(poll).ok(),
                || output_rx.try_recv().ok(),
                |item: Sequenced<Option<O>>| {
                    pending.push(item.sequence, item.value, |sequence, value| {
                        if let Some(out) = value {
                            shared.deliver(Some(sequence), || sink(out));
                        }
                    });
                    shared
                        .counters
                        .peak_pending
                        .fetch_max(pending.peak(), Ordering::Relaxed);
                },
            );
            if !pending.is_empty() {
                log::error!(
                    "ordered sink stopped with {} undelivered items, item #{} never arrived",
                    pending.len(),
                    pending.next_expected()
                );
            }
        })?;

        log::debug!(
            "ordered pool started: {} workers + sink, capacity {}",
            pool.workers.len(),
            config.queue_capacity
        );
        Ok(pool)
    }

    pub fn add(&mut self, item: I) -> Result<(), SubmitError<I>> {
        let wrapped = Sequenced {
            sequence: self.next_sequence,
            value: item,
        };
        submit(&self.input, wrapped, self.submit_spins).map_err(|e| SubmitError(e.0.value))?;
        // номер расходуется только после успешной постановки, иначе sink
        // ждал бы пропущенный номер вечно
        self.next_sequence += 1;
        Counters::bump(&self.shared.counters.submitted);
        Ok(())
    }

    pub fn try_add(&mut self, item: I) -> Result<(), TrySubmitError<I>> {
        let wrapped = Sequenced {
            sequence: self.next_sequence,
            value: item,
        };
        try_submit(&self.input, wrapped).map_err(|e| match e {
            TrySubmitError::Full(w) => TrySubmitError::Full(w.value),
            TrySubmitError::Disconnected(w) => TrySubmitError::Disconnected(w.value),
        })?;
        self.next_sequence += 1;
        Counters::bump(&self.shared.counters.submitted);
        Ok(())
    }

    /// Остановить пул, дождавшись доставки всех элементов
    pub fn join(mut self) -> PoolMetrics {
        self.close();
        self.metrics()
    }
}

impl<I> OrderedPool<I> {
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
            log::debug!("ordered pool stopped: {:?}", self.metrics());
        }
    }
}

impl<I> Drop for OrderedPool<I> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<I: Send + 'static> Pool<I> for OrderedPool<I> {
    fn add(&mut self, item: I) -> Result<(), SubmitError<I>> {
        OrderedPool::add(self, item)
    }

    fn try_add(&mut self, item: I) -> Result<(), TrySubmitError<I>> {
        OrderedPool::try_add(self, item)
    }

    fn metrics(&self) -> PoolMetrics {
        OrderedPool::metrics(self)
    }

    fn join(self: Box<Self>) -> PoolMetrics {
        OrderedPool::join(*self)
    }
}
