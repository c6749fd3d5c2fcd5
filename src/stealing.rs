use super::{
    errors::{PoolError, SubmitError, TrySubmitError},
    handle::ThreadGroup,
    lifecycle::drain_loop,
    model::{Counters, PoolMetrics},
    pool::{Config, Pool, Shared, SharedRef},
    submit::{submit, try_submit},
};
use crossbeam::channel::{bounded, unbounded, Receiver, Sender};
use std::sync::Arc;


/// Домашние очереди: воркер `i` владеет `receivers[i]`.
/// Таблица строится в конструкторе и больше не меняется.
struct HomeQueues<I> {
    receivers: Vec<Receiver<I>>,
}

impl<I> HomeQueues<I> {
    #[inline]
    fn len(&self) -> usize {
        self.receivers.len()
    }

    #[inline]
    fn home(&self, index: usize) -> &Receiver<I> {
        &self.receivers[index]
    }
}


/// Курсор кражи, свой у каждого воркера.
///
/// Обходит чужие очереди по кругу начиная с `next`; после удачной кражи
/// остается на очереди-жертве, так что следующая попытка продолжает с нее,
/// а не с фиксированного соседа.
#[derive(Debug)]
struct StealCursor {
    owner: usize,
    next: usize,
}

impl StealCursor {
    fn new(owner: usize, num_queues: usize) -> Self {
        Self {
            owner,
            next: (owner + 1) % num_queues,
        }
    }

    fn steal<I>(&mut self, queues: &HomeQueues<I>) -> Option<I> {
        let n = queues.len();
        for step in 0..n {
            let victim = (self.next + step) % n;
            if victim == self.owner {
                continue;
            }
            if let Ok(item) = queues.home(victim).try_recv() {
                log::trace!("worker {} stole from queue {victim}", self.owner);
                self.next = victim;
                return Some(item);
            }
        }
        None
    }
}


/// Пул с отдельной входной очередью на каждого воркера.
///
/// `add` раскладывает элементы по очередям по кругу; если выбранная очередь
/// полна, ждет именно ее. Простаивающий воркер забирает работу у соседей.
/// Результаты приходят в sink в порядке завершения.
pub struct StealingPool<I> {
    queues: Vec<Sender<I>>,
    cursor: usize,
    shared: SharedRef,
    workers: ThreadGroup,
    sink: ThreadGroup,
    submit_spins: u32,
}

impl<I: Send + 'static> StealingPool<I> {
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
        let (senders, receivers): (Vec<_>, Vec<_>) = (0..config.num_threads)
            .map(|_| bounded::<I>(config.queue_capacity))
            .unzip();
        let homes = Arc::new(HomeQueues { receivers });
        let (output_tx, output_rx) = unbounded::<O>();
        let shared = Shared::new(&config);
        let poll = config.poll_interval;
        let steal_timeout = config.steal_timeout;
        let stealing = config.enable_work_stealing;

        let mut pool = Self {
            queues: senders,
            cursor: 0,
            shared: shared.clone(),
            workers: ThreadGroup::new(&config.thread_name),
            sink: ThreadGroup::new(&config.thread_name),
            submit_spins: config.submit_spins,
        };

        let worker = Arc::new(worker);
        for index in 0..config.num_threads {
            let homes = homes.clone();
            let tx = output_tx.clone();
            let shared = shared.clone();
            let worker = worker.clone();
            pool.workers.spawn(&format!("worker-{index}"), move || {
                let mut cursor = StealCursor::new(index, homes.len());
                let home = homes.home(index);
                drain_loop(
                    shared.lifecycle.input(),
                    || {
                        if !stealing {
                            return home.recv_timeout(poll).ok();
                        }
                        if let Ok(item) = home.recv_timeout(steal_timeout) {
                            return Some(item);
                        }
                        let stolen = cursor.steal(&homes);
                        if stolen.is_some() {
                            Counters::bump(&shared.counters.stolen);
                        }
                        stolen
                    },
                    || home.try_recv().ok(),
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
            "stealing pool started: {} workers, capacity {} per queue, stealing {}",
            pool.workers.len(),
            config.queue_capacity,
            if stealing { "on" } else { "off" }
        );
        Ok(pool)
    }

    pub fn add(&mut self, item: I) -> Result<(), SubmitError<I>> {
        submit(&self.queues[self.cursor], item, self.submit_spins)?;
        self.advance();
        Ok(())
    }

    /// Пробует только текущую очередь; курсор сдвигается лишь при успехе
    pub fn try_add(&mut self, item: I) -> Result<(), TrySubmitError<I>> {
        try_submit(&self.queues[self.cursor], item)?;
        self.advance();
        Ok(())
    }

    /// Очередь, в которую попадет следующий элемент
    #[inline]
    pub fn next_queue(&self) -> usize {
        self.cursor
    }

    /// Остановить пул, дождавшись доставки всех элементов
    pub fn join(mut self) -> PoolMetrics {
        self.close();
        self.metrics()
    }

    #[inline]
    fn advance(&mut self) {
        self.cursor = (self.cursor + 1) % self.queues.len();
        Counters::bump(&self.shared.counters.submitted);
    }
}

impl<I> StealingPool<I> {
    #[inline]
    pub fn metrics(&self) -> PoolMetrics {
        self.shared.counters.snapshot()
    }

    fn close(&mut self) {
        let first = self.shared.lifecycle.stop_input();
        // каждый воркер дочищает свою очередь, так что ничего не теряется
        self.workers.join();
        self.shared.lifecycle.stop_output();
        self.sink.join();
        if first {
            log::debug!("stealing pool stopped: {:?}", self.metrics());
        }
    }
}

impl<I> Drop for StealingPool<I> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<I: Send + 'static> Pool<I> for StealingPool<I> {
    fn add(&mut self, item: I) -> Result<(), SubmitError<I>> {
        StealingPool::add(self, item)
    }

    fn try_add(&mut self, item: I) -> Result<(), TrySubmitError<I>> {
        StealingPool::try_add(self, item)
    }

    fn metrics(&self) -> PoolMetrics {
        StealingPool::metrics(self)
    }

    fn join(self: Box<Self>) -> PoolMetrics {
        StealingPool::join(*self)
    }
}
