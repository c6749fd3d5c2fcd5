use super::{
    errors::{panic_message, Failure, PoolError, Stage, SubmitError, TrySubmitError},
    lifecycle::Lifecycle,
    model::{Counters, PoolKind, PoolMetrics},
    ordered::OrderedPool,
    stealing::StealingPool,
    unsorted::UnsortedPool,
};
use std::{
    fmt,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    time::Duration,
};


pub type ErrorHandler = Arc<dyn Fn(Failure) + Send + Sync>;

/// Конфигурация пула
#[derive(Clone)]
pub struct Config {
    pub num_threads: usize,
    /// Вместимость входной очереди (у `StealingPool` - каждой домашней)
    pub queue_capacity: usize,
    /// Таймаут блокирующего ожидания воркеров и sink-а
    pub poll_interval: Duration,
    /// Сколько воркер ждет свою очередь, прежде чем идти к соседям
    pub steal_timeout: Duration,
    pub enable_work_stealing: bool,
    /// Сколько неблокирующих попыток делает `add`, прежде чем уснуть
    /// до освобождения места в очереди
    pub submit_spins: u32,
    /// Префикс имен потоков: `<prefix>-worker-<i>`, `<prefix>-sink`
    pub thread_name: String,
    /// Без обработчика сбои пишутся в лог
    pub on_error: Option<ErrorHandler>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_threads: num_cpus::get(),
            queue_capacity: 100,
            poll_interval: Duration::from_millis(1),
            steal_timeout: Duration::from_micros(10),
            enable_work_stealing: true,
            submit_spins: 16,
            thread_name: "fastpool".to_owned(),
            on_error: None,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("num_threads", &self.num_threads)
            .field("queue_capacity", &self.queue_capacity)
            .field("poll_interval", &self.poll_interval)
            .field("steal_timeout", &self.steal_timeout)
            .field("enable_work_stealing", &self.enable_work_stealing)
            .field("submit_spins", &self.submit_spins)
            .field("thread_name", &self.thread_name)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

impl Config {
    pub fn cpu_bound() -> Self {
        Self {
            num_threads: num_cpus::get(),
            ..Default::default()
        }
    }

    pub fn io_bound() -> Self {
        let num_cpus = num_cpus::get();
        Self {
            num_threads: num_cpus * 2,
            queue_capacity: num_cpus * 50,
            ..Default::default()
        }
    }

    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = num_threads;
        self
    }

    pub fn with_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(Failure) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    pub fn validate(&self) -> Result<(), PoolError> {
        if self.num_threads == 0 {
            return Err(PoolError::InvalidThreadCount);
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::InvalidCapacity);
        }
        Ok(())
    }
}


/// Общий интерфейс всех пулов: подача элементов и счетчики.
///
/// Запуск происходит в конструкторе, остановка - в `Drop`
/// (блокируется, пока все поданные элементы не будут обработаны).
pub trait Pool<I>: Send {
    /// Подать элемент. При заполненной очереди ждет, пока освободится место.
    fn add(&mut self, item: I) -> Result<(), SubmitError<I>>;

    /// Одна неблокирующая попытка
    fn try_add(&mut self, item: I) -> Result<(), TrySubmitError<I>>;

    fn metrics(&self) -> PoolMetrics;

    /// Остановить пул и вернуть итоговые счетчики
    fn join(self: Box<Self>) -> PoolMetrics;
}

/// Собрать двухстадийный пул выбранного вида
pub fn build<I, O, W, S>(
    kind: PoolKind,
    config: Config,
    worker: W,
    sink: S,
) -> Result<Box<dyn Pool<I>>, PoolError>
where
    I: Send + 'static,
    O: Send + 'static,
    W: Fn(I) -> O + Send + Sync + 'static,
    S: FnMut(O) + Send + 'static,
{
    let pool: Box<dyn Pool<I>> = match kind {
        PoolKind::Unsorted => Box::new(UnsortedPool::with_config(config, worker, sink)?),
        PoolKind::Ordered => Box::new(OrderedPool::with_config(config, worker, sink)?),
        PoolKind::Stealing => Box::new(StealingPool::with_config(config, worker, sink)?),
    };
    Ok(pool)
}


/// Состояние, разделяемое конструктором, воркерами и sink-ом
pub(crate) struct Shared {
    pub lifecycle: Lifecycle,
    pub counters: Counters,
    on_error: Option<ErrorHandler>,
}

pub(crate) type SharedRef = Arc<Shared>;

impl Shared {
    pub fn new(config: &Config) -> SharedRef {
        Arc::new(Self {
            lifecycle: Lifecycle::new(),
            counters: Counters::default(),
            on_error: config.on_error.clone(),
        })
    }

    /// Вызов worker-функции с перехватом паники
    #[inline]
    pub fn process<T>(&self, thread: usize, sequence: Option<u64>, f: impl FnOnce() -> T) -> Option<T> {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(out) => {
                Counters::bump(&self.counters.processed);
                Some(out)
            }
            Err(payload) => {
                self.report(Failure {
                    stage: Stage::Worker,
                    thread: Some(thread),
                    sequence,
                    message: panic_message(payload),
                });
                None
            }
        }
    }

    /// Вызов sink-функции с перехватом паники
    #[inline]
    pub fn deliver(&self, sequence: Option<u64>, f: impl FnOnce()) {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(()) => Counters::bump(&self.counters.delivered),
            Err(payload) => self.report(Failure {
                stage: Stage::Sink,
                thread: None,
                sequence,
                message: panic_message(payload),
            }),
        }
    }

    fn report(&self, failure: Failure) {
        Counters::bump(&self.counters.failed);
        let Some(handler) = &self.on_error else {
            log::error!("{failure}");
            return;
        };
        // паника обработчика не должна убить поток вместе с его очередью
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| handler(failure))) {
            log::error!("error handler panicked: {}", panic_message(payload));
        }
    }
}
