//! Пулы потоков для конвейера "один производитель -> N воркеров -> один потребитель"
//!
//! # Features
//! - `UnsortedPool`: результаты в порядке завершения
//! - `OrderedPool`: результаты строго в порядке подачи
//! - `StealingPool`: очередь на каждого воркера и кража работы у соседей
//! - `OneWayPool`: только воркеры, без выходной стадии
//! - Ограниченные очереди с backpressure, двухфазное завершение без потерь
//! - Перехват паник в пользовательских функциях и счетчики
//!
//! ```
//! use fastpool::OrderedPool;
//! use std::sync::{Arc, Mutex};
//!
//! let out = Arc::new(Mutex::new(Vec::new()));
//! let sink = out.clone();
//! let mut pool = OrderedPool::new(4, |x: u32| x * 2, move |x| sink.lock().unwrap().push(x)).unwrap();
//! for i in 0..100 {
//!     pool.add(i).unwrap();
//! }
//! drop(pool);
//! assert_eq!(*out.lock().unwrap(), (0..100).map(|x| x * 2).collect::<Vec<_>>());
//! ```

pub mod errors;
mod handle;
mod lifecycle;
pub mod model;
pub mod one_way;
pub mod ordered;
pub mod pool;
pub mod reorder;
pub mod stealing;
mod submit;
pub mod unsorted;

pub use errors::{Failure, PoolError, Stage, SubmitError, TrySubmitError};
pub use model::{PoolKind, PoolMetrics};
pub use one_way::OneWayPool;
pub use ordered::{OrderedPool, Sequenced};
pub use pool::{build, Config, ErrorHandler, Pool};
pub use reorder::ReorderBuffer;
pub use stealing::StealingPool;
pub use unsorted::UnsortedPool;
