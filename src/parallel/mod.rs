pub mod batch;
pub mod pool;

pub use batch::{batch_ranges, batches_for_current_pool, map_batches};
pub use pool::WorkerPool;
