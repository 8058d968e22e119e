pub mod error;
pub mod indexed_heap;
pub mod min_queue;
pub mod trace;
pub mod utils;

pub use error::QueueError;
pub use indexed_heap::IndexedMinQueue;
pub use min_queue::MinQueue;
