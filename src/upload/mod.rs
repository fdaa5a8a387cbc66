mod http;
mod lifecycle;
mod task;
#[cfg(test)]
pub(crate) mod testing;

pub use http::HttpTransport;
pub use lifecycle::{LifecycleState, LifecycleUpdate, UploadLifecycle};
pub use task::{TaskEvent, UploadTask, UploadTransport};
