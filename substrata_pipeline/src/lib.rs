pub mod download_queue;
pub mod download_workers;
pub mod error;
pub mod load_item_queue;
pub mod upload_workers;

pub use download_queue::{size_factor, DownloadQueue, DownloadQueueItem};
pub use download_workers::{DownloadSink, DownloadWorkerConfig};
pub use error::PipelineError;
pub use load_item_queue::{is_out_of_range, LoadItem, LoadItemQueue, LoadTask, LoadTaskKey};
pub use upload_workers::{OutstandingUploads, ResourceToUpload, UploadSink, UploadWorkerConfig};
