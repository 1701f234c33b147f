pub mod object_uploader;
pub mod state;
pub mod table_uploader;

pub use object_uploader::ObjectUploader;
pub use state::{StateTracker, UploadState};
pub use table_uploader::TableUploader;
