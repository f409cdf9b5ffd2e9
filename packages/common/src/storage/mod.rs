mod error;
mod locator;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use locator::{AssetLocator, UPLOADS_ROOT};
pub use traits::{AssetStore, BoxReader};
