use std::io::Cursor;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use super::locator::AssetLocator;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Locator-addressed asset storage.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store bytes at the given locator, replacing any previous content.
    async fn put(&self, locator: &AssetLocator, data: &[u8]) -> Result<u64, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(locator, reader).await
    }

    /// Store data from an async reader and return the number of bytes written.
    async fn put_stream(
        &self,
        locator: &AssetLocator,
        reader: BoxReader,
    ) -> Result<u64, StorageError>;

    /// Retrieve all bytes for an asset.
    async fn get(&self, locator: &AssetLocator) -> Result<Vec<u8>, StorageError> {
        let mut reader = self.get_stream(locator).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Retrieve an asset as a streaming async reader.
    async fn get_stream(&self, locator: &AssetLocator) -> Result<BoxReader, StorageError>;

    /// Check whether an asset exists.
    async fn exists(&self, locator: &AssetLocator) -> Result<bool, StorageError>;

    /// Delete an asset.
    ///
    /// Returns `true` if the asset was deleted, `false` if it did not exist.
    async fn delete(&self, locator: &AssetLocator) -> Result<bool, StorageError>;

    /// Get the size of an asset in bytes.
    async fn size(&self, locator: &AssetLocator) -> Result<u64, StorageError>;
}
