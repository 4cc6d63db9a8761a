use crate::error::BlobResult;
use crate::gateway::BlobStore;
use bewell_files::FilesService;

impl BlobStore for FilesService {
    fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> BlobResult<()> {
        let meta = FilesService::upload(self, path, bytes, content_type)?;
        tracing::debug!(
            "stored blob {} ({} bytes, sha256 {})",
            meta.relative_path,
            meta.size_bytes,
            meta.sha256
        );
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        FilesService::public_url(self, path)
    }
}
