//! Document upload, download and deletion.
//!
//! The blob is written before the metadata row, and a failed row insert
//! removes the orphaned blob again.

use std::sync::Arc;

use tracing::{debug, warn};

use notegraph_core::{
    DeletedDocumentSummary, Document, DocumentRepository, EntityKind, Error, NewDocument,
    ResourceRepository, Result, Store,
};
use notegraph_db::{store_upload, StorageBackend};

/// An uploaded file part.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub data: Vec<u8>,
}

/// Service pairing document rows with their blobs.
#[derive(Clone)]
pub struct DocumentService {
    store: Store,
    blobs: Arc<dyn StorageBackend>,
}

impl DocumentService {
    pub fn new(store: Store, blobs: Arc<dyn StorageBackend>) -> Self {
        Self { store, blobs }
    }

    pub async fn upload(&self, type_id: i64, file: Option<Upload>) -> Result<Document> {
        if !self.store.doc_types.exists(type_id).await? {
            return Err(Error::missing_reference(EntityKind::DocType, type_id));
        }

        let stored = match &file {
            Some(upload) => {
                Some(store_upload(self.blobs.as_ref(), &upload.file_name, &upload.data).await?)
            }
            None => None,
        };
        let storage_path = stored.as_ref().map(|s| s.storage_path.clone());

        match self
            .store
            .documents
            .insert(NewDocument {
                type_id,
                file: stored,
            })
            .await
        {
            Ok(document) => {
                debug!(
                    subsystem = "api",
                    op = "upload",
                    document_id = document.id,
                    size_bytes = document.size_bytes.unwrap_or(0),
                    "Document stored"
                );
                Ok(document)
            }
            Err(e) => {
                if let Some(path) = storage_path {
                    if let Err(cleanup) = self.blobs.delete(&path).await {
                        warn!(storage_path = %path, error = %cleanup, "Failed to remove orphaned blob");
                    }
                }
                Err(e)
            }
        }
    }

    /// Fetch a document with its file content.
    pub async fn download(&self, document_id: i64) -> Result<(Document, Vec<u8>)> {
        let document = self
            .store
            .documents
            .get(document_id)
            .await?
            .ok_or_else(|| Error::not_found(EntityKind::Document, document_id))?;
        let path = document.storage_path.clone().ok_or_else(|| {
            Error::InvalidInput(format!("Document {} has no stored file", document_id))
        })?;
        let data = self.blobs.read(&path).await?;
        Ok((document, data))
    }

    /// Delete a document, its notes and their links, then release the blob.
    pub async fn delete(&self, document_id: i64) -> Result<DeletedDocumentSummary> {
        let (document, summary) = self.store.documents.delete(document_id).await?;
        if let Some(path) = document.storage_path {
            if let Err(e) = self.blobs.delete(&path).await {
                warn!(document_id, storage_path = %path, error = %e, "Blob cleanup failed");
            }
        }
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notegraph_core::DocTypeRepository;
    use notegraph_db::mock::{MemoryBlobStore, MemoryStore};

    async fn setup() -> (DocumentService, MemoryBlobStore, i64) {
        let store = MemoryStore::new().store();
        let doc_type = store.doc_types.create("pdf").await.unwrap();
        let blobs = MemoryBlobStore::new();
        (
            DocumentService::new(store, Arc::new(blobs.clone())),
            blobs,
            doc_type.id,
        )
    }

    fn upload(name: &str, data: &[u8]) -> Option<Upload> {
        Some(Upload {
            file_name: name.to_string(),
            data: data.to_vec(),
        })
    }

    #[tokio::test]
    async fn test_upload_download_delete() {
        let (service, blobs, type_id) = setup().await;
        let document = service
            .upload(type_id, upload("report.pdf", b"%PDF"))
            .await
            .unwrap();
        assert_eq!(document.file_url().as_deref(), Some("/documents/report.pdf"));
        assert_eq!(document.size_bytes, Some(4));

        let (_, data) = service.download(document.id).await.unwrap();
        assert_eq!(data, b"%PDF");

        service.delete(document.id).await.unwrap();
        assert!(blobs.is_empty());
        assert!(service.download(document.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_upload_unknown_doc_type_writes_no_blob() {
        let (service, blobs, _) = setup().await;
        let err = service.upload(42, upload("a.txt", b"a")).await.unwrap_err();
        assert_eq!(err.to_string(), "DocType with ID 42 does not exist");
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn test_download_without_file_is_invalid() {
        let (service, _, type_id) = setup().await;
        let document = service.upload(type_id, None).await.unwrap();
        assert!(document.file_url().is_none());
        let err = service.download(document.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
