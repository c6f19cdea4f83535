use log::{ error, info };
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{ self, UnboundedReceiver, UnboundedSender };

use crate::rag::{
    TextExtractor,
    VectorService,
    EMBEDDING_DIM,
    INDEX_CHUNK_SIZE,
    KNOWLEDGEBASE_COLLECTION,
};

/// Work scheduled by the upload path. Jobs run after the HTTP response has
/// gone out; nothing reports their outcome back to the uploader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundJob {
    ExtractText {
        input_path: PathBuf,
    },
    IndexContent {
        input_path: PathBuf,
    },
}

#[derive(Clone)]
pub struct JobQueue {
    sender: UnboundedSender<BackgroundJob>,
}

impl JobQueue {
    /// Builds the queue half only; the caller owns the receiver, which is
    /// what the worker (or a test) drains.
    pub fn new() -> (Self, UnboundedReceiver<BackgroundJob>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Schedules a job and returns immediately.
    pub fn submit(&self, job: BackgroundJob) {
        if let Err(err) = self.sender.send(job) {
            error!("Dropping background job, the worker is gone: {}", err);
        }
    }
}

pub struct JobWorker {
    extractor: Arc<dyn TextExtractor>,
    vector_service: Arc<dyn VectorService>,
}

impl JobWorker {
    pub fn new(extractor: Arc<dyn TextExtractor>, vector_service: Arc<dyn VectorService>) -> Self {
        Self { extractor, vector_service }
    }

    /// Drains the queue, launching each job on its own task. Jobs leave the
    /// queue in submission order but execute concurrently, so one job never
    /// waits for an earlier one to finish.
    pub fn spawn(self, mut receiver: UnboundedReceiver<BackgroundJob>) {
        tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let extractor = Arc::clone(&self.extractor);
                let vector_service = Arc::clone(&self.vector_service);
                tokio::spawn(async move {
                    run_job(job, extractor, vector_service).await;
                });
            }
            info!("Job queue closed");
        });
    }
}

async fn run_job(
    job: BackgroundJob,
    extractor: Arc<dyn TextExtractor>,
    vector_service: Arc<dyn VectorService>
) {
    match job {
        BackgroundJob::ExtractText { input_path } => {
            info!("Extracting text from {}", input_path.display());
            if let Err(err) = extractor.extract(&input_path).await {
                error!("Text extraction for {} failed: {}", input_path.display(), err);
            }
        }
        BackgroundJob::IndexContent { input_path } => {
            info!("Indexing content from {}", input_path.display());
            let stored = vector_service.store_file_content(
                &input_path,
                INDEX_CHUNK_SIZE,
                KNOWLEDGEBASE_COLLECTION,
                EMBEDDING_DIM
            ).await;
            if let Err(err) = stored {
                error!("Indexing for {} failed: {}", input_path.display(), err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::rag::ScoredPassage;
    use std::error::Error as StdError;
    use std::path::Path;
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedSender as Tx;

    struct RecordingExtractor {
        calls: Tx<PathBuf>,
    }

    #[async_trait]
    impl TextExtractor for RecordingExtractor {
        async fn extract(
            &self,
            file_path: &Path
        ) -> Result<PathBuf, Box<dyn StdError + Send + Sync>> {
            let _ = self.calls.send(file_path.to_path_buf());
            Ok(file_path.with_extension("text"))
        }
    }

    struct RecordingStore {
        calls: Tx<(PathBuf, usize, String, u64)>,
    }

    #[async_trait]
    impl VectorService for RecordingStore {
        async fn store_file_content(
            &self,
            text_path: &Path,
            chunk_size: usize,
            collection: &str,
            embedding_dim: u64
        ) -> Result<(), Box<dyn StdError + Send + Sync>> {
            let _ = self.calls.send((
                text_path.to_path_buf(),
                chunk_size,
                collection.to_string(),
                embedding_dim,
            ));
            Ok(())
        }

        async fn search(
            &self,
            _query: &str,
            _collection: &str,
            _limit: usize
        ) -> Result<Vec<ScoredPassage>, Box<dyn StdError + Send + Sync>> {
            Ok(Vec::new())
        }
    }

    struct FailingExtractor;

    #[async_trait]
    impl TextExtractor for FailingExtractor {
        async fn extract(
            &self,
            _file_path: &Path
        ) -> Result<PathBuf, Box<dyn StdError + Send + Sync>> {
            Err("no text layer".into())
        }
    }

    #[tokio::test]
    async fn submitted_jobs_arrive_in_order() {
        let (queue, mut receiver) = JobQueue::new();
        queue.submit(BackgroundJob::ExtractText { input_path: "uploads/a.pdf".into() });
        queue.submit(BackgroundJob::IndexContent { input_path: "uploads/a.text".into() });

        assert_eq!(
            receiver.try_recv().unwrap(),
            BackgroundJob::ExtractText { input_path: "uploads/a.pdf".into() }
        );
        assert_eq!(
            receiver.try_recv().unwrap(),
            BackgroundJob::IndexContent { input_path: "uploads/a.text".into() }
        );
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test]
    async fn worker_runs_extraction_jobs() {
        let (calls_tx, mut calls_rx) = mpsc::unbounded_channel();
        let (queue, receiver) = JobQueue::new();
        let worker = JobWorker::new(
            Arc::new(RecordingExtractor { calls: calls_tx }),
            Arc::new(RecordingStore { calls: mpsc::unbounded_channel().0 })
        );
        worker.spawn(receiver);

        queue.submit(BackgroundJob::ExtractText { input_path: "uploads/doc.pdf".into() });

        let extracted = tokio::time
            ::timeout(Duration::from_secs(1), calls_rx.recv()).await
            .unwrap()
            .unwrap();
        assert_eq!(extracted, PathBuf::from("uploads/doc.pdf"));
    }

    #[tokio::test]
    async fn worker_indexes_with_the_knowledgebase_settings() {
        let (calls_tx, mut calls_rx) = mpsc::unbounded_channel();
        let (queue, receiver) = JobQueue::new();
        let worker = JobWorker::new(
            Arc::new(RecordingExtractor { calls: mpsc::unbounded_channel().0 }),
            Arc::new(RecordingStore { calls: calls_tx })
        );
        worker.spawn(receiver);

        queue.submit(BackgroundJob::IndexContent { input_path: "uploads/doc.text".into() });

        let (path, chunk_size, collection, dim) = tokio::time
            ::timeout(Duration::from_secs(1), calls_rx.recv()).await
            .unwrap()
            .unwrap();
        assert_eq!(path, PathBuf::from("uploads/doc.text"));
        assert_eq!(chunk_size, INDEX_CHUNK_SIZE);
        assert_eq!(collection, KNOWLEDGEBASE_COLLECTION);
        assert_eq!(dim, EMBEDDING_DIM);
    }

    #[tokio::test]
    async fn worker_keeps_draining_after_a_failed_job() {
        let (calls_tx, mut calls_rx) = mpsc::unbounded_channel();
        let (queue, receiver) = JobQueue::new();
        let worker = JobWorker::new(
            Arc::new(FailingExtractor),
            Arc::new(RecordingStore { calls: calls_tx })
        );
        worker.spawn(receiver);

        queue.submit(BackgroundJob::ExtractText { input_path: "uploads/broken.pdf".into() });
        queue.submit(BackgroundJob::IndexContent { input_path: "uploads/broken.text".into() });

        let (path, _, _, _) = tokio::time
            ::timeout(Duration::from_secs(1), calls_rx.recv()).await
            .unwrap()
            .unwrap();
        assert_eq!(path, PathBuf::from("uploads/broken.text"));
    }
}
