pub mod chat;
pub mod cli;
pub mod enrich;
pub mod jobs;
pub mod llm;
pub mod models;
pub mod rag;
pub mod server;
pub mod storage;

use cli::Args;
use enrich::retrieval::KnowledgeBaseEnricher;
use enrich::scraper::UrlContentEnricher;
use jobs::{ JobQueue, JobWorker };
use log::info;
use rag::extractor::PdfTextExtractor;
use rag::service::QdrantVectorService;
use rag::VectorService;
use server::{ AppState, Server };
use std::error::Error;
use std::sync::Arc;
use storage::FileStore;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Qdrant URL: {}", args.qdrant_url);
    info!("Upload Directory: {}", storage::UPLOAD_DIR);
    info!("Knowledge Base Collection: {}", rag::KNOWLEDGEBASE_COLLECTION);
    info!("-------------------------");

    let chat_client = llm::chat::new_client(args.openai_api_key.clone())?;
    let embedding_client = llm::embedding::new_client(
        args.openai_api_key.clone(),
        rag::EMBEDDING_DIM
    )?;
    let vector_service: Arc<dyn VectorService> = Arc::new(
        QdrantVectorService::new(&args.qdrant_url, args.qdrant_api_key.clone(), embedding_client)?
    );

    let (jobs, job_receiver) = JobQueue::new();
    let worker = JobWorker::new(Arc::new(PdfTextExtractor), Arc::clone(&vector_service));
    worker.spawn(job_receiver);

    let state = AppState {
        chat_client,
        url_enricher: Arc::new(UrlContentEnricher::new()?),
        retrieval_enricher: Arc::new(KnowledgeBaseEnricher::new(vector_service)),
        files: FileStore::new(storage::UPLOAD_DIR),
        jobs,
    };

    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, state);
    server.run().await?;

    Ok(())
}
