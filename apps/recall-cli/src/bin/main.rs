use std::env;
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use twox_hash::XxHash64;
use walkdir::WalkDir;

use recall_core::cancel::CancelToken;
use recall_core::config::{expand_path, Config, EngineSettings};
use recall_core::predicate::Predicate;
use recall_core::traits::{EmbeddingClient, VectorIndex};
use recall_core::types::{DocOperation, Document, InteractionRecord, QueryResult, Vector};
use recall_chunk::Chunker;
use recall_index::{CachedEmbedder, IncrementalIndexer, IndexerConfig, MemoryVectorIndex};
use recall_profile::{MemoryInteractionLog, RecommendConfig, RecommendRequest, RecommendationEngine};
use recall_rank::{SearchOptions, SearchPipeline};

/// Deterministic bag-of-hashed-tokens embedder. Good enough to exercise
/// the engine end to end without a model download.
struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    fn new(dim: usize) -> Self {
        Self { dim }
    }

    fn embed_text(&self, text: &str) -> Vector {
        let mut v = vec![0f32; self.dim];
        for (i, token) in text.split_whitespace().enumerate() {
            let mut hasher = XxHash64::with_seed(0);
            token.to_lowercase().hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h as usize) % self.dim;
            let val = (((h >> 32) as u32) as f32) / (u32::MAX as f32);
            v[idx] += val + (i as f32 % 3.0) * 0.01;
        }
        let norm = (v.iter().map(|x| x * x).sum::<f32>()).sqrt().max(1e-6);
        for x in &mut v {
            *x /= norm;
        }
        v
    }
}

impl EmbeddingClient for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> recall_core::error::Result<Vec<Vector>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}

fn parse_args() -> (String, Vec<String>) {
    let mut args: Vec<String> = env::args().collect();
    let prog = args.remove(0);
    if args.is_empty() {
        eprintln!("Usage: {} <ingest|query|recommend> [args...]", prog);
        std::process::exit(1);
    }
    let cmd = args.remove(0);
    (cmd, args)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let (cmd, args) = parse_args();
    match cmd.as_str() {
        "ingest" => cmd_ingest(&config, &settings, &args),
        "query" => cmd_query(&config, &settings, &args),
        "recommend" => cmd_recommend(&config, &settings, &args),
        _ => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
    }
}

fn docs_dir(config: &Config, args: &[String]) -> PathBuf {
    args.iter()
        .find(|a| !a.starts_with('-'))
        .map(|a| expand_path(a))
        .unwrap_or_else(|| {
            let dir: String = config
                .get("data.docs_dir")
                .unwrap_or_else(|_| "./data/docs".to_string());
            expand_path(dir)
        })
}

fn flag_value<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
}

/// Read every `.txt` file under `dir` into a document. The path relative
/// to `dir` becomes the document id.
fn load_documents(dir: &Path) -> anyhow::Result<Vec<Document>> {
    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !path.is_file() || path.extension().map(|e| e != "txt").unwrap_or(true) {
            continue;
        }
        let content = fs::read_to_string(path)?;
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or_else(SystemTime::now);
        let id = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| id.clone());
        documents.push(Document {
            id,
            title,
            content,
            timestamp: DateTime::<Utc>::from(modified),
            metadata: Default::default(),
        });
    }
    documents.sort_by(|a, b| a.id.cmp(&b.id));
    Ok(documents)
}

fn build_index(
    settings: &EngineSettings,
    documents: Vec<Document>,
) -> anyhow::Result<(Arc<MemoryVectorIndex>, Arc<dyn EmbeddingClient>)> {
    let index = Arc::new(MemoryVectorIndex::new(settings.index.dimension)?);
    let embedder: Arc<dyn EmbeddingClient> = Arc::new(CachedEmbedder::new(Arc::new(
        HashingEmbedder::new(settings.index.dimension),
    )));
    let chunker = Chunker::new(settings.chunking.max_len, settings.chunking.overlap)?;
    let indexer = IncrementalIndexer::new(
        Arc::clone(&index),
        Arc::clone(&embedder),
        chunker,
        IndexerConfig { max_batch_docs: settings.indexer.max_batch_docs },
    )?;

    let pb = ProgressBar::new(documents.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} docs ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let cancel = CancelToken::new();
    let mut inserted = 0usize;
    let mut failed = 0usize;
    for doc in documents {
        let title = doc.title.clone();
        let report = indexer.apply(vec![DocOperation::Insert(doc)], &cancel);
        inserted += report.inserted;
        failed += report.failed.len();
        for failure in &report.failed {
            tracing::warn!(document_id = %failure.document_id, error = %failure.error, "document failed to index");
        }
        pb.set_message(title);
        pb.inc(1);
    }
    pb.finish_with_message("done");
    if failed > 0 {
        println!("⚠️  {} document(s) failed to index", failed);
    }
    println!("📊 Indexed {} documents", inserted);
    Ok((index, embedder))
}

fn print_results(results: &[QueryResult]) {
    for (i, result) in results.iter().enumerate() {
        println!("\n  {}. score={:.4}  id={}", i + 1, result.score, result.id);
        if let Some(title) = result.metadata.get("title").and_then(|v| v.as_str()) {
            println!("     📄 {}", title);
        }
        if let Some(preview) = result.metadata.get("preview").and_then(|v| v.as_str()) {
            println!("     📝 {}", preview);
        }
    }
}

fn cmd_ingest(config: &Config, settings: &EngineSettings, args: &[String]) -> anyhow::Result<()> {
    let dir = docs_dir(config, args);
    println!("Ingesting from {}", dir.display());
    let documents = load_documents(&dir)?;
    if documents.is_empty() {
        println!("No .txt documents found under {}", dir.display());
        return Ok(());
    }
    let (index, _) = build_index(settings, documents)?;
    println!("✅ Ingest complete ({} chunks in index)", index.len());
    Ok(())
}

fn cmd_query(config: &Config, settings: &EngineSettings, args: &[String]) -> anyhow::Result<()> {
    let query_text = args.first().cloned().unwrap_or_else(|| {
        eprintln!("Usage: recall query \"<query>\" [--dir <docs_dir>] [--top-k N]");
        std::process::exit(1)
    });
    let top_k: usize = flag_value(args, "--top-k")
        .map(str::parse)
        .transpose()?
        .unwrap_or(10);
    let dir = flag_value(args, "--dir")
        .map(expand_path)
        .unwrap_or_else(|| docs_dir(config, &[]));

    println!("🔍 recall query\n===============");
    println!("Query: {}", query_text);
    println!("Docs directory: {}", dir.display());
    let documents = load_documents(&dir)?;
    let (index, embedder) = build_index(settings, documents)?;

    let pipeline = SearchPipeline::new(index, embedder);
    let options = SearchOptions::from_settings(settings, top_k, Predicate::True);
    let results = pipeline.search(&query_text, &options, &CancelToken::new())?;

    println!("\n🔍 Found {} results for: \"{}\"", results.len(), query_text);
    print_results(&results);
    Ok(())
}

/// Interactions come from a JSON-lines file, one `InteractionRecord` per
/// line. Recommendations run over whole documents, so each document is
/// indexed as a single entry here rather than going through the chunker.
fn cmd_recommend(config: &Config, settings: &EngineSettings, args: &[String]) -> anyhow::Result<()> {
    let user_id = args.first().cloned().unwrap_or_else(|| {
        eprintln!("Usage: recall recommend <user_id> --interactions <file> [--dir <docs_dir>] [--count N]");
        std::process::exit(1)
    });
    let count: usize = flag_value(args, "--count")
        .map(str::parse)
        .transpose()?
        .unwrap_or(5);
    let dir = flag_value(args, "--dir")
        .map(expand_path)
        .unwrap_or_else(|| docs_dir(config, &[]));
    let interactions_path = flag_value(args, "--interactions")
        .map(expand_path)
        .unwrap_or_else(|| {
            let p: String = config
                .get("data.interactions_file")
                .unwrap_or_else(|_| "./data/interactions.jsonl".to_string());
            expand_path(p)
        });

    println!("✨ recall recommend\n==================");
    println!("User: {}", user_id);
    println!("Docs directory: {}", dir.display());

    let documents = load_documents(&dir)?;
    let index = Arc::new(MemoryVectorIndex::new(settings.index.dimension)?);
    let embedder = HashingEmbedder::new(settings.index.dimension);
    let entries = documents
        .iter()
        .map(|doc| recall_core::types::IndexEntry {
            id: doc.id.clone(),
            vector: embedder.embed_text(&doc.content),
            metadata: [("title".to_string(), doc.title.as_str().into())].into_iter().collect(),
            tenant_id: String::new(),
        })
        .collect();
    index.upsert(entries)?;
    println!("📊 Indexed {} documents", documents.len());

    let log = Arc::new(MemoryInteractionLog::new());
    let mut loaded = 0usize;
    if interactions_path.exists() {
        for line in fs::read_to_string(&interactions_path)?.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let record: InteractionRecord = serde_json::from_str(line)?;
            log.record(record)?;
            loaded += 1;
        }
    }
    println!("📊 Loaded {} interactions from {}", loaded, interactions_path.display());

    let engine = RecommendationEngine::new(
        index,
        log,
        RecommendConfig {
            overfetch_factor: settings.recommend.overfetch_factor,
            half_life: chrono::Duration::days(settings.recommend.half_life_days),
            trending_filter: None,
        },
    )?;
    let results = engine.recommend(
        &RecommendRequest {
            user_id: user_id.clone(),
            count,
            diversity_factor: settings.fusion.diversity_factor,
            exclude_interacted: true,
            category_filter: None,
        },
        &CancelToken::new(),
    )?;

    println!("\n✨ {} recommendation(s) for {}", results.len(), user_id);
    print_results(&results);
    Ok(())
}
