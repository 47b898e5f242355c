//! Gateway construction from configuration.
//!
//! | `index.provider` | Gateway |
//! |------------------|---------|
//! | `"pinecone"` | [`PineconeIndex`] |
//! | `"memory"` | [`InMemoryIndex`] preloaded from `index.artifact` |
//!
//! | `inference.provider` | Backend |
//! |----------------------|---------|
//! | `"ollama"` | [`OllamaBackend`] |
//! | `"disabled"` | none; commands that need generation fail |

use anyhow::{bail, Context, Result};

use scheme_rag_core::gateway::memory::InMemoryIndex;
use scheme_rag_core::gateway::{upsert_batched, IndexGateway, InferenceBackend, MAX_UPSERT_BATCH};
use scheme_rag_core::models::IndexRecord;

use crate::artifact::read_jsonl;
use crate::config::{Config, InferenceConfig};
use crate::ollama::OllamaBackend;
use crate::pinecone::PineconeIndex;

pub async fn create_index(config: &Config) -> Result<Box<dyn IndexGateway>> {
    match config.index.provider.as_str() {
        "pinecone" => Ok(Box::new(PineconeIndex::new(&config.index)?)),
        "memory" => Ok(Box::new(load_memory_index(config).await?)),
        other => bail!("Unknown index provider: {}", other),
    }
}

/// In-memory index holding every chunk of the configured artifact.
pub async fn load_memory_index(config: &Config) -> Result<InMemoryIndex> {
    let path = &config.index.artifact;
    let chunks = read_jsonl(path)
        .with_context(|| format!("memory index needs a built artifact at {}", path.display()))?;
    let records: Vec<IndexRecord> = chunks.iter().map(IndexRecord::from).collect();

    let index = InMemoryIndex::new();
    upsert_batched(
        &index,
        &config.index.namespace,
        &records,
        MAX_UPSERT_BATCH,
        |_, _| {},
    )
    .await?;
    tracing::debug!(records = records.len(), path = %path.display(), "loaded memory index");
    Ok(index)
}

pub fn create_backend(config: &InferenceConfig) -> Result<Box<dyn InferenceBackend>> {
    match config.provider.as_str() {
        "ollama" => Ok(Box::new(OllamaBackend::new(config)?)),
        "disabled" => bail!("Inference is disabled (inference.provider = \"disabled\")"),
        other => bail!("Unknown inference provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::write_jsonl;
    use scheme_rag_core::models::{ChunkMetadata, ChunkRecord, DocumentMetadata};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_memory_provider_loads_artifact() {
        let tmp = TempDir::new().unwrap();
        let artifact = tmp.path().join("rag.jsonl");
        let chunks: Vec<ChunkRecord> = (0..150)
            .map(|i| ChunkRecord {
                id: format!("s--{:04}", i),
                text: format!("<p>Scheme chunk {}</p>", i),
                metadata: ChunkMetadata {
                    document: DocumentMetadata::default(),
                    chunk_index: i,
                    source_id: "s".to_string(),
                },
            })
            .collect();
        write_jsonl(&artifact, &chunks).unwrap();

        let mut config = Config::minimal();
        config.index.provider = "memory".to_string();
        config.index.artifact = artifact;

        let index = load_memory_index(&config).await.unwrap();
        assert_eq!(index.len("schemes-v1"), 150);

        let response = index.search("schemes-v1", "chunk 7", 1).await.unwrap();
        let fields = response.hits()[0].fields.clone().unwrap();
        assert_eq!(fields["chunk_text"], "Scheme chunk 7");
    }

    #[tokio::test]
    async fn test_memory_provider_without_artifact_fails() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::minimal();
        config.index.provider = "memory".to_string();
        config.index.artifact = tmp.path().join("missing.jsonl");
        let err = create_index(&config).await.err().unwrap();
        assert!(format!("{:#}", err).contains("built artifact"));
    }

    #[test]
    fn test_disabled_backend_is_an_error() {
        let config = InferenceConfig {
            provider: "disabled".to_string(),
            ..Default::default()
        };
        assert!(create_backend(&config).is_err());
        assert!(create_backend(&InferenceConfig::default()).is_ok());
    }
}
