//! NDJSON chunk artifact: one `{id, text, metadata}` object per line.
//!
//! This file is the hand-off between `build` and `upsert`, so the line shape
//! is fixed by [`ChunkRecord`]'s serialization. Reading is strict: a line
//! that does not parse fails the whole read with its line number.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use scheme_rag_core::models::ChunkRecord;

pub fn write_jsonl(path: &Path, chunks: &[ChunkRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create artifact: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    for chunk in chunks {
        serde_json::to_writer(&mut writer, chunk)?;
        writer.write_all(b"\n")?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write artifact: {}", path.display()))?;
    Ok(())
}

pub fn read_jsonl(path: &Path) -> Result<Vec<ChunkRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open artifact: {}", path.display()))?;

    let mut chunks = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read {}", path.display()))?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk: ChunkRecord = serde_json::from_str(&line)
            .with_context(|| format!("{}:{}: invalid chunk record", path.display(), i + 1))?;
        chunks.push(chunk);
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use scheme_rag_core::models::{ChunkMetadata, DocumentMetadata};
    use std::fs;
    use tempfile::TempDir;

    fn chunk(index: usize) -> ChunkRecord {
        ChunkRecord {
            id: format!("pm-kisan--{:04}", index),
            text: format!("Chunk {} of ₹6,000/year scheme.", index),
            metadata: ChunkMetadata {
                document: DocumentMetadata {
                    title: "PM Kisan".to_string(),
                    ministry: "Ministry of Agriculture".to_string(),
                    department: String::new(),
                },
                chunk_index: index,
                source_id: "pm-kisan".to_string(),
            },
        }
    }

    #[test]
    fn test_write_then_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/rag.jsonl");
        let chunks = vec![chunk(0), chunk(1)];
        write_jsonl(&path, &chunks).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 2);
        assert!(content.starts_with("{\"id\":\"pm-kisan--0000\",\"text\":"));
        assert!(content.ends_with("\n"));
        assert_eq!(read_jsonl(&path).unwrap(), chunks);
    }

    #[test]
    fn test_read_accepts_foreign_writer_shape() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rag.jsonl");
        fs::write(
            &path,
            "{\"id\": \"a--0000\", \"text\": \"t\", \"metadata\": {\"title\": \"A\", \"ministry\": \"\", \
             \"department\": \"\", \"chunk_index\": 0, \"source_id\": \"a\"}}\n\n",
        )
        .unwrap();
        let chunks = read_jsonl(&path).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].metadata.document.title, "A");
    }

    #[test]
    fn test_read_reports_bad_line_number() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("rag.jsonl");
        let good = serde_json::to_string(&chunk(0)).unwrap();
        fs::write(&path, format!("{}\n{{\"id\": 1}}\n", good)).unwrap();
        let err = format!("{:#}", read_jsonl(&path).unwrap_err());
        assert!(err.contains(":2: invalid chunk record"), "{}", err);
    }
}
