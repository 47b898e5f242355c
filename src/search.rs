//! `srag search`: retrieve and print the assembled context lines.

use anyhow::{bail, Result};

use scheme_rag_core::gateway::IndexGateway;
use scheme_rag_core::retrieval::{assemble, retrieve, RetrievalOptions};

use crate::config::Config;
use crate::gateways::create_index;

pub const NO_RESULTS: &str = "No relevant context.";

/// Retrieval options with an optional `--top-k` override. The gateway-side
/// limit is raised when the override exceeds it.
pub fn options_with_top_k(config: &Config, top_k: Option<usize>) -> Result<RetrievalOptions> {
    let mut options = config.retrieval.options();
    if let Some(k) = top_k {
        if k == 0 {
            bail!("--top-k must be >= 1");
        }
        options.top_k = k;
        options.search_top_k = options.search_top_k.max(k);
    }
    Ok(options)
}

pub async fn search_context(
    index: &dyn IndexGateway,
    namespace: &str,
    query: &str,
    options: &RetrievalOptions,
) -> Result<String> {
    let response = retrieve(index, namespace, query, options).await?;
    Ok(assemble(response, options))
}

pub async fn run_search(config: &Config, query: &str, top_k: Option<usize>) -> Result<()> {
    if query.trim().is_empty() {
        println!("{}", NO_RESULTS);
        return Ok(());
    }

    let options = options_with_top_k(config, top_k)?;
    let index = create_index(config).await?;
    let context = search_context(index.as_ref(), &config.index.namespace, query, &options).await?;

    if context.is_empty() {
        println!("{}", NO_RESULTS);
    } else {
        println!("{}", context);
    }
    Ok(())
}
