//! Tract-based local embedder (fallback for musl and Intel Mac).
//!
//! Pure-Rust path: the ONNX model is loaded with tract-onnx and texts are
//! tokenized with the tokenizers crate. Model and tokenizer are fetched into
//! the cache on first use and loaded once per [`TractEmbedder`].
#![cfg_attr(
    all(feature = "local-embeddings-fastembed", feature = "local-embeddings-tract"),
    allow(dead_code)
)]

use anyhow::{anyhow, bail, Result};
use std::path::{Path, PathBuf};
use tract_onnx::prelude::*;

use shortlist_core::embedding::Embedder;

use crate::config::EmbeddingConfig;

const ALL_MINILM_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";
const ALL_MINILM_DIMS: usize = 384;
const DEFAULT_MAX_LEN: usize = 256;

/// Model manifest: name -> (onnx path in repo, tokenizer path in repo, dims).
fn model_manifest(model_name: &str) -> Result<(&'static str, &'static str, usize)> {
    match model_name {
        "all-minilm-l6-v2" => Ok(("onnx/model.onnx", "tokenizer.json", ALL_MINILM_DIMS)),
        _ => bail!(
            "Tract backend supports only all-minilm-l6-v2 for now. Requested: '{}'",
            model_name
        ),
    }
}

fn cache_dir() -> Result<PathBuf> {
    let base = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    let dir = PathBuf::from(base)
        .join(".cache")
        .join("shortlist")
        .join("models");
    std::fs::create_dir_all(&dir).map_err(|e| anyhow!("Create cache dir: {}", e))?;
    Ok(dir)
}

fn download_to_cache(repo: &str, path: &str, cache_path: &Path) -> Result<()> {
    if cache_path.exists() {
        return Ok(());
    }
    let url = format!(
        "https://huggingface.co/{}/resolve/main/{}",
        repo,
        path.replace(' ', "%20")
    );
    tracing::info!(%url, "downloading model file");
    let bytes = reqwest::blocking::get(&url)
        .and_then(|r| r.error_for_status())
        .and_then(|r| r.bytes())
        .map_err(|e| anyhow!("Download {}: {}", url, e))?;
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| anyhow!("Create cache parent: {}", e))?;
    }
    std::fs::write(cache_path, &bytes).map_err(|e| anyhow!("Write cache: {}", e))?;
    Ok(())
}

pub struct TractEmbedder {
    model_name: String,
    dims: usize,
    batch_size: usize,
    tokenizer: tokenizers::Tokenizer,
    model: TypedRunnableModel<TypedModel>,
}

impl TractEmbedder {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let (model_name, _) = super::resolve_local_model(config);
        let (onnx_rel, tokenizer_rel, dims) = model_manifest(&model_name)?;

        let model_dir = cache_dir()?.join(&model_name);
        let onnx_path = model_dir.join(onnx_rel);
        let tokenizer_path = model_dir.join(tokenizer_rel);
        download_to_cache(ALL_MINILM_REPO, onnx_rel, &onnx_path)?;
        download_to_cache(ALL_MINILM_REPO, tokenizer_rel, &tokenizer_path)?;

        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| anyhow!("Load tokenizer: {}", e))?;
        let model = tract_onnx::onnx()
            .model_for_path(&onnx_path)
            .map_err(|e| anyhow!("Load ONNX: {}", e))?
            .into_optimized()
            .map_err(|e| anyhow!("Optimize: {}", e))?
            .into_runnable()
            .map_err(|e| anyhow!("Build tract runnable: {}", e))?;

        Ok(Self {
            model_name,
            dims,
            batch_size: config.batch_size,
            tokenizer,
            model,
        })
    }

    fn embed_chunk(&self, chunk: &[String]) -> Result<Vec<Vec<f32>>> {
        let encodings = chunk
            .iter()
            .map(|s| {
                self.tokenizer
                    .encode(s.as_str(), true)
                    .map_err(|e| anyhow!("Tokenize: {}", e))
            })
            .collect::<Result<Vec<_>>>()?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(1)
            .clamp(1, DEFAULT_MAX_LEN);

        let rows = encodings.len();
        let mut input_ids = vec![0i64; rows * max_len];
        let mut attention_mask = vec![0i64; rows * max_len];
        let token_type_ids = vec![0i64; rows * max_len];

        for (i, enc) in encodings.iter().enumerate() {
            for (j, &id) in enc.get_ids().iter().take(max_len).enumerate() {
                input_ids[i * max_len + j] = id as i64;
                attention_mask[i * max_len + j] = 1;
            }
        }

        let to_tensor = |data: Vec<i64>| -> Result<TValue> {
            let array = ndarray::Array2::from_shape_vec((rows, max_len), data)
                .map_err(|e| anyhow!("Input shape: {}", e))?;
            Ok(Tensor::from(array).into())
        };
        let result = self.model.run(tvec!(
            to_tensor(input_ids)?,
            to_tensor(attention_mask)?,
            to_tensor(token_type_ids)?
        ))?;

        let output = result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("No output tensor"))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| anyhow!("Output to array: {}", e))?;

        // [batch, dims] is a pooled sentence embedding; [batch, seq, dims] is
        // last_hidden_state and gets mean-pooled over real tokens.
        let shape = view.shape().to_vec();
        let mut out = Vec::with_capacity(rows);
        match shape.len() {
            2 => {
                for i in 0..shape[0] {
                    let row: Vec<f32> = view.slice(ndarray::s![i, ..]).iter().copied().collect();
                    out.push(normalize_l2(row));
                }
            }
            3 => {
                for (i, enc) in encodings.iter().enumerate() {
                    let valid_len = enc.get_ids().len().min(shape[1]).min(max_len);
                    let mut sum = vec![0f32; self.dims];
                    for j in 0..valid_len {
                        for (k, &v) in view.slice(ndarray::s![i, j, ..]).iter().enumerate() {
                            if k < self.dims {
                                sum[k] += v;
                            }
                        }
                    }
                    if valid_len > 0 {
                        for x in &mut sum {
                            *x /= valid_len as f32;
                        }
                    }
                    out.push(normalize_l2(sum));
                }
            }
            _ => bail!("Unexpected output shape: {:?}", shape),
        }
        Ok(out)
    }
}

impl Embedder for TractEmbedder {
    fn model_name(&self) -> &str {
        &self.model_name
    }
    fn dims(&self) -> usize {
        self.dims
    }
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut all = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            all.extend(self.embed_chunk(chunk)?);
        }
        Ok(all)
    }
}

fn normalize_l2(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-9 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}
