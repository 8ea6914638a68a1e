//! Fine-tuned BERT sequence classifier served with rust-bert.
//!
//! Artifact directory layout:
//! - `config.json`: BERT configuration exported with the checkpoint
//! - `rust_model.ot`: weights converted for libtorch
//! - `tokenizer.json`: tokenizer of the base model (overridable)
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use rust_bert::bert::{BertConfig, BertForSequenceClassification};
use tch::{Device, Kind, Tensor, nn, no_grad};
use tokenizers::{PaddingParams, Tokenizer, TruncationParams};
use tracing::info;

use super::{BiasModel, ModelBackend, ModelError, ModelSettings};
use crate::classification::{BiasLabel, LABEL_COUNT, LABEL_MAP};

const CONFIG_FILE: &str = "config.json";
const WEIGHTS_FILE: &str = "rust_model.ot";
const TOKENIZER_FILE: &str = "tokenizer.json";

struct Inference {
    model: BertForSequenceClassification,
    // Owns the tensors the model was built from.
    _var_store: nn::VarStore,
}

/// The libtorch forward pass is not treated as reentrant; calls are serialized
/// through one mutex while tokenization runs outside of it.
pub struct TransformerBiasModel {
    tokenizer: Tokenizer,
    inference: Mutex<Inference>,
    model_dir: PathBuf,
}

impl fmt::Debug for TransformerBiasModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformerBiasModel")
            .field("model_dir", &self.model_dir)
            .field("model", &"<BertForSequenceClassification>")
            .finish_non_exhaustive()
    }
}

impl TransformerBiasModel {
    /// Loads tokenizer, configuration, and weights. Nothing is retried.
    ///
    /// # Errors
    /// Returns [`ModelError`] if any artifact file is missing or malformed, or the
    /// checkpoint's labels disagree with the shared mapping.
    pub fn load(settings: &ModelSettings) -> Result<Self, ModelError> {
        let model_dir = settings.model_path.clone();
        let tokenizer_path = settings
            .tokenizer_path
            .clone()
            .unwrap_or_else(|| model_dir.join(TOKENIZER_FILE));
        let tokenizer = load_tokenizer(&tokenizer_path, settings.max_token_length.get())?;

        let config_path = model_dir.join(CONFIG_FILE);
        let mut config = load_config(&config_path)?;
        config.id2label = Some(reconcile_labels(config.id2label.take())?);

        let weights_path = model_dir.join(WEIGHTS_FILE);
        let mut var_store = nn::VarStore::new(Device::Cpu);
        let model = BertForSequenceClassification::new(var_store.root(), &config).map_err(
            |err| ModelError::Artifact {
                path: config_path.clone(),
                reason: err.to_string(),
            },
        )?;
        var_store
            .load(&weights_path)
            .map_err(|err| ModelError::Artifact {
                path: weights_path.clone(),
                reason: err.to_string(),
            })?;

        info!(
            model_dir = %model_dir.display(),
            tokenizer = %tokenizer_path.display(),
            "transformer bias model loaded"
        );
        Ok(Self {
            tokenizer,
            inference: Mutex::new(Inference {
                model,
                _var_store: var_store,
            }),
            model_dir,
        })
    }
}

impl BiasModel for TransformerBiasModel {
    fn backend(&self) -> ModelBackend {
        ModelBackend::Transformer
    }

    fn logits(&self, headline: &str) -> Result<[f32; LABEL_COUNT], ModelError> {
        let encoding = self
            .tokenizer
            .encode(headline, true)
            .map_err(|err| ModelError::Tokenize(err.to_string()))?;
        let input_ids = batch_of_one(encoding.get_ids());
        let attention_mask = batch_of_one(encoding.get_attention_mask());
        let token_type_ids = batch_of_one(encoding.get_type_ids());

        let output = {
            let inference = self
                .inference
                .lock()
                .map_err(|_| ModelError::Inference("model lock poisoned".to_string()))?;
            no_grad(|| {
                inference.model.forward_t(
                    Some(&input_ids),
                    Some(&attention_mask),
                    Some(&token_type_ids),
                    None,
                    None,
                    false,
                )
            })
        };

        let flat = output.logits.to_kind(Kind::Float).flatten(0, -1);
        let values =
            Vec::<f32>::try_from(&flat).map_err(|err| ModelError::Inference(err.to_string()))?;
        <[f32; LABEL_COUNT]>::try_from(values.as_slice()).map_err(|_| {
            ModelError::Inference(format!(
                "expected {LABEL_COUNT} logits, model returned {}",
                values.len()
            ))
        })
    }
}

fn batch_of_one(values: &[u32]) -> Tensor {
    let widened: Vec<i64> = values.iter().map(|&value| i64::from(value)).collect();
    Tensor::from_slice(&widened).unsqueeze(0)
}

fn load_tokenizer(path: &Path, max_length: usize) -> Result<Tokenizer, ModelError> {
    let tokenizer_error = |reason: String| ModelError::Tokenizer {
        path: path.to_path_buf(),
        reason,
    };
    let mut tokenizer = Tokenizer::from_file(path).map_err(|err| tokenizer_error(err.to_string()))?;
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            ..TruncationParams::default()
        }))
        .map_err(|err| tokenizer_error(err.to_string()))?;
    tokenizer.with_padding(Some(PaddingParams::default()));
    Ok(tokenizer)
}

fn load_config(path: &Path) -> Result<BertConfig, ModelError> {
    let raw = fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|err| ModelError::Artifact {
        path: path.to_path_buf(),
        reason: format!("failed to parse BERT config: {err}"),
    })
}

/// Checks the checkpoint's `id2label` against [`LABEL_MAP`].
///
/// Trainer checkpoints without named labels carry `LABEL_0..LABEL_2`; those are
/// accepted positionally. Named labels must match exactly. A missing table is
/// filled in from the shared mapping.
fn reconcile_labels(
    id2label: Option<HashMap<i64, String>>,
) -> Result<HashMap<i64, String>, ModelError> {
    let canonical = || {
        (0_i64..)
            .zip(LABEL_MAP)
            .map(|(index, label)| (index, label.as_str().to_string()))
            .collect::<HashMap<_, _>>()
    };
    let Some(id2label) = id2label else {
        return Ok(canonical());
    };

    if id2label.len() != LABEL_COUNT {
        return Err(ModelError::LabelMapping(format!(
            "checkpoint declares {} labels, expected {LABEL_COUNT}",
            id2label.len()
        )));
    }
    for (index, expected) in (0_i64..).zip(LABEL_MAP) {
        let declared = id2label.get(&index).ok_or_else(|| {
            ModelError::LabelMapping(format!("checkpoint has no label for index {index}"))
        })?;
        if *declared == format!("LABEL_{index}") {
            continue;
        }
        match declared.parse::<BiasLabel>() {
            Ok(label) if label == expected => {}
            _ => {
                return Err(ModelError::LabelMapping(format!(
                    "index {index} is {declared:?} in the checkpoint but {expected} at inference"
                )));
            }
        }
    }
    Ok(canonical())
}
