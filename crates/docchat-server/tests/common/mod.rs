#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use docchat_core::prompt::Prompt;
use docchat_model::backend::{BackendKind, ChatBackend, TokenStream};
use docchat_model::error::ModelError;
use docchat_server::config::Config;
use docchat_server::state::{AppState, Backends};

/// Deterministic chat backend: answers with scripted fragments and
/// records every prompt it is invoked with.
pub struct ScriptedBackend {
    fragments: Vec<String>,
    fail_stream_after: Option<usize>,
    fail_invocation: bool,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedBackend {
    pub fn answering(fragments: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            fail_stream_after: None,
            fail_invocation: false,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Fails every invocation before producing any output.
    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fragments: Vec::new(),
            fail_stream_after: None,
            fail_invocation: true,
            prompts: Mutex::new(Vec::new()),
        })
    }

    /// Streams `after` fragments, then fails terminally.
    pub fn failing_mid_stream(fragments: &[&str], after: usize) -> Arc<Self> {
        Arc::new(Self {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            fail_stream_after: Some(after),
            fail_invocation: false,
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn recorded_prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, prompt: &Prompt) -> Result<String, ModelError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        if self.fail_invocation {
            return Err(ModelError::Invocation("scripted failure".to_string()));
        }
        Ok(self.fragments.concat())
    }

    async fn stream(&self, prompt: &Prompt) -> Result<TokenStream, ModelError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        if self.fail_invocation {
            return Err(ModelError::Invocation("scripted failure".to_string()));
        }

        let mut items: Vec<Result<String, ModelError>> = Vec::new();
        for (index, fragment) in self.fragments.iter().enumerate() {
            if Some(index) == self.fail_stream_after {
                items.push(Err(ModelError::Stream("scripted interruption".to_string())));
                break;
            }
            items.push(Ok(fragment.clone()));
        }

        Ok(Box::pin(futures::stream::iter(items)))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Assemble a one-page PDF whose content stream draws `text` with the
/// built-in Helvetica font. Object offsets for the xref table are
/// computed while the body is written, so the file is well-formed
/// regardless of the text's length.
pub fn minimal_pdf(text: &str) -> Vec<u8> {
    let content = format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET");
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 5 0 R >> >> /Contents 4 0 R >>"
            .to_string(),
        format!("<< /Length {} >>\nstream\n{content}\nendstream", content.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
    ];

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", index + 1).as_bytes());
    }

    let xref_offset = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

pub fn test_config(stream_responses: bool, memory_enabled: bool) -> Config {
    Config {
        backend: BackendKind::Ollama,
        port: 0,
        stream_responses,
        memory_enabled,
        max_document_chars: 100_000,
        max_upload_bytes: 10 * 1024 * 1024,
        groq_api_key: None,
        groq_base_url: "https://api.groq.com/openai/v1".to_string(),
        groq_model: "llama-3.3-70b-versatile".to_string(),
        ollama_base_url: "http://localhost:11434".to_string(),
        ollama_model: "llama3".to_string(),
    }
}

pub fn test_state(
    backend: Arc<ScriptedBackend>,
    stream_responses: bool,
    memory_enabled: bool,
) -> AppState {
    AppState::with_backends(
        test_config(stream_responses, memory_enabled),
        Backends::single(BackendKind::Ollama, backend),
    )
}
