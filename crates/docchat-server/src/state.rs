use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::Mutex;
use uuid::Uuid;

use docchat_core::memory::ConversationMemory;
use docchat_core::store::DocumentStore;
use docchat_model::backend::{BackendKind, ChatBackend};
use docchat_model::groq::GroqClient;
use docchat_model::ollama::OllamaClient;

use crate::config::Config;
use crate::error::ApiError;

/// Shared application state, injected into all route handlers via
/// Axum state. All of it is process-local and lost on restart.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub backends: Arc<Backends>,
    pub documents: Arc<DocumentStore>,
    pub memory: Arc<ConversationMemory>,
    pub locks: Arc<ConversationLocks>,
}

impl AppState {
    /// Build the state for production use: backend clients are
    /// constructed once, here, from configuration.
    pub fn new(config: Config) -> eyre::Result<Self> {
        let backends = Backends::from_config(&config)?;
        Ok(Self::with_backends(config, backends))
    }

    pub fn with_backends(config: Config, backends: Backends) -> Self {
        Self {
            memory: Arc::new(ConversationMemory::new(config.memory_enabled)),
            documents: Arc::new(DocumentStore::new()),
            locks: Arc::new(ConversationLocks::default()),
            backends: Arc::new(backends),
            config: Arc::new(config),
        }
    }
}

/// The chat backends available to this process. The default comes
/// from configuration; a request may name the other explicitly.
pub struct Backends {
    default: BackendKind,
    groq: Option<Arc<dyn ChatBackend>>,
    ollama: Option<Arc<dyn ChatBackend>>,
}

impl Backends {
    pub fn from_config(config: &Config) -> Result<Self, docchat_model::error::ModelError> {
        let groq = match &config.groq_api_key {
            Some(key) => Some(Arc::new(GroqClient::new(
                key,
                &config.groq_base_url,
                &config.groq_model,
            )?) as Arc<dyn ChatBackend>),
            None => None,
        };
        let ollama = Some(Arc::new(OllamaClient::new(
            &config.ollama_base_url,
            &config.ollama_model,
        )?) as Arc<dyn ChatBackend>);

        Ok(Self {
            default: config.backend,
            groq,
            ollama,
        })
    }

    /// A registry with a single backend serving a given kind.
    pub fn single(kind: BackendKind, backend: Arc<dyn ChatBackend>) -> Self {
        let (groq, ollama) = match kind {
            BackendKind::Groq => (Some(backend), None),
            BackendKind::Ollama => (None, Some(backend)),
        };
        Self {
            default: kind,
            groq,
            ollama,
        }
    }

    /// Resolve the backend for one request: the explicit override if
    /// given, the configured default otherwise.
    pub fn select(&self, requested: Option<BackendKind>) -> Result<Arc<dyn ChatBackend>, ApiError> {
        let kind = requested.unwrap_or(self.default);
        let backend = match kind {
            BackendKind::Groq => self.groq.as_ref(),
            BackendKind::Ollama => self.ollama.as_ref(),
        };
        backend.cloned().ok_or_else(|| {
            ApiError::BadRequest(format!("backend {} is not configured", kind.as_str()))
        })
    }
}

/// One async mutex per conversation, so concurrent chat requests for
/// the same conversation run in sequence and cannot interleave their
/// memory appends. Entries are never reclaimed, which is in line with
/// the rest of the per-conversation state.
#[derive(Default)]
pub struct ConversationLocks {
    inner: StdMutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl ConversationLocks {
    pub fn for_conversation(&self, conversation_id: Uuid) -> Arc<Mutex<()>> {
        let mut map = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        map.entry(conversation_id).or_default().clone()
    }
}
