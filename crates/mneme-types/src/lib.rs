// crates/mneme-types/src/lib.rs
// Shared types for mneme
// No native-only dependencies allowed here

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ═══════════════════════════════════════
// BACKEND SELECTION
// ═══════════════════════════════════════

/// A memory backend that can actually be constructed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local vector store with embeddings from a local Ollama server
    LocalVectorStore,
    /// Local vector store with embeddings from the OpenAI API
    RemoteOpenAi,
}

impl BackendKind {
    /// Every constructable backend, in display order
    pub const ALL: [BackendKind; 2] = [BackendKind::RemoteOpenAi, BackendKind::LocalVectorStore];

    /// Canonical `platform` value that selects this backend
    pub fn platform_id(&self) -> &'static str {
        match self {
            Self::LocalVectorStore => "Ollama",
            Self::RemoteOpenAi => "OpenAI",
        }
    }

    /// Match a `platform` value against the canonical identifiers.
    ///
    /// Case-insensitive, surrounding whitespace ignored.
    pub fn from_platform_id(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.platform_id().eq_ignore_ascii_case(s))
    }

    /// Short id used for file names and store stamps
    pub fn slug(&self) -> &'static str {
        match self {
            Self::LocalVectorStore => "local",
            Self::RemoteOpenAi => "openai",
        }
    }

    /// Comma-separated list of accepted `platform` values, for messages
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|k| k.platform_id())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

/// Outcome of backend selection for one configuration snapshot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "identifier", rename_all = "snake_case")]
pub enum BackendChoice {
    /// No configuration, or no platform set yet
    Unset,
    LocalVectorStore,
    RemoteOpenAi,
    /// The platform names something we cannot back memory with
    Unsupported(String),
}

impl BackendChoice {
    /// The constructable backend behind this choice, if any
    pub fn backend(&self) -> Option<BackendKind> {
        match self {
            Self::LocalVectorStore => Some(BackendKind::LocalVectorStore),
            Self::RemoteOpenAi => Some(BackendKind::RemoteOpenAi),
            Self::Unset | Self::Unsupported(_) => None,
        }
    }

    pub fn is_unset(&self) -> bool {
        matches!(self, Self::Unset)
    }
}

impl From<BackendKind> for BackendChoice {
    fn from(kind: BackendKind) -> Self {
        match kind {
            BackendKind::LocalVectorStore => Self::LocalVectorStore,
            BackendKind::RemoteOpenAi => Self::RemoteOpenAi,
        }
    }
}

impl fmt::Display for BackendChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => write!(f, "unset"),
            Self::LocalVectorStore => write!(f, "local"),
            Self::RemoteOpenAi => write!(f, "openai"),
            Self::Unsupported(id) => write!(f, "unsupported({})", id),
        }
    }
}

// ═══════════════════════════════════════
// MEMORY RECORDS
// ═══════════════════════════════════════

/// A stored memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: i64,
    pub content: String,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    pub created_at: String,
}

/// A memory returned by semantic recall
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecallHit {
    pub record: MemoryRecord,
    /// Similarity in [0, 1], higher is closer
    pub score: f32,
}

// ═══════════════════════════════════════
// STATUS REPORTING
// ═══════════════════════════════════════

/// Summary of one memory initialization attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MemoryStatus {
    Ready {
        backend: BackendKind,
        model: String,
        records: u64,
    },
    Deferred {
        reason: String,
    },
    Unsupported {
        identifier: String,
    },
    Degraded {
        backend: BackendKind,
        reason: String,
    },
}

impl MemoryStatus {
    /// Whether memory can be used in this session
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

impl fmt::Display for MemoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready {
                backend,
                model,
                records,
            } => write!(
                f,
                "ready: {} backend ({}), {} memories",
                backend, model, records
            ),
            Self::Deferred { reason } => write!(f, "deferred: {}", reason),
            Self::Unsupported { identifier } => write!(
                f,
                "unsupported platform '{}' (supported: {})",
                identifier,
                BackendKind::supported_list()
            ),
            Self::Degraded { backend, reason } => {
                write!(f, "degraded: {} backend unavailable: {}", backend, reason)
            }
        }
    }
}
