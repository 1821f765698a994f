use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::analysis::{
    describe_table, numeric_column_names, ChartKind, ChartOutput, ChartSpec, TableSummary,
};
use crate::config::Config;
use crate::context::truncate_chars;
use crate::ingest::{LoadedData, TablePreview};
use crate::llm::{LLMAdapter, QueryDispatcher};
use crate::session::{SessionContext, SessionStore};
use crate::utils::retry::RetryPolicy;

const PREVIEW_ROWS: usize = 5;
const PREVIEW_TEXT_CHARS: usize = 1000;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sessions: SessionStore,
    pub dispatcher: QueryDispatcher,
}

impl AppState {
    /// Wire the dispatcher around `adapter` using the configured model and retry policy
    pub fn new(config: Config, adapter: Arc<dyn LLMAdapter>) -> Self {
        let dispatcher = QueryDispatcher::new(adapter, config.llm.model.clone())
            .with_retry_policy(RetryPolicy::with_retries(config.llm.max_retries));
        let sessions = SessionStore::new(&config.sessions);
        Self {
            config,
            sessions,
            dispatcher,
        }
    }
}

// API Request/Response types

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub created_at: String,
    pub file_name: Option<String>,
}

impl From<&SessionContext> for SessionResponse {
    fn from(session: &SessionContext) -> Self {
        Self {
            session_id: session.id,
            created_at: session.created_at.to_rfc3339(),
            file_name: session.file_name.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ColumnInfo {
    pub name: String,
    pub dtype: String,
}

/// What the Home page shows after an upload
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataPreview {
    Table {
        rows: usize,
        columns: usize,
        column_types: Vec<ColumnInfo>,
        head: TablePreview,
        summary: TableSummary,
        summary_text: String,
        /// Columns offered as chart axes
        numeric_columns: Vec<String>,
        chart_kinds: Vec<ChartKind>,
    },
    Text {
        pages: usize,
        characters: usize,
        excerpt: String,
    },
}

impl DataPreview {
    pub fn from_data(data: &LoadedData) -> Self {
        match data {
            LoadedData::Table(table) => {
                let summary = describe_table(table);
                DataPreview::Table {
                    rows: table.row_count(),
                    columns: table.column_count(),
                    column_types: table
                        .columns()
                        .iter()
                        .map(|c| ColumnInfo {
                            name: c.name.clone(),
                            dtype: c.values.dtype().to_string(),
                        })
                        .collect(),
                    head: table.head(PREVIEW_ROWS),
                    summary_text: summary.to_text(),
                    summary,
                    numeric_columns: numeric_column_names(table),
                    chart_kinds: ChartKind::ALL.to_vec(),
                }
            }
            LoadedData::Text(doc) => DataPreview::Text {
                pages: doc.page_count,
                characters: doc.text.chars().count(),
                excerpt: truncate_chars(&doc.text, PREVIEW_TEXT_CHARS).to_string(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub session_id: Uuid,
    pub file_name: String,
    pub preview: DataPreview,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub session_id: Uuid,
    pub file_name: Option<String>,
    pub preview: Option<DataPreview>,
    /// Last chart selection, so the page can restore its controls
    pub chart: Option<ChartSpec>,
}

#[derive(Debug, Serialize)]
pub struct ChartResponse {
    pub session_id: Uuid,
    #[serde(flatten)]
    pub output: ChartOutput,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<Uuid>,
    /// Characters of data context sent with the question
    pub context_chars: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub sessions: usize,
}
