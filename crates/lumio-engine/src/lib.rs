//! Lumio evaluation engine
//!
//! Answers questions about records against their schema:
//!
//! ```text
//!   Query ──► stems ──► stage chain (Collection, LinkType, Collection, ...)
//!                          │
//!                          ▼
//!              depth-first extend + pin-set + fulltext credit
//!                          │
//!                          ▼
//!              accepted documents / link instances (per stem, merged)
//! ```
//!
//! ## Modules
//!
//! - [`evaluate`]: typed views of one record (filters, equations, fulltexts)
//! - [`lock`]: attribute lock statistics and action button enablement
//! - [`permissions`]: role predicates over allowed permissions
//! - [`filter`]: the document and link filtering engine
//! - [`envelope`]: the JSON entry point used across a process boundary
//! - [`options`]: engine switches carried by the envelope and the CLI
//!
//! Every evaluation is total. Errors only exist where JSON is decoded.

pub mod envelope;
pub mod evaluate;
pub mod filter;
pub mod lock;
pub mod options;
pub mod permissions;

pub use envelope::{filter_documents_and_links_ids_from_json, EnvelopeError, FilterEnvelope, FilteredIds};
pub use evaluate::{RecordEvaluator, ResourceSchema};
pub use filter::{
    filter_documents_and_links_by_query, filter_documents_and_links_data_by_query, paginate,
    DocumentsAndLinksData, FilterInput, StemData,
};
pub use lock::{
    compute_attribute_lock_stats, is_action_button_enabled, is_attribute_editable,
    is_attribute_lock_enabled_by_stats, AttributeLockFilterStats, AttributeLockGroupStats,
    AttributeLockStats,
};
pub use options::EngineOptions;
pub use permissions::{has_role_by_permissions, is_task_assignee};
