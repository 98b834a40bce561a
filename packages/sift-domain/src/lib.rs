mod collection;
mod conversation;
mod date;
mod error;
mod filter;
mod hash;
mod metadata;
mod passage;

pub use collection::{Collection, SearchEngine, parse_collection_filter, provider_label};
pub use conversation::{ConversationTurn, Role};
pub use date::{age_days, parse_date};
pub use error::{Error, Result};
pub use filter::{FieldFilter, FilterValue};
pub use hash::{DocumentFields, chunk_hash, document_hash};
pub use metadata::{DocumentMetadata, EmailMetadata, PassageMetadata, WebMetadata};
pub use passage::{Passage, ScoreExplain, SearchHit, SearchMode};
