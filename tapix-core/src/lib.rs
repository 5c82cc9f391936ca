//! tapix-core: transaction aggregation, context assembly and response dispatch
//! for the Tapix spending assistant

pub mod context;
pub mod conversation;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod offline;
pub mod period;
pub mod prompts;
pub mod session;
pub mod summary;
pub mod transaction;

pub use context::{ChatContext, RECENT_LIMIT, RecentTransaction};
pub use conversation::{Conversation, ConversationMessage, Role};
pub use dispatch::{ChatBackend, CompletionRequest, GenerationOptions, build_messages, respond};
pub use error::{LlmError, LlmResult};
pub use format::format_money;
pub use offline::OfflineBackend;
pub use period::Period;
pub use prompts::{GREETING, MISSING_CREDENTIAL_ADVISORY, SUGGESTED_QUESTIONS, SYSTEM_PROMPT};
pub use session::{QuickStats, Session};
pub use summary::{
    CategoryTotal, NO_DATA, PeriodSummary, Recurring, categories, latest_period, merchant_totals,
    recent, recurring_merchants, summarize,
};
pub use transaction::{Transaction, UNCATEGORIZED};
