//! URL format templates.
//!
//! | Part | Role |
//! |---|---|
//! | [`tokens`](split_tokens) | `{name}` scanning shared by every format string |
//! | [`Placeholder`] | The six placeholders a URL format may use |
//! | [`CompiledTemplate`] | Format → anchored regex + placeholder group map |
//! | [`TemplateCache`] | Memoizes compilation per distinct configuration |

mod cache;
mod compiler;
mod placeholder;
mod tokens;

pub use cache::{CacheStats, TemplateCache};
pub use compiler::{
    CompiledTemplate, FILTERS_SEGMENT_GROUP, Segment, Template, TemplateError, TemplateMatch,
};
pub use placeholder::Placeholder;
pub use tokens::{Piece, count_tokens, split_tokens};
