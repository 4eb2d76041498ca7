//! Record extraction
//!
//! Site behaviour is data: a [`SiteProfile`] lists container strategies,
//! per-field fallback chains and enrichments. It is compiled once into a
//! [`CompiledProfile`], which interprets HTML pages into [`Record`]s.

mod compile;
mod dates;
mod engine;
mod profile;
mod record;

pub use compile::CompiledProfile;
pub use dates::{normalize_date, DATE_FORMAT};
pub use engine::ParsedPage;
pub use profile::{
    Candidate, Enrichment, FieldRule, FollowRules, PageRules, SiteProfile, SubPage, Tally,
    TermAlias, Transform, Traversal,
};
pub use record::Record;
