// Dump handling: reading, splitting and classifying statements
pub mod filter;
pub mod loader;
pub mod plan;
pub mod splitter;


pub use filter::{classify, is_skippable, Classification, SkipReason};
pub use loader::load_dump;
pub use plan::{plan, ImportPlan, PlannedStatement};
pub use splitter::{split, split_lexical, split_script};
