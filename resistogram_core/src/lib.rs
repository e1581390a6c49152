//! `resistogram_core` resolves `%%RESIST ...%%` directives in markdown
//! documents into the data an antibiotic resistance table needs: which
//! antibiotics and organisms to show, which data source to read, and the
//! resistance rows of that source merged with everything it inherits.
//!
//! ## Processing Pipeline
//!
//! ```text
//! CSV reference tables
//!   → Records (typed antibiotics, organisms, classes, groups, sources)
//!   → Reference index (synonym maps with class/group expansion, ranks)
//!   → Directive parser (finds directives, lexes parameters, extracts page text)
//!   → Resolver (tokens, `all`, `auto` → canonical ids + unresolved tokens)
//!   → Source selector (hint → best source in the source forest)
//!   → Merger (ancestor chain → effective resistance rows)
//! ```
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading from `resistogram.toml`.
//! - [`records`]: Typed reference records built from raw table rows.
//! - [`tables`]: CSV loading and the per-file resistance row cache.
//! - [`synonyms`]: Synonym maps, class ranks and membership expansion.
//! - [`matcher`]: Word-boundary-safe synonym matching for `auto`.
//! - [`resolver`]: Request token resolution.
//! - [`sources`]: Source forest traversal and source selection.
//! - [`merge`]: Overlaying resistance rows along an ancestor chain.
//! - [`directive`]: Directive and page text extraction from markdown.
//! - [`project`]: Document discovery.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use resistogram_core::ReferenceData;
//! use resistogram_core::ResistConfig;
//!
//! let root = Path::new(".");
//! let config = ResistConfig::load_or_default(root).unwrap();
//! let data = ReferenceData::load(&config, root).unwrap();
//!
//! let page = "Amoxicillin is often used.\n\n%%RESIST abx=auto org=E_COLI source=2023%%\n";
//! for resolution in data.resolve_document(page).unwrap() {
//!     println!("{:?} from {:?}", resolution.antibiotic_ids, resolution.data_source_id);
//!     let rows = data.table_rows(&resolution);
//!     println!("{} rows", rows.len());
//! }
//! ```

pub use config::*;
pub use engine::*;
pub use error::*;
pub use lexer::DirectiveParams;
pub use lexer::parse_params;

pub mod config;
pub mod directive;
mod engine;
#[allow(unused_assignments)]
mod error;
pub(crate) mod lexer;
pub mod matcher;
pub mod merge;
pub mod project;
pub mod records;
pub mod resolver;
pub mod sources;
pub mod synonyms;
pub mod tables;

#[cfg(test)]
mod __fixtures;
