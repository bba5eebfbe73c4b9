//! # Quire Model
//!
//! Schema, immutable document tree and position addressing for the Quire
//! article editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ model: schema + immutable tree              │
//! │  - NodeKind / MarkKind specs                │
//! │  - Node, Fragment, Mark, Slice              │
//! │  - ResolvedPos (integer → tree path)        │
//! │  - replace algorithm, JSON form             │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ transform: steps, mapping, structure ops    │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ state → commands → editor                   │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Immutable nodes**: every edit produces a new tree sharing unchanged subtrees
//! 2. **Integer positions**: one flat token stream addresses the whole tree
//! 3. **Schema first**: a replace that would break a content expression fails
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_model::{doc_from_json_or_default, Node};
//!
//! let doc = doc_from_json_or_default(Some(&stored));
//! let pos = doc.resolve(3)?;
//! println!("{} at depth {}", pos.parent().kind().name(), pos.depth());
//! ```

mod attrs;
pub mod builders;
mod error;
mod fragment;
mod json;
mod mark;
mod node;
mod replace;
mod resolved;
mod schema;
mod slice;

pub use attrs::Attrs;
pub use error::{ModelError, ModelResult};
pub use fragment::Fragment;
pub use json::{doc_from_json_or_default, MarkJson, NodeJson};
pub use mark::{find_mark, normalize_set, same_set, Mark};
pub use node::{content_valid, Node};
pub use resolved::{NodeRange, ResolvedPos};
pub use schema::{
    AttrDefault, AttrSpec, ContentExpr, Group, MarkKind, MarkSpec, Matcher, NodeKind, NodeSpec,
    Term, HEADING_LEVELS,
};
pub use slice::Slice;
