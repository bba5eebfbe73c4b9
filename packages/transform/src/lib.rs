//! # Quire Transform
//!
//! Invertible document steps, position mapping and the [`Transform`]
//! builder that every edit in the editor goes through.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use quire_transform::{Transform, Mappable, Assoc};
//!
//! let mut tr = Transform::new(doc);
//! tr.insert_text("Hello", 1, 1, Vec::new())?
//!     .add_mark(1, 6, Mark::of(MarkKind::Bold))?;
//! let cursor = tr.mapping().map(1, Assoc::After);
//! ```

mod attr_step;
mod error;
mod map;
mod mark_step;
mod marks;
mod replace_step;
mod step;
mod structure;
mod transform;

pub use attr_step::AttrsStep;
pub use error::{StepError, StepResult};
pub use map::{Assoc, MapResult, Mappable, Mapping, StepMap};
pub use mark_step::{AddMarkStep, RemoveMarkStep};
pub use marks::MarkMatch;
pub use replace_step::{content_between, ReplaceAroundStep, ReplaceStep};
pub use step::Step;
pub use structure::{
    can_change_type, can_join, can_split, find_wrapping, join_point, lift_target, Wrapper,
};
pub use transform::{Transform, TransformResult};
