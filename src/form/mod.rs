//! Form state for formschema
//!
//! Default merging, the IdSchema and PathSchema mirrors, and the immutable
//! [`FormState`] that ties them to validation.
//!
//! # Usage
//!
//! ```ignore
//! use formschema::form::FormState;
//!
//! let state = FormState::from_props(schema, ui_schema, data, &config, Some(&options))?;
//! let next = state.change(&["address", "city"], json!("Paris"), Some(&options))?;
//! ```

mod defaults;
mod errors;
mod mirror;
mod state;

pub use defaults::{compute_defaults, get_default_form_state, DefaultMerger, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PADDED_ITEMS};
pub use errors::{FormError, FormResult};
pub use mirror::{
    to_id_schema, to_path_schema, FieldId, FieldPath, IdSchema, ItemsPolicy, MirrorBuilder, MirrorPolicy, PathSchema,
    DEFAULT_ID_PREFIX,
};
pub use state::FormState;

pub use crate::tree::{MirrorLeaf, MirrorTree};
