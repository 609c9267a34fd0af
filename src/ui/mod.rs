//! UI hints for formschema
//!
//! Parsing of uiSchema documents, option flattening and widget lookup.
//! Nothing here renders; the hints only steer how form state is built.

mod errors;
mod ui_schema;
mod widgets;

pub use errors::{UiError, UiResult};
pub use ui_schema::{get_ui_options, UiSchema, UiWidget};
pub use widgets::WidgetRegistry;
