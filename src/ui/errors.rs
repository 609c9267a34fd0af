//! UI hint errors

use thiserror::Error;

use crate::schema::SchemaError;

#[derive(Debug, Clone, Error)]
pub enum UiError {
    #[error("Invalid uiSchema: {0}")]
    InvalidUiSchema(String),

    #[error("No widget for type \"{schema_type}\"")]
    NoWidgetForType { schema_type: String },

    #[error("No widget \"{widget}\" for type \"{schema_type}\"")]
    NoWidget { widget: String, schema_type: String },

    #[error("Widget alias \"{0}\" does not resolve to a widget")]
    UnresolvedAlias(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl UiError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            UiError::InvalidUiSchema(_) => "FORM_UI_INVALID",
            UiError::NoWidgetForType { .. } => "FORM_UI_NO_WIDGET_FOR_TYPE",
            UiError::NoWidget { .. } => "FORM_UI_NO_WIDGET",
            UiError::UnresolvedAlias(_) => "FORM_UI_UNRESOLVED_ALIAS",
            UiError::Schema(e) => e.code().code(),
        }
    }
}

pub type UiResult<T> = Result<T, UiError>;
