use thiserror::Error;

pub type Result<T> = std::result::Result<T, HcError>;

#[derive(Debug, Error)]
pub enum HcError {
	#[error("navigation to {url} failed: {reason}")]
	Navigation { url: String, reason: String },

	#[error("javascript evaluation failed: {0}")]
	Evaluation(String),

	#[error("screenshot data is not valid base64: {0}")]
	Screenshot(String),

	#[error("unexpected value for {expression}: {value}")]
	UnexpectedValue {
		expression: String,
		value: serde_json::Value,
	},

	#[error(transparent)]
	Runtime(#[from] hc_runtime::Error),

	#[cfg(feature = "native")]
	#[error(transparent)]
	Bridge(#[from] hc_bridge::Error),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),

	#[error(transparent)]
	Anyhow(#[from] anyhow::Error),
}
