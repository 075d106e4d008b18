//! `Runtime` domain.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::method::Method;

/// `Runtime.evaluate`.
pub struct Evaluate;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateParams {
	pub expression: String,
	pub return_by_value: bool,
	#[serde(skip_serializing_if = "std::ops::Not::not")]
	pub await_promise: bool,
}

impl EvaluateParams {
	/// Evaluates `expression` and returns the result by value.
	pub fn by_value(expression: impl Into<String>) -> Self {
		Self {
			expression: expression.into(),
			return_by_value: true,
			await_promise: false,
		}
	}
}

/// Mirror of a JavaScript value.
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteObject {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub subtype: Option<String>,
	#[serde(default)]
	pub value: Option<Value>,
	#[serde(default)]
	pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionDetails {
	pub text: String,
	#[serde(default)]
	pub line_number: i64,
	#[serde(default)]
	pub column_number: i64,
	#[serde(default)]
	pub exception: Option<RemoteObject>,
}

impl ExceptionDetails {
	/// Message combining the summary with the thrown value's description.
	pub fn message(&self) -> String {
		match self
			.exception
			.as_ref()
			.and_then(|exception| exception.description.as_deref())
		{
			Some(description) => format!("{}: {}", self.text, description),
			None => self.text.clone(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateReturns {
	pub result: RemoteObject,
	#[serde(default)]
	pub exception_details: Option<ExceptionDetails>,
}

impl EvaluateReturns {
	/// Returns the evaluated value, or the exception message if the script threw.
	pub fn into_value(self) -> Result<Value, String> {
		match self.exception_details {
			Some(details) => Err(details.message()),
			None => Ok(self.result.value.unwrap_or(Value::Null)),
		}
	}
}

impl Method for Evaluate {
	const NAME: &'static str = "Runtime.evaluate";
	type Params = EvaluateParams;
	type Returns = EvaluateReturns;
}
