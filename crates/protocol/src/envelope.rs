use serde::{Deserialize, Serialize};

use crate::ProtocolError;
use crate::constants::MethodName;

/// A method invocation travelling over the channel in either direction.
///
/// The `arguments` field uses `serde_json::value::RawValue` so that decoding
/// is deferred until the receiver knows which payload type to expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Box<serde_json::value::RawValue>>,
}

impl MethodCall {
    /// Creates a call with the given arguments.
    pub fn new<T: Serialize>(
        method: impl Into<String>,
        arguments: Option<&T>,
    ) -> Result<Self, serde_json::Error> {
        let raw = match arguments {
            Some(a) => {
                let json = serde_json::to_string(a)?;
                Some(serde_json::value::RawValue::from_string(json)?)
            }
            None => None,
        };
        Ok(Self {
            method: method.into(),
            arguments: raw,
        })
    }

    /// Creates a call that carries no arguments.
    pub fn bare(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: None,
        }
    }

    /// Resolves the method string against the known method set.
    pub fn method_name(&self) -> Result<MethodName, ProtocolError> {
        self.method.parse()
    }

    /// Deserializes the arguments into the given type.
    pub fn parse_arguments<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<Option<T>, serde_json::Error> {
        match &self.arguments {
            Some(raw) => Ok(Some(serde_json::from_str(raw.get())?)),
            None => Ok(None),
        }
    }

    /// Deserializes arguments that the method cannot do without.
    pub fn require_arguments<T: for<'de> Deserialize<'de>>(&self) -> Result<T, ProtocolError> {
        let parsed = self
            .parse_arguments()
            .map_err(|source| ProtocolError::InvalidArguments {
                method: self.method.clone(),
                source,
            })?;
        parsed.ok_or_else(|| ProtocolError::MissingArguments(self.method.clone()))
    }
}

/// Outcome of a method call, as reported back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum MethodResponse {
    Success {
        result: serde_json::Value,
    },
    Error {
        code: String,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<serde_json::Value>,
    },
    NotImplemented,
}

impl MethodResponse {
    /// Wraps a serializable result.
    pub fn success<T: Serialize>(result: &T) -> Result<Self, serde_json::Error> {
        Ok(MethodResponse::Success {
            result: serde_json::to_value(result)?,
        })
    }

    /// Creates an error response without details.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        MethodResponse::Error {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, MethodResponse::Success { .. })
    }

    /// Returns the result value of a successful response.
    pub fn result(&self) -> Option<&serde_json::Value> {
        match self {
            MethodResponse::Success { result } => Some(result),
            _ => None,
        }
    }
}

/// A method call tagged with a caller-chosen id, as read by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Box<serde_json::value::RawValue>>,
}

impl Request {
    /// Splits the request into its id and the call it carries.
    pub fn into_parts(self) -> (String, MethodCall) {
        (
            self.id,
            MethodCall {
                method: self.method,
                arguments: self.arguments,
            },
        )
    }
}

/// Response to a [`Request`], echoing its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub id: String,
    #[serde(flatten)]
    pub response: MethodResponse,
}

impl Reply {
    pub fn new(id: impl Into<String>, response: MethodResponse) -> Self {
        Self {
            id: id.into(),
            response,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::SetIconRequest;

    #[test]
    fn call_new_with_arguments() {
        let args = serde_json::json!({"iconPath": "a.ico"});
        let call = MethodCall::new("setIcon", Some(&args)).unwrap();
        assert_eq!(call.method, "setIcon");
        assert!(call.arguments.is_some());
        assert_eq!(call.method_name().unwrap(), MethodName::SetIcon);
    }

    #[test]
    fn bare_call_omits_arguments() {
        let call = MethodCall::bare("destroy");
        let json = serde_json::to_string(&call).unwrap();
        assert_eq!(json, r#"{"method":"destroy"}"#);
    }

    #[test]
    fn parse_typed_arguments() {
        let call: MethodCall =
            serde_json::from_str(r#"{"method":"setIcon","arguments":{"iconPath":"C:\\tray.ico"}}"#)
                .unwrap();
        let req: SetIconRequest = call.require_arguments().unwrap();
        assert_eq!(req.icon_path, "C:\\tray.ico");
    }

    #[test]
    fn require_arguments_missing() {
        let call = MethodCall::bare("setIcon");
        let err = call.require_arguments::<SetIconRequest>().unwrap_err();
        assert!(matches!(err, ProtocolError::MissingArguments(m) if m == "setIcon"));
    }

    #[test]
    fn require_arguments_wrong_shape() {
        let call: MethodCall =
            serde_json::from_str(r#"{"method":"setIcon","arguments":{"iconPath":42}}"#).unwrap();
        let err = call.require_arguments::<SetIconRequest>().unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidArguments { .. }));
    }

    #[test]
    fn response_status_tags() {
        let ok = MethodResponse::success(&true).unwrap();
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"status": "success", "result": true})
        );

        let ni = serde_json::to_value(MethodResponse::NotImplemented).unwrap();
        assert_eq!(ni, serde_json::json!({"status": "notImplemented"}));

        let err = serde_json::to_value(MethodResponse::error("no-tray-icon", "none")).unwrap();
        assert_eq!(err["status"], "error");
        assert!(err.get("details").is_none());
    }

    #[test]
    fn reply_flattens_response() {
        let reply = Reply::new("7", MethodResponse::success(&true).unwrap());
        let json = serde_json::to_string(&reply).unwrap();
        let parsed: Reply = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, reply);
        assert!(json.contains(r#""id":"7""#));
        assert!(json.contains(r#""status":"success""#));
    }

    #[test]
    fn request_into_parts() {
        let req: Request =
            serde_json::from_str(r#"{"id":"r1","method":"getBounds","arguments":{"devicePixelRatio":1.5}}"#)
                .unwrap();
        let (id, call) = req.into_parts();
        assert_eq!(id, "r1");
        assert_eq!(call.method, "getBounds");
        assert!(call.arguments.is_some());
    }
}
