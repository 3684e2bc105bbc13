//! Authorizer request and policy-document records.
//!
//! Wire shapes follow the API-gateway request authorizer contract:
//!
//! ```json
//! // request
//! { "methodArn": "arn:...", "requestContext": { "identity": { "sourceIp": "203.0.113.7" } } }
//!
//! // response
//! { "principalId": "203.0.113.7",
//!   "policyDocument": { "Version": "2012-10-17",
//!     "Statement": [ { "Action": "execute-api:Invoke", "Effect": "Deny", "Resource": "arn:..." } ] } }
//! ```

use serde::{Deserialize, Serialize};

use pin_core::Decision;

/// IAM policy language version.
pub const POLICY_VERSION: &str = "2012-10-17";

/// Action granted or denied by the generated statement.
pub const INVOKE_ACTION: &str = "execute-api:Invoke";

/// Principal used when the request carries no caller address.
pub const ANONYMOUS_PRINCIPAL: &str = "user";

// ─────────────────────────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────────────────────────

/// Authorization request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerRequest {
    /// Resource being invoked; echoed into the policy statement.
    pub method_arn: String,
    /// Caller context.
    #[serde(default)]
    pub request_context: RequestContext,
}

/// Caller context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// Caller identity.
    #[serde(default)]
    pub identity: Identity,
}

/// Caller identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    /// Caller network address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ip: Option<String>,
}

impl AuthorizerRequest {
    /// Request for `method_arn` from `source_ip`.
    #[must_use]
    pub fn new(method_arn: impl Into<String>, source_ip: Option<String>) -> Self {
        Self {
            method_arn: method_arn.into(),
            request_context: RequestContext {
                identity: Identity { source_ip },
            },
        }
    }

    /// Subject identifier for the policy document.
    ///
    /// The caller address on every path (success, retrieval failure and
    /// configuration failure alike); [`ANONYMOUS_PRINCIPAL`] only when the
    /// request has no usable address.
    #[must_use]
    pub fn principal(&self) -> &str {
        self.request_context
            .identity
            .source_ip
            .as_deref()
            .map(str::trim)
            .filter(|ip| !ip.is_empty())
            .unwrap_or(ANONYMOUS_PRINCIPAL)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response
// ─────────────────────────────────────────────────────────────────────────────

/// Authorization response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyResponse {
    /// Subject the policy applies to.
    pub principal_id: String,
    /// Policy document.
    pub policy_document: PolicyDocument,
}

/// IAM-style policy document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PolicyDocument {
    /// Policy language version.
    pub version: String,
    /// Statements (always exactly one).
    pub statement: Vec<Statement>,
}

/// Single policy statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Statement {
    /// Action.
    pub action: String,
    /// `Allow` or `Deny`.
    pub effect: Decision,
    /// Resource ARN.
    pub resource: String,
}

impl PolicyResponse {
    /// The effect of the (single) statement.
    #[must_use]
    pub fn effect(&self) -> Decision {
        self.policy_document
            .statement
            .first()
            .map_or(Decision::Deny, |s| s.effect)
    }
}

/// Build the policy document for `decision`.
#[must_use]
pub fn generate_policy(principal_id: &str, decision: Decision, resource: &str) -> PolicyResponse {
    PolicyResponse {
        principal_id: principal_id.to_string(),
        policy_document: PolicyDocument {
            version: POLICY_VERSION.to_string(),
            statement: vec![Statement {
                action: INVOKE_ACTION.to_string(),
                effect: decision,
                resource: resource.to_string(),
            }],
        },
    }
}
