use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Action a role grant allows on an endpoint.
///
/// `Write` is a superset of `Read`, `Create`, `Update` and `Delete`.
/// `None` grants nothing; it never acts as a deny override.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointPermissionAction {
    Read,
    Create,
    Update,
    Delete,
    Write,
    None,
}

impl EndpointPermissionAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "Read",
            Self::Create => "Create",
            Self::Update => "Update",
            Self::Delete => "Delete",
            Self::Write => "Write",
            Self::None => "None",
        }
    }

    /// Whether holding `self` satisfies a requirement for `required`.
    pub fn satisfies(&self, required: EndpointPermissionAction) -> bool {
        match self {
            Self::None => false,
            Self::Write => true,
            granted => *granted == required,
        }
    }
}

impl core::fmt::Display for EndpointPermissionAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP verbs the authorization layer knows about.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpVerb {
    Get,
    Head,
    Options,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerbError {
    #[error("unrecognized HTTP verb '{0}'")]
    Unrecognized(String),

    #[error("HTTP verb {0} has no permission mapping")]
    Unmapped(HttpVerb),
}

impl HttpVerb {
    pub fn parse(method: &str) -> Result<Self, VerbError> {
        match method.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "HEAD" => Ok(Self::Head),
            "OPTIONS" => Ok(Self::Options),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(VerbError::Unrecognized(method.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }

    /// The action a caller must hold to use this verb.
    pub fn required_action(&self) -> Result<EndpointPermissionAction, VerbError> {
        match self {
            Self::Get | Self::Options => Ok(EndpointPermissionAction::Read),
            Self::Post => Ok(EndpointPermissionAction::Create),
            Self::Put | Self::Patch => Ok(EndpointPermissionAction::Update),
            Self::Delete => Ok(EndpointPermissionAction::Delete),
            Self::Head => Err(VerbError::Unmapped(*self)),
        }
    }
}

impl core::fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbs_map_to_actions() {
        use EndpointPermissionAction as A;

        assert_eq!(HttpVerb::Get.required_action(), Ok(A::Read));
        assert_eq!(HttpVerb::Options.required_action(), Ok(A::Read));
        assert_eq!(HttpVerb::Post.required_action(), Ok(A::Create));
        assert_eq!(HttpVerb::Put.required_action(), Ok(A::Update));
        assert_eq!(HttpVerb::Patch.required_action(), Ok(A::Update));
        assert_eq!(HttpVerb::Delete.required_action(), Ok(A::Delete));
    }

    #[test]
    fn head_is_not_silently_mapped() {
        assert_eq!(
            HttpVerb::Head.required_action(),
            Err(VerbError::Unmapped(HttpVerb::Head))
        );
    }

    #[test]
    fn parse_is_case_insensitive_and_rejects_unknown() {
        assert_eq!(HttpVerb::parse("patch"), Ok(HttpVerb::Patch));
        assert!(matches!(HttpVerb::parse("TRACE"), Err(VerbError::Unrecognized(_))));
    }

    #[test]
    fn write_satisfies_everything_but_none_satisfies_nothing() {
        use EndpointPermissionAction as A;

        for required in [A::Read, A::Create, A::Update, A::Delete] {
            assert!(A::Write.satisfies(required));
            assert!(!A::None.satisfies(required));
        }
        assert!(A::Read.satisfies(A::Read));
        assert!(!A::Read.satisfies(A::Delete));
    }
}
