use serde::{Deserialize, Serialize};

/// Bearer + CSRF token pair as relayed by the credential broker.
///
/// Either field may still be unset if nothing has been observed yet;
/// callers must check `is_ready` before attempting an API call.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csrf: Option<String>,
}

impl Credentials {
    pub fn new(bearer: impl Into<String>, csrf: impl Into<String>) -> Self {
        Self {
            bearer: Some(bearer.into()),
            csrf: Some(csrf.into()),
        }
    }

    /// True iff both tokens are present and non-empty.
    pub fn is_ready(&self) -> bool {
        fn filled(v: &Option<String>) -> bool {
            v.as_deref().is_some_and(|s| !s.is_empty())
        }
        filled(&self.bearer) && filled(&self.csrf)
    }
}

/// One user as returned by the bio lookup endpoint, mapped to the
/// local shape. Consumed immediately for pronoun extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub handle: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// A user together with the pronoun sets matched in their bio (or,
/// failing that, their location line).
#[derive(Debug, Clone)]
pub struct PronounHit {
    pub user: UserRecord,
    pub pronouns: Vec<String>,
}
