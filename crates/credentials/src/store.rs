use pronord_core::Credentials;

/// Live bearer/CSRF token pair captured from observed traffic.
///
/// Owned by the credential service task, which serializes every
/// mutation and read on its event loop; no interior locking. Tokens
/// are memory-resident only and die with the task.
#[derive(Debug, Default)]
pub struct CredentialStore {
    bearer: Option<String>,
    csrf: Option<String>,
    /// Secondary CSRF slot: a header-sourced value that arrived while
    /// the cookie-sourced primary was already populated. The two
    /// issuance paths can race; the later header value may be stale,
    /// so it is parked here instead of clobbering the primary.
    temp_csrf: Option<String>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bearer(&mut self, value: impl Into<String>) {
        self.bearer = Some(value.into());
    }

    pub fn set_csrf(&mut self, value: impl Into<String>) {
        self.csrf = Some(value.into());
    }

    pub fn set_temp_csrf(&mut self, value: impl Into<String>) {
        self.temp_csrf = Some(value.into());
    }

    pub fn bearer(&self) -> Option<&str> {
        self.bearer.as_deref()
    }

    pub fn csrf(&self) -> Option<&str> {
        self.csrf.as_deref()
    }

    pub fn temp_csrf(&self) -> Option<&str> {
        self.temp_csrf.as_deref()
    }

    /// True iff both the bearer and the primary CSRF token have been
    /// observed and are non-empty.
    pub fn is_ready(&self) -> bool {
        fn filled(v: &Option<String>) -> bool {
            v.as_deref().is_some_and(|s| !s.is_empty())
        }
        filled(&self.bearer) && filled(&self.csrf)
    }

    /// Current tokens in the cross-context wire shape. May be partly
    /// or fully unset; the receiving side checks readiness itself.
    pub fn snapshot(&self) -> Credentials {
        Credentials {
            bearer: self.bearer.clone(),
            csrf: self.csrf.clone(),
        }
    }
}
