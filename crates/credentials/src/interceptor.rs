use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::CredentialStore;

const AUTHORIZATION_HEADER: &str = "authorization";
const CSRF_HEADER: &str = "x-csrf-token";

/// Why a cookie changed, per the browser cookie-change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CookieCause {
    /// Value actively replaced by a newer one.
    Overwrite,
    /// Passive expiry.
    Expired,
    /// Evicted by the cookie store (e.g. quota).
    Evicted,
    /// Explicitly set or removed by script.
    Explicit,
}

/// One cookie mutation as observed by the privileged context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieChange {
    pub name: String,
    pub value: String,
    pub cause: CookieCause,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

/// One outgoing request as observed by the privileged context,
/// already filtered to the target API host by the event source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestDetails {
    pub url: String,
    #[serde(default)]
    pub headers: Option<Vec<Header>>,
}

/// Feed a cookie-change event into the store. Only an overwrite of
/// the session cookie updates the CSRF slot; expiry and eviction must
/// not wipe a still-usable token.
pub fn apply_cookie_change(store: &mut CredentialStore, cookie_name: &str, change: &CookieChange) {
    if change.name != cookie_name {
        return;
    }
    if change.cause != CookieCause::Overwrite {
        return;
    }
    debug!(cookie = %change.name, "csrf token refreshed from cookie");
    store.set_csrf(change.value.clone());
}

/// Feed one observed request's headers into the store.
///
/// Missing details or headers are a no-op. Header names match
/// case-insensitively. A CSRF header seen while the primary CSRF slot
/// is already populated goes to the temp slot instead. Scanning stops
/// once both interesting headers have been consumed.
pub fn apply_request_headers(store: &mut CredentialStore, details: Option<&RequestDetails>) {
    let Some(details) = details else { return };
    let Some(headers) = details.headers.as_deref() else {
        return;
    };

    let mut matched = 0;
    for header in headers {
        matched += parse_header(store, header);
        if matched == 2 {
            break;
        }
    }
}

fn parse_header(store: &mut CredentialStore, header: &Header) -> u32 {
    match header.name.to_lowercase().as_str() {
        AUTHORIZATION_HEADER => {
            store.set_bearer(header.value.clone());
            1
        }
        CSRF_HEADER => {
            if store.csrf().is_some() {
                store.set_temp_csrf(header.value.clone());
            } else {
                store.set_csrf(header.value.clone());
            }
            1
        }
        _ => 0,
    }
}

/// Eager one-shot cookie read at startup, so a tab opened before any
/// interception happened still gets a CSRF token.
pub fn seed_initial_csrf(store: &mut CredentialStore, cookie_value: Option<&str>) {
    if let Some(value) = cookie_value {
        if !value.is_empty() {
            debug!("csrf token seeded from initial cookie read");
            store.set_csrf(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(headers: Option<Vec<(&str, &str)>>) -> RequestDetails {
        RequestDetails {
            url: "https://api.twitter.com/1.1/anything".to_string(),
            headers: headers.map(|hs| {
                hs.into_iter()
                    .map(|(name, value)| Header {
                        name: name.to_string(),
                        value: value.to_string(),
                    })
                    .collect()
            }),
        }
    }

    #[test]
    fn test_captures_both_tokens_among_noise() {
        let mut store = CredentialStore::new();
        apply_request_headers(
            &mut store,
            Some(&details(Some(vec![
                ("user-agent", "x"),
                ("Authorization", "Bearer AAAA"),
                ("accept", "*/*"),
                ("X-Csrf-Token", "c0ffee"),
                ("referer", "https://twitter.com"),
            ]))),
        );
        assert_eq!(store.bearer(), Some("Bearer AAAA"));
        assert_eq!(store.csrf(), Some("c0ffee"));
        assert!(store.is_ready());
    }

    #[test]
    fn test_missing_details_is_noop() {
        let mut store = CredentialStore::new();
        apply_request_headers(&mut store, None);
        apply_request_headers(&mut store, Some(&details(None)));
        assert!(store.bearer().is_none());
        assert!(store.csrf().is_none());
    }

    #[test]
    fn test_header_csrf_goes_to_temp_when_primary_set() {
        let mut store = CredentialStore::new();
        store.set_csrf("from-cookie");
        apply_request_headers(
            &mut store,
            Some(&details(Some(vec![("x-csrf-token", "from-header")]))),
        );
        assert_eq!(store.csrf(), Some("from-cookie"));
        assert_eq!(store.temp_csrf(), Some("from-header"));
    }

    #[test]
    fn test_stops_scanning_after_two_matches() {
        // A second authorization header after both slots matched is
        // never read.
        let mut store = CredentialStore::new();
        apply_request_headers(
            &mut store,
            Some(&details(Some(vec![
                ("authorization", "Bearer first"),
                ("x-csrf-token", "c1"),
                ("authorization", "Bearer second"),
            ]))),
        );
        assert_eq!(store.bearer(), Some("Bearer first"));
    }

    #[test]
    fn test_cookie_overwrite_updates_csrf() {
        let mut store = CredentialStore::new();
        apply_cookie_change(
            &mut store,
            "ct0",
            &CookieChange {
                name: "ct0".to_string(),
                value: "fresh".to_string(),
                cause: CookieCause::Overwrite,
            },
        );
        assert_eq!(store.csrf(), Some("fresh"));
    }

    #[test]
    fn test_cookie_expiry_and_wrong_name_ignored() {
        let mut store = CredentialStore::new();
        store.set_csrf("keep");
        apply_cookie_change(
            &mut store,
            "ct0",
            &CookieChange {
                name: "ct0".to_string(),
                value: "gone".to_string(),
                cause: CookieCause::Expired,
            },
        );
        apply_cookie_change(
            &mut store,
            "ct0",
            &CookieChange {
                name: "other".to_string(),
                value: "x".to_string(),
                cause: CookieCause::Overwrite,
            },
        );
        assert_eq!(store.csrf(), Some("keep"));
    }

    #[test]
    fn test_initial_csrf_seed() {
        let mut store = CredentialStore::new();
        seed_initial_csrf(&mut store, None);
        assert!(store.csrf().is_none());
        seed_initial_csrf(&mut store, Some(""));
        assert!(store.csrf().is_none());
        seed_initial_csrf(&mut store, Some("seeded"));
        assert_eq!(store.csrf(), Some("seeded"));
    }
}
