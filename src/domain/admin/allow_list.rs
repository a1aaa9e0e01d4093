//! Static administrator allow-list.

use std::collections::BTreeSet;

/// Addresses granted admin access when no override is configured.
pub const DEFAULT_ADMIN_EMAILS: [&str; 3] = ["admin@ziq.ai", "founder@ziq.ai", "support@ziq.ai"];

/// Immutable set of administrator email addresses.
///
/// Entries are stored normalized (trimmed, lowercase) so that lookups ignore
/// case and surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminAllowList {
    emails: BTreeSet<String>,
}

impl AdminAllowList {
    /// Builds a list from arbitrary addresses. Blank entries are dropped.
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let emails = emails
            .into_iter()
            .map(|e| normalize(e.as_ref()))
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    /// Uses the comma-separated override when it has at least one entry,
    /// the built-in list otherwise.
    pub fn from_override(raw: Option<&str>) -> Self {
        let custom = raw.map(|r| Self::new(r.split(',')));
        match custom {
            Some(list) if !list.emails.is_empty() => list,
            _ => Self::default(),
        }
    }

    /// True when `email` is on the list.
    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&normalize(email))
    }

    /// All admin addresses, sorted.
    pub fn emails(&self) -> Vec<String> {
        self.emails.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

impl Default for AdminAllowList {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_EMAILS)
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn default_list_has_exactly_three_addresses() {
        let list = AdminAllowList::default();
        assert_eq!(list.len(), 3);
        for email in DEFAULT_ADMIN_EMAILS {
            assert!(list.contains(email));
        }
    }

    #[test]
    fn lookup_ignores_case_and_whitespace() {
        let list = AdminAllowList::default();
        assert!(list.contains("  Admin@Ziq.AI "));
    }

    #[test]
    fn override_replaces_defaults() {
        let list = AdminAllowList::from_override(Some("ops@example.com, Boss@Example.com"));
        assert_eq!(list.emails(), vec!["boss@example.com", "ops@example.com"]);
        assert!(!list.contains("admin@ziq.ai"));
    }

    #[test]
    fn blank_override_keeps_defaults() {
        assert_eq!(AdminAllowList::from_override(Some(" , ")), AdminAllowList::default());
        assert_eq!(AdminAllowList::from_override(None), AdminAllowList::default());
    }

    #[test]
    fn empty_string_is_never_admin() {
        assert!(!AdminAllowList::default().contains(""));
    }

    proptest! {
        #[test]
        fn addresses_outside_the_list_are_never_admin(local in "[a-z0-9._]{1,20}", domain in "[a-z]{1,10}\\.[a-z]{2,4}") {
            let email = format!("{local}@{domain}");
            let list = AdminAllowList::default();
            let expected = DEFAULT_ADMIN_EMAILS.contains(&email.as_str());
            prop_assert_eq!(list.contains(&email), expected);
        }
    }
}
