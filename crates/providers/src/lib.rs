//! Built-in provider method definitions.
//!
//! Each provider module exports a `methods()` registration list; [`all`]
//! concatenates them for discovery. Definitions are data only: routing,
//! validation, and execution live in the runtime crate.

use scm_plugin_sdk::ProviderMethods;

pub mod github;
pub mod gitlab;

/// Registration lists for every built-in provider, in registration order.
#[must_use]
pub fn all() -> Vec<ProviderMethods> {
    vec![
        ProviderMethods {
            provider: "github",
            methods: github::methods(),
        },
        ProviderMethods {
            provider: "gitlab",
            methods: gitlab::methods(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use scm_plugin_sdk::Registry;

    #[test]
    fn all_builtin_methods_pass_discovery() {
        let registry = Registry::discover(all()).expect("built-in definitions are valid");
        assert_eq!(registry.len(), 10);
    }

    #[test]
    fn method_names_are_provider_prefixed_and_unique() {
        let registry = Registry::discover(all()).expect("discover");
        for metadata in registry.list() {
            assert!(
                metadata.name.starts_with("github_") || metadata.name.starts_with("gitlab_"),
                "unprefixed method name: {}",
                metadata.name
            );
        }
    }

    #[test]
    fn lookup_finds_methods_from_both_providers() {
        let registry = Registry::discover(all()).expect("discover");
        assert!(registry.get("github_list_issues").is_some());
        assert!(registry.get("gitlab_get_project").is_some());
        assert!(registry.get("bitbucket_anything").is_none());
    }
}
