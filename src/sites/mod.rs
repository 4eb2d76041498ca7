//! Built-in site profiles
//!
//! Every supported site is a [`SiteProfile`] table interpreted by the shared
//! extractor. Profiles declared in the configuration file are merged on top
//! of the built-in ones and replace a built-in profile of the same name.

mod betalist;
mod companies_house;
mod generic;
mod uneed;

use crate::extract::{CompiledProfile, SiteProfile};
use crate::ScrapeError;

/// Returns every built-in profile, bespoke sites first
pub fn builtin_profiles() -> Vec<SiteProfile> {
    let mut profiles = vec![
        betalist::profile(),
        uneed::profile(),
        companies_house::search_profile(),
        companies_house::officers_profile(),
    ];
    profiles.extend(generic::profiles());
    profiles
}

/// Looks up a built-in profile by name
pub fn find(name: &str) -> Option<SiteProfile> {
    builtin_profiles().into_iter().find(|p| p.name == name)
}

/// Looks up and compiles a built-in profile
///
/// # Returns
///
/// * `Ok(CompiledProfile)` - The compiled profile
/// * `Err(ScrapeError::UnknownSite)` - No built-in profile has this name
pub fn compiled(name: &str) -> Result<CompiledProfile, ScrapeError> {
    let profile = find(name).ok_or_else(|| ScrapeError::UnknownSite(name.to_string()))?;
    Ok(CompiledProfile::compile(profile)?)
}

/// Built-in profiles plus profiles declared in the configuration
#[derive(Debug, Clone)]
pub struct SiteRegistry {
    profiles: Vec<SiteProfile>,
}

impl SiteRegistry {
    /// Creates a registry of the built-in profiles
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles(),
        }
    }

    /// Creates a registry of the built-in profiles overlaid with `custom`
    pub fn with_custom(custom: &[SiteProfile]) -> Self {
        let mut registry = Self::builtin();
        for profile in custom {
            match registry.profiles.iter_mut().find(|p| p.name == profile.name) {
                Some(existing) => {
                    tracing::info!("Config overrides built-in site profile '{}'", profile.name);
                    *existing = profile.clone();
                }
                None => registry.profiles.push(profile.clone()),
            }
        }
        registry
    }

    pub fn get(&self, name: &str) -> Option<&SiteProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Looks up and compiles a profile
    pub fn compile(&self, name: &str) -> Result<CompiledProfile, ScrapeError> {
        let profile = self
            .get(name)
            .ok_or_else(|| ScrapeError::UnknownSite(name.to_string()))?;
        Ok(CompiledProfile::compile(profile.clone())?)
    }

    pub fn profiles(&self) -> &[SiteProfile] {
        &self.profiles
    }
}

impl Default for SiteRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{PageRules, Traversal};
    use std::collections::HashSet;

    #[test]
    fn test_every_builtin_profile_compiles() {
        for profile in builtin_profiles() {
            let name = profile.name.clone();
            assert!(
                CompiledProfile::compile(profile).is_ok(),
                "profile {} failed to compile",
                name
            );
        }
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let profiles = builtin_profiles();
        let names: HashSet<&str> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names.len(), profiles.len());
    }

    #[test]
    fn test_unknown_site() {
        let err = compiled("nowhere").unwrap_err();
        assert!(matches!(err, ScrapeError::UnknownSite(name) if name == "nowhere"));
    }

    #[test]
    fn test_custom_profile_overrides_builtin() {
        let custom = SiteProfile {
            name: "betalist".to_string(),
            source: Some("betalist_custom".to_string()),
            base_url: "https://betalist.test/".to_string(),
            url_key: "url".to_string(),
            query_key: None,
            description: None,
            traversal: Traversal::Single,
            page: PageRules::default(),
        };
        let extra = SiteProfile {
            name: "launchboard".to_string(),
            ..custom.clone()
        };

        let registry = SiteRegistry::with_custom(&[custom, extra]);
        assert_eq!(registry.profiles().len(), builtin_profiles().len() + 1);
        assert_eq!(
            registry.get("betalist").map(|p| p.source()),
            Some("betalist_custom")
        );
        assert!(registry.compile("launchboard").is_ok());
    }
}
