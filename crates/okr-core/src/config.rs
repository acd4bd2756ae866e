use crate::error::{OkrError, Result};
use crate::hierarchy::ParentPolicy;
use crate::link::LinkConvention;
use crate::paths;
use crate::types::Role;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// LinkConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkConfig {
    /// Direction in which links are declared when created.
    #[serde(default)]
    pub convention: LinkConvention,
    /// Which link to honour when an objective has several parents.
    #[serde(default)]
    pub duplicate_parent: ParentPolicy,
}

// ---------------------------------------------------------------------------
// CheckinConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckinConfig {
    /// `{cycle}` and `{date}` are substituted.
    #[serde(default = "default_reminder_template")]
    pub reminder_template: String,
}

fn default_reminder_template() -> String {
    "Check-in for cycle '{cycle}' was due on {date}.".to_string()
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            reminder_template: default_reminder_template(),
        }
    }
}

// ---------------------------------------------------------------------------
// AiConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default = "default_ai_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_ai_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_ai_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".to_string()
}

fn default_ai_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_api_key_env() -> String {
    "OKR_AI_API_KEY".to_string()
}

fn default_temperature() -> f64 {
    0.4
}

fn default_max_tokens() -> u32 {
    4096
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_ai_endpoint(),
            model: default_ai_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub role: Role,
}

// ---------------------------------------------------------------------------
// OrganizationConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    pub organization: OrganizationConfig,
    #[serde(default)]
    pub links: LinkConfig,
    #[serde(default)]
    pub checkins: CheckinConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members: Vec<Member>,
}

fn default_version() -> u32 {
    1
}

impl Config {
    pub fn new(organization: impl Into<String>) -> Self {
        Self {
            version: 1,
            organization: OrganizationConfig {
                name: organization.into(),
                description: None,
            },
            links: LinkConfig::default(),
            checkins: CheckinConfig::default(),
            ai: AiConfig::default(),
            members: Vec::new(),
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(OkrError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::write_yaml(&paths::config_path(root), self)
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.name == name)
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.organization.name.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "organization.name is empty".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for m in &self.members {
            if !seen.insert(m.name.as_str()) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("member '{}' is listed more than once", m.name),
                });
            }
        }
        if !self.members.is_empty() && !self.members.iter().any(|m| m.role == Role::Admin) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "no member has the admin role; config changes are locked".to_string(),
            });
        }

        if !self.checkins.reminder_template.contains("{cycle}") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "checkins.reminder_template does not mention {cycle}".to_string(),
            });
        }

        if self.ai.endpoint.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "ai.endpoint is empty; draft generation is disabled".to_string(),
            });
        }
        if !(0.0..=2.0).contains(&self.ai.temperature) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "ai.temperature={} is outside the usual 0.0-2.0 range",
                    self.ai.temperature
                ),
            });
        }
        if self.ai.max_tokens == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "ai.max_tokens must be greater than zero".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::new("acme");
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        let parsed: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.organization.name, "acme");
        assert_eq!(parsed.version, 1);
        assert_eq!(parsed.links.convention, LinkConvention::ChildToParent);
        assert_eq!(parsed.links.duplicate_parent, ParentPolicy::LastWins);
    }

    #[test]
    fn minimal_yaml_gets_defaults() {
        let yaml = "organization:\n  name: acme\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.ai.api_key_env, "OKR_AI_API_KEY");
        assert!(cfg.members.is_empty());
        assert!(cfg.checkins.reminder_template.contains("{cycle}"));

        let out = serde_yaml::to_string(&cfg).unwrap();
        assert!(!out.contains("members"));
    }

    #[test]
    fn parent_to_child_convention_parses() {
        let yaml = "organization:\n  name: acme\nlinks:\n  convention: parent_to_child\n  duplicate_parent: first_wins\n";
        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.links.convention, LinkConvention::ParentToChild);
        assert_eq!(cfg.links.duplicate_parent, ParentPolicy::FirstWins);
    }

    #[test]
    fn load_requires_init() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(Config::load(dir.path()), Err(OkrError::NotInitialized)));
        Config::new("acme").save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap().organization.name, "acme");
    }

    #[test]
    fn validate_flags_duplicate_members() {
        let mut cfg = Config::new("acme");
        cfg.members = vec![
            Member { name: "ana".into(), role: Role::Admin },
            Member { name: "ana".into(), role: Role::Champion },
        ];
        let warnings = cfg.validate();
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("'ana'")));
    }

    #[test]
    fn validate_default_is_clean() {
        assert!(Config::new("acme").validate().is_empty());
    }

    #[test]
    fn validate_warns_without_admin() {
        let mut cfg = Config::new("acme");
        cfg.members = vec![Member { name: "bia".into(), role: Role::Collaborator }];
        assert!(cfg.validate().iter().any(|w| w.message.contains("admin")));
    }
}
