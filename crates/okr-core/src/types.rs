use crate::error::OkrError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ObjectiveType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveType {
    Strategic,
    Tactical,
    Operational,
}

impl ObjectiveType {
    /// Display order used by grouped views.
    pub fn all() -> &'static [ObjectiveType] {
        &[
            ObjectiveType::Strategic,
            ObjectiveType::Tactical,
            ObjectiveType::Operational,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectiveType::Strategic => "strategic",
            ObjectiveType::Tactical => "tactical",
            ObjectiveType::Operational => "operational",
        }
    }

    /// Normalize a free-form label (`"Estratégico"`, `"TÁTICO"`, `"operational"`)
    /// by case-insensitive substring match.
    pub fn from_label(label: &str) -> Option<ObjectiveType> {
        let folded = crate::text::fold(label);
        if folded.contains("estrateg") || folded.contains("strateg") {
            Some(ObjectiveType::Strategic)
        } else if folded.contains("tatic") || folded.contains("tactic") {
            Some(ObjectiveType::Tactical)
        } else if folded.contains("operac") || folded.contains("operat") {
            Some(ObjectiveType::Operational)
        } else {
            None
        }
    }
}

impl fmt::Display for ObjectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ObjectiveType {
    type Err = OkrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strategic" => Ok(ObjectiveType::Strategic),
            "tactical" => Ok(ObjectiveType::Tactical),
            "operational" => Ok(ObjectiveType::Operational),
            _ => Err(OkrError::InvalidObjectiveType(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Ambition
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ambition {
    Moonshot,
    Roofshot,
}

impl Ambition {
    pub fn all() -> &'static [Ambition] {
        &[Ambition::Moonshot, Ambition::Roofshot]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Ambition::Moonshot => "moonshot",
            Ambition::Roofshot => "roofshot",
        }
    }

    pub fn from_label(label: &str) -> Option<Ambition> {
        let folded = crate::text::fold(label);
        if folded.contains("moonshot") {
            Some(Ambition::Moonshot)
        } else if folded.contains("roofshot") {
            Some(Ambition::Roofshot)
        } else {
            None
        }
    }
}

impl fmt::Display for Ambition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Ambition {
    type Err = OkrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "moonshot" => Ok(Ambition::Moonshot),
            "roofshot" => Ok(Ambition::Roofshot),
            _ => Err(OkrError::InvalidAmbition(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

/// Traffic-light confidence recorded on key results and check-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    #[serde(alias = "green")]
    High,
    #[serde(alias = "yellow")]
    Medium,
    #[serde(alias = "red")]
    Low,
}

impl Confidence {
    pub fn as_str(self) -> &'static str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Confidence::High => "green",
            Confidence::Medium => "yellow",
            Confidence::Low => "red",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Confidence {
    type Err = OkrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" | "green" => Ok(Confidence::High),
            "medium" | "yellow" => Ok(Confidence::Medium),
            "low" | "red" => Ok(Confidence::Low),
            _ => Err(OkrError::InvalidConfidence(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Champion,
    Collaborator,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Champion => "champion",
            Role::Collaborator => "collaborator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = OkrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "champion" => Ok(Role::Champion),
            "collaborator" => Ok(Role::Collaborator),
            _ => Err(OkrError::InvalidRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn objective_type_labels() {
        assert_eq!(ObjectiveType::from_label("Estratégico"), Some(ObjectiveType::Strategic));
        assert_eq!(ObjectiveType::from_label("estrategico"), Some(ObjectiveType::Strategic));
        assert_eq!(ObjectiveType::from_label("TÁTICO"), Some(ObjectiveType::Tactical));
        assert_eq!(ObjectiveType::from_label("Operacional"), Some(ObjectiveType::Operational));
        assert_eq!(ObjectiveType::from_label("operational"), Some(ObjectiveType::Operational));
        assert_eq!(ObjectiveType::from_label("Moonshot"), None);
    }

    #[test]
    fn ambition_labels() {
        assert_eq!(Ambition::from_label("Moonshot"), Some(Ambition::Moonshot));
        assert_eq!(Ambition::from_label("tipo roofshot"), Some(Ambition::Roofshot));
        assert_eq!(Ambition::from_label("Estratégico"), None);
    }

    #[test]
    fn confidence_accepts_colors() {
        assert_eq!("green".parse::<Confidence>().unwrap(), Confidence::High);
        assert_eq!("red".parse::<Confidence>().unwrap(), Confidence::Low);
        let parsed: Confidence = serde_yaml::from_str("yellow").unwrap();
        assert_eq!(parsed, Confidence::Medium);
        assert_eq!(serde_yaml::to_string(&parsed).unwrap().trim(), "medium");
        assert!("blue".parse::<Confidence>().is_err());
    }

    #[test]
    fn objective_type_order() {
        let mut types = vec![
            ObjectiveType::Operational,
            ObjectiveType::Strategic,
            ObjectiveType::Tactical,
        ];
        types.sort();
        assert_eq!(types, ObjectiveType::all());
    }
}
