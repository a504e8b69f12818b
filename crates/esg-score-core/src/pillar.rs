use std::fmt;

use serde::{Deserialize, Serialize};

use crate::claim::Claim;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pillar {
    Environmental,
    Social,
    Governance,
}

impl Pillar {
    pub const ALL: [Self; 3] = [Self::Environmental, Self::Social, Self::Governance];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Environmental => "environmental",
            Self::Social => "social",
            Self::Governance => "governance",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Keyword lists used to tag free-text claim labels.
///
/// Matching is a case-insensitive substring test, so stems such as
/// `"sustainab"` cover every inflection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PillarKeywords {
    pub environmental: Vec<String>,
    pub social: Vec<String>,
    pub governance: Vec<String>,
    /// Labels treated as whole-subject assessments; they back any pillar that
    /// has no claims of its own.
    pub general: Vec<String>,
}

impl Default for PillarKeywords {
    fn default() -> Self {
        fn words(list: &[&str]) -> Vec<String> {
            list.iter().map(|w| (*w).to_string()).collect()
        }

        Self {
            environmental: words(&[
                "environment",
                "climate",
                "carbon",
                "emission",
                "energy",
                "renewable",
                "pollution",
                "waste",
                "water",
                "sustainab",
                "biodiversity",
                "green",
                "recycl",
            ]),
            social: words(&[
                "social",
                "labor",
                "labour",
                "employee",
                "worker",
                "human rights",
                "diversity",
                "inclusion",
                "community",
                "health",
                "safety",
                "wellbeing",
                "customer",
                "privacy",
            ]),
            governance: words(&[
                "governance",
                "board",
                "ethic",
                "transparen",
                "compliance",
                "corruption",
                "bribery",
                "audit",
                "executive",
                "shareholder",
                "disclosure",
                "accountab",
            ]),
            general: words(&["general", "overall", "esg", "sustainability rating", "rating"]),
        }
    }
}

impl PillarKeywords {
    fn for_pillar(&self, pillar: Pillar) -> &[String] {
        match pillar {
            Pillar::Environmental => &self.environmental,
            Pillar::Social => &self.social,
            Pillar::Governance => &self.governance,
        }
    }

    /// Every pillar whose keyword list matches `label`. May be empty or hold
    /// several pillars.
    pub fn classify(&self, label: &str) -> Vec<Pillar> {
        let lowered = label.to_lowercase();
        Pillar::ALL
            .into_iter()
            .filter(|pillar| matches_any(&lowered, self.for_pillar(*pillar)))
            .collect()
    }

    pub fn matches(&self, label: &str, pillar: Pillar) -> bool {
        matches_any(&label.to_lowercase(), self.for_pillar(pillar))
    }

    pub fn is_general(&self, label: &str) -> bool {
        matches_any(&label.to_lowercase(), &self.general)
    }

    /// Claims backing `pillar`: the ones tagged to it, or the general
    /// assessments when nothing is tagged.
    pub fn select<'a>(&self, claims: &[&'a Claim], pillar: Pillar) -> PillarSelection<'a> {
        let tagged: Vec<&'a Claim> = claims
            .iter()
            .copied()
            .filter(|claim| self.matches(&claim.claim_type, pillar))
            .collect();
        if !tagged.is_empty() {
            return PillarSelection::Tagged(tagged);
        }

        let general: Vec<&'a Claim> = claims
            .iter()
            .copied()
            .filter(|claim| self.is_general(&claim.claim_type))
            .collect();
        if general.is_empty() {
            PillarSelection::Empty
        } else {
            PillarSelection::Fallback(general)
        }
    }
}

fn matches_any(lowered_label: &str, keywords: &[String]) -> bool {
    keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .any(|k| lowered_label.contains(&k.to_lowercase()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PillarSource {
    Tagged,
    Fallback,
    Empty,
}

#[derive(Debug, Clone)]
pub enum PillarSelection<'a> {
    Tagged(Vec<&'a Claim>),
    Fallback(Vec<&'a Claim>),
    Empty,
}

impl<'a> PillarSelection<'a> {
    pub fn claims(&self) -> &[&'a Claim] {
        match self {
            Self::Tagged(claims) | Self::Fallback(claims) => claims,
            Self::Empty => &[],
        }
    }

    pub const fn source(&self) -> PillarSource {
        match self {
            Self::Tagged(_) => PillarSource::Tagged,
            Self::Fallback(_) => PillarSource::Fallback,
            Self::Empty => PillarSource::Empty,
        }
    }
}
