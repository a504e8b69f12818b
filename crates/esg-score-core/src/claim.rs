use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single third-party assessment of a subject along one labelled aspect.
///
/// Claims arrive already shaped by the data-access layer: `id`, `subject` and
/// `claim_type` are always present. Every scoring field is optional and the
/// engine substitutes documented defaults when one is absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claim {
    pub id: String,
    pub subject: String,
    pub claim_type: String,
    /// Continuous assessment in `[-1, 1]`.
    #[serde(default)]
    pub score: Option<f64>,
    /// Discrete star rating in `[0, 5]`; zero means "not rated".
    #[serde(default)]
    pub stars: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub source: Option<String>,
    /// Curator that issued the claim.
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub validators: Vec<Validator>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Validator {
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub organization: String,
    pub rating: f64,
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub verified: bool,
}

impl Claim {
    pub fn new(
        id: impl Into<String>,
        subject: impl Into<String>,
        claim_type: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            subject: subject.into(),
            claim_type: claim_type.into(),
            score: None,
            stars: None,
            confidence: None,
            created_at,
            statement: String::new(),
            source: None,
            author: None,
            validators: Vec::new(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = Some(score);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn with_stars(mut self, stars: f64) -> Self {
        self.stars = Some(stars);
        self
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = statement.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Score clamped to `[-1, 1]`, zero when absent or not finite.
    pub fn effective_score(&self) -> f64 {
        self.score
            .filter(|s| s.is_finite())
            .map_or(0.0, |s| s.clamp(-1.0, 1.0))
    }

    /// Confidence clamped to `[0, 1]`, `default` when absent or not finite.
    pub fn effective_confidence(&self, default: f64) -> f64 {
        self.confidence
            .filter(|c| c.is_finite())
            .unwrap_or(default)
            .clamp(0.0, 1.0)
    }

    /// Own star rating when it counts as a rating (strictly positive).
    pub fn own_rating(&self) -> Option<f64> {
        self.stars
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(|s| s.min(5.0))
    }
}

impl Validator {
    pub fn new(name: impl Into<String>, rating: f64) -> Self {
        Self {
            name: name.into(),
            role: String::new(),
            organization: String::new(),
            rating,
            statement: String::new(),
            verified: false,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    pub fn with_statement(mut self, statement: impl Into<String>) -> Self {
        self.statement = statement.into();
        self
    }

    pub fn verified(mut self, verified: bool) -> Self {
        self.verified = verified;
        self
    }

    pub fn counted_rating(&self) -> Option<f64> {
        Some(self.rating)
            .filter(|r| r.is_finite() && *r > 0.0)
            .map(|r| r.min(5.0))
    }
}
