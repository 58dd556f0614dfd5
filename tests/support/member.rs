use derived_repo::{AuditFields, Auditable, Record};
use serde::{Deserialize, Serialize};

use super::team::Team;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Record)]
#[record(collection = "members")]
pub struct Member {
    #[record(id)]
    pub id: Option<u64>,
    pub username: String,
    pub age: i32,
    pub team_id: Option<u64>,
    pub score: f64,
    #[serde(default)]
    pub audit: AuditFields,
}

impl Member {
    pub fn new(username: &str, age: i32) -> Self {
        Self {
            id: None,
            username: username.to_string(),
            age,
            team_id: None,
            score: 0.0,
            audit: AuditFields::default(),
        }
    }

    pub fn named(username: &str) -> Self {
        Self::new(username, 0)
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    /// Point the member at a saved team.
    pub fn in_team(mut self, team: &Team) -> Self {
        self.team_id = team.id;
        self
    }
}

impl Auditable for Member {
    fn audit(&self) -> &AuditFields {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

/// Flat view of a member and its team name.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDto {
    pub id: u64,
    pub username: String,
    pub team_name: Option<String>,
}
