use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::{errors::ValidationError, ids::UserId};

const TRAINER_RULES: [Rule; 2] = [Rule::ViewSchedule, Rule::MarkAttendance];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Owner,
    Admin,
    Manager,
    Trainer,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    ViewSchedule,
    MarkAttendance,
    EditSchedule,
    ManageAssignments,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Rights {
    full: bool,
    rights: Vec<Rule>,
}

impl Rights {
    pub fn full() -> Self {
        Rights {
            full: true,
            rights: vec![],
        }
    }

    pub fn trainer() -> Self {
        Rights {
            full: false,
            rights: TRAINER_RULES.to_vec(),
        }
    }

    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Trainer => Rights::trainer(),
            Role::Owner | Role::Admin | Role::Manager => Rights::full(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    pub fn has_rule(&self, rule: Rule) -> bool {
        if self.full {
            return true;
        }
        self.rights.contains(&rule)
    }

    pub fn ensure(&self, rule: Rule) -> Result<(), ValidationError> {
        if !self.has_rule(rule) {
            return Err(ValidationError::ReadOnly(rule));
        }
        Ok(())
    }
}

/// Current user as supplied by the auth subsystem.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    pub rights: Rights,
}

impl Actor {
    pub fn new(user_id: UserId, role: Role) -> Actor {
        Actor {
            user_id,
            role,
            rights: Rights::for_role(role),
        }
    }

    pub fn is_trainer(&self) -> bool {
        self.role == Role::Trainer
    }

    pub fn is_read_only(&self) -> bool {
        !self.rights.has_rule(Rule::EditSchedule)
    }

    pub fn ensure(&self, rule: Rule) -> Result<(), ValidationError> {
        self.rights.ensure(rule)
    }
}
