use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Which record field a pool value is chosen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Carrier,
    Owner,
    User,
}

/// The concrete option pools. Owner and user share `People`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolKind {
    Carriers,
    People,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Carrier, Role::Owner, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Carrier => "carrier",
            Self::Owner => "owner",
            Self::User => "user",
        }
    }

    pub fn pool(&self) -> PoolKind {
        match self {
            Self::Carrier => PoolKind::Carriers,
            Self::Owner | Self::User => PoolKind::People,
        }
    }

    /// Display label used by the presentation layer.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Carrier => "キャリア",
            Self::Owner => "名義",
            Self::User => "利用者",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "carrier" => Ok(Self::Carrier),
            "owner" => Ok(Self::Owner),
            "user" => Ok(Self::User),
            other => Err(ProtocolError::UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_and_user_share_people_pool() {
        assert_eq!(Role::Carrier.pool(), PoolKind::Carriers);
        assert_eq!(Role::Owner.pool(), PoolKind::People);
        assert_eq!(Role::User.pool(), PoolKind::People);
    }

    #[test]
    fn parses_labels() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert_eq!(
            "carriers".parse::<Role>(),
            Err(ProtocolError::UnknownRole("carriers".into()))
        );
    }
}
