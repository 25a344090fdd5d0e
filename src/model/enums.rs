use serde::{Deserialize, Serialize};

/// A Postgres ENUM type.
#[derive(Clone, Copy, Debug)]
pub struct EnumType {
    pub name: &'static str,
    pub values: &'static [&'static str],
}

pub const USER_ROLE: EnumType = EnumType {
    name: "userrole",
    values: &["admin", "community_leader", "community_member", "researcher"],
};

pub const SOIL_TYPE: EnumType = EnumType {
    name: "soiltype",
    values: &["clay", "sandy", "loamy", "silty", "peat", "chalky"],
};

pub const ANALYSIS_STATUS: EnumType = EnumType {
    name: "analysisstatus",
    values: &["pending", "processing", "completed", "failed"],
};

pub const OCCURRENCE_TYPE: EnumType = EnumType {
    name: "occurrencetype",
    values: &[
        "deforestation",
        "illegal_mining",
        "poaching",
        "pollution",
        "fire",
        "erosion",
        "contamination",
    ],
};

pub const SEVERITY_LEVEL: EnumType = EnumType {
    name: "severitylevel",
    values: &["low", "medium", "high", "critical"],
};

pub const OCCURRENCE_STATUS: EnumType = EnumType {
    name: "occurrencestatus",
    values: &["reported", "investigating", "confirmed", "resolved", "dismissed"],
};

pub const ALERT_TYPE: EnumType = EnumType {
    name: "alerttype",
    values: &[
        "soil_contamination",
        "water_pollution",
        "air_quality",
        "deforestation",
        "illegal_logging",
        "illegal_mining",
        "poaching",
        "fire_risk",
        "flood_risk",
        "drought",
        "pest_outbreak",
        "disease_outbreak",
    ],
};

pub const ALERT_SEVERITY: EnumType = EnumType {
    name: "alertseverity",
    values: &["low", "medium", "high", "critical"],
};

pub const ALERT_STATUS: EnumType = EnumType {
    name: "alertstatus",
    values: &["active", "acknowledged", "resolved", "dismissed"],
};

/// Primary-schema user role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "userrole", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    CommunityLeader,
    CommunityMember,
    Researcher,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::CommunityLeader => "community_leader",
            Role::CommunityMember => "community_member",
            Role::Researcher => "researcher",
        }
    }

    /// Roles a user may pick for themselves at registration.
    pub fn self_assignable(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::CommunityMember
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "community_leader" => Ok(Role::CommunityLeader),
            "community_member" => Ok(Role::CommunityMember),
            "researcher" => Ok(Role::Researcher),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_strings_match_enum_type() {
        for value in USER_ROLE.values {
            let role: Role = value.parse().unwrap();
            assert_eq!(role.as_str(), *value);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn admin_is_not_self_assignable() {
        assert!(!Role::Admin.self_assignable());
        assert!(Role::Researcher.self_assignable());
    }
}
