use super::*;

const STAFF: &[Role] = &[Role::Admin, Role::CommunityLeader];
const ADMIN: &[Role] = &[Role::Admin];

fn timestamps() -> [ColumnInfo; 2] {
    [
        ColumnInfo::timestamp("created_at").not_null().read_only().default_sql("NOW()"),
        ColumnInfo::timestamp("updated_at").read_only(),
    ]
}

fn users() -> EntityDef {
    let mut columns = vec![
        ColumnInfo::id(),
        ColumnInfo::varchar("email").required().unique().format(Format::Email),
        ColumnInfo::varchar("hashed_password").required().read_only(),
        ColumnInfo::varchar("name").required().length(1, 100),
        ColumnInfo::enumerated("role", &USER_ROLE).not_null().default_sql("'community_member'"),
        ColumnInfo::boolean("is_active").not_null().default_sql("TRUE").read_only(),
        ColumnInfo::boolean("is_verified").not_null().default_sql("FALSE").read_only(),
        ColumnInfo::integer("age").range(0.0, 150.0),
        ColumnInfo::text("bio"),
        ColumnInfo::varchar("avatar_url"),
        ColumnInfo::boolean("notifications_enabled").not_null().default_sql("TRUE"),
        ColumnInfo::varchar("language").not_null().default_sql("'pt-BR'"),
    ];
    columns.extend(timestamps());
    columns.push(ColumnInfo::timestamp("last_login").read_only());
    EntityDef {
        table_name: "users",
        path_segment: None,
        columns,
        filters: &[],
        sensitive_columns: &["hashed_password"],
        status_stamps: &[],
        access: AccessPolicy {
            owner_column: Some("id"),
            owner_from_caller: false,
            null_owner_is_public: false,
            create: Some(ADMIN),
            read_all: ADMIN,
            update_any: ADMIN,
            owner_may_update: true,
            delete_any: &[],
            owner_may_delete: false,
        },
    }
}

fn soil_analyses() -> EntityDef {
    let mut columns = vec![
        ColumnInfo::id(),
        ColumnInfo::varchar("title").required().length(1, 200),
        ColumnInfo::varchar("location").required().length(1, 200),
        ColumnInfo::json("coordinates").format(Format::Coordinates),
        ColumnInfo::varchar("sector"),
        ColumnInfo::enumerated("status", &ANALYSIS_STATUS).default_sql("'pending'"),
        ColumnInfo::timestamp("analysis_date"),
        ColumnInfo::enumerated("soil_type", &SOIL_TYPE),
        ColumnInfo::float("ph_level").range(0.0, 14.0),
        ColumnInfo::float("humidity").range(0.0, 100.0),
        ColumnInfo::float("temperature"),
        ColumnInfo::float("nitrogen").at_least(0.0),
        ColumnInfo::float("phosphorus").at_least(0.0),
        ColumnInfo::float("potassium").at_least(0.0),
        ColumnInfo::float("calcium").at_least(0.0),
        ColumnInfo::float("magnesium").at_least(0.0),
        ColumnInfo::float("sulfur").at_least(0.0),
        ColumnInfo::varchar("texture"),
        ColumnInfo::varchar("water_retention"),
        ColumnInfo::varchar("drainage"),
        ColumnInfo::float("organic_matter").range(0.0, 100.0),
        ColumnInfo::varchar("fertility_level"),
        ColumnInfo::text("recommendations"),
        ColumnInfo::text("notes"),
        ColumnInfo::json("images").format(Format::StringList),
    ];
    columns.extend(timestamps());
    columns.push(ColumnInfo::integer("user_id").not_null().references("users", "id"));
    EntityDef {
        table_name: "soil_analyses",
        path_segment: Some("soil-analyses"),
        columns,
        filters: &["status", "soil_type", "sector", "user_id"],
        sensitive_columns: &[],
        status_stamps: &[],
        access: AccessPolicy {
            owner_column: Some("user_id"),
            owner_from_caller: true,
            null_owner_is_public: false,
            create: None,
            read_all: &[Role::Admin, Role::Researcher],
            update_any: ADMIN,
            owner_may_update: true,
            delete_any: ADMIN,
            owner_may_delete: true,
        },
    }
}

fn occurrences() -> EntityDef {
    let mut columns = vec![
        ColumnInfo::id(),
        ColumnInfo::varchar("title").required().length(1, 200),
        ColumnInfo::enumerated("occurrence_type", &OCCURRENCE_TYPE).required(),
        ColumnInfo::enumerated("severity", &SEVERITY_LEVEL).required(),
        ColumnInfo::enumerated("status", &OCCURRENCE_STATUS).default_sql("'reported'"),
        ColumnInfo::varchar("location").required().length(1, 200),
        ColumnInfo::json("coordinates").format(Format::Coordinates),
        ColumnInfo::text("description").required().length(1, 5000),
        ColumnInfo::text("additional_notes"),
        ColumnInfo::json("images").format(Format::StringList),
        ColumnInfo::json("evidence_files").format(Format::StringList),
        ColumnInfo::timestamp("occurred_at"),
        ColumnInfo::text("investigation_notes"),
        ColumnInfo::text("resolution_notes"),
        ColumnInfo::timestamp("resolved_at").read_only(),
    ];
    columns.extend(timestamps());
    columns.push(ColumnInfo::integer("reported_by_id").not_null().references("users", "id"));
    EntityDef {
        table_name: "occurrences",
        path_segment: Some("environmental-occurrences"),
        columns,
        filters: &["status", "severity", "occurrence_type", "reported_by_id"],
        sensitive_columns: &[],
        status_stamps: &[StatusStamp {
            value: "resolved",
            column: "resolved_at",
        }],
        access: AccessPolicy {
            owner_column: Some("reported_by_id"),
            owner_from_caller: true,
            null_owner_is_public: false,
            create: None,
            read_all: &[Role::Admin, Role::CommunityLeader, Role::Researcher],
            update_any: STAFF,
            owner_may_update: true,
            delete_any: ADMIN,
            owner_may_delete: false,
        },
    }
}

fn alerts() -> EntityDef {
    let mut columns = vec![
        ColumnInfo::id(),
        ColumnInfo::varchar("title").required().length(1, 200),
        ColumnInfo::enumerated("alert_type", &ALERT_TYPE).required(),
        ColumnInfo::enumerated("severity", &ALERT_SEVERITY).required(),
        ColumnInfo::enumerated("status", &ALERT_STATUS).default_sql("'active'"),
        ColumnInfo::varchar("location"),
        ColumnInfo::json("coordinates").format(Format::Coordinates),
        ColumnInfo::varchar("affected_area"),
        ColumnInfo::text("description").required().length(1, 5000),
        ColumnInfo::text("details"),
        ColumnInfo::varchar("source"),
        ColumnInfo::integer("confidence_level").range(0.0, 100.0),
        ColumnInfo::text("recommended_actions"),
        ColumnInfo::varchar("emergency_contact"),
        ColumnInfo::timestamp("triggered_at").default_sql("NOW()"),
        ColumnInfo::timestamp("expires_at"),
        ColumnInfo::timestamp("acknowledged_at").read_only(),
        ColumnInfo::timestamp("resolved_at").read_only(),
        ColumnInfo::boolean("notifications_sent").not_null().default_sql("FALSE").read_only(),
        ColumnInfo::json("notification_channels").format(Format::StringList),
        ColumnInfo::json("images").format(Format::StringList),
        ColumnInfo::json("data_sources").format(Format::StringList),
        ColumnInfo::integer("related_occurrence_id").references("occurrences", "id"),
        ColumnInfo::integer("related_analysis_id").references("soil_analyses", "id"),
    ];
    columns.extend(timestamps());
    columns.push(ColumnInfo::integer("user_id").references("users", "id"));
    EntityDef {
        table_name: "alerts",
        path_segment: Some("alerts"),
        columns,
        filters: &["status", "severity", "alert_type", "user_id"],
        sensitive_columns: &[],
        status_stamps: &[
            StatusStamp {
                value: "acknowledged",
                column: "acknowledged_at",
            },
            StatusStamp {
                value: "resolved",
                column: "resolved_at",
            },
        ],
        access: AccessPolicy {
            owner_column: Some("user_id"),
            owner_from_caller: false,
            null_owner_is_public: true,
            create: Some(STAFF),
            read_all: STAFF,
            update_any: STAFF,
            owner_may_update: false,
            delete_any: ADMIN,
            owner_may_delete: false,
        },
    }
}

/// The primary schema, tables in foreign-key dependency order.
pub fn primary_model() -> Model {
    Model::new(
        vec![
            USER_ROLE,
            SOIL_TYPE,
            ANALYSIS_STATUS,
            OCCURRENCE_TYPE,
            SEVERITY_LEVEL,
            OCCURRENCE_STATUS,
            ALERT_TYPE,
            ALERT_SEVERITY,
            ALERT_STATUS,
        ],
        vec![users(), soil_analyses(), occurrences(), alerts()],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn references_point_at_earlier_tables() {
        let model = primary_model();
        let mut seen = HashSet::new();
        for entity in &model.entities {
            for col in &entity.columns {
                if let Some((table, column)) = col.references {
                    assert!(seen.contains(table), "{} references later table {}", entity.table_name, table);
                    let target = model.entity_by_table(table).unwrap();
                    assert!(target.column(column).is_some());
                }
            }
            seen.insert(entity.table_name);
        }
    }

    #[test]
    fn enum_columns_use_declared_types() {
        let model = primary_model();
        let names: HashSet<_> = model.enums.iter().map(|e| e.name).collect();
        for entity in &model.entities {
            for col in entity.columns.iter().filter(|c| c.kind == ValueKind::Enum) {
                assert!(names.contains(col.pg_type), "{}.{}", entity.table_name, col.name);
            }
        }
    }

    #[test]
    fn owner_is_not_a_payload_column_when_taken_from_caller() {
        let model = primary_model();
        let soil = model.entity_by_path("soil-analyses").unwrap();
        assert!(!soil.is_payload_column("user_id"));
        assert!(!soil.is_payload_column("created_at"));
        assert!(soil.is_payload_column("ph_level"));
        let alerts = model.entity_by_path("alerts").unwrap();
        assert!(alerts.is_payload_column("user_id"));
    }

    #[test]
    fn users_are_not_routed_generically() {
        let model = primary_model();
        assert!(model.routed_entities().all(|e| e.table_name != "users"));
        assert_eq!(model.routed_entities().count(), 3);
    }

    #[test]
    fn resolving_an_occurrence_stamps_resolved_at() {
        let model = primary_model();
        let occ = model.entity_by_path("environmental-occurrences").unwrap();
        assert_eq!(occ.stamps_for_status("resolved"), vec!["resolved_at"]);
        assert!(occ.stamps_for_status("confirmed").is_empty());
    }
}
