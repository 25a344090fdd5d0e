//! Declarative description of the primary schema: tables, columns, enums,
//! validation rules and access policy. Drives DDL, SQL building, request
//! validation and route registration.

mod enums;
mod schema;

pub use enums::*;
pub use schema::primary_model;

use std::collections::HashMap;

/// Value formats checked on top of the column type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    Email,
    /// `{"lat": f64, "lng": f64}` within geographic bounds.
    Coordinates,
    /// JSON array of strings.
    StringList,
}

#[derive(Clone, Debug, Default)]
pub struct ValidationRule {
    pub required: bool,
    pub format: Option<Format>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub allowed: Option<&'static [&'static str]>,
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
}

/// Broad value kind derived from the SQL type, used for payload type checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Float,
    Bool,
    Timestamp,
    Json,
    Enum,
}

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: &'static str,
    /// SQL type used in DDL and in parameter casts (enum columns use the enum type name).
    pub pg_type: &'static str,
    pub kind: ValueKind,
    pub primary_key: bool,
    pub nullable: bool,
    pub default: Option<&'static str>,
    /// Whether request payloads may set this column.
    pub writable: bool,
    pub unique: bool,
    pub references: Option<(&'static str, &'static str)>,
    pub rule: ValidationRule,
}

impl ColumnInfo {
    fn new(name: &'static str, pg_type: &'static str, kind: ValueKind) -> Self {
        ColumnInfo {
            name,
            pg_type,
            kind,
            primary_key: false,
            nullable: true,
            default: None,
            writable: true,
            unique: false,
            references: None,
            rule: ValidationRule::default(),
        }
    }

    pub fn id() -> Self {
        let mut c = Self::new("id", "integer", ValueKind::Integer);
        c.primary_key = true;
        c.nullable = false;
        c.writable = false;
        c
    }

    pub fn text(name: &'static str) -> Self {
        Self::new(name, "text", ValueKind::Text)
    }

    pub fn varchar(name: &'static str) -> Self {
        Self::new(name, "varchar", ValueKind::Text)
    }

    pub fn integer(name: &'static str) -> Self {
        Self::new(name, "integer", ValueKind::Integer)
    }

    pub fn float(name: &'static str) -> Self {
        Self::new(name, "double precision", ValueKind::Float)
    }

    pub fn boolean(name: &'static str) -> Self {
        Self::new(name, "boolean", ValueKind::Bool)
    }

    pub fn timestamp(name: &'static str) -> Self {
        Self::new(name, "timestamptz", ValueKind::Timestamp)
    }

    pub fn json(name: &'static str) -> Self {
        Self::new(name, "jsonb", ValueKind::Json)
    }

    pub fn enumerated(name: &'static str, ty: &EnumType) -> Self {
        let mut c = Self::new(name, ty.name, ValueKind::Enum);
        c.rule.allowed = Some(ty.values);
        c
    }

    /// NOT NULL in DDL and required on create.
    pub fn required(mut self) -> Self {
        self.nullable = false;
        self.rule.required = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_sql(mut self, expr: &'static str) -> Self {
        self.default = Some(expr);
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn references(mut self, table: &'static str, column: &'static str) -> Self {
        self.references = Some((table, column));
        self
    }

    pub fn range(mut self, min: f64, max: f64) -> Self {
        self.rule.minimum = Some(min);
        self.rule.maximum = Some(max);
        self
    }

    pub fn at_least(mut self, min: f64) -> Self {
        self.rule.minimum = Some(min);
        self
    }

    pub fn length(mut self, min: usize, max: usize) -> Self {
        self.rule.min_length = Some(min);
        self.rule.max_length = Some(max);
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.rule.format = Some(format);
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some() || self.primary_key
    }
}

/// Who may do what with an entity's rows.
#[derive(Clone, Debug)]
pub struct AccessPolicy {
    /// Column tying a row to a user (owner, reporter or addressee).
    pub owner_column: Option<&'static str>,
    /// Owner column is filled from the caller on create and never taken from the payload.
    pub owner_from_caller: bool,
    /// Rows with a NULL owner are visible to everybody (broadcast alerts).
    pub null_owner_is_public: bool,
    /// Roles allowed to create. None means any authenticated user.
    pub create: Option<&'static [Role]>,
    pub read_all: &'static [Role],
    pub update_any: &'static [Role],
    pub owner_may_update: bool,
    pub delete_any: &'static [Role],
    pub owner_may_delete: bool,
}

impl AccessPolicy {
    pub fn can_create(&self, role: Role) -> bool {
        self.create.map(|roles| roles.contains(&role)).unwrap_or(true)
    }

    pub fn sees_everything(&self, role: Role) -> bool {
        self.read_all.contains(&role)
    }

    pub fn can_update(&self, role: Role, is_owner: bool) -> bool {
        self.update_any.contains(&role) || (self.owner_may_update && is_owner)
    }

    pub fn can_delete(&self, role: Role, is_owner: bool) -> bool {
        self.delete_any.contains(&role) || (self.owner_may_delete && is_owner)
    }
}

/// Timestamp column set to NOW() when an update moves `status` to `value`.
#[derive(Clone, Copy, Debug)]
pub struct StatusStamp {
    pub value: &'static str,
    pub column: &'static str,
}

#[derive(Clone, Debug)]
pub struct EntityDef {
    pub table_name: &'static str,
    /// URL segment under the API prefix. None for tables without generic routes.
    pub path_segment: Option<&'static str>,
    pub columns: Vec<ColumnInfo>,
    /// Columns usable as exact-match query filters on list.
    pub filters: &'static [&'static str],
    /// Never included in responses.
    pub sensitive_columns: &'static [&'static str],
    pub status_stamps: &'static [StatusStamp],
    pub access: AccessPolicy,
}

impl EntityDef {
    pub fn pk(&self) -> &'static str {
        self.columns
            .iter()
            .find(|c| c.primary_key)
            .map(|c| c.name)
            .unwrap_or("id")
    }

    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns exposed in responses.
    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns
            .iter()
            .filter(|c| !self.sensitive_columns.contains(&c.name))
    }

    /// Columns a payload may set, minus the owner column when it comes from the caller.
    pub fn is_payload_column(&self, name: &str) -> bool {
        if self.access.owner_from_caller && self.access.owner_column == Some(name) {
            return false;
        }
        self.column(name).map(|c| c.writable).unwrap_or(false)
    }

    pub fn stamps_for_status(&self, status: &str) -> Vec<&'static str> {
        self.status_stamps
            .iter()
            .filter(|s| s.value == status)
            .map(|s| s.column)
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct Model {
    pub enums: Vec<EnumType>,
    /// In dependency order: referenced tables come first.
    pub entities: Vec<EntityDef>,
    by_path: HashMap<&'static str, usize>,
}

impl Model {
    pub fn new(enums: Vec<EnumType>, entities: Vec<EntityDef>) -> Self {
        let by_path = entities
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.path_segment.map(|p| (p, i)))
            .collect();
        Model {
            enums,
            entities,
            by_path,
        }
    }

    pub fn entity_by_path(&self, path: &str) -> Option<&EntityDef> {
        self.by_path.get(path).map(|&i| &self.entities[i])
    }

    pub fn entity_by_table(&self, table: &str) -> Option<&EntityDef> {
        self.entities.iter().find(|e| e.table_name == table)
    }

    pub fn routed_entities(&self) -> impl Iterator<Item = &EntityDef> {
        self.entities.iter().filter(|e| e.path_segment.is_some())
    }
}
