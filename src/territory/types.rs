//! Enumerations and request payloads of the territory API. Wire names are Portuguese.

use crate::error::AppError;
use crate::service::is_valid_email;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Declares a closed set of wire strings with `as_str`, `FromStr` and a CHECK-list helper.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $wire)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }

            /// `'a', 'b', ...` for SQL CHECK constraints.
            pub fn sql_list() -> String {
                Self::ALL
                    .iter()
                    .map(|v| format!("'{}'", v.as_str()))
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl std::str::FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(AppError::Validation(format!(
                        "valor inválido '{}' para {}",
                        other,
                        stringify!($name)
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// `tipo_usuario`.
    TerritoryRole {
        Administrator => "administrador",
        TerritorialLeader => "lider_territorial",
        EnvironmentalMonitor => "monitor_ambiental",
        CommunityMember => "membro_comunidade",
        Researcher => "pesquisador",
    }
}

wire_enum! {
    /// `status` of a territory user. Only `ativo` may log in.
    UserStatus {
        Active => "ativo",
        Inactive => "inativo",
        Pending => "pendente",
        Blocked => "bloqueado",
    }
}

wire_enum! {
    OccurrenceKind {
        Deforestation => "desmatamento",
        Burning => "queimada",
        Poaching => "caca_pesca",
        Flood => "enchente",
        Pollution => "poluicao",
        IllegalMining => "mineracao_ilegal",
    }
}

wire_enum! {
    Severity {
        Low => "baixa",
        Medium => "media",
        High => "alta",
        Critical => "critica",
    }
}

wire_enum! {
    OccurrenceStatus {
        Reported => "reportada",
        Investigating => "investigando",
        Confirmed => "confirmada",
        Resolved => "resolvida",
        Dismissed => "descartada",
    }
}

impl TerritoryRole {
    pub fn label(&self) -> &'static str {
        match self {
            TerritoryRole::Administrator => "Administrador",
            TerritoryRole::TerritorialLeader => "Líder Territorial",
            TerritoryRole::EnvironmentalMonitor => "Monitor Ambiental",
            TerritoryRole::CommunityMember => "Membro da Comunidade",
            TerritoryRole::Researcher => "Pesquisador",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TerritoryRole::Administrator => "Acesso total ao sistema e gerenciamento de usuários",
            TerritoryRole::TerritorialLeader => "Gerencia território específico e suas atividades",
            TerritoryRole::EnvironmentalMonitor => "Coleta e análise de dados ambientais",
            TerritoryRole::CommunityMember => "Acesso básico para membros da comunidade",
            TerritoryRole::Researcher => "Acesso para pesquisa e análise de dados",
        }
    }
}

fn invalid(msg: impl Into<String>) -> AppError {
    AppError::Validation(msg.into())
}

fn check_len(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(invalid(format!("{} deve ter entre {} e {} caracteres", field, min, max)));
    }
    Ok(())
}

fn check_max(field: &str, value: Option<&str>, max: usize) -> Result<(), AppError> {
    match value {
        Some(v) if v.chars().count() > max => Err(invalid(format!("{} deve ter no máximo {} caracteres", field, max))),
        _ => Ok(()),
    }
}

fn check_age(idade: Option<i32>) -> Result<(), AppError> {
    match idade {
        Some(age) if !(0..=150).contains(&age) => Err(invalid("idade deve estar entre 0 e 150")),
        _ => Ok(()),
    }
}

/// Trims and capitalizes each word: `"  maria  da silva "` becomes `"Maria Da Silva"`.
pub fn title_case(name: &str) -> String {
    name.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Digits only once `(`, `)`, `-` and spaces are removed.
pub fn is_valid_phone(phone: &str) -> bool {
    let digits: String = phone.chars().filter(|c| !matches!(c, '(' | ')' | '-' | ' ')).collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// 8..=128 characters with at least one digit and one letter.
pub fn check_password_strength(field: &str, password: &str) -> Result<(), AppError> {
    let len = password.chars().count();
    if len < 8 {
        return Err(invalid(format!("{} deve ter pelo menos 8 caracteres", field)));
    }
    if len > 128 {
        return Err(invalid(format!("{} deve ter no máximo 128 caracteres", field)));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(invalid(format!("{} deve conter pelo menos um número", field)));
    }
    if !password.chars().any(char::is_alphabetic) {
        return Err(invalid(format!("{} deve conter pelo menos uma letra", field)));
    }
    Ok(())
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "nome")]
    pub name: String,
    pub email: String,
    #[serde(rename = "tipo_usuario")]
    pub role: TerritoryRole,
    #[serde(rename = "territorio_id")]
    pub territory_id: Option<i32>,
    #[serde(rename = "telefone")]
    pub phone: Option<String>,
    #[serde(rename = "nome_social")]
    pub social_name: Option<String>,
    #[serde(rename = "nome_indigena")]
    pub indigenous_name: Option<String>,
    #[serde(rename = "idade")]
    pub age: Option<i32>,
    #[serde(rename = "principal_atuacao")]
    pub main_activity: Option<String>,
    #[serde(rename = "aldeia_comunidade")]
    pub village: Option<String>,
    #[serde(rename = "localizacao_territorio")]
    pub territory_location: Option<String>,
    #[serde(rename = "aceite_lgpd", default = "default_true")]
    pub privacy_consent: bool,
    #[serde(rename = "senha")]
    pub password: String,
    #[serde(rename = "confirmar_senha")]
    pub password_confirmation: String,
}

impl RegisterRequest {
    /// Validates and normalizes the name (title case) and email (lowercase).
    pub fn validate(mut self) -> Result<Self, AppError> {
        if self.name.trim().is_empty() {
            return Err(invalid("Nome não pode estar vazio"));
        }
        self.name = title_case(&self.name);
        check_len("nome", &self.name, 2, 100)?;
        self.email = self.email.trim().to_lowercase();
        if !is_valid_email(&self.email) {
            return Err(invalid("email inválido"));
        }
        self.phone = self.phone.take().filter(|p| !p.trim().is_empty());
        if let Some(phone) = &self.phone {
            check_max("telefone", Some(phone), 20)?;
            if !is_valid_phone(phone) {
                return Err(invalid("Formato de telefone inválido"));
            }
        }
        check_max("nome_social", self.social_name.as_deref(), 100)?;
        check_max("nome_indigena", self.indigenous_name.as_deref(), 100)?;
        check_age(self.age)?;
        check_max("principal_atuacao", self.main_activity.as_deref(), 200)?;
        check_max("aldeia_comunidade", self.village.as_deref(), 200)?;
        check_max("localizacao_territorio", self.territory_location.as_deref(), 200)?;
        check_password_strength("Senha", &self.password)?;
        if self.password != self.password_confirmation {
            return Err(invalid("Senhas não conferem"));
        }
        Ok(self)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    #[serde(rename = "senha")]
    pub password: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    #[serde(rename = "nome_social")]
    pub social_name: Option<String>,
    #[serde(rename = "nome_indigena")]
    pub indigenous_name: Option<String>,
    #[serde(rename = "idade")]
    pub age: Option<i32>,
    #[serde(rename = "principal_atuacao")]
    pub main_activity: Option<String>,
    #[serde(rename = "aldeia_comunidade")]
    pub village: Option<String>,
    #[serde(rename = "localizacao_territorio")]
    pub territory_location: Option<String>,
}

impl ProfileUpdateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_max("nome_social", self.social_name.as_deref(), 100)?;
        check_max("nome_indigena", self.indigenous_name.as_deref(), 100)?;
        check_age(self.age)?;
        check_max("principal_atuacao", self.main_activity.as_deref(), 200)?;
        check_max("aldeia_comunidade", self.village.as_deref(), 200)?;
        check_max("localizacao_territorio", self.territory_location.as_deref(), 200)?;
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.social_name.is_none()
            && self.indigenous_name.is_none()
            && self.age.is_none()
            && self.main_activity.is_none()
            && self.village.is_none()
            && self.territory_location.is_none()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(rename = "senha_atual")]
    pub current_password: String,
    #[serde(rename = "nova_senha")]
    pub new_password: String,
    #[serde(rename = "confirmar_nova_senha")]
    pub new_password_confirmation: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_password_strength("Nova senha", &self.new_password)?;
        if self.new_password != self.new_password_confirmation {
            return Err(invalid("Senhas não conferem"));
        }
        Ok(())
    }
}

/// `{lat, lng}` in geographic bounds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn validate(&self) -> Result<(), AppError> {
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(invalid("Latitude deve estar entre -90 e 90"));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(invalid("Longitude deve estar entre -180 e 180"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OccurrenceCreateRequest {
    #[serde(rename = "tipo_ocorrencia")]
    pub kind: OccurrenceKind,
    #[serde(rename = "localizacao")]
    pub location: String,
    #[serde(rename = "grau_severidade")]
    pub severity: Severity,
    #[serde(rename = "descricao")]
    pub description: String,
    #[serde(rename = "coordenadas")]
    pub coordinates: Option<Coordinates>,
    #[serde(rename = "imagens", default)]
    pub images: Option<Vec<String>>,
}

impl OccurrenceCreateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_len("localizacao", &self.location, 5, 200)?;
        check_len("descricao", &self.description, 10, 1000)?;
        if let Some(coords) = &self.coordinates {
            coords.validate()?;
        }
        Ok(())
    }

    pub fn images_json(&self) -> Value {
        Value::from(self.images.clone().unwrap_or_default())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OccurrenceUpdateRequest {
    pub status: Option<OccurrenceStatus>,
    #[serde(rename = "notas_investigacao")]
    pub investigation_notes: Option<String>,
    #[serde(rename = "notas_resolucao")]
    pub resolution_notes: Option<String>,
}

impl OccurrenceUpdateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_max("notas_investigacao", self.investigation_notes.as_deref(), 1000)?;
        check_max("notas_resolucao", self.resolution_notes.as_deref(), 1000)?;
        if self.status.is_none() && self.investigation_notes.is_none() && self.resolution_notes.is_none() {
            return Err(invalid("Nenhum campo para atualizar"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TerritoryCreateRequest {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "estado")]
    pub state: String,
    #[serde(rename = "municipio")]
    pub municipality: String,
    pub area_hectares: Option<f64>,
    #[serde(rename = "populacao")]
    pub population: Option<i32>,
    #[serde(rename = "coordenadas_lat")]
    pub latitude: Option<f64>,
    #[serde(rename = "coordenadas_lng")]
    pub longitude: Option<f64>,
}

impl TerritoryCreateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        check_len("nome", self.name.trim(), 2, 200)?;
        check_len("estado", self.state.trim(), 2, 50)?;
        check_len("municipio", self.municipality.trim(), 2, 100)?;
        if self.area_hectares.map_or(false, |a| a < 0.0) {
            return Err(invalid("area_hectares deve ser maior ou igual a 0"));
        }
        if self.population.map_or(false, |p| p < 0) {
            return Err(invalid("populacao deve ser maior ou igual a 0"));
        }
        if self.latitude.map_or(false, |lat| !(-90.0..=90.0).contains(&lat)) {
            return Err(invalid("Latitude deve estar entre -90 e 90"));
        }
        if self.longitude.map_or(false, |lng| !(-180.0..=180.0).contains(&lng)) {
            return Err(invalid("Longitude deve estar entre -180 e 180"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn register(v: Value) -> RegisterRequest {
        serde_json::from_value(v).unwrap()
    }

    fn base() -> Value {
        json!({
            "nome": "  maria   DA silva ",
            "email": "Maria@Aldeia.org",
            "tipo_usuario": "membro_comunidade",
            "telefone": "(69) 99999-0000",
            "senha": "floresta1",
            "confirmar_senha": "floresta1"
        })
    }

    #[test]
    fn register_normalizes_name_and_email() {
        let req = register(base()).validate().unwrap();
        assert_eq!(req.name, "Maria Da Silva");
        assert_eq!(req.email, "maria@aldeia.org");
        assert!(req.privacy_consent);
        assert_eq!(req.role, TerritoryRole::CommunityMember);
    }

    #[test]
    fn register_rejects_weak_or_mismatched_passwords() {
        let mut v = base();
        v["senha"] = json!("somenteletras");
        v["confirmar_senha"] = json!("somenteletras");
        assert!(register(v).validate().is_err());

        let mut v = base();
        v["confirmar_senha"] = json!("floresta2");
        let err = register(v).validate().unwrap_err();
        assert!(matches!(err, AppError::Validation(m) if m == "Senhas não conferem"));
    }

    #[test]
    fn register_rejects_bad_phone_and_short_name() {
        let mut v = base();
        v["telefone"] = json!("69-ABC");
        assert!(register(v).validate().is_err());

        let mut v = base();
        v["nome"] = json!(" a ");
        assert!(register(v).validate().is_err());
    }

    #[test]
    fn blank_phone_counts_as_absent() {
        for blank in ["", "   "] {
            let mut v = base();
            v["telefone"] = json!(blank);
            assert_eq!(register(v).validate().unwrap().phone, None);
        }
    }

    #[test]
    fn unknown_role_fails_to_deserialize() {
        let mut v = base();
        v["tipo_usuario"] = json!("superuser");
        assert!(serde_json::from_value::<RegisterRequest>(v).is_err());
    }

    #[test]
    fn wire_names_round_trip() {
        for role in TerritoryRole::ALL {
            assert_eq!(role.as_str().parse::<TerritoryRole>().unwrap(), *role);
        }
        assert_eq!(serde_json::to_value(OccurrenceKind::Poaching).unwrap(), json!("caca_pesca"));
        assert_eq!(Severity::sql_list(), "'baixa', 'media', 'alta', 'critica'");
    }

    #[test]
    fn occurrence_payload_bounds() {
        let ok: OccurrenceCreateRequest = serde_json::from_value(json!({
            "tipo_ocorrencia": "queimada",
            "localizacao": "Aldeia Central",
            "grau_severidade": "alta",
            "descricao": "Foco de queimada próximo ao rio",
            "coordenadas": {"lat": -10.5, "lng": -62.1}
        }))
        .unwrap();
        assert!(ok.validate().is_ok());
        assert_eq!(ok.images_json(), json!([]));

        let bad: OccurrenceCreateRequest = serde_json::from_value(json!({
            "tipo_ocorrencia": "queimada",
            "localizacao": "Aldeia Central",
            "grau_severidade": "alta",
            "descricao": "curta"
        }))
        .unwrap();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn empty_occurrence_update_is_rejected() {
        assert!(OccurrenceUpdateRequest::default().validate().is_err());
        let notes = OccurrenceUpdateRequest {
            investigation_notes: Some("x".repeat(1001)),
            ..Default::default()
        };
        assert!(notes.validate().is_err());
    }
}
