//! Sample data for development databases.

use crate::auth::password;
use crate::error::AppError;
use crate::model::{primary_model, EntityDef, Model, Role};
use crate::service::{row_id, CrudService, NewUser, User, UserStore};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use sqlx::PgPool;
use std::collections::HashMap;

struct SeedUser {
    email: &'static str,
    name: &'static str,
    role: Role,
    password: &'static str,
    bio: &'static str,
    age: i32,
    verified: bool,
}

const USERS: &[SeedUser] = &[
    SeedUser {
        email: "admin@ecosolo.com",
        name: "Administrador EcoSolo",
        role: Role::Admin,
        password: "admin123",
        bio: "Administrador principal da plataforma EcoSolo",
        age: 35,
        verified: true,
    },
    SeedUser {
        email: "priya@example.com",
        name: "Priya Santos",
        role: Role::CommunityLeader,
        password: "123456",
        bio: "Líder comunitária na região de Rondônia, especialista em conservação",
        age: 42,
        verified: true,
    },
    SeedUser {
        email: "joao.silva@ecosolo.com",
        name: "João Silva",
        role: Role::CommunityMember,
        password: "123456",
        bio: "Morador local, agricultor e ativista ambiental",
        age: 38,
        verified: false,
    },
    SeedUser {
        email: "maria.oliveira@ecosolo.com",
        name: "Maria Oliveira",
        role: Role::Researcher,
        password: "123456",
        bio: "Pesquisadora em ciências ambientais, especialista em análise de solo",
        age: 45,
        verified: true,
    },
    SeedUser {
        email: "carlos.santos@ecosolo.com",
        name: "Carlos Santos",
        role: Role::CommunityMember,
        password: "123456",
        bio: "Técnico agrícola, especialista em conservação do solo",
        age: 32,
        verified: false,
    },
];

/// Row counts created by one seeding run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub users: usize,
    pub soil_analyses: usize,
    pub occurrences: usize,
    pub alerts: usize,
}

/// Creates missing sample users, then sample rows for each entity table that is still empty.
pub async fn seed_database(pool: &PgPool, bcrypt_cost: u32) -> Result<SeedReport, AppError> {
    let model = primary_model();
    let mut report = SeedReport::default();

    let mut users = Vec::with_capacity(USERS.len());
    for seed in USERS {
        if let Some(existing) = UserStore::by_email(pool, seed.email).await? {
            tracing::debug!(email = seed.email, "seed user exists");
            users.push(existing);
            continue;
        }
        users.push(create_user(pool, seed, bcrypt_cost).await?);
        report.users += 1;
    }

    let analyses = seed_entity(pool, &model, "soil-analyses", soil_analyses(), |i| {
        Some(("user_id", i64::from(users[i % users.len()].id)))
    })
    .await?;
    report.soil_analyses = analyses.len();

    let occurrences = seed_entity(pool, &model, "environmental-occurrences", occurrences(), |i| {
        Some(("reported_by_id", i64::from(users[(i + 1) % users.len()].id)))
    })
    .await?;
    report.occurrences = occurrences.len();

    let mut alert_bodies = alerts();
    for (i, body) in alert_bodies.iter_mut().enumerate() {
        body.insert("user_id".into(), json!(users[i % users.len()].id));
        if let Some(id) = occurrences.get(i) {
            body.insert("related_occurrence_id".into(), json!(id));
        }
        if let Some(id) = analyses.get(i) {
            body.insert("related_analysis_id".into(), json!(id));
        }
    }
    let alert_ids = seed_entity(pool, &model, "alerts", alert_bodies, |_| None).await?;
    if !alert_ids.is_empty() {
        sqlx::query("UPDATE alerts SET notifications_sent = TRUE WHERE id = ANY($1)")
            .bind(&alert_ids)
            .execute(pool)
            .await?;
    }
    report.alerts = alert_ids.len();

    tracing::info!(
        users = report.users,
        soil_analyses = report.soil_analyses,
        occurrences = report.occurrences,
        alerts = report.alerts,
        "seed complete"
    );
    Ok(report)
}

async fn create_user(pool: &PgPool, seed: &SeedUser, cost: u32) -> Result<User, AppError> {
    let hashed_password = password::hash(seed.password, cost).await?;
    let user = UserStore::create(
        pool,
        &NewUser {
            email: seed.email.into(),
            hashed_password,
            name: seed.name.into(),
            role: seed.role,
            age: Some(seed.age),
            bio: Some(seed.bio.into()),
            notifications_enabled: true,
            language: "pt-BR".into(),
        },
    )
    .await?;
    tracing::info!(email = seed.email, role = seed.role.as_str(), "seed user created");
    if seed.verified {
        return UserStore::set_verified(pool, user.id)
            .await?
            .ok_or(AppError::Db(sqlx::Error::RowNotFound));
    }
    Ok(user)
}

fn entity_def<'a>(model: &'a Model, path: &str) -> Result<&'a EntityDef, AppError> {
    model
        .entity_by_path(path)
        .ok_or_else(|| AppError::Internal(format!("no entity served at {}", path)))
}

/// Inserts `rows` when the table is empty. Returns the new ids, empty when the table had data.
async fn seed_entity(
    pool: &PgPool,
    model: &Model,
    path: &str,
    rows: Vec<HashMap<String, Value>>,
    owner: impl Fn(usize) -> Option<(&'static str, i64)>,
) -> Result<Vec<i64>, AppError> {
    let entity = entity_def(model, path)?;
    if CrudService::count(pool, entity, &[], None).await? > 0 {
        tracing::debug!(table = entity.table_name, "table has rows, not seeding");
        return Ok(Vec::new());
    }
    let mut ids = Vec::with_capacity(rows.len());
    for (i, body) in rows.iter().enumerate() {
        let row = CrudService::create(pool, entity, body, owner(i)).await?;
        if let Some(id) = row_id(&row) {
            ids.push(id);
        }
    }
    Ok(ids)
}

fn to_map(value: Value) -> HashMap<String, Value> {
    match value {
        Value::Object(m) => m.into_iter().collect(),
        _ => HashMap::new(),
    }
}

fn days_ago(days: i64) -> String {
    (Utc::now() - Duration::days(days)).to_rfc3339()
}

fn soil_analyses() -> Vec<HashMap<String, Value>> {
    let images = json!(["https://example.com/soil1.jpg", "https://example.com/soil2.jpg"]);
    vec![
        json!({
            "title": "Análise Solo Setor A - Fazenda São José",
            "location": "Fazenda São José, Rondônia",
            "coordinates": {"lat": -8.7619, "lng": -63.9039},
            "sector": "Setor A",
            "soil_type": "clay",
            "ph_level": 6.2, "humidity": 25.0, "temperature": 28.5,
            "nitrogen": 45.2, "phosphorus": 12.8, "potassium": 180.5,
            "calcium": 420.0, "magnesium": 85.0, "sulfur": 15.2,
            "texture": "Fina", "water_retention": "Alta", "drainage": "Boa",
            "organic_matter": 3.2, "fertility_level": "Moderada",
            "recommendations": "Solo com boa capacidade de retenção de água. Recomenda-se aplicação de calcário para correção do pH e adubação com fósforo.",
            "status": "completed",
            "notes": "Análise realizada em condições ideais de umidade.",
            "analysis_date": days_ago(0),
            "images": images,
        }),
        json!({
            "title": "Análise Solo Setor B - Área de Reflorestamento",
            "location": "Área de Reflorestamento, Porto Velho",
            "coordinates": {"lat": -8.7612, "lng": -63.8977},
            "sector": "Setor B",
            "soil_type": "sandy",
            "ph_level": 5.8, "humidity": 18.0, "temperature": 32.1,
            "nitrogen": 28.5, "phosphorus": 8.2, "potassium": 95.0,
            "calcium": 180.0, "magnesium": 45.0, "sulfur": 8.8,
            "texture": "Grossa", "water_retention": "Baixa", "drainage": "Excessiva",
            "organic_matter": 1.8, "fertility_level": "Baixa",
            "recommendations": "Solo arenoso com baixa fertilidade. Necessário enriquecimento com matéria orgânica e sistema de irrigação adequado.",
            "status": "completed",
            "notes": "Solo adequado para reflorestamento com espécies nativas adaptadas.",
            "analysis_date": days_ago(5),
            "images": images,
        }),
        json!({
            "title": "Análise Solo - Área Degradada Rio Madeira",
            "location": "Margem do Rio Madeira, Rondônia",
            "coordinates": {"lat": -8.7650, "lng": -63.8800},
            "sector": "Área Crítica 1",
            "soil_type": "silty",
            "ph_level": 4.5, "humidity": 35.0, "temperature": 26.8,
            "nitrogen": 15.2, "phosphorus": 5.1, "potassium": 45.0,
            "calcium": 80.0, "magnesium": 20.0, "sulfur": 4.2,
            "texture": "Média", "water_retention": "Média", "drainage": "Ruim",
            "organic_matter": 0.8, "fertility_level": "Baixa",
            "recommendations": "Solo severamente degradado. Requer processo intensivo de recuperação com adição de matéria orgânica, correção de pH e drenagem.",
            "status": "completed",
            "notes": "Área afetada por atividades de mineração. Necessita intervenção urgente.",
            "analysis_date": days_ago(10),
            "images": images,
        }),
    ]
    .into_iter()
    .map(to_map)
    .collect()
}

fn occurrences() -> Vec<HashMap<String, Value>> {
    let images = json!(["https://example.com/occurrence1.jpg", "https://example.com/occurrence2.jpg"]);
    let evidence = json!(["https://example.com/evidence1.pdf"]);
    vec![
        json!({
            "title": "Desmatamento Ilegal - Fazenda Esperança",
            "occurrence_type": "deforestation",
            "severity": "high",
            "location": "Fazenda Esperança, Rondônia",
            "coordinates": {"lat": -8.7700, "lng": -63.9100},
            "description": "Área de aproximadamente 50 hectares de floresta nativa foi desmatada sem autorização. Verificadas marcas de tratores e queimadas recentes.",
            "additional_notes": "Área próxima a reserva indígena. Possível invasão de terras.",
            "status": "investigating",
            "occurred_at": days_ago(3),
        }),
        json!({
            "title": "Poluição Rio Machado",
            "occurrence_type": "pollution",
            "severity": "critical",
            "location": "Rio Machado, proximidades da cidade",
            "coordinates": {"lat": -8.7580, "lng": -63.8900},
            "description": "Descarga de efluentes industriais no Rio Machado causando mortandade de peixes e alteração da cor da água.",
            "additional_notes": "Comunidades ribeirinhas relatam problemas de saúde. Água imprópria para consumo.",
            "status": "confirmed",
            "occurred_at": days_ago(7),
        }),
        json!({
            "title": "Atividade de Mineração Ilegal",
            "occurrence_type": "illegal_mining",
            "severity": "high",
            "location": "Serra dos Três Irmãos",
            "coordinates": {"lat": -8.7450, "lng": -63.9200},
            "description": "Identificada atividade de garimpo ilegal com uso de mercúrio. Área de preservação permanente sendo degradada.",
            "additional_notes": "Equipamentos pesados avistados na região. Acesso por estradas clandestinas.",
            "status": "reported",
            "occurred_at": days_ago(1),
        }),
        json!({
            "title": "Caça Ilegal de Animais Silvestres",
            "occurrence_type": "poaching",
            "severity": "medium",
            "location": "Reserva Natural Vale do Guaporé",
            "coordinates": {"lat": -8.7320, "lng": -63.8750},
            "description": "Armadilhas e redes encontradas na reserva. Evidências de caça de aves e mamíferos protegidos.",
            "additional_notes": "Trilhas suspeitas e acampamentos improvisados identificados.",
            "status": "investigating",
            "occurred_at": days_ago(5),
        }),
    ]
    .into_iter()
    .map(|mut v| {
        v["images"] = images.clone();
        v["evidence_files"] = evidence.clone();
        to_map(v)
    })
    .collect()
}

fn alerts() -> Vec<HashMap<String, Value>> {
    let expires_at = (Utc::now() + Duration::days(7)).to_rfc3339();
    vec![
        json!({
            "title": "Contaminação do Solo Detectada",
            "alert_type": "soil_contamination",
            "severity": "high",
            "location": "Setor Industrial, Porto Velho",
            "coordinates": {"lat": -8.7600, "lng": -63.9000},
            "description": "Níveis elevados de metais pesados detectados no solo próximo à área industrial.",
            "details": "Análise laboratorial confirmou presença de chumbo e mercúrio acima dos limites permitidos.",
            "source": "Sistema de Monitoramento",
            "confidence_level": 95,
            "recommended_actions": "Isolamento imediato da área e início do processo de descontaminação.",
            "emergency_contact": "IBAMA: 0800-61-8080",
            "status": "active",
        }),
        json!({
            "title": "Corte Ilegal de Árvores - Alerta Crítico",
            "alert_type": "illegal_logging",
            "severity": "critical",
            "location": "Floresta Nacional de Jamari",
            "coordinates": {"lat": -8.7800, "lng": -63.8500},
            "description": "Atividade suspeita de corte ilegal detectada por sensores satelitais na FLONA Jamari.",
            "details": "Imagens de satélite mostram abertura de novas trilhas e remoção de vegetação em área protegida.",
            "source": "Monitoramento Satelital",
            "confidence_level": 88,
            "recommended_actions": "Envio imediato de equipe de fiscalização. Acionamento da Polícia Federal.",
            "emergency_contact": "ICMBio: 0800-618080",
            "status": "active",
            "affected_area": "Aproximadamente 15 hectares",
        }),
        json!({
            "title": "Poluição da Água - Rio Madeira",
            "alert_type": "water_pollution",
            "severity": "high",
            "location": "Rio Madeira, Porto Velho",
            "coordinates": {"lat": -8.7550, "lng": -63.8850},
            "description": "Alteração significativa na qualidade da água do Rio Madeira detectada pelos sensores.",
            "details": "Aumento de turbidez e presença de substâncias químicas não identificadas.",
            "source": "Estação de Monitoramento Aquático",
            "confidence_level": 92,
            "recommended_actions": "Suspensão temporária do uso da água. Investigação da fonte de poluição.",
            "emergency_contact": "Defesa Civil: 199",
            "status": "acknowledged",
        }),
        json!({
            "title": "Risco de Incêndio Elevado",
            "alert_type": "fire_risk",
            "severity": "medium",
            "location": "Região Sul de Rondônia",
            "coordinates": {"lat": -8.8000, "lng": -63.9500},
            "description": "Condições climáticas indicam alto risco de incêndios florestais.",
            "details": "Baixa umidade (< 30%), vento forte e vegetação seca criam condições propícias para incêndios.",
            "source": "Sistema Meteorológico",
            "confidence_level": 85,
            "recommended_actions": "Reforço de equipes de prevenção. Alerta para comunidades rurais.",
            "emergency_contact": "Bombeiros: 193",
            "status": "active",
            "affected_area": "500 km²",
        }),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, mut v)| {
        v["triggered_at"] = json!((Utc::now() - Duration::hours(6 * i as i64)).to_rfc3339());
        v["expires_at"] = json!(expires_at);
        v["notification_channels"] = json!(["email", "push"]);
        v["images"] = json!(["https://example.com/alert1.jpg"]);
        v["data_sources"] = json!(["sensor_001", "satellite_imagery"]);
        to_map(v)
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::RequestValidator;

    #[test]
    fn sample_rows_pass_validation() {
        let model = primary_model();
        let cases = [
            ("soil-analyses", soil_analyses()),
            ("environmental-occurrences", occurrences()),
            ("alerts", alerts()),
        ];
        for (path, rows) in cases {
            let entity = model.entity_by_path(path).unwrap();
            for row in rows {
                RequestValidator::validate(entity, &row).unwrap_or_else(|e| panic!("{}: {}", path, e));
            }
        }
    }

    #[test]
    fn exactly_one_seeded_admin() {
        assert_eq!(USERS.iter().filter(|u| u.role == Role::Admin).count(), 1);
        assert_eq!(USERS[0].email, "admin@ecosolo.com");
    }
}
