//! DDL for the territory database. Enumerations are VARCHAR columns guarded by CHECK constraints.

use super::types::{OccurrenceKind, OccurrenceStatus, Severity, TerritoryRole, UserStatus};
use crate::error::AppError;
use sqlx::PgPool;

pub fn schema_statements() -> Vec<String> {
    vec![
        "CREATE TABLE IF NOT EXISTS territorios (\
            id SERIAL PRIMARY KEY, \
            nome VARCHAR(200) NOT NULL, \
            estado VARCHAR(50) NOT NULL, \
            municipio VARCHAR(100) NOT NULL, \
            area_hectares DOUBLE PRECISION CHECK (area_hectares >= 0), \
            populacao INTEGER CHECK (populacao >= 0), \
            coordenadas_lat DOUBLE PRECISION CHECK (coordenadas_lat BETWEEN -90 AND 90), \
            coordenadas_lng DOUBLE PRECISION CHECK (coordenadas_lng BETWEEN -180 AND 180), \
            data_criacao TIMESTAMPTZ NOT NULL DEFAULT NOW())"
            .to_string(),
        format!(
            "CREATE TABLE IF NOT EXISTS usuarios (\
                id SERIAL PRIMARY KEY, \
                nome VARCHAR(100) NOT NULL, \
                email VARCHAR(255) NOT NULL UNIQUE, \
                senha_hash VARCHAR(255) NOT NULL, \
                tipo_usuario VARCHAR(30) NOT NULL CHECK (tipo_usuario IN ({})), \
                territorio_id INTEGER REFERENCES territorios(id), \
                telefone VARCHAR(20), \
                nome_social VARCHAR(100), \
                nome_indigena VARCHAR(100), \
                idade INTEGER CHECK (idade BETWEEN 0 AND 150), \
                principal_atuacao VARCHAR(200), \
                aldeia_comunidade VARCHAR(200), \
                localizacao_territorio VARCHAR(200), \
                aceite_lgpd BOOLEAN NOT NULL DEFAULT TRUE, \
                status VARCHAR(20) NOT NULL DEFAULT 'ativo' CHECK (status IN ({})), \
                data_criacao TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
                ultima_atualizacao TIMESTAMPTZ)",
            TerritoryRole::sql_list(),
            UserStatus::sql_list()
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS ocorrencias (\
                id SERIAL PRIMARY KEY, \
                usuario_id INTEGER NOT NULL REFERENCES usuarios(id), \
                tipo_ocorrencia VARCHAR(50) NOT NULL CHECK (tipo_ocorrencia IN ({})), \
                localizacao VARCHAR(200) NOT NULL, \
                grau_severidade VARCHAR(20) NOT NULL CHECK (grau_severidade IN ({})), \
                descricao TEXT NOT NULL, \
                coordenadas JSONB, \
                imagens JSONB NOT NULL DEFAULT '[]'::jsonb, \
                status VARCHAR(20) NOT NULL DEFAULT 'reportada' CHECK (status IN ({})), \
                notas_investigacao TEXT, \
                notas_resolucao TEXT, \
                data_criacao TIMESTAMPTZ NOT NULL DEFAULT NOW(), \
                data_atualizacao TIMESTAMPTZ)",
            OccurrenceKind::sql_list(),
            Severity::sql_list(),
            OccurrenceStatus::sql_list()
        ),
        "CREATE INDEX IF NOT EXISTS idx_ocorrencias_usuario ON ocorrencias (usuario_id)".to_string(),
    ]
}

/// Creates the territory tables when missing. Existing tables are left as they are.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), AppError> {
    for stmt in schema_statements() {
        tracing::debug!(sql = %stmt, "territory ddl");
        sqlx::query(&stmt).execute(pool).await?;
    }
    tracing::info!("territory schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_created_in_reference_order() {
        let stmts = schema_statements();
        let pos = |t: &str| stmts.iter().position(|s| s.contains(&format!("EXISTS {} (", t))).unwrap();
        assert!(pos("territorios") < pos("usuarios"));
        assert!(pos("usuarios") < pos("ocorrencias"));
    }

    #[test]
    fn checks_list_every_wire_value() {
        let stmts = schema_statements().join("\n");
        for role in TerritoryRole::ALL {
            assert!(stmts.contains(&format!("'{}'", role.as_str())));
        }
        assert!(stmts.contains("'mineracao_ilegal'"));
        assert!(stmts.contains("'descartada'"));
    }
}
