//! Typed SSA record
//!
//! One `SsaRecord` per canonical table row. Construction trims every string
//! and rejects rows missing the identifying fields.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use thiserror::Error;

use crate::columns::{SsaColumn, COLUMN_COUNT, CRITICAL_PRIORITY};
use crate::table::Cell;

/// Why a row could not become a record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("row has {0} cells, expected {COLUMN_COUNT}")]
    WrongWidth(usize),

    #[error("{0} must not be empty")]
    MissingField(&'static str),
}

/// A single maintenance work order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SsaRecord {
    pub numero: String,
    pub situacao: String,
    pub derivada: Option<String>,
    pub localizacao: String,
    pub desc_localizacao: String,
    pub equipamento: String,
    pub semana_cadastro: String,
    #[serde(serialize_with = "serialize_datetime")]
    pub emitida_em: Option<NaiveDateTime>,
    pub descricao: String,
    pub setor_emissor: String,
    pub setor_executor: String,
    pub solicitante: String,
    pub servico_origem: String,
    pub prioridade_emissao: String,
    pub prioridade_planejamento: Option<String>,
    pub execucao_simples: String,
    pub responsavel_programacao: Option<String>,
    pub semana_programada: Option<String>,
    pub responsavel_execucao: Option<String>,
    pub descricao_execucao: Option<String>,
    pub sistema_origem: String,
    pub anomalia: Option<String>,
}

fn serialize_datetime<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(dt) => serializer.serialize_str(&dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        None => serializer.serialize_none(),
    }
}

fn text(row: &[Cell], column: SsaColumn) -> String {
    match &row[column.index()] {
        Cell::Text(s) => s.trim().to_string(),
        Cell::DateTime(dt) => dt.format("%d/%m/%Y %H:%M:%S").to_string(),
        Cell::Empty => String::new(),
    }
}

fn optional(row: &[Cell], column: SsaColumn) -> Option<String> {
    Some(text(row, column)).filter(|s| !s.is_empty())
}

impl SsaRecord {
    /// Build a record from a canonical row
    pub fn from_row(row: &[Cell]) -> Result<SsaRecord, RecordError> {
        if row.len() != COLUMN_COUNT {
            return Err(RecordError::WrongWidth(row.len()));
        }

        let record = SsaRecord {
            numero: text(row, SsaColumn::NumeroSsa),
            situacao: text(row, SsaColumn::Situacao),
            derivada: optional(row, SsaColumn::Derivada),
            localizacao: text(row, SsaColumn::Localizacao),
            desc_localizacao: text(row, SsaColumn::DescLocalizacao),
            equipamento: text(row, SsaColumn::Equipamento),
            semana_cadastro: text(row, SsaColumn::SemanaCadastro),
            emitida_em: row[SsaColumn::EmitidaEm.index()].as_datetime(),
            descricao: text(row, SsaColumn::DescSsa),
            setor_emissor: text(row, SsaColumn::SetorEmissor),
            setor_executor: text(row, SsaColumn::SetorExecutor),
            solicitante: text(row, SsaColumn::Solicitante),
            servico_origem: text(row, SsaColumn::ServicoOrigem),
            prioridade_emissao: text(row, SsaColumn::GrauPrioridadeEmissao),
            prioridade_planejamento: optional(row, SsaColumn::GrauPrioridadePlanejamento),
            execucao_simples: text(row, SsaColumn::ExecucaoSimples),
            responsavel_programacao: optional(row, SsaColumn::ResponsavelProgramacao),
            semana_programada: optional(row, SsaColumn::SemanaProgramada),
            responsavel_execucao: optional(row, SsaColumn::ResponsavelExecucao),
            descricao_execucao: optional(row, SsaColumn::DescricaoExecucao),
            sistema_origem: text(row, SsaColumn::SistemaOrigem),
            anomalia: optional(row, SsaColumn::Anomalia),
        };

        record.validate()?;
        Ok(record)
    }

    fn validate(&self) -> Result<(), RecordError> {
        if self.numero.is_empty() {
            return Err(RecordError::MissingField("numero"));
        }
        if self.situacao.is_empty() {
            return Err(RecordError::MissingField("situacao"));
        }
        if self.prioridade_emissao.is_empty() {
            return Err(RecordError::MissingField("prioridade_emissao"));
        }
        Ok(())
    }

    /// Text value of a column, `None` when empty or absent
    pub fn field(&self, column: SsaColumn) -> Option<String> {
        let value = match column {
            SsaColumn::NumeroSsa => Some(self.numero.clone()),
            SsaColumn::Situacao => Some(self.situacao.clone()),
            SsaColumn::Derivada => self.derivada.clone(),
            SsaColumn::Localizacao => Some(self.localizacao.clone()),
            SsaColumn::DescLocalizacao => Some(self.desc_localizacao.clone()),
            SsaColumn::Equipamento => Some(self.equipamento.clone()),
            SsaColumn::SemanaCadastro => Some(self.semana_cadastro.clone()),
            SsaColumn::EmitidaEm => self
                .emitida_em
                .map(|dt| dt.format("%d/%m/%Y %H:%M").to_string()),
            SsaColumn::DescSsa => Some(self.descricao.clone()),
            SsaColumn::SetorEmissor => Some(self.setor_emissor.clone()),
            SsaColumn::SetorExecutor => Some(self.setor_executor.clone()),
            SsaColumn::Solicitante => Some(self.solicitante.clone()),
            SsaColumn::ServicoOrigem => Some(self.servico_origem.clone()),
            SsaColumn::GrauPrioridadeEmissao => Some(self.prioridade_emissao.clone()),
            SsaColumn::GrauPrioridadePlanejamento => self.prioridade_planejamento.clone(),
            SsaColumn::ExecucaoSimples => Some(self.execucao_simples.clone()),
            SsaColumn::ResponsavelProgramacao => self.responsavel_programacao.clone(),
            SsaColumn::SemanaProgramada => self.semana_programada.clone(),
            SsaColumn::ResponsavelExecucao => self.responsavel_execucao.clone(),
            SsaColumn::DescricaoExecucao => self.descricao_execucao.clone(),
            SsaColumn::SistemaOrigem => Some(self.sistema_origem.clone()),
            SsaColumn::Anomalia => self.anomalia.clone(),
        };
        value.filter(|s| !s.is_empty())
    }

    /// Ordered `(label, value)` pairs for the detail view, `-` when missing
    pub fn display_fields(&self) -> Vec<(&'static str, String)> {
        SsaColumn::ALL
            .iter()
            .map(|column| {
                let value = self.field(*column).unwrap_or_else(|| "-".to_string());
                (column.display_name(), value)
            })
            .collect()
    }

    /// Whole days since emission, `None` when the emission date is unknown
    pub fn age_in_days(&self, now: NaiveDateTime) -> Option<i64> {
        self.emitida_em.map(|emitted| (now - emitted).num_days())
    }

    pub fn is_critical(&self) -> bool {
        self.prioridade_emissao.eq_ignore_ascii_case(CRITICAL_PRIORITY)
    }

    pub fn is_programmed(&self) -> bool {
        self.semana_programada.is_some()
    }

    /// True when either a programming or an execution responsible is set
    pub fn has_responsible(&self) -> bool {
        self.responsavel_programacao.is_some() || self.responsavel_execucao.is_some()
    }
}

impl fmt::Display for SsaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SSA {} ({}) - {}",
            self.numero, self.situacao, self.prioridade_emissao
        )
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::table::empty_row;
    use chrono::NaiveDate;

    /// Minimal valid record for tests across the crate
    pub(crate) fn sample_record(numero: &str) -> SsaRecord {
        SsaRecord {
            numero: numero.to_string(),
            situacao: "APL".to_string(),
            derivada: None,
            localizacao: "USINA-01".to_string(),
            desc_localizacao: "Casa de Força".to_string(),
            equipamento: "GERADOR 1".to_string(),
            semana_cadastro: "202410".to_string(),
            emitida_em: NaiveDate::from_ymd_opt(2024, 3, 4)
                .and_then(|d| d.and_hms_opt(8, 0, 0)),
            descricao: "Vazamento de óleo".to_string(),
            setor_emissor: "IEE3".to_string(),
            setor_executor: "MEL4".to_string(),
            solicitante: "FULANO".to_string(),
            servico_origem: "ROTINA".to_string(),
            prioridade_emissao: "S3.7".to_string(),
            prioridade_planejamento: None,
            execucao_simples: "Não".to_string(),
            responsavel_programacao: None,
            semana_programada: None,
            responsavel_execucao: None,
            descricao_execucao: None,
            sistema_origem: "SAP".to_string(),
            anomalia: None,
        }
    }

    fn row_with(numero: &str, situacao: &str, prioridade: &str) -> Vec<Cell> {
        let mut row = empty_row().to_vec();
        row[SsaColumn::NumeroSsa.index()] = Cell::Text(numero.into());
        row[SsaColumn::Situacao.index()] = Cell::Text(situacao.into());
        row[SsaColumn::GrauPrioridadeEmissao.index()] = Cell::Text(prioridade.into());
        row
    }

    #[test]
    fn test_from_row_trims_and_maps_optionals() {
        let mut row = row_with(" 202401 ", "APL ", "S3.7");
        row[SsaColumn::ResponsavelExecucao.index()] = Cell::Text("  ".into());
        row[SsaColumn::Anomalia.index()] = Cell::Text("sim".into());

        let record = SsaRecord::from_row(&row).unwrap();
        assert_eq!(record.numero, "202401");
        assert_eq!(record.situacao, "APL");
        assert_eq!(record.responsavel_execucao, None);
        assert_eq!(record.anomalia.as_deref(), Some("sim"));
    }

    #[test]
    fn test_from_row_rejects_missing_identity() {
        let row = row_with("", "APL", "S3.7");
        assert_eq!(
            SsaRecord::from_row(&row),
            Err(RecordError::MissingField("numero"))
        );
        let row = row_with("1", "APL", "");
        assert_eq!(
            SsaRecord::from_row(&row),
            Err(RecordError::MissingField("prioridade_emissao"))
        );
        assert_eq!(
            SsaRecord::from_row(&[Cell::Empty]),
            Err(RecordError::WrongWidth(1))
        );
    }

    #[test]
    fn test_display_fields_use_dash_for_missing() {
        let record = sample_record("42");
        let fields = record.display_fields();
        assert_eq!(fields.len(), COLUMN_COUNT);
        assert_eq!(fields[0], ("Número da SSA", "42".to_string()));
        assert_eq!(fields[2], ("Derivada de", "-".to_string()));
        assert_eq!(fields[7].1, "04/03/2024 08:00");
    }

    #[test]
    fn test_predicates() {
        let mut record = sample_record("1");
        assert!(record.is_critical());
        assert!(!record.is_programmed());
        assert!(!record.has_responsible());

        record.prioridade_emissao = "s3.7".into();
        assert!(record.is_critical());
        record.semana_programada = Some("202412".into());
        record.responsavel_execucao = Some("JOAO".into());
        assert!(record.is_programmed());
        assert!(record.has_responsible());
    }

    #[test]
    fn test_age_and_display() {
        let record = sample_record("7");
        let now = NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(record.age_in_days(now), Some(10));
        assert_eq!(record.to_string(), "SSA 7 (APL) - S3.7");
    }

    #[test]
    fn test_serializes_dates_as_iso_like() {
        let json = serde_json::to_value(sample_record("1")).unwrap();
        assert_eq!(json["emitida_em"], "2024-03-04 08:00:00");
        assert!(json["derivada"].is_null());
    }
}
