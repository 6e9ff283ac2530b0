//! Column registry for the SSA spreadsheet export
//!
//! Maps each semantic field to its canonical position, display name,
//! expected value kind and the header spellings seen across exports.

use serde::Serialize;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Number of canonical columns in an SSA table
pub const COLUMN_COUNT: usize = 22;

/// Priority code that marks an SSA as critical
pub const CRITICAL_PRIORITY: &str = "S3.7";

/// Colour used for unknown states
pub const DEFAULT_STATE_COLOR: &str = "#6c757d";

/// Expected scalar kind of a column after coercion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Trimmed string, empty allowed
    Text,
    /// Trimmed string, empty becomes absent
    OptionalText,
    /// Trimmed, upper-cased string
    UpperText,
    /// Trimmed, upper-cased string, empty becomes absent
    OptionalUpperText,
    /// Six-digit `YYYYWW` code, `000000` when unknown
    WeekCode,
    /// Six-digit `YYYYWW` code, absent when unknown
    OptionalWeekCode,
    /// Date and time of day
    DateTime,
}

/// Canonical SSA columns in positional order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SsaColumn {
    NumeroSsa = 0,
    Situacao = 1,
    Derivada = 2,
    Localizacao = 3,
    DescLocalizacao = 4,
    Equipamento = 5,
    SemanaCadastro = 6,
    EmitidaEm = 7,
    DescSsa = 8,
    SetorEmissor = 9,
    SetorExecutor = 10,
    Solicitante = 11,
    ServicoOrigem = 12,
    GrauPrioridadeEmissao = 13,
    GrauPrioridadePlanejamento = 14,
    ExecucaoSimples = 15,
    ResponsavelProgramacao = 16,
    SemanaProgramada = 17,
    ResponsavelExecucao = 18,
    DescricaoExecucao = 19,
    SistemaOrigem = 20,
    Anomalia = 21,
}

impl SsaColumn {
    /// All columns, ordered by index
    pub const ALL: [SsaColumn; COLUMN_COUNT] = [
        SsaColumn::NumeroSsa,
        SsaColumn::Situacao,
        SsaColumn::Derivada,
        SsaColumn::Localizacao,
        SsaColumn::DescLocalizacao,
        SsaColumn::Equipamento,
        SsaColumn::SemanaCadastro,
        SsaColumn::EmitidaEm,
        SsaColumn::DescSsa,
        SsaColumn::SetorEmissor,
        SsaColumn::SetorExecutor,
        SsaColumn::Solicitante,
        SsaColumn::ServicoOrigem,
        SsaColumn::GrauPrioridadeEmissao,
        SsaColumn::GrauPrioridadePlanejamento,
        SsaColumn::ExecucaoSimples,
        SsaColumn::ResponsavelProgramacao,
        SsaColumn::SemanaProgramada,
        SsaColumn::ResponsavelExecucao,
        SsaColumn::DescricaoExecucao,
        SsaColumn::SistemaOrigem,
        SsaColumn::Anomalia,
    ];

    /// Positional index in the canonical table
    pub fn index(self) -> usize {
        self as usize
    }

    /// Look up a column by positional index
    pub fn from_index(index: usize) -> Option<SsaColumn> {
        Self::ALL.get(index).copied()
    }

    /// Header text used by the reference export
    pub fn display_name(self) -> &'static str {
        match self {
            SsaColumn::NumeroSsa => "Número da SSA",
            SsaColumn::Situacao => "Situação",
            SsaColumn::Derivada => "Derivada de",
            SsaColumn::Localizacao => "Localização",
            SsaColumn::DescLocalizacao => "Descrição da Localização",
            SsaColumn::Equipamento => "Equipamento",
            SsaColumn::SemanaCadastro => "Semana de Cadastro",
            SsaColumn::EmitidaEm => "Emitida Em",
            SsaColumn::DescSsa => "Descrição da SSA",
            SsaColumn::SetorEmissor => "Setor Emissor",
            SsaColumn::SetorExecutor => "Setor Executor",
            SsaColumn::Solicitante => "Solicitante",
            SsaColumn::ServicoOrigem => "Serviço de Origem",
            SsaColumn::GrauPrioridadeEmissao => "Grau de Prioridade Emissão",
            SsaColumn::GrauPrioridadePlanejamento => "Grau de Prioridade Planejamento",
            SsaColumn::ExecucaoSimples => "Execução Simples",
            SsaColumn::ResponsavelProgramacao => "Responsável na Programação",
            SsaColumn::SemanaProgramada => "Semana Programada",
            SsaColumn::ResponsavelExecucao => "Responsável na Execução",
            SsaColumn::DescricaoExecucao => "Descrição Execução",
            SsaColumn::SistemaOrigem => "Sistema de Origem",
            SsaColumn::Anomalia => "Anomalia",
        }
    }

    /// Expected value kind after coercion
    pub fn kind(self) -> ColumnKind {
        match self {
            SsaColumn::Derivada
            | SsaColumn::GrauPrioridadePlanejamento
            | SsaColumn::DescricaoExecucao
            | SsaColumn::Anomalia => ColumnKind::OptionalText,
            SsaColumn::GrauPrioridadeEmissao => ColumnKind::UpperText,
            SsaColumn::ResponsavelProgramacao | SsaColumn::ResponsavelExecucao => {
                ColumnKind::OptionalUpperText
            }
            SsaColumn::SemanaCadastro => ColumnKind::WeekCode,
            SsaColumn::SemanaProgramada => ColumnKind::OptionalWeekCode,
            SsaColumn::EmitidaEm => ColumnKind::DateTime,
            _ => ColumnKind::Text,
        }
    }

    /// Columns every usable export must provide
    pub fn is_required(self) -> bool {
        matches!(
            self,
            SsaColumn::NumeroSsa
                | SsaColumn::Situacao
                | SsaColumn::GrauPrioridadeEmissao
                | SsaColumn::EmitidaEm
                | SsaColumn::SetorExecutor
        )
    }

    /// Alternative header spellings, already normalized with [`normalize_header`]
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            SsaColumn::NumeroSsa => &["ssa", "numero", "n ssa", "num ssa", "numero solicitacao"],
            SsaColumn::Situacao => &["estado", "status", "situacao atual"],
            SsaColumn::Derivada => &["derivada", "ssa derivada", "ssa origem"],
            SsaColumn::Localizacao => &["local", "localizacao ssa"],
            SsaColumn::DescLocalizacao => &["desc localizacao", "descricao local"],
            SsaColumn::Equipamento => &["equip", "equipamentos"],
            SsaColumn::SemanaCadastro => &["semana cadastro", "semana emissao", "sem cadastro"],
            SsaColumn::EmitidaEm => &["emitida", "data emissao", "emissao", "data cadastro"],
            SsaColumn::DescSsa => &["descricao", "desc ssa", "descricao ssa"],
            SsaColumn::SetorEmissor => &["area emissora", "emissor", "setor solicitante"],
            SsaColumn::SetorExecutor => &["area executora", "executor", "setor execucao"],
            SsaColumn::Solicitante => &["requisitante", "emitente"],
            SsaColumn::ServicoOrigem => &["servico origem", "servico"],
            SsaColumn::GrauPrioridadeEmissao => {
                &["prioridade emissao", "prioridade", "grau prioridade"]
            }
            SsaColumn::GrauPrioridadePlanejamento => {
                &["prioridade planejamento", "grau planejamento"]
            }
            SsaColumn::ExecucaoSimples => &["exec simples", "execucao simplificada"],
            SsaColumn::ResponsavelProgramacao => {
                &["resp programacao", "responsavel programacao", "programador"]
            }
            SsaColumn::SemanaProgramada => &["semana programacao", "sem programada"],
            SsaColumn::ResponsavelExecucao => {
                &["resp execucao", "responsavel execucao", "executante"]
            }
            SsaColumn::DescricaoExecucao => &["desc execucao", "descricao execucao"],
            SsaColumn::SistemaOrigem => &["sistema origem", "sistema"],
            SsaColumn::Anomalia => &["anomalias"],
        }
    }
}

/// Full description of a state code, or the code itself when unknown
pub fn state_description(state: &str) -> &str {
    match state {
        "APL" => "APL - AGUARDANDO PLANEJAMENTO",
        "APG" => "APG - AGUARDANDO PROGRAMAÇÃO",
        "AAD" => "AAD - AGUARDANDO ATUALIZAÇÃO DE DESENHOS",
        "ADM" => "ADM - AGUARDANDO DEPARTAMENTO DE MANUTENÇÃO",
        "AAT" => "AAT - AGUARDANDO ATENDIMENTO DE TERCEIROS",
        "APV" => "APV - AGUARDANDO PROVISIONAMENTO",
        "AIM" => "AIM - AGUARDANDO ENGENHARIA DE MANUTENÇÃO",
        "SCD" => "SCD - SSA CANCELADA AGUARDANDO APROV. DIVISÃO",
        "ADI" => "ADI - AGUARDANDO APROVAÇÃO DA DIVISÃO NA EMISSÃO",
        other => other,
    }
}

/// Chart colour associated with a state code
pub fn state_color(state: &str) -> &'static str {
    match state {
        "APL" | "APG" => "#fd7e14",
        "AAD" | "ADM" | "AAT" | "APV" | "AIM" => "#007bff",
        "SCD" => "#6c757d",
        "ADI" => "#dc3545",
        _ => DEFAULT_STATE_COLOR,
    }
}

const CONNECTIVES: [&str; 9] = ["de", "da", "do", "das", "dos", "na", "no", "nas", "nos"];

/// Normalize a header cell for comparison
///
/// Strips accents, lowercases, turns punctuation into spaces and drops
/// Portuguese connectives, so `"Número da SSA"` becomes `"numero ssa"`.
pub fn normalize_header(raw: &str) -> String {
    let folded: String = raw
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    folded
        .split_whitespace()
        .filter(|token| !CONNECTIVES.contains(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Registry column matching a normalized header
///
/// The flag is `true` for a display-name match and `false` for a synonym.
pub fn lookup_header(normalized: &str) -> Option<(SsaColumn, bool)> {
    if normalized.is_empty() {
        return None;
    }
    for column in SsaColumn::ALL {
        if normalize_header(column.display_name()) == normalized {
            return Some((column, true));
        }
    }
    for column in SsaColumn::ALL {
        if column.synonyms().contains(&normalized) {
            return Some((column, false));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_are_positional() {
        for (i, column) in SsaColumn::ALL.iter().enumerate() {
            assert_eq!(column.index(), i);
            assert_eq!(SsaColumn::from_index(i), Some(*column));
        }
        assert_eq!(SsaColumn::from_index(COLUMN_COUNT), None);
    }

    #[test]
    fn test_required_columns() {
        let required: Vec<_> = SsaColumn::ALL.iter().filter(|c| c.is_required()).collect();
        assert_eq!(required.len(), 5);
        assert!(SsaColumn::EmitidaEm.is_required());
        assert!(!SsaColumn::Anomalia.is_required());
    }

    #[test]
    fn test_normalize_header_strips_accents_and_connectives() {
        assert_eq!(normalize_header("Número da SSA"), "numero ssa");
        assert_eq!(normalize_header("  Grau de Prioridade Emissão "), "grau prioridade emissao");
        assert_eq!(normalize_header("Responsável na Execução"), "responsavel execucao");
        assert_eq!(normalize_header("Emitida Em"), "emitida em");
        assert_eq!(normalize_header("Setor_Executor"), "setor executor");
    }

    #[test]
    fn test_synonyms_are_normalized() {
        for column in SsaColumn::ALL {
            for synonym in column.synonyms() {
                assert_eq!(&normalize_header(synonym), synonym, "{:?}", column);
            }
        }
    }

    #[test]
    fn test_lookup_header_exact_and_synonym() {
        assert_eq!(
            lookup_header("numero ssa"),
            Some((SsaColumn::NumeroSsa, true))
        );
        assert_eq!(lookup_header("estado"), Some((SsaColumn::Situacao, false)));
        assert_eq!(lookup_header("foo"), None);
        assert_eq!(lookup_header(""), None);
    }

    #[test]
    fn test_state_lookup_defaults() {
        assert_eq!(state_description("APL"), "APL - AGUARDANDO PLANEJAMENTO");
        assert_eq!(state_description("XYZ"), "XYZ");
        assert_eq!(state_color("ADI"), "#dc3545");
        assert_eq!(state_color("XYZ"), DEFAULT_STATE_COLOR);
    }
}
