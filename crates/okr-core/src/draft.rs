//! Draft cycles produced by the AI assistant.
//!
//! Two response shapes are accepted and normalised into [`Draft`]:
//!
//! * JSON with Portuguese keys (`ciclo`, `objetivos`, `krs`, `vinculos`);
//!   English keys are accepted as aliases.
//! * Labelled free text (`Nome do Ciclo:`, `Objetivo 1 (Estratégico): ...`,
//!   `KR 1 (Moonshot): ...`). Hierarchy links are implied by outline order.
//!
//! Parsing is all-or-nothing: the first bad line fails the whole call.

use crate::cycle::{self, Cycle};
use crate::error::{OkrError, Result};
use crate::link::{validate_link, Link, LinkConvention};
use crate::objective::{self, NewKeyResult, Objective};
use crate::paths;
use crate::state::{log_activity, ActivityKind, State};
use crate::text::{fold, parse_number, parse_pt_date};
use crate::types::{Ambition, ObjectiveType};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Draft shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DraftCycle {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "data_inicio")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "data_fim")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "tema_estrategico")]
    pub theme: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftKeyResult {
    #[serde(rename = "texto")]
    pub text: String,
    #[serde(rename = "tipo")]
    pub ambition: Ambition,
    #[serde(rename = "metrica", skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(rename = "valor_inicial", skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<f64>,
    #[serde(rename = "valor_atual", skip_serializing_if = "Option::is_none")]
    pub current_value: Option<f64>,
    #[serde(rename = "valor_alvo", skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,
    #[serde(rename = "unidade", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl DraftKeyResult {
    fn new(text: String, ambition: Ambition) -> Self {
        Self {
            text,
            ambition,
            metric: None,
            initial_value: None,
            current_value: None,
            target_value: None,
            unit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DraftObjective {
    #[serde(rename = "numero")]
    pub number: usize,
    #[serde(rename = "texto")]
    pub text: String,
    #[serde(rename = "tipo")]
    pub objective_type: ObjectiveType,
    #[serde(rename = "krs")]
    pub key_results: Vec<DraftKeyResult>,
}

/// Parent/child pair by objective number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DraftLink {
    #[serde(rename = "filho")]
    pub child: usize,
    #[serde(rename = "pai")]
    pub parent: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Draft {
    #[serde(rename = "ciclo")]
    pub cycle: DraftCycle,
    #[serde(rename = "objetivos")]
    pub objectives: Vec<DraftObjective>,
    #[serde(rename = "vinculos")]
    pub links: Vec<DraftLink>,
}

/// A draft turned into store records, ready to persist.
#[derive(Debug, Clone, Serialize)]
pub struct Materialized {
    pub cycle: Cycle,
    pub objectives: Vec<Objective>,
    pub links: Vec<Link>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse a raw assistant response. Code fences are unwrapped; a body that
/// starts with `{` is read as JSON, anything else as labelled free text.
pub fn parse_ai_response(raw: &str) -> Result<Draft> {
    let body = unwrap_fences(raw);
    if body.starts_with('{') {
        let value: serde_json::Value = serde_json::from_str(body)
            .map_err(|e| OkrError::InvalidDraft(format!("malformed JSON: {e}")))?;
        return parse_ai_value(value);
    }
    parse_free_text(body)
}

fn unwrap_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map(|(_, b)| b).unwrap_or("");
    let body = body.trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

// ---------------------------------------------------------------------------
// JSON shape
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Number(f64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
struct RawCycle {
    #[serde(default, alias = "name")]
    nome: Option<String>,
    #[serde(default, alias = "start_date")]
    data_inicio: Option<String>,
    #[serde(default, alias = "end_date", alias = "data_termino")]
    data_fim: Option<String>,
    #[serde(default, alias = "theme", alias = "tema")]
    tema_estrategico: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawKeyResult {
    #[serde(alias = "text")]
    texto: String,
    #[serde(default, alias = "ambition", alias = "type")]
    tipo: Option<String>,
    #[serde(default, alias = "metric")]
    metrica: Option<String>,
    #[serde(default, alias = "initial_value")]
    valor_inicial: Option<RawNumber>,
    #[serde(default, alias = "current_value")]
    valor_atual: Option<RawNumber>,
    #[serde(default, alias = "target_value", alias = "meta")]
    valor_alvo: Option<RawNumber>,
    #[serde(default, alias = "unit")]
    unidade: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawObjective {
    #[serde(default, alias = "number")]
    numero: Option<usize>,
    #[serde(alias = "text")]
    texto: String,
    #[serde(default, alias = "type")]
    tipo: Option<String>,
    #[serde(default, alias = "key_results")]
    krs: Vec<RawKeyResult>,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    #[serde(alias = "child")]
    filho: usize,
    #[serde(alias = "parent")]
    pai: usize,
}

#[derive(Debug, Deserialize)]
struct RawDraft {
    #[serde(default, alias = "cycle")]
    ciclo: Option<RawCycle>,
    #[serde(default, alias = "objectives")]
    objetivos: Vec<RawObjective>,
    #[serde(default, alias = "links")]
    vinculos: Vec<RawLink>,
}

fn json_date(field: &str, raw: Option<String>) -> Result<Option<NaiveDate>> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => parse_pt_date(s)
            .map(Some)
            .ok_or_else(|| OkrError::InvalidDraft(format!("{field}: unrecognised date '{s}'"))),
    }
}

fn json_number(field: &str, raw: Option<RawNumber>) -> Result<Option<f64>> {
    match raw {
        None => Ok(None),
        Some(RawNumber::Number(v)) => Ok(Some(v)),
        Some(RawNumber::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(RawNumber::Text(s)) => parse_number(&s)
            .map(Some)
            .ok_or_else(|| OkrError::InvalidDraft(format!("{field}: not a number '{s}'"))),
    }
}

/// Normalise an already-decoded JSON response.
pub fn parse_ai_value(value: serde_json::Value) -> Result<Draft> {
    let raw: RawDraft = serde_json::from_value(value)
        .map_err(|e| OkrError::InvalidDraft(format!("unexpected JSON shape: {e}")))?;

    let rc = raw.ciclo.unwrap_or_default();
    let cycle = DraftCycle {
        name: rc.nome.unwrap_or_default().trim().to_string(),
        start_date: json_date("ciclo.data_inicio", rc.data_inicio)?,
        end_date: json_date("ciclo.data_fim", rc.data_fim)?,
        theme: rc.tema_estrategico.filter(|t| !t.trim().is_empty()),
    };

    let mut objectives = Vec::with_capacity(raw.objetivos.len());
    for (i, ro) in raw.objetivos.into_iter().enumerate() {
        let number = ro.numero.unwrap_or(i + 1);
        let label = ro.tipo.unwrap_or_default();
        let objective_type = ObjectiveType::from_label(&label).ok_or_else(|| {
            OkrError::InvalidDraft(format!("objective {number}: unknown type '{label}'"))
        })?;
        let mut key_results = Vec::with_capacity(ro.krs.len());
        for (k, rk) in ro.krs.into_iter().enumerate() {
            let field = |name: &str| format!("objective {number} kr {}: {name}", k + 1);
            let ambition = match rk.tipo.as_deref() {
                None | Some("") => Ambition::Roofshot,
                Some(label) => Ambition::from_label(label).ok_or_else(|| {
                    OkrError::InvalidDraft(format!("{}: unknown ambition '{label}'", field("tipo")))
                })?,
            };
            let mut kr = DraftKeyResult::new(rk.texto.trim().to_string(), ambition);
            kr.metric = rk.metrica.filter(|m| !m.trim().is_empty());
            kr.initial_value = json_number(&field("valor_inicial"), rk.valor_inicial)?;
            kr.current_value = json_number(&field("valor_atual"), rk.valor_atual)?;
            kr.target_value = json_number(&field("valor_alvo"), rk.valor_alvo)?;
            kr.unit = rk.unidade.filter(|u| !u.trim().is_empty());
            key_results.push(kr);
        }
        objectives.push(DraftObjective {
            number,
            text: ro.texto.trim().to_string(),
            objective_type,
            key_results,
        });
    }

    let draft = Draft {
        cycle,
        objectives,
        links: raw
            .vinculos
            .into_iter()
            .map(|l| DraftLink {
                child: l.filho,
                parent: l.pai,
            })
            .collect(),
    };
    draft.check_numbers()?;
    Ok(draft)
}

// ---------------------------------------------------------------------------
// Free-text shape
// ---------------------------------------------------------------------------

static OBJECTIVE_RE: OnceLock<Regex> = OnceLock::new();
static KR_RE: OnceLock<Regex> = OnceLock::new();
static LABEL_RE: OnceLock<Regex> = OnceLock::new();
static ENTRY_HEAD_RE: OnceLock<Regex> = OnceLock::new();

fn objective_re() -> &'static Regex {
    OBJECTIVE_RE.get_or_init(|| {
        Regex::new(r"(?i)^objetivo\s*(\d+)?\s*\(([^)]*)\)\s*[:\-–]\s*(.*)$").unwrap()
    })
}

fn kr_re() -> &'static Regex {
    KR_RE.get_or_init(|| Regex::new(r"(?i)^kr\s*(\d+)?\s*\(([^)]*)\)\s*[:\-–]\s*(.*)$").unwrap())
}

/// `Objetivo N` or `KR N` at the start of a line, with or without a label.
fn entry_head_re() -> &'static Regex {
    ENTRY_HEAD_RE.get_or_init(|| Regex::new(r"(?i)^(objetivo|kr)\s*\d+\b").unwrap())
}

fn label_re() -> &'static Regex {
    LABEL_RE.get_or_init(|| Regex::new(r"^([^:]{1,40}):\s*(.*)$").unwrap())
}

/// Drop Markdown emphasis, bullets and heading marks around a line.
fn clean_line(raw: &str) -> String {
    let mut line = raw.replace("**", "").replace("__", "");
    loop {
        let t = line.trim_start();
        let rest = t
            .strip_prefix("- ")
            .or_else(|| t.strip_prefix("* "))
            .or_else(|| t.strip_prefix("• "))
            .or_else(|| t.strip_prefix('#'));
        match rest {
            Some(rest) => line = rest.to_string(),
            None => break,
        }
    }
    line.trim().to_string()
}

struct LineCtx<'a> {
    number: usize,
    text: &'a str,
}

impl LineCtx<'_> {
    fn error(&self, message: impl Into<String>) -> OkrError {
        OkrError::DraftLine {
            line: self.number,
            text: self.text.trim().to_string(),
            message: message.into(),
        }
    }

    fn date(&self, value: &str) -> Result<Option<NaiveDate>> {
        if value.trim().is_empty() {
            return Ok(None);
        }
        parse_pt_date(value)
            .map(Some)
            .ok_or_else(|| self.error(format!("unrecognised date '{}'", value.trim())))
    }

    fn number(&self, value: &str) -> Result<f64> {
        parse_number(value).ok_or_else(|| self.error(format!("not a number '{}'", value.trim())))
    }
}

/// Parse the labelled free-text format.
pub fn parse_free_text(text: &str) -> Result<Draft> {
    let mut draft = Draft::default();
    let mut last_strategic: Option<usize> = None;
    let mut last_tactical: Option<usize> = None;

    for (idx, raw) in text.lines().enumerate() {
        let ctx = LineCtx {
            number: idx + 1,
            text: raw,
        };
        let line = clean_line(raw);
        if line.is_empty() {
            continue;
        }

        if let Some(caps) = objective_re().captures(&line) {
            let label = caps.get(2).map_or("", |m| m.as_str());
            let objective_type = ObjectiveType::from_label(label)
                .ok_or_else(|| ctx.error(format!("unknown objective type '{label}'")))?;
            let statement = caps.get(3).map_or("", |m| m.as_str()).trim();
            if statement.is_empty() {
                return Err(ctx.error("objective has no text"));
            }
            let number = match caps.get(1) {
                Some(m) => m
                    .as_str()
                    .parse()
                    .map_err(|_| ctx.error("objective number out of range"))?,
                None => draft.objectives.len() + 1,
            };
            if draft.objectives.iter().any(|o| o.number == number) {
                return Err(ctx.error(format!("objective {number} declared twice")));
            }
            match objective_type {
                ObjectiveType::Strategic => last_strategic = Some(number),
                ObjectiveType::Tactical => {
                    if let Some(parent) = last_strategic {
                        draft.links.push(DraftLink { child: number, parent });
                    }
                    last_tactical = Some(number);
                }
                ObjectiveType::Operational => {
                    if let Some(parent) = last_tactical {
                        draft.links.push(DraftLink { child: number, parent });
                    }
                }
            }
            draft.objectives.push(DraftObjective {
                number,
                text: statement.to_string(),
                objective_type,
                key_results: Vec::new(),
            });
            continue;
        }

        if let Some(caps) = kr_re().captures(&line) {
            let label = caps.get(2).map_or("", |m| m.as_str());
            let ambition = Ambition::from_label(label)
                .ok_or_else(|| ctx.error(format!("unknown key result type '{label}'")))?;
            let kr_text = caps.get(3).map_or("", |m| m.as_str()).trim();
            if kr_text.is_empty() {
                return Err(ctx.error("key result has no text"));
            }
            let owner = draft
                .objectives
                .last_mut()
                .ok_or_else(|| ctx.error("key result before any objective"))?;
            owner
                .key_results
                .push(DraftKeyResult::new(kr_text.to_string(), ambition));
            continue;
        }

        if entry_head_re().is_match(&line) {
            return Err(ctx.error("missing type label in parentheses"));
        }

        let Some(caps) = label_re().captures(&line) else {
            continue;
        };
        let key = fold(caps[1].trim());
        let value = caps[2].trim();
        match key.as_str() {
            "nome do ciclo" | "ciclo" => draft.cycle.name = value.to_string(),
            "data de inicio" => draft.cycle.start_date = ctx.date(value)?,
            "data de fim" | "data de termino" => draft.cycle.end_date = ctx.date(value)?,
            "tema estrategico" | "tema" => {
                draft.cycle.theme = Some(value.to_string()).filter(|v| !v.is_empty())
            }
            "metrica" | "valor inicial" | "valor atual" | "meta" | "valor alvo" | "unidade" => {
                let Some(kr) = draft
                    .objectives
                    .last_mut()
                    .and_then(|o| o.key_results.last_mut())
                else {
                    continue;
                };
                match key.as_str() {
                    "metrica" => kr.metric = Some(value.to_string()),
                    "valor inicial" => kr.initial_value = Some(ctx.number(value)?),
                    "valor atual" => kr.current_value = Some(ctx.number(value)?),
                    "unidade" => kr.unit = Some(value.to_string()),
                    _ => kr.target_value = Some(ctx.number(value)?),
                }
            }
            _ => {}
        }
    }

    if draft.objectives.is_empty() {
        return Err(OkrError::InvalidDraft("no objectives found".to_string()));
    }
    Ok(draft)
}

// ---------------------------------------------------------------------------
// Materialisation
// ---------------------------------------------------------------------------

impl Draft {
    fn check_numbers(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for o in &self.objectives {
            if !seen.insert(o.number) {
                return Err(OkrError::InvalidDraft(format!(
                    "objective {} declared twice",
                    o.number
                )));
            }
        }
        for l in &self.links {
            for n in [l.child, l.parent] {
                if !seen.contains(&n) {
                    return Err(OkrError::InvalidDraft(format!(
                        "link {} -> {} names unknown objective {n}",
                        l.child, l.parent
                    )));
                }
            }
        }
        Ok(())
    }

    /// Turn the draft into a cycle, objectives and links for `cycle_slug`.
    ///
    /// Objective ids are slugs of their text, de-duplicated. Links are stored
    /// in `convention` and every one must pass the link validity gate.
    pub fn materialize(
        &self,
        cycle_slug: &str,
        organization: &str,
        convention: LinkConvention,
    ) -> Result<Materialized> {
        paths::validate_slug(cycle_slug)?;
        self.check_numbers()?;
        if let (Some(start), Some(end)) = (self.cycle.start_date, self.cycle.end_date) {
            if end < start {
                return Err(OkrError::InvalidCycleRange {
                    start: start.to_string(),
                    end: end.to_string(),
                });
            }
        }

        let name = if self.cycle.name.is_empty() {
            cycle_slug
        } else {
            self.cycle.name.as_str()
        };
        let mut cycle = Cycle::new(cycle_slug, name, organization);
        cycle.start_date = self.cycle.start_date;
        cycle.end_date = self.cycle.end_date;
        cycle.theme = self.cycle.theme.clone();

        let mut objectives: Vec<Objective> = Vec::with_capacity(self.objectives.len());
        let mut id_of: HashMap<usize, usize> = HashMap::new();
        for d in &self.objectives {
            let id = objective::unique_id(&objectives, &paths::slugify(&d.text));
            let mut o = Objective::new(id, d.text.clone(), d.objective_type, cycle_slug);
            for kr in &d.key_results {
                o.add_key_result(NewKeyResult {
                    text: kr.text.clone(),
                    metric: kr.metric.clone(),
                    initial_value: kr.initial_value.unwrap_or(0.0),
                    current_value: kr.current_value,
                    target_value: kr.target_value.unwrap_or(0.0),
                    unit: kr.unit.clone(),
                    ambition: kr.ambition,
                    confidence: None,
                });
            }
            id_of.insert(d.number, objectives.len());
            objectives.push(o);
        }

        let mut links: Vec<Link> = Vec::new();
        for l in &self.links {
            let (Some(&c), Some(&p)) = (id_of.get(&l.child), id_of.get(&l.parent)) else {
                continue;
            };
            let (child, parent) = (&objectives[c], &objectives[p]);
            let (source_id, target_id) = convention.orient(&parent.id, &child.id);
            let (source, target) = if source_id == parent.id {
                (parent, child)
            } else {
                (child, parent)
            };
            let link_type = validate_link(source, target, convention)?;
            if !links
                .iter()
                .any(|x| x.source == source_id && x.target == target_id)
            {
                links.push(Link::new(source_id, target_id, link_type));
            }
        }

        Ok(Materialized {
            cycle,
            objectives,
            links,
        })
    }
}

/// Persist a draft as a new cycle.
///
/// The cycle is registered first; if writing its objectives or links fails
/// the cycle is deleted again.
pub fn import_draft(
    root: &Path,
    draft: &Draft,
    cycle_slug: &str,
    convention: LinkConvention,
    user: Option<&str>,
) -> Result<Materialized> {
    let state = State::load(root)?;
    let m = draft.materialize(cycle_slug, &state.organization, convention)?;
    let cycle = cycle::register(root, m.cycle.clone(), user)?;

    let written = objective::save_objectives(root, &cycle.slug, &m.objectives)
        .and_then(|_| crate::link::save_links(root, &cycle.slug, &m.links));
    if let Err(e) = written {
        cycle::delete(root, &cycle.slug, user)?;
        return Err(e);
    }

    log_activity(
        root,
        ActivityKind::DraftImported,
        &cycle.slug,
        user,
        format!("{} objectives, {} links", m.objectives.len(), m.links.len()),
    )?;
    Ok(Materialized { cycle, ..m })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{build_hierarchy, ParentPolicy};
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    const OUTLINE: &str = "\
**Nome do Ciclo:** Ciclo Q2 2025
**Data de Início:** 1º de abril de 2025
**Data de Término:** 30 de junho de 2025
**Tema Estratégico:** Expansão regional

### Objetivo 1 (Estratégico): Crescer no Nordeste
- KR 1 (Moonshot): Dobrar receita regional
  - Métrica: receita
  - Valor Inicial: 1.000,50
  - Meta: 2.000
  - Unidade: R$
Objetivo 2 (Tático): Abrir filial em Recife
KR 1 (Roofshot): Contratar 10 vendedores
Objetivo 3 (Operacional): Treinar equipe local
KR 1 (Roofshot): 40 horas de treinamento
";

    #[test]
    fn minimal_free_text() {
        let draft = parse_ai_response("Objetivo 1 (Estratégico): Crescer\nKR 1 (Moonshot): Dobrar receita")
            .unwrap();
        assert_eq!(draft.objectives.len(), 1);
        assert_eq!(draft.objectives[0].objective_type, ObjectiveType::Strategic);
        assert_eq!(draft.objectives[0].text, "Crescer");
        assert_eq!(draft.objectives[0].key_results.len(), 1);
        assert_eq!(draft.objectives[0].key_results[0].ambition, Ambition::Moonshot);

        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["objetivos"][0]["tipo"], "strategic");
        assert_eq!(json["objetivos"][0]["krs"][0]["tipo"], "moonshot");
    }

    #[test]
    fn full_outline() {
        let draft = parse_ai_response(OUTLINE).unwrap();
        assert_eq!(draft.cycle.name, "Ciclo Q2 2025");
        assert_eq!(draft.cycle.start_date, Some(d(2025, 4, 1)));
        assert_eq!(draft.cycle.end_date, Some(d(2025, 6, 30)));
        assert_eq!(draft.cycle.theme.as_deref(), Some("Expansão regional"));

        let kr = &draft.objectives[0].key_results[0];
        assert_eq!(kr.metric.as_deref(), Some("receita"));
        assert_eq!(kr.initial_value, Some(1000.5));
        assert_eq!(kr.target_value, Some(2000.0));
        assert_eq!(kr.unit.as_deref(), Some("R$"));

        assert_eq!(
            draft.links,
            vec![
                DraftLink { child: 2, parent: 1 },
                DraftLink { child: 3, parent: 2 }
            ]
        );
    }

    #[test]
    fn fenced_free_text() {
        let fenced = format!("```text\n{OUTLINE}```");
        assert_eq!(parse_ai_response(&fenced).unwrap().objectives.len(), 3);
    }

    #[test]
    fn errors_name_the_line() {
        let err = parse_ai_response("Objetivo 1 (Estratégico): A\nKR 1 (Gigante): B").unwrap_err();
        match err {
            OkrError::DraftLine { line, text, .. } => {
                assert_eq!(line, 2);
                assert_eq!(text, "KR 1 (Gigante): B");
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = parse_ai_response("KR 1 (Moonshot): órfão").unwrap_err();
        assert!(err.to_string().contains("before any objective"));

        let err = parse_ai_response("Data de Início: trinta de fevereiro\nObjetivo 1 (Tático): x")
            .unwrap_err();
        assert!(matches!(err, OkrError::DraftLine { line: 1, .. }));

        let err = parse_ai_response("Objetivo 1 (Visionário): x").unwrap_err();
        assert!(err.to_string().contains("Visionário"));

        let err = parse_ai_response("Objetivo 1 (Estratégico): Crescer\nKR 1: Dobrar receita").unwrap_err();
        match err {
            OkrError::DraftLine { line, text, message } => {
                assert_eq!(line, 2);
                assert_eq!(text, "KR 1: Dobrar receita");
                assert!(message.contains("type label"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let err = parse_ai_response("Objetivo 1 (Estratégico): A\nObjetivo 2: B").unwrap_err();
        assert!(matches!(err, OkrError::DraftLine { line: 2, .. }));
    }

    #[test]
    fn prose_without_objectives_is_rejected() {
        assert!(matches!(
            parse_ai_response("Olá! Aqui está seu plano."),
            Err(OkrError::InvalidDraft(_))
        ));
    }

    #[test]
    fn json_with_portuguese_keys() {
        let raw = r#"```json
{
  "ciclo": {"nome": "Q3", "data_inicio": "1 de julho de 2025", "data_fim": "2025-09-30"},
  "objetivos": [
    {"numero": 1, "texto": "Crescer", "tipo": "strategic",
     "krs": [{"texto": "Receita", "tipo": "moonshot", "valor_alvo": "1.500", "valor_inicial": 0}]},
    {"numero": 2, "texto": "Vender mais", "tipo": "Tático", "krs": []}
  ],
  "vinculos": [{"filho": 2, "pai": 1}]
}
```"#;
        let draft = parse_ai_response(raw).unwrap();
        assert_eq!(draft.cycle.start_date, Some(d(2025, 7, 1)));
        assert_eq!(draft.objectives[1].objective_type, ObjectiveType::Tactical);
        assert_eq!(draft.objectives[0].key_results[0].target_value, Some(1500.0));
        assert_eq!(draft.links, vec![DraftLink { child: 2, parent: 1 }]);
    }

    #[test]
    fn json_with_english_keys() {
        let value = serde_json::json!({
            "cycle": {"name": "Q3"},
            "objectives": [{"text": "Grow", "type": "strategic", "key_results": [{"text": "x", "ambition": "roofshot"}]}],
            "links": []
        });
        let draft = parse_ai_value(value).unwrap();
        assert_eq!(draft.objectives[0].number, 1);
        assert_eq!(draft.objectives[0].key_results[0].ambition, Ambition::Roofshot);
    }

    #[test]
    fn json_errors() {
        assert!(matches!(parse_ai_response("{not json"), Err(OkrError::InvalidDraft(_))));
        let bad_type = serde_json::json!({"objetivos": [{"texto": "x", "tipo": "visionary"}]});
        assert!(parse_ai_value(bad_type).is_err());
        let dangling = serde_json::json!({
            "objetivos": [{"texto": "x", "tipo": "strategic"}],
            "vinculos": [{"filho": 2, "pai": 1}]
        });
        assert!(parse_ai_value(dangling).unwrap_err().to_string().contains("unknown objective 2"));
    }

    #[test]
    fn materialize_both_conventions() {
        let draft = parse_ai_response(OUTLINE).unwrap();
        for convention in [LinkConvention::ChildToParent, LinkConvention::ParentToChild] {
            let m = draft.materialize("q2-2025", "acme", convention).unwrap();
            assert_eq!(m.cycle.name, "Ciclo Q2 2025");
            assert_eq!(m.objectives[0].id, "crescer-no-nordeste");
            assert_eq!(m.objectives[0].key_results[0].id, "crescer-no-nordeste-kr1");
            assert_eq!(m.links.len(), 2);

            let h = build_hierarchy(&m.objectives, &m.links, convention, ParentPolicy::LastWins);
            assert_eq!(h.groups.len(), 1);
            assert_eq!(h.groups[0].children[0].children.len(), 1);
            assert!(h.unlinked.is_empty());
        }
    }

    #[test]
    fn materialize_rejects_skip_level_link() {
        let value = serde_json::json!({
            "objetivos": [
                {"texto": "S", "tipo": "strategic"},
                {"texto": "O", "tipo": "operational"}
            ],
            "vinculos": [{"filho": 2, "pai": 1}]
        });
        let draft = parse_ai_value(value).unwrap();
        assert!(matches!(
            draft.materialize("q1", "acme", LinkConvention::ChildToParent),
            Err(OkrError::InvalidLink { .. })
        ));
    }

    #[test]
    fn duplicate_texts_get_unique_ids() {
        let draft = parse_ai_response("Objetivo 1 (Tático): Vender\nObjetivo 2 (Tático): Vender").unwrap();
        let m = draft.materialize("q1", "acme", LinkConvention::ChildToParent).unwrap();
        assert_eq!(m.objectives[0].id, "vender");
        assert_eq!(m.objectives[1].id, "vender-2");
    }

    #[test]
    fn import_persists_everything() {
        let dir = TempDir::new().unwrap();
        crate::config::Config::new("acme").save(dir.path()).unwrap();
        State::new("acme").save(dir.path()).unwrap();

        let draft = parse_ai_response(OUTLINE).unwrap();
        let m = import_draft(dir.path(), &draft, "q2-2025", LinkConvention::ChildToParent, Some("ana"))
            .unwrap();
        assert_eq!(m.cycle.organization, "acme");

        let stored = Cycle::load(dir.path(), "q2-2025").unwrap();
        assert_eq!(stored.start_date, Some(d(2025, 4, 1)));
        assert_eq!(objective::load_objectives(dir.path(), "q2-2025").unwrap().len(), 3);
        assert_eq!(crate::link::load_links(dir.path(), "q2-2025").unwrap().len(), 2);

        let state = State::load(dir.path()).unwrap();
        assert_eq!(state.last_activity().unwrap().kind, ActivityKind::DraftImported);

        assert!(matches!(
            import_draft(dir.path(), &draft, "q2-2025", LinkConvention::ChildToParent, None),
            Err(OkrError::CycleExists(_))
        ));
    }
}
