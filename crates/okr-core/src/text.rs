//! Portuguese text helpers shared by the draft parser and slug generation.

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

/// Lowercase and strip the diacritics that occur in Brazilian Portuguese.
pub fn fold(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

const MONTHS: [&str; 12] = [
    "janeiro", "fevereiro", "marco", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];

/// Month number (1-12) for a Portuguese month name, accents optional.
pub fn month_number(name: &str) -> Option<u32> {
    let folded = fold(name.trim());
    MONTHS
        .iter()
        .position(|m| *m == folded)
        .map(|i| i as u32 + 1)
}

static LONG_DATE_RE: OnceLock<Regex> = OnceLock::new();
static SLASH_DATE_RE: OnceLock<Regex> = OnceLock::new();

fn long_date_re() -> &'static Regex {
    LONG_DATE_RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})\s*[ºo°]?\s+de\s+([a-z]+)\s+(?:de\s+)?(\d{4})$").unwrap()
    })
}

fn slash_date_re() -> &'static Regex {
    SLASH_DATE_RE.get_or_init(|| Regex::new(r"^(\d{1,2})/(\d{1,2})/(\d{4})$").unwrap())
}

/// Parse a date written as `5 de abril de 2025`, `1º de abril de 2025`,
/// `05/04/2025` (day first) or `2025-04-05`.
pub fn parse_pt_date(raw: &str) -> Option<NaiveDate> {
    let folded = fold(raw.trim().trim_end_matches('.'));
    if let Ok(d) = NaiveDate::parse_from_str(&folded, "%Y-%m-%d") {
        return Some(d);
    }
    if let Some(caps) = slash_date_re().captures(&folded) {
        let day = caps[1].parse().ok()?;
        let month = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    let caps = long_date_re().captures(&folded)?;
    let day = caps[1].parse().ok()?;
    let month = month_number(&caps[2])?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `1.500` reads as fifteen hundred: one dot followed by exactly three digits.
fn is_thousands_group(s: &str) -> bool {
    match s.split_once('.') {
        Some((int, frac)) => {
            !int.trim_start_matches('-').is_empty()
                && frac.len() == 3
                && frac.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

/// Parse a number that may use Brazilian formatting (`1.000,5`) and may carry
/// a trailing unit or percent sign (`25%`, `R$ 1.200`).
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | ',' | '-'))
        .collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    let normalized = if cleaned.contains(',') {
        cleaned.replace('.', "").replace(',', ".")
    } else if cleaned.matches('.').count() > 1 || is_thousands_group(&cleaned) {
        cleaned.replace('.', "")
    } else {
        cleaned
    };
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_accents() {
        assert_eq!(fold("Estratégico"), "estrategico");
        assert_eq!(fold("TÁTICO"), "tatico");
        assert_eq!(fold("Operação"), "operacao");
    }

    #[test]
    fn month_table() {
        assert_eq!(month_number("janeiro"), Some(1));
        assert_eq!(month_number("Março"), Some(3));
        assert_eq!(month_number("marco"), Some(3));
        assert_eq!(month_number("dezembro"), Some(12));
        assert_eq!(month_number("april"), None);
    }

    #[test]
    fn portuguese_dates() {
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
        assert_eq!(parse_pt_date("5 de abril de 2025"), Some(d(2025, 4, 5)));
        assert_eq!(parse_pt_date("1º de Março de 2025"), Some(d(2025, 3, 1)));
        assert_eq!(parse_pt_date("30 de junho de 2025."), Some(d(2025, 6, 30)));
        assert_eq!(parse_pt_date("05/04/2025"), Some(d(2025, 4, 5)));
        assert_eq!(parse_pt_date("2025-04-05"), Some(d(2025, 4, 5)));
    }

    #[test]
    fn rejects_impossible_dates() {
        assert_eq!(parse_pt_date("31 de fevereiro de 2025"), None);
        assert_eq!(parse_pt_date("5 de abrril de 2025"), None);
        assert_eq!(parse_pt_date("amanhã"), None);
    }

    #[test]
    fn brazilian_numbers() {
        assert_eq!(parse_number("1.000,5"), Some(1000.5));
        assert_eq!(parse_number("25%"), Some(25.0));
        assert_eq!(parse_number("R$ 1.200.000"), Some(1_200_000.0));
        assert_eq!(parse_number("3.5"), Some(3.5));
        assert_eq!(parse_number("2.000"), Some(2000.0));
        assert_eq!(parse_number("0.25"), Some(0.25));
        assert_eq!(parse_number("muitos"), None);
    }
}
