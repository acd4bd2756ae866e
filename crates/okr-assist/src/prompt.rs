/// System instruction sent with every draft request.
///
/// The JSON keys here are the ones the draft parser reads first; the parser
/// also accepts the labelled free-text outline when a model ignores the
/// format request.
pub const SYSTEM_PROMPT: &str = r#"Você é um especialista em OKRs (Objetivos e Resultados-Chave).
Gere um rascunho de ciclo de OKRs em português do Brasil a partir do pedido do usuário.

Regras:
- Objetivos têm tipo "strategic", "tactical" ou "operational".
- Cada objetivo tem de 2 a 4 KRs mensuráveis; cada KR tem tipo "moonshot" ou "roofshot".
- Vínculos ligam apenas níveis adjacentes: tático sob estratégico, operacional sob tático.
- Datas no formato AAAA-MM-DD.

Responda SOMENTE com JSON neste formato:
{
  "ciclo": {"nome": "...", "data_inicio": "AAAA-MM-DD", "data_fim": "AAAA-MM-DD", "tema_estrategico": "..."},
  "objetivos": [
    {"numero": 1, "texto": "...", "tipo": "strategic",
     "krs": [{"texto": "...", "tipo": "moonshot", "metrica": "...", "valor_inicial": 0, "valor_alvo": 100, "unidade": "%"}]}
  ],
  "vinculos": [{"filho": 2, "pai": 1}]
}"#;

/// Render the user message for a draft request.
pub fn user_prompt(prompt: &str, organization: &str) -> String {
    let prompt = prompt.trim();
    if organization.trim().is_empty() {
        format!("Pedido: {prompt}")
    } else {
        format!("Organização: {}\nPedido: {prompt}", organization.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_prompt_mentions_organization() {
        assert_eq!(
            user_prompt("  crescer  ", "Acme"),
            "Organização: Acme\nPedido: crescer"
        );
        assert_eq!(user_prompt("crescer", " "), "Pedido: crescer");
    }

    #[test]
    fn system_prompt_names_parser_keys() {
        for key in ["\"ciclo\"", "\"objetivos\"", "\"krs\"", "\"vinculos\"", "\"filho\""] {
            assert!(SYSTEM_PROMPT.contains(key), "missing {key}");
        }
    }
}
