//! Transform and verbalize passes: number/currency/date recognition, and expanding a recognized
//! Word into its spoken-out child Words. Transforms mutate a Word in place; verbalizers attach
//! children, so a verbalized Word stops being a leaf once the run is done.
use crate::locale;
use crate::node::{Graph, InterpretAs, NodeId, NodeKind, WordData};
use crate::settings::Settings;
use chrono::Datelike;
use rust_decimal::Decimal;

fn push_plain_word(graph: &mut Graph, parent: NodeId, text_with_ws: &str) -> NodeId {
    let lang = graph.node(parent).lang.clone();
    let voice = graph.node(parent).voice.clone();
    let text = text_with_ws.trim_end().to_string();
    graph.push(lang, voice, true, NodeKind::Word(WordData::plain(text, text_with_ws.to_string())), Some(parent))
}

/// Attaches the verbalized `words` (already whitespace-joined) as children of `leaf`, with the
/// original Word's trailing whitespace preserved on the last piece.
fn attach_verbalization(graph: &mut Graph, leaf: NodeId, words: &str, trailing_ws: &str, settings: &Settings) -> bool {
    let normalized = crate::textutil::normalize_non_word_chars(words.trim(), &settings.join_str);
    let mut pieces = crate::textutil::tokenize_preserving_ws(&normalized);
    let Some(last) = pieces.len().checked_sub(1) else { return false };
    pieces[last].1 = format!("{}{}", pieces[last].0, trailing_ws);
    for (_, piece) in &pieces {
        push_plain_word(graph, leaf, piece);
    }
    true
}

pub fn transform_number(graph: &mut Graph, leaf: NodeId, _settings: &Settings) -> bool {
    let (text, lang) = match &graph.node(leaf).kind {
        NodeKind::Word(w) if matches!(w.interpret_as, InterpretAs::Unset | InterpretAs::Number) => {
            (w.text.clone(), graph.node(leaf).lang.clone())
        }
        _ => return false,
    };
    if !locale::is_maybe_number(&text) {
        return false;
    }
    let Some(parsed) = locale::parse_decimal(&text, &lang) else {
        tracing::debug!(text = %text, "transform_number: not a parseable decimal, leaving literal");
        return false;
    };
    if let NodeKind::Word(w) = &mut graph.node_mut(leaf).kind {
        w.interpret_as = InterpretAs::Number;
        w.number = Some(parsed);
    }
    true
}

pub fn transform_currency(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    let (text, lang, forced) = match &graph.node(leaf).kind {
        NodeKind::Word(w) if matches!(w.interpret_as, InterpretAs::Unset | InterpretAs::Currency) => {
            (w.text.clone(), graph.node(leaf).lang.clone(), w.interpret_as == InterpretAs::Currency)
        }
        _ => return false,
    };
    let mut symbols = settings.currency_symbols.clone();
    symbols.sort_by_key(|(s, _)| std::cmp::Reverse(s.chars().count()));
    for (symbol, _) in &symbols {
        if let Some(rest) = text.strip_prefix(symbol.as_str()) {
            if let Some(parsed) = locale::parse_decimal(rest, &lang) {
                if let NodeKind::Word(w) = &mut graph.node_mut(leaf).kind {
                    w.interpret_as = InterpretAs::Currency;
                    w.number = Some(parsed);
                    w.currency_symbol = Some(symbol.clone());
                }
                return true;
            }
        }
    }
    if forced {
        if let Some(parsed) = locale::parse_decimal(&text, &lang) {
            if let NodeKind::Word(w) = &mut graph.node_mut(leaf).kind {
                w.number = Some(parsed);
                w.currency_name = Some(settings.default_currency.clone());
            }
            return true;
        }
        tracing::debug!(text = %text, "transform_currency: forced but no decimal could be parsed");
    }
    false
}

pub fn transform_date(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    let (text, forced, format) = match &graph.node(leaf).kind {
        NodeKind::Word(w) if matches!(w.interpret_as, InterpretAs::Unset | InterpretAs::Date) => {
            (w.text.clone(), w.interpret_as == InterpretAs::Date, w.format.clone())
        }
        _ => return false,
    };
    if !forced && !locale::is_maybe_date(&text) {
        return false;
    }
    let order = format.clone().unwrap_or_else(|| settings.default_date_format.clone());
    let parsed = locale::parse_date(&text, &order, !forced);
    let Some(date) = parsed else {
        tracing::debug!(text = %text, "transform_date: not a parseable date, leaving literal");
        return false;
    };
    if let NodeKind::Word(w) = &mut graph.node_mut(leaf).kind {
        w.interpret_as = InterpretAs::Date;
        w.date = Some(date);
        if w.format.is_none() {
            w.format = Some(order);
        }
    }
    true
}

pub fn verbalize_number(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    let Some(w) = word_snapshot_if(graph, leaf, |w| w.interpret_as == InterpretAs::Number) else {
        return false;
    };
    let Some(number) = w.number else { return false };
    let lang = graph.node(leaf).lang.clone();
    let trailing_ws = w.text_with_ws[w.text.len()..].to_string();
    let mode = locale::NumberMode::from_format(w.format.as_deref());
    let words = if mode == locale::NumberMode::Digits {
        number
            .trunc()
            .to_string()
            .chars()
            .filter(|c| c.is_ascii_digit())
            .map(|c| {
                let digit = Decimal::from(c.to_digit(10).unwrap());
                locale::num_to_words(&digit, &lang, locale::NumberMode::Cardinal).unwrap_or_else(|| c.to_string())
            })
            .collect::<Vec<_>>()
            .join(" ")
    } else {
        match locale::num_to_words(&number, &lang, mode) {
            Some(words) => words,
            None => {
                tracing::warn!(?number, "verbalize_number: num_to_words failed");
                return false;
            }
        }
    };
    attach_verbalization(graph, leaf, &words, &trailing_ws, settings)
}

pub fn verbalize_date(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    let Some(w) = word_snapshot_if(graph, leaf, |w| w.interpret_as == InterpretAs::Date) else {
        return false;
    };
    let Some(date) = w.date else { return false };
    let lang = graph.node(leaf).lang.clone();
    let trailing_ws = w.text_with_ws[w.text.len()..].to_string();
    let format = w.format.clone().unwrap_or_else(|| settings.default_date_format.clone());
    let mut parts = Vec::new();
    for letter in format.chars() {
        let part = match letter {
            'm' | 'M' => locale::format_month(date.month(), &lang),
            'd' | 'D' => locale::num_to_words(&Decimal::from(date.day()), &lang, locale::NumberMode::Cardinal).unwrap_or_default(),
            'O' => locale::num_to_words(&Decimal::from(date.day()), &lang, locale::NumberMode::Ordinal).unwrap_or_default(),
            'y' | 'Y' => locale::num_to_words(&Decimal::from(date.year()), &lang, locale::NumberMode::Year).unwrap_or_default(),
            _ => continue,
        };
        if !part.is_empty() {
            parts.push(part);
        }
    }
    if parts.is_empty() {
        return false;
    }
    let joined = parts.join(&settings.join_str);
    attach_verbalization(graph, leaf, &joined, &trailing_ws, settings)
}

pub fn verbalize_currency(graph: &mut Graph, leaf: NodeId, settings: &Settings) -> bool {
    let Some(w) = word_snapshot_if(graph, leaf, |w| w.interpret_as == InterpretAs::Currency) else {
        return false;
    };
    let Some(number) = w.number else { return false };
    let lang = graph.node(leaf).lang.clone();
    let trailing_ws = w.text_with_ws[w.text.len()..].to_string();
    let currency_name = w
        .currency_name
        .clone()
        .or_else(|| {
            w.currency_symbol
                .as_ref()
                .and_then(|symbol| settings.currency_symbols.iter().find(|(s, _)| s == symbol).map(|(_, name)| name.clone()))
        })
        .unwrap_or_else(|| settings.default_currency.clone());
    let units = number.trunc();
    let cents = ((number - units) * Decimal::from(100)).round().abs();
    let Some(units_words) = locale::num_to_words(&units, &lang, locale::NumberMode::Cardinal) else {
        tracing::warn!(?number, "verbalize_currency: num_to_words failed");
        return false;
    };
    let mut text = format!("{} {}", units_words, currency_name);
    if !cents.is_zero() {
        if let Some(cents_words) = locale::num_to_words(&cents, &lang, locale::NumberMode::Cardinal) {
            text.push_str(&format!(" and {} cents", cents_words));
        }
    }
    attach_verbalization(graph, leaf, &text, &trailing_ws, settings)
}

fn word_snapshot_if(graph: &Graph, leaf: NodeId, pred: impl Fn(&WordData) -> bool) -> Option<WordData> {
    match &graph.node(leaf).kind {
        NodeKind::Word(w) if pred(w) => Some(w.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;

    fn word_leaf(graph: &mut Graph, text: &str) -> NodeId {
        graph.push("en_US".to_string(), None, true, NodeKind::Word(WordData::plain(text, text)), None)
    }

    #[test]
    fn transforms_and_verbalizes_ten_dollars() {
        let settings = Settings::default_for("en_US");
        let mut graph = Graph::new();
        let leaf = word_leaf(&mut graph, "$10");
        assert!(transform_currency(&mut graph, leaf, &settings));
        assert!(verbalize_currency(&mut graph, leaf, &settings));
        let texts: Vec<String> = graph.children(leaf).iter().filter_map(|&id| graph.node(id).kind.text().map(|t| t.to_string())).collect();
        assert_eq!(texts, vec!["ten", "dollars"]);
    }

    #[test]
    fn transforms_and_verbalizes_date() {
        let settings = Settings::default_for("en_US");
        let mut graph = Graph::new();
        let leaf = word_leaf(&mut graph, "4/1/1999");
        assert!(transform_date(&mut graph, leaf, &settings));
        assert!(verbalize_date(&mut graph, leaf, &settings));
        let texts: Vec<String> = graph.children(leaf).iter().filter_map(|&id| graph.node(id).kind.text().map(|t| t.to_string())).collect();
        assert_eq!(texts, vec!["April", "first", "nineteen", "ninety", "nine"]);
    }
}
