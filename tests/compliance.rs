use text_normalizer::flatten::SentenceOptions;
use text_normalizer::{process, sentences, ProcessOptions};

fn words_of(text: &str) -> Vec<String> {
    let (graph, root) = process(text, "en_US", ProcessOptions::default()).unwrap();
    sentences(&graph, root, SentenceOptions::default())
        .into_iter()
        .flat_map(|s| s.words.into_iter().map(|w| w.text))
        .collect()
}

fn sentence_words(text: &str) -> Vec<Vec<String>> {
    let (graph, root) = process(text, "en_US", ProcessOptions::default()).unwrap();
    sentences(&graph, root, SentenceOptions::default())
        .into_iter()
        .map(|s| s.words.into_iter().map(|w| w.text).collect())
        .collect()
}

#[test]
fn collapses_runs_of_whitespace_with_no_breaks_configured() {
    assert_eq!(words_of("This is  a   test    "), vec!["This", "is", "a", "test"]);
}

#[test]
fn punctuation_and_breaks_are_peeled_in_order() {
    assert_eq!(words_of(r#"This «is»,  a "test"."#), vec!["This", "«", "is", "»", ",", "a", "\"", "test", "\"", "."]);
}

#[test]
fn quoted_sentence_boundary_keeps_closing_quote_with_first_sentence() {
    let sentences = sentence_words(r#"Test "one." Test two."#);
    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[0], vec!["Test", "\"", "one", ".", "\""]);
    assert_eq!(sentences[1], vec!["Test", "two", "."]);
}

#[test]
fn abbreviations_expand_across_two_sentences() {
    let sentences = sentence_words("Mr.? I'm just a dr., on this St. at least.");
    assert_eq!(sentences.len(), 2);
    assert_eq!(sentences[0], vec!["Mister", "?"]);
    assert_eq!(sentences[1], vec!["I'm", "just", "a", "doctor", ",", "on", "this", "Street", "at", "least", "."]);
}

#[test]
fn plain_dollar_amount_verbalizes_as_cardinal_plus_currency_name() {
    assert_eq!(words_of("$10"), vec!["ten", "dollars"]);
}

#[test]
fn say_as_date_with_explicit_two_field_format() {
    assert_eq!(words_of(r#"<say-as interpret-as="date" format="md">4/1</say-as>"#), vec!["April", "one"]);
}

#[test]
fn bare_date_defaults_to_ordinal_day_and_paired_year() {
    assert_eq!(words_of("4/1/1999"), vec!["April", "first", "nineteen", "ninety", "nine"]);
}

#[test]
fn spell_out_splits_letters_and_verbalizes_trailing_digits() {
    assert_eq!(words_of(r#"<say-as interpret-as="spell-out">test123</say-as>"#), vec!["t", "e", "s", "t", "one", "two", "three"]);
}

#[test]
fn nested_word_tags_resolve_per_language_settings() {
    assert_eq!(words_of(r#"<speak>1 <w lang="es_ES">2</w> <w lang="de_DE">3</w></speak>"#), vec!["one", "dos", "drei"]);
}

#[test]
fn sub_alias_replaces_contained_text() {
    assert_eq!(words_of(r#"<speak><sub alias="World Wide Web Consortium">W3C</sub></speak>"#), vec!["World", "Wide", "Web", "Consortium"]);
}

#[test]
fn round_trips_plain_text_with_no_normalizable_content() {
    let (graph, root) = process("Hello world, nice day", "en_US", ProcessOptions::default()).unwrap();
    let sentences = sentences(&graph, root, SentenceOptions::default());
    let text_with_ws: String = sentences.iter().flat_map(|s| s.words.iter()).map(|w| w.text_with_ws.as_str()).collect();
    assert_eq!(text_with_ws.trim_end(), "Hello world, nice day");
}

#[test]
fn explicit_sentences_each_produce_exactly_one_output_sentence() {
    let (graph, root) = process("<speak><s>One.</s><s>Two.</s></speak>", "en_US", ProcessOptions { ssml: true, ..Default::default() }).unwrap();
    let sentences = sentences(&graph, root, SentenceOptions::default());
    assert_eq!(sentences.len(), 2);
}

#[test]
fn word_idx_is_contiguous_per_sentence() {
    let (graph, root) = process("This is a test", "en_US", ProcessOptions::default()).unwrap();
    let sentences = sentences(&graph, root, SentenceOptions::default());
    for sentence in &sentences {
        for (i, word) in sentence.words.iter().enumerate() {
            assert_eq!(word.idx, i);
            assert_eq!(word.sent_idx, sentence.idx);
        }
    }
}

#[test]
fn malformed_ssml_is_a_fatal_input_format_error() {
    let result = process("<speak><p>unclosed", "en_US", ProcessOptions { ssml: true, ..Default::default() });
    assert!(result.is_err());
}

#[test]
fn break_words_are_flagged_and_omittable() {
    let (graph, root) = process("One. Two.", "en_US", ProcessOptions::default()).unwrap();
    let with_breaks = sentences(&graph, root, SentenceOptions::default());
    assert!(with_breaks.iter().flat_map(|s| &s.words).any(|w| w.is_break));

    let without_breaks = sentences(&graph, root, SentenceOptions { major_breaks: false, ..SentenceOptions::default() });
    assert!(!without_breaks.iter().flat_map(|s| &s.words).any(|w| w.is_break));
}

#[test]
fn pos_tagging_and_phoneme_lookup_run_through_a_processor() {
    use std::sync::Arc;
    use text_normalizer::settings::Settings;
    use text_normalizer::Processor;

    let mut settings = Settings::default_for("en_US");
    settings.pos_tagger = Some(Arc::new(|texts: &[String]| texts.iter().map(|_| "NOUN".to_string()).collect()));
    settings.phoneme_lookup = Some(Arc::new(|text: &str, _role: &str| if text == "cat" { Some(vec!["K".into(), "AE1".into(), "T".into()]) } else { None }));

    let processor = Processor::with_settings_builder("en_US", move |_lang| settings.clone());
    let (graph, root) = processor.process("cat", ProcessOptions::default()).unwrap();
    let sentences = processor.sentences(&graph, root, SentenceOptions::default());

    let word = &sentences[0].words[0];
    assert_eq!(word.pos.as_deref(), Some("NOUN"));
    assert_eq!(word.phonemes.as_deref(), Some(&["K".to_string(), "AE1".to_string(), "T".to_string()][..]));
}
