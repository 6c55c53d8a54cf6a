//! A minimal stdin/stdout front-end over the library: reads one document per invocation, runs it
//! through [`text_normalizer::process`], and prints each sentence's flattened words.
use std::io::Read;

use text_normalizer::flatten::SentenceOptions;
use text_normalizer::{process, sentences, ProcessOptions};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).init();

    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;

    let lang = std::env::args().nth(1).unwrap_or_else(|| "en_US".to_string());
    let ssml = input.trim_start().starts_with("<speak");
    let options = ProcessOptions { ssml, ..ProcessOptions::default() };

    let (graph, root) = process(&input, &lang, options)?;
    for sentence in sentences(&graph, root, SentenceOptions::default()) {
        let words: Vec<&str> = sentence.words.iter().map(|w| w.text_with_ws.as_str()).collect();
        println!("{}", words.concat().trim_end());
    }

    Ok(())
}
