//! Shared test utilities for building cases in memory

use crate::{
    case::Case,
    codec::{gsn::GsnCodec, DocCodec},
};
use std::path::Path;

/// Initialize logging for tests
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Parse `(file name, .gsn text)` pairs into a case rooted at `/model`, in the given order.
pub fn case_from(files: &[(&str, &str)]) -> Case {
    let codec = GsnCodec::default();
    let root = Path::new("/model");
    let documents = files
        .iter()
        .map(|(name, text)| {
            codec
                .parse(text, &root.join(name))
                .unwrap_or_else(|e| panic!("test case {name} should parse: {e}"))
        })
        .collect();
    Case::new(root, documents)
}

/// A case of `namespaces` documents, each with a chain of goal/strategy pairs and one context,
/// cross-referencing the previous namespace.
pub fn generated_case(namespaces: usize, goals: usize) -> Case {
    let files = (0..namespaces)
        .map(|ns| (format!("ns{ns:03}.gsn"), generated_document(ns, goals)))
        .collect::<Vec<_>>();
    let borrowed = files
        .iter()
        .map(|(name, text)| (name.as_str(), text.as_str()))
        .collect::<Vec<_>>();
    case_from(&borrowed)
}

pub fn generated_document(ns: usize, goals: usize) -> String {
    let mut text = format!("GOALS n{ns}\n{{\n");
    for g in 0..goals {
        text.push_str(&format!(
            "    goal G{g}\n    {{\n        summary:'''goal {g} of n{ns}''';\n        strategy S{g}\n        {{\n            goal G{g}a {{ }}\n        }}\n        inContextOf: c{ns}.C0;\n"
        ));
        if ns > 0 {
            text.push_str(&format!("        solvedBy: n{}.G{g};\n", ns - 1));
        }
        text.push_str("    }\n");
    }
    text.push_str(&format!("}}\n\nCONTEXTS c{ns}\n{{\n    context C0 {{ }}\n}}\n"));
    text
}
