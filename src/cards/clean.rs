use anyhow::{Context, Result};
use regex::Regex;

const ENTITIES: &[(&str, &str)] = &[
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
    ("&amp;", "&"),
];

/// Turns vendor card text (inline HTML plus layout hints) into plain text
/// for indexing and display.
pub struct MarkupCleaner {
    tags: Regex,
    layout_marker: Regex,
}

impl MarkupCleaner {
    pub fn new() -> Result<Self> {
        let tags = Regex::new(r"<[^>]*>").context("failed to compile markup tag regex")?;
        let layout_marker =
            Regex::new(r"^\s*\[x\]").context("failed to compile layout marker regex")?;
        Ok(Self {
            tags,
            layout_marker,
        })
    }

    pub fn clean(&self, input: &str) -> String {
        let without_marker = self.layout_marker.replace(input, "");
        let without_tags = self.tags.replace_all(&without_marker, " ");

        // &amp; goes last so "&amp;lt;" decodes to "&lt;", not "<".
        let mut decoded = without_tags.into_owned();
        for (entity, replacement) in ENTITIES {
            decoded = decoded.replace(entity, replacement);
        }

        condense_whitespace(&decoded)
    }
}

fn condense_whitespace(input: &str) -> String {
    let condensed = input.split_whitespace().collect::<Vec<&str>>().join(" ");
    // Tags replaced by spaces leave gaps before punctuation: "<b>Taunt</b>."
    condensed
        .replace(" .", ".")
        .replace(" ,", ",")
        .replace(" :", ":")
}
