use std::collections::HashSet;

use ammonia::Builder;

/// Strips every HTML tag from model-generated text before it is stored.
///
/// The text is served as plain JSON strings, so the result is plain text:
/// tags are removed, `<script>` and `<style>` lose their content, and the
/// entities ammonia's serializer emits are decoded again so `R&D` stays `R&D`.
pub fn clean_text(input: &str) -> String {
    let cleaned = Builder::empty()
        .clean_content_tags(HashSet::from(["script", "style"]))
        .clean(input)
        .to_string();

    decode_entities(&cleaned).trim().to_string()
}

/// Reverses the escaping html5ever applies to text nodes. `&amp;` goes last.
fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}
