//! SEO rewrite prompt.

const SEO_REWRITE_PROMPT_MD: &str = include_str!("../prompts/seo_rewrite.md");

/// Build the rewrite instruction for one product's title and description.
///
/// Placeholders are filled in one pass over the template, so product text
/// that happens to contain `{title}` or `{description}` is left as written.
pub fn build_prompt(title: &str, description: &str) -> String {
    let mut prompt =
        String::with_capacity(SEO_REWRITE_PROMPT_MD.len() + title.len() + description.len());
    let mut rest = SEO_REWRITE_PROMPT_MD;
    while let Some(open) = rest.find('{') {
        prompt.push_str(&rest[..open]);
        let tail = &rest[open..];
        if let Some(after) = tail.strip_prefix("{title}") {
            prompt.push_str(title);
            rest = after;
        } else if let Some(after) = tail.strip_prefix("{description}") {
            prompt.push_str(description);
            rest = after;
        } else {
            prompt.push('{');
            rest = &tail[1..];
        }
    }
    prompt.push_str(rest);
    prompt
}
