//! `{{name}}` placeholder substitution for the static per-target templates.

use itertools::Itertools;

use crate::Error;

/// Replace every `{{key}}` in `template` with its value. A placeholder without a value is an error,
/// so a template and its caller can't silently drift apart.
pub fn render(template: &str, values: &[(&str, &str)]) -> Result<String, Error> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| Error::Template(after.chars().take(16).collect()))?;
        let key = after[..end].trim();
        let (_, value) = values
            .iter()
            .find(|(name, _)| *name == key)
            .ok_or_else(|| Error::Template(key.to_owned()))?;
        out.push_str(value);
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Nest row-major `items` into brace groups following `dims`, e.g. `{{1, 2}, {3, 4}}`.
pub fn nest(dims: &[usize], items: &[String], open: &str, close: &str) -> String {
    match dims.split_first() {
        None => items.first().cloned().unwrap_or_default(),
        Some((_, inner)) => {
            let chunk = inner.iter().product::<usize>().max(1);
            let body = items
                .chunks(chunk)
                .map(|chunk| nest(inner, chunk, open, close))
                .join(", ");
            format!("{open}{body}{close}")
        }
    }
}
