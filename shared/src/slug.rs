//! URL slugs.

/// Builds a URL-safe slug: lowercase ASCII alphanumerics separated by single
/// hyphens. Accented Latin letters are folded to their base letter; anything
/// else becomes a separator.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars().flat_map(char::to_lowercase) {
        let folded = fold_accent(ch);
        if folded.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(folded);
        } else if ch != '\'' && ch != '’' {
            // apostrophes vanish: "Hamlet's" -> "hamlets"
            pending_dash = true;
        }
    }
    slug
}

/// Returns `slug` unchanged when free, otherwise appends `-2`, `-3`, ... until
/// `taken` no longer reports a clash.
pub fn unique_slug(slug: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(slug) {
        return slug.to_string();
    }
    (2..)
        .map(|n| format!("{slug}-{n}"))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| slug.to_string())
}

fn fold_accent(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'ç' => 'c',
        'è' | 'é' | 'ê' | 'ë' => 'e',
        'ì' | 'í' | 'î' | 'ï' => 'i',
        'ñ' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => 'o',
        'ù' | 'ú' | 'û' | 'ü' => 'u',
        'ý' | 'ÿ' => 'y',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("Should Hamlet Take Prozac?"), "should-hamlet-take-prozac");
        assert_eq!(slugify("  --Hello,   World--  "), "hello-world");
    }

    #[test]
    fn slugify_folds_accents_and_apostrophes() {
        assert_eq!(slugify("Café Society’s Review"), "cafe-societys-review");
    }

    #[test]
    fn unique_slug_appends_counter() {
        let taken = ["essay", "essay-2"];
        assert_eq!(unique_slug("essay", |s| taken.contains(&s)), "essay-3");
        assert_eq!(unique_slug("fresh", |s| taken.contains(&s)), "fresh");
    }
}
