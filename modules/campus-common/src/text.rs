/// `About the Institute` → `about-the-institute`.
pub fn slugify(text: &str) -> String {
    let mut slug = String::new();
    for c in text.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    slug.trim_matches('-').to_string()
}

/// `needle` occurs in `haystack` as whole words: "bob" is in "ask bob." but
/// not in "bobby". Both sides are compared as given.
pub fn mentions(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("About the  MCMP: History"), "about-the-mcmp-history");
        assert_eq!(slugify("Chair of Logic & Language"), "chair-of-logic-language");
        assert_eq!(slugify("Müller"), "müller");
    }

    #[test]
    fn mentions_respect_word_boundaries() {
        assert!(mentions("supervised by bob.", "bob"));
        assert!(mentions("bob", "bob"));
        assert!(mentions("jane roe and bob", "jane roe"));
        assert!(!mentions("bobby tables", "bob"));
        assert!(!mentions("kabob", "bob"));
        assert!(!mentions("anything", ""));
    }
}
