/// Derive a URL path segment from a post title.
///
/// Lower-cases the title, collapses every run of characters outside
/// `[a-z0-9]` into a single hyphen and trims hyphens from both ends.
/// Collisions are not resolved here.
pub fn generate_slug(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_and_whitespace_collapse() {
        assert_eq!(generate_slug("Hello, World!"), "hello-world");
        assert_eq!(generate_slug("hello   world"), "hello-world");
    }

    #[test]
    fn test_trims_leading_and_trailing_separators() {
        assert_eq!(generate_slug("  --Batch 2024: Reunion!-- "), "batch-2024-reunion");
    }

    #[test]
    fn test_non_ascii_letters_act_as_separators() {
        assert_eq!(generate_slug("Café Olé"), "caf-ol");
    }

    #[test]
    fn test_title_without_alphanumerics_is_empty() {
        assert_eq!(generate_slug("!!! ???"), "");
        assert_eq!(generate_slug(""), "");
    }

    #[test]
    fn test_deterministic() {
        let title = "Graduation Day / Part 2";
        assert_eq!(generate_slug(title), generate_slug(title));
        assert_eq!(generate_slug(title), "graduation-day-part-2");
    }
}
