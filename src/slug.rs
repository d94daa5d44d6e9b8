/// Longest slug a wall address may use.
pub const MAX_SLUG_LEN: usize = 50;

/// Path segments under `/wall/` that belong to other routes.
const RESERVED: &[&str] = &["create"];

/// Derive a wall address from a title: lowercase ASCII letters and digits,
/// with runs of anything else collapsed to a single hyphen.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_hyphen = false;

    for c in title.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        }
    }

    let mut slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// Why `slug` cannot be used as a wall address, if it cannot.
pub fn check(slug: &str) -> Result<(), &'static str> {
    if slug.is_empty() {
        return Err("This field is required.");
    }
    if slug.chars().count() > MAX_SLUG_LEN {
        return Err("Ensure this value has at most 50 characters.");
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(
            "Enter a valid \u{201c}slug\u{201d} consisting of letters, numbers, underscores or hyphens.",
        );
    }
    if RESERVED.contains(&slug) {
        return Err("This address is reserved.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_titles() {
        assert_eq!(slugify("Our First Year!"), "our-first-year");
        assert_eq!(slugify("  happy -- birthday  "), "happy-birthday");
        assert_eq!(slugify("Crème brûlée"), "crme-brle");
        assert_eq!(slugify("snake_case ok"), "snake_case-ok");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slugify_truncates() {
        let slug = slugify(&"a ".repeat(60));
        assert!(slug.len() <= MAX_SLUG_LEN);
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn check_slugs() {
        assert!(check("our-wall_2").is_ok());
        assert!(check("").is_err());
        assert!(check("Has Spaces").is_err());
        assert!(check("UPPER").is_err());
        assert!(check("create").is_err());
        assert!(check(&"x".repeat(51)).is_err());
    }
}
