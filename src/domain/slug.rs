/// Lowercase ASCII slug: alphanumeric runs joined by single dashes.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

/// `base`, then `base-2`, `base-3`, ... for collision retries.
pub fn with_suffix(base: &str, attempt: u32) -> String {
    if attempt <= 1 {
        base.to_string()
    } else {
        format!("{base}-{attempt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Ferris & Friends -- Shop "), "ferris-friends-shop");
        assert_eq!(slugify("Café Rust"), "caf-rust");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn suffixes_start_at_two() {
        assert_eq!(with_suffix("shop", 1), "shop");
        assert_eq!(with_suffix("shop", 2), "shop-2");
    }
}
