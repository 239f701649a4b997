/// Lowercases, drops punctuation and collapses whitespace/hyphen runs into
/// single hyphens. Non-ASCII letters are kept as-is; anything else is treated
/// as a separator.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut last_was_hyphen = true;

    for ch in input.chars() {
        if ch.is_alphanumeric() {
            for lower in ch.to_lowercase() {
                slug.push(lower);
            }
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

/// First candidate out of `base`, `base-2`, `base-3`, ... that is not in
/// `taken`. Entries in `taken` that merely share the prefix (say `rust-lang`
/// next to `rust`) never block a candidate, only exact matches do.
pub fn next_free_slug(base: &str, taken: &[String]) -> String {
    if !taken.iter().any(|slug| slug == base) {
        return base.to_string();
    }
    let mut counter = 2u64;
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !taken.iter().any(|slug| *slug == candidate) {
            return candidate;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(slugs: &[&str]) -> Vec<String> {
        slugs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn slugifies_titles() {
        assert_eq!(slugify("Why is the sky blue?"), "why-is-the-sky-blue");
        assert_eq!(slugify("  Hello,   World!  "), "hello-world");
        assert_eq!(slugify("Rust 2021"), "rust-2021");
    }

    #[test]
    fn strips_leading_and_trailing_separators() {
        assert_eq!(slugify("---abc---"), "abc");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn picks_the_first_free_candidate() {
        assert_eq!(next_free_slug("rust", &[]), "rust");
        assert_eq!(next_free_slug("rust", &owned(&["rust"])), "rust-2");
        assert_eq!(
            next_free_slug("rust", &owned(&["rust", "rust-2"])),
            "rust-3"
        );
        assert_eq!(
            next_free_slug("rust", &owned(&["rust", "rust-3"])),
            "rust-2"
        );
    }

    #[test]
    fn prefix_neighbours_do_not_block_the_base_slug() {
        // "rust-2" exists but "rust" itself is free.
        assert_eq!(next_free_slug("rust", &owned(&["rust-2"])), "rust");
        assert_eq!(
            next_free_slug("rust", &owned(&["rust-lang", "rust-2021"])),
            "rust"
        );
    }
}
