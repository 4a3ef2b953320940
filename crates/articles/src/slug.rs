//! URL slugs.
//!
//! Slugs are lowercase ASCII letters, digits and dashes. Cyrillic headlines
//! are transliterated; any other character is dropped.

/// Longest slug the `articles.slug` column holds.
pub const MAX_SLUG_LEN: usize = 30;

const CYRILLIC: [(char, &str); 32] = [
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('ж', "zh"),
    ('з', "z"),
    ('и', "i"),
    ('й', "y"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('щ', "sch"),
    ('ъ', ""),
    ('ы', "y"),
    ('ь', ""),
    ('э', "e"),
    ('ю', "yu"),
    ('я', "ya"),
];

fn transliterate(c: char) -> Option<&'static str> {
    CYRILLIC.iter().find(|(k, _)| *k == c).map(|(_, v)| *v)
}

pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars().flat_map(char::to_lowercase) {
        match c {
            ' ' => slug.push('-'),
            'a'..='z' | '0'..='9' => slug.push(c),
            _ => {
                if let Some(latin) = transliterate(c) {
                    slug.push_str(latin);
                }
            }
        }
    }
    slug
}

pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn latin_headlines() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("Top 10 Tips!"), "top-10-tips");
        assert_eq!(slugify(""), "");
    }

    #[test]
    fn cyrillic_headlines_are_transliterated() {
        assert_eq!(slugify("Привет Мир"), "privet-mir");
        assert_eq!(slugify("Щука и ёж"), "schuka-i-zh");
        assert_eq!(slugify("Объявление"), "obyavlenie");
    }

    #[test]
    fn validity() {
        assert!(is_valid_slug("hello-world-2"));
        assert!(!is_valid_slug(""));
        assert!(!is_valid_slug("Hello"));
        assert!(!is_valid_slug("hello world"));
        assert!(!is_valid_slug("привет"));
    }

    proptest! {
        #[test]
        fn slugify_only_emits_slug_characters(text in "\\PC*") {
            let slug = slugify(&text);
            prop_assert!(slug.is_empty() || is_valid_slug(&slug));
        }
    }
}
