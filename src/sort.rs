//! Display ordering for titles and folder names
//!
//! Titles are bucketed before collation: letters first, then other symbols,
//! then digits, then blank titles. Digits intentionally sort after symbols.

use std::cmp::Ordering;

/// Collation capability used to build the within-class key
pub trait Collator: Send + Sync {
    /// Key whose byte order matches the desired title order
    fn collation_key(&self, title: &str) -> String;
}

/// Case-insensitive collation that also folds common Latin diacritics,
/// so `Élan` sorts next to `Elan` rather than after `Zebra`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CaseFoldCollator;

impl Collator for CaseFoldCollator {
    fn collation_key(&self, title: &str) -> String {
        title.chars().flat_map(char::to_lowercase).map(fold_diacritic).collect()
    }
}

fn fold_diacritic(c: char) -> char {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => 'a',
        'ç' | 'ć' | 'č' => 'c',
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ě' => 'e',
        'ì' | 'í' | 'î' | 'ï' | 'ī' => 'i',
        'ñ' | 'ń' | 'ň' => 'n',
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => 'o',
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' => 'u',
        'ý' | 'ÿ' => 'y',
        'š' | 'ś' => 's',
        'ž' | 'ź' | 'ż' => 'z',
        other => other,
    }
}

/// Ordering bucket of a title
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityClass {
    /// Starts with a Latin letter
    Letter = 0,
    /// Starts with anything else that is not a digit
    Symbol = 1,
    /// Starts with an ASCII decimal digit
    Digit = 2,
    /// Empty or whitespace-only
    Blank = 3,
}

impl PriorityClass {
    /// Classify a title by its first non-whitespace character
    pub fn of(title: &str) -> Self {
        match title.trim().chars().next() {
            None => PriorityClass::Blank,
            Some(c) if is_latin_letter(c) => PriorityClass::Letter,
            Some(c) if c.is_ascii_digit() => PriorityClass::Digit,
            Some(_) => PriorityClass::Symbol,
        }
    }
}

fn is_latin_letter(c: char) -> bool {
    c.is_ascii_alphabetic() || (c.is_alphabetic() && ('\u{00C0}'..='\u{024F}').contains(&c))
}

/// Ordering key of a title: priority class, then collation key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SortKey {
    pub class: PriorityClass,
    pub collation: String,
}

impl SortKey {
    /// Key of `title` under `collator`
    pub fn new(title: &str, collator: &dyn Collator) -> Self {
        let trimmed = title.trim();
        let class = PriorityClass::of(trimmed);
        let collation = match class {
            PriorityClass::Blank => String::new(),
            _ => collator.collation_key(trimmed),
        };
        Self { class, collation }
    }
}

/// Key of `title` under the default collator
pub fn sort_key(title: &str) -> SortKey {
    SortKey::new(title, &CaseFoldCollator)
}

/// Compare two titles
pub fn compare_titles(a: &str, b: &str, collator: &dyn Collator) -> Ordering {
    SortKey::new(a, collator).cmp(&SortKey::new(b, collator))
}

/// Sort items by the key of the title returned by `title`. Stable, so equal
/// keys keep their incoming order.
pub fn sort_by_title<T, F>(items: &mut [T], collator: &dyn Collator, title: F)
where
    F: Fn(&T) -> &str,
{
    items.sort_by_cached_key(|item| SortKey::new(title(item), collator));
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_letters_symbols_digits_blank() {
        let mut titles = vec!["Zebra", "1Track", "!Weird", ""];
        sort_by_title(&mut titles, &CaseFoldCollator, |t| *t);
        assert_eq!(titles, vec!["Zebra", "!Weird", "1Track", ""]);
    }

    #[test]
    fn test_priority_classes() {
        assert_eq!(PriorityClass::of("abc"), PriorityClass::Letter);
        assert_eq!(PriorityClass::of("  Émile"), PriorityClass::Letter);
        assert_eq!(PriorityClass::of("_intro"), PriorityClass::Symbol);
        assert_eq!(PriorityClass::of("Ωmega"), PriorityClass::Symbol);
        assert_eq!(PriorityClass::of("07 Track"), PriorityClass::Digit);
        assert_eq!(PriorityClass::of("   "), PriorityClass::Blank);
    }

    #[test]
    fn test_numeric_symbols_are_not_digits() {
        assert_eq!(PriorityClass::of("½ time"), PriorityClass::Symbol);
        assert_eq!(PriorityClass::of("²"), PriorityClass::Symbol);
        assert_eq!(PriorityClass::of("Ⅳ"), PriorityClass::Symbol);
        assert_eq!(PriorityClass::of("0"), PriorityClass::Digit);
    }

    #[test]
    fn test_case_insensitive_within_class() {
        let mut titles = vec!["beta", "Alpha", "alpha2", "Élan", "Zulu"];
        sort_by_title(&mut titles, &CaseFoldCollator, |t| *t);
        assert_eq!(titles, vec!["Alpha", "alpha2", "beta", "Élan", "Zulu"]);
    }

    #[test]
    fn test_trimmed_before_keying() {
        assert_eq!(sort_key("  Song "), sort_key("song"));
        assert_eq!(
            compare_titles("\tabc", "ABD", &CaseFoldCollator),
            Ordering::Less
        );
    }

    struct ReverseCollator;

    impl Collator for ReverseCollator {
        fn collation_key(&self, title: &str) -> String {
            title
                .to_lowercase()
                .chars()
                .map(|c| char::from_u32(0x10FFFF - c as u32).unwrap_or(c))
                .collect()
        }
    }

    #[test]
    fn test_injected_collator_only_orders_within_class() {
        let mut titles = vec!["apple", "zoo", "9lives"];
        sort_by_title(&mut titles, &ReverseCollator, |t| *t);
        assert_eq!(titles, vec!["zoo", "apple", "9lives"]);
    }

    proptest! {
        #[test]
        fn prop_digit_titles_after_letter_titles(letter in "[A-Za-z][a-z0-9 ]{0,8}", digit in "[0-9][a-z0-9 ]{0,8}") {
            prop_assert_eq!(compare_titles(&letter, &digit, &CaseFoldCollator), Ordering::Less);
        }

        #[test]
        fn prop_blank_sorts_last(title in "\\PC{0,10}") {
            let key = sort_key(&title);
            prop_assert!(key <= sort_key("   "));
        }
    }
}
