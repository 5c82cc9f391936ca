//! Deterministic category rules for rows that arrive without a category.
//!
//! Keyword matching on merchant and description covers the common UK high
//! street; anything else falls back to `Uncategorized`.

const RULES: &[(&str, &[&str])] = &[
    (
        "Groceries",
        &[
            "TESCO", "SAINSBURY", "ASDA", "ALDI", "LIDL", "WAITROSE", "MORRISONS", "CO-OP",
            "OCADO", "WHOLE FOODS", "M&S FOOD",
        ],
    ),
    (
        "Restaurants",
        &[
            "RESTAURANT", "PIZZA", "DISHOOM", "NANDO", "WAGAMAMA", "PRET", "STARBUCKS", "COSTA",
            "CAFE", "DELIVEROO", "JUST EAT", "UBER EATS",
        ],
    ),
    (
        "Entertainment",
        &["NETFLIX", "SPOTIFY", "DISNEY", "CINEMA", "ODEON", "STEAM", "PLAYSTATION", "YOUTUBE"],
    ),
    (
        "Shopping",
        &["AMAZON", "EBAY", "ARGOS", "JOHN LEWIS", "IKEA", "PRIMARK", "ZARA", "APPLE STORE"],
    ),
    (
        "Transport",
        &["UBER", "TFL", "TRAINLINE", "NATIONAL RAIL", "SHELL", " BP ", "ESSO", "BOLT"],
    ),
    (
        "Bills",
        &[
            "BRITISH GAS", "OCTOPUS", "EDF", "THAMES WATER", "COUNCIL TAX", "VODAFONE", " EE ",
            "VIRGIN MEDIA", " BT ",
        ],
    ),
    ("Housing", &["RENT", "MORTGAGE", "LETTING"]),
    ("Income", &["SALARY", "PAYROLL", "WAGES"]),
];

/// Category implied by the merchant (checked first) or the description
pub fn infer_category(merchant: &str, description: Option<&str>) -> Option<&'static str> {
    // Padded so short space-delimited keywords (" BP ") match whole words only
    let merchant = format!(" {} ", merchant.to_uppercase());
    if let Some(c) = match_rules(&merchant) {
        return Some(c);
    }
    let description = format!(" {} ", description?.to_uppercase());
    match_rules(&description)
}

fn match_rules(text: &str) -> Option<&'static str> {
    // Longest keyword wins so "UBER EATS" beats "UBER"
    RULES
        .iter()
        .flat_map(|(category, keywords)| keywords.iter().map(move |k| (*category, *k)))
        .filter(|(_, k)| text.contains(k))
        .max_by_key(|(_, k)| k.len())
        .map(|(category, _)| category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_merchants() {
        assert_eq!(infer_category("Tesco Express", None), Some("Groceries"));
        assert_eq!(infer_category("Sainsbury's", None), Some("Groceries"));
        assert_eq!(infer_category("AMAZON.CO.UK", None), Some("Shopping"));
        assert_eq!(infer_category("Netflix.com", None), Some("Entertainment"));
    }

    #[test]
    fn test_longest_keyword_wins() {
        assert_eq!(infer_category("Uber Eats", None), Some("Restaurants"));
        assert_eq!(infer_category("Uber", None), Some("Transport"));
    }

    #[test]
    fn test_short_keywords_match_whole_words() {
        assert_eq!(infer_category("BP", None), Some("Transport"));
        assert_eq!(infer_category("BPM Studio", None), None);
        assert_eq!(infer_category("Coffee House", None), None);
    }

    #[test]
    fn test_description_fallback() {
        assert_eq!(infer_category("ACME Ltd", Some("Salary July")), Some("Income"));
        assert_eq!(infer_category("ACME Ltd", None), None);
        assert_eq!(infer_category("Mystery Shop", Some("stuff")), None);
    }
}
