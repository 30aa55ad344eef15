//! Display helpers shared by the justification text and the formatters

/// Whole-dollar currency: 74000.4 → "$74,000"
///
/// Halves round to even, so 100000.5 → "$100,000" and 100001.5 → "$100,002".
pub fn dollars(value: f64) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }

    let rounded = value.round_ties_even();
    let negative = rounded < 0.0;
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-${}", grouped)
    } else {
        format!("${}", grouped)
    }
}

/// Currency for optional values; missing renders as an em dash
pub fn dollars_opt(value: Option<f64>) -> String {
    value.map(dollars).unwrap_or_else(|| "—".to_string())
}

/// "VAN BUREN" → "Van Buren"
pub fn title_case(raw: &str) -> String {
    raw.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dollars() {
        assert_eq!(dollars(0.0), "$0");
        assert_eq!(dollars(999.0), "$999");
        assert_eq!(dollars(74000.4), "$74,000");
        assert_eq!(dollars(1234567.0), "$1,234,567");
        assert_eq!(dollars(-5000.0), "-$5,000");
        assert_eq!(dollars(f64::NAN), "—");
    }

    #[test]
    fn test_dollars_half_rounds_to_even() {
        assert_eq!(dollars(100000.5), "$100,000");
        assert_eq!(dollars(100001.5), "$100,002");
        assert_eq!(dollars(117500.5), "$117,500");
        assert_eq!(dollars(-2.5), "-$2");
    }

    #[test]
    fn test_dollars_opt() {
        assert_eq!(dollars_opt(Some(150000.0)), "$150,000");
        assert_eq!(dollars_opt(None), "—");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("VAN BUREN"), "Van Buren");
        assert_eq!(title_case("davidson"), "Davidson");
        assert_eq!(title_case(""), "");
    }
}
