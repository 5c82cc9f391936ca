/// Format a signed amount as `-£1,234.50`
pub fn format_money(symbol: &str, amount: f64) -> String {
    let sign = if amount < 0.0 && (amount * 100.0).round() != 0.0 { "-" } else { "" };
    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = group_thousands(cents / 100);
    format!("{sign}{symbol}{whole}.{:02}", cents % 100)
}

fn group_thousands(mut n: u64) -> String {
    let mut groups = Vec::new();
    loop {
        if n < 1000 {
            groups.push(n.to_string());
            break;
        }
        groups.push(format!("{:03}", n % 1000));
        n /= 1000;
    }
    groups.reverse();
    groups.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_money() {
        assert_eq!(format_money("£", 0.0), "£0.00");
        assert_eq!(format_money("£", -4.5), "-£4.50");
        assert_eq!(format_money("£", 2495.5), "£2,495.50");
        assert_eq!(format_money("$", 1_234_567.891), "$1,234,567.89");
        assert_eq!(format_money("", -0.001), "0.00");
        assert_eq!(format_money("£", 1000.0), "£1,000.00");
    }
}
