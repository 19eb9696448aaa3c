use serde::Serialize;

/// Whether a revenue figure covers worldwide gross or only the domestic
/// market. OMDb's `BoxOffice` field is US-domestic, so a figure sourced from
/// it must never be presented as worldwide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RevenueScope {
    Worldwide,
    DomesticOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RevenueFigure {
    pub amount: i64,
    pub scope: RevenueScope,
}

/// Parses an OMDb-style currency string (`"$123,456,789"`) into whole
/// dollars. Anything left over after stripping `$`, `,` and whitespace that
/// is not a plain digit string (`"N/A"` included) is `None`, not an error.
pub fn parse_amount(raw: &str) -> Option<i64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() || !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    cleaned.parse().ok()
}

/// Picks the revenue figure to display. A positive worldwide gross from the
/// catalog always wins; the domestic box-office string is only a fallback
/// when the catalog reports nothing, and it keeps its domestic-only tag.
pub fn reconcile_revenue(worldwide: i64, box_office: Option<&str>) -> Option<RevenueFigure> {
    if worldwide > 0 {
        return Some(RevenueFigure {
            amount: worldwide,
            scope: RevenueScope::Worldwide,
        });
    }
    box_office.and_then(parse_amount).map(|amount| RevenueFigure {
        amount,
        scope: RevenueScope::DomesticOnly,
    })
}

/// Profit is always derived from its inputs at read time, never stored.
pub fn profit(revenue: i64, budget: i64) -> i64 {
    revenue - budget
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_dollar_comma_strings() {
        assert_eq!(parse_amount("$123,456,789"), Some(123_456_789));
        assert_eq!(parse_amount("$1,000"), Some(1_000));
        assert_eq!(parse_amount(" $42 "), Some(42));
        assert_eq!(parse_amount("900"), Some(900));
    }

    #[test]
    fn rejects_non_numeric_remainders() {
        assert_eq!(parse_amount("N/A"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount("$12.5M"), None);
    }

    #[test]
    fn worldwide_revenue_wins_over_box_office() {
        let figure = reconcile_revenue(500_000_000, Some("$123,456,789")).unwrap();
        assert_eq!(figure.amount, 500_000_000);
        assert_eq!(figure.scope, RevenueScope::Worldwide);
    }

    #[test]
    fn falls_back_to_domestic_when_worldwide_missing() {
        let figure = reconcile_revenue(0, Some("$123,456,789")).unwrap();
        assert_eq!(figure.amount, 123_456_789);
        assert_eq!(figure.scope, RevenueScope::DomesticOnly);
    }

    #[test]
    fn no_figure_when_both_sources_empty() {
        assert_eq!(reconcile_revenue(0, None), None);
        assert_eq!(reconcile_revenue(0, Some("N/A")), None);
    }

    #[test]
    fn profit_is_revenue_minus_budget() {
        assert_eq!(profit(500_000_000, 200_000_000), 300_000_000);
        assert_eq!(profit(50, 100), -50);
    }
}
