//! Course payloads and query parameters

use serde::Deserialize;

use super::SqlParam;

/// Price ceiling used when `maxPrice` is absent, zero or not a number
pub const DEFAULT_MAX_PRICE: i64 = 999_999;

/// Body of `PUT /api/courses/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CoursePayload {
    pub name: SqlParam,
    pub language: SqlParam,
    pub price: SqlParam,
}

impl CoursePayload {
    pub fn into_params(self) -> Vec<SqlParam> {
        vec![self.name, self.language, self.price]
    }
}

/// Query string of `GET /api/users/courses/{teacherId}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeacherCoursesQuery {
    pub max_price: Option<String>,
}

impl TeacherCoursesQuery {
    /// Effective price ceiling.
    ///
    /// Reads the leading integer of the value, so `"12.5"` is 12 and
    /// `"100abc"` is 100. Missing, zero or digit-less input means no ceiling.
    pub fn max_price(&self) -> i64 {
        match self.max_price.as_deref().and_then(leading_integer) {
            Some(0) | None => DEFAULT_MAX_PRICE,
            Some(price) => price,
        }
    }
}

/// Optional sign followed by at least one digit, after leading whitespace
fn leading_integer(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value = rest[..digits].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

/// Query string of `GET /api/users/income/{teacherId}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeQuery {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl IncomeQuery {
    /// Both bounds, if present and non-empty
    pub fn range(&self) -> Option<(&str, &str)> {
        let start = self.start_date.as_deref().filter(|s| !s.trim().is_empty())?;
        let end = self.end_date.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_price_defaults() {
        assert_eq!(TeacherCoursesQuery::default().max_price(), DEFAULT_MAX_PRICE);

        let q = TeacherCoursesQuery { max_price: Some("abc".into()) };
        assert_eq!(q.max_price(), DEFAULT_MAX_PRICE);

        let q = TeacherCoursesQuery { max_price: Some("100".into()) };
        assert_eq!(q.max_price(), 100);

        let q = TeacherCoursesQuery { max_price: Some("0".into()) };
        assert_eq!(q.max_price(), DEFAULT_MAX_PRICE);

        let q = TeacherCoursesQuery { max_price: Some("".into()) };
        assert_eq!(q.max_price(), DEFAULT_MAX_PRICE);
    }

    #[test]
    fn max_price_reads_leading_integer() {
        let cases = [
            ("12.5", 12),
            ("100abc", 100),
            ("  250", 250),
            ("+40", 40),
            ("-5", -5),
            ("1e3", 1),
        ];
        for (raw, expected) in cases {
            let q = TeacherCoursesQuery { max_price: Some(raw.into()) };
            assert_eq!(q.max_price(), expected, "maxPrice={raw}");
        }

        let q = TeacherCoursesQuery { max_price: Some("-abc".into()) };
        assert_eq!(q.max_price(), DEFAULT_MAX_PRICE);
    }

    #[test]
    fn income_range_requires_both_dates() {
        let q = IncomeQuery {
            start_date: Some("2024-01-01".into()),
            end_date: None,
        };
        assert!(q.range().is_none());

        let q = IncomeQuery {
            start_date: Some("".into()),
            end_date: Some("2024-12-31".into()),
        };
        assert!(q.range().is_none());

        let q = IncomeQuery {
            start_date: Some("2024-01-01".into()),
            end_date: Some("2024-12-31".into()),
        };
        assert_eq!(q.range(), Some(("2024-01-01", "2024-12-31")));
    }

    #[test]
    fn course_params_order() {
        let payload: CoursePayload =
            serde_json::from_str(r#"{"name": "Rust", "language": "vi", "price": -5}"#).unwrap();
        assert_eq!(
            payload.into_params(),
            vec![
                SqlParam::Text("Rust".into()),
                SqlParam::Text("vi".into()),
                SqlParam::Int(-5),
            ]
        );
    }
}
