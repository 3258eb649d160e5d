use chrono::{DateTime, Duration, Utc};

/// 时间间隔解析器（cookie 有效期等配置项）
pub struct TimeParser;

impl TimeParser {
    /// 解析时间间隔字符串，支持两种格式：
    /// - 相对时间：1d, 2w, 6M, 10y, 1h30m, 2d12h
    /// - ISO 8601：P10Y, P1Y6M, P2W, PT12H, P1DT30M
    ///
    /// 月按 30 天、年按 365 天近似。结果必须大于零。
    pub fn parse_interval(input: &str) -> Result<Duration, String> {
        let input = input.trim();
        if input.is_empty() {
            return Err("时间间隔不能为空".to_string());
        }

        let duration = if let Some(iso) = input.strip_prefix('P') {
            Self::parse_iso8601(iso, input)?
        } else {
            Self::parse_relative(input)?
        };

        if duration <= Duration::zero() {
            return Err("时间间隔必须大于零".to_string());
        }
        Ok(duration)
    }

    fn parse_relative(input: &str) -> Result<Duration, String> {
        let mut total = Duration::zero();
        let mut remaining = input;

        while !remaining.is_empty() {
            let digits = remaining
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(remaining.len());
            if digits == 0 {
                return Err(format!("无效的时间格式: '{}'", input));
            }
            let num: i64 = remaining[..digits]
                .parse()
                .map_err(|_| format!("无效的数字: '{}'", &remaining[..digits]))?;
            remaining = &remaining[digits..];

            let unit_len = remaining
                .find(|c: char| !c.is_alphabetic())
                .unwrap_or(remaining.len());
            if unit_len == 0 {
                return Err(format!("缺少时间单位，数字 '{}' 后应跟时间单位", num));
            }
            let unit = &remaining[..unit_len];
            remaining = &remaining[unit_len..];

            // "M" 表示月，"m" 表示分钟，因此单字母单位区分大小写
            let step = match unit {
                "s" | "sec" | "second" | "seconds" => Duration::try_seconds(num),
                "m" | "min" | "minute" | "minutes" => Duration::try_minutes(num),
                "h" | "hour" | "hours" => Duration::try_hours(num),
                "d" | "day" | "days" => Duration::try_days(num),
                "w" | "week" | "weeks" => Duration::try_weeks(num),
                "M" | "month" | "months" => num.checked_mul(30).and_then(Duration::try_days),
                "y" | "year" | "years" => num.checked_mul(365).and_then(Duration::try_days),
                _ => return Err(format!("不支持的时间单位: '{}'", unit)),
            }
            .ok_or_else(|| format!("时间间隔超出范围: '{}'", input))?;

            total = total
                .checked_add(&step)
                .ok_or_else(|| format!("时间间隔超出范围: '{}'", input))?;
        }

        Ok(total)
    }

    fn parse_iso8601(body: &str, original: &str) -> Result<Duration, String> {
        let invalid = || format!("无效的 ISO 8601 时间间隔: '{}'", original);

        if body.is_empty() {
            return Err(invalid());
        }

        let mut total = Duration::zero();
        let mut in_time = false;
        let mut number = String::new();

        for c in body.chars() {
            if c == 'T' {
                if in_time || !number.is_empty() {
                    return Err(invalid());
                }
                in_time = true;
                continue;
            }
            if c.is_ascii_digit() {
                number.push(c);
                continue;
            }

            let num: i64 = number.parse().map_err(|_| invalid())?;
            number.clear();

            let step = match (in_time, c) {
                (false, 'Y') => num.checked_mul(365).and_then(Duration::try_days),
                (false, 'M') => num.checked_mul(30).and_then(Duration::try_days),
                (false, 'W') => Duration::try_weeks(num),
                (false, 'D') => Duration::try_days(num),
                (true, 'H') => Duration::try_hours(num),
                (true, 'M') => Duration::try_minutes(num),
                (true, 'S') => Duration::try_seconds(num),
                _ => return Err(invalid()),
            }
            .ok_or_else(invalid)?;

            total = total.checked_add(&step).ok_or_else(invalid)?;
        }

        if !number.is_empty() {
            return Err(invalid());
        }

        Ok(total)
    }

    /// 将两个时间点的间隔格式化为简短文本，如 `2d 3h`、`5m`
    pub fn format_duration_human(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
        let seconds = to.signed_duration_since(from).num_seconds().max(0);
        let days = seconds / 86400;
        let hours = (seconds % 86400) / 3600;
        let minutes = (seconds % 3600) / 60;

        match (days, hours, minutes) {
            (0, 0, 0) => format!("{}s", seconds),
            (0, 0, m) => format!("{}m", m),
            (0, h, 0) => format!("{}h", h),
            (0, h, m) => format!("{}h {}m", h, m),
            (d, 0, _) => format!("{}d", d),
            (d, h, _) => format!("{}d {}h", d, h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_relative_interval() {
        assert_eq!(TimeParser::parse_interval("1d").unwrap(), Duration::days(1));
        assert_eq!(TimeParser::parse_interval("2w").unwrap(), Duration::days(14));
        assert_eq!(
            TimeParser::parse_interval("10y").unwrap(),
            Duration::days(3650)
        );
        assert_eq!(
            TimeParser::parse_interval("1h30m").unwrap(),
            Duration::minutes(90)
        );
        assert_eq!(TimeParser::parse_interval("6M").unwrap(), Duration::days(180));
    }

    #[test]
    fn test_parse_iso8601_interval() {
        assert_eq!(
            TimeParser::parse_interval("P10Y").unwrap(),
            Duration::days(3650)
        );
        assert_eq!(
            TimeParser::parse_interval("P1Y6M").unwrap(),
            Duration::days(365 + 180)
        );
        assert_eq!(
            TimeParser::parse_interval("PT12H").unwrap(),
            Duration::hours(12)
        );
        assert_eq!(
            TimeParser::parse_interval("P1DT30M").unwrap(),
            Duration::days(1) + Duration::minutes(30)
        );
    }

    #[test]
    fn test_invalid_intervals() {
        assert!(TimeParser::parse_interval("").is_err());
        assert!(TimeParser::parse_interval("0d").is_err());
        assert!(TimeParser::parse_interval("abc").is_err());
        assert!(TimeParser::parse_interval("5").is_err());
        assert!(TimeParser::parse_interval("3x").is_err());
        assert!(TimeParser::parse_interval("P").is_err());
        assert!(TimeParser::parse_interval("P5").is_err());
        assert!(TimeParser::parse_interval("PT5D").is_err());
        assert!(TimeParser::parse_interval("99999999999999y").is_err());
    }

    #[test]
    fn test_format_duration_human() {
        let start = Utc::now();
        assert_eq!(TimeParser::format_duration_human(start, start), "0s");
        assert_eq!(
            TimeParser::format_duration_human(start, start + Duration::minutes(90)),
            "1h 30m"
        );
        assert_eq!(
            TimeParser::format_duration_human(start, start + Duration::hours(49)),
            "2d 1h"
        );
        assert_eq!(
            TimeParser::format_duration_human(start + Duration::hours(1), start),
            "0s"
        );
    }
}
