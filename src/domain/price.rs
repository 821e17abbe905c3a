// ==========================================
// 商品导入系统 - 价格值对象
// ==========================================
// 职责: 定点小数价格（以分为单位存储）
// 红线: 小数位校验基于原始文本，不经过二进制浮点
// ==========================================

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 价格允许的最大小数位数
pub const PRICE_SCALE: usize = 2;

const CENTS_PER_UNIT: i64 = 100;

// ==========================================
// Price - 非负定点价格
// ==========================================
/// 以最小货币单位（分）存储的非负价格
///
/// 比较按数值进行：`"44.9"` 与 `"44.90"` 解析后相等。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

impl Price {
    pub const ZERO: Price = Price(0);

    /// 从分值构造（负值按 0 处理）
    pub fn from_cents(cents: i64) -> Self {
        Price(cents.max(0))
    }

    pub fn cents(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{:02}",
            self.0 / CENTS_PER_UNIT,
            self.0 % CENTS_PER_UNIT
        )
    }
}

/// 价格文本解析错误
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceParseError {
    #[error("value is not numeric")]
    NotNumeric,

    #[error("value is negative")]
    Negative,

    #[error("value has more than 2 decimal places")]
    TooPrecise,
}

// ==========================================
// ParsedPrice - 原始文本解析结果
// ==========================================
/// 保留原始小数位数的解析结果
///
/// `truncated` 为截断到分的值；超出精度的位数只记录位数，不参与取整。
/// 由于截断值 `t` 满足 `t <= v < t + 0.01`，与任何两位小数价格比较时，
/// 截断值的大小关系与原始值一致。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedPrice {
    truncated: Price,
    fraction_digits: usize,
}

impl ParsedPrice {
    /// 截断到分的价格
    pub fn truncated(&self) -> Price {
        self.truncated
    }

    /// 原始文本中小数点后的位数
    pub fn fraction_digits(&self) -> usize {
        self.fraction_digits
    }

    pub fn exceeds_scale(&self) -> bool {
        self.fraction_digits > PRICE_SCALE
    }

    /// 原始值是否大于等于给定的两位小数价格
    pub fn is_at_least(&self, other: Price) -> bool {
        self.truncated >= other
    }
}

/// 解析价格原始文本
///
/// 接受: 可选首尾空白、可选正负号、整数位、可选小数点与小数位（至少一位数字）。
/// 不接受: 科学计数法、千分位、货币符号。
pub fn parse_price_text(raw: &str) -> Result<ParsedPrice, PriceParseError> {
    let text = raw.trim();

    let (negative, body) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));

    if int_part.is_empty() && frac_part.is_empty() {
        return Err(PriceParseError::NotNumeric);
    }
    if !int_part.bytes().all(|b| b.is_ascii_digit()) || !frac_part.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(PriceParseError::NotNumeric);
    }
    if negative {
        return Err(PriceParseError::Negative);
    }

    let units = int_part.bytes().try_fold(0i64, |acc, b| {
        acc.checked_mul(10)?.checked_add(i64::from(b - b'0'))
    });

    // 取前两位小数，不足补零
    let mut cents_part = 0i64;
    let mut digits = frac_part.bytes();
    for _ in 0..PRICE_SCALE {
        let digit = digits.next().map(|b| i64::from(b - b'0')).unwrap_or(0);
        cents_part = cents_part * 10 + digit;
    }

    let cents = units
        .and_then(|u| u.checked_mul(CENTS_PER_UNIT))
        .and_then(|c| c.checked_add(cents_part))
        .ok_or(PriceParseError::NotNumeric)?;

    Ok(ParsedPrice {
        truncated: Price(cents),
        fraction_digits: frac_part.len(),
    })
}

impl FromStr for Price {
    type Err = PriceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = parse_price_text(s)?;
        if parsed.exceeds_scale() {
            return Err(PriceParseError::TooPrecise);
        }
        Ok(parsed.truncated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_decimals() {
        let price: Price = "12.99".parse().unwrap();
        assert_eq!(price.cents(), 1299);
        assert_eq!(price.to_string(), "12.99");
    }

    #[test]
    fn test_parse_integer_and_short_fraction() {
        assert_eq!("44".parse::<Price>().unwrap().cents(), 4400);
        assert_eq!("44.9".parse::<Price>().unwrap().cents(), 4490);
        assert_eq!(".5".parse::<Price>().unwrap().cents(), 50);
        assert_eq!("7.".parse::<Price>().unwrap().cents(), 700);
        assert_eq!("0".parse::<Price>().unwrap(), Price::ZERO);
    }

    #[test]
    fn test_value_equality_ignores_representation() {
        let a: Price = "44.9".parse().unwrap();
        let b: Price = "44.90".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_fraction_digits_counted_on_text() {
        let parsed = parse_price_text("12.990").unwrap();
        assert_eq!(parsed.fraction_digits(), 3);
        assert!(parsed.exceeds_scale());
        assert_eq!("12.999".parse::<Price>(), Err(PriceParseError::TooPrecise));
    }

    #[test]
    fn test_rejects_non_numeric() {
        for raw in ["", " ", "abc", "1e3", "1,000", "$5", "1.2.3", ".", "-", "+"] {
            assert_eq!(
                parse_price_text(raw),
                Err(PriceParseError::NotNumeric),
                "raw={raw:?}"
            );
        }
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(parse_price_text("-1.00"), Err(PriceParseError::Negative));
        assert_eq!(parse_price_text("-0"), Err(PriceParseError::Negative));
    }

    #[test]
    fn test_overflow_is_not_numeric() {
        assert_eq!(
            parse_price_text("99999999999999999999"),
            Err(PriceParseError::NotNumeric)
        );
    }

    #[test]
    fn test_truncated_comparison_is_exact() {
        let normal: Price = "10.00".parse().unwrap();
        assert!(parse_price_text("10.001").unwrap().is_at_least(normal));
        assert!(!parse_price_text("9.999").unwrap().is_at_least(normal));
        assert!(parse_price_text("10").unwrap().is_at_least(normal));
    }

    #[test]
    fn test_display_pads_cents() {
        assert_eq!(Price::from_cents(5).to_string(), "0.05");
        assert_eq!(Price::from_cents(100).to_string(), "1.00");
    }
}
