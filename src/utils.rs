//! 通用工具函数

/// 按“前导整数”规则解析字符串
///
/// 跳过前导空白，接受可选的正负号，然后读取连续的数字，遇到第一个非数字字符即停止。
/// 没有读到任何数字时返回 `None`；超出 `i64` 范围时饱和到边界值。
///
/// - `"42"` -> `Some(42)`
/// - `"2abc"` -> `Some(2)`
/// - `"1.9"` -> `Some(1)`
/// - `"-3"` -> `Some(-3)`
/// - `"99999999999999999999"` -> `Some(i64::MAX)`
/// - `"abc"` / `""` -> `None`
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let trimmed = raw.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return None;
    }

    // digits 非空且只含数字，解析失败只可能是溢出
    let value = match digits.parse::<i64>() {
        Ok(value) if negative => -value,
        Ok(value) => value,
        Err(_) if negative => i64::MIN,
        Err(_) => i64::MAX,
    };
    Some(value)
}

/// 解析正整数，非正数或无法解析时返回默认值
pub fn positive_or(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(parse_leading_int)
        .filter(|value| *value > 0)
        .and_then(|value| usize::try_from(value).ok())
        .unwrap_or(default)
}
