//! Number rendering shared by the calculator, workbench and converter.

/// Decimal exponents outside `[LOWER_EXP, UPPER_EXP)` switch to exponential notation.
const LOWER_EXP: i32 = -3;
const UPPER_EXP: i32 = 5;

/// Formats `value` to `digits` significant digits.
///
/// Trailing zeros are dropped. Values whose decimal exponent falls below
/// -3 or reaches 5 are written in exponential form (`1.5e+7`, `2e-4`),
/// everything else in plain positional form (`0.3333333333`, `12345`).
pub fn format_precision(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value.abs());
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (scientific.as_str(), 0),
    };
    let mantissa = trim_fraction(mantissa);
    let sign = if value < 0.0 { "-" } else { "" };

    if exponent < LOWER_EXP || exponent >= UPPER_EXP {
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        return format!("{sign}{mantissa}e{exp_sign}{}", exponent.abs());
    }

    let significant: String = mantissa.chars().filter(|c| *c != '.').collect();
    let body = if exponent >= 0 {
        let int_len = exponent as usize + 1;
        if significant.len() <= int_len {
            format!("{significant}{}", "0".repeat(int_len - significant.len()))
        } else {
            format!("{}.{}", &significant[..int_len], &significant[int_len..])
        }
    } else {
        let leading = "0".repeat((-exponent - 1) as usize);
        format!("0.{leading}{significant}")
    };
    format!("{sign}{body}")
}

/// Formats `value` with exactly `decimals` fractional digits.
pub fn format_fixed(value: f64, decimals: usize) -> String {
    // Avoid rendering "-0.0000" for a negative zero.
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{:.*}", decimals, value)
}

fn trim_fraction(mantissa: &str) -> &str {
    if mantissa.contains('.') {
        mantissa.trim_end_matches('0').trim_end_matches('.')
    } else {
        mantissa
    }
}
