//! The built-in function catalog. Everything here goes through the typed
//! accessors on `Value`, so coercion failures surface as evaluation
//! errors and NULL arguments short-circuit before a body runs (unless
//! the function opts into handling them).

use std::fmt::Write;
use std::sync::Arc;

use chrono::format::{Item, StrftimeItems};
use chrono::{Datelike, Local, Timelike};
use gx_geom::GeometryLike;
use gx_types::{Interval, Tvl, Value};
use rand::Rng;

use crate::color::Color;
use crate::context::ExpressionContext;
use crate::error::EvalError;
use crate::node::{ExprNode, compile_regex};
use crate::registry::{Arity, Function};
use crate::strutils;

// ── Math ────────────────────────────────────────────────────────────────

fn fcn_sqrt(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?.sqrt()))
}

fn fcn_abs(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?.abs()))
}

fn fcn_cos(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?.cos()))
}

fn fcn_sin(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?.sin()))
}

fn fcn_tan(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?.tan()))
}

fn fcn_asin(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?.asin()))
}

fn fcn_acos(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?.acos()))
}

fn fcn_atan(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?.atan()))
}

fn fcn_atan2(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let y = values[0].to_double()?;
    let x = values[1].to_double()?;
    Ok(Value::Double(y.atan2(x)))
}

fn fcn_exp(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?.exp()))
}

fn non_positive_log(name: &str) -> EvalError {
    EvalError::Function(format!("{name} is only defined for positive values"))
}

fn fcn_ln(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let x = values[0].to_double()?;
    if x <= 0.0 {
        return Err(non_positive_log("ln"));
    }
    Ok(Value::Double(x.ln()))
}

fn fcn_log10(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let x = values[0].to_double()?;
    if x <= 0.0 {
        return Err(non_positive_log("log10"));
    }
    Ok(Value::Double(x.log10()))
}

fn fcn_log(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let base = values[0].to_double()?;
    let x = values[1].to_double()?;
    if base <= 0.0 || x <= 0.0 {
        return Err(non_positive_log("log"));
    }
    Ok(Value::Double(x.log(base)))
}

fn fcn_round(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    match values.len() {
        2 => {
            let number = values[0].to_double()?;
            let scaler = 10_f64.powi(values[1].to_int()? as i32);
            Ok(Value::Double((number * scaler).round() / scaler))
        }
        1 => Ok(Value::Int(values[0].to_int()?)),
        other => Err(EvalError::Function(format!(
            "round takes one or two arguments, got {other}"
        ))),
    }
}

fn fcn_rand(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let min = values[0].to_int()?;
    let max = values[1].to_int()?;
    if max < min {
        return Ok(Value::Null);
    }
    Ok(Value::Int(rand::thread_rng().gen_range(min..=max)))
}

fn fcn_randf(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let min = values[0].to_double()?;
    let max = values[1].to_double()?;
    if max < min {
        return Ok(Value::Null);
    }
    let f: f64 = rand::thread_rng().r#gen();
    Ok(Value::Double(min + f * (max - min)))
}

fn fcn_max(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let mut best = match values.first() {
        Some(first) => first.to_double()?,
        None => return Err(EvalError::Function("max requires at least one argument".into())),
    };
    for value in &values[1..] {
        best = best.max(value.to_double()?);
    }
    Ok(Value::Double(best))
}

fn fcn_min(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let mut best = match values.first() {
        Some(first) => first.to_double()?,
        None => return Err(EvalError::Function("min requires at least one argument".into())),
    };
    for value in &values[1..] {
        best = best.min(value.to_double()?);
    }
    Ok(Value::Double(best))
}

fn fcn_clamp(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let min = values[0].to_double()?;
    let test = values[1].to_double()?;
    let max = values[2].to_double()?;
    Ok(Value::Double(test.clamp(min, max)))
}

fn scale_domain(values: &[Value]) -> Result<(f64, f64, f64, f64, f64), EvalError> {
    let value = values[0].to_double()?;
    let domain_min = values[1].to_double()?;
    let domain_max = values[2].to_double()?;
    let range_min = values[3].to_double()?;
    let range_max = values[4].to_double()?;
    if domain_min >= domain_max {
        return Err(EvalError::Function(
            "domain max must be greater than domain min".into(),
        ));
    }
    Ok((value, domain_min, domain_max, range_min, range_max))
}

fn fcn_scale_linear(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let (value, domain_min, domain_max, range_min, range_max) = scale_domain(values)?;
    if value >= domain_max {
        return Ok(Value::Double(range_max));
    }
    if value <= domain_min {
        return Ok(Value::Double(range_min));
    }
    let slope = (range_max - range_min) / (domain_max - domain_min);
    Ok(Value::Double(slope * (value - domain_min) + range_min))
}

fn fcn_scale_exp(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let (value, domain_min, domain_max, range_min, range_max) = scale_domain(values)?;
    let exponent = values[5].to_double()?;
    if exponent <= 0.0 {
        return Err(EvalError::Function("exponent must be greater than 0".into()));
    }
    if value >= domain_max {
        return Ok(Value::Double(range_max));
    }
    if value <= domain_min {
        return Ok(Value::Double(range_min));
    }
    let scaled = ((range_max - range_min) / (domain_max - domain_min).powf(exponent))
        * (value - domain_min).powf(exponent)
        + range_min;
    Ok(Value::Double(scaled))
}

fn fcn_floor(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?.floor()))
}

fn fcn_ceil(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?.ceil()))
}

fn fcn_pi(_: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(std::f64::consts::PI))
}

// ── Conversions ─────────────────────────────────────────────────────────

fn fcn_to_int(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Int(values[0].to_int()?))
}

fn fcn_to_real(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_double()?))
}

fn fcn_to_string(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::String(values[0].to_text()))
}

fn fcn_to_datetime(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::DateTime(values[0].to_date_time()?))
}

fn fcn_to_date(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Date(values[0].to_date()?))
}

fn fcn_to_time(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Time(values[0].to_time()?))
}

fn fcn_to_interval(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Interval(values[0].to_interval()?))
}

// ── Conditionals ────────────────────────────────────────────────────────

fn fcn_coalesce(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    for value in values {
        if !value.is_null() {
            return Ok(value.clone());
        }
    }
    Ok(Value::Null)
}

fn fcn_if(args: &[ExprNode], context: &ExpressionContext) -> Result<Value, EvalError> {
    let condition = args[0].eval(context)?;
    if condition.to_tvl()? == Tvl::True {
        args[1].eval(context)
    } else {
        args[2].eval(context)
    }
}

fn fcn_regexp_match(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let text = values[0].to_text();
    let pattern = values[1].to_text();
    let re = compile_regex(&pattern)?;
    Ok(Value::Int(i64::from(re.is_match(&text))))
}

// ── Date and Time ───────────────────────────────────────────────────────

fn fcn_now(_: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::DateTime(Local::now().naive_local()))
}

fn fcn_age(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let later = values[0].to_date_time()?;
    let earlier = values[1].to_date_time()?;
    let seconds = (later - earlier).num_seconds();
    Ok(Value::Interval(Interval::from_seconds(seconds as f64)))
}

fn interval_or_date_part(
    value: &Value,
    from_interval: impl Fn(&Interval) -> f64,
    from_date_time: impl Fn(chrono::NaiveDateTime) -> i64,
) -> Result<Value, EvalError> {
    if value.is_interval_safe() {
        let interval = value.to_interval()?;
        return Ok(Value::Double(from_interval(&interval)));
    }
    Ok(Value::Int(from_date_time(value.to_date_time()?)))
}

fn fcn_year(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    interval_or_date_part(&values[0], Interval::years, |dt| i64::from(dt.year()))
}

fn fcn_month(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    interval_or_date_part(&values[0], Interval::months, |dt| i64::from(dt.month()))
}

fn fcn_week(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    interval_or_date_part(&values[0], Interval::weeks, |dt| {
        i64::from(dt.iso_week().week())
    })
}

fn fcn_day(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    interval_or_date_part(&values[0], Interval::days, |dt| i64::from(dt.day()))
}

fn fcn_hour(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    interval_or_date_part(&values[0], Interval::hours, |dt| i64::from(dt.hour()))
}

fn fcn_minute(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    interval_or_date_part(&values[0], Interval::minutes, |dt| i64::from(dt.minute()))
}

fn fcn_second(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    interval_or_date_part(&values[0], Interval::seconds, |dt| i64::from(dt.second()))
}

fn fcn_day_of_week(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let Ok(date) = values[0].to_date() else {
        return Ok(Value::Null);
    };
    // 0 = Sunday … 6 = Saturday, matching common SQL behaviour.
    let day = date.weekday().number_from_monday() % 7;
    Ok(Value::Int(i64::from(day)))
}

// ── String ──────────────────────────────────────────────────────────────

fn fcn_lower(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::String(values[0].to_text().to_lowercase()))
}

fn fcn_upper(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::String(values[0].to_text().to_uppercase()))
}

fn fcn_title(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let text = values[0].to_text();
    let title = text
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                // Single-character words are left untouched.
                Some(first) if word.chars().count() > 1 => {
                    first.to_uppercase().collect::<String>()
                        + &chars.as_str().to_lowercase()
                }
                _ => word.to_owned(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ");
    Ok(Value::String(title))
}

fn fcn_trim(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::String(values[0].to_text().trim().to_owned()))
}

fn find_delimiter(chars: &[char], delimiter: &[char], from: usize) -> Option<usize> {
    if delimiter.is_empty() || delimiter.len() > chars.len() || from > chars.len() - delimiter.len()
    {
        return None;
    }
    (from..=chars.len() - delimiter.len()).find(|&i| chars[i..i + delimiter.len()] == *delimiter)
}

fn rfind_delimiter(chars: &[char], delimiter: &[char], up_to: usize) -> Option<usize> {
    if delimiter.is_empty() || delimiter.len() > chars.len() {
        return None;
    }
    let last = up_to.min(chars.len() - delimiter.len());
    (0..=last)
        .rev()
        .find(|&i| chars[i..i + delimiter.len()] == *delimiter)
}

fn wrap_line(line: &str, wrap: i64, delimiter: &[char]) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::new();
    let mut current = 0_usize;
    let mut last_hit: Option<usize> = None;
    let step = wrap.unsigned_abs() as usize;

    while current < chars.len() {
        let hit = if wrap > 0 {
            // Prefer breaking before the width limit; fall forward to the
            // next delimiter when a line has no earlier break point.
            let mut hit = rfind_delimiter(&chars, delimiter, current + step);
            if hit == last_hit || hit.is_none() || hit < Some(current) {
                hit = find_delimiter(&chars, delimiter, current + step);
            }
            last_hit = hit;
            hit
        } else {
            find_delimiter(&chars, delimiter, current + step)
        };
        match hit {
            Some(position) if position >= current => {
                out.extend(&chars[current..position]);
                out.push('\n');
                current = position + delimiter.len();
            }
            _ => {
                out.extend(&chars[current..]);
                break;
            }
        }
    }
    out
}

fn fcn_wordwrap(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    if values.len() != 2 && values.len() != 3 {
        return Err(EvalError::Function(format!(
            "wordwrap takes two or three arguments, got {}",
            values.len()
        )));
    }
    let text = values[0].to_text();
    let wrap = values[1].to_int()?;
    if text.is_empty() || wrap == 0 {
        return Ok(Value::Null);
    }
    let delimiter_text = if values.len() == 3 {
        let custom = values[2].to_text();
        if custom.is_empty() { " ".to_owned() } else { custom }
    } else {
        " ".to_owned()
    };
    let delimiter: Vec<char> = delimiter_text.chars().collect();

    let wrapped = text
        .split('\n')
        .map(|line| wrap_line(line, wrap, &delimiter))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Value::String(wrapped))
}

fn fcn_length(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    // Two variants: line length for geometries, character count for text.
    if let Value::Geometry(geometry) = &values[0] {
        return Ok(Value::Double(geometry.length()));
    }
    Ok(Value::Int(values[0].to_text().chars().count() as i64))
}

fn fcn_replace(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let text = values[0].to_text();
    let before = values[1].to_text();
    let after = values[2].to_text();
    Ok(Value::String(text.replace(&before, &after)))
}

fn fcn_regexp_replace(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let text = values[0].to_text();
    let pattern = values[1].to_text();
    let after = values[2].to_text();
    let re = compile_regex(&pattern)?;
    Ok(Value::String(re.replace_all(&text, after.as_str()).into_owned()))
}

fn fcn_regexp_substr(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let text = values[0].to_text();
    let pattern = values[1].to_text();
    let re = compile_regex(&pattern)?;
    let captured = re
        .captures(&text)
        .and_then(|captures| captures.get(1))
        .map(|group| group.as_str().to_owned())
        .unwrap_or_default();
    Ok(Value::String(captured))
}

fn fcn_substr(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let text = values[0].to_text();
    let from = values[1].to_int()?.max(1) as usize;
    let length = values[2].to_int()?;
    let tail = text.chars().skip(from - 1);
    let result: String = if length < 0 {
        tail.collect()
    } else {
        tail.take(length as usize).collect()
    };
    Ok(Value::String(result))
}

fn fcn_concat(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let mut out = String::new();
    for value in values {
        out.push_str(&value.to_text());
    }
    Ok(Value::String(out))
}

fn fcn_strpos(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let text = values[0].to_text();
    let pattern = values[1].to_text();
    let re = compile_regex(&pattern)?;
    let position = match re.find(&text) {
        Some(found) => text[..found.start()].chars().count() as i64 + 1,
        None => 0,
    };
    Ok(Value::Int(position))
}

fn fcn_left(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let text = values[0].to_text();
    let count = values[1].to_int()?.max(0) as usize;
    Ok(Value::String(text.chars().take(count).collect()))
}

fn fcn_right(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let text = values[0].to_text();
    let count = values[1].to_int()?.max(0) as usize;
    let total = text.chars().count();
    Ok(Value::String(
        text.chars().skip(total.saturating_sub(count)).collect(),
    ))
}

fn pad_fill_char(fill: &str) -> Result<char, EvalError> {
    fill.chars()
        .next()
        .ok_or_else(|| EvalError::Function("pad fill must not be empty".into()))
}

fn fcn_rpad(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let text = values[0].to_text();
    let width = values[1].to_int()?.max(0) as usize;
    let fill = pad_fill_char(&values[2].to_text())?;
    let count = text.chars().count();
    let padded: String = if count >= width {
        text.chars().take(width).collect()
    } else {
        text.chars()
            .chain(std::iter::repeat_n(fill, width - count))
            .collect()
    };
    Ok(Value::String(padded))
}

fn fcn_lpad(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let text = values[0].to_text();
    let width = values[1].to_int()?.max(0) as usize;
    let fill = pad_fill_char(&values[2].to_text())?;
    let count = text.chars().count();
    let padded: String = if count >= width {
        text.chars().take(width).collect()
    } else {
        std::iter::repeat_n(fill, width - count)
            .chain(text.chars())
            .collect()
    };
    Ok(Value::String(padded))
}

fn fcn_format(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    if values.is_empty() {
        return Err(EvalError::Function("format requires a template argument".into()));
    }
    let mut text = values[0].to_text();
    for (position, value) in values[1..].iter().enumerate() {
        text = text.replace(&format!("%{}", position + 1), &value.to_text());
    }
    Ok(Value::String(text))
}

fn fcn_format_number(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let number = values[0].to_double()?;
    let places = values[1].to_int()?;
    if places < 0 {
        return Err(EvalError::Function("number of places must be positive".into()));
    }
    let formatted = format!("{number:.prec$}", prec = places as usize);
    let (integral, fraction) = match formatted.split_once('.') {
        Some((integral, fraction)) => (integral.to_owned(), Some(fraction.to_owned())),
        None => (formatted, None),
    };
    let (sign, digits) = match integral.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", integral.as_str()),
    };
    let mut grouped = String::new();
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let mut out = format!("{sign}{grouped}");
    if let Some(fraction) = fraction {
        out.push('.');
        out.push_str(&fraction);
    }
    Ok(Value::String(out))
}

fn fcn_format_date(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let date_time = values[0].to_date_time()?;
    let pattern = values[1].to_text();
    let items: Vec<Item<'_>> = StrftimeItems::new(&pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(EvalError::Function(format!(
            "invalid date format '{pattern}'"
        )));
    }
    let mut rendered = String::new();
    match write!(rendered, "{}", date_time.format_with_items(items.into_iter())) {
        Ok(()) => Ok(Value::String(rendered)),
        Err(_) => Err(EvalError::Function(format!(
            "invalid date format '{pattern}'"
        ))),
    }
}

// ── Fuzzy Matching ──────────────────────────────────────────────────────

fn fcn_levenshtein(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let left = values[0].to_text();
    let right = values[1].to_text();
    Ok(Value::Int(strutils::levenshtein_distance(&left, &right) as i64))
}

fn fcn_longest_common_substring(
    values: &[Value],
    _: &ExpressionContext,
) -> Result<Value, EvalError> {
    let left = values[0].to_text();
    let right = values[1].to_text();
    Ok(Value::String(strutils::longest_common_substring(
        &left, &right,
    )))
}

fn fcn_hamming_distance(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let left = values[0].to_text();
    let right = values[1].to_text();
    match strutils::hamming_distance(&left, &right) {
        Some(distance) => Ok(Value::Int(distance as i64)),
        None => Ok(Value::Null),
    }
}

fn fcn_soundex(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::String(strutils::soundex(&values[0].to_text())))
}

// ── Color ───────────────────────────────────────────────────────────────

fn color_component(values: &[Value], index: usize, max: i64) -> Result<i64, EvalError> {
    let component = values[index].to_int()?;
    if component < 0 || component > max {
        let rendered = values
            .iter()
            .map(Value::to_text)
            .collect::<Vec<_>>()
            .join(":");
        return Err(EvalError::NotAColor(rendered));
    }
    Ok(component)
}

fn fcn_color_rgb(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let red = color_component(values, 0, 255)?;
    let green = color_component(values, 1, 255)?;
    let blue = color_component(values, 2, 255)?;
    Ok(Value::String(
        Color::new(red as u8, green as u8, blue as u8, 255).encode_rgb(),
    ))
}

fn fcn_color_rgba(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let red = color_component(values, 0, 255)?;
    let green = color_component(values, 1, 255)?;
    let blue = color_component(values, 2, 255)?;
    let alpha = color_component(values, 3, 255)?;
    Ok(Value::String(
        Color::new(red as u8, green as u8, blue as u8, alpha as u8).encode_rgba(),
    ))
}

fn hsl_components(values: &[Value]) -> Result<(f64, f64, f64), EvalError> {
    let hue = color_component(values, 0, 360)?;
    let saturation = color_component(values, 1, 100)?;
    let lightness = color_component(values, 2, 100)?;
    Ok((
        hue as f64,
        saturation as f64 / 100.0,
        lightness as f64 / 100.0,
    ))
}

fn fcn_color_hsl(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let (hue, saturation, lightness) = hsl_components(values)?;
    Ok(Value::String(
        Color::from_hsl(hue, saturation, lightness, 255).encode_rgb(),
    ))
}

fn fcn_color_hsla(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let (hue, saturation, lightness) = hsl_components(values)?;
    let alpha = color_component(values, 3, 255)?;
    Ok(Value::String(
        Color::from_hsl(hue, saturation, lightness, alpha as u8).encode_rgba(),
    ))
}

fn fcn_color_hsv(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let (hue, saturation, value) = hsl_components(values)?;
    Ok(Value::String(
        Color::from_hsv(hue, saturation, value, 255).encode_rgb(),
    ))
}

fn fcn_color_hsva(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let (hue, saturation, value) = hsl_components(values)?;
    let alpha = color_component(values, 3, 255)?;
    Ok(Value::String(
        Color::from_hsv(hue, saturation, value, alpha as u8).encode_rgba(),
    ))
}

fn cmyk_components(values: &[Value]) -> Result<(f64, f64, f64, f64), EvalError> {
    let cyan = color_component(values, 0, 100)?;
    let magenta = color_component(values, 1, 100)?;
    let yellow = color_component(values, 2, 100)?;
    let black = color_component(values, 3, 100)?;
    Ok((
        cyan as f64 / 100.0,
        magenta as f64 / 100.0,
        yellow as f64 / 100.0,
        black as f64 / 100.0,
    ))
}

fn fcn_color_cmyk(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let (cyan, magenta, yellow, black) = cmyk_components(values)?;
    Ok(Value::String(
        Color::from_cmyk(cyan, magenta, yellow, black, 255).encode_rgb(),
    ))
}

fn fcn_color_cmyka(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let (cyan, magenta, yellow, black) = cmyk_components(values)?;
    let alpha = color_component(values, 4, 255)?;
    Ok(Value::String(
        Color::from_cmyk(cyan, magenta, yellow, black, alpha as u8).encode_rgba(),
    ))
}

fn parse_color_argument(value: &Value) -> Result<Color, EvalError> {
    let text = value.to_text();
    Color::parse(&text).ok_or(EvalError::NotAColor(text))
}

fn fcn_color_part(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let color = parse_color_argument(&values[0])?;
    let part = values[1].to_text();
    let result = match part.to_lowercase().as_str() {
        "red" => Value::Int(i64::from(color.red)),
        "green" => Value::Int(i64::from(color.green)),
        "blue" => Value::Int(i64::from(color.blue)),
        "alpha" => Value::Int(i64::from(color.alpha)),
        "hue" => Value::Double(color.to_hsv().0),
        "saturation" => Value::Double(color.to_hsv().1 * 100.0),
        "value" => Value::Double(color.to_hsv().2 * 100.0),
        "hsl_hue" => Value::Double(color.to_hsl().0),
        "hsl_saturation" => Value::Double(color.to_hsl().1 * 100.0),
        "lightness" => Value::Double(color.to_hsl().2 * 100.0),
        _ => return Err(EvalError::UnknownColorComponent(part)),
    };
    Ok(result)
}

fn fcn_set_color_part(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let mut color = parse_color_argument(&values[0])?;
    let part = values[1].to_text();
    let new_value = values[2].to_double()?;
    let byte = new_value.round().clamp(0.0, 255.0) as u8;
    match part.to_lowercase().as_str() {
        "red" => color.red = byte,
        "green" => color.green = byte,
        "blue" => color.blue = byte,
        "alpha" => color.alpha = byte,
        "hue" => {
            let (_, saturation, value) = color.to_hsv();
            color = Color::from_hsv(new_value, saturation, value, color.alpha);
        }
        "saturation" => {
            let (hue, _, value) = color.to_hsv();
            color = Color::from_hsv(hue, new_value / 100.0, value, color.alpha);
        }
        "value" => {
            let (hue, saturation, _) = color.to_hsv();
            color = Color::from_hsv(hue, saturation, new_value / 100.0, color.alpha);
        }
        "hsl_hue" => {
            let (_, saturation, lightness) = color.to_hsl();
            color = Color::from_hsl(new_value, saturation, lightness, color.alpha);
        }
        "hsl_saturation" => {
            let (hue, _, lightness) = color.to_hsl();
            color = Color::from_hsl(hue, new_value / 100.0, lightness, color.alpha);
        }
        "lightness" => {
            let (hue, saturation, _) = color.to_hsl();
            color = Color::from_hsl(hue, saturation, new_value / 100.0, color.alpha);
        }
        _ => return Err(EvalError::UnknownColorComponent(part)),
    }
    Ok(Value::String(color.encode_rgba()))
}

// ── Geometry ────────────────────────────────────────────────────────────

fn context_geometry(context: &ExpressionContext) -> Option<Arc<dyn GeometryLike>> {
    context.feature().and_then(|feature| feature.geometry())
}

fn fcn_geometry_variable(_: &[Value], context: &ExpressionContext) -> Result<Value, EvalError> {
    match context_geometry(context) {
        Some(geometry) => Ok(Value::Geometry(geometry)),
        None => Ok(Value::Null),
    }
}

fn fcn_get_geometry(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    match values[0].to_feature()?.geometry() {
        Some(geometry) => Ok(Value::Geometry(geometry)),
        None => Ok(Value::Null),
    }
}

fn fcn_geom_area(_: &[Value], context: &ExpressionContext) -> Result<Value, EvalError> {
    match context_geometry(context) {
        Some(geometry) => Ok(Value::Double(geometry.area())),
        None => Ok(Value::Null),
    }
}

fn fcn_area(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_geometry()?.area()))
}

fn fcn_geom_length(_: &[Value], context: &ExpressionContext) -> Result<Value, EvalError> {
    match context_geometry(context) {
        Some(geometry) => Ok(Value::Double(geometry.length())),
        None => Ok(Value::Null),
    }
}

fn fcn_geom_perimeter(_: &[Value], context: &ExpressionContext) -> Result<Value, EvalError> {
    match context_geometry(context) {
        Some(geometry) => Ok(Value::Double(geometry.perimeter())),
        None => Ok(Value::Null),
    }
}

fn fcn_perimeter(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_geometry()?.perimeter()))
}

fn fcn_geom_x(_: &[Value], context: &ExpressionContext) -> Result<Value, EvalError> {
    match context_geometry(context).and_then(|geometry| geometry.as_point()) {
        Some((x, _)) => Ok(Value::Double(x)),
        None => Ok(Value::Null),
    }
}

fn fcn_geom_y(_: &[Value], context: &ExpressionContext) -> Result<Value, EvalError> {
    match context_geometry(context).and_then(|geometry| geometry.as_point()) {
        Some((_, y)) => Ok(Value::Double(y)),
        None => Ok(Value::Null),
    }
}

fn point_of(geometry: &Arc<dyn GeometryLike>) -> Option<(f64, f64)> {
    geometry
        .as_point()
        .or_else(|| geometry.centroid().and_then(|centroid| centroid.as_point()))
}

fn fcn_x(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    match point_of(&values[0].to_geometry()?) {
        Some((x, _)) => Ok(Value::Double(x)),
        None => Ok(Value::Null),
    }
}

fn fcn_y(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    match point_of(&values[0].to_geometry()?) {
        Some((_, y)) => Ok(Value::Double(y)),
        None => Ok(Value::Null),
    }
}

fn fcn_x_min(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_geometry()?.bounding_box().x_min))
}

fn fcn_x_max(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_geometry()?.bounding_box().x_max))
}

fn fcn_y_min(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_geometry()?.bounding_box().y_min))
}

fn fcn_y_max(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_geometry()?.bounding_box().y_max))
}

fn fcn_bounds_width(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(values[0].to_geometry()?.bounding_box().width()))
}

fn fcn_bounds_height(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    Ok(Value::Double(
        values[0].to_geometry()?.bounding_box().height(),
    ))
}

fn fcn_intersects_bbox(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let left = values[0].to_geometry()?;
    let right = values[1].to_geometry()?;
    Ok(Value::Bool(
        left.bounding_box().intersects(&right.bounding_box()),
    ))
}

fn binary_predicate(
    values: &[Value],
    predicate: impl Fn(&dyn GeometryLike, &dyn GeometryLike) -> bool,
) -> Result<Value, EvalError> {
    let left = values[0].to_geometry()?;
    let right = values[1].to_geometry()?;
    Ok(Value::Bool(predicate(left.as_ref(), right.as_ref())))
}

fn fcn_disjoint(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    binary_predicate(values, |a, b| a.disjoint(b))
}

fn fcn_intersects(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    binary_predicate(values, |a, b| a.intersects(b))
}

fn fcn_touches(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    binary_predicate(values, |a, b| a.touches(b))
}

fn fcn_crosses(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    binary_predicate(values, |a, b| a.crosses(b))
}

fn fcn_contains(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    binary_predicate(values, |a, b| a.contains(b))
}

fn fcn_overlaps(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    binary_predicate(values, |a, b| a.overlaps(b))
}

fn fcn_within(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    binary_predicate(values, |a, b| a.within(b))
}

fn fcn_relate(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    if values.len() != 2 && values.len() != 3 {
        return Err(EvalError::Function(format!(
            "relate takes two or three arguments, got {}",
            values.len()
        )));
    }
    let left = values[0].to_geometry()?;
    let right = values[1].to_geometry()?;
    if values.len() == 2 {
        return Ok(match left.relate(right.as_ref()) {
            Some(matrix) => Value::String(matrix),
            None => Value::Null,
        });
    }
    let pattern = values[2].to_text();
    Ok(Value::Bool(left.relate_pattern(right.as_ref(), &pattern)))
}

fn fcn_distance(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let left = values[0].to_geometry()?;
    let right = values[1].to_geometry()?;
    Ok(Value::Double(left.distance(right.as_ref())))
}

fn fcn_buffer(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    if values.len() != 2 && values.len() != 3 {
        return Err(EvalError::Function(format!(
            "buffer takes two or three arguments, got {}",
            values.len()
        )));
    }
    let geometry = values[0].to_geometry()?;
    let distance = values[1].to_double()?;
    let segments = if values.len() == 3 {
        values[2].to_int()?
    } else {
        8
    };
    match geometry.buffer(distance, segments) {
        Some(buffered) => Ok(Value::Geometry(buffered)),
        None => Ok(Value::Null),
    }
}

fn fcn_centroid(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    match values[0].to_geometry()?.centroid() {
        Some(centroid) => Ok(Value::Geometry(centroid)),
        None => Ok(Value::Null),
    }
}

fn fcn_convex_hull(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    match values[0].to_geometry()?.convex_hull() {
        Some(hull) => Ok(Value::Geometry(hull)),
        None => Ok(Value::Null),
    }
}

fn binary_set_op(
    values: &[Value],
    op: impl Fn(&dyn GeometryLike, &dyn GeometryLike) -> Option<Arc<dyn GeometryLike>>,
) -> Result<Value, EvalError> {
    let left = values[0].to_geometry()?;
    let right = values[1].to_geometry()?;
    match op(left.as_ref(), right.as_ref()) {
        Some(result) => Ok(Value::Geometry(result)),
        None => Ok(Value::Null),
    }
}

fn fcn_difference(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    binary_set_op(values, |a, b| a.difference(b))
}

fn fcn_intersection(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    binary_set_op(values, |a, b| a.intersection(b))
}

fn fcn_sym_difference(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    binary_set_op(values, |a, b| a.sym_difference(b))
}

fn fcn_combine(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    binary_set_op(values, |a, b| a.combine(b))
}

// ── Record / General ────────────────────────────────────────────────────

fn fcn_feature_id(_: &[Value], context: &ExpressionContext) -> Result<Value, EvalError> {
    match context.feature() {
        Some(feature) => Ok(Value::Int(feature.id())),
        None => Ok(Value::Null),
    }
}

fn fcn_current_feature(_: &[Value], context: &ExpressionContext) -> Result<Value, EvalError> {
    match context.feature() {
        Some(feature) => Ok(Value::Feature(Arc::clone(feature))),
        None => Ok(Value::Null),
    }
}

fn fcn_attribute(values: &[Value], _: &ExpressionContext) -> Result<Value, EvalError> {
    let feature = values[0].to_feature()?;
    let name = values[1].to_text();
    Ok(feature.attribute_by_name(&name).unwrap_or(Value::Null))
}

fn fcn_var(values: &[Value], context: &ExpressionContext) -> Result<Value, EvalError> {
    let name = values[0].to_text();
    Ok(context.variable(&name).cloned().unwrap_or(Value::Null))
}

/// Every built-in, in registration order. Called once when the global
/// registry warms up.
pub(crate) fn all() -> Vec<Arc<Function>> {
    let functions = vec![
        Function::eager("sqrt", Arity::Exact(1), "Math", fcn_sqrt),
        Function::eager("abs", Arity::Exact(1), "Math", fcn_abs),
        Function::eager("cos", Arity::Exact(1), "Math", fcn_cos),
        Function::eager("sin", Arity::Exact(1), "Math", fcn_sin),
        Function::eager("tan", Arity::Exact(1), "Math", fcn_tan),
        Function::eager("asin", Arity::Exact(1), "Math", fcn_asin),
        Function::eager("acos", Arity::Exact(1), "Math", fcn_acos),
        Function::eager("atan", Arity::Exact(1), "Math", fcn_atan),
        Function::eager("atan2", Arity::Exact(2), "Math", fcn_atan2),
        Function::eager("exp", Arity::Exact(1), "Math", fcn_exp),
        Function::eager("ln", Arity::Exact(1), "Math", fcn_ln),
        Function::eager("log10", Arity::Exact(1), "Math", fcn_log10),
        Function::eager("log", Arity::Exact(2), "Math", fcn_log),
        Function::eager("round", Arity::Variadic, "Math", fcn_round),
        Function::eager("rand", Arity::Exact(2), "Math", fcn_rand),
        Function::eager("randf", Arity::Exact(2), "Math", fcn_randf),
        Function::eager("max", Arity::Variadic, "Math", fcn_max),
        Function::eager("min", Arity::Variadic, "Math", fcn_min),
        Function::eager("clamp", Arity::Exact(3), "Math", fcn_clamp),
        Function::eager("scale_linear", Arity::Exact(5), "Math", fcn_scale_linear),
        Function::eager("scale_exp", Arity::Exact(6), "Math", fcn_scale_exp),
        Function::eager("floor", Arity::Exact(1), "Math", fcn_floor),
        Function::eager("ceil", Arity::Exact(1), "Math", fcn_ceil),
        Function::eager("pi", Arity::Exact(0), "Math", fcn_pi).with_aliases(&["$pi"]),
        Function::eager("to_int", Arity::Exact(1), "Conversions", fcn_to_int)
            .with_aliases(&["toint"]),
        Function::eager("to_real", Arity::Exact(1), "Conversions", fcn_to_real)
            .with_aliases(&["toreal"]),
        Function::eager("to_string", Arity::Exact(1), "Conversions", fcn_to_string)
            .with_aliases(&["tostring"]),
        Function::eager("to_datetime", Arity::Exact(1), "Conversions", fcn_to_datetime)
            .with_aliases(&["todatetime"]),
        Function::eager("to_date", Arity::Exact(1), "Conversions", fcn_to_date)
            .with_aliases(&["todate"]),
        Function::eager("to_time", Arity::Exact(1), "Conversions", fcn_to_time)
            .with_aliases(&["totime"]),
        Function::eager("to_interval", Arity::Exact(1), "Conversions", fcn_to_interval)
            .with_aliases(&["tointerval"]),
        Function::eager("coalesce", Arity::Variadic, "Conditionals", fcn_coalesce)
            .with_handles_null(),
        Function::lazy("if", Arity::Exact(3), "Conditionals", fcn_if),
        Function::eager("regexp_match", Arity::Exact(2), "Conditionals", fcn_regexp_match),
        Function::eager("now", Arity::Exact(0), "Date and Time", fcn_now)
            .with_aliases(&["$now"]),
        Function::eager("age", Arity::Exact(2), "Date and Time", fcn_age),
        Function::eager("year", Arity::Exact(1), "Date and Time", fcn_year),
        Function::eager("month", Arity::Exact(1), "Date and Time", fcn_month),
        Function::eager("week", Arity::Exact(1), "Date and Time", fcn_week),
        Function::eager("day", Arity::Exact(1), "Date and Time", fcn_day),
        Function::eager("hour", Arity::Exact(1), "Date and Time", fcn_hour),
        Function::eager("minute", Arity::Exact(1), "Date and Time", fcn_minute),
        Function::eager("second", Arity::Exact(1), "Date and Time", fcn_second),
        Function::eager("day_of_week", Arity::Exact(1), "Date and Time", fcn_day_of_week),
        Function::eager("lower", Arity::Exact(1), "String", fcn_lower),
        Function::eager("upper", Arity::Exact(1), "String", fcn_upper),
        Function::eager("title", Arity::Exact(1), "String", fcn_title),
        Function::eager("trim", Arity::Exact(1), "String", fcn_trim),
        Function::eager(
            "levenshtein",
            Arity::Exact(2),
            "Fuzzy Matching",
            fcn_levenshtein,
        ),
        Function::eager(
            "longest_common_substring",
            Arity::Exact(2),
            "Fuzzy Matching",
            fcn_longest_common_substring,
        ),
        Function::eager(
            "hamming_distance",
            Arity::Exact(2),
            "Fuzzy Matching",
            fcn_hamming_distance,
        ),
        Function::eager("soundex", Arity::Exact(1), "Fuzzy Matching", fcn_soundex),
        Function::eager("wordwrap", Arity::Variadic, "String", fcn_wordwrap),
        Function::eager("length", Arity::Exact(1), "String", fcn_length),
        Function::eager("replace", Arity::Exact(3), "String", fcn_replace),
        Function::eager("regexp_replace", Arity::Exact(3), "String", fcn_regexp_replace),
        Function::eager("regexp_substr", Arity::Exact(2), "String", fcn_regexp_substr),
        Function::eager("substr", Arity::Exact(3), "String", fcn_substr),
        Function::eager("concat", Arity::Variadic, "String", fcn_concat).with_handles_null(),
        Function::eager("strpos", Arity::Exact(2), "String", fcn_strpos),
        Function::eager("left", Arity::Exact(2), "String", fcn_left),
        Function::eager("right", Arity::Exact(2), "String", fcn_right),
        Function::eager("rpad", Arity::Exact(3), "String", fcn_rpad),
        Function::eager("lpad", Arity::Exact(3), "String", fcn_lpad),
        Function::eager("format", Arity::Variadic, "String", fcn_format),
        Function::eager("format_number", Arity::Exact(2), "String", fcn_format_number),
        Function::eager("format_date", Arity::Exact(2), "String", fcn_format_date),
        Function::eager("color_rgb", Arity::Exact(3), "Color", fcn_color_rgb),
        Function::eager("color_rgba", Arity::Exact(4), "Color", fcn_color_rgba),
        Function::eager("color_hsl", Arity::Exact(3), "Color", fcn_color_hsl),
        Function::eager("color_hsla", Arity::Exact(4), "Color", fcn_color_hsla),
        Function::eager("color_hsv", Arity::Exact(3), "Color", fcn_color_hsv),
        Function::eager("color_hsva", Arity::Exact(4), "Color", fcn_color_hsva),
        Function::eager("color_cmyk", Arity::Exact(4), "Color", fcn_color_cmyk),
        Function::eager("color_cmyka", Arity::Exact(5), "Color", fcn_color_cmyka),
        Function::eager("color_part", Arity::Exact(2), "Color", fcn_color_part),
        Function::eager("set_color_part", Arity::Exact(3), "Color", fcn_set_color_part),
        Function::eager("$geometry", Arity::Exact(0), "Geometry", fcn_geometry_variable)
            .with_uses_geometry(),
        Function::eager("$area", Arity::Exact(0), "Geometry", fcn_geom_area)
            .with_uses_geometry(),
        Function::eager("area", Arity::Exact(1), "Geometry", fcn_area),
        Function::eager("$length", Arity::Exact(0), "Geometry", fcn_geom_length)
            .with_uses_geometry(),
        Function::eager("$perimeter", Arity::Exact(0), "Geometry", fcn_geom_perimeter)
            .with_uses_geometry(),
        Function::eager("perimeter", Arity::Exact(1), "Geometry", fcn_perimeter),
        Function::eager("$x", Arity::Exact(0), "Geometry", fcn_geom_x).with_uses_geometry(),
        Function::eager("$y", Arity::Exact(0), "Geometry", fcn_geom_y).with_uses_geometry(),
        Function::eager("x", Arity::Exact(1), "Geometry", fcn_x),
        Function::eager("y", Arity::Exact(1), "Geometry", fcn_y),
        Function::eager("x_min", Arity::Exact(1), "Geometry", fcn_x_min)
            .with_aliases(&["xmin"]),
        Function::eager("x_max", Arity::Exact(1), "Geometry", fcn_x_max)
            .with_aliases(&["xmax"]),
        Function::eager("y_min", Arity::Exact(1), "Geometry", fcn_y_min)
            .with_aliases(&["ymin"]),
        Function::eager("y_max", Arity::Exact(1), "Geometry", fcn_y_max)
            .with_aliases(&["ymax"]),
        Function::eager("bounds_width", Arity::Exact(1), "Geometry", fcn_bounds_width),
        Function::eager("bounds_height", Arity::Exact(1), "Geometry", fcn_bounds_height),
        Function::eager(
            "intersects_bbox",
            Arity::Exact(2),
            "Geometry",
            fcn_intersects_bbox,
        )
        .with_aliases(&["bbox"]),
        Function::eager("disjoint", Arity::Exact(2), "Geometry", fcn_disjoint),
        Function::eager("intersects", Arity::Exact(2), "Geometry", fcn_intersects),
        Function::eager("touches", Arity::Exact(2), "Geometry", fcn_touches),
        Function::eager("crosses", Arity::Exact(2), "Geometry", fcn_crosses),
        Function::eager("contains", Arity::Exact(2), "Geometry", fcn_contains),
        Function::eager("overlaps", Arity::Exact(2), "Geometry", fcn_overlaps),
        Function::eager("within", Arity::Exact(2), "Geometry", fcn_within),
        Function::eager("relate", Arity::Variadic, "Geometry", fcn_relate),
        Function::eager("distance", Arity::Exact(2), "Geometry", fcn_distance),
        Function::eager("buffer", Arity::Variadic, "Geometry", fcn_buffer),
        Function::eager("centroid", Arity::Exact(1), "Geometry", fcn_centroid),
        Function::eager("convex_hull", Arity::Exact(1), "Geometry", fcn_convex_hull)
            .with_aliases(&["convexHull"]),
        Function::eager("difference", Arity::Exact(2), "Geometry", fcn_difference),
        Function::eager("intersection", Arity::Exact(2), "Geometry", fcn_intersection),
        Function::eager(
            "sym_difference",
            Arity::Exact(2),
            "Geometry",
            fcn_sym_difference,
        )
        .with_aliases(&["symDifference"]),
        Function::eager("combine", Arity::Exact(2), "Geometry", fcn_combine),
        Function::eager("union", Arity::Exact(2), "Geometry", fcn_combine),
        Function::eager("geometry", Arity::Exact(1), "Geometry", fcn_get_geometry)
            .with_uses_geometry(),
        Function::eager("$id", Arity::Exact(0), "Record", fcn_feature_id),
        Function::eager(
            "$currentfeature",
            Arity::Exact(0),
            "Record",
            fcn_current_feature,
        ),
        Function::eager("attribute", Arity::Exact(2), "Record", fcn_attribute)
            .with_referenced_columns(&[crate::ALL_ATTRIBUTES]),
        Function::eager("var", Arity::Exact(1), "General", fcn_var),
    ];
    functions.into_iter().map(Arc::new).collect()
}

#[cfg(test)]
mod tests {
    use gx_types::Value;

    use crate::context::ExpressionContext;
    use crate::expression::Expression;

    fn eval(source: &str) -> Value {
        let mut expression = Expression::new(source);
        assert!(
            !expression.has_parser_error(),
            "parse failed: {:?}",
            expression.parser_error_string()
        );
        let result = expression.evaluate(&ExpressionContext::new());
        assert!(
            !expression.has_eval_error(),
            "eval failed: {:?}",
            expression.eval_error_string()
        );
        result
    }

    fn eval_error(source: &str) -> String {
        let mut expression = Expression::new(source);
        assert!(
            !expression.has_parser_error(),
            "parse failed: {:?}",
            expression.parser_error_string()
        );
        let result = expression.evaluate(&ExpressionContext::new());
        assert_eq!(result, Value::Null);
        expression
            .eval_error_string()
            .expect("eval error expected")
            .to_owned()
    }

    #[test]
    fn round_follows_half_away_from_zero() {
        assert_eq!(eval("round(1234.557, 2)"), Value::Double(1234.56));
        assert_eq!(eval("round(1234.554, 2)"), Value::Double(1234.55));
        assert_eq!(eval("round(2.7)"), Value::Int(3));
        assert_eq!(eval("round(-2.5)"), Value::Int(-3));
    }

    #[test]
    fn logarithms_reject_non_positive_domains() {
        assert_eq!(eval("ln(1)"), Value::Double(0.0));
        assert!(eval_error("ln(0)").contains("positive"));
        assert!(eval_error("log(10, -1)").contains("positive"));
    }

    #[test]
    fn scale_linear_clamps_and_interpolates() {
        assert_eq!(eval("scale_linear(5, 0, 10, 0, 100)"), Value::Double(50.0));
        assert_eq!(eval("scale_linear(-1, 0, 10, 0, 100)"), Value::Double(0.0));
        assert_eq!(eval("scale_linear(11, 0, 10, 0, 100)"), Value::Double(100.0));
        assert!(eval_error("scale_linear(5, 10, 0, 0, 100)").contains("domain"));
    }

    #[test]
    fn null_propagates_into_eager_functions() {
        assert_eq!(eval("upper(NULL)"), Value::Null);
        // coalesce and concat opt out.
        assert_eq!(eval("coalesce(NULL, 4)"), Value::Int(4));
        assert_eq!(eval("coalesce(NULL, NULL)"), Value::Null);
        assert_eq!(eval("concat('a', NULL, 'b')"), Value::from("ab"));
    }

    #[test]
    fn if_evaluates_only_the_taken_branch() {
        // The untaken branch holds a coercion error, so taking it would
        // poison the evaluation.
        assert_eq!(eval("if(1 = 1, 'yes', to_real('broken'))"), Value::from("yes"));
        assert_eq!(eval("if(1 = 2, to_real('broken'), 'no')"), Value::from("no"));
        // Unknown takes the else branch.
        assert_eq!(eval("if(NULL, 1, 2)"), Value::Int(2));
    }

    #[test]
    fn conversions_round_trip_typed_values() {
        assert_eq!(eval("to_int('12')"), Value::Int(12));
        assert_eq!(eval("to_real('2.5')"), Value::Double(2.5));
        assert_eq!(eval("to_string(7)"), Value::from("7"));
        assert_eq!(eval("toint('12')"), Value::Int(12), "alias resolves");
        assert_eq!(
            eval("day(to_interval('2 days'))"),
            Value::Double(2.0)
        );
    }

    #[test]
    fn date_parts_split_both_datetimes_and_intervals() {
        assert_eq!(eval("year(to_date('2012-06-28'))"), Value::Int(2012));
        assert_eq!(eval("month(to_date('2012-06-28'))"), Value::Int(6));
        assert_eq!(eval("day(to_date('2012-06-28'))"), Value::Int(28));
        assert_eq!(eval("hour(to_datetime('2012-06-28 11:30:19'))"), Value::Int(11));
        assert_eq!(eval("minute(to_datetime('2012-06-28 11:30:19'))"), Value::Int(30));
        assert_eq!(eval("second(to_datetime('2012-06-28 11:30:19'))"), Value::Int(19));
        assert_eq!(eval("year('2 years')"), Value::Double(2.0));
        // 2012-06-28 was a Thursday.
        assert_eq!(eval("day_of_week(to_date('2012-06-28'))"), Value::Int(4));
    }

    #[test]
    fn datetime_interval_arithmetic_goes_through_operators() {
        assert_eq!(
            eval("to_datetime('2012-06-28 00:00:00') + to_interval('1 day')"),
            eval("to_datetime('2012-06-29 00:00:00')")
        );
        assert_eq!(
            eval("to_datetime('2012-06-28 00:00:00') - to_interval('2 hours')"),
            eval("to_datetime('2012-06-27 22:00:00')")
        );
        let mut broken = Expression::new("to_datetime('2012-06-28 00:00:00') * to_interval('1 day')");
        assert_eq!(broken.evaluate(&ExpressionContext::new()), Value::Null);
        assert!(broken.has_eval_error());
    }

    #[test]
    fn age_is_a_signed_interval() {
        assert_eq!(
            eval("day(age(to_date('2012-06-30'), to_date('2012-06-28')))"),
            Value::Double(2.0)
        );
        assert_eq!(
            eval("day(age(to_date('2012-06-28'), to_date('2012-06-30')))"),
            Value::Double(-2.0)
        );
    }

    #[test]
    fn string_functions_cover_the_catalog() {
        assert_eq!(eval("lower('HeLLo')"), Value::from("hello"));
        assert_eq!(eval("upper('hello')"), Value::from("HELLO"));
        assert_eq!(eval("title('hello wORLD')"), Value::from("Hello World"));
        assert_eq!(eval("trim('  padded  ')"), Value::from("padded"));
        assert_eq!(eval("length('hello')"), Value::Int(5));
        assert_eq!(eval("replace('hello', 'l', 'L')"), Value::from("heLLo"));
        assert_eq!(eval("substr('hello world', 3, 5)"), Value::from("llo w"));
        assert_eq!(eval("left('hello', 2)"), Value::from("he"));
        assert_eq!(eval("right('hello', 2)"), Value::from("lo"));
        assert_eq!(eval("rpad('hi', 4, 'x')"), Value::from("hixx"));
        assert_eq!(eval("lpad('hi', 4, 'x')"), Value::from("xxhi"));
        assert_eq!(eval("rpad('hello', 3, 'x')"), Value::from("hel"));
        assert_eq!(eval("strpos('hello', 'l+')"), Value::Int(3));
        assert_eq!(eval("strpos('hello', 'z')"), Value::Int(0));
        assert_eq!(eval("format('%1 of %2', 1, 3)"), Value::from("1 of 3"));
    }

    #[test]
    fn regexp_functions_share_the_pattern_error() {
        assert_eq!(eval("regexp_match('abc123', '\\\\d+')"), Value::Int(1));
        assert_eq!(eval("regexp_replace('a1b2', '\\\\d', '#')"), Value::from("a#b#"));
        assert_eq!(eval("regexp_substr('price: 42 eur', '(\\\\d+)')"), Value::from("42"));
        assert!(eval_error("regexp_match('x', '(')").contains("invalid regular expression"));
    }

    #[test]
    fn format_number_groups_thousands() {
        assert_eq!(eval("format_number(1234567.891, 2)"), Value::from("1,234,567.89"));
        assert_eq!(eval("format_number(-1234.56, 1)"), Value::from("-1,234.6"));
        assert_eq!(eval("format_number(42, 1)"), Value::from("42.0"));
        assert!(eval_error("format_number(1, -1)").contains("places"));
    }

    #[test]
    fn format_date_uses_strftime_patterns() {
        assert_eq!(
            eval("format_date(to_date('2012-06-28'), '%d.%m.%Y')"),
            Value::from("28.06.2012")
        );
    }

    #[test]
    fn wordwrap_breaks_on_the_delimiter() {
        assert_eq!(
            eval("wordwrap('university of science', 13)"),
            Value::from("university of\nscience")
        );
        assert_eq!(
            eval("wordwrap('university of science', -3)"),
            Value::from("university\nof science")
        );
        assert_eq!(eval("wordwrap('', 10)"), Value::Null);
    }

    #[test]
    fn fuzzy_functions_expose_the_string_helpers() {
        assert_eq!(eval("levenshtein('kitten', 'sitting')"), Value::Int(3));
        assert_eq!(
            eval("longest_common_substring('ABABC', 'BABCA')"),
            Value::from("BABC")
        );
        assert_eq!(eval("hamming_distance('abc', 'abd')"), Value::Int(1));
        assert_eq!(eval("hamming_distance('abc', 'ab')"), Value::Null);
        assert_eq!(eval("soundex('Robert')"), Value::from("R163"));
    }

    #[test]
    fn color_constructors_encode_component_strings() {
        assert_eq!(eval("color_rgb(255, 127, 0)"), Value::from("255,127,0"));
        assert_eq!(eval("color_rgba(255, 127, 0, 200)"), Value::from("255,127,0,200"));
        assert_eq!(eval("color_hsv(0, 100, 100)"), Value::from("255,0,0"));
        assert_eq!(eval("color_cmyk(100, 0, 0, 0)"), Value::from("0,255,255"));
        assert!(eval_error("color_rgb(300, 0, 0)").contains("color"));
    }

    #[test]
    fn color_part_reads_and_writes_components() {
        assert_eq!(eval("color_part('255,127,0', 'green')"), Value::Int(127));
        assert_eq!(eval("color_part('10,20,30,40', 'alpha')"), Value::Int(40));
        assert_eq!(
            eval("set_color_part('255,127,0', 'blue', 255)"),
            Value::from("255,127,255,255")
        );
        assert!(eval_error("color_part('255,127,0', 'chroma')").contains("chroma"));
        assert!(eval_error("color_part('not a color', 'red')").contains("color"));
    }

    #[test]
    fn record_functions_without_a_feature_yield_null() {
        assert_eq!(eval("$id"), Value::Null);
        assert_eq!(eval("$currentfeature"), Value::Null);
        assert_eq!(eval("$geometry"), Value::Null);
        assert_eq!(eval("$area"), Value::Null);
    }

    #[test]
    fn var_reads_context_variables() {
        let mut expression = Expression::new("var('size') * 2");
        let mut context = ExpressionContext::new();
        context.set_variable("size", Value::Int(21));
        assert_eq!(expression.evaluate(&context), Value::Int(42));

        let mut unset = Expression::new("var('missing')");
        assert_eq!(unset.evaluate(&ExpressionContext::new()), Value::Null);
    }
}
