use serde_json::Value;

use crate::foundation::core::Rgba8;

/// Parse a record color value.
///
/// Accepts `#rgb`, `#rrggbb`, `#rrggbbaa`, `rgb(r,g,b)`, `rgba(r,g,b,a)`, `hsl(h,s%,l%)`,
/// `hsla(h,s%,l%,a)` and `[r, g, b]` / `[r, g, b, a]` arrays with channels in `0..=255`
/// (alpha in `[0, 1]`).
pub(crate) fn parse_color(v: &Value) -> Result<Rgba8, String> {
    match v {
        Value::String(s) => parse_css(s),
        Value::Array(items) => {
            let nums = items
                .iter()
                .map(|x| x.as_f64().ok_or_else(|| format!("non-numeric color channel {x}")))
                .collect::<Result<Vec<f64>, String>>()?;
            match nums.as_slice() {
                [r, g, b] => Ok(rgb255(*r, *g, *b, 1.0)),
                [r, g, b, a] => Ok(rgb255(*r, *g, *b, *a)),
                _ => Err("color array must have len 3 ([r,g,b]) or 4 ([r,g,b,a])".to_owned()),
            }
        }
        other => Err(format!("expected a color string or array, got {other}")),
    }
}

fn rgb255(r: f64, g: f64, b: f64, a: f64) -> Rgba8 {
    Rgba8::from_unit(r / 255.0, g / 255.0, b / 255.0, a)
}

fn parse_css(s: &str) -> Result<Rgba8, String> {
    let s = s.trim();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = s.to_ascii_lowercase();
    let Some((name, rest)) = lower.split_once('(') else {
        return match lower.as_str() {
            "transparent" => Ok(Rgba8::TRANSPARENT),
            "white" => Ok(Rgba8::WHITE),
            "black" => Ok(Rgba8::BLACK),
            _ => parse_hex(s),
        };
    };
    let args = rest
        .strip_suffix(')')
        .ok_or_else(|| format!("unterminated color function \"{s}\""))?;
    let parts: Vec<&str> = args
        .split([',', ' ', '/'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    match (name.trim(), parts.as_slice()) {
        ("rgb" | "rgba", [r, g, b]) => Ok(rgb255(channel(r)?, channel(g)?, channel(b)?, 1.0)),
        ("rgb" | "rgba", [r, g, b, a]) => {
            Ok(rgb255(channel(r)?, channel(g)?, channel(b)?, alpha(a)?))
        }
        ("hsl" | "hsla", [h, sat, l]) => {
            Ok(hsla_to_rgba(number(h)?, percent(sat)?, percent(l)?, 1.0))
        }
        ("hsl" | "hsla", [h, sat, l, a]) => Ok(hsla_to_rgba(
            number(h)?,
            percent(sat)?,
            percent(l)?,
            alpha(a)?,
        )),
        _ => Err(format!("unsupported color \"{s}\"")),
    }
}

fn number(p: &str) -> Result<f64, String> {
    p.trim_end_matches("deg")
        .parse::<f64>()
        .map_err(|_| format!("invalid color component \"{p}\""))
}

/// `0..=255` channel or a percentage.
fn channel(p: &str) -> Result<f64, String> {
    match p.strip_suffix('%') {
        Some(pct) => Ok(number(pct)? * 2.55),
        None => number(p),
    }
}

/// `[0, 1]` alpha or a percentage.
fn alpha(p: &str) -> Result<f64, String> {
    match p.strip_suffix('%') {
        Some(pct) => Ok(number(pct)? / 100.0),
        None => number(p),
    }
}

/// Percentage (or a bare `[0, 1]` fraction) as a unit value.
fn percent(p: &str) -> Result<f64, String> {
    match p.strip_suffix('%') {
        Some(pct) => Ok(number(pct)? / 100.0),
        None => number(p),
    }
}

fn parse_hex(s: &str) -> Result<Rgba8, String> {
    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }
    fn hex_nibble(c: &str) -> Result<u8, String> {
        let v = u8::from_str_radix(c, 16).map_err(|_| format!("invalid hex digit \"{c}\""))?;
        Ok(v * 17)
    }

    if !s.is_ascii() {
        return Err(format!("invalid hex color \"{s}\""));
    }
    match s.len() {
        3 => Ok(Rgba8::new(
            hex_nibble(&s[0..1])?,
            hex_nibble(&s[1..2])?,
            hex_nibble(&s[2..3])?,
            255,
        )),
        6 => Ok(Rgba8::new(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            255,
        )),
        8 => Ok(Rgba8::new(
            hex_byte(&s[0..2])?,
            hex_byte(&s[2..4])?,
            hex_byte(&s[4..6])?,
            hex_byte(&s[6..8])?,
        )),
        _ => Err("hex color must be #RGB, #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned()),
    }
}

fn hsla_to_rgba(h: f64, s: f64, l: f64, a: f64) -> Rgba8 {
    let h = (h % 360.0 + 360.0) % 360.0 / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);

    if s == 0.0 {
        return Rgba8::from_unit(l, l, l, a);
    }

    fn hue_to_rgb(p: f64, q: f64, mut t: f64) -> f64 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        if t < 1.0 / 6.0 {
            return p + (q - p) * 6.0 * t;
        }
        if t < 1.0 / 2.0 {
            return q;
        }
        if t < 2.0 / 3.0 {
            return p + (q - p) * (2.0 / 3.0 - t) * 6.0;
        }
        p
    }

    let q = if l < 0.5 {
        l * (1.0 + s)
    } else {
        l + s - l * s
    };
    let p = 2.0 * l - q;

    Rgba8::from_unit(
        hue_to_rgb(p, q, h + 1.0 / 3.0),
        hue_to_rgb(p, q, h),
        hue_to_rgb(p, q, h - 1.0 / 3.0),
        a,
    )
}

#[cfg(test)]
#[path = "../../tests/unit/schema/color.rs"]
mod tests;
