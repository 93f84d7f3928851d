//! CSS color parsing and WCAG 2.1 contrast math.
//!
//! Parsing is deliberately closed: `rgb()`, `rgba()` (alpha parsed but not
//! composited), 6-digit hex, and a small named-color table. Everything else
//! (3-digit hex, `hsl()`, other CSS names) is `Unrecognized`, and
//! `contrast_ratio` maps an unrecognized operand to the ratio floor of 1.0
//! rather than skipping the pair. Callers that prefer to skip unmeasurable
//! pairs inspect `parse_color` first (see the contrast check in `a11y`).

use regex::Regex;
use std::sync::LazyLock;

/// A normalized color triple with channels in [0, 255].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }
}

/// Result of parsing one CSS color string.
///
/// The variant records which syntax matched; `Unrecognized` is an explicit
/// case so the worst-case contrast fallback stays visible at call sites.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParsedColor {
    Rgb(Rgb),
    /// Alpha is kept for inspection but ignored when computing luminance.
    Rgba(Rgb, f64),
    Hex(Rgb),
    Named(Rgb),
    Unrecognized,
}

impl ParsedColor {
    /// The `{r,g,b}` triple, or `None` for `Unrecognized`.
    pub fn channels(self) -> Option<Rgb> {
        match self {
            ParsedColor::Rgb(c)
            | ParsedColor::Rgba(c, _)
            | ParsedColor::Hex(c)
            | ParsedColor::Named(c) => Some(c),
            ParsedColor::Unrecognized => None,
        }
    }
}

static RGB_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rgb\((\d+),\s*(\d+),\s*(\d+)\)").unwrap());
static RGBA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"rgba\((\d+),\s*(\d+),\s*(\d+),\s*([\d.]+)\)").unwrap());
static HEX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#?([0-9a-fA-F]{2})([0-9a-fA-F]{2})([0-9a-fA-F]{2})$").unwrap()
});

fn channel(s: &str) -> Option<u8> {
    // Values above 255 are a parse failure, not a clamp.
    s.parse::<u32>().ok().and_then(|v| u8::try_from(v).ok())
}

fn hex_channel(s: &str) -> u8 {
    // The regex guarantees two hex digits.
    u8::from_str_radix(s, 16).unwrap_or(0)
}

fn named(name: &str) -> Option<Rgb> {
    let rgb = match name {
        "black" => Rgb::new(0, 0, 0),
        "white" => Rgb::new(255, 255, 255),
        "red" => Rgb::new(255, 0, 0),
        "green" => Rgb::new(0, 128, 0),
        "blue" => Rgb::new(0, 0, 255),
        "yellow" => Rgb::new(255, 255, 0),
        "cyan" => Rgb::new(0, 255, 255),
        "magenta" => Rgb::new(255, 0, 255),
        "silver" => Rgb::new(192, 192, 192),
        "gray" | "grey" => Rgb::new(128, 128, 128),
        _ => return None,
    };
    Some(rgb)
}

/// Parse a CSS color string into a tagged variant.
///
/// Pure function; priority order is `rgba()`, `rgb()`, 6-digit hex, named
/// table. The named table is closed (11 entries).
pub fn parse_color(input: &str) -> ParsedColor {
    let s = input.trim();
    if s.starts_with("rgba(") {
        if let Some(caps) = RGBA_RE.captures(s) {
            if let (Some(r), Some(g), Some(b)) = (
                channel(&caps[1]),
                channel(&caps[2]),
                channel(&caps[3]),
            ) {
                if let Ok(a) = caps[4].parse::<f64>() {
                    return ParsedColor::Rgba(Rgb::new(r, g, b), a);
                }
            }
        }
        return ParsedColor::Unrecognized;
    }
    if s.starts_with("rgb(") {
        if let Some(caps) = RGB_RE.captures(s) {
            if let (Some(r), Some(g), Some(b)) = (
                channel(&caps[1]),
                channel(&caps[2]),
                channel(&caps[3]),
            ) {
                return ParsedColor::Rgb(Rgb::new(r, g, b));
            }
        }
        return ParsedColor::Unrecognized;
    }
    if s.starts_with('#') {
        if let Some(caps) = HEX_RE.captures(s) {
            return ParsedColor::Hex(Rgb::new(
                hex_channel(&caps[1]),
                hex_channel(&caps[2]),
                hex_channel(&caps[3]),
            ));
        }
        return ParsedColor::Unrecognized;
    }
    match named(&s.to_ascii_lowercase()) {
        Some(rgb) => ParsedColor::Named(rgb),
        None => ParsedColor::Unrecognized,
    }
}

/// WCAG relative luminance of a color, in [0, 1].
///
/// Channels are normalized to [0, 1], gamma-corrected with the sRGB
/// piecewise curve, and combined with the BT.709 weights.
pub fn relative_luminance(r: u8, g: u8, b: u8) -> f64 {
    fn linear(v: u8) -> f64 {
        let c = f64::from(v) / 255.0;
        if c <= 0.03928 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    0.2126 * linear(r) + 0.7152 * linear(g) + 0.0722 * linear(b)
}

/// Contrast ratio between two parsed colors, in [1, 21].
pub fn contrast_of(a: Rgb, b: Rgb) -> f64 {
    let la = relative_luminance(a.r, a.g, a.b);
    let lb = relative_luminance(b.r, b.g, b.b);
    let lighter = la.max(lb);
    let darker = la.min(lb);
    (lighter + 0.05) / (darker + 0.05)
}

/// Contrast ratio between two CSS color strings.
///
/// When either string fails to parse the result is exactly 1.0, the
/// theoretical minimum. This reports every unmeasurable pair as a worst-case
/// violation; the contrast check exposes a policy for skipping instead.
pub fn contrast_ratio(color_a: &str, color_b: &str) -> f64 {
    match (
        parse_color(color_a).channels(),
        parse_color(color_b).channels(),
    ) {
        (Some(a), Some(b)) => contrast_of(a, b),
        _ => 1.0,
    }
}
