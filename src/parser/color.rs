//! Color literals: predefined names, `#RRGGBB`/`#AARRGGBB`, decimal
//! `r,g,b`, CMYK quadruples and grayscale floats.

use crate::error::{ParseError, ParseResult, Position};
use crate::graphics::Color;

static NAMED: phf::Map<&'static str, u32> = phf::phf_map! {
    "black" => 0xFF000000,
    "white" => 0xFFFFFFFF,
    "red" => 0xFFFF0000,
    "green" => 0xFF00FF00,
    "blue" => 0xFF0000FF,
    "cyan" => 0xFF00FFFF,
    "magenta" => 0xFFFF00FF,
    "yellow" => 0xFFFFFF00,
    "gray" => 0xFF808080,
    "grey" => 0xFF808080,
    "darkgray" => 0xFF404040,
    "darkgrey" => 0xFF404040,
    "lightgray" => 0xFFC0C0C0,
    "lightgrey" => 0xFFC0C0C0,
    "orange" => 0xFFFF7F00,
    "pink" => 0xFFFFC0CB,
    "purple" => 0xFF800080,
    "violet" => 0xFFEE82EE,
    "brown" => 0xFFA52A2A,
    "olive" => 0xFF808000,
    "teal" => 0xFF008080,
    "navy" => 0xFF000080,
    "maroon" => 0xFF800000,
    "lime" => 0xFFBFFF00,
    "aqua" => 0xFF00FFFF,
    "fuchsia" => 0xFFFF00FF,
    "silver" => 0xFFC0C0C0,
    "gold" => 0xFFFFD700,
    "coral" => 0xFFFF7F50,
    "salmon" => 0xFFFA8072,
    "khaki" => 0xFFF0E68C,
    "orchid" => 0xFFDA70D6,
    "plum" => 0xFFDDA0DD,
    "tan" => 0xFFD2B48C,
    "beige" => 0xFFF5F5DC,
    "ivory" => 0xFFFFFFF0,
    "azure" => 0xFFF0FFFF,
    "lavender" => 0xFFE6E6FA,
    "crimson" => 0xFFDC143C,
    "indigo" => 0xFF4B0082,
    "turquoise" => 0xFF40E0D0,
    "chocolate" => 0xFFD2691E,
    "tomato" => 0xFFFF6347,
    "orangered" => 0xFFFF4500,
    "forestgreen" => 0xFF228B22,
    "seagreen" => 0xFF2E8B57,
    "springgreen" => 0xFF00FF7F,
    "royalblue" => 0xFF4169E1,
    "steelblue" => 0xFF4682B4,
    "skyblue" => 0xFF87CEEB,
    "slateblue" => 0xFF6A5ACD,
    "midnightblue" => 0xFF191970,
    "firebrick" => 0xFFB22222,
    "darkred" => 0xFF8B0000,
    "darkgreen" => 0xFF006400,
    "darkblue" => 0xFF00008B,
    "darkorange" => 0xFFFF8C00,
    "darkviolet" => 0xFF9400D3,
    "goldenrod" => 0xFFDAA520,
    "transparent" => 0x00000000,
};

/// Parse any of the documented color syntaxes.
pub fn parse_color(text: &str, pos: Position) -> ParseResult<Color> {
    let text = text.trim();
    let fail = || ParseError::InvalidColor {
        snippet: text.to_string(),
        pos,
    };

    if text.is_empty() {
        return Err(fail());
    }

    if let Some(named) = NAMED.get(text.to_ascii_lowercase().as_str()) {
        return Ok(Color(*named));
    }

    if let Some(hex) = text.strip_prefix('#') {
        let value = u32::from_str_radix(hex, 16).map_err(|_| fail())?;
        return match hex.len() {
            6 => Ok(Color(0xFF00_0000 | value)),
            8 => Ok(Color(value)),
            _ => Err(fail()),
        };
    }

    let parts: Vec<&str> = text.split(',').map(str::trim).collect();
    match parts.len() {
        // single float: gray level
        1 => {
            let level: f64 = text.parse().map_err(|_| fail())?;
            if !(0.0..=1.0).contains(&level) {
                return Err(fail());
            }
            let v = component(level);
            Ok(Color::rgb(v, v, v))
        }
        // r,g,b — integers 0..255 or floats 0..1, detected per original
        3 => {
            let floats = parts.iter().any(|p| p.contains('.'));
            let mut rgb = [0u8; 3];
            for (slot, part) in rgb.iter_mut().zip(&parts) {
                *slot = if floats {
                    let v: f64 = part.parse().map_err(|_| fail())?;
                    if !(0.0..=1.0).contains(&v) {
                        return Err(fail());
                    }
                    component(v)
                } else {
                    part.parse::<u8>().map_err(|_| fail())?
                };
            }
            Ok(Color::rgb(rgb[0], rgb[1], rgb[2]))
        }
        // c,m,y,k floats
        4 => {
            let mut cmyk = [0.0f64; 4];
            for (slot, part) in cmyk.iter_mut().zip(&parts) {
                *slot = part.parse().map_err(|_| fail())?;
                if !(0.0..=1.0).contains(slot) {
                    return Err(fail());
                }
            }
            let [c, m, y, k] = cmyk;
            Ok(Color::rgb(
                component((1.0 - c) * (1.0 - k)),
                component((1.0 - m) * (1.0 - k)),
                component((1.0 - y) * (1.0 - k)),
            ))
        }
        _ => Err(fail()),
    }
}

fn component(v: f64) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(text: &str) -> Color {
        parse_color(text, Position::default()).unwrap()
    }

    #[test]
    fn named_colors_are_case_insensitive() {
        assert_eq!(color("RED"), Color::RED);
        assert_eq!(color("Transparent"), Color::TRANSPARENT);
    }

    #[test]
    fn hex_forms() {
        assert_eq!(color("#FF0000"), Color::RED);
        assert_eq!(color("#80FF0000"), Color(0x80FF0000));
        assert!(parse_color("#F00", Position::default()).is_err());
    }

    #[test]
    fn component_triples() {
        assert_eq!(color("255, 0, 0"), Color::RED);
        assert_eq!(color("1.0, 0, 0"), Color::RED);
        assert_eq!(color("0.5"), Color::rgb(128, 128, 128));
    }

    #[test]
    fn cmyk_converts() {
        assert_eq!(color("0, 1, 1, 0"), Color::RED);
        assert_eq!(color("0, 0, 0, 1"), Color::BLACK);
    }

    #[test]
    fn garbage_is_rejected() {
        for bad in ["", "redd", "1,2", "0,0,2.0", "#GG0000"] {
            assert!(parse_color(bad, Position::default()).is_err(), "{bad}");
        }
    }
}
