//! Small color helpers for voice highlight rendering.

/// Parses `#rrggbb` into channel bytes.
pub fn parse_hex(color: &str) -> Option<[u8; 3]> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some([r, g, b])
}

/// Linear blend from `from` toward `to`; `ratio` 0 keeps `from`, 1 gives `to`.
pub fn mix(from: [u8; 3], to: [u8; 3], ratio: f64) -> [u8; 3] {
    let ratio = ratio.clamp(0.0, 1.0);
    let blend = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * ratio).round() as u8;
    [
        blend(from[0], to[0]),
        blend(from[1], to[1]),
        blend(from[2], to[2]),
    ]
}

/// Formats an `#rrggbbaa` color string with the alpha ratio scaled to a byte.
pub fn css_rgba(rgb: [u8; 3], alpha: f64) -> String {
    let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2], a)
}

pub const WHITE: [u8; 3] = [0xff, 0xff, 0xff];
pub const BLACK: [u8; 3] = [0x00, 0x00, 0x00];
