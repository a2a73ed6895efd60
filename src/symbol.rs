//! Met Éireann weather symbol table

/// Whether a symbol code counts as clear or fair weather.
///
/// Only Sun, LightCloud and PartlyCloud are fair; every other value,
/// including codes the provider does not define, is not.
#[must_use]
pub fn classify(code: i32) -> bool {
    matches!(code, 1..=3)
}

/// Convert a Met Éireann symbol number to its provider name
#[must_use]
pub fn describe(code: i32) -> &'static str {
    match code {
        1 => "Sun",
        2 => "LightCloud",
        3 => "PartlyCloud",
        4 => "Cloud",
        5 => "LightRainSun",
        6 => "LightRainThunderSun",
        7 => "SleetSun",
        8 => "SnowSun",
        9 => "LightRain",
        10 => "Rain",
        11 => "RainThunder",
        12 => "Sleet",
        13 => "Snow",
        14 => "SnowThunder",
        15 => "Fog",
        20 => "SleetSunThunder",
        21 => "SnowSunThunder",
        22 => "LightRainThunder",
        23 => "SleetThunder",
        24 => "DrizzleThunderSun",
        25 => "RainThunderSun",
        26 => "LightSleetThunderSun",
        27 => "HeavySleetThunderSun",
        28 => "LightSnowThunderSun",
        29 => "HeavySnowThunderSun",
        30 => "DrizzleThunder",
        31 => "LightSleetThunder",
        32 => "HeavySleetThunder",
        33 => "LightSnowThunder",
        34 => "HeavySnowThunder",
        40 => "DrizzleSun",
        41 => "RainSun",
        42 => "LightSleetSun",
        43 => "HeavySleetSun",
        44 => "LightSnowSun",
        45 => "HeavySnowSun",
        46 => "Drizzle",
        47 => "LightSleet",
        48 => "HeavySleet",
        49 => "LightSnow",
        50 => "HeavySnow",
        _ => "Unknown",
    }
}
