//! WMO weather code lookup.
//! See: https://open-meteo.com/en/docs#weathervariables

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Condition {
    pub description: &'static str,
    pub icon: &'static str,
}

impl Condition {
    const fn new(description: &'static str, icon: &'static str) -> Self {
        Self { description, icon }
    }
}

/// Shown for any code missing from [`CONDITIONS`].
pub const UNKNOWN: Condition = Condition::new("Unknown", "🌈");

const CONDITIONS: &[(i32, Condition)] = &[
    (0, Condition::new("Clear sky", "☀️")),
    (1, Condition::new("Mainly clear", "🌤️")),
    (2, Condition::new("Partly cloudy", "⛅")),
    (3, Condition::new("Overcast", "☁️")),
    (61, Condition::new("Light rain", "🌧️")),
    (63, Condition::new("Rain", "🌧️")),
    (65, Condition::new("Heavy rain", "🌧️")),
    (71, Condition::new("Snow", "❄️")),
    (95, Condition::new("Thunderstorm", "⛈️")),
];

pub fn describe(code: i32) -> Condition {
    CONDITIONS
        .iter()
        .find(|(known, _)| *known == code)
        .map(|(_, condition)| *condition)
        .unwrap_or(UNKNOWN)
}
