//! Number-per-line input files: peak times or amplitude samples

use std::path::Path;

#[derive(Debug)]
pub enum InputError {
    Io(std::io::Error),
    /// 1-based line number and its text
    Parse(usize, String),
}

impl From<std::io::Error> for InputError {
    fn from(v: std::io::Error) -> Self {
        Self::Io(v)
    }
}

/// One value per line, blank lines and `#` comments skipped
pub fn parse_values(text: &str) -> Result<Vec<f32>, InputError> {
    text.lines()
        .enumerate()
        .filter_map(|(idx, line)| {
            let line = line.split('#').next().unwrap_or_default().trim();
            (!line.is_empty()).then_some((idx, line))
        })
        .map(|(idx, line)| {
            line.parse::<f32>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| InputError::Parse(idx + 1, line.to_string()))
        })
        .collect()
}

pub fn load_values(path: &Path) -> Result<Vec<f32>, InputError> {
    let text = std::fs::read_to_string(path)?;
    parse_values(&text)
}

/// Peak times must be non-negative and in order
pub fn check_times(times: &[f32]) -> bool {
    times.iter().all(|t| *t >= 0.0) && times.windows(2).all(|w| w[0] <= w[1])
}
