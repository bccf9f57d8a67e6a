use indicatif::{ProgressBar, ProgressStyle};
use typed_floats::tf64::NonNaN;

use crate::error::PipelineError;

pub fn progress_bar(len: u64) -> ProgressBar {
    ProgressBar::new(len).with_style(
        ProgressStyle::with_template(
            "[{elapsed_precise}] {human_pos}/{human_len} {percent}% ({per_sec})",
        )
        .expect("hardcoded"),
    )
}

/// Parses coordinate text, rejecting anything that isn't a finite number.
pub fn parse_number(field: &'static str, value: &str) -> Result<NonNaN, PipelineError> {
    let error = || PipelineError::Parse {
        field,
        value: value.to_string(),
    };
    let x: f64 = value.trim().parse().map_err(|_| error())?;
    if !x.is_finite() {
        return Err(error());
    }
    NonNaN::new(x).map_err(|_| error())
}
