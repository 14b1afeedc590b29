use std::time::Duration;

use crate::config::{parse_duration_allow_zero, parse_duration_value};
use crate::error::{AppError, AppResult, ValidationError};

pub(crate) fn parse_duration_arg(s: &str) -> AppResult<Duration> {
    parse_duration_value(s).map_err(AppError::validation)
}

pub(crate) fn parse_pause_arg(s: &str) -> AppResult<Duration> {
    parse_duration_allow_zero(s).map_err(AppError::validation)
}

pub(crate) fn parse_rounds(s: &str) -> AppResult<usize> {
    let rounds: usize = s.trim().parse().map_err(|err| {
        AppError::validation(ValidationError::InvalidRounds {
            value: s.to_owned(),
            source: err,
        })
    })?;
    if rounds == 0 {
        return Err(AppError::validation(ValidationError::ZeroRounds));
    }
    Ok(rounds)
}
