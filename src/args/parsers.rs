use crate::error::{AppError, AppResult};

use super::types::PositiveUsize;

pub(super) fn parse_positive_usize(s: &str) -> AppResult<PositiveUsize> {
    s.parse::<PositiveUsize>().map_err(AppError::from)
}
