use crate::{DatabaseConstants, InviteConstants, RawSettings};
use color_eyre::eyre::{Report, bail};
use serde::Deserialize;

/// Shortest code we are willing to hand out; anything shorter is guessable.
const MIN_CODE_LENGTH: usize = 8;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConstants {
    pub database: DatabaseConstants,
    pub invites: InviteConstants,
}

impl TryFrom<RawSettings> for AppConstants {
    type Error = Report;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let invites = raw.constants.invites;
        if invites.code_length < MIN_CODE_LENGTH {
            bail!(
                "constants.invites.code_length must be at least {MIN_CODE_LENGTH}, got {}",
                invites.code_length
            );
        }
        if invites.consume_max_attempts == 0 {
            bail!("constants.invites.consume_max_attempts must be at least 1");
        }
        if invites.default_time_limit_hours <= 0 {
            bail!("constants.invites.default_time_limit_hours must be positive");
        }

        Ok(Self {
            database: raw.constants.database,
            invites,
        })
    }
}

impl Default for InviteConstants {
    fn default() -> Self {
        Self {
            code_length: 12,
            consume_max_attempts: 32,
            default_time_limit_hours: 24 * 7,
        }
    }
}
