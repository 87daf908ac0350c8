//! Reward claim: the terminal badge mint.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{AcademyError, Result};
use crate::metrics::METRICS;
use crate::obs;
use crate::services::{BadgeService, WalletConnector};

/// A checksummed-or-not `0x` address of 20 bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(String);

impl WalletAddress {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| AcademyError::InvalidAddress(format!("{trimmed}: missing 0x prefix")))?;
        let bytes = hex::decode(digits)
            .map_err(|e| AcademyError::InvalidAddress(format!("{trimmed}: {e}")))?;
        if bytes.len() != 20 {
            return Err(AcademyError::InvalidAddress(format!(
                "{trimmed}: expected 20 bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(format!("0x{digits}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for WalletAddress {
    type Err = AcademyError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = AcademyError;

    fn try_from(s: String) -> Result<Self> {
        Self::parse(&s)
    }
}

impl From<WalletAddress> for String {
    fn from(addr: WalletAddress) -> Self {
        addr.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Game whose badge is being claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameId {
    Eip1559,
    Eip7702,
    Erc8004,
}

impl GameId {
    /// Path segment the minting service expects.
    pub fn path_segment(self) -> &'static str {
        match self {
            Self::Eip1559 => "1559",
            Self::Eip7702 => "7702",
            Self::Erc8004 => "8004",
        }
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path_segment())
    }
}

impl FromStr for GameId {
    type Err = AcademyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().trim_start_matches("eip-").trim_start_matches("erc-") {
            "1559" | "eip1559" => Ok(Self::Eip1559),
            "7702" | "eip7702" => Ok(Self::Eip7702),
            "8004" | "erc8004" => Ok(Self::Erc8004),
            other => Err(AcademyError::InvalidState(format!("unknown game: {other}"))),
        }
    }
}

/// Record of a minted badge. Lives only as long as the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResult {
    pub token_id: u64,
    pub contract_address: String,
    pub tx_hash: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ClaimState {
    #[default]
    Unclaimed,
    Minted(ClaimResult),
}

/// Gates and performs the badge claim for one game.
pub struct ClaimFlow {
    game: GameId,
    state: ClaimState,
    service: Arc<dyn BadgeService>,
    wallet: Arc<dyn WalletConnector>,
}

impl ClaimFlow {
    pub fn new(game: GameId, service: Arc<dyn BadgeService>, wallet: Arc<dyn WalletConnector>) -> Self {
        Self {
            game,
            state: ClaimState::Unclaimed,
            service,
            wallet,
        }
    }

    pub fn game(&self) -> GameId {
        self.game
    }

    pub fn state(&self) -> &ClaimState {
        &self.state
    }

    pub fn result(&self) -> Option<&ClaimResult> {
        match &self.state {
            ClaimState::Minted(result) => Some(result),
            ClaimState::Unclaimed => None,
        }
    }

    pub fn is_minted(&self) -> bool {
        matches!(self.state, ClaimState::Minted(_))
    }

    /// Claim the badge for `address`.
    ///
    /// Without an address the wallet is asked to connect and no collaborator
    /// call is made. A failed mint leaves the claim retryable.
    pub async fn claim_reward(
        &mut self,
        quiz_passed: bool,
        address: Option<&WalletAddress>,
    ) -> Result<ClaimResult> {
        let Some(address) = address else {
            self.wallet.request_connection();
            obs::emit_action_rejected("claim_reward", &AcademyError::WalletNotConnected);
            return Err(AcademyError::WalletNotConnected);
        };
        if !quiz_passed {
            let err = AcademyError::PermissionDenied("the challenge must be passed first".into());
            obs::emit_action_rejected("claim_reward", &err);
            return Err(err);
        }
        if let ClaimState::Minted(existing) = &self.state {
            return Err(AcademyError::InvalidState(format!(
                "badge already minted as token {}",
                existing.token_id
            )));
        }

        match self.service.claim_badge(self.game, address).await {
            Ok(result) => {
                METRICS.inc_claims_minted();
                obs::emit_claim_minted(self.game, result.token_id, &result.tx_hash);
                self.state = ClaimState::Minted(result.clone());
                Ok(result)
            }
            Err(err) => {
                METRICS.inc_collaborator_failures();
                obs::emit_collaborator_error("claim_badge", &err);
                Err(err.into())
            }
        }
    }

    /// Forget any minted badge.
    pub fn reset(&mut self) {
        self.state = ClaimState::Unclaimed;
    }
}
