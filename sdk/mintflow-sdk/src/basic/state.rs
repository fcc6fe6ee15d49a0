use solana_sdk::pubkey::Pubkey;

use crate::basic::authority::ExportedKeypair;
use crate::error::{MintflowError, Result};

/// Data-free view of [`WorkflowState`], for errors and UI rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Disconnected,
    Connected,
    Minting,
    MintCreated,
    Operating { supply_capped: bool },
}

/// Everything a post-mint operation needs: the mint and the authority snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenContext {
    pub mint: Pubkey,
    pub authority: ExportedKeypair,
}

/// Lifecycle state. Mint identity and authority only exist in the variants that
/// follow a successful initial mint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum WorkflowState {
    #[default]
    Disconnected,
    Connected,
    Minting,
    MintCreated(TokenContext),
    Operating {
        token: TokenContext,
        supply_capped: bool,
    },
}

impl WorkflowState {
    pub fn kind(&self) -> StateKind {
        match self {
            WorkflowState::Disconnected => StateKind::Disconnected,
            WorkflowState::Connected => StateKind::Connected,
            WorkflowState::Minting => StateKind::Minting,
            WorkflowState::MintCreated(_) => StateKind::MintCreated,
            WorkflowState::Operating { supply_capped, .. } => StateKind::Operating {
                supply_capped: *supply_capped,
            },
        }
    }

    pub fn token(&self) -> Option<&TokenContext> {
        match self {
            WorkflowState::MintCreated(token) | WorkflowState::Operating { token, .. } => {
                Some(token)
            },
            _ => None,
        }
    }

    pub fn mint(&self) -> Option<Pubkey> {
        self.token().map(|token| token.mint)
    }

    pub fn is_supply_capped(&self) -> bool {
        matches!(
            self,
            WorkflowState::Operating {
                supply_capped: true,
                ..
            }
        )
    }

    fn invalid(&self, operation: &'static str) -> MintflowError {
        MintflowError::InvalidState {
            operation,
            state: self.kind(),
        }
    }

    pub fn require_disconnected(&self, operation: &'static str) -> Result<()> {
        match self {
            WorkflowState::Disconnected => Ok(()),
            _ => Err(self.invalid(operation)),
        }
    }

    pub fn require_connected(&self, operation: &'static str) -> Result<()> {
        match self {
            WorkflowState::Connected => Ok(()),
            _ => Err(self.invalid(operation)),
        }
    }

    /// Token context for an operation that mints, transfers, or touches the authority.
    /// Refused once supply is capped.
    pub fn require_operable(&self, operation: &'static str) -> Result<TokenContext> {
        match self {
            WorkflowState::MintCreated(token)
            | WorkflowState::Operating {
                token,
                supply_capped: false,
            } => Ok(token.clone()),
            _ => Err(self.invalid(operation)),
        }
    }

    pub fn on_connected(&mut self) {
        *self = WorkflowState::Connected;
    }

    /// Ends the session. Mint identity and authority go with it.
    pub fn on_disconnected(&mut self) {
        *self = WorkflowState::Disconnected;
    }

    pub fn begin_mint(&mut self) -> Result<()> {
        self.require_connected("initial mint")?;
        *self = WorkflowState::Minting;
        Ok(())
    }

    pub fn finish_mint(&mut self, token: TokenContext) {
        if matches!(self, WorkflowState::Minting) {
            *self = WorkflowState::MintCreated(token);
        }
    }

    pub fn abort_mint(&mut self) {
        if matches!(self, WorkflowState::Minting) {
            *self = WorkflowState::Connected;
        }
    }

    /// Record a settled post-mint operation. `capped` can only move false -> true.
    pub fn record_operation(&mut self, capped: bool) {
        let current = std::mem::take(self);
        *self = match current {
            WorkflowState::MintCreated(token) => WorkflowState::Operating {
                token,
                supply_capped: capped,
            },
            WorkflowState::Operating {
                token,
                supply_capped,
            } => WorkflowState::Operating {
                token,
                supply_capped: supply_capped || capped,
            },
            other => other,
        };
    }
}
