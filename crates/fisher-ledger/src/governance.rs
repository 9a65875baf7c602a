//! Authority, guardian, strikes and liveness recovery.
//!
//! The authority runs the protocol (advances, deposits, commitments). The
//! guardian watches it: it disputes bad commitments, resets strikes, and
//! designates a recovery address if the authority goes silent.
//!
//! ```text
//! replace_commitment ──► strike += 1 ──► strikes == max ──► revoked
//!                                                          │
//!            guardian: request_strike_reset ── delay ── execute_strike_reset
//! ```

use chrono::{DateTime, Utc};
use fisher_types::{Address, CallContext, FisherError, RecoveryConfig, Result, add_duration};
use serde::{Deserialize, Serialize};

/// A pending liveness-recovery designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryDesignation {
    pub address: Address,
    pub designated_at: DateTime<Utc>,
}

/// Roles and the strike/recovery state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Governance {
    authority: Address,
    pending_authority: Option<Address>,
    guardian: Option<Address>,
    /// Sticky: once a guardian has existed, only a guardian may un-halt.
    guardian_ever_configured: bool,
    strikes: u32,
    strike_reset_requested_at: Option<DateTime<Utc>>,
    last_authority_action: DateTime<Utc>,
    recovery: Option<RecoveryDesignation>,
    config: RecoveryConfig,
}

impl Governance {
    pub fn new(
        authority: Address,
        guardian: Option<Address>,
        config: RecoveryConfig,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        if authority.is_zero() {
            return Err(FisherError::ZeroAddress { role: "authority" });
        }
        if guardian.is_some_and(|g| g.is_zero()) {
            return Err(FisherError::ZeroAddress { role: "guardian" });
        }
        Ok(Self {
            authority,
            pending_authority: None,
            guardian,
            guardian_ever_configured: guardian.is_some(),
            strikes: 0,
            strike_reset_requested_at: None,
            last_authority_action: now,
            recovery: None,
            config,
        })
    }

    // -----------------------------------------------------------------
    // Checks
    // -----------------------------------------------------------------

    /// Caller is the authority and the authority is not revoked.
    pub fn check_authority(&self, caller: Address) -> Result<()> {
        if caller != self.authority {
            return Err(FisherError::NotAuthority(caller));
        }
        if self.is_revoked() {
            return Err(FisherError::AuthorityRevoked {
                strikes: self.strikes,
            });
        }
        Ok(())
    }

    /// Caller is the configured guardian.
    pub fn check_guardian(&self, caller: Address) -> Result<()> {
        match self.guardian {
            Some(g) if g == caller => Ok(()),
            _ => Err(FisherError::NotGuardian(caller)),
        }
    }

    /// Record an authority action for liveness tracking. Any pending
    /// recovery designation is void once the authority shows up again.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_authority_action = now;
        if let Some(rec) = self.recovery.take() {
            tracing::info!(recovery = %rec.address, "Recovery designation cancelled by authority action");
        }
    }

    // -----------------------------------------------------------------
    // Strikes
    // -----------------------------------------------------------------

    /// Add one strike. Returns the new count.
    pub fn record_strike(&mut self) -> u32 {
        self.strikes = self.strikes.saturating_add(1);
        tracing::warn!(
            strikes = self.strikes,
            max = self.config.max_strikes,
            "Authority strike recorded"
        );
        if self.is_revoked() {
            tracing::warn!(authority = %self.authority, "Authority revoked");
        }
        self.strikes
    }

    /// Guardian asks for the strike counter to be cleared.
    pub fn request_strike_reset(&mut self, ctx: &CallContext) -> Result<()> {
        self.check_guardian(ctx.caller)?;
        self.strike_reset_requested_at = Some(ctx.now);
        tracing::info!(strikes = self.strikes, "Strike reset requested");
        Ok(())
    }

    /// Guardian clears strikes once the reset delay has elapsed.
    pub fn execute_strike_reset(&mut self, ctx: &CallContext) -> Result<()> {
        self.check_guardian(ctx.caller)?;
        let requested = self
            .strike_reset_requested_at
            .ok_or_else(|| FisherError::StrikeResetNotReady {
                reason: "no reset requested".into(),
            })?;
        let ready_at = add_duration(requested, self.config.strike_reset_delay);
        if ctx.now < ready_at {
            return Err(FisherError::StrikeResetNotReady {
                reason: format!("{:?} remaining", ctx.remaining_until(ready_at)),
            });
        }
        self.strikes = 0;
        self.strike_reset_requested_at = None;
        tracing::info!("Strikes reset");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Role management
    // -----------------------------------------------------------------

    pub fn set_guardian(&mut self, ctx: &CallContext, guardian: Address) -> Result<()> {
        self.check_authority(ctx.caller)?;
        if guardian.is_zero() {
            return Err(FisherError::ZeroAddress { role: "guardian" });
        }
        self.guardian = Some(guardian);
        self.guardian_ever_configured = true;
        self.touch(ctx.now);
        tracing::info!(guardian = %guardian, "Guardian set");
        Ok(())
    }

    pub fn propose_authority(&mut self, ctx: &CallContext, new_authority: Address) -> Result<()> {
        self.check_authority(ctx.caller)?;
        if new_authority.is_zero() {
            return Err(FisherError::ZeroAddress { role: "authority" });
        }
        self.pending_authority = Some(new_authority);
        self.touch(ctx.now);
        tracing::info!(pending = %new_authority, "Authority transfer proposed");
        Ok(())
    }

    pub fn accept_authority(&mut self, ctx: &CallContext) -> Result<()> {
        if self.pending_authority != Some(ctx.caller) {
            return Err(FisherError::NotPendingAuthority(ctx.caller));
        }
        self.authority = ctx.caller;
        self.pending_authority = None;
        self.touch(ctx.now);
        tracing::info!(authority = %ctx.caller, "Authority transfer accepted");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Liveness recovery
    // -----------------------------------------------------------------

    fn check_inactive(&self, ctx: &CallContext) -> Result<()> {
        let ready_at = add_duration(self.last_authority_action, self.config.liveness_window);
        if ctx.now < ready_at {
            return Err(FisherError::RecoveryNotReady {
                remaining: ctx.remaining_until(ready_at),
            });
        }
        Ok(())
    }

    /// Guardian names a recovery address after the authority has been
    /// silent for the liveness window.
    pub fn designate_recovery(&mut self, ctx: &CallContext, address: Address) -> Result<()> {
        self.check_guardian(ctx.caller)?;
        if address.is_zero() {
            return Err(FisherError::ZeroAddress { role: "recovery" });
        }
        self.check_inactive(ctx)?;
        self.recovery = Some(RecoveryDesignation {
            address,
            designated_at: ctx.now,
        });
        tracing::warn!(recovery = %address, "Liveness recovery designated");
        Ok(())
    }

    /// The designated address takes over once another full liveness window
    /// has passed with no authority action.
    pub fn claim_recovery(&mut self, ctx: &CallContext) -> Result<()> {
        let rec = match self.recovery {
            Some(rec) if rec.address == ctx.caller => rec,
            _ => return Err(FisherError::NotRecovery(ctx.caller)),
        };
        self.check_inactive(ctx)?;
        let ready_at = add_duration(rec.designated_at, self.config.liveness_window);
        if ctx.now < ready_at {
            return Err(FisherError::RecoveryNotReady {
                remaining: ctx.remaining_until(ready_at),
            });
        }

        let previous = self.authority;
        self.authority = rec.address;
        self.pending_authority = None;
        self.strikes = 0;
        self.strike_reset_requested_at = None;
        self.recovery = None;
        self.last_authority_action = ctx.now;
        tracing::info!(previous = %previous, authority = %rec.address, "Authority recovered");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Views
    // -----------------------------------------------------------------

    #[must_use]
    pub fn authority(&self) -> Address {
        self.authority
    }

    #[must_use]
    pub fn pending_authority(&self) -> Option<Address> {
        self.pending_authority
    }

    #[must_use]
    pub fn guardian(&self) -> Option<Address> {
        self.guardian
    }

    #[must_use]
    pub fn guardian_ever_configured(&self) -> bool {
        self.guardian_ever_configured
    }

    #[must_use]
    pub fn strikes(&self) -> u32 {
        self.strikes
    }

    #[must_use]
    pub fn is_revoked(&self) -> bool {
        self.strikes >= self.config.max_strikes
    }

    #[must_use]
    pub fn last_authority_action(&self) -> DateTime<Utc> {
        self.last_authority_action
    }

    #[must_use]
    pub fn recovery(&self) -> Option<RecoveryDesignation> {
        self.recovery
    }
}
