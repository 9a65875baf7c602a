//! Emergency halt.
//!
//! While halted, deposits, commitment posting and claims are refused.
//! The authority can halt instantly. Un-halting needs the guardian as soon
//! as a guardian has ever been configured; before that, the authority may
//! lift its own halt.

use chrono::{DateTime, Utc};
use fisher_types::{CallContext, FisherError, Result};
use serde::{Deserialize, Serialize};

use crate::governance::Governance;

/// Halt flag with the time it was raised.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HaltSwitch {
    halted_at: Option<DateTime<Utc>>,
}

impl HaltSwitch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted_at.is_some()
    }

    #[must_use]
    pub fn halted_at(&self) -> Option<DateTime<Utc>> {
        self.halted_at
    }

    /// Guard a halt-sensitive operation.
    pub fn check_not_halted(&self) -> Result<()> {
        if self.is_halted() {
            Err(FisherError::Halted)
        } else {
            Ok(())
        }
    }

    /// Authority raises the halt. Idempotent.
    pub fn halt(&mut self, ctx: &CallContext, gov: &Governance) -> Result<()> {
        gov.check_authority(ctx.caller)?;
        if self.halted_at.is_none() {
            self.halted_at = Some(ctx.now);
            tracing::warn!(by = %ctx.caller, "Emergency halt raised");
        }
        Ok(())
    }

    /// Guardian (or authority, if no guardian has ever existed) lifts the halt.
    pub fn unhalt(&mut self, ctx: &CallContext, gov: &Governance) -> Result<()> {
        if gov.guardian_ever_configured() {
            gov.check_guardian(ctx.caller)?;
        } else {
            gov.check_authority(ctx.caller)?;
        }
        if self.halted_at.take().is_some() {
            tracing::info!(by = %ctx.caller, "Emergency halt lifted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use fisher_types::{Address, RecoveryConfig};

    use super::*;

    fn gov(guardian: Option<Address>) -> (Governance, CallContext) {
        let ctx = CallContext::at(Address::from_tag(1), 0);
        let gov = Governance::new(ctx.caller, guardian, RecoveryConfig::default(), ctx.now).unwrap();
        (gov, ctx)
    }

    #[test]
    fn authority_halts_guardian_unhalts() {
        let guardian = Address::from_tag(2);
        let (gov, ctx) = gov(Some(guardian));
        let mut switch = HaltSwitch::new();
        switch.halt(&ctx, &gov).unwrap();
        assert!(matches!(switch.check_not_halted(), Err(FisherError::Halted)));

        // Authority cannot lift its own halt once a guardian exists.
        assert!(matches!(
            switch.unhalt(&ctx, &gov),
            Err(FisherError::NotGuardian(_))
        ));
        switch.unhalt(&ctx.as_caller(guardian), &gov).unwrap();
        assert!(switch.check_not_halted().is_ok());
    }

    #[test]
    fn authority_unhalts_when_no_guardian_ever() {
        let (gov, ctx) = gov(None);
        let mut switch = HaltSwitch::new();
        switch.halt(&ctx, &gov).unwrap();
        switch.unhalt(&ctx, &gov).unwrap();
        assert!(!switch.is_halted());
    }

    #[test]
    fn outsider_cannot_halt() {
        let (gov, ctx) = gov(None);
        let mut switch = HaltSwitch::new();
        let err = switch
            .halt(&ctx.as_caller(Address::from_tag(5)), &gov)
            .unwrap_err();
        assert!(matches!(err, FisherError::NotAuthority(_)));
        assert!(!switch.is_halted());
    }
}
