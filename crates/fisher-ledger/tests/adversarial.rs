//! Fund conservation under randomized sequences with lossy tokens,
//! over-committed roots, replays and sweeps.

mod common;

use common::{DAY, HOUR, Harness, total_remaining, two_leaf_tree};
use fisher_types::{Address, FisherError, PeriodId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn assert_conserved(h: &Harness) {
    h.ledger.check_invariants().unwrap();
    for (period, fund) in h.ledger.funds().iter() {
        assert!(
            fund.claimed + fund.swept <= fund.deposited,
            "{period}: claimed {} + swept {} > deposited {}",
            fund.claimed,
            fund.swept,
            fund.deposited
        );
        assert!(fund.precision_loss <= fund.claimed);
    }
    // Every unit the pool holds is owed to some period.
    assert_eq!(h.ledger.token().pool_balance(), total_remaining(&h.ledger));
}

#[test]
fn randomized_fee_on_transfer_sequences_conserve_funds() {
    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut h = Harness::new(0);
        let alice = Address::from_tag(0xA1);
        let bob = Address::from_tag(0xB0);

        for p in 0..6u64 {
            let period = PeriodId(p);
            h.ledger.token_mut().set_fee_bps(rng.gen_range(0..=200));
            let deposit: u128 = rng.gen_range(1_000..=100_000);
            h.ledger.deposit_for_period(&h.auth(), period, deposit).unwrap();
            assert_conserved(&h);

            h.wait(HOUR);
            h.ledger.advance_period(&h.auth()).unwrap();

            // Roots may promise more than the period holds.
            let a_amt: u128 = rng.gen_range(10..=deposit);
            let b_amt: u128 = rng.gen_range(10..=deposit);
            let (root, pa, pb) = two_leaf_tree(h.ledger.domain(), period, (alice, a_amt), (bob, b_amt));
            h.ledger.post_commitment(&h.auth(), period, root).unwrap();
            h.wait(DAY);

            for (who, amount, proof) in [(alice, a_amt, &pa), (bob, b_amt, &pb), (alice, a_amt, &pa)] {
                h.ledger.token_mut().set_fee_bps(rng.gen_range(0..=200));
                match h.claim(who, period, amount, proof) {
                    Ok(r) => {
                        assert_eq!(r.amount, amount);
                        assert!(r.received <= amount);
                    }
                    Err(
                        FisherError::InsufficientPeriodFund { .. }
                        | FisherError::SlippageTooHigh { .. }
                        | FisherError::AlreadyClaimed { .. },
                    ) => {}
                    Err(other) => panic!("unexpected error: {other}"),
                }
                assert_conserved(&h);
            }
        }

        // Sweep everything once every deadline has passed.
        h.wait(DAY * 121);
        h.ledger.token_mut().set_fee_bps(0);
        let treasury = Address::from_tag(0x7E);
        for p in 0..6u64 {
            h.ledger.sweep_period(&h.auth(), PeriodId(p), treasury).unwrap();
            assert_conserved(&h);
        }
        assert_eq!(total_remaining(&h.ledger), 0);
        assert_eq!(h.ledger.token().pool_balance(), 0);
    }
}

#[test]
fn slippage_boundary_is_inclusive() {
    let mut h = Harness::new(0);
    let alice = Address::from_tag(0xA1);
    let bob = Address::from_tag(0xB0);
    h.ledger.deposit_for_period(&h.auth(), PeriodId(0), 100_000).unwrap();
    h.wait(HOUR);
    h.ledger.advance_period(&h.auth()).unwrap();
    let (root, pa, pb) = two_leaf_tree(h.ledger.domain(), PeriodId(0), (alice, 10_000), (bob, 10_000));
    h.ledger.post_commitment(&h.auth(), PeriodId(0), root).unwrap();
    h.wait(DAY);

    // 100 bps == default maximum: accepted.
    h.ledger.token_mut().set_fee_bps(100);
    let r = h.claim(alice, PeriodId(0), 10_000, &pa).unwrap();
    assert_eq!(r.precision_loss, 100);

    // 101 bps: rejected and rolled back.
    h.ledger.token_mut().set_fee_bps(101);
    let err = h.claim(bob, PeriodId(0), 10_000, &pb).unwrap_err();
    assert!(matches!(err, FisherError::SlippageTooHigh { .. }));
    assert!(!h.ledger.has_claimed(bob, PeriodId(0)));
    assert_eq!(h.ledger.period_fund(PeriodId(0)).claimed, 10_000);
    assert_conserved(&h);
}

#[test]
fn halted_claims_leave_no_trace() {
    let mut h = Harness::new(0);
    let alice = Address::from_tag(0xA1);
    h.ledger.deposit_for_period(&h.auth(), PeriodId(0), 1_000).unwrap();
    h.wait(HOUR);
    h.ledger.advance_period(&h.auth()).unwrap();
    let (root, pa, _) = two_leaf_tree(h.ledger.domain(), PeriodId(0), (alice, 500), (Address::from_tag(3), 1));
    h.ledger.post_commitment(&h.auth(), PeriodId(0), root).unwrap();
    h.wait(DAY);

    h.ledger.halt(&h.auth()).unwrap();
    let err = h.claim(alice, PeriodId(0), 500, &pa).unwrap_err();
    assert!(matches!(err, FisherError::Halted));
    assert!(!h.ledger.has_claimed(alice, PeriodId(0)));

    h.ledger.unhalt(&h.guard()).unwrap();
    h.claim(alice, PeriodId(0), 500, &pa).unwrap();
    assert_conserved(&h);
}
