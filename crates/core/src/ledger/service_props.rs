//! Property-based tests for LedgerService.
//!
//! - Money is conserved across any sequence of transfers
//! - No balance ever goes negative
//! - Every committed mutation leaves exactly one ledger entry
//! - Replaying a committed mutation changes nothing

use proptest::prelude::*;

use super::command::TransferCommand;
use super::error::LedgerError;
use super::service::LedgerService;
use crate::testing::InMemoryLedger;

/// Strategy to generate a transfer as (from index, to index, amount).
fn transfer_op() -> impl Strategy<Value = (usize, usize, i64)> {
    (0usize..3, 0usize..3, 1i64..400)
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_transfers_conserve_money(
        opening in prop::collection::vec(0i64..1_000, 3),
        ops in prop::collection::vec(transfer_op(), 0..25),
    ) {
        let ledger = InMemoryLedger::new();
        let accounts: Vec<_> = opening.iter().map(|b| ledger.open_account(*b)).collect();
        let service = LedgerService::new(ledger.clone());
        let total: i64 = opening.iter().sum();

        let mut committed = 0;
        runtime().block_on(async {
            for (from, to, amount) in ops {
                let command = TransferCommand::new(
                    None,
                    &accounts[from].to_string(),
                    &accounts[to].to_string(),
                    amount,
                    "prop",
                );
                let Ok(command) = command else {
                    // Only self-transfers fail validation here.
                    assert_eq!(from, to);
                    continue;
                };
                match service.transfer(command).await {
                    Ok(_) => committed += 1,
                    Err(LedgerError::NotEnoughMoney) => {}
                    Err(other) => panic!("unexpected error: {other:?}"),
                }
            }
        });

        let balances: Vec<i64> = accounts
            .iter()
            .map(|a| ledger.balance_of(*a).unwrap())
            .collect();
        prop_assert_eq!(balances.iter().sum::<i64>(), total);
        prop_assert!(balances.iter().all(|b| *b >= 0));
        prop_assert_eq!(ledger.entry_count(), committed);
    }

    #[test]
    fn prop_replay_changes_nothing(
        opening in 0i64..1_000,
        amount in 1i64..1_000,
    ) {
        let ledger = InMemoryLedger::new();
        let from = ledger.open_account(opening);
        let to = ledger.open_account(0);
        let service = LedgerService::new(ledger.clone());
        let key = uuid::Uuid::new_v4().to_string();
        let command = || {
            TransferCommand::new(Some(&key), &from.to_string(), &to.to_string(), amount, "prop")
                .unwrap()
        };

        let (first, replay) = runtime().block_on(async {
            let first = service.transfer(command()).await;
            let balances = (ledger.balance_of(from), ledger.balance_of(to));
            let replay = service.transfer(command()).await;
            prop_assert_eq!((ledger.balance_of(from), ledger.balance_of(to)), balances);
            Ok((first, replay))
        })?;

        if first.is_ok() {
            prop_assert!(matches!(replay, Err(LedgerError::DuplicateIdempotencyKey(_))));
            prop_assert_eq!(ledger.entry_count(), 1);
        } else {
            prop_assert!(matches!(first, Err(LedgerError::NotEnoughMoney)));
            prop_assert!(matches!(replay, Err(LedgerError::NotEnoughMoney)));
            prop_assert_eq!(ledger.entry_count(), 0);
        }
    }
}
