use atm_ledger::application::ledger::Ledger;
use atm_ledger::config::EngineConfig;
use atm_ledger::domain::account::{AccountId, NewAccount, TargetCredentials};
use atm_ledger::domain::transaction::TransactionKind;
use atm_ledger::error::LedgerError;
use atm_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

fn ledger() -> Ledger {
    Ledger::new(Arc::new(InMemoryLedgerStore::new()), EngineConfig::default())
}

async fn open(ledger: &Ledger, name: &str, balance: Decimal) -> AccountId {
    ledger
        .registry
        .create(NewAccount::new(name, format!("{name}-pw"), format!("GOV-{name}"), balance))
        .await
        .unwrap()
}

async fn balance_of(ledger: &Ledger, id: AccountId) -> Decimal {
    ledger
        .registry
        .find_by_id(id)
        .await
        .unwrap()
        .expect("account exists")
        .balance
        .value()
}

#[tokio::test]
async fn test_random_sequences_conserve_money() {
    let mut rng = StdRng::seed_from_u64(0x5eed);

    for round in 0..20 {
        let ledger = ledger();
        let initial = Decimal::new(rng.gen_range(0..10_000), 2);
        let id = open(&ledger, &format!("holder{round}"), initial).await;

        let mut deposited = Decimal::ZERO;
        let mut withdrawn = Decimal::ZERO;
        for _ in 0..100 {
            let amount = Decimal::new(rng.gen_range(1..5_000), 2);
            if rng.gen_bool(0.5) {
                let balance = ledger.engine.deposit(id, amount).await.unwrap();
                deposited += amount;
                assert!(balance.value() >= Decimal::ZERO);
            } else {
                let before = balance_of(&ledger, id).await;
                match ledger.engine.withdraw(id, amount).await {
                    Ok(balance) => {
                        withdrawn += amount;
                        assert!(balance.value() >= Decimal::ZERO);
                    }
                    Err(LedgerError::InsufficientFunds {
                        requested,
                        available,
                    }) => {
                        assert!(requested > available);
                        assert_eq!(available, before);
                        assert_eq!(balance_of(&ledger, id).await, before);
                    }
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
        }

        assert_eq!(
            balance_of(&ledger, id).await,
            initial + deposited - withdrawn
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_withdrawals_are_linearized() {
    for _ in 0..25 {
        let ledger = ledger();
        let id = open(&ledger, "alice", dec!(100)).await;

        let first = {
            let engine = ledger.engine.clone();
            tokio::spawn(async move { engine.withdraw(id, dec!(80)).await })
        };
        let second = {
            let engine = ledger.engine.clone();
            tokio::spawn(async move { engine.withdraw(id, dec!(80)).await })
        };
        let results = [first.await.unwrap(), second.await.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert_eq!(
            results
                .iter()
                .filter(|r| matches!(r, Err(LedgerError::InsufficientFunds { .. })))
                .count(),
            1
        );
        assert_eq!(balance_of(&ledger, id).await, dec!(20));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_deposits_all_land() {
    let ledger = ledger();
    let id = open(&ledger, "alice", dec!(0)).await;

    let handles: Vec<_> = (0..200)
        .map(|_| {
            let engine = ledger.engine.clone();
            tokio::spawn(async move { engine.deposit(id, dec!(0.5)).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(balance_of(&ledger, id).await, dec!(100));
    let history = ledger
        .history
        .recent_transactions(id, TransactionKind::Deposit, 1_000)
        .await
        .unwrap();
    assert_eq!(history.len(), 200);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_crossing_closures_do_not_deadlock_or_lose_money() {
    for _ in 0..25 {
        let ledger = ledger();
        let alice = open(&ledger, "alice", dec!(30)).await;
        let bob = open(&ledger, "bob", dec!(12)).await;

        let a = {
            let engine = ledger.engine.clone();
            tokio::spawn(async move {
                engine
                    .close_and_transfer(alice, &TargetCredentials::new("bob", "bob-pw", "GOV-bob"))
                    .await
            })
        };
        let b = {
            let engine = ledger.engine.clone();
            tokio::spawn(async move {
                engine
                    .close_and_transfer(bob, &TargetCredentials::new("alice", "alice-pw", "GOV-alice"))
                    .await
            })
        };
        let results = [a.await.unwrap(), b.await.unwrap()];

        // Whichever runs first wins; the other finds its counterpart gone.
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let survivors = ledger.registry.find_by_id(alice).await.unwrap().into_iter()
            .chain(ledger.registry.find_by_id(bob).await.unwrap())
            .collect::<Vec<_>>();
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].balance.value(), dec!(42));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_deposit_racing_closure_is_never_lost() {
    for _ in 0..25 {
        let ledger = ledger();
        let alice = open(&ledger, "alice", dec!(10)).await;
        let bob = open(&ledger, "bob", dec!(0)).await;

        let deposit = {
            let engine = ledger.engine.clone();
            tokio::spawn(async move { engine.deposit(alice, dec!(5)).await })
        };
        let close = {
            let engine = ledger.engine.clone();
            tokio::spawn(async move {
                engine
                    .close_and_transfer(alice, &TargetCredentials::new("bob", "bob-pw", "GOV-bob"))
                    .await
            })
        };
        let deposit = deposit.await.unwrap();
        close.await.unwrap().unwrap();

        let expected = match deposit {
            Ok(_) => dec!(15),
            Err(LedgerError::AccountNotFound(id)) if id == alice => dec!(10),
            Err(other) => panic!("unexpected error: {other}"),
        };
        assert_eq!(balance_of(&ledger, bob).await, expected);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_registrations() {
    let ledger = ledger();
    let handles: Vec<_> = (0..10)
        .map(|i| {
            let registry = ledger.registry.clone();
            tokio::spawn(async move {
                registry
                    .create(NewAccount::new(format!("user{i}"), "pw", "GOV-SAME", dec!(1)))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut duplicates = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(LedgerError::DuplicateIdentifier { .. }) => duplicates += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert_eq!(created, 1);
    assert_eq!(duplicates, 9);
}

#[tokio::test]
async fn test_history_is_most_recent_first_and_capped() {
    let ledger = ledger();
    let id = open(&ledger, "alice", dec!(0)).await;
    for i in 1..=7 {
        ledger.engine.deposit(id, Decimal::from(i)).await.unwrap();
    }
    ledger.engine.withdraw(id, dec!(3)).await.unwrap();

    let deposits = ledger.history.recent(id, TransactionKind::Deposit).await.unwrap();
    let amounts: Vec<Decimal> = deposits.iter().map(|e| e.amount.value()).collect();
    assert_eq!(amounts, vec![dec!(7), dec!(6), dec!(5), dec!(4), dec!(3)]);

    let withdrawals = ledger.history.recent(id, TransactionKind::Withdraw).await.unwrap();
    assert_eq!(withdrawals.len(), 1);

    let other = open(&ledger, "bob", dec!(1)).await;
    assert!(ledger.history.recent(other, TransactionKind::Deposit).await.unwrap().is_empty());
}
