//! Read-side benchmarks: register projection and tree roll-up recompute from
//! the split set on every call, so their cost tracks posting volume.

use chrono::{NaiveDate, Utc};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;

use piggybank_core::{AccountId, OwnerId};
use piggybank_ledger::{
    Books, CreateTransaction, DateRange, SplitDraft, account_register, account_tree,
};

/// Seeded default chart plus `postings` two-leg transactions from Checking.
fn build_books(postings: usize) -> (Books, AccountId) {
    let mut books = Books::new(OwnerId::new());
    let accounts = books.seed_default_accounts(Utc::now()).expect("seed");
    let leaves: Vec<AccountId> = accounts.iter().filter(|a| !a.placeholder).map(|a| a.id).collect();
    let checking = accounts
        .iter()
        .find(|a| a.full_name == "Assets:Bank:Checking")
        .map(|a| a.id)
        .expect("checking account");
    let targets: Vec<AccountId> = leaves.into_iter().filter(|id| *id != checking).collect();
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).expect("date");

    for i in 0..postings {
        let amount = Decimal::new((i as i64 % 9_973) + 1, 2);
        let target = targets[i % targets.len()];
        books
            .create_transaction(
                CreateTransaction {
                    date: start + chrono::Duration::days((i % 1_500) as i64),
                    num: None,
                    description: format!("posting {i}"),
                    notes: None,
                    splits: vec![
                        SplitDraft {
                            account_id: target,
                            amount,
                            currency: piggybank_ledger::Currency::Usd,
                            memo: None,
                            reconcile_status: None,
                        },
                        SplitDraft {
                            account_id: checking,
                            amount: -amount,
                            currency: piggybank_ledger::Currency::Usd,
                            memo: None,
                            reconcile_status: None,
                        },
                    ],
                },
                Utc::now(),
            )
            .expect("balanced posting");
    }
    (books, checking)
}

fn bench_register(c: &mut Criterion) {
    let mut group = c.benchmark_group("account_register");
    for postings in [100usize, 1_000, 5_000] {
        let (books, checking) = build_books(postings);
        group.bench_with_input(BenchmarkId::from_parameter(postings), &postings, |b, _| {
            b.iter(|| account_register(black_box(&books), checking, &DateRange::all()))
        });
    }
    group.finish();
}

fn bench_tree(c: &mut Criterion) {
    let mut group = c.benchmark_group("account_tree");
    for postings in [100usize, 1_000, 5_000] {
        let (books, _) = build_books(postings);
        group.bench_with_input(BenchmarkId::from_parameter(postings), &postings, |b, _| {
            b.iter(|| account_tree(black_box(&books)))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_register, bench_tree);
criterion_main!(benches);
