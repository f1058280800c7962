//! # Debt Waterfall Benchmarks
//!
//! Planning cost as the number of outstanding debts grows, and the full
//! aggregate command (plan, apply, debit, emit events) on the same ledgers.

#![allow(clippy::unwrap_used)]

use chrono::{Days, NaiveDate};
use criterion::{BatchSize, BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use estate_settlement::domain::entities::{Estate, EstateBuilder};
use estate_settlement::domain::services::{DebtWaterfall, PayableDebt};
use estate_settlement::domain::value_objects::{
    Currency, DebtId, DebtKind, LiabilityTier, Money, UserId,
};
use rust_decimal::Decimal;
use std::hint::black_box;

const SIZES: [usize; 4] = [10, 100, 1_000, 10_000];
const TIERS: [LiabilityTier; 5] = [
    LiabilityTier::Funeral,
    LiabilityTier::Administration,
    LiabilityTier::Secured,
    LiabilityTier::Preferential,
    LiabilityTier::Ordinary,
];

fn kes(amount: i64) -> Money {
    Money::new(Decimal::new(amount, 0), Currency::new("KES").unwrap())
}

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2023, 1, 1).unwrap()
}

fn payable_debts(count: usize) -> Vec<PayableDebt> {
    (0..count)
        .map(|i| {
            let tier = TIERS.get(i % TIERS.len()).copied().unwrap();
            let offset = u64::try_from(i % 365).unwrap();
            PayableDebt::new(
                DebtId::new_v4(),
                format!("creditor-{i}"),
                tier,
                base_date().checked_add_days(Days::new(offset)).unwrap(),
                kes(100 + i64::try_from(i % 900).unwrap()),
            )
        })
        .collect()
}

fn estate_with_debts(count: usize, cash: i64) -> Estate {
    let actor = UserId::new("bench");
    let mut estate = EstateBuilder::new(
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
        Currency::new("KES").unwrap(),
        actor.clone(),
    )
    .build()
    .unwrap();
    estate.activate(&actor).unwrap();
    estate
        .record_cash_receipt(kes(cash), "bench deposit", None, &actor)
        .unwrap();
    for i in 0..count {
        let tier = TIERS.get(i % TIERS.len()).copied().unwrap();
        estate
            .add_debt(
                DebtKind::Other,
                format!("creditor-{i}"),
                kes(250),
                Some(tier),
                base_date(),
                &actor,
            )
            .unwrap();
    }
    estate.take_pending_events();
    estate
}

fn bench_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("waterfall-plan");
    for size in SIZES {
        let debts = payable_debts(size);
        // Enough cash for roughly half the ledger.
        let available = kes(i64::try_from(size).unwrap() * 300);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &debts, |b, debts| {
            b.iter(|| DebtWaterfall::plan(black_box(available), debts.iter().cloned()).unwrap())
        });
    }
    group.finish();
}

fn bench_execute(c: &mut Criterion) {
    let mut group = c.benchmark_group("waterfall-execute");
    let actor = UserId::new("bench");
    for size in [10, 100, 1_000] {
        let cash = i64::try_from(size).unwrap() * 125;
        let estate = estate_with_debts(size, cash);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &estate, |b, estate| {
            b.iter_batched(
                || estate.clone(),
                |mut estate| estate.execute_waterfall(kes(cash), &actor).unwrap(),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_plan, bench_execute);
criterion_main!(benches);
