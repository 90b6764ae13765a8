// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Benchmark for the trailing-streak walk.
//!
//! The streak is recomputed from raw completion history on every
//! eligibility check, so the walk is the engine's hot pure function.

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pawsteps::models::GoalCompletion;
use pawsteps::services::trailing_streak;
use pawsteps::time_utils::date_key;

fn completions_ending(today: NaiveDate, days: usize, gap_every: Option<usize>) -> Vec<GoalCompletion> {
    let mut rows = Vec::with_capacity(days);
    let mut date = today;
    for i in 0..days {
        let skip = gap_every.map(|n| i % n == n - 1).unwrap_or(false);
        if !skip {
            rows.push(GoalCompletion {
                user_id: "bench-user".to_string(),
                completion_date: date_key(date),
                steps_achieved: 12_000,
                goal_steps: 10_000,
                goal_met: true,
            });
        }
        date = date.pred_opt().unwrap();
    }
    rows
}

fn bench_trailing_streak(c: &mut Criterion) {
    let today = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();

    let unbroken_year = completions_ending(today, 365, None);
    let gappy_year = completions_ending(today, 365, Some(10));

    let mut group = c.benchmark_group("streak_walk");

    group.bench_function("year_unbroken", |b| {
        b.iter(|| trailing_streak(black_box(today), black_box(&unbroken_year)))
    });

    group.bench_function("year_with_gaps", |b| {
        b.iter(|| trailing_streak(black_box(today), black_box(&gappy_year)))
    });

    group.finish();
}

criterion_group!(benches, bench_trailing_streak);
criterion_main!(benches);
