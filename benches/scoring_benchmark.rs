use criterion::{black_box, criterion_group, criterion_main, Criterion};
use focusflow::models::focus_state::{activity_delta, clamp_score, score_trend};
use focusflow::models::gamification::next_streak;

fn benchmark_score_pipeline(c: &mut Criterion) {
    // A year of half-hourly pings with a mixed idle profile.
    let idles: Vec<i64> = (0..17_520).map(|i| (i * 37) % 900).collect();

    let mut group = c.benchmark_group("scoring");

    group.bench_function("ping_replay", |b| {
        b.iter(|| {
            let mut score = 80;
            for idle in &idles {
                score = clamp_score(score + activity_delta(black_box(*idle), idle % 5 == 0));
            }
            score
        })
    });

    let points: Vec<i64> = idles.iter().map(|i| (i % 101)).collect();
    group.bench_function("trend_window", |b| {
        b.iter(|| score_trend(black_box(&points[points.len() - 12..])))
    });

    group.bench_function("streak_replay", |b| {
        let start: chrono::NaiveDate = "2025-01-01".parse().unwrap();
        b.iter(|| {
            let mut streak = 0;
            let mut last = None;
            for offset in 0..365u64 {
                // Skip every seventh day to exercise the reset branch.
                if offset % 7 == 6 {
                    continue;
                }
                let today = start + chrono::Days::new(offset);
                streak = next_streak(black_box(last), today, streak);
                last = Some(today);
            }
            streak
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_score_pipeline);
criterion_main!(benches);
