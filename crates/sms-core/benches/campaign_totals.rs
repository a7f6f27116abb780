//! Pricing and aggregation benchmark

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sms_core::domain::services::TemplateContext;
use sms_core::{aggregate, normalize, price_line, render, MarginMode, PricingLine};

fn lines(count: usize) -> Vec<PricingLine> {
    (0..count)
        .map(|i| {
            let mut line = PricingLine::new_row()
                .with_customer(format!("CUST-{}", i % 250))
                .with_base_rate(Decimal::from(10 + i % 90))
                .with_qty(Decimal::from(1 + i % 5));
            if i % 3 == 0 {
                line.set_margin_mode(MarginMode::Amount);
                line.margin_amount = dec!(2.5);
            }
            line.reprice();
            line
        })
        .collect()
}

fn pricing_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("pricing");

    let percentage = PricingLine::new_row().with_base_rate(dec!(9.99)).with_qty(dec!(3));
    group.bench_function("price_line", |b| b.iter(|| black_box(price_line(black_box(&percentage)))));

    group.bench_function("normalize_phone", |b| {
        b.iter(|| black_box(normalize(black_box("06 12-34.56 78"), "+33")))
    });

    let context: TemplateContext = [("customer_name", "Ana"), ("item_name", "Widget"), ("final_price", "120.00")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    group.bench_function("render_template", |b| {
        b.iter(|| black_box(render(black_box(sms_core::DEFAULT_CAMPAIGN_TEMPLATE), &context)))
    });

    group.finish();
}

fn aggregation_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregate");

    for size in [10, 100, 1000, 10000].iter() {
        let campaign = lines(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &campaign, |b, campaign| {
            b.iter(|| black_box(aggregate(black_box(campaign), dec!(0.10))))
        });
    }

    group.finish();
}

criterion_group!(benches, pricing_benchmark, aggregation_benchmark);
criterion_main!(benches);
