//! Criterion benchmarks for filesift.
//!
//! Covers the hot paths of a scan:
//! - Fuzzy similarity scoring
//! - Query matching over message batches
//! - Ranking of merged results

use chrono::{TimeZone, Utc};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use filesift::query::{MatchPredicate, Query};
use filesift::record::AttachmentRecord;
use filesift::scan::RankingMerger;
use filesift::source::{Attachment, AttachmentId, ChannelId, Message, MessageId, UserId};
use filesift::util::similarity::{SimilarityMatcher, partial_ratio, ratio};
use std::hint::black_box;

/// Generate filenames for benchmarking.
fn generate_filenames(count: usize) -> Vec<String> {
    let stems = [
        "invoice", "report", "minutes", "budget", "design", "roadmap", "contract", "receipt",
        "screenshot", "notes", "summary", "slides",
    ];
    let extensions = ["pdf", "docx", "png", "xlsx", "txt"];

    (0..count)
        .map(|i| {
            let stem = stems[(i * 7) % stems.len()];
            let ext = extensions[(i * 13) % extensions.len()];
            format!("{stem}_{}_{i}.{ext}", 2020 + i % 5)
        })
        .collect()
}

/// Generate messages carrying one attachment each.
fn generate_messages(count: usize) -> Vec<Message> {
    generate_filenames(count)
        .into_iter()
        .enumerate()
        .map(|(i, filename)| Message {
            id: MessageId(i as u64),
            channel_id: ChannelId((i % 8) as u64),
            author_id: UserId((i % 5) as u64),
            created_at: Utc.timestamp_opt(1_700_000_000 + i as i64, 0).unwrap(),
            content: format!("sharing {filename} for review"),
            attachments: vec![Attachment {
                id: AttachmentId(i as u64),
                filename,
                content_type: Some("application/pdf".to_string()),
                url: String::new(),
            }],
            jump_url: String::new(),
        })
        .collect()
}

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");
    let filenames = generate_filenames(1000);

    group.bench_function("ratio_single", |b| {
        b.iter(|| black_box(ratio(black_box("invoice"), black_box("invoice_march_2024.pdf"))))
    });

    group.bench_function("partial_ratio_single", |b| {
        b.iter(|| {
            black_box(partial_ratio(
                black_box("invoice"),
                black_box("invoice_march_2024.pdf"),
            ))
        })
    });

    group.throughput(Throughput::Elements(1000));
    group.bench_function("matcher_batch", |b| {
        let matcher = SimilarityMatcher::new("invoice");
        b.iter(|| {
            let matched = filenames
                .iter()
                .filter(|name| matcher.is_match(black_box(name), 85.0))
                .count();
            black_box(matched)
        })
    });

    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");
    let messages = generate_messages(1000);
    let query = Query::builder()
        .filename("report")
        .custom_file_type("pdf")
        .build()
        .unwrap();

    group.throughput(Throughput::Elements(1000));
    group.bench_function("predicate_over_messages", |b| {
        let predicate = MatchPredicate::new(&query, 85.0);
        b.iter(|| {
            let matched: usize = messages
                .iter()
                .map(|message| predicate.matching_records(black_box(message)).len())
                .sum();
            black_box(matched)
        })
    });

    group.finish();
}

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");
    let records: Vec<AttachmentRecord> = generate_messages(500)
        .iter()
        .flat_map(AttachmentRecord::from_message)
        .collect();
    let query = Query::builder().filename("budget").build().unwrap();
    let merger = RankingMerger::new();

    group.throughput(Throughput::Elements(500));
    group.bench_function("rank_records", |b| {
        b.iter(|| {
            let mut batch = records.clone();
            merger.rank(&query, &mut batch);
            black_box(batch)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_similarity, bench_matching, bench_ranking);
criterion_main!(benches);
