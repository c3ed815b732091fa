//! Orders merged scan results by similarity to the query.

use std::cmp::Ordering;

use crate::query::{Query, RankingTerm, TermField};
use crate::record::AttachmentRecord;
use crate::util::similarity::SimilarityMatcher;

/// A record paired with its ranking score.
#[derive(Debug, Clone)]
pub struct ScoredRecord {
    pub score: f64,
    pub record: AttachmentRecord,
}

/// Sorts records by whole-string similarity of the ranking term to the
/// matching field, best first.
///
/// Ties fall back to `created_at`, newest first. Queries without a text term
/// leave the input order untouched.
#[derive(Debug, Default, Clone, Copy)]
pub struct RankingMerger;

impl RankingMerger {
    pub fn new() -> Self {
        RankingMerger
    }

    /// Rank records in place.
    pub fn rank(&self, query: &Query, records: &mut Vec<AttachmentRecord>) {
        let Some(term) = query.ranking_term() else {
            return;
        };
        let scored = self.score(term, std::mem::take(records));
        records.extend(scored.into_iter().map(|s| s.record));
    }

    /// Score and sort records against a ranking term.
    ///
    /// Each score is computed once, not on every comparison.
    pub fn score(&self, term: RankingTerm<'_>, records: Vec<AttachmentRecord>) -> Vec<ScoredRecord> {
        let matcher = SimilarityMatcher::new(term.term);
        let mut scored: Vec<ScoredRecord> = records
            .into_iter()
            .map(|record| {
                let field = match term.field {
                    TermField::Filename => &record.filename,
                    TermField::Content => &record.content,
                };
                ScoredRecord {
                    score: matcher.ratio(field),
                    record,
                }
            })
            .collect();

        scored.sort_by(compare);
        scored
    }
}

fn compare(a: &ScoredRecord, b: &ScoredRecord) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.record.created_at.cmp(&a.record.created_at))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ObjectId;
    use crate::source::{ChannelId, MessageId, UserId};
    use chrono::{DateTime, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn record(id: &str, filename: &str, content: &str, secs: i64) -> AttachmentRecord {
        AttachmentRecord {
            object_id: ObjectId::from(id),
            filename: filename.to_string(),
            content_type: None,
            content: content.to_string(),
            channel_id: ChannelId(1),
            message_id: MessageId(1),
            author_id: UserId(1),
            created_at: t(secs),
            url: String::new(),
            jump_url: String::new(),
        }
    }

    fn filenames(records: &[AttachmentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.filename.as_str()).collect()
    }

    #[test]
    fn test_rank_by_filename_similarity() {
        let query = Query::builder().filename("report").build().unwrap();
        let mut records = vec![
            record("a", "report_final.pdf", "", 0),
            record("b", "banana.jpg", "", 0),
            record("c", "report.docx", "", 0),
        ];

        RankingMerger::new().rank(&query, &mut records);

        assert_eq!(
            filenames(&records),
            vec!["report.docx", "report_final.pdf", "banana.jpg"]
        );
    }

    #[test]
    fn test_rank_by_content_term() {
        let query = Query::builder().content("budget").build().unwrap();
        let mut records = vec![
            record("a", "x.pdf", "random chatter", 0),
            record("b", "y.pdf", "budget", 0),
        ];

        RankingMerger::new().rank(&query, &mut records);

        assert_eq!(filenames(&records), vec!["y.pdf", "x.pdf"]);
    }

    #[test]
    fn test_ties_are_newest_first() {
        let query = Query::builder().filename("plan").build().unwrap();
        let mut records = vec![
            record("a", "plan.txt", "", 10),
            record("b", "plan.txt", "", 30),
            record("c", "plan.txt", "", 20),
        ];

        RankingMerger::new().rank(&query, &mut records);

        let ids: Vec<_> = records.iter().map(|r| r.object_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn test_no_text_term_keeps_order() {
        let query = Query::builder().author(UserId(1)).build().unwrap();
        let mut records = vec![
            record("a", "zzz", "", 0),
            record("b", "aaa", "", 5),
        ];

        RankingMerger::new().rank(&query, &mut records);

        assert_eq!(filenames(&records), vec!["zzz", "aaa"]);
    }
}
