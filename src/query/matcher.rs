//! Decides whether attachments satisfy a query.

use crate::query::Query;
use crate::record::AttachmentRecord;
use crate::source::Message;
use crate::util::similarity::SimilarityMatcher;

/// A query compiled for repeated matching.
///
/// Text terms are normalized once. Every constraint must hold for a record
/// to match; text terms must reach `threshold` partial similarity on the
/// 0–100 scale.
#[derive(Debug, Clone)]
pub struct MatchPredicate<'q> {
    query: &'q Query,
    threshold: f64,
    filename: Option<SimilarityMatcher>,
    content: Option<SimilarityMatcher>,
    custom_file_type: Option<SimilarityMatcher>,
}

impl<'q> MatchPredicate<'q> {
    /// Compile a query with the given similarity threshold.
    pub fn new(query: &'q Query, threshold: f64) -> Self {
        MatchPredicate {
            query,
            threshold,
            filename: query.filename().map(SimilarityMatcher::new),
            content: query.content().map(SimilarityMatcher::new),
            custom_file_type: query.custom_file_type().map(SimilarityMatcher::new),
        }
    }

    pub fn query(&self) -> &'q Query {
        self.query
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Check one record against every constraint of the query.
    pub fn matches(&self, record: &AttachmentRecord) -> bool {
        let query = self.query;

        if query.is_banned(&record.object_id) {
            return false;
        }
        if query.excluded_author() == Some(record.author_id) {
            return false;
        }
        if query.after().is_some_and(|after| record.created_at < after) {
            return false;
        }
        if query.before().is_some_and(|before| record.created_at > before) {
            return false;
        }
        if query.author().is_some_and(|author| author != record.author_id) {
            return false;
        }
        if let Some(file_type) = query.file_type() {
            if record.content_type.as_deref() != Some(file_type) {
                return false;
            }
        }
        if let Some(matcher) = &self.filename {
            if !matcher.is_match(&record.filename, self.threshold) {
                return false;
            }
        }
        if let Some(matcher) = &self.content {
            if !matcher.is_match(&record.content, self.threshold) {
                return false;
            }
        }
        if let Some(matcher) = &self.custom_file_type {
            if !matcher.is_match(&record.filename, self.threshold) {
                return false;
            }
        }
        true
    }

    /// Records for every attachment of `message` that matches.
    pub fn matching_records(&self, message: &Message) -> Vec<AttachmentRecord> {
        if message.attachments.is_empty()
            || self.query.excluded_author() == Some(message.author_id)
        {
            return Vec::new();
        }
        AttachmentRecord::from_message(message)
            .into_iter()
            .filter(|record| self.matches(record))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ObjectId;
    use crate::source::{Attachment, AttachmentId, ChannelId, MessageId, UserId};
    use chrono::{DateTime, TimeZone, Utc};

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn attachment(id: u64, filename: &str, content_type: Option<&str>) -> Attachment {
        Attachment {
            id: AttachmentId(id),
            filename: filename.to_string(),
            content_type: content_type.map(str::to_string),
            url: format!("https://cdn.example/{id}"),
        }
    }

    fn message(author: u64, secs: i64, content: &str, attachments: Vec<Attachment>) -> Message {
        Message {
            id: MessageId(100),
            channel_id: ChannelId(1),
            author_id: UserId(author),
            created_at: t(secs),
            content: content.to_string(),
            attachments,
            jump_url: String::new(),
        }
    }

    fn invoice_message() -> Message {
        message(
            7,
            50,
            "here is the march invoice",
            vec![
                attachment(1, "invoice_march.pdf", Some("application/pdf")),
                attachment(2, "holiday.png", Some("image/png")),
            ],
        )
    }

    fn filenames(records: &[AttachmentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.filename.as_str()).collect()
    }

    #[test]
    fn test_filename_term() {
        let query = Query::builder().filename("invoice").build().unwrap();
        let predicate = MatchPredicate::new(&query, 85.0);

        let records = predicate.matching_records(&invoice_message());
        assert_eq!(filenames(&records), vec!["invoice_march.pdf"]);
    }

    #[test]
    fn test_content_term_applies_to_every_attachment() {
        let query = Query::builder().content("MARCH INVOICE").build().unwrap();
        let predicate = MatchPredicate::new(&query, 85.0);

        assert_eq!(predicate.matching_records(&invoice_message()).len(), 2);
    }

    #[test]
    fn test_file_type_is_exact() {
        let query = Query::builder().file_type("image/png").build().unwrap();
        let predicate = MatchPredicate::new(&query, 85.0);
        assert_eq!(
            filenames(&predicate.matching_records(&invoice_message())),
            vec!["holiday.png"]
        );

        let query = Query::builder().file_type("image").build().unwrap();
        let predicate = MatchPredicate::new(&query, 85.0);
        assert!(predicate.matching_records(&invoice_message()).is_empty());
    }

    #[test]
    fn test_custom_file_type_is_fuzzy_on_filename() {
        let query = Query::builder().custom_file_type("pdf").build().unwrap();
        let predicate = MatchPredicate::new(&query, 75.0);
        assert_eq!(
            filenames(&predicate.matching_records(&invoice_message())),
            vec!["invoice_march.pdf"]
        );
    }

    #[test]
    fn test_time_bounds_are_inclusive() {
        let query = Query::builder()
            .after(t(50))
            .before(t(50))
            .build()
            .unwrap();
        let predicate = MatchPredicate::new(&query, 85.0);
        assert_eq!(predicate.matching_records(&invoice_message()).len(), 2);

        let query = Query::builder().after(t(51)).build().unwrap();
        let predicate = MatchPredicate::new(&query, 85.0);
        assert!(predicate.matching_records(&invoice_message()).is_empty());

        let query = Query::builder().before(t(49)).build().unwrap();
        let predicate = MatchPredicate::new(&query, 85.0);
        assert!(predicate.matching_records(&invoice_message()).is_empty());
    }

    #[test]
    fn test_author_filters() {
        let query = Query::builder().author(UserId(8)).build().unwrap();
        assert!(
            MatchPredicate::new(&query, 85.0)
                .matching_records(&invoice_message())
                .is_empty()
        );

        let query = Query::builder()
            .filename("invoice")
            .excluded_author(UserId(7))
            .build()
            .unwrap();
        assert!(
            MatchPredicate::new(&query, 85.0)
                .matching_records(&invoice_message())
                .is_empty()
        );
    }

    #[test]
    fn test_banned_ids_never_match() {
        let banned = ObjectId::compose(ChannelId(1), MessageId(100), AttachmentId(1));
        let query = Query::builder()
            .filename("invoice")
            .banned_ids([banned])
            .build()
            .unwrap();
        let predicate = MatchPredicate::new(&query, 85.0);

        assert!(predicate.matching_records(&invoice_message()).is_empty());
    }

    #[test]
    fn test_constraints_are_conjunctive() {
        let query = Query::builder()
            .filename("invoice")
            .file_type("image/png")
            .build()
            .unwrap();
        let predicate = MatchPredicate::new(&query, 85.0);

        assert!(predicate.matching_records(&invoice_message()).is_empty());
    }

    #[test]
    fn test_threshold_is_configurable() {
        let query = Query::builder().filename("invoyce").build().unwrap();
        let message = invoice_message();

        assert!(MatchPredicate::new(&query, 95.0).matching_records(&message).is_empty());
        assert_eq!(MatchPredicate::new(&query, 80.0).matching_records(&message).len(), 1);
    }
}
