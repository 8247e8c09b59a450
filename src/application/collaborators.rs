//! Downstream collaborator interfaces
//!
//! The analysis pipeline behind the acquisition engine - sentiment/topic
//! classification, embedding, and report rendering - is consumed through
//! these traits. The engine only promises them an ordered list of
//! normalized reviews; their internals live elsewhere.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::Review;

/// Sentiment bucket assigned by the classification capability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

/// Structured label set for one review text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewLabel {
    pub sentiment: Sentiment,
    pub topics: Vec<String>,
}

/// Black-box text classification: one label set per input text, in order.
#[async_trait]
pub trait ReviewClassifier: Send + Sync {
    async fn classify(&self, texts: &[String]) -> anyhow::Result<Vec<ReviewLabel>>;
}

/// Black-box embedding: one vector per input text, in order.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Renders analyzed reviews into a downloadable artifact.
#[async_trait]
pub trait ReportRenderer: Send + Sync {
    async fn render(&self, reviews: &[Review], labels: &[ReviewLabel]) -> anyhow::Result<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct KeywordClassifier;

    #[async_trait]
    impl ReviewClassifier for KeywordClassifier {
        async fn classify(&self, texts: &[String]) -> anyhow::Result<Vec<ReviewLabel>> {
            Ok(texts
                .iter()
                .map(|text| ReviewLabel {
                    sentiment: if text.contains("great") {
                        Sentiment::Positive
                    } else {
                        Sentiment::Neutral
                    },
                    topics: Vec::new(),
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn classifier_returns_one_label_per_text_in_order() {
        let classifier = KeywordClassifier;
        let texts = vec!["great value".to_string(), "arrived late".to_string()];

        let labels = classifier.classify(&texts).await.unwrap();
        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].sentiment, Sentiment::Positive);
        assert_eq!(labels[1].sentiment, Sentiment::Neutral);
    }
}
