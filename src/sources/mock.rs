//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{Provider, Record, SearchQuery};
use crate::sources::{Source, SourceCapabilities, SourceError};

#[derive(Debug, Clone)]
enum Scripted {
    Records(Vec<Record>),
    Status(u16),
    Failure(String),
}

/// A mock source that stands in for one provider and returns a scripted
/// outcome for every search.
#[derive(Debug)]
pub struct MockSource {
    provider: Provider,
    response: Mutex<Scripted>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a mock that returns no records
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            response: Mutex::new(Scripted::Records(Vec::new())),
            delay: Mutex::new(None),
            calls: AtomicUsize::new(0),
        }
    }

    /// Mock returning the given records
    pub fn with_records(provider: Provider, records: Vec<Record>) -> Self {
        let mock = Self::new(provider);
        mock.set_records(records);
        mock
    }

    /// Mock failing with an HTTP status
    pub fn failing(provider: Provider, status: u16) -> Self {
        let mock = Self::new(provider);
        mock.set_status(status);
        mock
    }

    pub fn set_records(&self, records: Vec<Record>) {
        *self.response.lock().unwrap_or_else(|e| e.into_inner()) = Scripted::Records(records);
    }

    pub fn set_status(&self, status: u16) {
        *self.response.lock().unwrap_or_else(|e| e.into_inner()) = Scripted::Status(status);
    }

    pub fn set_failure(&self, message: impl Into<String>) {
        *self.response.lock().unwrap_or_else(|e| e.into_inner()) =
            Scripted::Failure(message.into());
    }

    /// Wait this long before answering
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap_or_else(|e| e.into_inner()) = Some(delay);
    }

    /// Number of searches served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn provider(&self) -> Provider {
        self.provider
    }

    fn capabilities(&self) -> SourceCapabilities {
        SourceCapabilities::SEARCH
    }

    async fn search(&self, _query: &SearchQuery) -> Result<Vec<Record>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.delay.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let scripted = self
            .response
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone();
        match scripted {
            Scripted::Records(records) => Ok(records),
            Scripted::Status(status) => Err(SourceError::Api {
                context: self.provider.name().to_string(),
                status,
            }),
            Scripted::Failure(message) => Err(SourceError::Other(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordBuilder;

    #[tokio::test]
    async fn test_scripted_responses() {
        let record = RecordBuilder::new("doaj:1", "T", Provider::Doaj).build();
        let mock = MockSource::with_records(Provider::Doaj, vec![record.clone()]);

        let records = mock.search(&SearchQuery::default()).await.unwrap();
        assert_eq!(records, vec![record]);

        mock.set_status(500);
        let err = mock.search(&SearchQuery::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "DOAJ HTTP 500");

        mock.set_failure("boom");
        assert!(mock.search(&SearchQuery::default()).await.is_err());
        assert_eq!(mock.calls(), 3);
    }
}
