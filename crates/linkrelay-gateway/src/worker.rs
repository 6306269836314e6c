use std::sync::Arc;

use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info};

use linkrelay_core::types::InboundMessage;
use linkrelay_pipeline::{process_message, PipelineContext};

/// Drain the ingress queue, processing at most `max_concurrency` messages at
/// a time. A permit is taken before a message leaves the queue, so a busy
/// pool lets the queue fill and ingress starts answering 503.
///
/// Returns once the queue is closed and every in-flight message is done.
pub async fn run<C>(ctx: Arc<C>, mut rx: mpsc::Receiver<InboundMessage>, max_concurrency: usize)
where
    C: PipelineContext + 'static,
{
    let permits = Arc::new(Semaphore::new(max_concurrency));
    info!(max_concurrency, "worker pool started");

    loop {
        let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
            break;
        };
        let Some(msg) = rx.recv().await else {
            break;
        };

        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move {
            let outcome = process_message(ctx.as_ref(), &msg).await;
            debug!(chat_id = msg.chat_id, ?outcome, "message processed");
            drop(permit);
        });
    }

    // Wait for in-flight work by taking every permit back.
    let _ = permits.acquire_many(max_concurrency as u32).await;
    info!("worker pool stopped");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;

    use linkrelay_core::types::MediaAttachment;
    use linkrelay_core::{LinkLog, SettingsStore};
    use linkrelay_pipeline::{DeliveryError, Messenger, ShortenError, Shortener};
    use linkrelay_store::{db, SqliteLinkLog, SqliteSettingsStore};

    use super::*;

    /// Tracks how many sends overlap.
    #[derive(Default)]
    struct SlowMessenger {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        sent: AtomicUsize,
    }

    #[async_trait]
    impl Messenger for SlowMessenger {
        async fn send_text(&self, _chat_id: i64, _text: &str) -> Result<(), DeliveryError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(30)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn send_media(
            &self,
            chat_id: i64,
            _media: &MediaAttachment,
            caption: Option<&str>,
        ) -> Result<(), DeliveryError> {
            self.send_text(chat_id, caption.unwrap_or("")).await
        }
    }

    struct Unreachable;

    #[async_trait]
    impl Shortener for Unreachable {
        async fn shorten(&self, _url: &str, _api_key: &str) -> Result<String, ShortenError> {
            Err(ShortenError::Timeout)
        }
    }

    struct Ctx {
        settings: SqliteSettingsStore,
        links: SqliteLinkLog,
        shortener: Unreachable,
        messenger: SlowMessenger,
    }

    impl PipelineContext for Ctx {
        fn settings(&self) -> &dyn SettingsStore {
            &self.settings
        }
        fn links(&self) -> &dyn LinkLog {
            &self.links
        }
        fn shortener(&self) -> &dyn Shortener {
            &self.shortener
        }
        fn messenger(&self) -> &dyn Messenger {
            &self.messenger
        }
    }

    fn ctx() -> Arc<Ctx> {
        let settings = db::open(":memory:").unwrap();
        db::init_db(&settings).unwrap();
        let links = db::open(":memory:").unwrap();
        db::init_db(&links).unwrap();
        Arc::new(Ctx {
            settings: SqliteSettingsStore::new(settings),
            links: SqliteLinkLog::new(links),
            shortener: Unreachable,
            messenger: SlowMessenger::default(),
        })
    }

    fn myid(chat_id: i64) -> InboundMessage {
        InboundMessage {
            chat_id,
            user_id: chat_id,
            text: Some("/myid".into()),
            ..Default::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn processes_everything_within_the_concurrency_bound() {
        let ctx = ctx();
        let (tx, rx) = mpsc::channel(32);
        for i in 0..12 {
            tx.send(myid(i)).await.unwrap();
        }
        drop(tx);

        run(Arc::clone(&ctx), rx, 3).await;

        assert_eq!(ctx.messenger.sent.load(Ordering::SeqCst), 12);
        let peak = ctx.messenger.peak.load(Ordering::SeqCst);
        assert!((1..=3).contains(&peak), "peak concurrency {peak}");
    }

    #[tokio::test]
    async fn closed_empty_queue_stops_immediately() {
        let ctx = ctx();
        let (tx, rx) = mpsc::channel::<InboundMessage>(1);
        drop(tx);
        run(Arc::clone(&ctx), rx, 2).await;
        assert_eq!(ctx.messenger.sent.load(Ordering::SeqCst), 0);
    }
}
