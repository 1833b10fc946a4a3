use std::{sync::Arc, time::Duration};

use chrono::Utc;
use hlc_shared::lifecycle::Lifecycle;
use tokio::{sync::Mutex, task::JoinHandle, time::MissedTickBehavior};

/// Publishes due scheduled articles every `every`.
pub fn spawn_schedule_sweeper(lifecycle: Arc<Mutex<Lifecycle>>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            sweep_once(&lifecycle).await;
        }
    })
}

/// One sweep; failures are logged and retried on the next tick.
pub async fn sweep_once(lifecycle: &Mutex<Lifecycle>) -> usize {
    match lifecycle.lock().await.publish_due(Utc::now()) {
        Ok(published) => {
            for article in &published {
                tracing::info!(id = %article.id, slug = %article.slug, "scheduled article went live");
            }
            published.len()
        },
        Err(err) => {
            tracing::error!("schedule sweep failed: {err}");
            0
        },
    }
}

#[cfg(test)]
mod tests {
    use hlc_shared::{
        content_store::ContentStore, local_store::LocalStore, Article, ArticleStatus,
    };

    use super::*;

    fn lifecycle() -> Arc<Mutex<Lifecycle>> {
        let store = ContentStore::load(LocalStore::in_memory()).expect("store");
        Arc::new(Mutex::new(Lifecycle::new(store)))
    }

    #[tokio::test]
    async fn sweep_publishes_only_due_articles() {
        let lifecycle = lifecycle();
        {
            let mut guard = lifecycle.lock().await;
            guard
                .schedule(Article::new("Now", "<p>a</p>"), Utc::now())
                .expect("due");
            guard
                .schedule(
                    Article::new("Next week", "<p>b</p>"),
                    Utc::now() + chrono::Duration::days(7),
                )
                .expect("future");
        }

        assert_eq!(sweep_once(&lifecycle).await, 1);
        let guard = lifecycle.lock().await;
        assert_eq!(guard.store().partition(ArticleStatus::Published).len(), 1);
        assert_eq!(guard.store().partition(ArticleStatus::Scheduled).len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_runs_on_its_interval() {
        let lifecycle = lifecycle();
        let handle = spawn_schedule_sweeper(lifecycle.clone(), Duration::from_secs(30));
        lifecycle
            .lock()
            .await
            .schedule(Article::new("Soon", "<p>a</p>"), Utc::now())
            .expect("schedule");

        tokio::time::sleep(Duration::from_secs(31)).await;
        tokio::task::yield_now().await;
        handle.abort();

        let guard = lifecycle.lock().await;
        assert_eq!(guard.store().partition(ArticleStatus::Published).len(), 1);
    }
}
