use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use searchbot::dispatcher::{BotContext, Dispatcher, HELP_TEXT};
use searchbot::error::BotError;
use searchbot::fetcher::SearchFetcher;
use searchbot::poller::Poller;

mod common;
use common::{FakeChatClient, text_update};

fn dispatcher(client: Arc<FakeChatClient>) -> Arc<Dispatcher> {
    let fetcher = SearchFetcher::new("http://127.0.0.1:9/search?q=", Duration::from_secs(1)).unwrap();
    Arc::new(Dispatcher::new(Arc::new(BotContext::new(client, fetcher)), 1, 1))
}

#[tokio::test]
async fn test_poll_once_advances_offset() {
    let client = Arc::new(FakeChatClient::new());
    client.push_updates(Ok(vec![
        text_update(40, 1, "/start"),
        text_update(41, 2, "/start"),
    ]));
    client.push_updates(Ok(vec![]));
    let mut poller = Poller::new(dispatcher(client.clone())).with_timeout(0);

    assert_eq!(poller.poll_once().await.unwrap(), 2);
    assert_eq!(poller.offset(), 42);
    assert_eq!(poller.poll_once().await.unwrap(), 0);
    assert_eq!(poller.offset(), 42);

    assert_eq!(client.requested_offsets(), vec![0, 42]);
    let sent = client.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|m| m.text == HELP_TEXT));
}

#[tokio::test]
async fn test_run_survives_errors_and_stops_on_cancel() {
    let client = Arc::new(FakeChatClient::new());
    client.push_updates(Err(BotError::Transport("connection reset".into())));
    client.push_updates(Ok(vec![text_update(1, 9, "/start")]));
    let poller = Poller::new(dispatcher(client.clone()))
        .with_timeout(0)
        .with_error_backoff(Duration::from_millis(10));

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(poller.run(cancel.clone()));

    for _ in 0..100 {
        if !client.sent().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("poller did not stop")
        .unwrap();

    assert_eq!(client.sent().len(), 1);
    let offsets = client.requested_offsets();
    assert_eq!(&offsets[..2], &[0, 0]);
    assert!(offsets[2..].iter().all(|&o| o == 2));
}
