//! Single-slot handoff carrying completion results into the render loop.
//!
//! Backed by a bounded tokio mpsc of capacity one: a second delivery waits
//! until the loop has taken the first.

use tokio::sync::mpsc;

use chatterm_core::CompletionResult;

/// Create a connected sender/receiver pair.
pub fn response_channel() -> (ResponseSender, ResponseReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (ResponseSender { tx }, ResponseReceiver { rx })
}

#[derive(Debug, Clone)]
pub struct ResponseSender {
    tx: mpsc::Sender<CompletionResult>,
}

impl ResponseSender {
    /// Hand a result to the loop. Returns `false` if the loop has gone away.
    pub async fn deliver(&self, result: CompletionResult) -> bool {
        self.tx.send(result).await.is_ok()
    }
}

#[derive(Debug)]
pub struct ResponseReceiver {
    rx: mpsc::Receiver<CompletionResult>,
}

impl ResponseReceiver {
    /// Wait for the next delivery. Cancel-safe, so it can sit in a `select!`.
    pub async fn recv(&mut self) -> Option<CompletionResult> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatterm_core::Message;
    use std::time::Duration;

    #[tokio::test]
    async fn deliveries_arrive_in_order() {
        let (tx, mut rx) = response_channel();
        let producer = tokio::spawn(async move {
            assert!(tx.deliver(CompletionResult::Failed("first".into())).await);
            assert!(
                tx.deliver(CompletionResult::Reply(Message::assistant("second")))
                    .await
            );
        });

        assert_eq!(
            rx.recv().await,
            Some(CompletionResult::Failed("first".into()))
        );
        assert_eq!(
            rx.recv().await,
            Some(CompletionResult::Reply(Message::assistant("second")))
        );
        producer.await.unwrap();
    }

    #[tokio::test]
    async fn second_delivery_waits_for_the_slot() {
        let (tx, mut rx) = response_channel();
        assert!(tx.deliver(CompletionResult::Failed("one".into())).await);

        let blocked = tokio::time::timeout(
            Duration::from_millis(50),
            tx.deliver(CompletionResult::Failed("two".into())),
        )
        .await;
        assert!(blocked.is_err(), "slot should be occupied");

        assert_eq!(rx.recv().await, Some(CompletionResult::Failed("one".into())));
        // The abandoned second delivery never reached the slot.
        let nothing_more = tokio::time::timeout(Duration::from_millis(20), rx.recv()).await;
        assert!(nothing_more.is_err());
    }

    #[tokio::test]
    async fn deliver_reports_closed_loop() {
        let (tx, rx) = response_channel();
        drop(rx);
        assert!(!tx.deliver(CompletionResult::Failed("late".into())).await);
    }
}
