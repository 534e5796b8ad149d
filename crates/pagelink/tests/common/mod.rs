//! Shared transfer scenarios for the integration tests.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{ensure, Context};

use pagelink::store::PageStore;
use pagelink::{ActiveSessions, PagingError, SessionId};
use pagelink_testkit::{PagingFixture, TestPayload};

/// Push `count` payloads at once, then read each back from its own session.
pub async fn concurrent_push<S: PageStore>(
    fixture: Arc<PagingFixture<S>>,
    count: u32,
    len: usize,
) -> anyhow::Result<()> {
    let mut handles = Vec::new();
    for num in 0..count {
        let fixture = Arc::clone(&fixture);
        handles.push(tokio::spawn(async move {
            let payload = TestPayload::new(num, len);
            let id = fixture
                .helper
                .send_data_paged(&payload, &fixture.receiver_address)
                .await?;
            Ok::<_, PagingError>((num, id))
        }));
    }

    let mut sessions = Vec::new();
    for handle in handles {
        sessions.push(handle.await??);
    }

    let ids: HashSet<SessionId> = sessions.iter().map(|(_, id)| *id).collect();
    ensure!(ids.len() == sessions.len(), "session ids were shared between live transfers");
    ensure!(fixture.receiver.active_sessions().receiving == count as usize);

    for (num, id) in sessions {
        let back: TestPayload = fixture
            .receiver
            .take_data_as(id)
            .await
            .with_context(|| format!("reading payload {}", num))?;
        ensure!(back == TestPayload::new(num, len), "payload {} corrupted", num);
    }

    ensure!(fixture.receiver.active_sessions() == ActiveSessions::default());
    Ok(())
}

/// Prepare `count` payloads on the sender, then pull them all at once.
pub async fn concurrent_pull<S: PageStore>(
    fixture: Arc<PagingFixture<S>>,
    count: u32,
    len: usize,
) -> anyhow::Result<()> {
    let mut sessions = Vec::new();
    for num in 0..count {
        let session = fixture
            .sender
            .prepare_data_for_paging(&TestPayload::new(num, len))
            .await?;
        sessions.push((num, session));
    }
    ensure!(fixture.sender.active_sessions().requested == count as usize);

    let mut handles = Vec::new();
    for (num, session) in sessions.iter().cloned() {
        let fixture = Arc::clone(&fixture);
        handles.push(tokio::spawn(async move {
            let back: TestPayload = fixture.helper.get_paged_results(&session).await?;
            Ok::<_, PagingError>((num, back))
        }));
    }

    for handle in handles {
        let (num, back) = handle.await??;
        ensure!(back == TestPayload::new(num, len), "payload {} corrupted", num);
    }

    // Every notify freed its session; repeating them changes nothing.
    ensure!(fixture.sender.active_sessions() == ActiveSessions::default());
    for (_, session) in &sessions {
        fixture
            .sender
            .notify_paging_session_complete(session.session_id)
            .await?;
    }
    ensure!(fixture.sender.active_sessions() == ActiveSessions::default());
    Ok(())
}
