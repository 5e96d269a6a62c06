// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn records_calls_in_order() {
    let mux = FakeMuxAdapter::new();
    mux.set_tail("%0", "❯ ");

    mux.send_literal(&PaneId::new("%0"), "hi").await.unwrap();
    mux.send_key(&PaneId::new("%0"), "Enter").await.unwrap();
    let tail = mux.capture_tail(&PaneId::new("%0"), 5).await.unwrap();

    assert_eq!(tail, "❯ ");
    assert_eq!(
        mux.calls(),
        vec![
            MuxCall::SendLiteral {
                pane: "%0".into(),
                text: "hi".into()
            },
            MuxCall::SendKey {
                pane: "%0".into(),
                key: "Enter".into()
            },
            MuxCall::CaptureTail {
                pane: "%0".into(),
                lines: 5
            },
        ]
    );
}

#[tokio::test]
async fn capture_of_unknown_pane_fails() {
    let mux = FakeMuxAdapter::new();
    assert!(matches!(
        mux.capture_tail(&PaneId::new("%9"), 5).await,
        Err(MuxError::NotFound(_))
    ));
}

#[tokio::test]
async fn sent_texts_interleaves_paste_and_literal() {
    let mux = FakeMuxAdapter::new();
    mux.paste(&PaneId::new("%1"), "b", "one").await.unwrap();
    mux.send_literal(&PaneId::new("%1"), "two").await.unwrap();
    mux.send_literal(&PaneId::new("%2"), "other").await.unwrap();

    assert_eq!(mux.sent_texts("%1"), vec!["one".to_string(), "two".to_string()]);
}
