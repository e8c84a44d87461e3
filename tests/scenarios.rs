//! End-to-end behaviour of a dashboard session fed channel messages directly.

mod common;

use std::sync::{Arc, Mutex};

use common::{epoch_msg, frame, lifecycle, scenario_a, RecordingSink};
use epochline::stream::notice::{Notifier, TrainNotice};
use epochline::stream::ChannelEvent;
use epochline::{ConnectionState, DashError, DashboardSession, EpochRecord, Outcome};

fn session(model_id: &str) -> DashboardSession<RecordingSink> {
    DashboardSession::new(model_id, &scenario_a(), RecordingSink::default()).unwrap()
}

#[test]
fn scenario_a_initial_columns() {
    let s = session("run_a");
    let cols = &s.sink().generated[0];
    let acc = cols.iter().find(|c| c.name == "acc").unwrap();
    let loss = cols.iter().find(|c| c.name == "loss").unwrap();
    assert_eq!(loss.values, vec![Some(0.9), Some(0.5)]);
    assert_eq!(acc.values, vec![None, Some(0.7)]);
}

#[test]
fn scenario_b_and_c_merge_then_drop_unknown() {
    let mut s = session("run_a");

    let out = s.dispatch(epoch_msg(r#"{"modelId":"run_a","epochData":{"loss":0.3,"acc":0.8}}"#)).unwrap();
    assert_eq!(out, Some(Outcome::Merged { accepted: 2 }));
    assert_eq!(s.store().series("loss").unwrap(), &[Some(0.9), Some(0.5), Some(0.3)]);

    let out = s.dispatch(epoch_msg(r#"{"modelId":"run_a","epochData":{"loss":0.2,"newMetric":1.0}}"#)).unwrap();
    assert_eq!(out, Some(Outcome::Merged { accepted: 1 }));
    assert!(!s.store().contains("newMetric"));
    assert_eq!(s.store().series("loss").unwrap().len(), 4);

    // Every refresh carries the full column set.
    assert_eq!(s.sink().loads.len(), 2);
    assert_eq!(s.sink().loads[1], s.store().columns());
}

#[test]
fn scenario_d_numeric_binding_accepts_textual_target() {
    let mut s = DashboardSession::new(7u64, &scenario_a(), RecordingSink::default()).unwrap();
    let out = s.dispatch(epoch_msg(r#"{"modelId":"7","epochData":{"loss":0.3}}"#)).unwrap();
    assert_eq!(out, Some(Outcome::Merged { accepted: 1 }));
}

#[test]
fn scenario_e_missing_target_raises_and_keeps_store() {
    let mut s = session("run_a");
    let before = s.store().columns();
    let err = s.dispatch(epoch_msg(r#"{"epochData":{"loss":0.3}}"#)).unwrap_err();
    assert!(matches!(err, DashError::MissingTarget));
    assert_eq!(s.store().columns(), before);
    assert!(s.sink().loads.is_empty());

    // The session keeps working after a failed message.
    let out = s.dispatch(epoch_msg(r#"{"modelId":"run_a","epochData":{"loss":0.3}}"#)).unwrap();
    assert!(matches!(out, Some(Outcome::Merged { .. })));
}

#[test]
fn events_for_other_runs_do_not_render() {
    let mut s = session("run_a");
    let before = s.store().columns();
    for target in ["run_b", "Run_a", "run_a "] {
        let payload = format!(r#"{{"modelId":"{}","epochData":{{"loss":0.1}}}}"#, target);
        assert_eq!(s.dispatch(epoch_msg(&payload)).unwrap(), Some(Outcome::Filtered));
    }
    assert_eq!(s.store().columns(), before);
    assert!(s.sink().loads.is_empty());
}

#[test]
fn malformed_payloads_never_escape_or_mutate() {
    let mut s = session("run_a");
    let before = s.store().columns();
    for bad in ["", "null", "}{", "{\"modelId\":", "{\"modelId\":\"run_a\",\"epochData\":{\"loss\":true}}"] {
        assert_eq!(s.dispatch(epoch_msg(bad)).unwrap(), Some(Outcome::Dropped), "payload {:?}", bad);
    }
    assert_eq!(s.store().columns(), before);
}

#[test]
fn lifecycle_messages_drive_subscriber_state() {
    let mut s = session("run_a");
    let path = "/subscribe/epoch/end/";
    assert_eq!(s.subscriber().state(), ConnectionState::Disconnected);

    s.dispatch(lifecycle(path, ChannelEvent::Connecting)).unwrap();
    assert_eq!(s.subscriber().state(), ConnectionState::Connecting);
    s.dispatch(lifecycle(path, ChannelEvent::Open)).unwrap();
    assert_eq!(s.subscriber().state(), ConnectionState::Connected);
    s.dispatch(lifecycle(path, ChannelEvent::Error { reason: "reset".into(), will_retry: true })).unwrap();
    assert_eq!(s.subscriber().state(), ConnectionState::Error);

    // Other streams do not touch the epoch subscriber.
    s.dispatch(lifecycle("/subscribe/train/", ChannelEvent::Closed)).unwrap();
    assert_eq!(s.subscriber().state(), ConnectionState::Error);

    s.dispatch(lifecycle(path, ChannelEvent::Closed)).unwrap();
    assert_eq!(s.subscriber().state(), ConnectionState::Closed);
}

#[derive(Clone, Default)]
struct SharedNotices(Arc<Mutex<Vec<String>>>);

impl Notifier for SharedNotices {
    fn notify(&mut self, notice: &TrainNotice) {
        self.0.lock().unwrap().push(notice.message());
    }
}

#[test]
fn train_frames_reach_notifier_not_store() {
    let notices = SharedNotices::default();
    let mut s = session("run_a").with_notifier(notices.clone());
    let before = s.store().columns();

    let out = s.dispatch(frame("/subscribe/train/", "train", r#"{"action":"start","modelId":"run_b"}"#)).unwrap();
    assert_eq!(out, None);
    assert_eq!(*notices.0.lock().unwrap(), vec!["Started training for model run_b".to_owned()]);
    assert_eq!(s.store().columns(), before);
}

#[test]
fn epoch_frames_on_other_streams_are_not_merged() {
    let mut s = session("run_a");
    let before = s.store().columns();
    let out = s
        .dispatch(frame("/subscribe/train/", "epoch", r#"{"modelId":"run_a","epochData":{"loss":0.3}}"#))
        .unwrap();
    assert_eq!(out, None);
    assert_eq!(s.store().columns(), before);
    assert!(s.sink().loads.is_empty());
    assert_eq!(s.merged(), 0);
}

#[test]
fn series_grow_by_at_most_one_per_event() {
    let mut s = session("run_a");
    let payloads = [
        r#"{"modelId":"run_a","epochData":{"loss":0.4}}"#,
        r#"{"modelId":"run_b","epochData":{"loss":0.4,"acc":0.1}}"#,
        r#"{"modelId":"run_a","epochData":{}}"#,
        r#"{"modelId":"run_a","epochData":{"acc":0.9,"extra":3.0}}"#,
        "garbage",
    ];
    for p in payloads {
        let before: Vec<usize> = s.store().columns().iter().map(|c| c.len()).collect();
        let _ = s.dispatch(epoch_msg(p));
        let after: Vec<usize> = s.store().columns().iter().map(|c| c.len()).collect();
        for (b, a) in before.iter().zip(&after) {
            assert!(a >= b && a - b <= 1);
        }
    }
    assert_eq!(s.merged(), 3);
}

#[test]
fn double_bootstrap_is_rejected_by_store() {
    let mut store = epochline::SeriesStore::new();
    store.initialize(&scenario_a()).unwrap();
    let err = store.initialize(&[EpochRecord::new().with("loss", 0.1)]).unwrap_err();
    assert!(matches!(err, DashError::InvalidState(_)));
}
