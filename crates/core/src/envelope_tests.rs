// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::role::Target;

fn envelope() -> Envelope {
    Envelope {
        msg_id: MsgId::new("msg-aaaa0000"),
        ts: "2026-01-01T00:00:00Z".into(),
        project_id: None,
        from: Role::new("oc"),
        to: Target::Role(Role::new("cc")),
        kind: Kind::Chat,
        priority: PRIORITY_NORMAL,
        thread_id: None,
        payload: "hi".into(),
        ephemeral: false,
    }
}

#[test]
fn validate_accepts_complete_envelope() {
    assert!(envelope().validate().is_ok());
}

#[yare::parameterized(
    empty_from   = { |e: &mut Envelope| e.from = Role::new(""), "from" },
    empty_to     = { |e: &mut Envelope| e.to = Target::Role(Role::new("")), "to" },
    empty_msg_id = { |e: &mut Envelope| e.msg_id = MsgId::new(""), "msg_id" },
)]
fn validate_rejects_missing(mutate: fn(&mut Envelope), field: &str) {
    let mut env = envelope();
    mutate(&mut env);
    assert_eq!(env.validate(), Err(EnvelopeError::Missing(field)));
}

#[yare::parameterized(
    bare_slash      = { "/health-check", true },
    leading_spaces  = { "  /exit", true },
    chat            = { "hello /world", false },
    empty           = { "", false },
)]
fn slash_command_detection(payload: &str, expected: bool) {
    let mut env = envelope();
    env.payload = payload.into();
    assert_eq!(env.is_slash_command(), expected);
}

#[test]
fn clone_for_reassigns_target_and_msg_id() {
    let env = envelope();
    let clone = env.clone_for(Role::new("cx"));
    assert_eq!(clone.to, Target::Role(Role::new("cx")));
    assert_ne!(clone.msg_id, env.msg_id);
    assert_eq!(clone.payload, env.payload);
    assert_eq!(clone.from, env.from);
}

#[test]
fn kind_parse_round_trips() {
    for kind in [
        Kind::Chat,
        Kind::Command,
        Kind::Event,
        Kind::Ack,
        Kind::Nag,
        Kind::CheckpointRequest,
        Kind::CheckpointContent,
        Kind::CheckpointAck,
    ] {
        assert_eq!(Kind::parse(kind.as_str()), Some(kind));
    }
    assert_eq!(Kind::parse("bogus"), None);
}

#[test]
fn kind_serde_uses_snake_case() {
    let json = serde_json::to_string(&Kind::CheckpointRequest).unwrap();
    assert_eq!(json, "\"checkpoint_request\"");
}
