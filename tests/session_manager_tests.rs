//! Session manager and control client behaviour over scripted tmux transcripts.

mod common;

use common::{
    RecordingChannel, client_with_windows, connected_client, feed, reply, reply_error, test_config,
};
use par_term_tmux::{
    CommandKind, CommandReply, ControlClient, LayoutNode, Notification, SessionEvent,
    SessionManager, SessionState, SplitAxis, TmuxCommand, TmuxConfig, TmuxError,
    tmux_kill_pane_command, tmux_split_command,
};
use tokio::sync::mpsc;
use winit::keyboard::{Key, ModifiersState, NamedKey};

#[test]
fn test_bootstrap_after_session_changed() {
    let client = connected_client();
    assert_eq!(client.state(), SessionState::Connected);
    assert_eq!(
        client.channel().sent,
        vec![
            "list-windows -F '#{window_id}\t#{pane_id}\t#{window_name}'".to_string(),
            "list-sessions".to_string(),
        ]
    );
    // The handshake block had no pending command and must not consume one
    assert_eq!(client.manager().pending_count(), 2);
}

#[test]
fn test_bootstrap_honours_config() {
    let config = TmuxConfig {
        window_size_smallest: true,
        initial_client_size: Some((120, 40)),
        ..test_config()
    };
    let mut client = ControlClient::new(RecordingChannel::default(), config);
    feed(&mut client, &["%session-changed $0 work"]);
    assert_eq!(
        client.channel().sent[..2],
        [
            "set-option -g window-size smallest".to_string(),
            "refresh-client -C 120x40".to_string(),
        ]
    );
    assert_eq!(client.manager().pending_count(), 4);
}

#[test]
fn test_bootstrap_waits_for_open_block() {
    let mut client = ControlClient::new(RecordingChannel::default(), test_config());
    feed(
        &mut client,
        &["%begin 1700000000 1 0", "%session-changed $1 main"],
    );
    assert!(client.channel().sent.is_empty());

    feed(&mut client, &["%end 1700000000 1 0"]);
    assert_eq!(client.channel().sent.len(), 2);
    assert_eq!(client.manager().pending_count(), 2);
}

#[test]
fn test_commands_before_attach_wait_for_bootstrap() {
    let mut client = ControlClient::new(RecordingChannel::default(), test_config());
    let mut early = client.resize(120, 40).unwrap();
    assert!(client.channel().sent.is_empty());
    assert_eq!(client.manager().deferred_count(), 1);

    // tmux answers its own launch command before announcing the session
    feed(
        &mut client,
        &[
            "%begin 1700000000 100 0",
            "%end 1700000000 100 0",
            "%session-changed $0 main",
        ],
    );
    assert!(early.try_result().is_none());
    assert_eq!(client.manager().deferred_count(), 0);
    assert_eq!(
        client.channel().sent,
        vec![
            "list-windows -F '#{window_id}\t#{pane_id}\t#{window_name}'".to_string(),
            "list-sessions".to_string(),
            "refresh-client -C 120x40".to_string(),
        ]
    );

    let events = reply(&mut client, 101, &["@0\t%0\tbash", "@1\t%1\tvim"]);
    let created = events
        .iter()
        .filter(|event| matches!(event, SessionEvent::TabCreated { .. }))
        .count();
    assert_eq!(created, 2);
    assert_eq!(client.manager().windows().len(), 2);
    assert_eq!(client.manager().tabs().len(), 2);

    reply(
        &mut client,
        102,
        &["main: 2 windows (created Sat Feb 15 10:00:00 2026) (attached)"],
    );
    assert_eq!(client.manager().sessions().len(), 1);
    assert!(early.try_result().is_none());

    reply(&mut client, 103, &[]);
    assert_eq!(
        early.try_result(),
        Some(Ok(CommandReply {
            command_number: 103,
            output: String::new()
        }))
    );
    assert_eq!(client.manager().pending_count(), 0);
}

#[test]
fn test_shutdown_before_attach_fails_deferred() {
    let mut client = ControlClient::new(RecordingChannel::default(), test_config());
    let mut handle = client.submit(TmuxCommand::raw("display-message")).unwrap();
    client.shutdown();

    assert!(client.channel().sent.is_empty());
    assert_eq!(
        handle.try_result(),
        Some(Err(TmuxError::ConnectionClosed { reason: None }))
    );
    assert!(matches!(
        client.submit(TmuxCommand::raw("display-message")),
        Err(TmuxError::ConnectionClosed { .. })
    ));
}

#[test]
fn test_sessions_changed_refreshes_session_list() {
    let mut client = client_with_windows();
    let events = feed(&mut client, &["%sessions-changed"]);
    assert_eq!(events, vec![SessionEvent::SessionsChanged]);
    assert_eq!(
        client.channel().sent.last().map(String::as_str),
        Some("list-sessions")
    );
    assert_eq!(client.manager().pending_count(), 1);

    reply(
        &mut client,
        103,
        &[
            "main: 2 windows (created Sat Feb 15 10:00:00 2026) (attached)",
            "scratch: 1 windows (created Sat Feb 15 11:00:00 2026)",
        ],
    );
    let names: Vec<&str> = client
        .manager()
        .sessions()
        .iter()
        .map(|session| session.name.as_str())
        .collect();
    assert_eq!(names, vec!["main", "scratch"]);
}

#[test]
fn test_window_list_creates_tabs() {
    let mut client = connected_client();
    let events = reply(&mut client, 101, &["@0\t%0\tbash", "@1\t%3\tvim"]);

    let created: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::TabCreated {
                window_id, title, ..
            } => Some((*window_id, title.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        created,
        vec![(0, "bash".to_string()), (1, "vim".to_string())]
    );
    assert!(matches!(
        events.last(),
        Some(SessionEvent::WindowsListed(windows)) if windows.len() == 2
    ));

    let manager = client.manager();
    assert_eq!(manager.windows().len(), 2);
    assert_eq!(manager.tabs().len(), 2);
    assert!(manager.local_pane(0).is_some());
    assert!(manager.local_pane(3).is_some());
}

#[test]
fn test_session_list_snapshot() {
    let client = client_with_windows();
    let sessions = client.manager().sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].name, "main");
    assert_eq!(sessions[0].window_count, 2);
    assert!(sessions[0].is_attached);
    assert_eq!(client.manager().pending_count(), 0);
}

#[tokio::test]
async fn test_command_reply_fulfils_handle() {
    let mut client = client_with_windows();
    let handle = client
        .submit(TmuxCommand::raw("display-message -p '#{session_name}'"))
        .unwrap();
    reply(&mut client, 200, &["main"]);

    let answer = handle.wait().await.unwrap();
    assert_eq!(answer.command_number, 200);
    assert_eq!(answer.output, "main");
}

#[tokio::test]
async fn test_error_reply_fails_handle() {
    let mut client = client_with_windows();
    let handle = client.submit(TmuxCommand::raw("bogus")).unwrap();
    reply_error(&mut client, 7, "unknown command: bogus");

    assert_eq!(
        handle.wait().await,
        Err(TmuxError::CommandFailed {
            command_number: 7,
            message: "unknown command: bogus".to_string(),
        })
    );
}

#[test]
fn test_replies_match_in_submission_order() {
    let mut client = client_with_windows();
    let mut first = client.submit(TmuxCommand::raw("first")).unwrap();
    let mut second = client.submit(TmuxCommand::raw("second")).unwrap();
    assert!(first.try_result().is_none());

    reply(&mut client, 30, &["one"]);
    assert_eq!(first.try_result().unwrap().unwrap().output, "one");
    assert!(second.try_result().is_none());

    reply(&mut client, 31, &["two"]);
    assert_eq!(second.try_result().unwrap().unwrap().output, "two");
}

#[test]
fn test_list_panes_reply_reaches_handle() {
    let mut client = client_with_windows();
    let mut handle = client.submit(TmuxCommand::list_panes(0)).unwrap();
    reply(&mut client, 103, &["@0\t%0\t80x24", "@0\t%4\t79x24"]);

    let answer = handle.try_result().unwrap().unwrap();
    assert_eq!(answer.output, "@0\t%0\t80x24\n@0\t%4\t79x24");
}

#[test]
fn test_notification_inside_reply_is_delivered() {
    let mut client = client_with_windows();
    let mut handle = client.submit(TmuxCommand::raw("list-panes")).unwrap();

    let events = feed(&mut client, &["%begin 1 40 1", "%output %0 hi"]);
    assert!(matches!(
        events.as_slice(),
        [SessionEvent::PaneOutput { tmux_pane_id: 0, data, .. }] if data == b"hi"
    ));
    assert!(handle.try_result().is_none());

    feed(&mut client, &["%0\t/bin/zsh", "pane line", "%end 1 40 1"]);
    // `%`-prefixed body lines are dispatched, never buffered
    let output = handle.try_result().unwrap().unwrap().output;
    assert_eq!(output, "pane line");
}

#[test]
fn test_exit_fails_pending_and_clears_state() {
    let mut client = client_with_windows();
    let mut handle = client.submit(TmuxCommand::raw("list-panes")).unwrap();

    let events = feed(&mut client, &["%exit detached"]);
    assert_eq!(
        events,
        vec![SessionEvent::ConnectionEnded {
            reason: Some("detached".to_string())
        }]
    );
    assert_eq!(
        handle.try_result(),
        Some(Err(TmuxError::ConnectionClosed {
            reason: Some("detached".to_string())
        }))
    );

    let manager = client.manager();
    assert_eq!(manager.state(), SessionState::Ended);
    assert!(manager.tabs().is_empty());
    assert!(manager.windows().is_empty());
    assert!(manager.local_pane(0).is_none());
    assert_eq!(manager.pending_count(), 0);

    assert!(matches!(
        client.submit(TmuxCommand::raw("list-panes")),
        Err(TmuxError::ConnectionClosed { .. })
    ));
    assert!(feed(&mut client, &["%window-add @9"]).is_empty());
}

#[test]
fn test_layout_change_preserves_pane_identity() {
    let mut client = client_with_windows();
    let (tab_id, original) = client.manager().local_pane(0).unwrap();

    let events = feed(
        &mut client,
        &[concat!(
            "%layout-change @0 b25f,159x48,0,0{79x48,0,0,0,79x48,80,0,4} ",
            "b25f,159x48,0,0{79x48,0,0,0,79x48,80,0,4} *"
        )],
    );
    let update = match events.as_slice() {
        [SessionEvent::LayoutChanged(update)] => update.clone(),
        other => panic!("unexpected events: {:?}", other),
    };
    assert_eq!(update.tab_id, tab_id);
    assert_eq!(update.window_id, 0);
    assert_eq!(update.local_pane(0), Some(original));
    assert_eq!(update.added, vec![4]);
    assert!(update.removed.is_empty());
    assert!(update.is_structural());
    let new_pane = update.local_pane(4).unwrap();
    assert_ne!(new_pane, original);

    let events = feed(&mut client, &["%layout-change @0 159x48,0,0,4"]);
    let update = match events.as_slice() {
        [SessionEvent::LayoutChanged(update)] => update.clone(),
        other => panic!("unexpected events: {:?}", other),
    };
    assert_eq!(update.panes, vec![(4, new_pane)]);
    assert_eq!(update.removed, vec![0]);
    assert!(client.manager().local_pane(0).is_none());
    assert_eq!(client.manager().tmux_pane_id(new_pane), Some(4));
}

#[test]
fn test_resize_only_layout_is_not_structural() {
    let mut client = client_with_windows();
    let events = feed(&mut client, &["%layout-change @1 120x40,0,0,3"]);
    match events.as_slice() {
        [SessionEvent::LayoutChanged(update)] => {
            assert!(!update.is_structural());
            assert_eq!(
                update.tree,
                LayoutNode::parse("120x40,0,0,3").unwrap()
            );
        }
        other => panic!("unexpected events: {:?}", other),
    }
}

#[test]
fn test_layout_for_unknown_window_creates_tab() {
    let mut client = client_with_windows();
    let events = feed(&mut client, &["%layout-change @7 80x24,0,0,12"]);
    assert!(matches!(
        events.first(),
        Some(SessionEvent::TabCreated { window_id: 7, .. })
    ));
    assert!(matches!(events.get(1), Some(SessionEvent::LayoutChanged(_))));
    assert!(client.manager().local_pane(12).is_some());
}

#[test]
fn test_bad_layout_is_ignored() {
    let mut client = client_with_windows();
    assert!(feed(&mut client, &["%layout-change @0 80x24,0,0{"]).is_empty());
    assert!(client.manager().local_pane(0).is_some());
}

#[test]
fn test_output_routing() {
    let mut client = client_with_windows();
    let (tab_id, pane_id) = client.manager().local_pane(3).unwrap();

    let events = feed(&mut client, &[r"%output %3 ok\015\012"]);
    assert_eq!(
        events,
        vec![SessionEvent::PaneOutput {
            tab_id,
            pane_id,
            tmux_pane_id: 3,
            data: b"ok\r\n".to_vec(),
        }]
    );

    // Unmapped panes are dropped
    assert!(feed(&mut client, &["%output %99 lost"]).is_empty());
}

#[test]
fn test_window_lifecycle() {
    let mut client = client_with_windows();

    let events = feed(&mut client, &["%window-add @5"]);
    let tab_id = match events.as_slice() {
        [SessionEvent::TabCreated { tab_id, window_id: 5, .. }] => *tab_id,
        other => panic!("unexpected events: {:?}", other),
    };

    // Duplicate add is a no-op
    assert!(feed(&mut client, &["%window-add @5"]).is_empty());
    assert_eq!(client.manager().tabs().len(), 3);

    let events = feed(&mut client, &["%window-renamed @5 logs and\tstuff"]);
    assert_eq!(
        events,
        vec![SessionEvent::TabRenamed {
            tab_id,
            name: "logs and\tstuff".to_string()
        }]
    );
    assert_eq!(
        client.manager().tab_for_window(5).unwrap().title,
        "logs and\tstuff"
    );

    feed(&mut client, &["%layout-change @5 80x24,0,0,20"]);
    assert!(client.manager().local_pane(20).is_some());

    let events = feed(&mut client, &["%window-close @5"]);
    assert_eq!(
        events,
        vec![SessionEvent::TabClosed {
            tab_id,
            window_id: 5
        }]
    );
    assert!(client.manager().tab_for_window(5).is_none());
    assert!(client.manager().local_pane(20).is_none());
    assert!(client.manager().windows().iter().all(|w| w.window_id != 5));
}

#[test]
fn test_active_pane_changed() {
    let mut client = client_with_windows();
    let (tab_id, pane_id) = client.manager().local_pane(3).unwrap();
    let events = feed(&mut client, &["%window-pane-changed @1 %3"]);
    assert_eq!(
        events,
        vec![SessionEvent::ActivePaneChanged {
            tab_id: Some(tab_id),
            window_id: 1,
            tmux_pane_id: 3,
            pane_id: Some(pane_id),
        }]
    );
    assert_eq!(
        client.manager().tab_for_window(1).unwrap().active_pane,
        Some(3)
    );
}

#[test]
fn test_split_and_close_commands() {
    let mut client = client_with_windows();
    let (tab_id, pane_id) = client.manager().local_pane(0).unwrap();

    client.split_pane(pane_id, SplitAxis::Horizontal).unwrap();
    client.split_pane(pane_id, SplitAxis::Vertical).unwrap();
    client.close_pane(pane_id).unwrap();
    client.rename_tab(tab_id, "it's here").unwrap();
    client.select_tab(tab_id).unwrap();

    let sent = &client.channel().sent;
    assert_eq!(
        sent[sent.len() - 5..],
        [
            tmux_split_command(SplitAxis::Horizontal, 0),
            tmux_split_command(SplitAxis::Vertical, 0),
            tmux_kill_pane_command(0),
            "rename-window -t @0 'it'\\''s here'".to_string(),
            "select-window -t @0".to_string(),
        ]
    );
}

#[test]
fn test_operations_on_unknown_identity() {
    let mut client = client_with_windows();
    assert!(matches!(
        client.split_pane(999, SplitAxis::Horizontal),
        Err(TmuxError::UnknownPane(999))
    ));
    assert!(matches!(
        client.close_tab(999),
        Err(TmuxError::UnknownTab(999))
    ));
}

#[test]
fn test_send_key_encoding() {
    let mut client = client_with_windows();
    let (_, pane_id) = client.manager().local_pane(3).unwrap();

    client
        .send_key(pane_id, &Key::Named(NamedKey::ArrowUp), ModifiersState::SHIFT)
        .unwrap();
    client
        .send_key(pane_id, &Key::Character("a".into()), ModifiersState::empty())
        .unwrap();
    client
        .send_key(pane_id, &Key::Character("c".into()), ModifiersState::CONTROL)
        .unwrap();
    client.send_bytes(pane_id, b"ls -l\r").unwrap();

    let sent = &client.channel().sent;
    assert_eq!(
        sent[sent.len() - 4..],
        [
            "send-keys -t %3 S-Up".to_string(),
            "send-keys -t %3 -l 'a'".to_string(),
            "send-keys -t %3 C-c".to_string(),
            "send-keys -t %3 'ls' Space '-l' Enter".to_string(),
        ]
    );
}

#[test]
fn test_prefix_key_translates_next_key() {
    let mut client = client_with_windows();
    let (_, pane_id) = client.manager().local_pane(0).unwrap();
    let before = client.channel().sent.len();

    let handle = client
        .send_key(pane_id, &Key::Character("b".into()), ModifiersState::CONTROL)
        .unwrap();
    assert!(handle.is_none());
    assert!(client.is_prefix_active());
    assert_eq!(client.channel().sent.len(), before);

    let handle = client
        .send_key(pane_id, &Key::Character("%".into()), ModifiersState::SHIFT)
        .unwrap();
    assert!(handle.is_some());
    assert!(!client.is_prefix_active());
    assert_eq!(
        client.channel().sent.last().map(String::as_str),
        Some("split-window -h -t %0")
    );
}

#[test]
fn test_channel_failure_cancels_command() {
    let channel = RecordingChannel {
        fail: true,
        ..RecordingChannel::default()
    };
    let mut client = ControlClient::new(channel, test_config());
    feed(&mut client, &["%session-changed $1 main"]);
    assert_eq!(client.manager().pending_count(), 0);

    assert!(matches!(
        client.submit(TmuxCommand::list_sessions()),
        Err(TmuxError::Channel(_))
    ));
    assert_eq!(client.manager().pending_count(), 0);
}

#[test]
fn test_shutdown_fails_outstanding_commands() {
    let mut client = connected_client();
    let mut handle = client.submit(TmuxCommand::raw("list-panes")).unwrap();
    let events = client.shutdown();
    assert_eq!(events, vec![SessionEvent::ConnectionEnded { reason: None }]);
    assert_eq!(
        handle.try_result(),
        Some(Err(TmuxError::ConnectionClosed { reason: None }))
    );
}

#[test]
fn test_unbounded_sender_channel() {
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let mut client = ControlClient::new(tx, test_config());
    client.feed_line("%session-changed $2 remote");

    assert_eq!(
        rx.try_recv().unwrap(),
        "list-windows -F '#{window_id}\t#{pane_id}\t#{window_name}'\n"
    );
    assert_eq!(rx.try_recv().unwrap(), "list-sessions\n");
}

#[tokio::test]
async fn test_run_until_exit() {
    let transcript = concat!(
        "%begin 1700000000 1 0\r\n%end 1700000000 1 0\r\n",
        "%session-changed $1 main\r\n%window-add @2\r\n%exit\r\n%window-add @3\r\n"
    )
    .as_bytes();
    let reader = tokio::io::BufReader::new(&transcript[..]);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut client = ControlClient::new(RecordingChannel::default(), test_config());
    client.run(reader, tx).await.unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert_eq!(
        events,
        vec![
            SessionEvent::SessionChanged {
                session_id: 1,
                name: "main".to_string()
            },
            SessionEvent::TabCreated {
                tab_id: 1,
                window_id: 2,
                title: String::new()
            },
            SessionEvent::ConnectionEnded { reason: None },
        ]
    );
    assert_eq!(client.state(), SessionState::Ended);
}

#[tokio::test]
async fn test_run_end_of_input_shuts_down() {
    let reader = tokio::io::BufReader::new(&b"%session-changed $1 main\n%output %0 partial"[..]);
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut client = ControlClient::new(RecordingChannel::default(), test_config());
    client.run(reader, tx).await.unwrap();

    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        last = Some(event);
    }
    assert_eq!(last, Some(SessionEvent::ConnectionEnded { reason: None }));
}

#[test]
fn test_add_tmux_tab_twice_keeps_first() {
    let mut manager = SessionManager::new();
    assert!(manager.add_tmux_tab(1, Some(10), "first").is_some());
    assert!(manager.add_tmux_tab(1, Some(20), "second").is_none());

    assert_eq!(manager.tabs().len(), 1);
    assert_eq!(manager.tabs()[0].title, "first");
    assert!(manager.local_pane(20).is_none());
}

#[test]
fn test_pane_mapping_register_and_remove() {
    let mut manager = SessionManager::new();
    manager.register_tmux_pane_mapping(42, 1, 5);
    assert_eq!(manager.tmux_pane_id(5), Some(42));
    assert_eq!(manager.remove_tmux_pane_mapping(42), Some((1, 5)));
    assert_eq!(manager.tmux_pane_id(5), None);
    assert_eq!(manager.tmux_pane_id(77), None);
}

#[test]
fn test_unmatched_reply_is_ignored() {
    let mut manager = SessionManager::new();
    let events = manager.handle_notification(Notification::BlockEnd {
        command_number: 3,
        data: "stray".to_string(),
    });
    assert!(events.is_empty());
    assert_eq!(manager.pending_count(), 0);
}

#[test]
fn test_list_windows_kind_via_manager() {
    let mut manager = SessionManager::new();
    let mut handle = manager
        .submit(&TmuxCommand::list_windows(), CommandKind::ListWindows)
        .unwrap();
    let events = manager.handle_notification(Notification::BlockEnd {
        command_number: 4,
        data: "@2\t%6\tzsh".to_string(),
    });
    assert_eq!(events.len(), 2);
    assert_eq!(manager.windows()[0].name, "zsh");
    assert_eq!(handle.try_result().unwrap().unwrap().output, "@2\t%6\tzsh");
}
