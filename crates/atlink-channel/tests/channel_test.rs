//! Integration tests driving the full engine through an in-memory transport.
//!
//! The harness side of [`transport_pair`] plays the modem: tests inject the
//! bytes a modem would emit and observe the bytes the channel writes.

use atlink_channel::{
    transport_pair, ChannelConfig, ChannelError, ModemChannel, TransportHarness,
};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Config with a fast poll interval so tests settle quickly.
fn test_config() -> ChannelConfig {
    ChannelConfig {
        poll_interval_ms: 1,
        ..ChannelConfig::default()
    }
}

fn started_channel(config: ChannelConfig) -> (ModemChannel, TransportHarness) {
    init_tracing();
    let (transport, harness) = transport_pair();
    let mut channel = ModemChannel::new(Box::new(transport), config);
    channel.start().expect("start should succeed");
    (channel, harness)
}

// ============================================================================
// Transmission
// ============================================================================

#[test]
fn test_send_command_appends_line_terminator() {
    let (channel, harness) = started_channel(test_config());

    channel.send_command("AT+CREG?").unwrap();
    assert_eq!(
        harness.next_write(Duration::from_millis(500)),
        Some(b"AT+CREG?\r\n".to_vec())
    );
}

#[test]
fn test_send_payload_is_verbatim() {
    let (channel, harness) = started_channel(test_config());

    channel.send_payload("certificate body").unwrap();
    assert_eq!(
        harness.next_write(Duration::from_millis(500)),
        Some(b"certificate body".to_vec())
    );
}

#[test]
fn test_write_error_surfaces_from_send() {
    init_tracing();
    let (transport, harness) = transport_pair();
    let channel = ModemChannel::new(Box::new(transport), test_config());
    drop(harness);

    let result = channel.send_command("AT");
    assert!(matches!(result, Err(ChannelError::Io(_))));
}

// ============================================================================
// Classification and queues
// ============================================================================

#[test]
fn test_lines_route_by_async_prefix() {
    let (channel, harness) = started_channel(test_config());
    channel.configure_async_prefixes(vec!["+UUPSDA:".to_string()]);

    harness.inject(b"+UUPSDA: 0,0\r\nOK\r\n");

    assert_eq!(
        channel.await_async_event(Duration::from_millis(500)),
        Some("+UUPSDA: 0,0".to_string())
    );
    assert_eq!(
        channel.await_response(Duration::from_millis(500)),
        Some("OK".to_string())
    );
}

#[test]
fn test_no_delimiter_means_no_line() {
    let (channel, harness) = started_channel(test_config());

    harness.inject(b"AT+CSQ");
    assert_eq!(channel.await_response(Duration::from_millis(100)), None);
}

#[test]
fn test_full_queue_drops_newest_line() {
    let config = ChannelConfig {
        response_queue_capacity: 3,
        ..test_config()
    };
    let (channel, harness) = started_channel(config);

    harness.inject(b"one\r\ntwo\r\nthree\r\nfour\r\n");
    // Let the reader process everything before popping, so the drop is
    // forced while the queue is full.
    thread::sleep(Duration::from_millis(200));

    assert_eq!(
        channel.await_response(Duration::from_millis(100)),
        Some("one".to_string())
    );
    assert_eq!(
        channel.await_response(Duration::from_millis(100)),
        Some("two".to_string())
    );
    assert_eq!(
        channel.await_response(Duration::from_millis(100)),
        Some("three".to_string())
    );
    assert_eq!(channel.await_response(Duration::from_millis(100)), None);
}

#[test]
fn test_configure_async_prefixes_replaces_the_set() {
    let (channel, harness) = started_channel(test_config());
    channel.configure_async_prefixes(vec!["+A".to_string()]);
    channel.configure_async_prefixes(vec!["+B".to_string()]);

    harness.inject(b"+A 1\r\n+B 2\r\n");

    // Only the second set is active: "+A 1" is a plain response now.
    assert_eq!(
        channel.await_async_event(Duration::from_millis(500)),
        Some("+B 2".to_string())
    );
    assert_eq!(
        channel.await_response(Duration::from_millis(500)),
        Some("+A 1".to_string())
    );
}

#[test]
fn test_notification_hook_observes_async_lines() {
    let (channel, harness) = started_channel(test_config());
    channel.configure_async_prefixes(vec!["+UUPSDD:".to_string()]);

    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let seen_by_hook = Arc::clone(&seen);
    channel.register_notification_hook(move |line| {
        seen_by_hook.lock().unwrap().push(line.to_string());
    });

    harness.inject(b"+UUPSDD: 0\r\n");

    assert_eq!(
        channel.await_async_event(Duration::from_millis(500)),
        Some("+UUPSDD: 0".to_string())
    );
    assert_eq!(seen.lock().unwrap().as_slice(), ["+UUPSDD: 0".to_string()]);
}

// ============================================================================
// Response correlation
// ============================================================================

#[test]
fn test_correlation_completes_on_end_criterion() {
    let (channel, harness) = started_channel(test_config());
    channel.configure_end_criteria(vec![
        "OK".to_string(),
        "ERROR".to_string(),
        "+CME ERROR:*".to_string(),
    ]);

    harness.inject(b"+CREG: 2\r\nOK\r\n");

    let outcome = channel
        .send_command_await_responses("AT+CREG?", Duration::from_secs(1))
        .unwrap();
    assert!(outcome.completed);
    assert_eq!(outcome.lines, ["+CREG: 2".to_string(), "OK".to_string()]);
}

#[test]
fn test_wildcard_criterion_ends_response() {
    let (channel, harness) = started_channel(test_config());
    channel.configure_end_criteria(vec!["OK".to_string(), "+CME ERROR:*".to_string()]);

    harness.inject(b"+CME ERROR: 10\r\n");

    let outcome = channel
        .send_command_await_responses("AT+BADCMD", Duration::from_secs(1))
        .unwrap();
    assert!(outcome.completed);
    assert_eq!(outcome.lines, ["+CME ERROR: 10".to_string()]);
}

#[test]
fn test_partial_lines_survive_timeout() {
    let (channel, harness) = started_channel(test_config());
    channel.configure_end_criteria(vec!["OK".to_string(), "ERROR".to_string()]);

    // No terminator ever arrives.
    harness.inject(b"+CREG: 2\r\n");

    let outcome = channel
        .send_command_await_responses("AT+CREG?", Duration::from_millis(200))
        .unwrap();
    assert!(!outcome.completed);
    assert_eq!(outcome.lines, ["+CREG: 2".to_string()]);
}

#[test]
fn test_empty_timeout_returns_no_lines() {
    let (channel, _harness) = started_channel(test_config());
    channel.configure_end_criteria(vec!["OK".to_string()]);

    let outcome = channel
        .send_command_await_responses("AT", Duration::from_millis(100))
        .unwrap();
    assert!(!outcome.completed);
    assert!(outcome.lines.is_empty());
}

#[test]
fn test_await_responses_drains_separately_sent_command() {
    let (channel, harness) = started_channel(test_config());
    channel.configure_end_criteria(vec!["OK".to_string()]);

    channel.send_command("AT+CSQ").unwrap();
    harness.inject(b"+CSQ: 18,99\r\nOK\r\n");

    let outcome = channel.await_responses(Duration::from_secs(1));
    assert!(outcome.completed);
    assert_eq!(outcome.lines, ["+CSQ: 18,99".to_string(), "OK".to_string()]);
}

#[test]
fn test_await_responses_reports_failure_but_keeps_lines() {
    let (channel, harness) = started_channel(test_config());
    channel.configure_end_criteria(vec!["OK".to_string()]);

    harness.inject(b"+CSQ: 18,99\r\n");

    let outcome = channel.await_responses(Duration::from_millis(200));
    assert!(!outcome.completed);
    // The asymmetric contract: failure still hands over collected lines.
    assert_eq!(outcome.lines, ["+CSQ: 18,99".to_string()]);
}

// ============================================================================
// Prompt mode
// ============================================================================

#[test]
fn test_prompt_mode_upload_exchange() {
    let (channel, harness) = started_channel(test_config());
    channel.configure_end_criteria(vec!["OK".to_string(), "ERROR".to_string()]);

    // Size-negotiated upload: command elicits a bare ">" with no newline.
    channel.enable_prompt(b'>');
    harness.inject(b">");

    let outcome = channel
        .send_command_await_responses("AT+USECMNG=0,0,\"cert\",128", Duration::from_secs(1))
        .unwrap();
    assert!(outcome.completed);
    assert_eq!(outcome.lines, [">".to_string()]);

    channel.send_payload("-----BEGIN CERTIFICATE-----").unwrap();
    channel.disable_prompt();

    // Back to normal framing: the upload result needs its CR/LF.
    harness.inject(b"+USECMNG: 0,0,\"cert\"\r\nOK\r\n");
    let outcome = channel.await_responses(Duration::from_secs(1));
    assert!(outcome.completed);
    assert_eq!(
        outcome.lines,
        ["+USECMNG: 0,0,\"cert\"".to_string(), "OK".to_string()]
    );
}

#[test]
fn test_prompt_terminates_mid_line_accumulator() {
    let (channel, harness) = started_channel(test_config());
    channel.enable_prompt(b'>');

    harness.inject(b"AT+CMD>");

    let outcome = channel.await_responses(Duration::from_secs(1));
    assert!(outcome.completed);
    assert_eq!(outcome.lines, ["AT+CMD>".to_string()]);
}

// ============================================================================
// Lifecycle
// ============================================================================

#[test]
fn test_start_twice_is_rejected() {
    let (mut channel, _harness) = started_channel(test_config());
    assert!(matches!(channel.start(), Err(ChannelError::AlreadyStarted)));
}

#[test]
fn test_stop_joins_and_is_terminal() {
    init_tracing();
    let (transport, harness) = transport_pair();
    let mut channel = ModemChannel::new(Box::new(transport), test_config());
    channel.start().unwrap();

    harness.inject(b"OK\r\n");
    assert_eq!(
        channel.await_response(Duration::from_millis(500)),
        Some("OK".to_string())
    );

    channel.stop();
    channel.stop(); // idempotent

    // Once stopped, nothing reads the transport any more.
    harness.inject(b"LATE\r\n");
    assert_eq!(channel.await_response(Duration::from_millis(100)), None);

    assert!(matches!(channel.start(), Err(ChannelError::Stopped)));
}
